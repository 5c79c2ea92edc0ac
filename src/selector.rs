//! Fuzzy menu selection through an external `fzf` process.
//!
//! Every menu in the client, including the playback command menu, is a list
//! of display strings handed to the selector. The selector blocks until the
//! user picks something, but it waits by polling so that an interrupt or a
//! caller-supplied watch condition (for example "the pipeline is still
//! playing") can close the menu early.

use std::io::{self, ErrorKind, Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use crate::config::Config;
use crate::error::{PlayerError, Result};
use crate::interrupt;

/// One menu to present
#[derive(Debug, Clone)]
pub struct Menu<'a> {
    pub prompt: &'a str,
    pub options: &'a [String],
    pub multi: bool,
}

impl<'a> Menu<'a> {
    pub fn single(prompt: &'a str, options: &'a [String]) -> Self {
        Self {
            prompt,
            options,
            multi: false,
        }
    }

    pub fn multi(prompt: &'a str, options: &'a [String]) -> Self {
        Self {
            prompt,
            options,
            multi: true,
        }
    }
}

/// Result of presenting a menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Chosen lines in the order the selector returned them, ANSI codes stripped
    Chosen(Vec<String>),
    /// The user backed out of the menu
    Cancelled,
    /// The watch condition turned false while the menu was open
    Aborted,
}

pub trait Selector {
    /// Present `menu` and block until the user answers, or until `watch`
    /// returns false.
    fn select_watching(
        &mut self,
        menu: &Menu<'_>,
        watch: &mut dyn FnMut() -> bool,
    ) -> Result<Selection>;

    fn select(&mut self, menu: &Menu<'_>) -> Result<Selection> {
        self.select_watching(menu, &mut || true)
    }
}

/// Runs `fzf` (or a compatible program) for each menu
pub struct FzfSelector {
    program: String,
    extra_args: Vec<String>,
    height: String,
    poll_interval: Duration,
    interrupted: &'static AtomicBool,
}

impl FzfSelector {
    pub fn new(program: impl Into<String>, height: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
            height: height.into(),
            poll_interval,
            interrupted: interrupt::flag(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.selector.clone(),
            config.selector_height.clone(),
            config.poll_interval(),
        )
        .with_args(config.selector_args.clone())
    }

    /// Arguments placed before the generated menu flags
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Watch `flag` instead of the process-wide interrupt flag
    pub fn with_interrupt_flag(mut self, flag: &'static AtomicBool) -> Self {
        self.interrupted = flag;
        self
    }

    fn interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    fn arguments(&self, menu: &Menu<'_>) -> Vec<String> {
        let mut args = self.extra_args.clone();
        args.extend([
            "--ansi".to_string(),
            format!("--height={}", self.height),
            "--border".to_string(),
        ]);
        if menu.multi {
            args.push("--multi".to_string());
        }
        if !menu.prompt.is_empty() {
            args.push("--prompt".to_string());
            args.push(menu.prompt.to_string());
        }
        args
    }

    fn spawn(&self, menu: &Menu<'_>) -> Result<Child> {
        Command::new(&self.program)
            .args(self.arguments(menu))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| PlayerError::Selector(format!("could not start {}: {e}", self.program)))
    }
}

/// Feed the options on their own thread so a selector that writes before it
/// finishes reading cannot stall us
fn feed(child: &mut Child, options: &[String]) -> Option<JoinHandle<()>> {
    let mut stdin = child.stdin.take()?;
    let input = options.join("\n");
    Some(thread::spawn(move || {
        if let Err(e) = stdin.write_all(input.as_bytes()) {
            // the selector may exit before reading everything
            if e.kind() != ErrorKind::BrokenPipe {
                log::warn!("Writing menu options failed: {e}");
            }
        }
    }))
}

/// Drain the selector's output while it runs, so large selections never
/// fill the pipe and block its exit
fn drain(child: &mut Child) -> Option<JoinHandle<io::Result<String>>> {
    let mut stdout = child.stdout.take()?;
    Some(thread::spawn(move || {
        let mut output = String::new();
        stdout.read_to_string(&mut output)?;
        Ok(output)
    }))
}

fn collect(reader: Option<JoinHandle<io::Result<String>>>) -> Result<String> {
    match reader {
        Some(handle) => handle
            .join()
            .map_err(|_| PlayerError::Selector("output reader panicked".to_string()))?
            .map_err(PlayerError::from),
        None => Ok(String::new()),
    }
}

impl Selector for FzfSelector {
    fn select_watching(
        &mut self,
        menu: &Menu<'_>,
        watch: &mut dyn FnMut() -> bool,
    ) -> Result<Selection> {
        let mut child = self.spawn(menu)?;
        let _registration = interrupt::register_selector(child.id());
        let writer = feed(&mut child, menu.options);
        let reader = drain(&mut child);

        let status = loop {
            if self.interrupted() {
                close(&mut child);
                return Err(PlayerError::Interrupted);
            }
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if !watch() {
                log::debug!("Menu closed by watch condition");
                close(&mut child);
                return Ok(Selection::Aborted);
            }
            thread::sleep(self.poll_interval);
        };

        if let Some(writer) = writer {
            let _ = writer.join();
        }
        let output = collect(reader)?;

        if self.interrupted() {
            return Err(PlayerError::Interrupted);
        }

        match status.code() {
            Some(0) => Ok(parse_output(&output)),
            // 1: no match, 130: escape or ctrl-c inside fzf
            Some(1) | Some(130) | None => Ok(Selection::Cancelled),
            Some(code) => Err(PlayerError::Selector(format!(
                "{} exited with status {code}",
                self.program
            ))),
        }
    }
}

fn close(child: &mut Child) {
    // SIGTERM lets fzf restore the terminal before exiting
    let pid = Pid::from_raw(child.id() as i32);
    if let Err(e) = signal::kill(pid, Signal::SIGTERM) {
        log::debug!("Selector already gone: {e}");
    }
    let _ = child.wait();
}

fn parse_output(output: &str) -> Selection {
    let lines: Vec<String> = output
        .lines()
        .map(|line| console::strip_ansi_codes(line).trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        Selection::Cancelled
    } else {
        Selection::Chosen(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output_strips_ansi_and_blank_lines() {
        let output = "\u{1b}[33mPause\u{1b}[0m\n\n  Next  \n";
        assert_eq!(
            parse_output(output),
            Selection::Chosen(vec!["Pause".to_string(), "Next".to_string()])
        );
    }

    #[test]
    fn test_parse_output_empty_is_cancelled() {
        assert_eq!(parse_output(""), Selection::Cancelled);
        assert_eq!(parse_output("\n  \n"), Selection::Cancelled);
    }

    #[test]
    fn test_arguments_single_and_multi() {
        let selector = FzfSelector::new("fzf", "40%", Duration::from_millis(10));
        let options = vec!["a".to_string()];

        let single = selector.arguments(&Menu::single("Pick > ", &options));
        assert_eq!(single[0], "--ansi");
        assert!(single.contains(&"--height=40%".to_string()));
        assert!(!single.contains(&"--multi".to_string()));
        assert_eq!(single[single.len() - 2..], ["--prompt".to_string(), "Pick > ".to_string()]);

        let multi = selector.arguments(&Menu::multi("", &options));
        assert!(multi.contains(&"--multi".to_string()));
        assert!(!multi.contains(&"--prompt".to_string()));
    }

    #[test]
    fn test_missing_program_is_selector_error() {
        let mut selector =
            FzfSelector::new("jly-fin-no-such-selector", "40%", Duration::from_millis(10));
        let options = vec!["a".to_string()];
        let result = selector.select(&Menu::single("", &options));
        assert!(matches!(result, Err(PlayerError::Selector(_))));
    }

    fn shell_selector(script: &str) -> FzfSelector {
        // sh -c SCRIPT sh --ansi ...: the menu flags become positional args
        FzfSelector::new("sh", "40%", Duration::from_millis(5)).with_args(vec![
            "-c".to_string(),
            script.to_string(),
            "sh".to_string(),
        ])
    }

    #[test]
    fn test_extra_args_come_first() {
        let selector = shell_selector("true");
        let options = vec!["a".to_string()];
        let args = selector.arguments(&Menu::single("", &options));
        assert_eq!(args[0], "-c");
        assert_eq!(args[3], "--ansi");
    }

    #[test]
    fn test_shell_selector_returns_chosen_line() {
        let mut selector = shell_selector("cat > /dev/null; echo second");
        let options = vec!["first".to_string(), "second".to_string()];
        let result = selector.select(&Menu::single("", &options)).unwrap();
        assert_eq!(result, Selection::Chosen(vec!["second".to_string()]));
    }

    #[test]
    fn test_escape_exit_code_is_cancelled() {
        let mut selector = shell_selector("cat > /dev/null; exit 130");
        let options = vec!["first".to_string()];
        let result = selector.select(&Menu::single("", &options)).unwrap();
        assert_eq!(result, Selection::Cancelled);
    }

    #[test]
    fn test_unexpected_exit_code_is_error() {
        let mut selector = shell_selector("cat > /dev/null; exit 2");
        let options = vec!["first".to_string()];
        let result = selector.select(&Menu::single("", &options));
        assert!(matches!(result, Err(PlayerError::Selector(_))));
    }

    #[test]
    fn test_watch_condition_aborts_open_menu() {
        let mut selector = shell_selector("exec sleep 30");
        let options = vec!["first".to_string()];
        let mut checks = 0;
        let result = selector
            .select_watching(&Menu::single("", &options), &mut || {
                checks += 1;
                checks < 3
            })
            .unwrap();
        assert_eq!(result, Selection::Aborted);
        assert_eq!(checks, 3);
    }

    #[test]
    fn test_large_selection_does_not_block() {
        // well past a pipe buffer of output before exiting
        let mut selector = shell_selector(
            "cat > /dev/null; i=0; while [ $i -lt 2000 ]; do echo \"line $i with some padding to make it longer than usual\"; i=$((i+1)); done",
        );
        let options: Vec<String> = (0..2000).map(|i| format!("option {i}")).collect();

        match selector.select(&Menu::multi("", &options)).unwrap() {
            Selection::Chosen(lines) => {
                assert_eq!(lines.len(), 2000);
                assert_eq!(lines[1999], "line 1999 with some padding to make it longer than usual");
            }
            other => panic!("expected chosen lines, got {other:?}"),
        }
    }

    #[test]
    fn test_interrupt_closes_open_menu() {
        static INTERRUPTED: AtomicBool = AtomicBool::new(false);
        let mut selector = shell_selector("exec sleep 30").with_interrupt_flag(&INTERRUPTED);
        let options = vec!["first".to_string()];
        let mut checks = 0;

        let result = selector.select_watching(&Menu::single("", &options), &mut || {
            checks += 1;
            if checks == 2 {
                INTERRUPTED.store(true, Ordering::SeqCst);
            }
            true
        });

        assert!(matches!(result, Err(PlayerError::Interrupted)));
        assert_eq!(checks, 2);
    }
}
