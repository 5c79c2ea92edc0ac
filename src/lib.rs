pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod interrupt;
pub mod navigation;
pub mod playback;
pub mod selector;
pub mod servers;
pub mod terminal;
pub mod utils;
