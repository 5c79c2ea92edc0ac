pub mod config;
pub mod menus;
pub mod play;
pub mod servers;
