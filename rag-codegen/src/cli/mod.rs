pub mod app;
pub mod commands;
pub mod progress;

pub use app::{Cli, Commands};
