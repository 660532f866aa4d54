pub mod clipboard;
pub mod commands;
pub mod navigator;
pub mod render;

pub use clipboard::Osc52Clipboard;
pub use commands::{execute, parse_command, Command, CommandError, Flow};
pub use navigator::TerminalNavigator;
pub use render::render;
