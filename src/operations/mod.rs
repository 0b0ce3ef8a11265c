mod commands;

pub use commands::{commands_from_cli, load_command_script};
