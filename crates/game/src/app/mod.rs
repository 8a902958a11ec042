pub(crate) mod bootstrap;
mod console_commands;
mod line_pump;
pub(crate) mod loop_runner;
mod text_host;
