pub mod args;
pub mod commands;

pub use args::{Cli, Commands, InputArgs, OutputFormat, PipelineArgs, ResampleMethod};
pub use commands::run;
