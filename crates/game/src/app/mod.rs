mod bootstrap;
mod cli;
mod config;
mod loop_runner;
mod paths;

pub(crate) use bootstrap::build_app;
pub(crate) use cli::{parse_args, usage_text, CliCommand};
pub(crate) use loop_runner::run;
