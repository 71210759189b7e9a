//! Small adapters over hosted chat models, pretrained classifiers and
//! retrieval-augmented question answering.

pub mod adapter;
pub mod commands;
pub mod config;
pub mod error;
pub mod hf;
pub mod logging;
pub mod rchain;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};

/// `--version` text: package version, commit, build time and backend.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("APIKIT_GIT_SHA"),
    "\nbuilt: ",
    env!("APIKIT_BUILD_TS"),
    "\nbackend: ",
    env!("APIKIT_BACKEND"),
);

/// Prints a command error to stderr, red when stderr is a terminal, and
/// returns the process exit code.
pub fn report_error(err: &Error) -> i32 {
    use std::io::IsTerminal;

    use owo_colors::OwoColorize;

    if std::io::stderr().is_terminal() {
        eprintln!("{} {err}", "error:".red().bold());
    } else {
        eprintln!("error: {err}");
    }
    err.exit_code()
}
