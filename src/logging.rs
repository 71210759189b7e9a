use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Shared `--verbose`/`--quiet` switches, flattened into every binary.
#[derive(Debug, Clone, Copy, Default, clap::Args)]
pub struct LogArgs {
    /// Log request details to stderr
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,
    /// Silence all diagnostics
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl LogArgs {
    fn default_directive(self) -> &'static str {
        if self.quiet {
            "off"
        } else if self.verbose {
            "apikit=debug"
        } else {
            "warn"
        }
    }
}

/// Installs the stderr subscriber. `RUST_LOG` takes precedence over flags.
pub fn init(args: LogArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.default_directive()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .try_init();
}
