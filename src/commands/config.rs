use clap::{Args, Subcommand};

use crate::config::{self, Settings};
use crate::error::Result;

#[derive(Debug, Args, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Debug, Subcommand, Clone)]
enum ConfigSubcommand {
    /// Validate the profile file and report which credentials are set
    Check {
        #[arg(long)]
        profile: Option<String>,
    },
}

pub fn run(args: ConfigArgs, settings: &Settings) -> Result<()> {
    match args.command {
        ConfigSubcommand::Check { profile } => {
            let path = config::validate_config(profile.as_deref())?;
            println!("config OK: {}", path.display());
            for (name, present) in settings.credentials.presence() {
                println!("{name}: {}", if present { "set" } else { "not set" });
            }
            Ok(())
        }
    }
}
