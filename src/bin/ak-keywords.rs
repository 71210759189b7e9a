use std::io::{self, Write};
use std::process;

use apikit::commands::keywords::{self, ChatArgs, ChatTask};
use apikit::config::Settings;
use apikit::logging::{self, LogArgs};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "ak-keywords",
    about = "Extract keywords from a block of text",
    version,
    long_version = apikit::LONG_VERSION
)]
struct Cli {
    #[command(flatten)]
    log: LogArgs,
    #[command(flatten)]
    args: ChatArgs,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.log);
    let settings = Settings::load();
    let result = keywords::run(ChatTask::Keywords, cli.args, &settings).await;
    let code = match result {
        Ok(()) => 0,
        Err(err) => apikit::report_error(&err),
    };
    let _ = io::stdout().flush();
    process::exit(code);
}
