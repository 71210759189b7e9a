use std::io::{self, Write};
use std::process;

use apikit::commands::schedule::{self, ScheduleArgs};
use apikit::config::Settings;
use apikit::logging::{self, LogArgs};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "ak-schedule",
    about = "Ask about the upcoming course schedule web page",
    version,
    long_version = apikit::LONG_VERSION
)]
struct Cli {
    #[command(flatten)]
    log: LogArgs,
    #[command(flatten)]
    args: ScheduleArgs,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.log);
    let settings = Settings::load();
    let result = schedule::run(cli.args, &settings).await;
    let code = match result {
        Ok(()) => 0,
        Err(err) => apikit::report_error(&err),
    };
    let _ = io::stdout().flush();
    process::exit(code);
}
