use std::io::{self, Write};
use std::process;

use apikit::commands::sentiment::{self, SentimentArgs};
use apikit::logging::{self, LogArgs};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "ak-sentiment",
    about = "Run sentiment analysis with a pretrained model",
    version,
    long_version = apikit::LONG_VERSION
)]
struct Cli {
    #[command(flatten)]
    log: LogArgs,
    #[command(flatten)]
    args: SentimentArgs,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.log);
    let result = sentiment::run(cli.args).await;
    let code = match result {
        Ok(()) => 0,
        Err(err) => apikit::report_error(&err),
    };
    let _ = io::stdout().flush();
    process::exit(code);
}
