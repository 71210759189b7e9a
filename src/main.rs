use std::io::{self, Write};
use std::process;

use apikit::commands::classify::{self, ClassifyArgs, LoadModelArgs, SaveModelArgs};
use apikit::commands::config::{self, ConfigArgs};
use apikit::commands::docqa::{self, DocQaArgs};
use apikit::commands::keywords::{self, ChatArgs, ChatTask};
use apikit::commands::schedule::{self, ScheduleArgs};
use apikit::commands::sentiment::{self, SentimentArgs};
use apikit::commands::tokenize::{self, TokenizeArgs};
use apikit::config::Settings;
use apikit::logging::{self, LogArgs};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, shells};

const ROOT_HELP_EXAMPLES: &str = "Examples:\n  apikit keywords \"The sky is blue and the grass is green.\"\n  echo \"What is Rust?\" | apikit generate\n  apikit sentiment \"I love this product\"\n  apikit docqa --file notes.txt \"What are the action items?\"\n  apikit keywords --dry-run \"Preview the request\"\n  apikit completion bash > ~/.local/share/bash-completion/completions/apikit";

#[derive(Debug, Parser)]
#[command(
    name = "apikit",
    about = "Single-shot adapters for hosted LLMs, pretrained classifiers and document QA",
    version,
    long_version = apikit::LONG_VERSION,
    after_help = ROOT_HELP_EXAMPLES
)]
struct Cli {
    #[command(flatten)]
    log: LogArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Extract keywords from a block of text")]
    Keywords(ChatArgs),
    #[command(about = "Answer a prompt with a helpful assistant")]
    Generate(ChatArgs),
    #[command(about = "Run sentiment analysis with a pretrained model")]
    Sentiment(SentimentArgs),
    #[command(about = "Classify text with a sequence-classification model")]
    Classify(ClassifyArgs),
    #[command(about = "Download a tokenizer/model pair into a directory")]
    SaveModel(SaveModelArgs),
    #[command(about = "Reload a tokenizer/model pair saved with save-model")]
    LoadModel(LoadModelArgs),
    #[command(about = "Tokenize text and decode it back")]
    Tokenize(TokenizeArgs),
    #[command(about = "Ask a question about a local text document")]
    Docqa(DocQaArgs),
    #[command(about = "Ask about the upcoming course schedule web page")]
    Schedule(ScheduleArgs),
    #[command(about = "Manage local config")]
    Config(ConfigArgs),
    #[command(about = "Generate shell completion script")]
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

fn print_completion(shell: CompletionShell) {
    let mut cmd = Cli::command();
    match shell {
        CompletionShell::Bash => generate(shells::Bash, &mut cmd, "apikit", &mut io::stdout()),
        CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, "apikit", &mut io::stdout()),
        CompletionShell::Fish => generate(shells::Fish, &mut cmd, "apikit", &mut io::stdout()),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.log);
    let settings = Settings::load();

    let result = match cli.command {
        Commands::Keywords(args) => keywords::run(ChatTask::Keywords, args, &settings).await,
        Commands::Generate(args) => keywords::run(ChatTask::Generate, args, &settings).await,
        Commands::Sentiment(args) => sentiment::run(args).await,
        Commands::Classify(args) => classify::run(args).await,
        Commands::SaveModel(args) => classify::save(args).await,
        Commands::LoadModel(args) => classify::load(args),
        Commands::Tokenize(args) => tokenize::run(args).await,
        Commands::Docqa(args) => docqa::run(args, &settings).await,
        Commands::Schedule(args) => schedule::run(args, &settings).await,
        Commands::Config(args) => config::run(args, &settings),
        Commands::Completion { shell } => {
            print_completion(shell);
            Ok(())
        }
    };

    // A blocked stdin reader must not keep the runtime alive.
    let code = match result {
        Ok(()) => 0,
        Err(err) => apikit::report_error(&err),
    };
    let _ = io::stdout().flush();
    process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn save_model_takes_the_directory_positionally() {
        let cli = Cli::try_parse_from(["apikit", "save-model", "./model"]).expect("parses");
        let Commands::SaveModel(args) = cli.command else {
            panic!("expected save-model");
        };
        assert_eq!(args.dir, std::path::PathBuf::from("./model"));
        assert_eq!(args.model, apikit::hf::CLASSIFICATION_MODEL);
    }
}
