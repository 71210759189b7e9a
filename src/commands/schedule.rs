//! Question answering over a fetched web page.

use clap::Args;

use crate::adapter::{self, ConsolePrompter, Input, InputPolicy, Prompter};
use crate::commands::docqa::{answer_from_documents, print_sources};
use crate::commands::{CallDefaults, ModelArgs};
use crate::config::Settings;
use crate::error::Result;
use crate::rchain::embeddings::{DEFAULT_EMBEDDING_MODEL, OpenAiEmbeddings};
use crate::rchain::loaders::load_web_page;
use crate::rchain::retrieval::DEFAULT_K;

pub const DEFAULT_URL: &str = "https://365datascience.com/upcoming-courses";
pub const DEFAULT_QUERY: &str =
    "What is the next course to be uploaded on the 365DataScience platform?";

const POLICY: InputPolicy = InputPolicy::single_line(
    "Enter your query (leave empty to ask about the next course): ",
    "No query provided.",
)
.with_fallback(DEFAULT_QUERY);

const DEFAULTS: CallDefaults = CallDefaults {
    temperature: 0.5,
    max_tokens: None,
};

#[derive(Debug, Clone, Args)]
pub struct ScheduleArgs {
    /// Question about the page; asked interactively when omitted
    pub query: Option<String>,
    /// Page to load
    #[arg(long, default_value = DEFAULT_URL)]
    pub url: String,
    #[command(flatten)]
    pub model: ModelArgs,
    /// Chunks retrieved per question
    #[arg(short = 'k', long, default_value_t = DEFAULT_K)]
    pub top_k: usize,
    /// Print the chunks the answer was built from
    #[arg(long)]
    pub show_sources: bool,
}

/// Blank interactive input becomes the default course question.
pub async fn read_query(prompter: &mut dyn Prompter, argument: Option<&str>) -> Result<Input> {
    Ok(adapter::acquire(argument, prompter, &POLICY).await?)
}

pub async fn run(args: ScheduleArgs, settings: &Settings) -> Result<()> {
    let choice = args.model.resolve(DEFAULTS)?;
    let chat = choice.client(settings)?;
    let embedder = OpenAiEmbeddings::new(DEFAULT_EMBEDDING_MODEL, settings)?;

    let mut prompter = ConsolePrompter::new();
    let query = match read_query(&mut prompter, args.query.as_deref()).await? {
        Input::Text(query) => query,
        Input::NoInput(message) => {
            println!("{message}");
            return Ok(());
        }
    };

    let http = reqwest::Client::new();
    let documents = load_web_page(&http, &args.url).await?;
    let answer = answer_from_documents(
        &chat,
        &embedder,
        &documents,
        &query,
        choice.options,
        args.top_k,
    )
    .await?;

    println!("Response: {}", answer.answer);
    if args.show_sources {
        print_sources(&answer);
    }
    Ok(())
}
