use clap::Args;
use tracing::debug;

use crate::adapter::{ConsolePrompter, Input, InputPolicy};
use crate::commands::{gated_input, load_classifier, resolve_model_files};
use crate::error::Result;
use crate::hf::SENTIMENT_MODEL;
use crate::hf::backend;
use crate::hf::classifier::Prediction;

const POLICY: InputPolicy = InputPolicy::single_line(
    "Enter text for sentiment analysis: ",
    "No text provided for analysis.",
);

#[derive(Debug, Clone, Args)]
pub struct SentimentArgs {
    /// Text to analyze; read from stdin when omitted or blank
    pub text: Option<String>,
    /// Hub model id or local model directory
    #[arg(long, default_value = SENTIMENT_MODEL)]
    pub model: String,
}

pub fn format_prediction(prediction: &Prediction) -> String {
    format!(
        "Sentiment: {}, Score: {}",
        prediction.label, prediction.score
    )
}

pub async fn run(args: SentimentArgs) -> Result<()> {
    let backend = backend::probe();
    debug!(%backend, "probed inference backend");

    let mut prompter = ConsolePrompter::new();
    let text = match gated_input(
        &backend,
        "sentiment analysis",
        &mut prompter,
        args.text.as_deref(),
        &POLICY,
    )
    .await?
    {
        Input::Text(text) => text,
        Input::NoInput(message) => {
            println!("{message}");
            return Ok(());
        }
    };

    let files = resolve_model_files(&args.model, true).await?;
    let classifier = load_classifier(&files)?;
    let (_, prediction) = classifier.classify(&text)?;
    println!("{}", format_prediction(&prediction));
    Ok(())
}
