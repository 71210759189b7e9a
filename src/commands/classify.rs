//! Sequence classification plus saving and reloading the model pair.

use std::path::PathBuf;

use clap::Args;
use tracing::debug;

use crate::adapter::{ConsolePrompter, Input, InputPolicy};
use crate::commands::{gated_input, load_classifier, resolve_model_files};
use crate::error::Result;
use crate::hf::CLASSIFICATION_MODEL;
use crate::hf::backend;
use crate::hf::classifier::{LabelTable, Logits, Prediction};
use crate::hf::hub::ModelFiles;
use crate::hf::tokenizer::TextTokenizer;

const POLICY: InputPolicy = InputPolicy::single_line(
    "Enter text for classification: ",
    "No text provided for classification.",
);

#[derive(Debug, Clone, Args)]
pub struct ClassifyArgs {
    /// Text to classify; read from stdin when omitted or blank
    pub text: Option<String>,
    /// Hub model id or local model directory
    #[arg(long, default_value = CLASSIFICATION_MODEL)]
    pub model: String,
    /// Save the tokenizer/model pair here after classifying
    #[arg(long)]
    pub save_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct SaveModelArgs {
    /// Directory to write the tokenizer and model files to
    pub dir: PathBuf,
    /// Hub model id or local model directory to copy from
    #[arg(long, default_value = CLASSIFICATION_MODEL)]
    pub model: String,
}

#[derive(Debug, Clone, Args)]
pub struct LoadModelArgs {
    /// Directory written by `save-model`
    pub dir: PathBuf,
}

pub fn report_lines(logits: &Logits, prediction: &Prediction) -> [String; 3] {
    [
        format!("Input IDs: {:?}", logits.input_ids),
        format!("Predicted class ID: {}", prediction.class_id),
        format!("Predicted class label: {}", prediction.label),
    ]
}

pub async fn run(args: ClassifyArgs) -> Result<()> {
    let backend = backend::probe();
    debug!(%backend, "probed inference backend");

    let mut prompter = ConsolePrompter::new();
    let text = match gated_input(
        &backend,
        "classification",
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
    let (logits, prediction) = classifier.classify(&text)?;
    for line in report_lines(&logits, &prediction) {
        println!("{line}");
    }

    if let Some(dir) = &args.save_dir {
        files.save_to(dir)?;
    }
    Ok(())
}

pub async fn save(args: SaveModelArgs) -> Result<()> {
    let files = resolve_model_files(&args.model, true).await?;
    files.save_to(&args.dir)?;
    println!(
        "Saved '{}' to '{}'",
        args.model.trim(),
        args.dir.display()
    );
    Ok(())
}

/// Summary of a saved model directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModel {
    pub vocab_size: usize,
    pub labels: LabelTable,
    pub weights: Option<String>,
}

pub fn inspect(dir: &std::path::Path) -> Result<LoadedModel> {
    let files = ModelFiles::from_dir(dir)?;
    let tokenizer = TextTokenizer::from_files(&files)?;
    let labels = LabelTable::from_config_file(&files.origin, &files.config)?;
    Ok(LoadedModel {
        vocab_size: tokenizer.vocab_size(),
        labels,
        weights: files
            .weights
            .as_ref()
            .and_then(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned()),
    })
}

pub fn load(args: LoadModelArgs) -> Result<()> {
    let loaded = inspect(&args.dir)?;
    println!("Loaded '{}'", args.dir.display());
    println!("Tokenizer vocabulary: {}", loaded.vocab_size);
    println!("Labels: {}", loaded.labels.len());
    println!(
        "Weights: {}",
        loaded.weights.as_deref().unwrap_or("none")
    );
    Ok(())
}
