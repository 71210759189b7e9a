use clap::Args;

use crate::adapter::{self, ConsolePrompter, Input, InputPolicy};
use crate::commands::resolve_model_files;
use crate::error::Result;
use crate::hf::SENTIMENT_MODEL;
use crate::hf::tokenizer::{EncodedText, TextTokenizer};

const POLICY: InputPolicy = InputPolicy::single_line(
    "Enter text to tokenize: ",
    "No text provided for tokenization.",
);

#[derive(Debug, Clone, Args)]
pub struct TokenizeArgs {
    /// Text to tokenize; read from stdin when omitted or blank
    pub text: Option<String>,
    /// Hub model id or local model directory
    #[arg(long, default_value = SENTIMENT_MODEL)]
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizeReport {
    pub encoding: EncodedText,
    pub detokenized: Vec<String>,
    pub input_ids: Vec<u32>,
}

impl TokenizeReport {
    pub fn build(tokenizer: &TextTokenizer, text: &str) -> Result<Self> {
        let encoding = EncodedText::from(&tokenizer.encode(text)?);
        let detokenized = tokenizer.detokenize(std::slice::from_ref(&encoding.input_ids))?;
        let input_ids = tokenizer.input_ids(text)?;
        Ok(Self {
            encoding,
            detokenized,
            input_ids,
        })
    }

    pub fn lines(&self) -> Result<[String; 3]> {
        Ok([
            serde_json::to_string(&self.encoding)?,
            format!("Detokenized text: {:?}", self.detokenized),
            format!("Input IDs: {:?}", self.input_ids),
        ])
    }
}

pub async fn run(args: TokenizeArgs) -> Result<()> {
    let mut prompter = ConsolePrompter::new();
    let text = match adapter::acquire(args.text.as_deref(), &mut prompter, &POLICY).await? {
        Input::Text(text) => text,
        Input::NoInput(message) => {
            println!("{message}");
            return Ok(());
        }
    };

    let files = resolve_model_files(&args.model, false).await?;
    let tokenizer = TextTokenizer::from_files(&files)?;
    for line in TokenizeReport::build(&tokenizer, &text)?.lines()? {
        println!("{line}");
    }
    Ok(())
}
