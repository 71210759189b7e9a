//! Chat-completion commands: keyword extraction and plain generation.

use clap::Args;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::adapter::{self, ConsolePrompter, Input, InputPolicy, Prompter, Reply, normalize_text};
use crate::commands::{CallDefaults, ModelArgs, print_reply};
use crate::config::Settings;
use crate::error::Result;
use crate::rchain::prompts;
use crate::rchain::provider::{AskOptions, ChatMessage, ChatModel, api_key_env};

pub const NO_TEXT_PROVIDED: &str = "No text provided.";

const KEYWORDS_POLICY: InputPolicy = InputPolicy::single_line(
    "Enter text to summarize (leave empty to paste multi-line and press Ctrl-D): ",
    NO_TEXT_PROVIDED,
)
.with_multiline(
    "Enter text to summarize. Press Ctrl-D (macOS/Linux) or Ctrl-Z then Enter (Windows) when done:\n",
);

const GENERATE_POLICY: InputPolicy = InputPolicy::single_line(
    "Enter a prompt (leave empty to paste multi-line and press Ctrl-D): ",
    NO_TEXT_PROVIDED,
)
.with_multiline("Enter a prompt. Press Ctrl-D when done:\n");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatTask {
    /// Few-shot keyword extraction.
    Keywords,
    /// Single prompt to a helpful assistant.
    Generate,
}

impl ChatTask {
    pub fn policy(self) -> InputPolicy {
        match self {
            Self::Keywords => KEYWORDS_POLICY,
            Self::Generate => GENERATE_POLICY,
        }
    }

    pub fn defaults(self) -> CallDefaults {
        match self {
            Self::Keywords => CallDefaults {
                temperature: 0.7,
                max_tokens: Some(100),
            },
            Self::Generate => CallDefaults {
                temperature: 0.7,
                max_tokens: Some(150),
            },
        }
    }

    pub fn messages(self, text: &str) -> Vec<ChatMessage> {
        match self {
            Self::Keywords => prompts::keyword_messages(text),
            Self::Generate => prompts::assistant_messages(text),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ChatArgs {
    /// Input text; read from stdin when omitted or blank
    pub text: Option<String>,
    #[command(flatten)]
    pub model: ModelArgs,
    /// Print the request that would be sent and exit without calling the provider
    #[arg(long)]
    pub dry_run: bool,
    /// Print the answer as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct DryRun<'a> {
    dry_run: bool,
    provider: &'a str,
    model: &'a str,
    #[serde(flatten)]
    options: &'a AskOptions,
    messages: &'a [ChatMessage],
}

/// Acquires input and makes the single completion call.
///
/// Returns [`Reply::NoInput`] without calling `chat` when no text arrives.
pub async fn respond(
    task: ChatTask,
    chat: &dyn ChatModel,
    prompter: &mut dyn Prompter,
    argument: Option<&str>,
    options: &AskOptions,
) -> Result<Reply> {
    let text = match adapter::acquire(argument, prompter, &task.policy()).await? {
        Input::Text(text) => text,
        Input::NoInput(message) => return Ok(Reply::NoInput(message)),
    };

    let response = chat.complete(&task.messages(&text), options).await?;
    Ok(Reply::Answer(normalize_text(&response.content)))
}

pub async fn run(task: ChatTask, args: ChatArgs, settings: &Settings) -> Result<()> {
    let choice = args.model.resolve(task.defaults())?;
    let mut prompter = ConsolePrompter::new();

    if args.dry_run {
        debug!(
            provider = %choice.provider,
            api_key_present = settings
                .credentials
                .is_present(api_key_env(choice.provider)),
            "dry run, no request will be sent"
        );
        match adapter::acquire(args.text.as_deref(), &mut prompter, &task.policy()).await? {
            Input::NoInput(message) => println!("{message}"),
            Input::Text(text) => {
                let messages = task.messages(&text);
                let request = DryRun {
                    dry_run: true,
                    provider: choice.provider.as_str(),
                    model: &choice.model,
                    options: &choice.options,
                    messages: &messages,
                };
                println!("{}", serde_json::to_string_pretty(&request)?);
            }
        }
        return Ok(());
    }

    let client = choice.client(settings)?;
    let reply = respond(
        task,
        &client,
        &mut prompter,
        args.text.as_deref(),
        &choice.options,
    )
    .await?;

    match (&reply, args.json) {
        (Reply::Answer(content), true) => {
            let body = json!({
                "provider": choice.provider.as_str(),
                "model": choice.model,
                "content": content,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        _ => print_reply(&reply),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{NO_INPUT_RECEIVED, Read};
    use crate::testing::{FakeChat, ScriptedPrompter};

    fn options() -> AskOptions {
        AskOptions {
            temperature: Some(0.7),
            max_tokens: Some(100),
            timeout_secs: None,
        }
    }

    #[tokio::test]
    async fn keyword_extraction_returns_the_model_text_exactly() {
        let chat = FakeChat::replying(["sky, blue"]);
        let mut prompter = ScriptedPrompter::default();
        let reply = respond(
            ChatTask::Keywords,
            &chat,
            &mut prompter,
            Some("The sky is blue."),
            &options(),
        )
        .await
        .expect("call succeeds");

        assert_eq!(reply, Reply::Answer("sky, blue".to_string()));
        assert_eq!(chat.calls(), 1);
        let sent = chat.last_messages();
        assert_eq!(sent.len(), 6);
        assert_eq!(sent.last().map(|m| m.content.as_str()), Some("The sky is blue."));
    }

    #[tokio::test]
    async fn generation_trims_the_answer() {
        let chat = FakeChat::replying(["\n  Paris \n"]);
        let mut prompter = ScriptedPrompter::default();
        let reply = respond(
            ChatTask::Generate,
            &chat,
            &mut prompter,
            Some("What is the capital of France?"),
            &options(),
        )
        .await
        .expect("call succeeds");
        assert_eq!(reply.message(), "Paris");
        assert!(chat.last_messages()[0].is_system());
    }

    #[tokio::test]
    async fn blank_input_makes_no_call() {
        let chat = FakeChat::replying(["unused"]);
        let mut prompter = ScriptedPrompter::new([Read::Text("  \n".into()), Read::Text("\n\n".into())]);
        let reply = respond(ChatTask::Keywords, &chat, &mut prompter, None, &options())
            .await
            .expect("no error");
        assert_eq!(reply, Reply::NoInput(NO_TEXT_PROVIDED));
        assert_eq!(chat.calls(), 0);
    }

    #[tokio::test]
    async fn interrupted_input_makes_no_call() {
        let chat = FakeChat::replying(["unused"]);
        let mut prompter = ScriptedPrompter::new([Read::Interrupted]);
        let reply = respond(ChatTask::Keywords, &chat, &mut prompter, None, &options())
            .await
            .expect("no error");
        assert_eq!(reply.message(), NO_INPUT_RECEIVED);
        assert_eq!(chat.calls(), 0);
    }

    #[tokio::test]
    async fn multiline_paste_is_used_after_a_blank_line() {
        let chat = FakeChat::replying(["wewa, tank"]);
        let mut prompter = ScriptedPrompter::new([
            Read::Text("\n".into()),
            Read::Text("The wewa is a tank.\nIt waters rice.\n".into()),
        ]);
        let reply = respond(ChatTask::Keywords, &chat, &mut prompter, None, &options())
            .await
            .expect("call succeeds");
        assert_eq!(reply.message(), "wewa, tank");
        assert_eq!(
            chat.last_messages().last().map(|m| m.content.clone()),
            Some("The wewa is a tank.\nIt waters rice.".to_string())
        );
    }

    #[test]
    fn task_defaults_match_the_fixed_parameters() {
        assert_eq!(ChatTask::Keywords.defaults().max_tokens, Some(100));
        assert_eq!(ChatTask::Generate.defaults().max_tokens, Some(150));
        assert_eq!(ChatTask::Generate.messages("hi").len(), 2);
    }
}
