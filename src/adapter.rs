//! Input acquisition and response normalization shared by every command.
//!
//! Each command follows the same single-shot flow: take the argument if it
//! carries text, otherwise ask on stdin; stop with a benign message when
//! nothing usable arrives; otherwise make one provider call and print its
//! trimmed result.

use std::io::{self, BufRead, IsTerminal, Read as _, Write};

use async_trait::async_trait;
use tracing::debug;

pub const NO_INPUT_RECEIVED: &str = "No input received.";

/// Outcome of one read from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Read {
    Text(String),
    Eof,
    Interrupted,
}

#[async_trait]
pub trait Prompter: Send {
    /// Shows `prompt` and reads a single line.
    async fn read_line(&mut self, prompt: &str) -> io::Result<Read>;

    /// Shows `prompt` and reads until end of stream.
    async fn read_to_end(&mut self, prompt: &str) -> io::Result<Read>;

    /// Called once input collection is over, whatever its outcome.
    fn finish(&mut self) {}
}

/// How a command collects its text.
#[derive(Debug, Clone, Copy)]
pub struct InputPolicy {
    pub prompt: &'static str,
    /// Message returned when the collected text is blank.
    pub empty_message: &'static str,
    /// When set, a blank first line switches to multi-line input.
    pub multiline_prompt: Option<&'static str>,
    /// When set, a blank first line is replaced by this text.
    pub fallback: Option<&'static str>,
}

impl InputPolicy {
    pub const fn single_line(prompt: &'static str, empty_message: &'static str) -> Self {
        Self {
            prompt,
            empty_message,
            multiline_prompt: None,
            fallback: None,
        }
    }

    pub const fn with_multiline(mut self, prompt: &'static str) -> Self {
        self.multiline_prompt = Some(prompt);
        self
    }

    pub const fn with_fallback(mut self, text: &'static str) -> Self {
        self.fallback = Some(text);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Text(String),
    NoInput(&'static str),
}

/// Result of one adapter invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Answer(String),
    NoInput(&'static str),
}

impl Reply {
    pub fn message(&self) -> &str {
        match self {
            Self::Answer(text) => text,
            Self::NoInput(message) => message,
        }
    }
}

pub fn normalize_text(raw: &str) -> String {
    raw.trim().to_string()
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Collects the command's text and then releases the prompter.
pub async fn acquire<P>(
    argument: Option<&str>,
    prompter: &mut P,
    policy: &InputPolicy,
) -> io::Result<Input>
where
    P: Prompter + ?Sized,
{
    let input = collect(argument, prompter, policy).await;
    prompter.finish();
    input
}

async fn collect<P>(
    argument: Option<&str>,
    prompter: &mut P,
    policy: &InputPolicy,
) -> io::Result<Input>
where
    P: Prompter + ?Sized,
{
    if let Some(text) = argument.and_then(non_blank) {
        return Ok(Input::Text(text));
    }

    let line = match prompter.read_line(policy.prompt).await? {
        Read::Text(line) => line,
        Read::Eof | Read::Interrupted => {
            debug!("no interactive input");
            return Ok(Input::NoInput(NO_INPUT_RECEIVED));
        }
    };
    if let Some(text) = non_blank(&line) {
        return Ok(Input::Text(text));
    }

    if let Some(fallback) = policy.fallback {
        debug!(fallback, "blank input, using default text");
        return Ok(Input::Text(fallback.to_string()));
    }

    let Some(multiline_prompt) = policy.multiline_prompt else {
        return Ok(Input::NoInput(policy.empty_message));
    };
    match prompter.read_to_end(multiline_prompt).await? {
        Read::Text(block) => Ok(non_blank(&block)
            .map(Input::Text)
            .unwrap_or(Input::NoInput(policy.empty_message))),
        Read::Eof => Ok(Input::NoInput(policy.empty_message)),
        Read::Interrupted => Ok(Input::NoInput(NO_INPUT_RECEIVED)),
    }
}

/// Stdin-backed prompter.
///
/// Prompts are shown only when stdin is a terminal. Piped stdin is consumed
/// whole on the first read. Ctrl-C while waiting yields [`Read::Interrupted`];
/// once input is finished, the next Ctrl-C ends the process with status 130.
#[derive(Debug, Default)]
pub struct ConsolePrompter {
    drained: bool,
    listening: bool,
    released: bool,
}

impl ConsolePrompter {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_with_interrupt<F>(&mut self, prompt: &str, read: F) -> io::Result<Read>
    where
        F: FnOnce() -> io::Result<String> + Send + 'static,
    {
        if self.drained {
            return Ok(Read::Eof);
        }
        if io::stdin().is_terminal() {
            let mut stdout = io::stdout();
            write!(stdout, "{prompt}")?;
            stdout.flush()?;
        }

        self.listening = true;
        let reading = tokio::task::spawn_blocking(read);
        tokio::select! {
            joined = reading => {
                let text = joined.map_err(io::Error::other)??;
                if text.is_empty() {
                    self.drained = true;
                    return Ok(Read::Eof);
                }
                Ok(Read::Text(text))
            }
            Ok(()) = tokio::signal::ctrl_c() => {
                println!();
                Ok(Read::Interrupted)
            }
        }
    }
}

/// Exit status for a run cut short by SIGINT.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

// The tokio SIGINT handler stays installed for the life of the process, so
// the default terminate-on-Ctrl-C has to be put back by hand.
fn exit_on_next_interrupt() {
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupted after input");
            let _ = io::stdout().flush();
            eprintln!();
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    });
}

fn read_stdin_line() -> io::Result<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

fn read_stdin_to_end() -> io::Result<String> {
    let mut block = String::new();
    io::stdin().lock().read_to_string(&mut block)?;
    Ok(block)
}

#[async_trait]
impl Prompter for ConsolePrompter {
    async fn read_line(&mut self, prompt: &str) -> io::Result<Read> {
        if io::stdin().is_terminal() {
            self.read_with_interrupt(prompt, read_stdin_line).await
        } else {
            let read = self.read_with_interrupt(prompt, read_stdin_to_end).await;
            self.drained = true;
            read
        }
    }

    async fn read_to_end(&mut self, prompt: &str) -> io::Result<Read> {
        let read = self.read_with_interrupt(prompt, read_stdin_to_end).await;
        self.drained = true;
        read
    }

    fn finish(&mut self) {
        if self.listening && !self.released {
            self.released = true;
            exit_on_next_interrupt();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedPrompter;

    const POLICY: InputPolicy = InputPolicy::single_line("Enter text: ", "No text provided.");

    #[tokio::test]
    async fn argument_wins_and_is_trimmed() {
        let mut prompter = ScriptedPrompter::new([Read::Text("ignored".into())]);
        let input = acquire(Some("  hello \n"), &mut prompter, &POLICY)
            .await
            .expect("no io error");
        assert_eq!(input, Input::Text("hello".to_string()));
        assert!(prompter.prompts.is_empty());
    }

    #[tokio::test]
    async fn blank_argument_falls_through_to_the_prompt() {
        let mut prompter = ScriptedPrompter::new([Read::Text("from stdin\n".into())]);
        let input = acquire(Some("   "), &mut prompter, &POLICY)
            .await
            .expect("no io error");
        assert_eq!(input, Input::Text("from stdin".to_string()));
        assert_eq!(prompter.prompts, vec!["Enter text: ".to_string()]);
    }

    #[tokio::test]
    async fn whitespace_line_yields_the_policy_message() {
        let mut prompter = ScriptedPrompter::new([Read::Text(" \t \n".into())]);
        let input = acquire(None, &mut prompter, &POLICY)
            .await
            .expect("no io error");
        assert_eq!(input, Input::NoInput("No text provided."));
    }

    #[tokio::test]
    async fn eof_and_interrupt_yield_no_input_received() {
        for read in [Read::Eof, Read::Interrupted] {
            let mut prompter = ScriptedPrompter::new([read]);
            let input = acquire(None, &mut prompter, &POLICY)
                .await
                .expect("no io error");
            assert_eq!(input, Input::NoInput(NO_INPUT_RECEIVED));
        }
    }

    #[tokio::test]
    async fn blank_line_switches_to_multiline_when_allowed() {
        let policy = POLICY.with_multiline("Paste text, then Ctrl-D:");
        let mut prompter = ScriptedPrompter::new([
            Read::Text("\n".into()),
            Read::Text("line one\nline two\n".into()),
        ]);
        let input = acquire(None, &mut prompter, &policy)
            .await
            .expect("no io error");
        assert_eq!(input, Input::Text("line one\nline two".to_string()));
        assert_eq!(prompter.prompts.len(), 2);
    }

    #[tokio::test]
    async fn interrupted_multiline_read_is_no_input_received() {
        let policy = POLICY.with_multiline("Paste text:");
        let mut prompter = ScriptedPrompter::new([Read::Text("\n".into()), Read::Interrupted]);
        let input = acquire(None, &mut prompter, &policy)
            .await
            .expect("no io error");
        assert_eq!(input, Input::NoInput(NO_INPUT_RECEIVED));
    }

    #[tokio::test]
    async fn blank_multiline_read_is_the_policy_message() {
        let policy = POLICY.with_multiline("Paste text:");
        let mut prompter = ScriptedPrompter::new([Read::Text("\n".into()), Read::Eof]);
        let input = acquire(None, &mut prompter, &policy)
            .await
            .expect("no io error");
        assert_eq!(input, Input::NoInput("No text provided."));
    }

    #[tokio::test]
    async fn blank_line_uses_fallback_text() {
        let policy = POLICY.with_fallback("What is next?");
        let mut prompter = ScriptedPrompter::new([Read::Text("\n".into())]);
        let input = acquire(None, &mut prompter, &policy)
            .await
            .expect("no io error");
        assert_eq!(input, Input::Text("What is next?".to_string()));
    }

    #[tokio::test]
    async fn collection_is_finished_exactly_once_on_every_outcome() {
        let cases = [
            (Some("argument"), vec![]),
            (None, vec![Read::Text("typed\n".into())]),
            (None, vec![Read::Interrupted]),
            (None, vec![Read::Text("\n".into()), Read::Eof]),
        ];
        let policy = POLICY.with_multiline("Paste text:");
        for (argument, reads) in cases {
            let mut prompter = ScriptedPrompter::new(reads);
            acquire(argument, &mut prompter, &policy)
                .await
                .expect("no io error");
            assert_eq!(prompter.finished, 1);
        }
    }

    #[tokio::test]
    async fn console_restores_interrupt_only_after_listening() {
        let mut unused = ConsolePrompter::new();
        unused.finish();
        assert!(!unused.released);

        let mut prompter = ConsolePrompter {
            listening: true,
            ..ConsolePrompter::default()
        };
        prompter.finish();
        prompter.finish();
        assert!(prompter.released);
    }

    #[test]
    fn normalize_trims_provider_text() {
        assert_eq!(normalize_text("\n  Paris \t"), "Paris");
    }
}
