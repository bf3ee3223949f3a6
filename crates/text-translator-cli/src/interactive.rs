//! Line-based front end for a translation session.
//!
//! Each stdin line replaces the source text; lines starting with `:` are
//! commands.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use text_translator_core::util::preview;
use text_translator_core::{
    AppConfig, Error, HistoryStore, Lang, Presenter, SessionEvent, TranslationSession, Translator,
    LANGUAGES,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};

use crate::format_history;

const HELP: &str = "\
Type text to translate it. Commands:
  :swap              swap languages and texts
  :source <code>     set the source language
  :target <code>     set the target language
  :clear             clear both texts
  :history [n]       show the last n translations
  :delete <n>        delete history entry n (1 = newest)
  :clear-history     delete all history
  :langs             list language codes
  :help              show this help
  :quit              exit";

/// Prints results to stdout and shows a spinner while a job runs.
pub struct CliPresenter {
    spinner: Option<ProgressBar>,
    interactive: bool,
    last_error: Option<String>,
}

impl CliPresenter {
    pub const fn interactive() -> Self {
        Self {
            spinner: None,
            interactive: true,
            last_error: None,
        }
    }

    /// Leave errors to the caller instead of printing them
    const fn one_shot() -> Self {
        Self {
            spinner: None,
            interactive: false,
            last_error: None,
        }
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl Presenter for CliPresenter {
    fn translation_started(&mut self) {
        self.stop_spinner();

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message("Translating...");
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn translation_result(&mut self, text: &str) {
        self.stop_spinner();

        #[allow(clippy::print_stdout)]
        {
            println!("{text}");
        }
    }

    fn translation_cleared(&mut self) {
        self.stop_spinner();
    }

    fn translation_error(&mut self, detail: &str) {
        self.stop_spinner();
        self.last_error = Some(detail.to_string());

        if self.interactive {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Translation error: {detail}");
            }
        }
    }

    fn storage_error(&mut self, error: &Error) {
        #[allow(clippy::print_stderr)]
        {
            eprintln!("History error: {error}");
        }
    }

    fn texts_replaced(&mut self, source: &str, _target: &str) {
        if source.is_empty() {
            return;
        }

        #[allow(clippy::print_stderr)]
        {
            eprintln!("Source text: {}", preview(source, 60));
        }
    }

    fn history_changed(&mut self) {
        #[allow(clippy::print_stderr)]
        {
            eprintln!("History updated");
        }
    }
}

/// A parsed input line
#[derive(Debug)]
enum Input {
    Event(SessionEvent),
    History(usize),
    Langs,
    Help,
    Quit,
}

fn parse_input(line: &str, list_limit: usize) -> std::result::Result<Input, String> {
    let Some(command) = line.strip_prefix(':') else {
        return Ok(Input::Event(SessionEvent::TextChanged(line.to_string())));
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();

    let input = match (name, arg) {
        ("swap", None) => Input::Event(SessionEvent::Swap),
        ("clear", None) => Input::Event(SessionEvent::ClearText),
        ("clear-history", None) => Input::Event(SessionEvent::ClearHistory),
        ("source", Some(code)) => {
            let lang = Lang::parse(code).map_err(|e| e.to_string())?;
            Input::Event(SessionEvent::SourceLangChanged(lang))
        }
        ("target", Some(code)) => {
            let lang = Lang::parse(code).map_err(|e| e.to_string())?;
            Input::Event(SessionEvent::TargetLangChanged(lang))
        }
        ("history", None) => Input::History(list_limit),
        ("history", Some(n)) => {
            Input::History(n.parse().map_err(|_| format!("Not a number: {n}"))?)
        }
        ("delete", Some(n)) => {
            let position: usize = n.parse().map_err(|_| format!("Not a number: {n}"))?;
            let index = position
                .checked_sub(1)
                .ok_or_else(|| "Positions start at 1".to_string())?;
            Input::Event(SessionEvent::DeleteHistoryAt(index))
        }
        ("langs", None) => Input::Langs,
        ("help", None) => Input::Help,
        ("quit" | "q", None) => Input::Quit,
        _ => return Err(format!("Unknown command ':{command}' (try :help)")),
    };

    if parts.next().is_some() {
        return Err(format!("Too many arguments for ':{name}'"));
    }
    Ok(input)
}

fn format_languages() -> String {
    LANGUAGES
        .iter()
        .map(|lang| format!("{:<6} {}", lang.code, lang.name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Forward stdin lines to the session until EOF or `:quit`.
///
/// EOF lets the last input finish translating (piped use); `:quit` drops it.
async fn read_input(events: mpsc::Sender<SessionEvent>, list_limit: usize) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let input = match parse_input(&line, list_limit) {
            Ok(input) => input,
            Err(message) => {
                #[allow(clippy::print_stderr)]
                {
                    eprintln!("{message}");
                }
                continue;
            }
        };

        match input {
            Input::Event(event) => {
                if events.send(event).await.is_err() {
                    break;
                }
            }
            Input::History(limit) => {
                let (reply, snapshot) = oneshot::channel();
                if events.send(SessionEvent::ListHistory { limit, reply }).await.is_err() {
                    break;
                }
                if let Ok(snapshot) = snapshot.await {
                    #[allow(clippy::print_stdout)]
                    {
                        println!("{}", format_history(&snapshot));
                    }
                }
            }
            Input::Langs => {
                #[allow(clippy::print_stdout)]
                {
                    println!("{}", format_languages());
                }
            }
            Input::Help => {
                #[allow(clippy::print_stdout)]
                {
                    println!("{HELP}");
                }
            }
            Input::Quit => {
                // Session may already be gone
                let _ = events.send(SessionEvent::Quit).await;
                break;
            }
        }
    }

    Ok(())
}

/// Run an interactive session on stdin until EOF or `:quit`
pub async fn run(
    translator: Arc<dyn Translator>,
    history: HistoryStore,
    presenter: CliPresenter,
    config: &AppConfig,
) -> Result<()> {
    let session = TranslationSession::new(translator, history, presenter, config);
    let (events_tx, events_rx) = mpsc::channel(32);

    #[allow(clippy::print_stderr)]
    {
        eprintln!("Translating {}. Type :help for commands.", config.language_pair());
    }

    let reader = tokio::spawn(read_input(events_tx, config.history.list_limit));
    let mut session = session.run(events_rx).await;
    session.presenter_mut().stop_spinner();

    reader.await.context("Input reader panicked")?
}

/// Translate a single text, print the result and return
pub async fn translate_once(
    translator: Arc<dyn Translator>,
    history: HistoryStore,
    config: &AppConfig,
    text: String,
) -> Result<()> {
    let mut session = TranslationSession::new(translator, history, CliPresenter::one_shot(), config);
    session.set_source_text(text);
    session.settle().await;

    match session.presenter_mut().last_error.take() {
        Some(detail) => anyhow::bail!("Translation failed: {detail}"),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> std::result::Result<Input, String> {
        parse_input(line, 50)
    }

    #[test]
    fn test_plain_lines_are_text_changes() {
        assert!(matches!(
            parse("Hello world"),
            Ok(Input::Event(SessionEvent::TextChanged(text))) if text == "Hello world"
        ));
        assert!(matches!(
            parse(""),
            Ok(Input::Event(SessionEvent::TextChanged(text))) if text.is_empty()
        ));
    }

    #[test]
    fn test_language_commands_validate_codes() {
        assert!(matches!(
            parse(":target DE"),
            Ok(Input::Event(SessionEvent::TargetLangChanged(lang))) if lang.as_str() == "de"
        ));
        assert!(parse(":source xx").is_err());
        assert!(parse(":source").is_err());
    }

    #[test]
    fn test_delete_positions_are_one_based() {
        assert!(matches!(
            parse(":delete 1"),
            Ok(Input::Event(SessionEvent::DeleteHistoryAt(0)))
        ));
        assert!(parse(":delete 0").is_err());
        assert!(parse(":delete x").is_err());
    }

    #[test]
    fn test_history_limit() {
        assert!(matches!(parse(":history"), Ok(Input::History(50))));
        assert!(matches!(parse(":history 5"), Ok(Input::History(5))));
    }

    #[test]
    fn test_unknown_and_malformed_commands() {
        assert!(parse(":frobnicate").is_err());
        assert!(parse(":swap now").is_err());
        assert!(matches!(parse(":q"), Ok(Input::Quit)));
    }
}
