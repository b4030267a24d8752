// Terminal collaborators of the deletion guard

use std::io::{BufRead, Write};

use nsguard_core::{Namespace, NotificationSink, Presentation};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::session::Prompt;

/// Writes guard notifications to stderr
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl NotificationSink for TerminalNotifier {
    fn success(&self, text: &str) {
        info!("{}", text);
        eprintln!("{}", text);
    }

    fn error(&self, text: &str, title: &str) {
        error!(title, "{}", text);
        eprintln!("{}: {}", title, text);
    }
}

/// What the guard asks of the prompt loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogSignal {
    /// Ask the operator to confirm deleting this namespace
    Confirm(Namespace),
    /// The namespace is gone; the session is over
    Reloaded,
}

/// Forwards dialog requests to the prompt loop
#[derive(Debug, Clone)]
pub struct TerminalPresentation {
    sender: mpsc::UnboundedSender<DialogSignal>,
}

impl TerminalPresentation {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DialogSignal>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn send(&self, signal: DialogSignal) {
        if self.sender.send(signal).is_err() {
            warn!("Prompt loop is gone, dropping dialog request");
        }
    }
}

impl Presentation for TerminalPresentation {
    fn show_confirm_dialog(&self, namespace: &Namespace) {
        self.send(DialogSignal::Confirm(namespace.clone()));
    }

    fn reload(&self) {
        info!("Deletion finished, ending session");
        self.send(DialogSignal::Reloaded);
    }
}

/// Asks questions on stderr and reads answers from stdin
#[derive(Debug, Default)]
pub struct TerminalPrompt {
    assume_yes: bool,
}

impl TerminalPrompt {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

#[async_trait::async_trait]
impl Prompt for TerminalPrompt {
    async fn confirm(&self, question: &str) -> bool {
        if self.assume_yes {
            eprintln!("{} [y/N] y", question);
            return true;
        }

        eprint!("{} [y/N] ", question);
        let _ = std::io::stderr().flush();

        // stdin reads cannot be cancelled; park them on the blocking pool
        let answer = tokio::task::spawn_blocking(|| {
            let mut answer = String::new();
            std::io::stdin().lock().read_line(&mut answer).map(|_| answer)
        })
        .await;
        match answer {
            Ok(Ok(answer)) => is_yes(&answer),
            Ok(Err(e)) => {
                warn!("Failed to read answer: {}", e);
                false
            }
            Err(e) => {
                warn!("Answer reader failed: {}", e);
                false
            }
        }
    }

    fn show(&self, text: &str) {
        eprintln!("{}", text);
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use nsguard_common::Env;

    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("no"));
    }

    #[tokio::test]
    async fn test_assume_yes_never_reads_stdin() {
        assert!(TerminalPrompt::new(true).confirm("Delete?").await);
    }

    #[test]
    fn test_presentation_forwards_signals() {
        let (presentation, mut receiver) = TerminalPresentation::new();
        let ns = Namespace::new("app1", Env::Dev, "default", "TEST1.common");

        presentation.show_confirm_dialog(&ns);
        presentation.reload();

        assert_eq!(receiver.try_recv().unwrap(), DialogSignal::Confirm(ns));
        assert_eq!(receiver.try_recv().unwrap(), DialogSignal::Reloaded);
    }

    #[test]
    fn test_presentation_without_receiver() {
        let (presentation, receiver) = TerminalPresentation::new();
        drop(receiver);
        presentation.reload();
    }
}
