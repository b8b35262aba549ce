//! Announcement sinks.
//!
//! Announcements are fire-and-forget: a sink never reports failure and never
//! blocks the caller.

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

pub trait NotificationSink {
    fn announce(&self, text: &str);
}

impl<T: NotificationSink + ?Sized> NotificationSink for &T {
    fn announce(&self, text: &str) {
        (**self).announce(text)
    }
}

impl<T: NotificationSink + ?Sized> NotificationSink for Box<T> {
    fn announce(&self, text: &str) {
        (**self).announce(text)
    }
}

/// `None` announces nothing.
impl<T: NotificationSink> NotificationSink for Option<T> {
    fn announce(&self, text: &str) {
        if let Some(sink) = self {
            sink.announce(text);
        }
    }
}

/// Fan-out to both sinks, in order.
impl<A: NotificationSink, B: NotificationSink> NotificationSink for (A, B) {
    fn announce(&self, text: &str) {
        self.0.announce(text);
        self.1.announce(text);
    }
}

/// Speaks through an external text-to-speech program (`espeak`, `say`, ...),
/// passing the text as the last argument.
///
/// The child is reaped on a background task. A missing program, a spawn
/// failure, or being called outside a tokio runtime are all silent.
#[derive(Debug, Clone)]
pub struct SpeechSink {
    program: String,
    args: Vec<String>,
}

impl SpeechSink {
    /// `command` is split on whitespace: `"espeak -s 150"`.
    pub fn new(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl NotificationSink for SpeechSink {
    fn announce(&self, text: &str) {
        if tokio::runtime::Handle::try_current().is_err() {
            return;
        }

        let spawned = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(mut child) => {
                tokio::spawn(async move {
                    let _ = child.wait().await;
                });
            }
            Err(e) => debug!(program = %self.program, error = %e, "speech unavailable"),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Keeps every announcement for assertions.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingSink(Arc<Mutex<Vec<String>>>);

    impl RecordingSink {
        pub(crate) fn messages(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl NotificationSink for RecordingSink {
        fn announce(&self, text: &str) {
            self.0.lock().unwrap().push(text.to_string());
        }
    }

    #[test]
    fn fan_out_and_optional_sinks() {
        let a = RecordingSink::default();
        let b = RecordingSink::default();
        let both = (a.clone(), Some(b.clone()));
        both.announce("Meal logged");

        let none: Option<RecordingSink> = None;
        none.announce("ignored");

        assert_eq!(a.messages(), vec!["Meal logged"]);
        assert_eq!(b.messages(), vec!["Meal logged"]);
    }

    #[test]
    fn speech_command_parsing() {
        let sink = SpeechSink::new("espeak -s 150").unwrap();
        assert_eq!(sink.program(), "espeak");
        assert_eq!(sink.args, vec!["-s", "150"]);
        assert!(SpeechSink::new("   ").is_none());
    }

    #[test]
    fn speech_outside_runtime_is_silent() {
        SpeechSink::new("definitely-not-a-real-tts-binary").unwrap().announce("hello");
    }

    #[tokio::test]
    async fn missing_speech_program_is_silent() {
        SpeechSink::new("definitely-not-a-real-tts-binary").unwrap().announce("hello");
    }
}
