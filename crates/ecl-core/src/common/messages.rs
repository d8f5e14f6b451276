use crate::domain::ErrorLocation;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub severity: Severity,
    pub placeholder: &'static str,
    pub text: String,
    #[serde(skip)]
    pub location: Option<ErrorLocation>,
}

/// Non-fatal diagnostics collected while parsing a deck or building a schedule.
///
/// Every pushed message is also emitted as a `tracing` event so that the
/// subscriber installed by the binary sees them as they happen.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageContainer {
    messages: Vec<Message>,
}

impl MessageContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, placeholder: &'static str, text: impl Into<String>) {
        self.push(Severity::Info, placeholder, text.into(), None);
    }

    pub fn warning(&mut self, placeholder: &'static str, text: impl Into<String>) {
        self.push(Severity::Warning, placeholder, text.into(), None);
    }

    pub fn error(&mut self, placeholder: &'static str, text: impl Into<String>) {
        self.push(Severity::Error, placeholder, text.into(), None);
    }

    pub fn push_at(
        &mut self,
        severity: Severity,
        placeholder: &'static str,
        text: impl Into<String>,
        location: ErrorLocation,
    ) {
        self.push(severity, placeholder, text.into(), Some(location));
    }

    fn push(
        &mut self,
        severity: Severity,
        placeholder: &'static str,
        text: String,
        location: Option<ErrorLocation>,
    ) {
        match severity {
            Severity::Info => tracing::info!(placeholder, "{text}"),
            Severity::Warning => tracing::warn!(placeholder, "{text}"),
            Severity::Error => tracing::error!(placeholder, "{text}"),
        }
        self.messages.push(Message {
            severity,
            placeholder,
            text,
            location,
        });
    }

    pub fn extend(&mut self, other: MessageContainer) {
        self.messages.extend(other.messages);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.messages
            .iter()
            .filter(|message| message.severity == severity)
            .count()
    }

    pub fn with_placeholder<'a>(
        &'a self,
        placeholder: &'a str,
    ) -> impl Iterator<Item = &'a Message> + 'a {
        self.messages
            .iter()
            .filter(move |message| message.placeholder == placeholder)
    }
}

#[cfg(test)]
mod tests {
    use super::{MessageContainer, Severity};

    #[test]
    fn container_counts_by_severity_and_placeholder() {
        let mut messages = MessageContainer::new();
        messages.info("SCHEDULE.AUTO_SHUT", "well OP1 shut");
        messages.warning("DECK.UNKNOWN_KEYWORD", "skipping FOO");
        messages.error("TABLES.AMBIGUOUS_KEYWORD", "ROCKTAB twice");

        assert_eq!(messages.len(), 3);
        assert_eq!(messages.count(Severity::Error), 1);
        assert_eq!(messages.with_placeholder("DECK.UNKNOWN_KEYWORD").count(), 1);
    }
}
