pub mod config;
pub mod messages;

pub use config::{ErrorAction, ParseConfig, ParseErrorKind};
pub use messages::{Message, MessageContainer, Severity};
