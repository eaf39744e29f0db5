use crate::domain::ports::{MessageLevel, MessageSink};

/// Prints action notifications to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMessages;

impl MessageSink for ConsoleMessages {
    fn message_user(&self, level: MessageLevel, message: &str) {
        let marker = match level {
            MessageLevel::Info => "ℹ️",
            MessageLevel::Success => "✅",
            MessageLevel::Warning => "⚠️",
        };
        println!("{} {}", marker, message);
    }
}
