use std::fmt;

/// The text put on the queue for one visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage(String);

impl QueueMessage {
    pub fn greeting(name: &str) -> Self {
        Self(format!("Hello {name}, welcome to Azure Functions Queue!"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueueMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_text() {
        assert_eq!(
            QueueMessage::greeting("Sam").to_string(),
            "Hello Sam, welcome to Azure Functions Queue!"
        );
    }

    #[test]
    fn names_are_used_verbatim() {
        assert_eq!(
            QueueMessage::greeting("  Ada & co ").as_str(),
            "Hello   Ada & co , welcome to Azure Functions Queue!"
        );
    }
}
