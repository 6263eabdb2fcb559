//! Message personalization.

use crate::types::CustomerSnapshot;

/// Placeholder replaced with the recipient's display name.
pub const NAME_PLACEHOLDER: &str = "{name}";

/// Campaign message body using `{name}` placeholder syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    body: String,
}

impl MessageTemplate {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// Substitute every `{name}`. Any other `{...}` token is left verbatim.
    pub fn render(&self, display_name: &str) -> String {
        self.body.replace(NAME_PLACEHOLDER, display_name)
    }

    pub fn render_for(&self, customer: &CustomerSnapshot) -> String {
        self.render(&customer.name)
    }
}

impl From<&str> for MessageTemplate {
    fn from(body: &str) -> Self {
        Self::new(body)
    }
}
