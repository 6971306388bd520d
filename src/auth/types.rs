//! Types for authentication and identity

use serde::{Deserialize, Serialize};

/// The current identity as reported by the session provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    /// The identity id
    #[serde(rename = "$id")]
    pub id: String,

    /// The identity's email address
    pub email: Option<String>,

    /// The identity's display name
    pub name: Option<String>,
}

impl Identity {
    /// Display label: name, falling back to email, falling back to the id
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_prefers_name_then_email_then_id() {
        let mut identity = Identity {
            id: "u1".into(),
            email: Some("a@example.com".into()),
            name: Some("Ada".into()),
        };
        assert_eq!(identity.label(), "Ada");

        identity.name = Some(String::new());
        assert_eq!(identity.label(), "a@example.com");

        identity.email = None;
        assert_eq!(identity.label(), "u1");
    }
}
