use serde::{Deserialize, Serialize};

/// Default display name for a freshly created session.
///
/// The first-exchange auto-rename fires only while the stored name
/// still equals this value.
pub const DEFAULT_SESSION_NAME: &str = "New chat";

/// Session metadata returned by list operations
///
/// Carries id, name, and summary only; transcripts are fetched
/// separately per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Opaque session identifier (short random code)
    pub id: String,
    /// Display name
    pub name: String,
    /// Optional summary line
    pub summary: Option<String>,
}

impl SessionSummary {
    /// Whether the session still carries the default display name
    pub fn has_default_name(&self) -> bool {
        self.name == DEFAULT_SESSION_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_name_detection() {
        let fresh = SessionSummary {
            id: "a".into(),
            name: DEFAULT_SESSION_NAME.into(),
            summary: None,
        };
        assert!(fresh.has_default_name());

        let named = SessionSummary {
            id: "b".into(),
            name: "Delegation advice".into(),
            summary: None,
        };
        assert!(!named.has_default_name());
    }
}
