//! Member record

use serde::{Deserialize, Serialize};

/// A single identity entry in a system.
///
/// Both fields are free-form text. Pronouns default to the empty string when
/// absent from a JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Member {
    name: String,
    #[serde(default)]
    pronouns: String,
}

impl Member {
    /// Create a new member
    pub fn new(name: impl Into<String>, pronouns: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pronouns: pronouns.into(),
        }
    }

    /// Create a member without pronouns
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, String::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pronouns(&self) -> &str {
        &self.pronouns
    }

    /// Replace the member name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Replace the member pronouns
    pub fn set_pronouns(&mut self, pronouns: impl Into<String>) {
        self.pronouns = pronouns.into();
    }
}
