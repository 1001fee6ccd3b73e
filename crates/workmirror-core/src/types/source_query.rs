//! Declarative description of what to fetch.

use serde::{Deserialize, Serialize};

/// Item type plus an optional set of state filters.
///
/// An empty or absent state set means every state is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceQuery {
    /// Work item type name, e.g. `Feature Request` or `Epic`.
    pub item_type: String,

    /// States to include, combined with OR.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub states: Option<Vec<String>>,
}

impl SourceQuery {
    pub fn new(item_type: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            states: None,
        }
    }

    /// Restrict the query to the given states.
    pub fn with_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.states = Some(states.into_iter().map(Into::into).collect());
        self
    }

    /// The state filter, or `None` when every state is wanted.
    pub fn state_filter(&self) -> Option<&[String]> {
        self.states.as_deref().filter(|s| !s.is_empty())
    }
}
