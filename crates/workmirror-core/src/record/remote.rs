//! Raw fetched work item.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ProjectionError;
use crate::query::Field;
use crate::types::ExternalId;

use super::Projection;

/// A work item as returned by the bulk-fetch call.
///
/// The field mapping is schema-agnostic; interpretation is left to
/// [`RemoteRecord::project`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// The external numeric identifier.
    pub id: ExternalId,

    /// Field reference name to value.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl RemoteRecord {
    pub fn new(id: impl Into<ExternalId>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Look up a field by reference name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    /// The record's state, if present.
    pub fn state(&self) -> Option<&str> {
        self.field(Field::State.reference_name())
            .and_then(Value::as_str)
    }

    /// Project the fields the mirror keeps.
    ///
    /// # Errors
    ///
    /// Fails if the title or state is missing, null, or not a string.
    pub fn project(&self) -> Result<Projection, ProjectionError> {
        Ok(Projection {
            external_id: self.id,
            title: self.required_str(Field::Title)?.to_string(),
            state: self.required_str(Field::State)?.to_string(),
        })
    }

    fn required_str(&self, field: Field) -> Result<&str, ProjectionError> {
        let name = field.reference_name();
        let value = self
            .field(name)
            .ok_or_else(|| ProjectionError::MissingField {
                id: self.id,
                field: name.to_string(),
            })?;

        value.as_str().ok_or_else(|| ProjectionError::NotAString {
            id: self.id,
            field: name.to_string(),
        })
    }
}
