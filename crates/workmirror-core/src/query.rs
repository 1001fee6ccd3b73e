//! Typed WIQL (work item query language) builder.
//!
//! Queries are assembled from fields and literal values rather than string
//! concatenation, so a state name containing a quote cannot break the query.
//! The filter shape is fixed: project AND item type, plus an optional
//! OR-group over the requested states, ordered ascending by id.

use std::fmt;

use crate::types::SourceQuery;

/// Work item fields referenced by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    TeamProject,
    WorkItemType,
    State,
    Title,
}

impl Field {
    /// Reference name as used in queries and in the record field map.
    pub const fn reference_name(self) -> &'static str {
        match self {
            Field::Id => "System.Id",
            Field::TeamProject => "System.TeamProject",
            Field::WorkItemType => "System.WorkItemType",
            Field::State => "System.State",
            Field::Title => "System.Title",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.reference_name())
    }
}

/// A single-quoted WIQL string literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal(String);

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.0.replace('\'', "''"))
    }
}

/// A boolean filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Eq(Field, Literal),
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    pub fn eq(field: Field, value: impl Into<String>) -> Self {
        Condition::Eq(field, Literal(value.into()))
    }

    fn fmt_group(f: &mut fmt::Formatter<'_>, parts: &[Condition], op: &str) -> fmt::Result {
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", op)?;
            }
            match part {
                Condition::Eq(..) => write!(f, "{}", part)?,
                _ => write!(f, "({})", part)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Eq(field, value) => write!(f, "{} = {}", field, value),
            Condition::And(parts) => Self::fmt_group(f, parts, "AND"),
            Condition::Or(parts) => Self::fmt_group(f, parts, "OR"),
        }
    }
}

/// An identifier-selecting query over one project and item type.
///
/// # Example
///
/// ```
/// use workmirror_core::{SourceQuery, Wiql};
///
/// let query = SourceQuery::new("Epic").with_states(["New", "Active"]);
/// let wiql = Wiql::select_ids("Fabrikam", &query);
/// assert_eq!(
///     wiql.to_string(),
///     "SELECT [System.Id] FROM WorkItems \
///      WHERE [System.TeamProject] = 'Fabrikam' AND [System.WorkItemType] = 'Epic' \
///      AND ([System.State] = 'New' OR [System.State] = 'Active') \
///      ORDER BY [System.Id] ASC"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wiql {
    filter: Condition,
}

impl Wiql {
    /// Build the identifier query for a project and source query.
    pub fn select_ids(project: &str, query: &SourceQuery) -> Self {
        let mut clauses = vec![
            Condition::eq(Field::TeamProject, project),
            Condition::eq(Field::WorkItemType, query.item_type.as_str()),
        ];

        if let Some(states) = query.state_filter() {
            let group = states
                .iter()
                .map(|s| Condition::eq(Field::State, s.as_str()))
                .collect();
            clauses.push(Condition::Or(group));
        }

        Self {
            filter: Condition::And(clauses),
        }
    }
}

impl fmt::Display for Wiql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SELECT {} FROM WorkItems WHERE {} ORDER BY {} ASC",
            Field::Id,
            self.filter,
            Field::Id
        )
    }
}
