//! Work-item-tracking resources and their wire types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Query-by-WIQL resource.
pub const WIQL: &str = "wiql";

/// Bulk work-item resource.
pub const WORK_ITEMS: &str = "workitems";

/// Body for the WIQL query.
#[derive(Debug, Serialize)]
pub struct WiqlRequest<'a> {
    pub query: &'a str,
}

/// Response from the WIQL query.
///
/// Only the fields the pipeline reads; the remote also returns columns,
/// sort order and an `asOf` timestamp.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WiqlResponse {
    #[serde(default)]
    pub work_items: Vec<WorkItemReference>,
    #[serde(default)]
    pub continuation_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WorkItemReference {
    pub id: u64,
}

/// Response from the bulk work-item fetch.
#[derive(Debug, Deserialize)]
pub struct WorkItemsResponse {
    #[serde(default)]
    pub value: Vec<WorkItem>,
}

#[derive(Debug, Deserialize)]
pub struct WorkItem {
    pub id: u64,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// Comma-joined identifier list for the `ids` query parameter.
pub fn join_ids<I, T>(ids: I) -> String
where
    I: IntoIterator<Item = T>,
    T: ToString,
{
    ids.into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
