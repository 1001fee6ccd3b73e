//! Record source trait.

use async_trait::async_trait;

use crate::record::RemoteRecord;
use crate::Result;

/// Anything that can produce the full record set for one upstream source.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Name used in logs and cycle reports.
    fn name(&self) -> &str;

    /// Fetch every record matching the given states (all states if `None`).
    async fn fetch(&self, states: Option<&[String]>) -> Result<Vec<RemoteRecord>>;
}
