use crate::domain::model::{ProductRecord, RawClassification};
use crate::utils::error::Result;
use async_trait::async_trait;

/// A classification capability (primary or fallback variant). Network-bound
/// and allowed to fail; the orchestrator decides what a failure means.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, product: &ProductRecord) -> Result<RawClassification>;
}

/// Byte-level storage for batch artifacts (local filesystem in the CLI,
/// anything else behind the same seam).
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
