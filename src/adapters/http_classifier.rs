use crate::domain::model::{ProductRecord, RawClassification};
use crate::domain::ports::Classifier;
use crate::utils::error::{BatchError, Result};
use async_trait::async_trait;
use reqwest::Client;

/// Classification capability reached over HTTP: POST the product record as
/// JSON, read back a classification payload. Primary and fallback services
/// are two instances of this adapter with different endpoints.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: Client,
    endpoint: String,
}

impl HttpClassifier {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, product: &ProductRecord) -> Result<RawClassification> {
        tracing::debug!(endpoint = %self.endpoint, product = %product.product_name, "classification request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(product)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BatchError::classification(format!(
                "classifier at {} returned HTTP {}",
                self.endpoint, status
            )));
        }

        let raw: RawClassification = response.json().await?;
        Ok(raw)
    }
}
