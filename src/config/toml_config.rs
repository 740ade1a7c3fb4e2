use crate::core::batch::BatchOptions;
use crate::domain::model::ShippingMethod;
use crate::utils::error::{BatchError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Optional batch-options file. Every field is optional; unset fields keep
/// the CLI/default values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchFileConfig {
    pub batch: Option<BatchSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSection {
    pub shipping_method: Option<ShippingMethod>,
    pub calculate_duties: Option<bool>,
    pub include_mpf: Option<bool>,
    pub include_hmf: Option<bool>,
    pub row_delay_ms: Option<u64>,
}

impl BatchFileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| BatchError::Config {
            message: format!("failed to parse {}: {e}", path.display()),
        })
    }

    /// Layer this file's settings over a base set of options.
    pub fn apply(&self, mut options: BatchOptions) -> BatchOptions {
        if let Some(batch) = &self.batch {
            if let Some(method) = batch.shipping_method {
                options.shipping_method = method;
            }
            if let Some(v) = batch.calculate_duties {
                options.calculate_duties = v;
            }
            if let Some(v) = batch.include_mpf {
                options.include_mpf = v;
            }
            if let Some(v) = batch.include_hmf {
                options.include_hmf = v;
            }
            if let Some(ms) = batch.row_delay_ms {
                options.row_delay = if ms > 0 {
                    Some(Duration::from_millis(ms))
                } else {
                    None
                };
            }
        }
        options
    }
}
