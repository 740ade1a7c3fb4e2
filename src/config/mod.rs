pub mod toml_config;

use crate::core::batch::BatchOptions;
use crate::domain::model::ShippingMethod;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_url, Validate,
};
use clap::Parser;
use std::time::Duration;
use toml_config::BatchFileConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "tariff-etl")]
#[command(about = "Batch tariff classification and import duty estimation")]
pub struct CliConfig {
    /// CSV file with the products to classify.
    #[arg(long)]
    pub input: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    /// Primary classification service endpoint.
    #[arg(long)]
    pub classifier_endpoint: String,

    /// Fallback analyzer endpoint; omit to disable fallback routing.
    #[arg(long)]
    pub fallback_endpoint: Option<String>,

    /// Defaults to sea unless overridden here or in the options file.
    #[arg(long, value_enum)]
    pub shipping_method: Option<ShippingMethod>,

    /// Skip the merchandise processing fee.
    #[arg(long)]
    pub no_mpf: bool,

    /// Skip the harbor maintenance fee.
    #[arg(long)]
    pub no_hmf: bool,

    /// Classify only; do not estimate duties.
    #[arg(long)]
    pub skip_duties: bool,

    /// Pause between rows in milliseconds, to stay friendly with classifier
    /// rate limits. 0 disables the pause.
    #[arg(long)]
    pub row_delay_ms: Option<u64>,

    /// Optional TOML file with batch options (CLI flags win).
    #[arg(long)]
    pub options: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Resolve the effective batch options: defaults, then the options
    /// file, then explicit CLI flags.
    pub fn batch_options(&self) -> Result<BatchOptions> {
        let mut options = BatchOptions::default();

        if let Some(path) = &self.options {
            let file = BatchFileConfig::from_file(std::path::Path::new(path))?;
            options = file.apply(options);
        }

        if let Some(method) = self.shipping_method {
            options.shipping_method = method;
        }
        if self.skip_duties {
            options.calculate_duties = false;
        }
        if self.no_mpf {
            options.include_mpf = false;
        }
        if self.no_hmf {
            options.include_hmf = false;
        }
        if let Some(ms) = self.row_delay_ms {
            options.row_delay = if ms > 0 {
                Some(Duration::from_millis(ms))
            } else {
                None
            };
        }

        Ok(options)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("input", &self.input)?;
        validate_path("input", &self.input)?;
        validate_path("output_path", &self.output_path)?;
        validate_url("classifier_endpoint", &self.classifier_endpoint)?;
        if let Some(endpoint) = &self.fallback_endpoint {
            validate_url("fallback_endpoint", endpoint)?;
        }
        if let Some(ms) = self.row_delay_ms {
            validate_range("row_delay_ms", ms, 0, 60_000)?;
        }
        Ok(())
    }
}
