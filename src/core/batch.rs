use crate::core::duty::DutyFeeCalculator;
use crate::core::orchestrator::ClassificationOrchestrator;
use crate::domain::model::{
    BatchRow, CanonicalRow, CanonicalTable, DutyBreakdown, ProductRecord, RowStatus, ShippingMethod,
};
use chrono::Utc;
use std::time::Duration;

/// Progress labels are clipped to keep displays stable.
const PROGRESS_LABEL_MAX: usize = 50;

/// Reasoning text is clipped in the flattened row; the full text stays on
/// the classifier side.
const REASONING_MAX: usize = 200;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub calculate_duties: bool,
    pub shipping_method: ShippingMethod,
    pub include_mpf: bool,
    pub include_hmf: bool,
    /// Politeness delay between rows; rate-limit courtesy toward the
    /// classification service, not a correctness measure.
    pub row_delay: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            calculate_duties: true,
            shipping_method: ShippingMethod::Sea,
            include_mpf: true,
            include_hmf: true,
            row_delay: Some(Duration::from_millis(500)),
        }
    }
}

/// Iterates a mapped table strictly in input order, one row at a time:
/// classification, then duty calculation, then append. Per-row failures are
/// isolated and recorded; nothing a single row does can abort the batch.
pub struct BatchRunner {
    options: BatchOptions,
}

impl BatchRunner {
    pub fn new(options: BatchOptions) -> Self {
        Self { options }
    }

    pub async fn run(
        &self,
        table: &CanonicalTable,
        orchestrator: &ClassificationOrchestrator<'_>,
        mut calculator: Option<&mut DutyFeeCalculator>,
        progress: &mut dyn FnMut(usize, usize, &str),
    ) -> Vec<BatchRow> {
        let total = table.rows.len();
        let mut results = Vec::with_capacity(total);

        for (idx, row) in table.rows.iter().enumerate() {
            let product = build_product(row, idx);
            let label: String = product.product_name.chars().take(PROGRESS_LABEL_MAX).collect();
            progress(idx + 1, total, &label);

            let mut classification = orchestrator.classify(&product).await;
            let status = if classification.error.is_some() {
                RowStatus::Failed
            } else {
                RowStatus::Success
            };

            if classification.reasoning.chars().count() > REASONING_MAX {
                let clipped: String = classification.reasoning.chars().take(REASONING_MAX).collect();
                classification.reasoning = format!("{clipped}...");
            }

            let mut duty_note = None;
            let duties = if status == RowStatus::Success && self.options.calculate_duties {
                calculator.as_deref_mut().map(|calc| {
                    let customs_value = resolve_customs_value(row);
                    if customs_value > 0.0 {
                        calc.calculate_duties(
                            customs_value,
                            &classification.duty_rate,
                            self.options.shipping_method,
                            self.options.include_mpf,
                            self.options.include_hmf,
                            None,
                        )
                    } else {
                        duty_note = Some("No usable customs value found".to_string());
                        DutyBreakdown::zeroed()
                    }
                })
            } else {
                None
            };

            if status == RowStatus::Failed {
                tracing::warn!(
                    row = idx + 1,
                    product = %product.product_name,
                    "row failed: {}",
                    classification.reasoning
                );
            } else {
                tracing::debug!(
                    row = idx + 1,
                    code = %classification.code,
                    confidence = classification.confidence,
                    "row classified"
                );
            }

            results.push(BatchRow {
                product,
                classification,
                duties,
                duty_note,
                status,
                processed_at: Utc::now(),
                extra: row.extra.clone(),
            });

            if let Some(delay) = self.options.row_delay {
                if idx + 1 < total {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        results
    }
}

fn build_product(row: &CanonicalRow, idx: usize) -> ProductRecord {
    let product_name = if row.product_name.trim().is_empty() {
        format!("Product_{}", idx + 1)
    } else {
        row.product_name.trim().to_string()
    };
    let description = if row.description.trim().is_empty() {
        product_name.clone()
    } else {
        row.description.trim().to_string()
    };

    ProductRecord {
        product_name,
        description,
        material: row.material.trim().to_string(),
        intended_use: row.intended_use.trim().to_string(),
        origin: row.origin.trim().to_string(),
    }
}

/// Locate a usable customs value for a row, in order: the explicit
/// customs-value column, quantity × unit value (quantity defaults to 1),
/// then any passthrough column whose name mentions "total" or "value" and
/// parses as a positive number.
fn resolve_customs_value(row: &CanonicalRow) -> f64 {
    let mut value = row.customs_value.unwrap_or(0.0);

    if value == 0.0 {
        if let Some(unit_value) = row.unit_value {
            value = row.quantity.unwrap_or(1.0) * unit_value;
        }
    }

    if value == 0.0 {
        for (name, cell) in &row.extra {
            let lowered = name.to_lowercase();
            if !lowered.contains("total") && !lowered.contains("value") {
                continue;
            }
            let parsed = match cell {
                serde_json::Value::Number(n) => n.as_f64(),
                serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            if let Some(v) = parsed {
                if v > 0.0 {
                    value = v;
                    break;
                }
            }
        }
    }

    value
}
