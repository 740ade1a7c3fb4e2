use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Raw tabular input as ingested from a file: ordered headers plus rows of
/// cells aligned with those headers. Cells are `Null` (absent), `Number`,
/// or `String` depending on what the source could infer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RawTable {
    /// Cells of a single column, top to bottom.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().filter_map(move |row| row.get(index))
    }
}

/// Canonical description of one product, as fed to a classifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_name: String,
    pub description: String,
    pub material: String,
    pub intended_use: String,
    pub origin: String,
}

/// Candidate schedule entry attached to a classification as evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duty_rate: String,
    #[serde(default)]
    pub relevance: f64,
}

/// Classifier output as it arrives over the wire. Collaborators are sloppy
/// about the confidence field (`"87%"`, `0.87`, `87`, or missing), so it
/// stays an untyped JSON value until the orchestrator normalizes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawClassification {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub confidence: Option<Value>,
    #[serde(default)]
    pub duty_rate: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// Which classification capability produced the final result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationSource {
    Primary,
    Fallback,
}

/// Final, normalized classification for one product. `confidence` is a
/// percentage in `[0, 100]`, or `-1.0` when absent/invalid. `error` carries
/// the failure text when a classifier call raised; the code alone cannot
/// distinguish a raised failure from a legitimate "N/A" answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub code: String,
    pub confidence: f64,
    pub duty_rate: String,
    pub reasoning: String,
    pub alternatives: Vec<String>,
    pub candidates: Vec<Candidate>,
    pub needs_review: bool,
    pub source: ClassificationSource,
    pub error: Option<String>,
}

/// How the goods travel. Harbor maintenance fee applies to sea freight only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
    Sea,
    Air,
}

impl std::str::FromStr for ShippingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sea" => Ok(ShippingMethod::Sea),
            "air" => Ok(ShippingMethod::Air),
            other => Err(format!("unknown shipping method: {other}")),
        }
    }
}

/// One duty calculation, fully broken down. Pure value: recomputed per
/// call, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DutyBreakdown {
    pub customs_value: f64,
    pub duty_rate_applied: String,
    pub duty_rate_decimal: f64,
    pub base_duty: f64,
    pub processing_fee: f64,
    pub maintenance_fee: f64,
    pub total_fees: f64,
    pub total_landed_cost: f64,
    pub effective_rate_percent: f64,
}

impl DutyBreakdown {
    /// Explicit zero state for rows without a usable customs value, so the
    /// aggregation layer never has to special-case missing duty data.
    pub fn zeroed() -> Self {
        Self {
            customs_value: 0.0,
            duty_rate_applied: String::new(),
            duty_rate_decimal: 0.0,
            base_duty: 0.0,
            processing_fee: 0.0,
            maintenance_fee: 0.0,
            total_fees: 0.0,
            total_landed_cost: 0.0,
            effective_rate_percent: 0.0,
        }
    }
}

/// Invoice components from which a customs value is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceBreakdown {
    pub fob: f64,
    pub freight: f64,
    pub insurance: f64,
    pub cif: f64,
}

/// Duty calculation anchored to its invoice components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceCalculation {
    pub invoice: InvoiceBreakdown,
    pub duties: DutyBreakdown,
}

/// Standard vs preferential-program duty scenario comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateComparison {
    pub standard: DutyBreakdown,
    pub preferential: DutyBreakdown,
    pub program_name: String,
    pub savings: f64,
    pub savings_percent: f64,
}

/// One mapped input row. The numeric duty inputs stay `Option` so that "no
/// value provided" is distinguishable from "value is zero". Columns the
/// mapper did not consume are carried through untouched in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanonicalRow {
    pub product_name: String,
    pub description: String,
    pub material: String,
    pub intended_use: String,
    pub origin: String,
    pub quantity: Option<f64>,
    pub unit_value: Option<f64>,
    pub customs_value: Option<f64>,
    pub extra: Vec<(String, Value)>,
}

/// Table of mapped rows, guaranteed non-empty and within the batch cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalTable {
    pub rows: Vec<CanonicalRow>,
}

/// A canonical field the mapper recognized in a raw column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedMapping {
    pub field: String,
    pub source_column: String,
}

/// A canonical field the mapper had to synthesize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedColumn {
    pub field: String,
    pub how: String,
}

/// What the schema mapper inferred versus invented, for display to the
/// caller alongside the mapped table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingReport {
    pub original_columns: Vec<String>,
    pub detected: Vec<DetectedMapping>,
    pub created: Vec<CreatedColumn>,
}

/// Per-row terminal state. `Failed` means a classifier call raised or
/// required fields were unrecoverable; low confidence alone never fails a
/// row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Success,
    Failed,
}

/// One fully processed batch row. Immutable once appended to the result
/// table. `duties` is `Some` (possibly zeroed) whenever duty calculation
/// was requested for a successful row, `None` otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRow {
    pub product: ProductRecord,
    pub classification: ClassificationResult,
    pub duties: Option<DutyBreakdown>,
    pub duty_note: Option<String>,
    pub status: RowStatus,
    pub processed_at: DateTime<Utc>,
    pub extra: Vec<(String, Value)>,
}

/// Rollup of one group (by origin or by code).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupRollup {
    pub customs_value: f64,
    pub total_fees: f64,
    pub rows: usize,
}

/// One entry of the highest-fee ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopFeeItem {
    pub product_name: String,
    pub code: String,
    pub customs_value: f64,
    pub total_fees: f64,
}

/// Aggregate statistics over a finished result table. Derived, never
/// persisted incrementally. Rollups are omitted entirely when no group data
/// exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_customs_value: f64,
    pub total_base_duty: f64,
    pub total_processing_fee: f64,
    pub total_maintenance_fee: f64,
    pub total_fees: f64,
    pub total_landed_cost: f64,
    pub average_effective_rate: f64,
    pub count_with_duties: usize,
    pub count_duty_free: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_origin: Option<BTreeMap<String, GroupRollup>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_code: Option<BTreeMap<String, GroupRollup>>,
    pub top_by_fees: Vec<TopFeeItem>,
}

/// Everything a finished batch hands to the presentation/export layer.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub rows: Vec<BatchRow>,
    pub summary: BatchSummary,
    pub mapping: MappingReport,
    pub rows_total: usize,
    pub rows_failed: usize,
    pub archive_path: String,
}
