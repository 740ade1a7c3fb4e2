use crate::domain::model::{
    BatchRow, BatchSummary, DutyBreakdown, GroupRollup, RowStatus, TopFeeItem,
};
use std::collections::BTreeMap;

/// Number of entries in the highest-fee ranking.
const TOP_N: usize = 5;

/// Aggregate per-row duty results into grouped and ranked statistics.
///
/// Only successful rows with a positive customs value contribute to the
/// financial aggregates; failed or zero-value rows are excluded here and
/// counted separately by the caller. Group rollups are omitted (`None`)
/// when no group data exists, never returned as empty maps.
pub fn summarize(rows: &[BatchRow]) -> BatchSummary {
    let filtered: Vec<(&BatchRow, &DutyBreakdown)> = rows
        .iter()
        .filter(|row| row.status == RowStatus::Success)
        .filter_map(|row| {
            row.duties
                .as_ref()
                .filter(|d| d.customs_value > 0.0)
                .map(|d| (row, d))
        })
        .collect();

    let mut summary = BatchSummary {
        total_customs_value: 0.0,
        total_base_duty: 0.0,
        total_processing_fee: 0.0,
        total_maintenance_fee: 0.0,
        total_fees: 0.0,
        total_landed_cost: 0.0,
        average_effective_rate: 0.0,
        count_with_duties: filtered.len(),
        count_duty_free: 0,
        by_origin: None,
        by_code: None,
        top_by_fees: Vec::new(),
    };

    let mut by_origin: BTreeMap<String, GroupRollup> = BTreeMap::new();
    let mut by_code: BTreeMap<String, GroupRollup> = BTreeMap::new();

    for (row, duties) in &filtered {
        summary.total_customs_value += duties.customs_value;
        summary.total_base_duty += duties.base_duty;
        summary.total_processing_fee += duties.processing_fee;
        summary.total_maintenance_fee += duties.maintenance_fee;
        summary.total_fees += duties.total_fees;
        summary.total_landed_cost += duties.total_landed_cost;
        if duties.base_duty == 0.0 {
            summary.count_duty_free += 1;
        }

        let origin = row.product.origin.trim();
        if !origin.is_empty() {
            let entry = by_origin.entry(origin.to_string()).or_default();
            entry.customs_value += duties.customs_value;
            entry.total_fees += duties.total_fees;
            entry.rows += 1;
        }

        let code = row.classification.code.trim();
        if !code.is_empty() {
            let entry = by_code.entry(code.to_string()).or_default();
            entry.customs_value += duties.customs_value;
            entry.total_fees += duties.total_fees;
            entry.rows += 1;
        }
    }

    if summary.total_customs_value > 0.0 {
        summary.average_effective_rate =
            summary.total_fees / summary.total_customs_value * 100.0;
    }

    if !by_origin.is_empty() {
        summary.by_origin = Some(by_origin);
    }
    if !by_code.is_empty() {
        summary.by_code = Some(by_code);
    }

    let mut ranked = filtered;
    ranked.sort_by(|(_, a), (_, b)| {
        b.total_fees
            .partial_cmp(&a.total_fees)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    summary.top_by_fees = ranked
        .into_iter()
        .take(TOP_N)
        .map(|(row, duties)| TopFeeItem {
            product_name: row.product.product_name.clone(),
            code: row.classification.code.clone(),
            customs_value: duties.customs_value,
            total_fees: duties.total_fees,
        })
        .collect();

    summary
}
