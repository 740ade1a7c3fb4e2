use crate::domain::model::{
    DutyBreakdown, InvoiceBreakdown, InvoiceCalculation, RateComparison, ShippingMethod,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Merchandise Processing Fee: 0.3464% ad valorem, clamped.
pub const MPF_RATE: f64 = 0.003464;
pub const MPF_MIN: f64 = 27.75;
pub const MPF_MAX: f64 = 538.40;

/// Harbor Maintenance Fee: 0.125%, sea shipments only.
pub const HMF_RATE: f64 = 0.00125;

/// One audit-trail entry. The timestamp lives here rather than on the
/// breakdown so identical inputs keep producing identical breakdowns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationEntry {
    pub at: DateTime<Utc>,
    pub breakdown: DutyBreakdown,
}

/// Pure numeric engine for import duties and fees. Every calculation is
/// appended to an in-memory history for audit/export and never mutated
/// afterward.
#[derive(Debug, Default)]
pub struct DutyFeeCalculator {
    history: Vec<CalculationEntry>,
}

impl DutyFeeCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a schedule duty-rate string into a decimal rate.
    ///
    /// `"Free"`, `"N/A"`, `"None"` (case-insensitive) and empty text are
    /// duty-free. Compound rates such as `"3.4% + $0.25/kg"` keep only the
    /// ad-valorem component before the first `%`/`+`. Pure specific-duty
    /// strings (`"$0.42/kg"`) are not modeled and parse to 0.0.
    pub fn parse_duty_rate(text: &str) -> f64 {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return 0.0;
        }

        let lower = trimmed.to_ascii_lowercase();
        if matches!(lower.as_str(), "free" | "n/a" | "none") {
            return 0.0;
        }

        if trimmed.contains('%') {
            let ad_valorem = trimmed
                .split('%')
                .next()
                .unwrap_or("")
                .split('+')
                .next()
                .unwrap_or("")
                .trim();
            return ad_valorem.parse::<f64>().map(|r| r / 100.0).unwrap_or(0.0);
        }

        0.0
    }

    /// Compute the full fee breakdown for a customs value.
    ///
    /// A preferential-program rate, when supplied, replaces the standard
    /// rate. MPF is clamped to `[MPF_MIN, MPF_MAX]` whenever included; HMF
    /// applies only to sea freight.
    pub fn calculate_duties(
        &mut self,
        customs_value: f64,
        duty_rate: &str,
        shipping_method: ShippingMethod,
        include_mpf: bool,
        include_hmf: bool,
        preferential_rate: Option<&str>,
    ) -> DutyBreakdown {
        let applied = preferential_rate.unwrap_or(duty_rate);
        let rate = Self::parse_duty_rate(applied);

        let base_duty = customs_value * rate;

        let processing_fee = if include_mpf {
            (customs_value * MPF_RATE).clamp(MPF_MIN, MPF_MAX)
        } else {
            0.0
        };

        let maintenance_fee = if include_hmf && shipping_method == ShippingMethod::Sea {
            customs_value * HMF_RATE
        } else {
            0.0
        };

        let total_fees = base_duty + processing_fee + maintenance_fee;
        let total_landed_cost = customs_value + total_fees;
        let effective_rate_percent = if customs_value > 0.0 {
            total_fees / customs_value * 100.0
        } else {
            0.0
        };

        let breakdown = DutyBreakdown {
            customs_value,
            duty_rate_applied: applied.to_string(),
            duty_rate_decimal: rate,
            base_duty,
            processing_fee,
            maintenance_fee,
            total_fees,
            total_landed_cost,
            effective_rate_percent,
        };

        self.history.push(CalculationEntry {
            at: Utc::now(),
            breakdown: breakdown.clone(),
        });

        breakdown
    }

    /// Derive the customs value from invoice components (CIF = cost +
    /// insurance + freight) and compute the breakdown on it.
    pub fn calculate_from_invoice(
        &mut self,
        fob: f64,
        freight: f64,
        insurance: f64,
        duty_rate: &str,
        shipping_method: ShippingMethod,
    ) -> InvoiceCalculation {
        let cif = fob + freight + insurance;
        let duties = self.calculate_duties(cif, duty_rate, shipping_method, true, true, None);

        InvoiceCalculation {
            invoice: InvoiceBreakdown {
                fob,
                freight,
                insurance,
                cif,
            },
            duties,
        }
    }

    /// Run the standard and preferential scenarios side by side.
    pub fn compare_rates(
        &mut self,
        customs_value: f64,
        standard_rate: &str,
        preferential_rate: &str,
        program_name: &str,
    ) -> RateComparison {
        let standard =
            self.calculate_duties(customs_value, standard_rate, ShippingMethod::Sea, true, true, None);
        let preferential = self.calculate_duties(
            customs_value,
            preferential_rate,
            ShippingMethod::Sea,
            true,
            true,
            None,
        );

        let savings = standard.total_fees - preferential.total_fees;
        let savings_percent = if standard.total_fees > 0.0 {
            savings / standard.total_fees * 100.0
        } else {
            0.0
        };

        RateComparison {
            standard,
            preferential,
            program_name: program_name.to_string(),
            savings,
            savings_percent,
        }
    }

    /// Audit trail of every calculation made through this instance.
    pub fn history(&self) -> &[CalculationEntry] {
        &self.history
    }
}
