use crate::core::confidence::{self, CONFIDENCE_ABSENT};
use crate::domain::model::{ClassificationResult, ClassificationSource, ProductRecord};
use crate::domain::ports::Classifier;

/// Below this confidence (percent) the primary result is routed to the
/// fallback capability.
pub const FALLBACK_CONFIDENCE_THRESHOLD: f64 = 50.0;

/// Below this confidence (percent) the final result is flagged for human
/// review. Independent of the routing threshold; the two must not be
/// conflated.
pub const REVIEW_CONFIDENCE_THRESHOLD: f64 = 80.0;

/// Decides whether a primary classification is trustworthy and routes to
/// the fallback capability when it is not. `classify` is total: every
/// failure mode is folded into the returned result.
pub struct ClassificationOrchestrator<'a> {
    primary: &'a dyn Classifier,
    fallback: Option<&'a dyn Classifier>,
}

impl<'a> ClassificationOrchestrator<'a> {
    /// `fallback: None` disables fallback routing entirely.
    pub fn new(primary: &'a dyn Classifier, fallback: Option<&'a dyn Classifier>) -> Self {
        Self { primary, fallback }
    }

    pub async fn classify(&self, product: &ProductRecord) -> ClassificationResult {
        let mut working = match self.primary.classify(product).await {
            Ok(raw) => raw,
            Err(e) => {
                // Hard failure of the primary is fail-fast: no fallback.
                tracing::warn!(product = %product.product_name, "primary classifier failed: {e}");
                return ClassificationResult {
                    code: "ERROR".to_string(),
                    confidence: CONFIDENCE_ABSENT,
                    duty_rate: "N/A".to_string(),
                    reasoning: format!("Classification error: {e}"),
                    alternatives: Vec::new(),
                    candidates: Vec::new(),
                    needs_review: true,
                    source: ClassificationSource::Primary,
                    error: Some(e.to_string()),
                };
            }
        };

        let mut pct = working
            .confidence
            .as_ref()
            .map(confidence::normalize)
            .unwrap_or(CONFIDENCE_ABSENT);
        let mut source = ClassificationSource::Primary;
        let mut error = None;

        let missing_or_low = matches!(working.code.as_str(), "" | "N/A" | "ERROR")
            || pct < FALLBACK_CONFIDENCE_THRESHOLD;

        if let Some(fallback) = self.fallback {
            if missing_or_low {
                tracing::debug!(
                    product = %product.product_name,
                    code = %working.code,
                    confidence = pct,
                    "routing to fallback analyzer"
                );
                match fallback.classify(product).await {
                    Ok(raw) => {
                        // The fallback result is authoritative when invoked;
                        // it is not merged field-by-field with the primary.
                        working = raw;
                        source = ClassificationSource::Fallback;
                    }
                    Err(e) => {
                        working.code = "N/A".to_string();
                        working.reasoning = format!("Fallback analysis failed: {e}");
                        source = ClassificationSource::Fallback;
                        error = Some(e.to_string());
                    }
                }
            }
        }

        // Re-normalize the authoritative result; an absent confidence field
        // keeps the last computed percentage.
        if let Some(value) = working.confidence.as_ref() {
            pct = confidence::normalize(value);
        }

        ClassificationResult {
            code: working.code,
            confidence: pct,
            duty_rate: working.duty_rate,
            reasoning: working.reasoning,
            alternatives: working.alternatives,
            candidates: working.candidates,
            needs_review: pct < REVIEW_CONFIDENCE_THRESHOLD,
            source,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::RawClassification;
    use crate::utils::error::{BatchError, Result};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubClassifier {
        result: std::result::Result<RawClassification, String>,
        calls: AtomicUsize,
    }

    impl StubClassifier {
        fn returning(raw: RawClassification) -> Self {
            Self {
                result: Ok(raw),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                result: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl crate::domain::ports::Classifier for StubClassifier {
        async fn classify(&self, _product: &ProductRecord) -> Result<RawClassification> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(raw) => Ok(raw.clone()),
                Err(msg) => Err(BatchError::classification(msg.clone())),
            }
        }
    }

    fn raw(code: &str, confidence: serde_json::Value) -> RawClassification {
        RawClassification {
            code: code.to_string(),
            confidence: Some(confidence),
            duty_rate: "5.5%".to_string(),
            reasoning: "matched schedule heading".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_low_confidence_routes_to_fallback_once() {
        let primary = StubClassifier::returning(raw("8471.30.0100", json!(40)));
        let fallback = StubClassifier::returning(raw("8473.30.1180", json!("90%")));
        let orchestrator = ClassificationOrchestrator::new(&primary, Some(&fallback));

        let result = orchestrator.classify(&ProductRecord::default()).await;

        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);
        assert_eq!(result.code, "8473.30.1180");
        assert_eq!(result.confidence, 90.0);
        assert_eq!(result.source, ClassificationSource::Fallback);
        assert!(!result.needs_review);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_mid_confidence_skips_fallback_but_flags_review() {
        let primary = StubClassifier::returning(raw("8471.30.0100", json!(60)));
        let fallback = StubClassifier::returning(raw("9999.99.9999", json!(99)));
        let orchestrator = ClassificationOrchestrator::new(&primary, Some(&fallback));

        let result = orchestrator.classify(&ProductRecord::default()).await;

        assert_eq!(fallback.calls(), 0);
        assert_eq!(result.code, "8471.30.0100");
        assert_eq!(result.source, ClassificationSource::Primary);
        // 60 clears the routing threshold but not the review threshold.
        assert!(result.needs_review);
    }

    #[tokio::test]
    async fn test_high_confidence_passes_clean() {
        let primary = StubClassifier::returning(raw("6109.10.0012", json!("87%")));
        let orchestrator = ClassificationOrchestrator::new(&primary, None);

        let result = orchestrator.classify(&ProductRecord::default()).await;

        assert_eq!(result.confidence, 87.0);
        assert!(!result.needs_review);
        assert_eq!(result.source, ClassificationSource::Primary);
    }

    #[tokio::test]
    async fn test_missing_code_routes_even_with_high_confidence() {
        let primary = StubClassifier::returning(raw("N/A", json!(95)));
        let fallback = StubClassifier::returning(raw("7326.90.8688", json!(70)));
        let orchestrator = ClassificationOrchestrator::new(&primary, Some(&fallback));

        let result = orchestrator.classify(&ProductRecord::default()).await;

        assert_eq!(fallback.calls(), 1);
        assert_eq!(result.code, "7326.90.8688");
    }

    #[tokio::test]
    async fn test_fraction_confidence_normalized_before_routing() {
        let primary = StubClassifier::returning(raw("8471.30.0100", json!(0.87)));
        let fallback = StubClassifier::returning(raw("9999.99.9999", json!(99)));
        let orchestrator = ClassificationOrchestrator::new(&primary, Some(&fallback));

        let result = orchestrator.classify(&ProductRecord::default()).await;

        // 0.87 is a fraction, i.e. 87%: no routing, no review flag.
        assert_eq!(fallback.calls(), 0);
        assert_eq!(result.confidence, 87.0);
        assert!(!result.needs_review);
    }

    #[tokio::test]
    async fn test_primary_hard_failure_is_fail_fast() {
        let primary = StubClassifier::failing("model quota exhausted");
        let fallback = StubClassifier::returning(raw("8471.30.0100", json!(99)));
        let orchestrator = ClassificationOrchestrator::new(&primary, Some(&fallback));

        let result = orchestrator.classify(&ProductRecord::default()).await;

        // Deliberate policy: hard failure never routes to the fallback.
        assert_eq!(fallback.calls(), 0);
        assert_eq!(result.code, "ERROR");
        assert_eq!(result.confidence, CONFIDENCE_ABSENT);
        assert!(result.needs_review);
        assert!(result.reasoning.contains("model quota exhausted"));
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_fallback_failure_is_not_fatal() {
        let primary = StubClassifier::returning(raw("", json!(30)));
        let fallback = StubClassifier::failing("fallback timed out");
        let orchestrator = ClassificationOrchestrator::new(&primary, Some(&fallback));

        let result = orchestrator.classify(&ProductRecord::default()).await;

        assert_eq!(result.code, "N/A");
        assert!(result.needs_review);
        assert!(result.reasoning.contains("fallback timed out"));
        assert_eq!(result.source, ClassificationSource::Fallback);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_fallback_disabled_keeps_low_confidence_primary() {
        let primary = StubClassifier::returning(raw("8471.30.0100", json!(10)));
        let orchestrator = ClassificationOrchestrator::new(&primary, None);

        let result = orchestrator.classify(&ProductRecord::default()).await;

        assert_eq!(result.code, "8471.30.0100");
        assert_eq!(result.confidence, 10.0);
        assert!(result.needs_review);
    }

    #[tokio::test]
    async fn test_fallback_without_confidence_keeps_last_percentage() {
        let mut fallback_raw = raw("7326.90.8688", json!(0));
        fallback_raw.confidence = None;
        let primary = StubClassifier::returning(raw("8471.30.0100", json!(42)));
        let fallback = StubClassifier::returning(fallback_raw);
        let orchestrator = ClassificationOrchestrator::new(&primary, Some(&fallback));

        let result = orchestrator.classify(&ProductRecord::default()).await;

        assert_eq!(result.code, "7326.90.8688");
        assert_eq!(result.confidence, 42.0);
    }
}
