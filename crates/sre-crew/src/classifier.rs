//! Health classification of monitor output.
//!
//! The monitor agent answers in free text. A [`HealthClassifier`] turns that
//! text into a [`HealthClassification`]; the control loop only looks at
//! [`HealthClassification::is_incident`].

use std::fmt;

/// Signals extracted from one monitor verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HealthClassification {
    /// The verdict reports an anomaly
    pub anomaly: bool,
    /// The verdict mentions an error or failure (including tool failures)
    pub error: bool,
    /// The verdict does not state the system is healthy
    pub unclear: bool,
}

impl HealthClassification {
    /// Any signal counts as an incident; output that never says healthy is
    /// treated as suspicious.
    pub fn is_incident(&self) -> bool {
        self.anomaly || self.error || self.unclear
    }
}

impl fmt::Display for HealthClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "anomaly={}, error={}, unclear={}",
            self.anomaly, self.error, self.unclear
        )
    }
}

/// Turns monitor output into a classification.
pub trait HealthClassifier: Send + Sync {
    fn classify(&self, output: &str) -> HealthClassification;
}

const ANOMALY_KEYWORD: &str = "ANOMALY";
const ERROR_KEYWORDS: &[&str] = &["ERROR", "EXCEPTION", "FAILED"];
const HEALTHY_KEYWORD: &str = "HEALTHY";

/// Case-insensitive substring matching on fixed keywords.
///
/// Note that "UNHEALTHY" contains "HEALTHY"; such output is only flagged if
/// another keyword is present.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl HealthClassifier for KeywordClassifier {
    fn classify(&self, output: &str) -> HealthClassification {
        let text = output.to_uppercase();
        HealthClassification {
            anomaly: text.contains(ANOMALY_KEYWORD),
            error: ERROR_KEYWORDS.iter().any(|keyword| text.contains(keyword)),
            unclear: !text.contains(HEALTHY_KEYWORD),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> HealthClassification {
        KeywordClassifier.classify(text)
    }

    #[test]
    fn test_healthy_output_is_not_an_incident() {
        let result = classify("System HEALTHY, all probes green");
        assert_eq!(result, HealthClassification::default());
        assert!(!result.is_incident());
    }

    #[test]
    fn test_lowercase_healthy_counts() {
        assert!(!classify("everything looks healthy").is_incident());
    }

    #[test]
    fn test_missing_healthy_is_unclear() {
        let result = classify("Status: nominal");
        assert!(result.unclear);
        assert!(!result.anomaly);
        assert!(!result.error);
        assert!(result.is_incident());
    }

    #[test]
    fn test_error_keywords() {
        for text in [
            "ERROR: prometheus unreachable",
            "healthy but an exception was raised",
            "HEALTHY? probe failed",
        ] {
            let result = classify(text);
            assert!(result.error, "{text}");
            assert!(result.is_incident(), "{text}");
        }
    }

    #[test]
    fn test_anomaly_with_healthy_still_triggers() {
        let result = classify("Mostly HEALTHY, one ANOMALY in checkout latency");
        assert!(result.anomaly);
        assert!(!result.unclear);
        assert!(result.is_incident());
    }

    #[test]
    fn test_empty_output_is_an_incident() {
        assert!(classify("").is_incident());
    }

    #[test]
    fn test_display_lists_signals() {
        assert_eq!(
            classify("ANOMALY").to_string(),
            "anomaly=true, error=false, unclear=true"
        );
    }
}
