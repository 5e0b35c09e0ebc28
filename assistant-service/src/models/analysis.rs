//! Structured symptom triage result.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// How serious the described symptoms look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Recommended timeframe for seeking care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Urgency {
    Routine,
    Soon,
    Urgent,
    Emergency,
}

/// Value outside an enumerated domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {field} value: {value:?}")]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
}

impl FromStr for Severity {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            _ => Err(UnknownVariant {
                field: "severity",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for Urgency {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "routine" => Ok(Urgency::Routine),
            "soon" => Ok(Urgency::Soon),
            "urgent" => Ok(Urgency::Urgent),
            "emergency" => Ok(Urgency::Emergency),
            _ => Err(UnknownVariant {
                field: "urgency",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Urgency {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Triage answer for one symptom description. Every field is always
/// populated; see [`SymptomAnalysis::fallback`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomAnalysis {
    pub severity: Severity,
    pub response: String,
    pub recommendations: Vec<String>,
    pub suggestions: Vec<String>,
    pub urgency: Urgency,
    pub possible_causes: Vec<String>,
}

impl SymptomAnalysis {
    /// The fixed answer used whenever a real analysis cannot be obtained.
    pub fn fallback() -> Self {
        Self {
            severity: Severity::Medium,
            response: "Thank you for describing your symptoms. While I can provide general \
                       health information, it's important to consult with a healthcare \
                       professional for proper evaluation and diagnosis of your specific \
                       situation."
                .to_string(),
            recommendations: strings(&[
                "Consult with a healthcare professional for proper evaluation",
                "Monitor your symptoms and note any changes",
                "Keep a symptom diary with dates and severity",
                "Seek immediate care if symptoms worsen significantly",
            ]),
            suggestions: strings(&[
                "When did these symptoms first start?",
                "Have you experienced these symptoms before?",
                "Are there any other symptoms you're experiencing?",
            ]),
            urgency: Urgency::Soon,
            possible_causes: strings(&[
                "Various medical conditions could cause these symptoms",
                "Professional medical evaluation is needed for accurate assessment",
                "Multiple factors could be contributing to your symptoms",
            ]),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_is_fully_populated() {
        let fallback = SymptomAnalysis::fallback();
        assert_eq!(fallback.severity, Severity::Medium);
        assert_eq!(fallback.urgency, Urgency::Soon);
        assert!(!fallback.response.is_empty());
        assert_eq!(fallback.recommendations.len(), 4);
        assert_eq!(fallback.suggestions.len(), 3);
        assert_eq!(fallback.possible_causes.len(), 3);
        assert_eq!(fallback, SymptomAnalysis::fallback());
    }

    #[test]
    fn test_enum_parsing_is_case_insensitive() {
        assert_eq!("HIGH".parse::<Severity>().unwrap(), Severity::High);
        assert_eq!(" Emergency ".parse::<Urgency>().unwrap(), Urgency::Emergency);
        let err = "critical".parse::<Severity>().unwrap_err();
        assert_eq!(err.field, "severity");
        assert_eq!(err.to_string(), "unknown severity value: \"critical\"");
    }

    #[test]
    fn test_serializes_with_wire_names() {
        let value = serde_json::to_value(SymptomAnalysis::fallback()).unwrap();
        assert_eq!(value["severity"], "medium");
        assert_eq!(value["urgency"], "soon");
        assert!(value["possibleCauses"].is_array());
    }
}
