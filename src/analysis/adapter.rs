//! Normalizes raw provider output into questions, risks and impacts.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer};
use sha2::{Digest, Sha256};

use super::{AnalysisError, AnalysisResult};
use crate::models::{PositiveImpact, Question, Risk, Severity, DEFAULT_CATEGORY};
use crate::utils::extract_json_str;

/// Prefix of identifiers assigned by the adapter.
pub const GENERATED_ID_PREFIX: &str = "ai-";

/// Hex digits of the content hash kept in a generated id.
const ID_HASH_LEN: usize = 12;

/// Treat an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct RawPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    risks: Vec<RawRisk>,
    #[serde(
        default,
        alias = "positiveImpacts",
        deserialize_with = "null_as_default"
    )]
    positive_impacts: Vec<RawImpact>,
    #[serde(default, deserialize_with = "null_as_default")]
    recommendations: Vec<String>,
    #[serde(
        default,
        alias = "suggestedQuestions",
        deserialize_with = "null_as_default"
    )]
    suggested_questions: Vec<RawQuestion>,
    #[serde(default, alias = "documentAnalysisNotes")]
    document_analysis_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRisk {
    #[serde(default, deserialize_with = "null_as_default")]
    title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    description: String,
    #[serde(default)]
    severity: Severity,
    #[serde(
        default,
        alias = "rightsAffected",
        deserialize_with = "null_as_default"
    )]
    rights_affected: Vec<String>,
    #[serde(default, alias = "documentReference")]
    document_reference: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawImpact {
    #[serde(default, deserialize_with = "null_as_default")]
    title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    description: String,
    #[serde(default, alias = "documentReference")]
    document_reference: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    guidance: String,
    #[serde(
        default,
        rename = "riskWarning",
        alias = "risk_warning",
        deserialize_with = "null_as_default"
    )]
    risk_warning: String,
}

/// Parse a provider's text response, tolerating markdown fences and chatter.
pub fn parse_analysis_response(response: &str) -> Result<AnalysisResult, AnalysisError> {
    let json_str = extract_json_str(response)
        .ok_or_else(|| AnalysisError::Malformed("No JSON object found in response".to_string()))?;
    let value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| AnalysisError::Malformed(format!("Invalid JSON: {}", e)))?;
    adapt_payload(value)
}

/// Convert an already-decoded payload.
pub fn adapt_payload(value: serde_json::Value) -> Result<AnalysisResult, AnalysisError> {
    if !value.is_object() {
        return Err(AnalysisError::Malformed(
            "Payload is not a JSON object".to_string(),
        ));
    }

    let raw: RawPayload = serde_json::from_value(value)
        .map_err(|e| AnalysisError::Malformed(format!("Unexpected payload shape: {}", e)))?;

    if raw.suggested_questions.is_empty() {
        return Err(AnalysisError::Malformed(
            "Payload contains no suggested questions".to_string(),
        ));
    }

    let mut ids = IdAllocator::default();
    let mut questions = Vec::with_capacity(raw.suggested_questions.len());
    for (index, q) in raw.suggested_questions.into_iter().enumerate() {
        let text = q
            .text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AnalysisError::Malformed(format!("Suggested question {} has no text", index + 1))
            })?;
        let category = q
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        let id = ids.assign(q.id.as_deref(), &category, &text);

        questions.push(
            Question::new(id, category, text)
                .with_guidance(q.guidance)
                .with_risk_warning(q.risk_warning),
        );
    }

    let risks = raw
        .risks
        .into_iter()
        .map(|r| Risk {
            title: r.title,
            description: r.description,
            severity: r.severity,
            rights_affected: r.rights_affected,
            document_reference: non_empty(r.document_reference),
        })
        .collect();

    let positive_impacts = raw
        .positive_impacts
        .into_iter()
        .map(|p| PositiveImpact {
            title: p.title,
            description: p.description,
            document_reference: non_empty(p.document_reference),
        })
        .collect();

    Ok(AnalysisResult {
        questions,
        risks,
        positive_impacts,
        recommendations: raw.recommendations,
        notes: non_empty(raw.document_analysis_notes),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Content-derived identifier for a question.
///
/// Depends only on category and text, so the same question keeps its id
/// across regenerations regardless of position.
pub fn stable_question_id(category: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(category.as_bytes());
    hasher.update([0x1f]);
    hasher.update(text.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{}{}", GENERATED_ID_PREFIX, &digest[..ID_HASH_LEN])
}

/// Hands out ids that are unique within one generated set.
#[derive(Default)]
pub(crate) struct IdAllocator {
    used: HashSet<String>,
}

impl IdAllocator {
    pub(crate) fn assign(&mut self, explicit: Option<&str>, category: &str, text: &str) -> String {
        if let Some(id) = explicit.map(str::trim).filter(|id| !id.is_empty()) {
            if self.used.insert(id.to_string()) {
                return id.to_string();
            }
        }

        let base = stable_question_id(category, text);
        if self.used.insert(base.clone()) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}
