//! Project analysis: provider boundary, result adapter and fallback.
//!
//! The provider turns a project description plus document texts into risks,
//! positive impacts, recommendations and a questionnaire. When every
//! provider attempt fails, the fixed [`fallback::fallback_bundle`] is used so
//! an assessment never ends up without questions.

pub mod adapter;
pub mod fallback;
pub mod policy;
pub mod prompt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::models::{AssessmentInfo, PositiveImpact, Question, Risk};
use policy::{ExhaustedError, OrderedFallback};

/// Project fields sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Thai label of the assessment type.
    pub assessment_type: String,
    pub name: String,
    /// Sector label, or the custom text for `other`.
    pub sector: String,
    pub description: String,
}

impl ProjectInfo {
    pub fn from_info(info: &AssessmentInfo) -> Self {
        Self {
            assessment_type: info
                .assessment_type
                .map(|t| t.label().to_string())
                .unwrap_or_default(),
            name: info.name.clone(),
            sector: info.sector_text(),
            description: info.description.clone(),
        }
    }
}

/// Input to an analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub project: ProjectInfo,
    /// Framed document texts, one per attached file.
    pub document_texts: Vec<String>,
}

/// Normalized analysis output.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub questions: Vec<Question>,
    pub risks: Vec<Risk>,
    pub positive_impacts: Vec<PositiveImpact>,
    pub recommendations: Vec<String>,
    /// Provider's remarks on the quality of the supplied material.
    pub notes: Option<String>,
}

/// Where an [`AnalysisResult`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisSource {
    /// Produced by the named provider attempt.
    Provider(String),
    /// The built-in bundle; carries the reason the providers were bypassed.
    Fallback(String),
}

/// Result of [`analyze_with_fallback`].
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub source: AnalysisSource,
}

impl AnalysisOutcome {
    pub fn used_fallback(&self) -> bool {
        matches!(self.source, AnalysisSource::Fallback(_))
    }
}

/// Errors from analysis.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Provider output could not be turned into a usable result.
    #[error("Malformed analysis result: {0}")]
    Malformed(String),

    #[error(transparent)]
    AllProvidersExhausted(#[from] ExhaustedError),
}

/// Anything that can analyze a project.
pub trait AnalysisProvider {
    /// Returns the result and a label naming what produced it.
    fn analyze(&self, request: &AnalysisRequest) -> Result<(AnalysisResult, String), AnalysisError>;
}

/// Provider backed by an ordered list of model attempts.
pub struct ModelAnalysisProvider {
    policy: OrderedFallback,
}

impl ModelAnalysisProvider {
    pub fn new(policy: OrderedFallback) -> Self {
        Self { policy }
    }
}

impl AnalysisProvider for ModelAnalysisProvider {
    fn analyze(&self, request: &AnalysisRequest) -> Result<(AnalysisResult, String), AnalysisError> {
        let prompt = prompt::build_analysis_prompt(request);
        let outcome = self.policy.run(&prompt, adapter::parse_analysis_response)?;
        Ok(outcome)
    }
}

/// Provider that never answers; selects the fallback bundle directly.
pub struct OfflineProvider;

impl AnalysisProvider for OfflineProvider {
    fn analyze(&self, _request: &AnalysisRequest) -> Result<(AnalysisResult, String), AnalysisError> {
        Err(AnalysisError::Malformed(
            "Offline analysis requested".to_string(),
        ))
    }
}

/// Run `provider`, substituting the fallback bundle on any failure.
pub fn analyze_with_fallback(
    provider: &dyn AnalysisProvider,
    request: &AnalysisRequest,
) -> AnalysisOutcome {
    match provider.analyze(request) {
        Ok((result, label)) => AnalysisOutcome {
            result,
            source: AnalysisSource::Provider(label),
        },
        Err(e) => {
            warn!("Using default analysis: {}", e);
            AnalysisOutcome {
                result: fallback::fallback_bundle(),
                source: AnalysisSource::Fallback(e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::llm::test_support::{FailingClient, MockLlmClient, RecordingClient};
    use crate::llm::LlmClient;
    use crate::models::AssessmentType;
    use policy::Attempt;

    fn request() -> AnalysisRequest {
        let info = AssessmentInfo {
            name: "เหมืองโปแตช".to_string(),
            assessment_type: Some(AssessmentType::Project),
            sector: "mining".to_string(),
            ..Default::default()
        };
        AnalysisRequest {
            project: ProjectInfo::from_info(&info),
            document_texts: Vec::new(),
        }
    }

    fn client(c: impl LlmClient + 'static) -> Arc<dyn LlmClient> {
        Arc::new(c)
    }

    fn provider(clients: Vec<Arc<dyn LlmClient>>) -> ModelAnalysisProvider {
        let attempts = clients
            .into_iter()
            .enumerate()
            .map(|(i, c)| Attempt::new(format!("m{}", i), c, Duration::from_secs(5)))
            .collect();
        ModelAnalysisProvider::new(OrderedFallback::new(attempts))
    }

    #[test]
    fn project_info_uses_labels() {
        let project = request().project;
        assert_eq!(project.assessment_type, "โครงการ/กิจกรรม");
        assert_eq!(project.sector, "เหมืองแร่และทรัพยากรธรณี");
    }

    #[test]
    fn provider_result_is_used() {
        let client = Arc::new(RecordingClient::new(
            r#"{"suggested_questions": [{"category": "แรงงาน", "text": "มีการจ้างแรงงานในพื้นที่ ใช่หรือไม่"}]}"#,
        ));
        let shared: Arc<dyn LlmClient> = client.clone();
        let provider = provider(vec![shared]);

        let outcome = analyze_with_fallback(&provider, &request());

        assert_eq!(outcome.source, AnalysisSource::Provider("m0".to_string()));
        assert_eq!(outcome.result.questions.len(), 1);
        assert!(client.prompts()[0].contains("เหมืองโปแตช"));
    }

    #[test]
    fn malformed_output_falls_through_to_next_model() {
        let provider = provider(vec![
            client(MockLlmClient::new("I cannot produce JSON today")),
            client(MockLlmClient::new(
                r#"{"suggested_questions": [{"text": "q ใช่หรือไม่"}]}"#,
            )),
        ]);

        let outcome = analyze_with_fallback(&provider, &request());
        assert_eq!(outcome.source, AnalysisSource::Provider("m1".to_string()));
    }

    #[test]
    fn exhaustion_uses_fallback_bundle() {
        let provider = provider(vec![
            client(FailingClient::new("model not found")),
            client(MockLlmClient::new("{}")),
        ]);

        let outcome = analyze_with_fallback(&provider, &request());

        assert!(outcome.used_fallback());
        assert_eq!(outcome.result, fallback::fallback_bundle());
        match outcome.source {
            AnalysisSource::Fallback(reason) => assert!(reason.contains("All 2")),
            other => panic!("unexpected source: {:?}", other),
        }
    }

    #[test]
    fn offline_provider_uses_fallback() {
        let outcome = analyze_with_fallback(&OfflineProvider, &request());
        assert!(outcome.used_fallback());
        assert!(!outcome.result.questions.is_empty());
    }
}
