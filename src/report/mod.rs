//! Report assembly: an immutable snapshot of a scored assessment.

pub mod export;
pub mod pdf;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::answers::Score;
use crate::models::{Assessment, AssessmentId, AssessmentInfo, PositiveImpact, Risk};
use crate::scoring::{self, AnswerCounts, CategoryScore};

pub use export::{export, export_filename, render, OutputFormat};
pub use pdf::{PdfError, PdfOptions};

/// Errors from report assembly.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("ไม่พบรายงานการประเมิน: {0}")]
    InvalidAssessment(String),
}

/// One questionnaire line as it appears in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseLine {
    pub question_id: String,
    pub category: String,
    pub text: String,
    /// `None` when the question was left unanswered.
    pub score: Option<Score>,
    pub evidence: Option<String>,
}

/// Rendered-ready snapshot of one assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub assessment_id: AssessmentId,
    pub info: AssessmentInfo,
    pub completed: bool,
    pub last_updated: DateTime<Utc>,
    pub completion_rate: u8,
    pub category_scores: Vec<CategoryScore>,
    pub counts: AnswerCounts,
    pub risks: Vec<Risk>,
    pub positive_impacts: Vec<PositiveImpact>,
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_notes: Option<String>,
    pub responses: Vec<ResponseLine>,
}

impl Report {
    /// Headline label shown beside the score.
    pub fn overall_label(&self) -> &'static str {
        if self.positive_impacts.is_empty() {
            "ปานกลาง"
        } else {
            "ดี"
        }
    }
}

/// Score `assessment` and combine it with its analysis lists.
///
/// Pure: the same assessment state always yields an equal report.
pub fn assemble(assessment: &Assessment) -> Result<Report, ReportError> {
    let mut seen = HashSet::new();
    if let Some(dup) = assessment
        .questions
        .iter()
        .find(|q| !seen.insert(q.id.as_str()))
    {
        return Err(ReportError::InvalidAssessment(format!(
            "assessment {} has duplicate question id '{}'",
            assessment.id, dup.id
        )));
    }

    let card = scoring::score(&assessment.questions, &assessment.answers);

    let responses = assessment
        .questions
        .iter()
        .map(|q| ResponseLine {
            question_id: q.id.clone(),
            category: q.category.clone(),
            text: q.text.clone(),
            score: assessment.answers.score(&q.id),
            evidence: assessment.answers.evidence(&q.id).map(str::to_string),
        })
        .collect();

    Ok(Report {
        assessment_id: assessment.id,
        info: assessment.info.clone(),
        completed: assessment.completed,
        last_updated: assessment.last_updated,
        completion_rate: card.completion_rate,
        category_scores: card.category_scores,
        counts: card.counts,
        risks: assessment.risks.clone(),
        positive_impacts: assessment.positive_impacts.clone(),
        recommendations: assessment.recommendations.clone(),
        analysis_notes: assessment.analysis_notes.clone(),
        responses,
    })
}

/// Assemble from a lookup result, treating a missing assessment as invalid.
pub fn assemble_found(
    assessment: Option<&Assessment>,
    id: AssessmentId,
) -> Result<Report, ReportError> {
    let assessment = assessment
        .ok_or_else(|| ReportError::InvalidAssessment(format!("no assessment with id {}", id)))?;
    assemble(assessment)
}
