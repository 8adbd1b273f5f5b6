//! Cross-assessment overview.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Assessment, AssessmentId, Risk};
use crate::scoring::{self, CategoryScore};

/// Number of risks surfaced on the overview.
pub const TOP_RISKS: usize = 3;

/// Traffic-light rating of how many risks the latest assessment found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskStatus {
    Success,
    Caution,
    Warning,
}

impl RiskStatus {
    pub fn for_count(count: usize) -> Self {
        match count {
            0 => Self::Success,
            1..=3 => Self::Caution,
            _ => Self::Warning,
        }
    }
}

/// Highlights of the most recently updated completed assessment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestSummary {
    pub id: AssessmentId,
    pub name: String,
    pub type_label: String,
    pub last_updated: DateTime<Utc>,
    pub completion_rate: u8,
    pub risk_count: usize,
    pub risk_status: RiskStatus,
    pub positive_impact_count: usize,
    pub top_risks: Vec<Risk>,
    pub category_scores: Vec<CategoryScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub completed: usize,
    pub latest: Option<LatestSummary>,
}

pub fn summarize(assessments: &[Assessment]) -> DashboardSummary {
    let completed = assessments.iter().filter(|a| a.completed).count();
    let latest = assessments
        .iter()
        .filter(|a| a.completed)
        .max_by_key(|a| (a.last_updated, a.id))
        .map(latest_summary);

    DashboardSummary {
        total: assessments.len(),
        completed,
        latest,
    }
}

fn latest_summary(assessment: &Assessment) -> LatestSummary {
    let card = scoring::score(&assessment.questions, &assessment.answers);
    LatestSummary {
        id: assessment.id,
        name: assessment.info.name.clone(),
        type_label: assessment
            .info
            .assessment_type
            .map(|t| t.label().to_string())
            .unwrap_or_default(),
        last_updated: assessment.last_updated,
        completion_rate: card.completion_rate,
        risk_count: assessment.risks.len(),
        risk_status: RiskStatus::for_count(assessment.risks.len()),
        positive_impact_count: assessment.positive_impacts.len(),
        top_risks: assessment.risks.iter().take(TOP_RISKS).cloned().collect(),
        category_scores: card.category_scores,
    }
}

/// Plain-text rendering for the terminal.
pub fn format_summary(summary: &DashboardSummary) -> String {
    let mut output = format!(
        "การประเมินทั้งหมด: {} (เสร็จสมบูรณ์ {})\n",
        summary.total, summary.completed
    );

    let Some(latest) = &summary.latest else {
        output.push_str("ยังไม่มีการประเมินที่เสร็จสมบูรณ์\n");
        return output;
    };

    output.push_str(&format!(
        "\nล่าสุด: {} [{}] ({})\n",
        latest.name, latest.id, latest.type_label
    ));
    output.push_str(&format!(
        "อัปเดตเมื่อ {} | คะแนน {}% | ความเสี่ยง {} | ผลกระทบเชิงบวก {}\n",
        latest.last_updated.format("%Y-%m-%d"),
        latest.completion_rate,
        latest.risk_count,
        latest.positive_impact_count
    ));

    if !latest.category_scores.is_empty() {
        output.push_str("\nคะแนนรายหมวด:\n");
        for c in &latest.category_scores {
            output.push_str(&format!("  {}: {}%\n", c.category, c.percent));
        }
    }

    if latest.top_risks.is_empty() {
        output.push_str("\nไม่พบความเสี่ยง\n");
    } else {
        output.push_str("\nความเสี่ยงสำคัญ:\n");
        for risk in &latest.top_risks {
            output.push_str(&format!("  [{}] {}\n", risk.severity, risk.title));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::analysis::fallback::fallback_bundle;
    use crate::answers::Score;
    use crate::models::Question;
    use crate::test_utils::{assessment_with, fixed_time};

    #[test]
    fn empty_dashboard() {
        let summary = summarize(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.completed, 0);
        assert!(summary.latest.is_none());
        assert!(format_summary(&summary).contains("ยังไม่มีการประเมินที่เสร็จสมบูรณ์"));
    }

    #[test]
    fn latest_is_most_recent_completed() {
        let mut old = assessment_with(vec![Question::new("a", "X", "one")]);
        old.completed = true;
        old.answers.set("a", Score::Yes);

        let mut newer = assessment_with(vec![Question::new("a", "X", "one")]);
        newer.id.0 += 1;
        newer.completed = true;
        newer.last_updated = fixed_time() + Duration::hours(1);
        newer.info.name = "ใหม่".to_string();

        let mut draft = assessment_with(Vec::new());
        draft.id.0 += 2;
        draft.last_updated = fixed_time() + Duration::hours(2);

        let summary = summarize(&[old, newer, draft]);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.completed, 2);
        let latest = summary.latest.unwrap();
        assert_eq!(latest.name, "ใหม่");
        assert_eq!(latest.completion_rate, 0);
    }

    #[test]
    fn top_risks_are_capped() {
        let mut assessment = assessment_with(Vec::new());
        assessment.completed = true;
        let bundle = fallback_bundle();
        for _ in 0..3 {
            assessment.risks.extend(bundle.risks.iter().cloned());
        }

        let latest = summarize(&[assessment]).latest.unwrap();
        assert_eq!(latest.risk_count, 6);
        assert_eq!(latest.top_risks.len(), TOP_RISKS);
        assert_eq!(latest.risk_status, RiskStatus::Warning);
    }

    #[test]
    fn risk_status_thresholds() {
        assert_eq!(RiskStatus::for_count(0), RiskStatus::Success);
        assert_eq!(RiskStatus::for_count(3), RiskStatus::Caution);
        assert_eq!(RiskStatus::for_count(4), RiskStatus::Warning);
    }
}
