//! Per-assessment answer state: three-point scores and free-text evidence.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Rejected score value. Only 0, 0.5 and 1 are accepted.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("Invalid score {0}: must be 1 (yes), 0.5 (partial) or 0 (no)")]
pub struct InvalidScore(pub f64);

/// Three-point compliance score for a single question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum Score {
    /// ไม่ใช่: non-compliance, 0 points.
    No,
    /// ใช่บางส่วน: partial compliance, 0.5 points.
    Partial,
    /// ใช่: full compliance, 1 point.
    Yes,
}

impl Score {
    pub fn value(&self) -> f64 {
        match self {
            Self::No => 0.0,
            Self::Partial => 0.5,
            Self::Yes => 1.0,
        }
    }

    /// Score in half points (0, 1 or 2) for exact integer arithmetic.
    pub fn half_points(&self) -> u64 {
        match self {
            Self::No => 0,
            Self::Partial => 1,
            Self::Yes => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::No => "ไม่ใช่",
            Self::Partial => "ใช่บางส่วน",
            Self::Yes => "ใช่",
        }
    }

    /// Whether the UI convention asks for an evidence note with this score.
    pub fn expects_evidence(&self) -> bool {
        !matches!(self, Self::Yes)
    }
}

impl TryFrom<f64> for Score {
    type Error = InvalidScore;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value == 1.0 {
            Ok(Self::Yes)
        } else if value == 0.5 {
            Ok(Self::Partial)
        } else if value == 0.0 {
            Ok(Self::No)
        } else {
            Err(InvalidScore(value))
        }
    }
}

impl From<Score> for f64 {
    fn from(score: Score) -> Self {
        score.value()
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.value())
    }
}

impl FromStr for Score {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yes" | "y" | "ใช่" => Ok(Self::Yes),
            "partial" | "p" | "ใช่บางส่วน" => Ok(Self::Partial),
            "no" | "n" | "ไม่ใช่" => Ok(Self::No),
            other => other
                .parse::<f64>()
                .map_err(|_| format!("Unknown answer: '{}'. Use yes, partial, no, 1, 0.5 or 0", s))
                .and_then(|v| Score::try_from(v).map_err(|e| e.to_string())),
        }
    }
}

/// Answers for one assessment, keyed by question id.
///
/// Scores and evidence are stored independently: evidence may be written
/// before a score is chosen, and re-answering a question overwrites in place.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnswerSheet {
    #[serde(default)]
    scores: BTreeMap<String, Score>,
    #[serde(default)]
    evidence: BTreeMap<String, String>,
}

impl AnswerSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a raw score, validating it before any mutation.
    pub fn set_score(&mut self, question_id: &str, raw: f64) -> Result<Score, InvalidScore> {
        let score = Score::try_from(raw)?;
        self.scores.insert(question_id.to_string(), score);
        Ok(score)
    }

    pub fn set(&mut self, question_id: &str, score: Score) {
        self.scores.insert(question_id.to_string(), score);
    }

    pub fn set_evidence(&mut self, question_id: &str, text: impl Into<String>) {
        self.evidence.insert(question_id.to_string(), text.into());
    }

    /// `None` means unanswered, which is distinct from [`Score::No`].
    pub fn score(&self, question_id: &str) -> Option<Score> {
        self.scores.get(question_id).copied()
    }

    pub fn evidence(&self, question_id: &str) -> Option<&str> {
        self.evidence.get(question_id).map(String::as_str)
    }

    pub fn answered_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.scores.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Drop scores and evidence whose question id fails `keep`.
    pub fn retain_questions(&mut self, keep: impl Fn(&str) -> bool) -> usize {
        let before = self.scores.len() + self.evidence.len();
        self.scores.retain(|id, _| keep(id));
        self.evidence.retain(|id, _| keep(id));
        before - (self.scores.len() + self.evidence.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_three_values() {
        assert_eq!(Score::try_from(1.0), Ok(Score::Yes));
        assert_eq!(Score::try_from(0.5), Ok(Score::Partial));
        assert_eq!(Score::try_from(0.0), Ok(Score::No));
        assert_eq!(Score::try_from(0.7), Err(InvalidScore(0.7)));
        assert!(Score::try_from(2.0).is_err());
        assert!(Score::try_from(-1.0).is_err());
        assert!(Score::try_from(f64::NAN).is_err());
    }

    #[test]
    fn invalid_score_leaves_sheet_untouched() {
        let mut sheet = AnswerSheet::new();
        sheet.set_score("q1", 1.0).unwrap();

        assert!(sheet.set_score("q1", 0.25).is_err());
        assert_eq!(sheet.score("q1"), Some(Score::Yes));
        assert!(sheet.set_score("q2", 3.0).is_err());
        assert_eq!(sheet.score("q2"), None);
    }

    #[test]
    fn last_write_wins() {
        let mut sheet = AnswerSheet::new();
        sheet.set_score("q1", 0.0).unwrap();
        sheet.set_score("q1", 0.5).unwrap();
        assert_eq!(sheet.score("q1"), Some(Score::Partial));
        assert_eq!(sheet.len(), 1);
    }

    #[test]
    fn unanswered_is_not_no() {
        let mut sheet = AnswerSheet::new();
        sheet.set_score("q1", 0.0).unwrap();
        assert_eq!(sheet.score("q1"), Some(Score::No));
        assert_eq!(sheet.score("q2"), None);
    }

    #[test]
    fn evidence_is_independent_of_score() {
        let mut sheet = AnswerSheet::new();
        sheet.set_evidence("q1", "จัดเวทีรับฟัง 3 ครั้ง");
        assert_eq!(sheet.score("q1"), None);
        assert_eq!(sheet.evidence("q1"), Some("จัดเวทีรับฟัง 3 ครั้ง"));
        assert_eq!(sheet.evidence("q2"), None);
    }

    #[test]
    fn parses_answer_words_and_numbers() {
        assert_eq!("yes".parse::<Score>().unwrap(), Score::Yes);
        assert_eq!("ใช่บางส่วน".parse::<Score>().unwrap(), Score::Partial);
        assert_eq!("0".parse::<Score>().unwrap(), Score::No);
        assert_eq!("0.5".parse::<Score>().unwrap(), Score::Partial);
        assert!("0.3".parse::<Score>().is_err());
        assert!("maybe".parse::<Score>().is_err());
    }

    #[test]
    fn serializes_scores_as_numbers() {
        let mut sheet = AnswerSheet::new();
        sheet.set("a", Score::Partial);
        let json = serde_json::to_string(&sheet).unwrap();
        assert_eq!(json, r#"{"scores":{"a":0.5},"evidence":{}}"#);

        let bad = r#"{"scores":{"a":0.3}}"#;
        assert!(serde_json::from_str::<AnswerSheet>(bad).is_err());
    }

    #[test]
    fn retain_drops_orphans() {
        let mut sheet = AnswerSheet::new();
        sheet.set("keep", Score::Yes);
        sheet.set("gone", Score::No);
        sheet.set_evidence("gone", "note");

        let removed = sheet.retain_questions(|id| id == "keep");
        assert_eq!(removed, 2);
        assert_eq!(sheet.answered_ids().collect::<Vec<_>>(), vec!["keep"]);
    }
}
