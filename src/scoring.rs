//! Completion and per-category (radar) scoring.
//!
//! Scores are summed in half points so every percentage is computed with
//! integer arithmetic and rounds half up, matching `Math.round` on the
//! non-negative values involved.

use serde::{Deserialize, Serialize};

use crate::answers::{AnswerSheet, Score};
use crate::models::Question;

/// Percentage score for one radar axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: String,
    pub percent: u8,
}

/// Answer tallies over the current question set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnswerCounts {
    /// Number of questions, answered or not.
    pub total: usize,
    pub passed: usize,
    pub partial: usize,
    pub failed: usize,
}

impl AnswerCounts {
    pub fn answered(&self) -> usize {
        self.passed + self.partial + self.failed
    }

    pub fn unanswered(&self) -> usize {
        self.total - self.answered()
    }
}

/// Output of [`score`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreCard {
    /// Aggregate percentage over all questions; unanswered count as 0.
    pub completion_rate: u8,
    /// One entry per distinct category, in first-seen order.
    pub category_scores: Vec<CategoryScore>,
    pub counts: AnswerCounts,
}

/// Score a question set against recorded answers.
///
/// Answers whose id is not in `questions` are ignored. An empty question set
/// scores 0 with no categories.
pub fn score(questions: &[Question], answers: &AnswerSheet) -> ScoreCard {
    let mut counts = AnswerCounts {
        total: questions.len(),
        ..Default::default()
    };
    let mut total_half_points = 0u64;
    // (category, half points, members)
    let mut groups: Vec<(&str, u64, u64)> = Vec::new();

    for question in questions {
        let answer = answers.score(&question.id);
        let half_points = answer.map(|s| s.half_points()).unwrap_or(0);

        match answer {
            Some(Score::Yes) => counts.passed += 1,
            Some(Score::Partial) => counts.partial += 1,
            Some(Score::No) => counts.failed += 1,
            None => {}
        }
        total_half_points += half_points;

        match groups
            .iter_mut()
            .find(|(category, _, _)| *category == question.category)
        {
            Some(group) => {
                group.1 += half_points;
                group.2 += 1;
            }
            None => groups.push((question.category.as_str(), half_points, 1)),
        }
    }

    let category_scores = groups
        .into_iter()
        .map(|(category, half_points, members)| CategoryScore {
            category: category.to_string(),
            percent: percent(half_points, members),
        })
        .collect();

    ScoreCard {
        completion_rate: percent(total_half_points, questions.len() as u64),
        category_scores,
        counts,
    }
}

/// `round(100 * (half_points / 2) / count)`, rounding half up; 0 when `count` is 0.
fn percent(half_points: u64, count: u64) -> u8 {
    if count == 0 {
        return 0;
    }
    let denominator = 2 * count;
    let rounded = (100 * half_points + count) / denominator;
    rounded.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(id: &str, category: &str) -> Question {
        Question::new(id, category, format!("{} ใช่หรือไม่", id))
    }

    fn sheet(entries: &[(&str, Score)]) -> AnswerSheet {
        let mut sheet = AnswerSheet::new();
        for (id, s) in entries {
            sheet.set(id, *s);
        }
        sheet
    }

    #[test]
    fn empty_question_set() {
        let card = score(&[], &AnswerSheet::new());
        assert_eq!(card.completion_rate, 0);
        assert!(card.category_scores.is_empty());
        assert_eq!(card.counts, AnswerCounts::default());
    }

    #[test]
    fn groups_by_category_in_first_seen_order() {
        let questions = vec![q("a", "X"), q("b", "X"), q("c", "Y")];
        let answers = sheet(&[("a", Score::Yes), ("b", Score::No), ("c", Score::Partial)]);

        let card = score(&questions, &answers);

        assert_eq!(
            card.category_scores,
            vec![
                CategoryScore {
                    category: "X".to_string(),
                    percent: 50
                },
                CategoryScore {
                    category: "Y".to_string(),
                    percent: 50
                },
            ]
        );
        assert_eq!(card.completion_rate, 50);
    }

    #[test]
    fn interleaved_categories_keep_first_seen_order() {
        let questions = vec![q("a", "Y"), q("b", "X"), q("c", "Y")];
        let card = score(&questions, &AnswerSheet::new());
        let order: Vec<_> = card.category_scores.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(order, vec!["Y", "X"]);
    }

    #[test]
    fn unanswered_counts_as_zero() {
        let card = score(&[q("a", "X")], &AnswerSheet::new());
        assert_eq!(card.completion_rate, 0);
        assert_eq!(card.category_scores[0].percent, 0);
        assert_eq!(card.counts.total, 1);
        assert_eq!(card.counts.unanswered(), 1);
    }

    #[test]
    fn unfinished_questionnaire_never_reaches_full_marks() {
        let questions = vec![q("a", "X"), q("b", "X")];
        let card = score(&questions, &sheet(&[("a", Score::Yes)]));
        assert_eq!(card.completion_rate, 50);
    }

    #[test]
    fn rounds_half_up() {
        // 0.5 / 3 = 16.67%
        let questions = vec![q("a", "X"), q("b", "X"), q("c", "X")];
        let card = score(&questions, &sheet(&[("a", Score::Partial)]));
        assert_eq!(card.completion_rate, 17);

        // 2.5 / 4 = 62.5% -> 63
        let questions = vec![q("a", "X"), q("b", "X"), q("c", "X"), q("d", "X")];
        let answers = sheet(&[("a", Score::Yes), ("b", Score::Yes), ("c", Score::Partial)]);
        assert_eq!(score(&questions, &answers).completion_rate, 63);

        // 0.5 / 8 = 6.25% -> 6
        let questions: Vec<_> = (0..8).map(|i| q(&format!("q{}", i), "X")).collect();
        let answers = sheet(&[("q0", Score::Partial)]);
        assert_eq!(score(&questions, &answers).completion_rate, 6);
    }

    #[test]
    fn matches_reference_formula_for_all_small_sequences() {
        let options = [None, Some(Score::No), Some(Score::Partial), Some(Score::Yes)];
        for n in 1..=5usize {
            let questions: Vec<_> = (0..n).map(|i| q(&format!("q{}", i), "X")).collect();
            for combo in 0..options.len().pow(n as u32) {
                let mut answers = AnswerSheet::new();
                let mut sum = 0.0;
                let mut rest = combo;
                for i in 0..n {
                    if let Some(s) = options[rest % options.len()] {
                        answers.set(&format!("q{}", i), s);
                        sum += s.value();
                    }
                    rest /= options.len();
                }
                let expected = (100.0 * sum / n as f64).round() as u8;
                let card = score(&questions, &answers);
                assert_eq!(card.completion_rate, expected, "n={} combo={}", n, combo);
                assert!(card.completion_rate <= 100);
            }
        }
    }

    #[test]
    fn raising_a_score_never_lowers_completion() {
        let questions = vec![q("a", "X"), q("b", "Y"), q("c", "Y")];
        let base = sheet(&[("a", Score::No), ("b", Score::Partial)]);
        let before = score(&questions, &base).completion_rate;

        for raised in [Score::Partial, Score::Yes] {
            let mut answers = base.clone();
            answers.set("a", raised);
            assert!(score(&questions, &answers).completion_rate >= before);
        }
    }

    #[test]
    fn orphaned_answers_are_ignored() {
        let questions = vec![q("a", "X")];
        let answers = sheet(&[("a", Score::No), ("stale", Score::Yes)]);
        let card = score(&questions, &answers);
        assert_eq!(card.completion_rate, 0);
        assert_eq!(card.counts.total, 1);
        assert_eq!(card.counts.failed, 1);
        assert_eq!(card.counts.passed, 0);
    }

    #[test]
    fn counts_tally_each_score() {
        let questions = vec![q("a", "X"), q("b", "X"), q("c", "X"), q("d", "X")];
        let answers = sheet(&[("a", Score::Yes), ("b", Score::Partial), ("c", Score::No)]);
        let counts = score(&questions, &answers).counts;
        assert_eq!(
            counts,
            AnswerCounts {
                total: 4,
                passed: 1,
                partial: 1,
                failed: 1
            }
        );
        assert_eq!(counts.unanswered(), 1);
    }
}
