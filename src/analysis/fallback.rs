//! Fixed analysis used when no provider produces usable output.

use super::adapter::IdAllocator;
use super::AnalysisResult;
use crate::models::{PositiveImpact, Question, Risk, Severity};

struct DefaultQuestion {
    category: &'static str,
    text: &'static str,
    guidance: &'static str,
    risk_warning: &'static str,
}

const DEFAULT_QUESTIONS: &[DefaultQuestion] = &[
    DefaultQuestion {
        category: "การมีส่วนร่วม",
        text: "มีการปรึกษาหารือกับชุมชนที่ได้รับผลกระทบหรือไม่?",
        guidance: "ควรมีกระบวนการรับฟังความคิดเห็นอย่างแท้จริง",
        risk_warning: "การไม่มีส่วนร่วมอาจนำไปสู่ความขัดแย้ง",
    },
    DefaultQuestion {
        category: "สิ่งแวดล้อมและสุขภาพ",
        text: "โครงการมีการประเมินผลกระทบต่อคุณภาพอากาศและน้ำในพื้นที่ ใช่หรือไม่",
        guidance: "ตรวจสอบรายงาน EIA/EHIA และแผนติดตามคุณภาพสิ่งแวดล้อม",
        risk_warning: "มลพิษอาจกระทบสิทธิในสุขภาพของชุมชน",
    },
    DefaultQuestion {
        category: "ที่ดินและที่อยู่อาศัย",
        text: "มีมาตรการชดเชยที่เป็นธรรมสำหรับผู้ที่ต้องย้ายถิ่นฐานหรือสูญเสียที่ดิน ใช่หรือไม่",
        guidance: "ควรกำหนดอัตราชดเชยและแผนฟื้นฟูอาชีพไว้ล่วงหน้า",
        risk_warning: "การเวนคืนโดยไม่ชดเชยเป็นการละเมิดสิทธิในทรัพย์สิน",
    },
    DefaultQuestion {
        category: "การเยียวยา",
        text: "มีกลไกรับเรื่องร้องเรียนและเยียวยาผู้ได้รับผลกระทบ ใช่หรือไม่",
        guidance: "กลไกควรเข้าถึงได้ง่าย โปร่งใส และมีระยะเวลาตอบสนองชัดเจน",
        risk_warning: "การขาดช่องทางเยียวยาทำให้ผลกระทบไม่ได้รับการแก้ไข",
    },
];

/// The provider-independent default bundle.
///
/// Always non-empty, and every question carries an id, category and text.
pub fn fallback_bundle() -> AnalysisResult {
    let mut ids = IdAllocator::default();
    let questions = DEFAULT_QUESTIONS
        .iter()
        .map(|d| {
            Question::new(ids.assign(None, d.category, d.text), d.category, d.text)
                .with_guidance(d.guidance)
                .with_risk_warning(d.risk_warning)
        })
        .collect();

    AnalysisResult {
        questions,
        risks: vec![
            Risk {
                title: "ผลกระทบต่อสิ่งแวดล้อมและสุขภาพชุมชน".to_string(),
                description: "การดำเนินโครงการอาจส่งผลกระทบต่อคุณภาพอากาศและน้ำในพื้นที่"
                    .to_string(),
                severity: Severity::High,
                rights_affected: vec![
                    "สิทธิในสุขภาพ".to_string(),
                    "สิทธิในสิ่งแวดล้อมที่ดี".to_string(),
                ],
                document_reference: None,
            },
            Risk {
                title: "การใช้ที่ดินและการย้ายถิ่นฐาน".to_string(),
                description: "อาจมีการเวนคืนที่ดินหรือการโยกย้ายชุมชน".to_string(),
                severity: Severity::High,
                rights_affected: vec![
                    "สิทธิในที่อยู่อาศัย".to_string(),
                    "สิทธิในทรัพย์สิน".to_string(),
                ],
                document_reference: None,
            },
        ],
        positive_impacts: vec![
            PositiveImpact {
                title: "การสร้างงานและรายได้".to_string(),
                description: "โครงการจะสร้างงานและเพิ่มรายได้ให้กับชุมชนท้องถิ่น".to_string(),
                document_reference: None,
            },
            PositiveImpact {
                title: "การพัฒนาโครงสร้างพื้นฐาน".to_string(),
                description: "อาจมีการพัฒนาถนน ไฟฟ้า และสาธารณูปโภคในพื้นที่".to_string(),
                document_reference: None,
            },
        ],
        recommendations: vec![
            "จัดทำแผนการมีส่วนร่วมของชุมชนอย่างเป็นระบบ".to_string(),
            "กำหนดมาตรการชดเชยและฟื้นฟูที่เหมาะสม".to_string(),
            "ติดตามและรายงานผลกระทบอย่างสม่ำเสมอ".to_string(),
        ],
        notes: None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn bundle_is_structurally_valid() {
        let bundle = fallback_bundle();
        assert!(!bundle.questions.is_empty());
        assert!(!bundle.risks.is_empty());
        for q in &bundle.questions {
            assert!(!q.id.is_empty());
            assert!(!q.category.is_empty());
            assert!(!q.text.is_empty());
        }
        let ids: HashSet<_> = bundle.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids.len(), bundle.questions.len());
    }

    #[test]
    fn bundle_is_stable() {
        assert_eq!(fallback_bundle(), fallback_bundle());
    }

    #[test]
    fn participation_question_comes_first() {
        let bundle = fallback_bundle();
        assert_eq!(bundle.questions[0].category, "การมีส่วนร่วม");
        assert_eq!(bundle.recommendations.len(), 3);
    }
}
