//! HRIA consultant chat.

use crate::analysis::policy::{ExhaustedError, OrderedFallback};
use crate::models::AssessmentInfo;

/// Errors surfaced to the user, already localized.
#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("ขออภัย API key ไม่ถูกต้อง กรุณาตรวจสอบการตั้งค่า")]
    InvalidApiKey,

    #[error("ขออภัย ใช้งาน AI เกินโควต้าแล้ว กรุณาลองใหม่ภายหลัง")]
    QuotaExceeded,

    #[error("ขออภัย ไม่สามารถเชื่อมต่อกับ AI ได้ในขณะนี้ ({0})")]
    Unavailable(String),
}

/// Shown when no model was configured to try.
const NO_MODEL_TRIED: &str = "ไม่มีโมเดล AI ที่กำหนดไว้";

impl From<ExhaustedError> for AdvisorError {
    fn from(err: ExhaustedError) -> Self {
        match err.last_llm_error() {
            Some(e) if e.is_api_key_problem() => Self::InvalidApiKey,
            Some(e) if e.is_quota_problem() => Self::QuotaExceeded,
            _ => Self::Unavailable(
                err.last()
                    .map(|f| f.error.to_string())
                    .unwrap_or_else(|| NO_MODEL_TRIED.to_string()),
            ),
        }
    }
}

/// Builds the consultant prompt for `message`, with optional project context.
pub fn build_advisor_prompt(message: &str, context: Option<&AssessmentInfo>) -> String {
    let mut prompt = format!(
        "Act as a Human Rights Impact Assessment (HRIA) Expert Consultant.\n\
         Your goal is to assist users in understanding and conducting HRIA.\n\
         Answer questions clearly, professionally, and concisely in THAI language.\n\n\
         User Message: {}\n",
        message
    );

    if let Some(info) = context {
        let or_na = |s: &str| {
            if s.trim().is_empty() {
                "N/A".to_string()
            } else {
                s.to_string()
            }
        };
        prompt.push_str(&format!(
            "\nCurrent Assessment Context:\nProject Name: {}\nType: {}\nSector: {}\nDescription: {}\n",
            or_na(&info.name),
            info.assessment_type
                .map(|t| t.label().to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            or_na(&info.sector_text()),
            or_na(&info.description)
        ));
    }

    prompt
}

/// Answers free-form questions through the configured model list.
pub struct Advisor {
    policy: OrderedFallback,
}

impl Advisor {
    pub fn new(policy: OrderedFallback) -> Self {
        Self { policy }
    }

    pub fn ask(&self, message: &str, context: Option<&AssessmentInfo>) -> Result<String, AdvisorError> {
        let prompt = build_advisor_prompt(message, context);
        let (reply, _) = self.policy.run(&prompt, |response| {
            let reply = response.trim();
            if reply.is_empty() {
                Err("empty reply")
            } else {
                Ok(reply.to_string())
            }
        })?;
        Ok(reply)
    }
}
