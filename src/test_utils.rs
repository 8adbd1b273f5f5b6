//! Shared test utilities for creating test fixtures.
//!
//! This module provides helper functions for creating test data
//! used across multiple test modules.

use chrono::{DateTime, TimeZone, Utc};

use crate::models::{Assessment, AssessmentId, AssessmentInfo, AssessmentType, Question};

/// A fixed instant so ids and timestamps are predictable.
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0).unwrap()
}

/// Info that passes the analysis readiness check.
pub fn sample_info() -> AssessmentInfo {
    AssessmentInfo {
        name: "เขื่อนแม่วงก์".to_string(),
        assessment_type: Some(AssessmentType::Project),
        sector: "dam".to_string(),
        custom_sector: None,
        description: "เขื่อนเอนกประสงค์ในพื้นที่ป่าอนุรักษ์".to_string(),
        owner: "กรมชลประทาน".to_string(),
    }
}

/// An assessment holding `questions` and nothing else.
pub fn assessment_with(questions: Vec<Question>) -> Assessment {
    let mut assessment = Assessment::new(
        AssessmentId(fixed_time().timestamp_millis()),
        sample_info(),
        fixed_time(),
    );
    assessment.questions = questions;
    assessment
}
