//! Core domain types for human rights impact assessments.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::answers::AnswerSheet;

/// Category used when the analysis provider leaves a question uncategorised.
pub const DEFAULT_CATEGORY: &str = "ทั่วไป";

/// Identifier of an assessment (milliseconds since the Unix epoch at creation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssessmentId(pub i64);

impl fmt::Display for AssessmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AssessmentId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(AssessmentId)
            .map_err(|_| format!("Invalid assessment id: '{}'", s))
    }
}

/// A yes/no questionnaire item produced by the analysis step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    /// Radar-chart axis. Free text supplied per assessment.
    pub category: String,
    pub text: String,
    #[serde(default)]
    pub guidance: String,
    #[serde(default)]
    pub risk_warning: String,
}

impl Question {
    pub fn new(id: impl Into<String>, category: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            text: text.into(),
            guidance: String::new(),
            risk_warning: String::new(),
        }
    }

    pub fn with_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.guidance = guidance.into();
        self
    }

    pub fn with_risk_warning(mut self, warning: impl Into<String>) -> Self {
        self.risk_warning = warning.into();
        self
    }
}

/// Risk severity as rated by the analysis provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Severity {
    High,
    #[default]
    Medium,
    Low,
}

impl Severity {
    /// Parse a provider-supplied label, defaulting to `Medium` for anything unrecognised.
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" | "สูง" => Ok(Self::High),
            "medium" | "ปานกลาง" => Ok(Self::Medium),
            "low" | "ต่ำ" => Ok(Self::Low),
            _ => Err(format!("Unknown severity: '{}'", s)),
        }
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.as_deref().map(Severity::from_label).unwrap_or_default())
    }
}

/// A human rights risk identified by the analysis provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Risk {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub rights_affected: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_reference: Option<String>,
}

/// A positive human rights impact identified by the analysis provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositiveImpact {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_reference: Option<String>,
}

/// What kind of instrument is being assessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssessmentType {
    Legislation,
    Policy,
    Plan,
    Project,
}

impl AssessmentType {
    /// Thai label shown in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Legislation => "กฎหมาย",
            Self::Policy => "นโยบาย",
            Self::Plan => "แผนงาน",
            Self::Project => "โครงการ/กิจกรรม",
        }
    }
}

impl fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legislation => write!(f, "Legislation"),
            Self::Policy => write!(f, "Policy"),
            Self::Plan => write!(f, "Plan"),
            Self::Project => write!(f, "Project"),
        }
    }
}

impl FromStr for AssessmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "legislation" | "law" => Ok(Self::Legislation),
            "policy" => Ok(Self::Policy),
            "plan" => Ok(Self::Plan),
            "project" => Ok(Self::Project),
            _ => Err(format!(
                "Unknown assessment type: '{}'. Valid options: legislation, policy, plan, project",
                s
            )),
        }
    }
}

/// Sector catalogue offered when describing a project. `other` takes free text.
pub const SECTORS: &[(&str, &str)] = &[
    ("mining", "เหมืองแร่และทรัพยากรธรณี"),
    ("fossil", "พลังงาน - เชื้อเพลิงฟอสซิล (น้ำมัน/ก๊าซ/ถ่านหิน)"),
    ("renewable", "พลังงาน - หมุนเวียน (ลม/แสงอาทิตย์/น้ำ)"),
    ("infra", "โครงสร้างพื้นฐานและการคมนาคม"),
    ("dam", "เขื่อนและการบริหารจัดการน้ำ"),
    ("agri", "เกษตรอุตสาหกรรมและป่าไม้"),
    ("industry", "อุตสาหกรรมการผลิตและเคมีภัณฑ์"),
    ("waste", "การจัดการขยะและของเสีย"),
    ("realestate", "อสังหาริมทรัพย์และที่อยู่อาศัย"),
    ("tourism", "การท่องเที่ยวและบริการ"),
    ("public_policy", "นโยบายสาธารณะ / กฎหมาย"),
    ("other", "อื่นๆ (ระบุ)"),
];

/// Look up the Thai label of a catalogued sector id.
pub fn sector_label(id: &str) -> Option<&'static str> {
    SECTORS
        .iter()
        .find(|(sector_id, _)| *sector_id == id)
        .map(|(_, label)| *label)
}

/// Descriptive information about the assessed instrument.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub assessment_type: Option<AssessmentType>,
    /// Sector id from [`SECTORS`] or empty.
    #[serde(default)]
    pub sector: String,
    /// Free-text sector used when `sector` is `other`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_sector: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner: String,
}

impl AssessmentInfo {
    /// Sector text sent to the analysis provider and shown in reports.
    pub fn sector_text(&self) -> String {
        if self.sector == "other" {
            return self.custom_sector.clone().unwrap_or_default();
        }
        sector_label(&self.sector)
            .map(str::to_string)
            .unwrap_or_else(|| self.sector.clone())
    }

    /// Whether the fields required to start an analysis are filled in.
    pub fn is_ready_for_analysis(&self) -> bool {
        self.assessment_type.is_some()
            && !self.name.trim().is_empty()
            && !self.sector.trim().is_empty()
    }

    /// Merge non-empty fields of `patch` into `self`.
    pub fn merge(&mut self, patch: InfoPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(kind) = patch.assessment_type {
            self.assessment_type = Some(kind);
        }
        if let Some(sector) = patch.sector {
            self.sector = sector;
        }
        if let Some(custom) = patch.custom_sector {
            self.custom_sector = Some(custom);
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(owner) = patch.owner {
            self.owner = owner;
        }
    }
}

/// Partial update to [`AssessmentInfo`]; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct InfoPatch {
    pub name: Option<String>,
    pub assessment_type: Option<AssessmentType>,
    pub sector: Option<String>,
    pub custom_sector: Option<String>,
    pub description: Option<String>,
    pub owner: Option<String>,
}

/// One user-created evaluation: project description, questionnaire and results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: AssessmentId,
    pub info: AssessmentInfo,
    /// Display order is insertion order.
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub answers: AnswerSheet,
    #[serde(default)]
    pub risks: Vec<Risk>,
    #[serde(default)]
    pub positive_impacts: Vec<PositiveImpact>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_notes: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub last_updated: DateTime<Utc>,
}

impl Assessment {
    pub fn new(id: AssessmentId, info: AssessmentInfo, now: DateTime<Utc>) -> Self {
        Self {
            id,
            info,
            questions: Vec::new(),
            answers: AnswerSheet::default(),
            risks: Vec::new(),
            positive_impacts: Vec::new(),
            recommendations: Vec::new(),
            analysis_notes: None,
            completed: false,
            last_updated: now,
        }
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn has_question(&self, question_id: &str) -> bool {
        self.question(question_id).is_some()
    }

    /// Answer keys that no longer match any current question.
    pub fn orphaned_answer_ids(&self) -> Vec<String> {
        self.answers
            .answered_ids()
            .filter(|id| !self.has_question(id))
            .map(str::to_string)
            .collect()
    }
}
