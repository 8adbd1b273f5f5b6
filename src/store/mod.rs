//! Assessment store over an injectable persistence port.
//!
//! The whole collection is serialized as one JSON blob under
//! [`STORE_KEY`] and rewritten after every mutation.

mod file;

pub use file::FilePersistence;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::analysis::AnalysisResult;
use crate::answers::{InvalidScore, Score};
use crate::models::{Assessment, AssessmentId, AssessmentInfo, InfoPatch};
use crate::report::{self, Report, ReportError};

/// Key the collection is persisted under.
pub const STORE_KEY: &str = "hria_assessments";

/// Errors from the assessment store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt assessment data: {0}")]
    Json(String),

    #[error("No assessment with id {0}")]
    NotFound(AssessmentId),

    #[error("Assessment {assessment} has no question '{question}'")]
    UnknownQuestion {
        assessment: AssessmentId,
        question: String,
    },

    #[error(transparent)]
    InvalidScore(#[from] InvalidScore),

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Key/blob storage the store persists through.
pub trait PersistencePort {
    /// `None` when nothing has been written under `key` yet.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&mut self, key: &str, blob: &str) -> Result<(), StoreError>;
}

/// In-memory port, for tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    blobs: HashMap<String, String>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blob(&self, key: &str) -> Option<&str> {
        self.blobs.get(key).map(String::as_str)
    }
}

impl PersistencePort for MemoryPersistence {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.blobs.get(key).cloned())
    }

    fn write(&mut self, key: &str, blob: &str) -> Result<(), StoreError> {
        self.blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

/// All assessments of one session, persisted through `P`.
pub struct AssessmentStore<P: PersistencePort> {
    port: P,
    assessments: Vec<Assessment>,
    prune_orphans: bool,
    clock: fn() -> DateTime<Utc>,
}

impl<P: PersistencePort> AssessmentStore<P> {
    /// Load the collection from `port`, starting empty if nothing is stored.
    pub fn open(port: P) -> Result<Self, StoreError> {
        let assessments = match port.read(STORE_KEY)? {
            Some(blob) => {
                serde_json::from_str(&blob).map_err(|e| StoreError::Json(e.to_string()))?
            }
            None => Vec::new(),
        };
        debug!("Loaded {} assessments", assessments.len());
        Ok(Self {
            port,
            assessments,
            prune_orphans: false,
            clock: Utc::now,
        })
    }

    /// Drop answers for questions that disappear when analysis is re-applied.
    pub fn with_orphan_pruning(mut self, prune: bool) -> Self {
        self.prune_orphans = prune;
        self
    }

    pub fn prunes_orphans(&self) -> bool {
        self.prune_orphans
    }

    /// Replace the time source used for ids and timestamps.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn list(&self) -> &[Assessment] {
        &self.assessments
    }

    pub fn get(&self, id: AssessmentId) -> Option<&Assessment> {
        self.assessments.iter().find(|a| a.id == id)
    }

    /// Most recently updated completed assessment.
    pub fn latest_completed(&self) -> Option<&Assessment> {
        self.assessments
            .iter()
            .filter(|a| a.completed)
            .max_by_key(|a| (a.last_updated, a.id))
    }

    /// Create an assessment with a fresh time-based id.
    pub fn create(&mut self, info: AssessmentInfo) -> Result<AssessmentId, StoreError> {
        let now = (self.clock)();
        let mut id = AssessmentId(now.timestamp_millis());
        while self.get(id).is_some() {
            id = AssessmentId(id.0 + 1);
        }

        self.assessments.push(Assessment::new(id, info, now));
        if let Err(e) = self.persist() {
            self.assessments.pop();
            return Err(e);
        }
        info!("Created assessment {}", id);
        Ok(id)
    }

    pub fn update_info(&mut self, id: AssessmentId, patch: InfoPatch) -> Result<(), StoreError> {
        self.mutate(id, |a| {
            a.info.merge(patch);
            Ok(())
        })
    }

    /// Replace the questionnaire and analysis lists wholesale.
    ///
    /// Returns the number of answer entries pruned (0 unless pruning is on).
    pub fn apply_analysis(
        &mut self,
        id: AssessmentId,
        result: &AnalysisResult,
    ) -> Result<usize, StoreError> {
        let prune = self.prune_orphans;
        self.mutate(id, |a| {
            a.questions = result.questions.clone();
            a.risks = result.risks.clone();
            a.positive_impacts = result.positive_impacts.clone();
            a.recommendations = result.recommendations.clone();
            a.analysis_notes = result.notes.clone();

            if !prune {
                return Ok(0);
            }
            let questions = &a.questions;
            let pruned = a
                .answers
                .retain_questions(|qid| questions.iter().any(|q| q.id == qid));
            if pruned > 0 {
                debug!("Pruned {} orphaned answer entries", pruned);
            }
            Ok(pruned)
        })
    }

    /// Record a score; `raw` must be 0, 0.5 or 1.
    pub fn set_answer(
        &mut self,
        id: AssessmentId,
        question_id: &str,
        raw: f64,
    ) -> Result<Score, StoreError> {
        let score = Score::try_from(raw)?;
        self.mutate(id, |a| {
            require_question(a, question_id)?;
            a.answers.set(question_id, score);
            Ok(score)
        })
    }

    pub fn set_evidence(
        &mut self,
        id: AssessmentId,
        question_id: &str,
        text: &str,
    ) -> Result<(), StoreError> {
        self.mutate(id, |a| {
            require_question(a, question_id)?;
            a.answers.set_evidence(question_id, text);
            Ok(())
        })
    }

    /// `Ok(None)` means the question is unanswered.
    pub fn get_answer(
        &self,
        id: AssessmentId,
        question_id: &str,
    ) -> Result<Option<Score>, StoreError> {
        Ok(self.require(id)?.answers.score(question_id))
    }

    pub fn get_evidence(
        &self,
        id: AssessmentId,
        question_id: &str,
    ) -> Result<Option<&str>, StoreError> {
        Ok(self.require(id)?.answers.evidence(question_id))
    }

    /// Mark the assessment completed and return its report.
    pub fn finish(&mut self, id: AssessmentId) -> Result<Report, StoreError> {
        // Assemble first so an invalid assessment is not marked completed.
        report::assemble(self.require(id)?)?;
        self.mutate(id, |a| {
            a.completed = true;
            Ok(())
        })?;
        Ok(self.report(id)?)
    }

    /// Report for `id`; a missing assessment is [`ReportError::InvalidAssessment`].
    pub fn report(&self, id: AssessmentId) -> Result<Report, ReportError> {
        report::assemble_found(self.get(id), id)
    }

    pub fn delete(&mut self, id: AssessmentId) -> Result<(), StoreError> {
        let index = self
            .assessments
            .iter()
            .position(|a| a.id == id)
            .ok_or(StoreError::NotFound(id))?;
        let removed = self.assessments.remove(index);
        if let Err(e) = self.persist() {
            self.assessments.insert(index, removed);
            return Err(e);
        }
        info!("Deleted assessment {}", id);
        Ok(())
    }

    fn require(&self, id: AssessmentId) -> Result<&Assessment, StoreError> {
        self.get(id).ok_or(StoreError::NotFound(id))
    }

    /// Apply `f` to a copy of one assessment, refresh `last_updated` and persist.
    ///
    /// The copy replaces the stored assessment only once the write succeeds,
    /// so any error leaves memory matching what is on disk.
    fn mutate<T>(
        &mut self,
        id: AssessmentId,
        f: impl FnOnce(&mut Assessment) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let now = (self.clock)();
        let index = self
            .assessments
            .iter()
            .position(|a| a.id == id)
            .ok_or(StoreError::NotFound(id))?;

        let mut updated = self.assessments[index].clone();
        let value = f(&mut updated)?;
        updated.last_updated = now;

        let previous = std::mem::replace(&mut self.assessments[index], updated);
        if let Err(e) = self.persist() {
            self.assessments[index] = previous;
            return Err(e);
        }
        Ok(value)
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let blob =
            serde_json::to_string(&self.assessments).map_err(|e| StoreError::Json(e.to_string()))?;
        self.port.write(STORE_KEY, &blob)?;
        debug!(
            "Persisted {} assessments ({} bytes)",
            self.assessments.len(),
            blob.len()
        );
        Ok(())
    }
}

fn require_question(assessment: &Assessment, question_id: &str) -> Result<(), StoreError> {
    if assessment.has_question(question_id) {
        Ok(())
    } else {
        Err(StoreError::UnknownQuestion {
            assessment: assessment.id,
            question: question_id.to_string(),
        })
    }
}
