//! Optional assessment behaviors, switched on with `--features` or
//! `HRIA_FEATURES` (comma-separated, e.g. `prune-orphan-answers`).
//!
//! Flags are resolved once at startup into [`FeatureFlags`], which then
//! builds the analysis provider and opens the store accordingly.

use std::env;

use clap::ValueEnum;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::analysis::policy::OrderedFallback;
use crate::analysis::{AnalysisProvider, ModelAnalysisProvider, OfflineProvider};
use crate::store::{AssessmentStore, PersistencePort, StoreError};

pub const FEATURES_ENV: &str = "HRIA_FEATURES";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    /// Re-running the analysis replaces the questionnaire. With this flag
    /// the answers and evidence of questions that did not come back are
    /// deleted, so the sheet only holds live answers but that history is
    /// lost for good. Without it they stay on disk, ignored by scoring,
    /// and reattach if the same question is generated again.
    PruneOrphanAnswers,
    /// Never call a model; every analysis yields the built-in bundle.
    /// For use without network access or an API key.
    OfflineAnalysis,
}

/// Behaviors chosen for this run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureFlags {
    pub prune_orphan_answers: bool,
    pub offline_analysis: bool,
}

impl FeatureFlags {
    /// Flags from `HRIA_FEATURES`; unknown names are logged and skipped.
    pub fn from_env() -> Self {
        let Ok(value) = env::var(FEATURES_ENV) else {
            return Self::default();
        };
        let (flags, unknown) = Self::parse(&value);
        for name in unknown {
            warn!("Unknown feature '{}' in {}", name, FEATURES_ENV);
        }
        flags
    }

    /// Parse a comma-separated list, returning the names not recognized.
    pub fn parse(value: &str) -> (Self, Vec<String>) {
        let mut flags = Self::default();
        let mut unknown = Vec::new();
        for name in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match Feature::from_str(name, true) {
                Ok(feature) => flags.set(feature, true),
                Err(_) => unknown.push(name.to_string()),
            }
        }
        (flags, unknown)
    }

    /// Add features given on the command line.
    pub fn with_cli(mut self, features: Option<&[Feature]>) -> Self {
        for feature in features.unwrap_or_default() {
            self.set(*feature, true);
        }
        self
    }

    pub fn set(&mut self, feature: Feature, on: bool) {
        match feature {
            Feature::PruneOrphanAnswers => self.prune_orphan_answers = on,
            Feature::OfflineAnalysis => self.offline_analysis = on,
        }
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::PruneOrphanAnswers => self.prune_orphan_answers,
            Feature::OfflineAnalysis => self.offline_analysis,
        }
    }

    /// The model list, or the offline bundle when `offline-analysis` is on.
    pub fn analysis_provider(&self, policy: OrderedFallback) -> Box<dyn AnalysisProvider> {
        if self.offline_analysis {
            info!("Offline analysis: using the built-in questionnaire");
            Box::new(OfflineProvider)
        } else {
            Box::new(ModelAnalysisProvider::new(policy))
        }
    }

    /// Open the store with the orphaned-answer policy applied.
    pub fn open_store<P: PersistencePort>(&self, port: P) -> Result<AssessmentStore<P>, StoreError> {
        Ok(AssessmentStore::open(port)?.with_orphan_pruning(self.prune_orphan_answers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze_with_fallback, AnalysisRequest, ProjectInfo};
    use crate::store::MemoryPersistence;
    use crate::test_utils::sample_info;

    #[test]
    fn parse_reports_unknown_names() {
        let (flags, unknown) = FeatureFlags::parse("Offline-Analysis, bogus,,");
        assert!(flags.offline_analysis);
        assert!(!flags.prune_orphan_answers);
        assert_eq!(unknown, vec!["bogus"]);
    }

    #[test]
    fn cli_adds_to_env_flags() {
        let (flags, _) = FeatureFlags::parse("prune-orphan-answers");
        let flags = flags.with_cli(Some(&[Feature::OfflineAnalysis]));
        assert!(flags.is_enabled(Feature::PruneOrphanAnswers));
        assert!(flags.is_enabled(Feature::OfflineAnalysis));
        assert_eq!(FeatureFlags::default().with_cli(None), FeatureFlags::default());
    }

    #[test]
    fn offline_flag_never_calls_models() {
        let flags = FeatureFlags {
            offline_analysis: true,
            ..Default::default()
        };
        let provider = flags.analysis_provider(OrderedFallback::new(Vec::new()));
        let request = AnalysisRequest {
            project: ProjectInfo::from_info(&sample_info()),
            document_texts: Vec::new(),
        };
        let outcome = analyze_with_fallback(provider.as_ref(), &request);
        assert!(outcome.used_fallback());
        assert_eq!(outcome.result.questions.len(), 4);
    }

    #[test]
    fn prune_flag_reaches_the_store() {
        let store = FeatureFlags::default()
            .open_store(MemoryPersistence::default())
            .unwrap();
        assert!(!store.prunes_orphans());

        let mut flags = FeatureFlags::default();
        flags.set(Feature::PruneOrphanAnswers, true);
        let store = flags.open_store(MemoryPersistence::default()).unwrap();
        assert!(store.prunes_orphans());
    }
}
