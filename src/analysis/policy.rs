//! Ordered-fallback policy over a list of completion attempts.
//!
//! Each attempt is one client (typically one model) bounded by a timeout.
//! Attempts are tried in order; the first response that the caller's
//! `accept` function turns into a value wins. Everything else is recorded
//! and the next attempt is tried.

use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::llm::{LlmClient, LlmConfig, LlmError};

/// One entry of the fallback list.
#[derive(Clone)]
pub struct Attempt {
    /// Human-readable name, e.g. `gemini:gemini-1.5-flash`.
    pub label: String,
    pub client: Arc<dyn LlmClient>,
    pub timeout: Duration,
}

impl Attempt {
    pub fn new(label: impl Into<String>, client: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        Self {
            label: label.into(),
            client,
            timeout,
        }
    }
}

impl fmt::Debug for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attempt")
            .field("label", &self.label)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Why a single attempt was abandoned.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// The provider answered but the response was unusable.
    #[error("Unusable response: {0}")]
    Rejected(String),
}

/// A failed attempt and its reason.
#[derive(Debug)]
pub struct AttemptFailure {
    pub label: String,
    pub error: AttemptError,
}

/// Every attempt failed.
#[derive(Debug, thiserror::Error)]
#[error("{}", describe_exhaustion(.failures))]
pub struct ExhaustedError {
    pub failures: Vec<AttemptFailure>,
}

impl ExhaustedError {
    pub fn last(&self) -> Option<&AttemptFailure> {
        self.failures.last()
    }

    /// The last underlying client error, if the last failure was one.
    pub fn last_llm_error(&self) -> Option<&LlmError> {
        self.failures.iter().rev().find_map(|f| match &f.error {
            AttemptError::Llm(e) => Some(e),
            AttemptError::Rejected(_) => None,
        })
    }
}

fn describe_exhaustion(failures: &[AttemptFailure]) -> String {
    match failures.last() {
        None => "No analysis providers are configured".to_string(),
        Some(last) => format!(
            "All {} provider attempts failed. Last error ({}): {}",
            failures.len(),
            last.label,
            last.error
        ),
    }
}

/// Ordered list of attempts tried one after another.
#[derive(Debug, Clone, Default)]
pub struct OrderedFallback {
    attempts: Vec<Attempt>,
}

impl OrderedFallback {
    pub fn new(attempts: Vec<Attempt>) -> Self {
        Self { attempts }
    }

    /// One attempt per configured model, in configuration order.
    pub fn from_config(config: &LlmConfig) -> Self {
        let attempts = config
            .effective_models()
            .into_iter()
            .map(|model| {
                let label = format!(
                    "{}:{}",
                    config.provider,
                    model.as_deref().unwrap_or("default")
                );
                Attempt::new(label, config.create_client(model), config.timeout)
            })
            .collect();
        Self { attempts }
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// Run `prompt` through the attempts until `accept` takes a response.
    ///
    /// Returns the accepted value and the label of the attempt that produced it.
    pub fn run<T, E, F>(&self, prompt: &str, accept: F) -> Result<(T, String), ExhaustedError>
    where
        F: Fn(&str) -> Result<T, E>,
        E: fmt::Display,
    {
        let mut failures = Vec::new();
        let total = self.attempts.len();

        for (index, attempt) in self.attempts.iter().enumerate() {
            info!(
                "Attempting {} ({}/{})...",
                attempt.label,
                index + 1,
                total
            );

            let error = match complete_with_timeout(attempt, prompt) {
                Ok(response) => match accept(&response) {
                    Ok(value) => {
                        info!("{} succeeded", attempt.label);
                        return Ok((value, attempt.label.clone()));
                    }
                    Err(e) => AttemptError::Rejected(e.to_string()),
                },
                Err(e) => AttemptError::Llm(e),
            };

            warn!("{} failed: {}", attempt.label, error);
            failures.push(AttemptFailure {
                label: attempt.label.clone(),
                error,
            });
        }

        Err(ExhaustedError { failures })
    }
}

/// Run one completion on a worker thread, giving up after the attempt's timeout.
///
/// A timed-out worker is left to finish on its own; its result is discarded.
fn complete_with_timeout(attempt: &Attempt, prompt: &str) -> Result<String, LlmError> {
    let (tx, rx) = mpsc::channel();
    let client = Arc::clone(&attempt.client);
    let prompt = prompt.to_string();

    thread::Builder::new()
        .name(format!("attempt-{}", attempt.label))
        .spawn(move || {
            let _ = tx.send(client.complete(&prompt));
        })
        .map_err(|e| LlmError::ClientError(format!("Failed to spawn worker: {}", e)))?;

    match rx.recv_timeout(attempt.timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(LlmError::Timeout(attempt.timeout)),
        Err(RecvTimeoutError::Disconnected) => Err(LlmError::ClientError(
            "Worker stopped without a response".to_string(),
        )),
    }
}
