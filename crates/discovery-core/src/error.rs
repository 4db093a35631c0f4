//! Error taxonomy shared by every discovery crate

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// A collaborator (store, directory, counter) call failed
    #[error("{collaborator} failed: {source}")]
    Upstream {
        collaborator: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("{operation} exceeded its {budget_ms}ms budget")]
    Timeout {
        operation: &'static str,
        budget_ms: u64,
    },

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DiscoveryError {
    pub fn upstream(collaborator: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Upstream {
            collaborator,
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Run a collaborator call under a per-request time budget
pub async fn with_budget<T, F>(operation: &'static str, budget: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result,
        Err(_) => Err(DiscoveryError::Timeout {
            operation,
            budget_ms: budget.as_millis() as u64,
        }),
    }
}
