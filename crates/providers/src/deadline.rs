//! Deadline wrapper: bounds every completion by a fixed time budget.

use async_trait::async_trait;
use folio_core::error::ProviderError;
use folio_core::provider::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Default budget for one completion.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// A provider that fails with `ProviderError::Timeout` when the inner
/// provider does not answer within the deadline.
pub struct DeadlineProvider {
    inner: Arc<dyn folio_core::Provider>,
    deadline: Duration,
}

impl DeadlineProvider {
    pub fn new(inner: Arc<dyn folio_core::Provider>, deadline: Duration) -> Self {
        Self { inner, deadline }
    }

    /// Wrap with the default 30 second deadline.
    pub fn with_default(inner: Arc<dyn folio_core::Provider>) -> Self {
        Self::new(inner, DEFAULT_DEADLINE)
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

#[async_trait]
impl folio_core::Provider for DeadlineProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        match tokio::time::timeout(self.deadline, self.inner.complete(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    provider = %self.inner.name(),
                    timeout_secs = self.deadline.as_secs(),
                    "Provider timed out"
                );
                Err(ProviderError::Timeout(format!(
                    "Provider '{}' timed out after {}s",
                    self.inner.name(),
                    self.deadline.as_secs()
                )))
            }
        }
    }
}
