//! Placeholder passive learner.
//!
//! Unaddressed chat lines are observed and discarded; a future vector-store
//! learner plugs in behind the same trait.

use banter_core::gateway::PassiveLearner;
use banter_types::error::GatewayError;

/// Learner that logs and drops everything it is shown.
#[derive(Debug, Default)]
pub struct NullLearner;

impl PassiveLearner for NullLearner {
    async fn observe(&self, text: &str, user: &str) -> Result<(), GatewayError> {
        tracing::trace!(%user, chars = text.len(), "observed unaddressed line");
        Ok(())
    }
}
