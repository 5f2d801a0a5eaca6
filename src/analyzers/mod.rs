//! Analyzer strategies that turn normalized messages into proposed actions.
//!
//! Two implementations of the same seam:
//! - [`RuleBasedAnalyzer`]: deterministic keyword matching, no I/O. Used by
//!   `--fake-ai` and as the offline test baseline.
//! - [`OpenAiAnalyzer`]: one structured call to the OpenAI Responses API.
//!
//! Callers depend only on the [`Analyzer`] trait; adding another provider
//! means another impl, not a planner change.

pub mod openai;
pub mod rules;

pub use openai::OpenAiAnalyzer;
pub use rules::RuleBasedAnalyzer;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::types::{ProposedAction, TeamsMessage};

/// Strategy interface for deriving follow-up actions from a message batch.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Propose follow-up actions for the given messages.
    ///
    /// `focus` is an optional free-text priority hint ("blockers",
    /// "customers"); absent or empty means a generic productivity focus.
    /// Implementations must not call back to the message source. Any
    /// `related_message_id` in the result must reference an id from
    /// `messages`.
    async fn suggest_actions(
        &self,
        messages: &[TeamsMessage],
        focus: Option<&str>,
        time_horizon_hours: u32,
    ) -> Result<Vec<ProposedAction>, LlmError>;
}
