//! Shared types for the planning pipeline.
//!
//! The serialized form uses camelCase keys; that is the shape exported by
//! `--export-json` and consumed by downstream tooling.

use serde::{Deserialize, Serialize};

/// Normalized Teams channel message.
///
/// Built by [`crate::normalize::normalize_messages`] from a raw Graph
/// payload; immutable afterward and scoped to one planning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamsMessage {
    /// Payload id, or a generated UUID when the payload has none.
    pub id: String,
    /// Sender display name ("Unknown" when absent).
    pub sender: String,
    /// Plain-text body with markup stripped and whitespace trimmed.
    pub content: String,
    /// Creation timestamp as reported by Graph (RFC 3339 string).
    pub created_at: String,
    /// Mentioned display names, source order preserved.
    pub mentions: Vec<String>,
}

/// How urgently a proposed action should be taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    High,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Normal => "normal",
            Urgency::High => "high",
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recommended follow-up item produced by an analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedAction {
    pub title: String,
    pub details: String,
    pub urgency: Urgency,
    /// Display name of who should be contacted, when one is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_recipient: Option<String>,
    /// Draft follow-up text, ready to post to the channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_message: Option<String>,
    /// Weak back-reference to a message id from the same batch. Analyzers
    /// leave this unset rather than fabricate an id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_message_id: Option<String>,
}

/// The timestamped, ordered output of one planning run.
///
/// `actions` keeps the analyzer's output order; it is never re-sorted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPlan {
    pub generated_at: String,
    /// The horizon the analyzer reasoned over, in hours.
    pub timespan_hours: u32,
    /// Count of normalized messages the analyzer saw for this run.
    pub message_sample_size: usize,
    pub actions: Vec<ProposedAction>,
}
