//! Deterministic keyword analyzer.
//!
//! A cheap, offline baseline that needs no external service: lower-case
//! substring matching against two keyword sets, in priority order. Identical
//! input always yields an identical action list.

use async_trait::async_trait;
use tracing::debug;

use crate::analyzers::Analyzer;
use crate::error::LlmError;
use crate::types::{ProposedAction, TeamsMessage, Urgency};

/// Keywords that signal someone is waiting on a status update.
const UPDATE_KEYWORDS: [&str; 3] = ["update", "status", "eta"];

/// Keywords that escalate an update request to high urgency.
const ESCALATION_KEYWORDS: [&str; 2] = ["overdue", "today"];

/// Keywords that signal a deadline reminder.
const REMINDER_KEYWORDS: [&str; 2] = ["reminder", "due"];

/// Rule-based analyzer. Stateless; construct freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedAnalyzer;

#[async_trait]
impl Analyzer for RuleBasedAnalyzer {
    async fn suggest_actions(
        &self,
        messages: &[TeamsMessage],
        focus: Option<&str>,
        time_horizon_hours: u32,
    ) -> Result<Vec<ProposedAction>, LlmError> {
        let mut actions = Vec::new();

        for message in messages {
            let lower = message.content.to_lowercase();
            // First mention if present, else the sender. Permissive on
            // purpose: no check that the target is addressable.
            let target = message.mentions.first().unwrap_or(&message.sender);

            if UPDATE_KEYWORDS.iter().any(|k| lower.contains(k)) {
                let urgency = if ESCALATION_KEYWORDS.iter().any(|k| lower.contains(k)) {
                    Urgency::High
                } else {
                    Urgency::Normal
                };
                let first_name = target.split(' ').next().unwrap_or(target.as_str());
                actions.push(ProposedAction {
                    title: format!("Request update from {target}"),
                    details: format!(
                        "{} needs a status update related to: '{}'",
                        message.sender,
                        preview(&message.content, 160)
                    ),
                    urgency,
                    recommended_recipient: Some(target.clone()),
                    suggested_message: Some(format!(
                        "Hi {first_name}, could you share an update on the request mentioned by {}? Original note: {}",
                        message.sender,
                        preview(&message.content, 200)
                    )),
                    related_message_id: Some(message.id.clone()),
                });
            } else if REMINDER_KEYWORDS.iter().any(|k| lower.contains(k)) {
                actions.push(ProposedAction {
                    title: "Confirm deadline ownership".to_string(),
                    details: format!("Reminder detected: {}", preview(&message.content, 160)),
                    urgency: Urgency::Normal,
                    recommended_recipient: Some(target.clone()),
                    suggested_message: Some(format!(
                        "Following up on the reminder from {}: {}",
                        message.sender,
                        preview(&message.content, 200)
                    )),
                    related_message_id: Some(message.id.clone()),
                });
            }
        }

        if actions.is_empty() {
            debug!("No keyword matches; emitting proactive check-in fallback");
            let focus_hint = focus.filter(|f| !f.is_empty()).unwrap_or("General");
            actions.push(ProposedAction {
                title: format!("Proactive check-in ({focus_hint})"),
                details: format!(
                    "No blockers detected in the last {time_horizon_hours} hours. Post a quick sync request?"
                ),
                urgency: Urgency::Low,
                recommended_recipient: None,
                suggested_message: Some(
                    "Quick sync reminder: please share blockers or pending updates for today's agenda."
                        .to_string(),
                ),
                related_message_id: None,
            });
        }

        Ok(actions)
    }
}

/// First `limit` characters of `text` (character-based, UTF-8 safe).
fn preview(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
