//! Model-backed analyzer over the OpenAI Responses API.
//!
//! One request per `suggest_actions` call, no retries, no streaming. The
//! model is instructed to answer with strict JSON; the response text is
//! parsed as-is and a parse failure propagates (no partial recovery).

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::analyzers::Analyzer;
use crate::error::LlmError;
use crate::types::{ProposedAction, TeamsMessage, Urgency};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const TEMPERATURE: f64 = 0.4;

const SYSTEM_PROMPT: &str = "You are an operations chief of staff bot that reviews Microsoft Teams channels. \
Summarize active threads and propose tactically useful actions. \
Respond with strict JSON: {\"actions\":[{\"title\":str,\"details\":str,\"urgency\":\"low|normal|high\",\"recommended_recipient\":str|null,\"suggested_message\":str|null,\"related_message_id\":str|null}]}";

/// Analyzer that delegates to an OpenAI-compatible Responses endpoint.
pub struct OpenAiAnalyzer {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl OpenAiAnalyzer {
    pub fn new(
        api_key: SecretString,
        model: impl Into<String>,
        base_url: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.into(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

#[async_trait]
impl Analyzer for OpenAiAnalyzer {
    async fn suggest_actions(
        &self,
        messages: &[TeamsMessage],
        focus: Option<&str>,
        time_horizon_hours: u32,
    ) -> Result<Vec<ProposedAction>, LlmError> {
        let body = json!({
            "model": self.model,
            "temperature": TEMPERATURE,
            "input": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": build_user_prompt(messages, focus, time_horizon_hours)},
            ],
        });

        debug!(model = %self.model, messages = messages.len(), "Requesting action suggestions");
        let response = self
            .client
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed { status, body });
        }

        let payload: serde_json::Value = response.json().await?;
        let text = payload
            .pointer("/output/0/content/0/text")
            .and_then(|v| v.as_str())
            .ok_or(LlmError::MissingContent)?;

        parse_actions(text)
    }
}

/// Build the user prompt: one line per message in chronological order,
/// followed by the horizon, focus, and prioritization instruction.
fn build_user_prompt(
    messages: &[TeamsMessage],
    focus: Option<&str>,
    time_horizon_hours: u32,
) -> String {
    let mut rows = vec!["Recent Teams channel activity (oldest to newest):".to_string()];
    for msg in messages {
        let mentions = if msg.mentions.is_empty() {
            String::new()
        } else {
            format!(" mentions {}", msg.mentions.join(", "))
        };
        let content: String = msg.content.chars().take(400).collect();
        rows.push(format!(
            "- {} | {}{}: {}",
            msg.created_at, msg.sender, mentions, content
        ));
    }
    rows.push(format!(
        "Desired time horizon: next {} hours. Operational focus: {}.",
        time_horizon_hours,
        focus.filter(|f| !f.is_empty()).unwrap_or("General productivity")
    ));
    rows.push(
        "Return action list prioritizing blockers, unresolved requests, and status updates."
            .to_string(),
    );
    rows.join("\n")
}

/// Wire shape of one action as the model returns it (snake_case keys).
#[derive(Debug, Deserialize)]
struct WireAction {
    title: Option<String>,
    details: Option<String>,
    urgency: Option<Urgency>,
    recommended_recipient: Option<String>,
    suggested_message: Option<String>,
    related_message_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    actions: Vec<WireAction>,
}

/// Parse the model's JSON text into proposed actions, applying defaults for
/// missing or null fields.
fn parse_actions(text: &str) -> Result<Vec<ProposedAction>, LlmError> {
    let parsed: WireResponse = serde_json::from_str(text)?;
    Ok(parsed
        .actions
        .into_iter()
        .map(|action| ProposedAction {
            title: action.title.unwrap_or_else(|| "Untitled".to_string()),
            details: action.details.unwrap_or_default(),
            urgency: action.urgency.unwrap_or_default(),
            recommended_recipient: action.recommended_recipient,
            suggested_message: action.suggested_message,
            related_message_id: action.related_message_id,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: &str, sender: &str, content: &str, mentions: &[&str]) -> TeamsMessage {
        TeamsMessage {
            id: id.into(),
            sender: sender.into(),
            content: content.into(),
            created_at: "2024-05-01T08:00:00Z".into(),
            mentions: mentions.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn prompt_lists_messages_with_mentions_and_closes_with_instructions() {
        let msgs = vec![
            message("1", "Ann", "Need an update", &["Bo", "Cara"]),
            message("2", "Bo", "On it", &[]),
        ];
        let prompt = build_user_prompt(&msgs, Some("blockers"), 8);
        let lines: Vec<&str> = prompt.lines().collect();
        assert_eq!(lines[0], "Recent Teams channel activity (oldest to newest):");
        assert_eq!(
            lines[1],
            "- 2024-05-01T08:00:00Z | Ann mentions Bo, Cara: Need an update"
        );
        assert_eq!(lines[2], "- 2024-05-01T08:00:00Z | Bo: On it");
        assert_eq!(
            lines[3],
            "Desired time horizon: next 8 hours. Operational focus: blockers."
        );
        assert!(lines[4].starts_with("Return action list prioritizing blockers"));
    }

    #[test]
    fn prompt_defaults_focus_and_truncates_content() {
        let long = "x".repeat(600);
        let msgs = vec![message("1", "Ann", &long, &[])];
        let prompt = build_user_prompt(&msgs, None, 12);
        assert!(prompt.contains("Operational focus: General productivity."));
        assert!(prompt.contains(&"x".repeat(400)));
        assert!(!prompt.contains(&"x".repeat(401)));
    }

    #[test]
    fn parse_maps_snake_case_fields() {
        let text = r#"{"actions":[{
            "title": "Unblock deploy",
            "details": "CI is red",
            "urgency": "high",
            "recommended_recipient": "Bo",
            "suggested_message": "Bo, can you look at CI?",
            "related_message_id": "msg-1"
        }]}"#;
        let actions = parse_actions(text).unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].title, "Unblock deploy");
        assert_eq!(actions[0].urgency, Urgency::High);
        assert_eq!(actions[0].recommended_recipient.as_deref(), Some("Bo"));
        assert_eq!(actions[0].related_message_id.as_deref(), Some("msg-1"));
    }

    #[test]
    fn parse_applies_defaults_for_missing_and_null_fields() {
        let text = r#"{"actions":[{"recommended_recipient": null, "urgency": null}]}"#;
        let actions = parse_actions(text).unwrap();
        assert_eq!(actions[0].title, "Untitled");
        assert_eq!(actions[0].details, "");
        assert_eq!(actions[0].urgency, Urgency::Normal);
        assert!(actions[0].recommended_recipient.is_none());
        assert!(actions[0].suggested_message.is_none());
        assert!(actions[0].related_message_id.is_none());
    }

    #[test]
    fn parse_missing_actions_key_yields_empty_list() {
        let actions = parse_actions("{}").unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn parse_failure_propagates() {
        let result = parse_actions("Sure! Here are the actions you asked for:");
        assert!(matches!(result, Err(LlmError::Json(_))));
    }

    #[test]
    fn parse_rejects_markdown_wrapped_json() {
        // Strict parsing by design: no salvaging from code fences.
        let text = "```json\n{\"actions\":[]}\n```";
        assert!(parse_actions(text).is_err());
    }
}
