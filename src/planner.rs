//! Daily action planner.
//!
//! One run per invocation, no state across runs: obtain raw messages (live
//! source or offline snapshot), normalize, delegate to the configured
//! analyzer, and wrap the result into a timestamped [`ActionPlan`].
//! Separately, [`DailyActionPlanner::execute_follow_ups`] replays suggested
//! messages back to the source, gated by a dry-run flag.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};

use crate::analyzers::Analyzer;
use crate::error::{ConfigError, Result};
use crate::graph::MessageSource;
use crate::normalize::normalize_messages;
use crate::types::ActionPlan;

const DEFAULT_TOP: u32 = 40;
const DEFAULT_LOOKBACK_HOURS: u32 = 24;

/// Options for a single planning run.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Free-text operational priority hint, e.g. "blockers".
    pub focus: Option<String>,
    /// Max messages to fetch (default 40). Ignored for offline runs.
    pub top: Option<u32>,
    /// Hours of history to fetch (default 24). Ignored for offline runs.
    pub lookback_hours: Option<u32>,
    /// Raw payloads to use verbatim instead of fetching from the source.
    pub offline_messages: Option<Vec<Value>>,
}

/// Orchestrates fetch, normalize, analyze, and optional follow-up sends.
pub struct DailyActionPlanner {
    source: Option<Arc<dyn MessageSource>>,
    analyzer: Arc<dyn Analyzer>,
    time_horizon_hours: u32,
}

impl DailyActionPlanner {
    pub fn new(
        source: Option<Arc<dyn MessageSource>>,
        analyzer: Arc<dyn Analyzer>,
        time_horizon_hours: u32,
    ) -> Self {
        Self {
            source,
            analyzer,
            time_horizon_hours,
        }
    }

    /// Generate an action plan for the channel.
    ///
    /// When `options.offline_messages` is set those payloads are used
    /// verbatim; otherwise a configured message source is required and up to
    /// `top` recent messages are fetched.
    pub async fn generate_plan(
        &self,
        team_id: &str,
        channel_id: &str,
        options: PlanOptions,
    ) -> Result<ActionPlan> {
        let raw = match options.offline_messages {
            Some(payloads) => payloads,
            None => {
                let source = self.source.as_ref().ok_or_else(|| {
                    ConfigError::MissingRequired {
                        key: "message source".into(),
                        hint: "Provide --team-id/--channel-id with Graph credentials, or use --offline-json.".into(),
                    }
                })?;
                source
                    .fetch_recent_messages(
                        team_id,
                        channel_id,
                        options.top.unwrap_or(DEFAULT_TOP),
                        options.lookback_hours.unwrap_or(DEFAULT_LOOKBACK_HOURS),
                    )
                    .await?
            }
        };

        let normalized = normalize_messages(&raw);
        debug!(count = normalized.len(), "Normalized channel messages");

        let actions = self
            .analyzer
            .suggest_actions(
                &normalized,
                options.focus.as_deref(),
                self.time_horizon_hours,
            )
            .await?;

        info!(
            actions = actions.len(),
            sample_size = normalized.len(),
            "Generated action plan"
        );
        Ok(ActionPlan {
            generated_at: Utc::now().to_rfc3339(),
            timespan_hours: self.time_horizon_hours,
            message_sample_size: normalized.len(),
            actions,
        })
    }

    /// Send the plan's suggested follow-up messages to the channel, in plan
    /// order, one at a time.
    ///
    /// Actions without a `suggested_message` are skipped. In dry-run mode
    /// nothing is sent and the returned list is empty; in live mode the
    /// responses are collected in send order. A send failure aborts the
    /// remaining loop and propagates.
    pub async fn execute_follow_ups(
        &self,
        plan: &ActionPlan,
        team_id: &str,
        channel_id: &str,
        dry_run: bool,
    ) -> Result<Vec<Value>> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| ConfigError::MissingRequired {
                key: "message source".into(),
                hint: "Follow-up sends require Graph credentials.".into(),
            })?;

        let mut responses = Vec::new();
        for action in &plan.actions {
            let Some(message) = action.suggested_message.as_deref() else {
                continue;
            };
            if dry_run {
                let preview: String = message.chars().take(120).collect();
                info!(title = %action.title, "[dry run] Would send: {preview}...");
                continue;
            }
            let response = source.send_message(team_id, channel_id, message).await?;
            info!(title = %action.title, "Sent follow-up message");
            responses.push(response);
        }
        Ok(responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::analyzers::RuleBasedAnalyzer;
    use crate::error::{Error, GraphError};
    use crate::types::{ProposedAction, Urgency};

    /// Test double that records sends and serves canned fetch payloads.
    struct RecordingSource {
        fetch_payloads: Vec<Value>,
        sent: Mutex<Vec<String>>,
        fail_after_sends: Option<usize>,
    }

    impl RecordingSource {
        fn new(fetch_payloads: Vec<Value>) -> Self {
            Self {
                fetch_payloads,
                sent: Mutex::new(Vec::new()),
                fail_after_sends: None,
            }
        }

        fn failing_after(sends: usize) -> Self {
            Self {
                fetch_payloads: Vec::new(),
                sent: Mutex::new(Vec::new()),
                fail_after_sends: Some(sends),
            }
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessageSource for RecordingSource {
        async fn fetch_recent_messages(
            &self,
            _team_id: &str,
            _channel_id: &str,
            _top: u32,
            _lookback_hours: u32,
        ) -> std::result::Result<Vec<Value>, GraphError> {
            Ok(self.fetch_payloads.clone())
        }

        async fn send_message(
            &self,
            _team_id: &str,
            _channel_id: &str,
            content: &str,
        ) -> std::result::Result<Value, GraphError> {
            let mut sent = self.sent.lock().unwrap();
            if let Some(limit) = self.fail_after_sends
                && sent.len() >= limit
            {
                return Err(GraphError::RequestFailed {
                    status: 403,
                    body: "Forbidden".into(),
                });
            }
            sent.push(content.to_string());
            Ok(json!({"id": format!("resp-{}", sent.len())}))
        }
    }

    fn planner_with(source: Option<Arc<dyn MessageSource>>) -> DailyActionPlanner {
        DailyActionPlanner::new(source, Arc::new(RuleBasedAnalyzer), 8)
    }

    fn action(title: &str, suggested: Option<&str>) -> ProposedAction {
        ProposedAction {
            title: title.into(),
            details: String::new(),
            urgency: Urgency::Normal,
            recommended_recipient: None,
            suggested_message: suggested.map(String::from),
            related_message_id: None,
        }
    }

    fn plan_with(actions: Vec<ProposedAction>) -> ActionPlan {
        ActionPlan {
            generated_at: Utc::now().to_rfc3339(),
            timespan_hours: 8,
            message_sample_size: actions.len(),
            actions,
        }
    }

    #[tokio::test]
    async fn offline_plan_end_to_end() {
        let payloads = vec![json!({
            "id": "1",
            "body": {"content": "Need status update on launch, overdue"},
            "from": {"user": {"displayName": "Ann"}},
            "mentions": [{"mentioned": {"user": {"displayName": "Bo"}}}]
        })];
        let planner = planner_with(None);
        let plan = planner
            .generate_plan(
                "offline",
                "offline",
                PlanOptions {
                    offline_messages: Some(payloads),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.actions[0].title, "Request update from Bo");
        assert_eq!(plan.actions[0].urgency, Urgency::High);
        assert_eq!(plan.message_sample_size, 1);
        assert_eq!(plan.timespan_hours, 8);
    }

    #[tokio::test]
    async fn empty_offline_batch_yields_low_urgency_fallback() {
        let planner = planner_with(None);
        let plan = planner
            .generate_plan(
                "offline",
                "offline",
                PlanOptions {
                    offline_messages: Some(Vec::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.actions[0].urgency, Urgency::Low);
        assert_eq!(plan.message_sample_size, 0);
    }

    #[tokio::test]
    async fn sample_size_matches_normalized_batch_even_when_malformed() {
        let payloads = vec![json!({}), json!({"id": "2"}), json!({"body": null})];
        let planner = planner_with(None);
        let plan = planner
            .generate_plan(
                "offline",
                "offline",
                PlanOptions {
                    offline_messages: Some(payloads),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(plan.message_sample_size, 3);
    }

    #[tokio::test]
    async fn live_plan_uses_source_payloads() {
        let source = Arc::new(RecordingSource::new(vec![json!({
            "id": "1",
            "body": {"content": "reminder: report due"},
            "from": {"user": {"displayName": "Dee"}},
        })]));
        let planner = planner_with(Some(source));
        let plan = planner
            .generate_plan("team-1", "chan-1", PlanOptions::default())
            .await
            .unwrap();
        assert_eq!(plan.actions[0].title, "Confirm deadline ownership");
        assert_eq!(plan.message_sample_size, 1);
    }

    #[tokio::test]
    async fn live_plan_without_source_is_a_config_error() {
        let planner = planner_with(None);
        let result = planner
            .generate_plan("team-1", "chan-1", PlanOptions::default())
            .await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn dry_run_sends_nothing_and_returns_empty() {
        let source = Arc::new(RecordingSource::new(Vec::new()));
        let planner = planner_with(Some(source.clone()));
        let plan = plan_with(vec![
            action("a", Some("first")),
            action("b", Some("second")),
        ]);

        let responses = planner
            .execute_follow_ups(&plan, "team-1", "chan-1", true)
            .await
            .unwrap();
        assert!(responses.is_empty());
        assert!(source.sent().is_empty());
    }

    #[tokio::test]
    async fn live_mode_sends_one_message_per_suggestion_in_plan_order() {
        let source = Arc::new(RecordingSource::new(Vec::new()));
        let planner = planner_with(Some(source.clone()));
        let plan = plan_with(vec![
            action("a", Some("first")),
            action("b", None),
            action("c", Some("third")),
        ]);

        let responses = planner
            .execute_follow_ups(&plan, "team-1", "chan-1", false)
            .await
            .unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(source.sent(), vec!["first", "third"]);
    }

    #[tokio::test]
    async fn send_failure_aborts_remaining_follow_ups() {
        let source = Arc::new(RecordingSource::failing_after(1));
        let planner = planner_with(Some(source.clone()));
        let plan = plan_with(vec![
            action("a", Some("first")),
            action("b", Some("second")),
            action("c", Some("third")),
        ]);

        let result = planner
            .execute_follow_ups(&plan, "team-1", "chan-1", false)
            .await;
        assert!(matches!(result, Err(Error::Graph(_))));
        assert_eq!(source.sent(), vec!["first"]);
    }

    #[tokio::test]
    async fn follow_ups_without_source_fail_even_in_dry_run() {
        let planner = planner_with(None);
        let plan = plan_with(vec![action("a", Some("first"))]);
        let result = planner
            .execute_follow_ups(&plan, "team-1", "chan-1", true)
            .await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
