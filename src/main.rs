use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use teams_planner::analyzers::{Analyzer, OpenAiAnalyzer, RuleBasedAnalyzer};
use teams_planner::config::{DEFAULT_TIME_HORIZON_HOURS, Settings};
use teams_planner::graph::{GraphClient, MessageSource};
use teams_planner::planner::{DailyActionPlanner, PlanOptions};
use teams_planner::types::ActionPlan;

/// AI-assisted Microsoft Teams planning.
#[derive(Parser)]
#[command(name = "teams-planner", version)]
#[command(about = "AI-assisted Microsoft Teams planning", long_about = None)]
struct Cli {
    /// Microsoft Teams team ID
    #[arg(long)]
    team_id: Option<String>,

    /// Channel ID inside the team
    #[arg(long)]
    channel_id: Option<String>,

    /// Operational focus, e.g. blockers
    #[arg(long)]
    focus: Option<String>,

    /// Max messages to fetch
    #[arg(long, default_value_t = 40)]
    top: u32,

    /// Hours of history to fetch
    #[arg(long, default_value_t = 24)]
    lookback: u32,

    /// Path to cached Graph messages for offline testing
    #[arg(long, value_name = "PATH")]
    offline_json: Option<PathBuf>,

    /// Export the generated plan as JSON
    #[arg(long, value_name = "PATH")]
    export_json: Option<PathBuf>,

    /// Send suggested follow-up messages to the channel (dry-run unless
    /// --force-send is also set)
    #[arg(long)]
    send_followups: bool,

    /// Disable dry-run safety when --send-followups is set
    #[arg(long)]
    force_send: bool,

    /// Use the rule-based analyzer instead of calling OpenAI
    #[arg(long)]
    fake_ai: bool,

    /// Custom path to .env file
    #[arg(long, default_value = ".env", value_name = "PATH")]
    env_file: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let needs_graph = cli.offline_json.is_none() || cli.send_followups;
    if needs_graph && (cli.team_id.is_none() || cli.channel_id.is_none()) {
        anyhow::bail!("--team-id and --channel-id are required when calling Microsoft Graph");
    }

    let settings = if needs_graph || !cli.fake_ai {
        Some(Settings::from_env(
            Some(&cli.env_file),
            !cli.fake_ai,
            needs_graph,
        )?)
    } else {
        None
    };

    let source: Option<Arc<dyn MessageSource>> = match &settings {
        Some(s) if needs_graph => Some(Arc::new(GraphClient::new(
            s.tenant_id.clone(),
            s.client_id.clone(),
            s.client_secret.clone(),
        ))),
        _ => None,
    };

    let analyzer: Arc<dyn Analyzer> = if cli.fake_ai {
        Arc::new(RuleBasedAnalyzer)
    } else {
        let s = settings
            .as_ref()
            .context("OpenAI settings are required unless --fake-ai is set")?;
        Arc::new(OpenAiAnalyzer::new(
            s.openai_api_key.clone(),
            s.openai_model.clone(),
            s.openai_base_url.clone(),
        ))
    };

    let time_horizon_hours = settings
        .as_ref()
        .map(|s| s.time_horizon_hours)
        .unwrap_or(DEFAULT_TIME_HORIZON_HOURS);
    let planner = DailyActionPlanner::new(source, analyzer, time_horizon_hours);

    let offline_messages = match &cli.offline_json {
        Some(path) => Some(read_offline_messages(path).await?),
        None => None,
    };

    let team_id = cli.team_id.as_deref().unwrap_or("offline");
    let channel_id = cli.channel_id.as_deref().unwrap_or("offline");

    let plan = planner
        .generate_plan(
            team_id,
            channel_id,
            PlanOptions {
                focus: cli.focus.clone(),
                top: Some(cli.top),
                lookback_hours: Some(cli.lookback),
                offline_messages,
            },
        )
        .await?;

    print_plan(&plan);

    if let Some(path) = &cli.export_json {
        let json = serde_json::to_string_pretty(&plan)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("writing plan to {}", path.display()))?;
        eprintln!("Plan written to {}", path.display());
    }

    if cli.send_followups {
        let responses = planner
            .execute_follow_ups(&plan, team_id, channel_id, !cli.force_send)
            .await?;
        if cli.force_send {
            eprintln!("Sent {} follow-up messages", responses.len());
        } else {
            eprintln!("Dry run: pass --force-send to actually post follow-ups");
        }
    }

    Ok(())
}

/// Read an offline snapshot: either a raw JSON array of payloads or an
/// object with a `value` array, the shape Graph itself returns.
async fn read_offline_messages(path: &Path) -> anyhow::Result<Vec<Value>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading offline messages from {}", path.display()))?;
    let data: Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing offline messages from {}", path.display()))?;
    match data {
        Value::Array(items) => Ok(items),
        other => Ok(other
            .get("value")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()),
    }
}

fn print_plan(plan: &ActionPlan) {
    println!(
        "Action plan generated at {} ({} messages sampled, next {}h)",
        plan.generated_at, plan.message_sample_size, plan.timespan_hours
    );
    for action in &plan.actions {
        println!(
            "  [{}] {}",
            action.urgency.as_str().to_uppercase(),
            action.title
        );
        if !action.details.is_empty() {
            println!("         {}", action.details);
        }
        if let Some(recipient) = &action.recommended_recipient {
            println!("         Recipient: {recipient}");
        }
    }
}
