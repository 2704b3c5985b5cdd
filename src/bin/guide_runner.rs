//! Guide runner
//!
//! Replays a recorded list of agent turns against a live page, with the
//! pointer animation and every action performed for real. Useful for
//! checking prompts and page markup without an LLM in the loop.

use anyhow::{Context, bail};
use clap::Parser;
use guide_engine::agent::{GuideConfig, GuideDriver, GuideTask, InMemorySessionLog, ScriptedModel};
use guide_engine::browser::{BrowserSession, ConnectionOptions, LaunchOptions};
use guide_engine::guide::ActionExecutor;
use guide_engine::protocol::agent_output_schema;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "guide-runner")]
#[command(version)]
#[command(about = "Replay agent turns against a browser page", long_about = None)]
struct Cli {
    /// Page to open before the guide starts
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Task the guide is helping with
    #[arg(long)]
    task: Option<String>,

    /// JSON file holding an array of agent turns
    #[arg(long, value_name = "FILE")]
    turns: Option<PathBuf>,

    /// Plan step; repeat for several
    #[arg(long = "step", value_name = "TEXT")]
    steps: Vec<String>,

    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Turn budget before giving up
    #[arg(long, default_value_t = guide_engine::agent::DEFAULT_MAX_STEPS)]
    max_steps: usize,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    chrome_path: Option<PathBuf>,

    /// WebSocket endpoint URL for remote browser connection
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Product name used in the system prompt
    #[arg(long, default_value = "this website")]
    mailbox_name: String,

    /// Attach viewport screenshots to model requests
    #[arg(long)]
    screenshots: bool,

    /// Print the agent output schema and exit
    #[arg(long)]
    print_schema: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.print_schema {
        println!("{}", serde_json::to_string_pretty(&agent_output_schema())?);
        return Ok(());
    }

    let (Some(task), Some(turns)) = (cli.task.as_deref(), cli.turns.as_ref()) else {
        bail!("--task and --turns are required unless --print-schema is given");
    };

    let script = tokio::fs::read_to_string(turns)
        .await
        .with_context(|| format!("Failed to read turns from {}", turns.display()))?;
    let model = Arc::new(ScriptedModel::from_json(&script).context("Invalid turns file")?);

    let session = match &cli.ws_endpoint {
        Some(endpoint) => {
            eprintln!("WebSocket endpoint: {}", endpoint);
            BrowserSession::connect(ConnectionOptions::new(endpoint.clone()))?
        }
        None => {
            let mut options = LaunchOptions::new().headless(!cli.headed);
            if let Some(path) = &cli.chrome_path {
                options = options.chrome_path(path.clone());
            }
            BrowserSession::launch(options)?
        }
    };

    if let Some(url) = &cli.url {
        session.navigate(url)?;
    }

    let page = Arc::new(session.page()?);
    let config = GuideConfig::new()
        .max_steps(cli.max_steps)
        .mailbox_name(cli.mailbox_name.clone())
        .capture_screenshot(cli.screenshots);

    let mut driver = GuideDriver::new(
        config,
        model.clone(),
        page.clone(),
        Box::new(ActionExecutor::for_page(page)),
        Arc::new(InMemorySessionLog::new()),
    );

    let handle = driver.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted, stopping the guide");
            handle.cancel();
        }
    });

    let outcome = driver
        .run(GuideTask::new(task).with_plan(cli.steps.clone()))
        .await?;

    for step in &outcome.steps {
        println!(
            "step {:>2}  {:<28} {}",
            step.step,
            step.action.to_string(),
            serde_json::to_string(&step.result)?
        );
    }
    println!("{:?}: {}", outcome.termination, outcome.text().unwrap_or(""));
    if model.remaining() > 0 {
        log::warn!("{} recorded turns were not used", model.remaining());
    }

    Ok(())
}
