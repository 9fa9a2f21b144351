//! kvq: submit conditional mutations and read keys through the pipeline.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kvq_core::queue::TaskQueue;
use kvq_core::{App, AppBuilder, KvqConfig, Mutation, Submission, TaskResult};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Parser)]
#[command(name = "kvq")]
#[command(about = "Asynchronous conditional mutations over a key-value store", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON config file (defaults apply when omitted)
    #[arg(long, env = "KVQ_CONFIG")]
    config: Option<PathBuf>,

    /// Number of workers
    #[arg(long)]
    workers: Option<usize>,

    /// Redis URL, e.g. redis://127.0.0.1:6379 (in-memory store when omitted)
    #[arg(long, env = "KVQ_STORE_URL")]
    store_url: Option<String>,

    /// How long to wait for a submitted task to finish, in seconds
    #[arg(long, default_value = "10")]
    wait_secs: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Create a key; fails if it already exists
    Create { key: String, value: String },

    /// Update an existing key
    Update { key: String, value: String },

    /// Delete an existing key
    Delete { key: String },

    /// Read a key (retried on store failures)
    Read { key: String },

    /// Run the create / read / duplicate-create walkthrough (default)
    Demo,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    // (A) 設定を読み込み、CLI 引数で上書き
    let config = load_config(&cli)?;

    // (B) store / queue / workers を構築
    let app = AppBuilder::new()
        .with_config(config)
        .build()
        .await
        .context("failed to start kvq")?;

    let timeout = Duration::from_secs(cli.wait_secs);
    let outcome = match cli.command.unwrap_or(Command::Demo) {
        Command::Create { key, value } => {
            run_mutation(&app, Mutation::create(key, value), timeout).await
        }
        Command::Update { key, value } => {
            run_mutation(&app, Mutation::update(key, value), timeout).await
        }
        Command::Delete { key } => run_mutation(&app, Mutation::delete(key), timeout).await,
        Command::Read { key } => run_read(&app, &key).await,
        Command::Demo => run_demo(&app, timeout).await,
    };

    // (E) queue を閉じて worker を止める
    app.shutdown().await;
    outcome
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<KvqConfig> {
    let mut config = match &cli.config {
        Some(path) => KvqConfig::from_path(path)?,
        None => KvqConfig::default(),
    };
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(url) = &cli.store_url {
        config.store_url = Some(url.clone());
    }
    Ok(config)
}

async fn run_mutation(app: &App, mutation: Mutation, timeout: Duration) -> Result<()> {
    // (C) 投入して task id を即座に受け取る
    let ack = app.service().submit(mutation).await?;
    print_json(&ack)?;

    // (D) 終端状態になるまでポーリング
    let result = wait(app, &ack, timeout).await?;
    print_json(&result)?;
    Ok(())
}

async fn run_read(app: &App, key: &str) -> Result<()> {
    match app.service().read(key).await? {
        Some(entry) => print_json(&entry),
        None => bail!("Key not found: {key}"),
    }
}

async fn run_demo(app: &App, timeout: Duration) -> Result<()> {
    let service = app.service();

    let first = service.create("a", "1").await?;
    print_json(&first)?;
    print_json(&wait(app, &first, timeout).await?)?;

    match service.read("a").await? {
        Some(entry) => print_json(&entry)?,
        None => warn!(key = "a", "created key is not readable"),
    }

    let duplicate = service.create("a", "2").await?;
    print_json(&duplicate)?;
    print_json(&wait(app, &duplicate, timeout).await?)?;

    if service.read("missing").await?.is_none() {
        info!(key = "missing", "read miss");
    }

    info!(counts = ?app.queue().counts().await, "demo finished");
    Ok(())
}

async fn wait(app: &App, ack: &Submission, timeout: Duration) -> Result<TaskResult> {
    let waiting = app
        .service()
        .wait_for_result(ack.task_id, POLL_INTERVAL, timeout);
    tokio::select! {
        result = waiting => match result? {
            Some(result) => Ok(result),
            None => bail!("task {} did not finish within {:?}", ack.task_id, timeout),
        },
        _ = tokio::signal::ctrl_c() => bail!("interrupted while waiting for task {}", ack.task_id),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
