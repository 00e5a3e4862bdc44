use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use edit_reconciler::{
    CommitReport, DiscardReport, EngineConfig, EntityId, FieldBinding, InMemoryEntityStore,
    ReconciliationEngine, Value,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "edit-reconciler")]
#[command(about = "Replay edit sessions against a JSON entity file")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a session script and print the resulting entities
    Replay {
        #[arg(long)]
        entities: PathBuf,
        #[arg(long)]
        script: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the final entities back to the entities file
        #[arg(long, default_value_t = false)]
        write: bool,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    Track {
        entity_id: ScriptId,
        field: String,
        new_value: Value,
        #[serde(default = "null_value")]
        original_value: Value,
    },
    Commit,
    Discard,
}

fn null_value() -> Value {
    Value::Null
}

/// Entity id as written in a script: `1` and `"1"` name the same entity.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScriptId {
    Number(i64),
    Text(String),
}

impl From<ScriptId> for EntityId {
    fn from(id: ScriptId) -> Self {
        match id {
            ScriptId::Number(n) => EntityId::from(n),
            ScriptId::Text(s) => EntityId::from(s),
        }
    }
}

/// Stands in for a form control: prints what it would display again.
struct ConsoleBinding;

impl FieldBinding for ConsoleBinding {
    fn revert_field(
        &self,
        entity_id: &EntityId,
        field: &str,
        value: &Value,
    ) -> edit_reconciler::Result<()> {
        println!("revert {}.{} -> {}", entity_id, field, value);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Replay {
            entities,
            script,
            config,
            write,
        } => replay(&entities, &script, config.as_deref(), write).await,
    }
}

async fn replay(entities: &Path, script: &Path, config: Option<&Path>, write: bool) -> Result<()> {
    let entities_json = fs::read_to_string(entities)
        .with_context(|| format!("failed to read entities file {}", entities.display()))?;
    let store = Arc::new(
        InMemoryEntityStore::from_json_str(&entities_json).context("invalid entities file")?,
    );

    let script_json = fs::read_to_string(script)
        .with_context(|| format!("failed to read script {}", script.display()))?;
    let steps: Vec<Step> = serde_json::from_str(&script_json).context("invalid script")?;

    let config = match config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            EngineConfig::from_json_str(&raw).context("invalid config")?
        }
        None => EngineConfig::new(),
    };

    let engine = ReconciliationEngine::new(store.clone(), store.clone(), config);
    let binding: Arc<dyn FieldBinding> = Arc::new(ConsoleBinding);

    for step in steps {
        match step {
            Step::Track {
                entity_id,
                field,
                new_value,
                original_value,
            } => engine.track_change(entity_id, field, new_value, original_value, &binding),
            Step::Commit => print_commit(&engine.commit().await),
            Step::Discard => print_discard(&engine.discard()),
        }
    }

    if engine.has_unsaved_changes() {
        println!("{} change(s) left pending", engine.pending_count());
    }

    let dumped = store.to_json_string().await?;
    if write {
        fs::write(entities, &dumped)
            .with_context(|| format!("failed to write {}", entities.display()))?;
    }
    println!("{}", dumped);
    Ok(())
}

fn print_commit(report: &CommitReport) {
    println!(
        "commit: {} saved, {} failed, {} retained",
        report.committed.len(),
        report.failures.len(),
        report.retained
    );
    for failure in &report.failures {
        println!("  {}: {}", failure.entity_id, failure.error);
    }
}

fn print_discard(report: &DiscardReport) {
    println!(
        "discard: {} reverted, {} detached, {} failed",
        report.reverted,
        report.detached.len(),
        report.failures.len()
    );
    for failure in &report.failures {
        println!("  {}", failure);
    }
}
