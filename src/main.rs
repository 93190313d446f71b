use anyhow::Context;
use bridge_core::{BridgeConfig, EnvValues, MessageStatus, Pipeline, RawMessage, TransformCache};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Counts of how each message in a batch ended.
#[derive(Debug, Default, PartialEq, Eq)]
struct BatchSummary {
    transformed: usize,
    quarantined: usize,
    rejected: usize,
    failed: usize,
}

/// Main entry point for the bridge batch runner
///
/// Processes every file in the input directory as one HL7 v2 message, concurrently,
/// and writes one JSON result per message to the output directory.
///
/// # Environment Variables
/// - `BRIDGE_INPUT_DIR`: directory of messages (default: "./inbox")
/// - `BRIDGE_OUTPUT_DIR`: directory for results (default: "./outbox")
/// - `BRIDGE_CONFIG` and the other `BRIDGE_*` settings read by [`EnvValues`]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("bridge=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let input_dir: PathBuf = std::env::var("BRIDGE_INPUT_DIR")
        .unwrap_or_else(|_| "./inbox".into())
        .into();
    let output_dir: PathBuf = std::env::var("BRIDGE_OUTPUT_DIR")
        .unwrap_or_else(|_| "./outbox".into())
        .into();

    let config = BridgeConfig::from_env_values(EnvValues::from_process_env())
        .context("failed to load configuration")?;
    tracing::info!(
        policy = %config.validation_policy(),
        "++ Processing {} into {}",
        input_dir.display(),
        output_dir.display()
    );

    let pipeline = Arc::new(Pipeline::new(&config).with_cache(Arc::new(TransformCache::new())));
    let summary = run_batch(&input_dir, &output_dir, pipeline).await?;

    tracing::info!(
        transformed = summary.transformed,
        quarantined = summary.quarantined,
        rejected = summary.rejected,
        failed = summary.failed,
        "batch complete"
    );
    Ok(())
}

/// Process every regular file in `input_dir`, writing `<stem>.json` into `output_dir`.
async fn run_batch(
    input_dir: &Path,
    output_dir: &Path,
    pipeline: Arc<Pipeline>,
) -> anyhow::Result<BatchSummary> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let mut inputs: Vec<PathBuf> = std::fs::read_dir(input_dir)
        .with_context(|| format!("failed to read {}", input_dir.display()))?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    inputs.sort();

    let handles: Vec<_> = inputs
        .into_iter()
        .map(|path| {
            let pipeline = Arc::clone(&pipeline);
            let output_dir = output_dir.to_path_buf();
            tokio::task::spawn_blocking(move || process_file(&pipeline, &path, &output_dir))
        })
        .collect();

    let mut summary = BatchSummary::default();
    for handle in handles {
        match handle.await? {
            Ok(MessageStatus::Transformed) => summary.transformed += 1,
            Ok(MessageStatus::Invalid) => summary.quarantined += 1,
            Ok(_) => summary.failed += 1,
            Err(Outcome::Rejected) => summary.rejected += 1,
            Err(Outcome::Failed) => summary.failed += 1,
        }
    }
    Ok(summary)
}

enum Outcome {
    Rejected,
    Failed,
}

fn process_file(
    pipeline: &Pipeline,
    path: &Path,
    output_dir: &Path,
) -> Result<MessageStatus, Outcome> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "message".into());
    let target = output_dir.join(format!("{stem}.json"));

    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(file = %path.display(), error = %err, "failed to read message");
            return Err(Outcome::Failed);
        }
    };

    let (document, result) = match pipeline.process(&RawMessage::new(text)) {
        Ok(outcome) => {
            let status = outcome.status;
            (serde_json::to_value(&outcome), Ok(status))
        }
        Err(err) => {
            let status = err.message_status();
            let result = match status {
                MessageStatus::Invalid => Err(Outcome::Rejected),
                _ => Err(Outcome::Failed),
            };
            (
                Ok(serde_json::json!({ "status": status, "error": err.to_string() })),
                result,
            )
        }
    };

    let written = document
        .and_then(|value| serde_json::to_string_pretty(&value))
        .map_err(std::io::Error::from)
        .and_then(|json| std::fs::write(&target, json));
    if let Err(err) = written {
        tracing::warn!(file = %target.display(), error = %err, "failed to write result");
        return Err(Outcome::Failed);
    }
    result
}
