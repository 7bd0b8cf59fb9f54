//! Shape construction replay
//!
//! Usage: `sb-replay <script.ron> <output.ron> [config.ron]`

mod script;

use anyhow::{Context, Result, bail};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sb_core::BuilderConfig;

use crate::script::{ReplayScript, replay};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (script_path, output_path, config_path) = match args.as_slice() {
        [script, output] => (script, output, None),
        [script, output, config] => (script, output, Some(config)),
        _ => bail!("usage: sb-replay <script.ron> <output.ron> [config.ron]"),
    };

    let config = match config_path {
        Some(path) => BuilderConfig::load(path)
            .with_context(|| format!("failed to load config {}", path))?,
        None => BuilderConfig::default(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Replaying {}", script_path);

    let content = std::fs::read_to_string(script_path)
        .with_context(|| format!("failed to read script {}", script_path))?;
    let script = ReplayScript::from_ron_str(&content)
        .with_context(|| format!("failed to parse script {}", script_path))?;

    let outcome = replay(&script, &config.snap);
    tracing::info!(
        "{} shapes replayed, {} rebuild requests",
        outcome.shapes.len(),
        outcome.rebuild_requests
    );

    outcome
        .document(&script.document)
        .save(output_path)
        .with_context(|| format!("failed to write {}", output_path))?;

    Ok(())
}
