//! `newsfact inspect`: show how a checkpoint resolves without building a session.

use std::path::Path;

use anyhow::Context;
use newsfact_ai::checkpoint::{self, ResolvedCheckpoint};

pub fn run(path: &Path) -> anyhow::Result<()> {
    let ckpt = checkpoint::resolve(path)
        .with_context(|| format!("resolving checkpoint {}", path.display()))?;
    print!("{}", render(&ckpt));
    Ok(())
}

fn render(ckpt: &ResolvedCheckpoint) -> String {
    let rows = [
        ("directory", ckpt.dir.display().to_string()),
        ("layout", ckpt.mode.as_str().to_string()),
        ("model_name", ckpt.config.model_name.clone()),
        ("num_labels", ckpt.config.num_labels.to_string()),
        ("weights", ckpt.weights.display().to_string()),
        ("tokenizer", ckpt.tokenizer.display().to_string()),
    ];
    rows.iter()
        .map(|(key, value)| format!("  {key:<12} {value}\n"))
        .collect()
}
