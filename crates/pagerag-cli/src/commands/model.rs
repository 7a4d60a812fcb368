use std::io::Write;

use anyhow::Context;
use tracing::info;

use pagerag_lib::embedding::local::{HF_REPO, LocalEmbedder, MODEL_FILES, MODEL_SUBDIR};
use pagerag_lib::runtime::Runtime;

use crate::console::Console;

/// Run the `pagerag model download` command.
pub fn run_model_download(
    force: bool,
    runtime: &Runtime,
    console: &mut dyn Console,
) -> anyhow::Result<()> {
    let cache_dir = runtime.settings.model_cache_dir();
    let model_dir = cache_dir.join(MODEL_SUBDIR);

    if force && model_dir.exists() {
        writeln!(console.err(), "Removing existing model files...")?;
        std::fs::remove_dir_all(&model_dir)
            .with_context(|| format!("Failed to remove {}", model_dir.display()))?;
    }

    if !force && LocalEmbedder::is_downloaded(&cache_dir) {
        writeln!(
            console.out(),
            "Model already downloaded at {}",
            model_dir.display()
        )?;
        return Ok(());
    }

    std::fs::create_dir_all(&model_dir)
        .with_context(|| format!("Failed to create {}", model_dir.display()))?;

    writeln!(console.err(), "Downloading {HF_REPO}...")?;
    let api = hf_hub::api::sync::Api::new()?;
    let repo = api.model(HF_REPO.to_string());

    for (remote_path, local_name) in MODEL_FILES {
        let dest = model_dir.join(local_name);
        if dest.exists() {
            writeln!(console.err(), "  {local_name} (cached)")?;
            continue;
        }
        writeln!(console.err(), "  {local_name}...")?;
        let cached = repo
            .get(remote_path)
            .with_context(|| format!("Failed to download {remote_path} from {HF_REPO}"))?;
        std::fs::copy(&cached, &dest)
            .with_context(|| format!("Failed to copy {local_name} into the model cache"))?;
    }
    info!(dir = %model_dir.display(), "Model downloaded");

    writeln!(console.out(), "Model downloaded to {}", model_dir.display())?;
    Ok(())
}
