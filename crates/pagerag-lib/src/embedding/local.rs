use std::fs;
use std::path::Path;

use anyhow::Context;
use fastembed::{
    InitOptionsUserDefined, Pooling, TextEmbedding, TokenizerFiles, UserDefinedEmbeddingModel,
};

use crate::embedding::Embedder;

/// Hugging Face repository the local model is downloaded from.
pub const HF_REPO: &str = "Xenova/bge-small-en-v1.5";

/// Subdirectory name under the model cache for the downloaded files.
pub const MODEL_SUBDIR: &str = "bge-small-en-v1.5";

/// `(remote path, local file name)` pairs making up the model.
pub const MODEL_FILES: &[(&str, &str)] = &[
    ("onnx/model_quantized.onnx", "model_quantized.onnx"),
    ("tokenizer.json", "tokenizer.json"),
    ("config.json", "config.json"),
    ("special_tokens_map.json", "special_tokens_map.json"),
    ("tokenizer_config.json", "tokenizer_config.json"),
];

/// Embedding width of bge-small-en-v1.5.
pub const LOCAL_EMBEDDING_DIMENSION: usize = 384;

/// In-process embedder running BGE small (int8) through fastembed.
pub struct LocalEmbedder {
    model: TextEmbedding,
}

impl LocalEmbedder {
    /// Load the model from `model_cache_dir/bge-small-en-v1.5/`.
    ///
    /// If the files are missing, the error tells the user to run
    /// `pagerag model download`.
    pub fn new(model_cache_dir: &Path) -> anyhow::Result<Self> {
        let base = model_cache_dir.join(MODEL_SUBDIR);

        let onnx_bytes = fs::read(base.join("model_quantized.onnx")).with_context(|| {
            format!(
                "Model not found at {}. Run 'pagerag model download' first.",
                base.display()
            )
        })?;

        let tokenizer_files = TokenizerFiles {
            tokenizer_file: fs::read(base.join("tokenizer.json"))
                .context("Missing tokenizer.json")?,
            config_file: fs::read(base.join("config.json")).context("Missing config.json")?,
            special_tokens_map_file: fs::read(base.join("special_tokens_map.json"))
                .context("Missing special_tokens_map.json")?,
            tokenizer_config_file: fs::read(base.join("tokenizer_config.json"))
                .context("Missing tokenizer_config.json")?,
        };

        let user_model =
            UserDefinedEmbeddingModel::new(onnx_bytes, tokenizer_files).with_pooling(Pooling::Cls);

        let model =
            TextEmbedding::try_new_from_user_defined(user_model, InitOptionsUserDefined::default())
                .context("Failed to initialize bge-small-en-v1.5 model")?;

        Ok(Self { model })
    }

    /// Whether every model file is already present under `model_cache_dir`.
    pub fn is_downloaded(model_cache_dir: &Path) -> bool {
        let base = model_cache_dir.join(MODEL_SUBDIR);
        MODEL_FILES.iter().all(|(_, local)| base.join(local).exists())
    }
}

impl Embedder for LocalEmbedder {
    fn embed(&mut self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut embeddings = self
            .model
            .embed(vec![text.to_string()], None)
            .context("Failed to embed text")?;
        anyhow::ensure!(
            embeddings.len() == 1,
            "Model returned {} embeddings for one input",
            embeddings.len()
        );
        let embedding = embeddings.swap_remove(0);
        check_dimension(&embedding)?;
        Ok(embedding)
    }

    fn model_id(&self) -> &str {
        HF_REPO
    }
}

/// The loaded ONNX file must be the bge-small export the cache was built for.
fn check_dimension(embedding: &[f32]) -> anyhow::Result<()> {
    anyhow::ensure!(
        embedding.len() == LOCAL_EMBEDDING_DIMENSION,
        "Model produced {}-dimensional embeddings, expected {LOCAL_EMBEDDING_DIMENSION}. \
         Re-run 'pagerag model download --force'.",
        embedding.len()
    );
    Ok(())
}
