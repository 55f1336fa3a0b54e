// Local embeddings via BAAI/bge-small-en-v1.5 on Candle
use anyhow::{Context, Result};
use candle_core::{Device, IndexOp, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::sync::Arc;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use super::Embedder;
use crate::config::EmbeddingConfig;

/// BERT sentence embedder (CLS pooling, L2-normalised)
pub struct BertEmbedder {
    model: Arc<BertModel>,
    tokenizer: Arc<Tokenizer>,
    device: Device,
    dimension: usize,
    query_instruction: String,
}

impl BertEmbedder {
    /// Load the configured model (downloads it on first use)
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let device = Device::cuda_if_available(0).context("Failed to select compute device")?;
        info!(model = %config.model_id, device = ?device, "loading embedding model");

        let api = Api::new().context("Failed to create HuggingFace API client")?;
        let repo = api.repo(Repo::new(config.model_id.clone(), RepoType::Model));

        let config_path = repo
            .get("config.json")
            .context("Failed to download model config")?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .context("Failed to download tokenizer")?;
        let weights_path = repo
            .get("model.safetensors")
            .context("Failed to download model weights")?;

        let config_contents =
            std::fs::read_to_string(config_path).context("Failed to read model config")?;
        let bert_config: Config =
            serde_json::from_str(&config_contents).context("Failed to parse model config")?;
        let raw_config: serde_json::Value =
            serde_json::from_str(&config_contents).context("Failed to parse model config")?;
        let dimension = raw_config
            .get("hidden_size")
            .and_then(|v| v.as_u64())
            .context("Model config has no hidden_size")? as usize;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;
        tokenizer.with_padding(None);

        // SAFETY: the weights file is downloaded into the HF cache and not
        // modified while mapped.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)
                .context("Failed to load model weights")?
        };

        let model = BertModel::load(vb, &bert_config).context("Failed to create BERT model")?;

        Ok(Self {
            model: Arc::new(model),
            tokenizer: Arc::new(tokenizer),
            device,
            dimension,
            query_instruction: config.query_instruction.clone(),
        })
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
        let batch_size = texts.len();

        let mut padded_ids = vec![0u32; batch_size * max_len];
        let mut padded_mask = vec![0u32; batch_size * max_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let row = i * max_len;
            padded_ids[row..row + ids.len()].copy_from_slice(ids);
            padded_mask[row..row + mask.len()].copy_from_slice(mask);
        }

        let token_ids = Tensor::from_vec(padded_ids, (batch_size, max_len), &self.device)?;
        let attention_mask = Tensor::from_vec(padded_mask, (batch_size, max_len), &self.device)?;
        let token_type_ids = token_ids.zeros_like()?;

        let hidden = self
            .model
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;

        // CLS token of every sequence
        let cls = hidden.i((.., 0))?;
        let normalized = Self::l2_normalize(&cls)?;

        debug!(batch = batch_size, seq_len = max_len, "embedded batch");
        Ok(normalized.to_vec2::<f32>()?)
    }

    fn l2_normalize(embeddings: &Tensor) -> Result<Tensor> {
        let norms = embeddings.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12, f64::MAX)?;
        Ok(embeddings.broadcast_div(&norms)?)
    }
}

impl Embedder for BertEmbedder {
    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.embed_batch(texts)
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let instructed = format!("{}{}", self.query_instruction, text);
        self.embed_batch(&[instructed.as_str()])?
            .pop()
            .context("Embedding model returned no vector")
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
