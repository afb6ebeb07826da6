use anyhow::{Context, Result};
use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use candle_transformers::models::llama::{Cache, Config, Llama, LlamaConfig, LlamaEosToks};
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};

use crate::config::{Settings, MODEL_ID};

/// Fully loaded model state: weights, tokenizer and the device they live on.
/// A value of this type only exists after `load` ran to completion, so
/// handlers never observe a half-initialized model.
pub struct ModelRuntime {
    pub model: Llama,
    pub tokenizer: Tokenizer,
    pub config: Config,
    pub device: Device,
    pub dtype: DType,
    /// Token id used both as pad token and as generation terminator.
    pub eos_token_id: u32,
}

impl ModelRuntime {
    /// Fresh per-request KV cache; the weights themselves are shared
    /// read-only between requests.
    pub fn new_cache(&self) -> Result<Cache> {
        Ok(Cache::new(true, self.dtype, &self.config, &self.device)?)
    }
}

/// Downloads and assembles tokenizer plus model for the compiled-in model id.
/// Any failure here is reported to the caller; the service keeps running
/// without a model and answers fallback queries with a fixed message.
pub fn build_model_and_tokenizer(settings: &Settings) -> Result<ModelRuntime> {
    use hf_hub::{api::sync::ApiBuilder, Repo, RepoType};

    let api = ApiBuilder::new()
        .with_token(settings.hf_token.clone())
        .build()?;
    let repo = api.repo(Repo::new(MODEL_ID.to_string(), RepoType::Model));

    let config_path = repo.get("config.json").context("fetching config.json")?;
    let tokenizer_path = repo.get("tokenizer.json").context("fetching tokenizer.json")?;
    let model_path = repo.get("model.safetensors").context("fetching model.safetensors")?;

    let mut tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| anyhow::anyhow!(e))?;

    let llama_config: LlamaConfig =
        serde_json::from_str(&std::fs::read_to_string(config_path)?)?;
    let mut config = llama_config.into_config(false);

    let eos_token_id = match &config.eos_token_id {
        Some(LlamaEosToks::Single(id)) => *id,
        Some(LlamaEosToks::Multiple(ids)) => *ids.first().context("empty eos token list")?,
        None => anyhow::bail!("model config declares no eos token"),
    };

    // The tokenizer ships without a pad token; designate eos for padding and
    // truncate to the model's context window.
    if tokenizer.get_padding().is_none() {
        let pad_token = tokenizer
            .id_to_token(eos_token_id)
            .context("eos id not present in tokenizer vocab")?;
        tokenizer.with_padding(Some(PaddingParams {
            pad_id: eos_token_id,
            pad_token,
            ..Default::default()
        }));
    }
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: config.max_position_embeddings,
            ..Default::default()
        }))
        .map_err(|e| anyhow::anyhow!(e))?;

    // Keep the embedding table sized to the tokenizer's vocabulary after the
    // pad-token adjustment.
    config.vocab_size = tokenizer.get_vocab_size(true);

    let device = pick_device()?;
    let dtype = if matches!(device, Device::Cpu) { DType::F32 } else { DType::F16 };

    let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[model_path], dtype, &device)? };
    let model = Llama::load(vb, &config)?;

    tracing::info!(
        model = MODEL_ID,
        vocab_size = config.vocab_size,
        device = ?device,
        "model loaded"
    );

    Ok(ModelRuntime {
        model,
        tokenizer,
        config,
        device,
        dtype,
        eos_token_id,
    })
}

fn pick_device() -> Result<Device> {
    if candle_core::utils::cuda_is_available() {
        match Device::new_cuda(0) {
            Ok(device) => return Ok(device),
            Err(e) => tracing::warn!(error = %e, "CUDA init failed, falling back to CPU"),
        }
    }
    Ok(Device::Cpu)
}
