use anyhow::{Context, Result};
use candle_core::Tensor;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::llama::LlamaEosToks;

use crate::model::ModelRuntime;

/// Maximum total sequence length (prompt plus generated tokens).
pub const MAX_TOTAL_TOKENS: usize = 50;

/// Served to fallback queries while no model is loaded.
pub const MODEL_UNAVAILABLE: &str = "Model is not loaded. Please check the setup.";

const SAMPLING_SEED: u64 = 299792458;

/// Runs greedy generation for a single query and decodes the full sequence,
/// prompt included, with special tokens stripped. Deterministic for a given
/// query and model state.
pub fn generate(runtime: &ModelRuntime, query: &str) -> Result<String> {
    let encoding = runtime
        .tokenizer
        .encode(query, true)
        .map_err(|e| anyhow::anyhow!(e))?;

    // Padding positions carry no content; keep only what the attention mask
    // marks as real.
    let mut tokens: Vec<u32> = encoding
        .get_ids()
        .iter()
        .zip(encoding.get_attention_mask())
        .filter(|(_, &mask)| mask == 1)
        .map(|(&id, _)| id)
        .collect();
    if tokens.is_empty() {
        anyhow::bail!("query tokenized to an empty sequence");
    }

    let prompt_len = tokens.len();
    let mut cache = runtime.new_cache()?;
    // temperature/top-p unset: argmax decoding, reproducible across calls
    let mut logits_processor = LogitsProcessor::new(SAMPLING_SEED, None, None);

    let mut index_pos = 0;
    for step in 0..generation_budget(prompt_len, MAX_TOTAL_TOKENS) {
        let context = if step == 0 { &tokens[..] } else { &tokens[tokens.len() - 1..] };
        let input = Tensor::new(context, &runtime.device)?.unsqueeze(0)?;
        let logits = runtime.model.forward(&input, index_pos, &mut cache)?;
        let logits = logits.squeeze(0)?;
        index_pos += context.len();

        let next_token = logits_processor.sample(&logits)?;
        if is_stop_token(runtime.config.eos_token_id.as_ref(), runtime.eos_token_id, next_token) {
            break;
        }
        tokens.push(next_token);
    }

    let text = runtime
        .tokenizer
        .decode(&tokens, true)
        .map_err(|e| anyhow::anyhow!(e))
        .context("decoding generated sequence")?;
    Ok(text)
}

/// How many tokens may still be generated before the total sequence hits the
/// cap. A prompt already at or over the cap leaves no budget.
pub fn generation_budget(prompt_len: usize, max_total: usize) -> usize {
    max_total.saturating_sub(prompt_len)
}

pub fn is_stop_token(config_eos: Option<&LlamaEosToks>, fallback_eos: u32, token: u32) -> bool {
    match config_eos {
        Some(LlamaEosToks::Single(id)) => token == *id,
        Some(LlamaEosToks::Multiple(ids)) => ids.contains(&token),
        None => token == fallback_eos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_counts_total_sequence_length() {
        assert_eq!(generation_budget(10, 50), 40);
        assert_eq!(generation_budget(50, 50), 0);
        assert_eq!(generation_budget(80, 50), 0);
        assert_eq!(generation_budget(0, 50), 50);
    }

    #[test]
    fn stop_token_single_eos() {
        let eos = LlamaEosToks::Single(128001);
        assert!(is_stop_token(Some(&eos), 0, 128001));
        assert!(!is_stop_token(Some(&eos), 0, 42));
    }

    #[test]
    fn stop_token_multiple_eos() {
        let eos = LlamaEosToks::Multiple(vec![128001, 128009]);
        assert!(is_stop_token(Some(&eos), 0, 128009));
        assert!(!is_stop_token(Some(&eos), 0, 128000));
    }

    #[test]
    fn stop_token_falls_back_to_tokenizer_eos() {
        assert!(is_stop_token(None, 2, 2));
        assert!(!is_stop_token(None, 2, 3));
    }
}
