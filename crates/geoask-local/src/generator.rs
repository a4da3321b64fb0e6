// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ONNX causal language model running in-process.
//!
//! The graph must take `input_ids` and `attention_mask` (optionally
//! `position_ids`) and return `logits` of shape `[batch, seq, vocab]`.
//! Graphs exported without past key/value inputs are required: every step
//! re-runs the full sequence.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use geoask_config::model::{LocalModelConfig, default_data_dir};
use geoask_core::{CompletionOptions, CompletionProvider, GeoaskError, Message};
use geoask_prompt::fold_system_message;
use ndarray::Array2;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::TensorRef;
use tracing::{debug, info};

use crate::chat_template::ChatTemplate;
use crate::model_manager::ModelManager;
use crate::sampling::{argmax, sample_top_p};

/// End-of-sequence spellings used across model families.
const EOS_TOKENS: &[&str] = &["</s>", "<|endoftext|>", "<eos>", "<|end_of_text|>"];

/// Local completion backend.
///
/// Cheap to clone; clones share one session.
#[derive(Clone)]
pub struct LocalModel {
    inner: Arc<Generator>,
    template: ChatTemplate,
    fold_system: bool,
}

struct Generator {
    /// ONNX Runtime session; one generation at a time.
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
    position_ids: bool,
    stop_ids: Vec<u32>,
}

impl LocalModel {
    /// Downloads the model on first run, then loads it on a blocking thread.
    pub async fn load(config: &LocalModelConfig) -> Result<Self, GeoaskError> {
        let data_dir = config
            .data_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let manager = ModelManager::new(
            data_dir,
            &config.model_id,
            config.model_file.clone(),
            config.access_token.clone(),
        );
        let model_path = manager.ensure_model().await?;
        let tokenizer_path = manager.tokenizer_path();

        let config = config.clone();
        tokio::task::spawn_blocking(move || Self::from_files(&model_path, &tokenizer_path, &config))
            .await
            .map_err(|e| GeoaskError::Internal(format!("model load task failed: {e}")))?
    }

    /// Loads the tokenizer and builds the ONNX session. Blocking.
    pub fn from_files(
        model_path: &Path,
        tokenizer_path: &Path,
        config: &LocalModelConfig,
    ) -> Result<Self, GeoaskError> {
        let tokenizer = tokenizers::Tokenizer::from_file(tokenizer_path).map_err(|e| {
            GeoaskError::Internal(format!(
                "failed to load tokenizer from {}: {e}",
                tokenizer_path.display()
            ))
        })?;

        let mut builder = Session::builder()
            .map_err(|e| GeoaskError::Internal(format!("failed to create ONNX session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| GeoaskError::Internal(format!("failed to set optimization level: {e}")))?
            .with_intra_threads(config.intra_threads)
            .map_err(|e| GeoaskError::Internal(format!("failed to set thread count: {e}")))?;
        for (key, value) in &config.quantization {
            debug!(key = key.as_str(), value = value.as_str(), "session config entry");
            builder = builder.with_config_entry(key, value).map_err(|e| {
                GeoaskError::Config(format!("invalid session config entry {key}: {e}"))
            })?;
        }
        let session = builder.commit_from_file(model_path).map_err(|e| {
            GeoaskError::Internal(format!(
                "failed to load ONNX model from {}: {e}",
                model_path.display()
            ))
        })?;

        let template = ChatTemplate::new(config.chat_template);
        let stop_ids = stop_token_ids(&tokenizer, &template);
        info!(
            model = %model_path.display(),
            template = %config.chat_template,
            stop_tokens = stop_ids.len(),
            "local model loaded"
        );

        Ok(Self {
            inner: Arc::new(Generator {
                session: Mutex::new(session),
                tokenizer,
                position_ids: config.position_ids,
                stop_ids,
            }),
            template,
            fold_system: config.fold_system,
        })
    }

    /// Applies folding when configured or required by the template, then
    /// renders the chat text.
    fn render(&self, messages: &[Message]) -> String {
        if self.fold_system || !self.template.supports_system_role() {
            self.template.render(&fold_system_message(messages))
        } else {
            self.template.render(messages)
        }
    }
}

impl Generator {
    /// Autoregressive generation. Returns only the newly generated text.
    fn generate(&self, prompt: &str, options: &CompletionOptions) -> Result<String, GeoaskError> {
        let encoding = self
            .tokenizer
            .encode(prompt, false)
            .map_err(|e| GeoaskError::Internal(format!("tokenization failed: {e}")))?;
        let mut ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let prompt_len = ids.len();

        let mut session = self
            .session
            .lock()
            .map_err(|e| GeoaskError::Internal(format!("failed to lock ONNX session: {e}")))?;

        let mut rng = rand::thread_rng();
        let mut generated: Vec<u32> = Vec::new();
        for _ in 0..options.max_new_tokens {
            let logits = self.next_token_logits(&mut session, &ids)?;
            let next = if options.deterministic {
                argmax(&logits)
            } else {
                sample_top_p(&logits, options.temperature, options.top_p, &mut rng)
            };
            let next = next as u32;

            if self.stop_ids.contains(&next) {
                break;
            }
            generated.push(next);
            ids.push(next as i64);
        }
        debug!(
            prompt_tokens = prompt_len,
            new_tokens = generated.len(),
            "generation finished"
        );

        self.tokenizer
            .decode(&generated, true)
            .map_err(|e| GeoaskError::Internal(format!("detokenization failed: {e}")))
    }

    /// Runs the graph over `ids` and returns the logits of the last position.
    fn next_token_logits(&self, session: &mut Session, ids: &[i64]) -> Result<Vec<f32>, GeoaskError> {
        let seq_len = ids.len();
        let input_ids = Array2::from_shape_vec((1, seq_len), ids.to_vec())
            .map_err(|e| GeoaskError::Internal(format!("failed to create input_ids tensor: {e}")))?;
        let attention_mask = Array2::<i64>::ones((1, seq_len));
        let position_ids = Array2::from_shape_vec((1, seq_len), (0..seq_len as i64).collect())
            .map_err(|e| {
                GeoaskError::Internal(format!("failed to create position_ids tensor: {e}"))
            })?;

        let input_ids_tensor = TensorRef::from_array_view(&input_ids).map_err(|e| {
            GeoaskError::Internal(format!("failed to create input_ids TensorRef: {e}"))
        })?;
        let attention_mask_tensor = TensorRef::from_array_view(&attention_mask).map_err(|e| {
            GeoaskError::Internal(format!("failed to create attention_mask TensorRef: {e}"))
        })?;

        let outputs = if self.position_ids {
            let position_ids_tensor = TensorRef::from_array_view(&position_ids).map_err(|e| {
                GeoaskError::Internal(format!("failed to create position_ids TensorRef: {e}"))
            })?;
            session.run(ort::inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
                "position_ids" => position_ids_tensor
            ])
        } else {
            session.run(ort::inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor
            ])
        }
        .map_err(|e| GeoaskError::Internal(format!("ONNX inference failed: {e}")))?;

        // Output shape [1, seq_len, vocab]
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| GeoaskError::Internal(format!("failed to extract logits: {e}")))?;
        let vocab = shape[shape.len() - 1] as usize;
        last_row(data, vocab)
            .map(<[f32]>::to_vec)
            .ok_or_else(|| GeoaskError::Internal("model returned empty logits".into()))
    }
}

/// The final `vocab`-wide row of a flattened logits buffer.
fn last_row(data: &[f32], vocab: usize) -> Option<&[f32]> {
    if vocab == 0 || data.len() < vocab {
        return None;
    }
    Some(&data[data.len() - vocab..])
}

/// Token ids that end generation: the template's end-of-turn token plus
/// any known end-of-sequence token in the vocabulary.
fn stop_token_ids(tokenizer: &tokenizers::Tokenizer, template: &ChatTemplate) -> Vec<u32> {
    let mut ids: Vec<u32> = std::iter::once(template.end_of_turn())
        .chain(EOS_TOKENS.iter().copied())
        .filter_map(|token| tokenizer.token_to_id(token))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[async_trait]
impl CompletionProvider for LocalModel {
    fn name(&self) -> &str {
        "local"
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<Option<String>, GeoaskError> {
        let prompt = self.render(messages);
        let inner = Arc::clone(&self.inner);
        let options = options.clone();

        let text = tokio::task::spawn_blocking(move || inner.generate(&prompt, &options))
            .await
            .map_err(|e| GeoaskError::Internal(format!("generation task failed: {e}")))?
            .map_err(|e| GeoaskError::Backend {
                message: "local generation failed".into(),
                source: Some(Box::new(e)),
            })?;
        Ok(Some(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoask_config::model::ChatTemplateKind;

    fn word_level_tokenizer(vocab: &[&str]) -> tokenizers::Tokenizer {
        let vocab = vocab
            .iter()
            .enumerate()
            .map(|(i, t)| format!("\"{t}\": {i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let json = format!(
            r#"{{"version":"1.0","truncation":null,"padding":null,"added_tokens":[],
            "normalizer":null,"pre_tokenizer":{{"type":"Whitespace"}},"post_processor":null,
            "decoder":null,"model":{{"type":"WordLevel","vocab":{{{vocab}}},"unk_token":"<unk>"}}}}"#
        );
        tokenizers::Tokenizer::from_bytes(json.as_bytes()).unwrap()
    }

    #[test]
    fn last_row_of_logits() {
        let data = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(last_row(&data, 3), Some(&data[3..]));
        assert_eq!(last_row(&data, 0), None);
        assert_eq!(last_row(&[1.0], 2), None);
    }

    #[test]
    fn stop_ids_include_end_of_turn_and_eos() {
        let tokenizer = word_level_tokenizer(&["<unk>", "<|im_end|>", "SELECT", "</s>", "<eos>"]);
        let ids = stop_token_ids(&tokenizer, &ChatTemplate::new(ChatTemplateKind::ChatMl));
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn stop_ids_skip_tokens_missing_from_vocab() {
        let tokenizer = word_level_tokenizer(&["<unk>", "SELECT"]);
        let ids = stop_token_ids(&tokenizer, &ChatTemplate::new(ChatTemplateKind::Llama3));
        assert!(ids.is_empty());
    }
}
