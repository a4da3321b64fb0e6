// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local completion backend for geoask.
//!
//! Loads an ONNX causal language model and its tokenizer (downloaded from
//! the model hub on first run) and generates text on CPU. Generation runs on
//! a blocking thread; the session is shared behind a mutex.

pub mod chat_template;
pub mod generator;
pub mod model_manager;
pub mod sampling;

pub use chat_template::ChatTemplate;
pub use generator::LocalModel;
pub use model_manager::{ModelManager, ModelSource};
