// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat formatting for causal language models.

use geoask_config::model::ChatTemplateKind;
use geoask_core::{Message, Role};

/// Renders role-tagged messages into the text a model was fine-tuned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatTemplate {
    kind: ChatTemplateKind,
}

impl ChatTemplate {
    pub fn new(kind: ChatTemplateKind) -> Self {
        Self { kind }
    }

    /// Whether the format has a dedicated system turn.
    pub fn supports_system_role(&self) -> bool {
        !matches!(self.kind, ChatTemplateKind::Gemma)
    }

    /// Token that closes a turn. Generation stops when the model emits it.
    pub fn end_of_turn(&self) -> &'static str {
        match self.kind {
            ChatTemplateKind::ChatMl => "<|im_end|>",
            ChatTemplateKind::Llama3 => "<|eot_id|>",
            ChatTemplateKind::Gemma => "<end_of_turn>",
        }
    }

    /// Formats `messages` and opens an assistant turn for generation.
    pub fn render(&self, messages: &[Message]) -> String {
        let mut out = String::new();
        match self.kind {
            ChatTemplateKind::ChatMl => {
                for m in messages {
                    out.push_str(&format!("<|im_start|>{}\n{}<|im_end|>\n", m.role, m.content));
                }
                out.push_str("<|im_start|>assistant\n");
            }
            ChatTemplateKind::Llama3 => {
                out.push_str("<|begin_of_text|>");
                for m in messages {
                    out.push_str(&format!(
                        "<|start_header_id|>{}<|end_header_id|>\n\n{}<|eot_id|>",
                        m.role,
                        m.content.trim()
                    ));
                }
                out.push_str("<|start_header_id|>assistant<|end_header_id|>\n\n");
            }
            ChatTemplateKind::Gemma => {
                out.push_str("<bos>");
                for m in messages {
                    let role = match m.role {
                        Role::Assistant => "model",
                        // Unfolded system text is sent as a user turn.
                        Role::User | Role::System => "user",
                    };
                    out.push_str(&format!(
                        "<start_of_turn>{role}\n{}<end_of_turn>\n",
                        m.content.trim()
                    ));
                }
                out.push_str("<start_of_turn>model\n");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages() -> Vec<Message> {
        vec![
            Message::system("S"),
            Message::user("U"),
            Message::assistant("A"),
            Message::user("Q"),
        ]
    }

    #[test]
    fn chatml_render() {
        let text = ChatTemplate::new(ChatTemplateKind::ChatMl).render(&messages());
        assert_eq!(
            text,
            "<|im_start|>system\nS<|im_end|>\n<|im_start|>user\nU<|im_end|>\n\
             <|im_start|>assistant\nA<|im_end|>\n<|im_start|>user\nQ<|im_end|>\n\
             <|im_start|>assistant\n"
        );
    }

    #[test]
    fn llama3_render() {
        let text = ChatTemplate::new(ChatTemplateKind::Llama3).render(&[Message::user("Q")]);
        assert_eq!(
            text,
            "<|begin_of_text|><|start_header_id|>user<|end_header_id|>\n\nQ<|eot_id|>\
             <|start_header_id|>assistant<|end_header_id|>\n\n"
        );
    }

    #[test]
    fn gemma_uses_model_role_and_has_no_system() {
        let template = ChatTemplate::new(ChatTemplateKind::Gemma);
        assert!(!template.supports_system_role());
        let text = template.render(&[Message::user("Q"), Message::assistant("A")]);
        assert_eq!(
            text,
            "<bos><start_of_turn>user\nQ<end_of_turn>\n<start_of_turn>model\nA<end_of_turn>\n\
             <start_of_turn>model\n"
        );
    }

    #[test]
    fn end_of_turn_tokens() {
        assert_eq!(ChatTemplate::new(ChatTemplateKind::ChatMl).end_of_turn(), "<|im_end|>");
        assert_eq!(ChatTemplate::new(ChatTemplateKind::Llama3).end_of_turn(), "<|eot_id|>");
        assert!(ChatTemplate::new(ChatTemplateKind::Llama3).supports_system_role());
    }
}
