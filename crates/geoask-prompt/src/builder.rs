// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message assembly for SQL generation and question rewriting.

use geoask_config::model::AgentConfig;
use geoask_core::{GeoaskError, Message, PromptContext};
use tracing::debug;

use crate::budget::within_budget;
use crate::rulebook::load_instructions;

/// Builds the message sequences sent to a completion backend.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    dialect: String,
    instructions: String,
}

impl PromptBuilder {
    pub fn new(dialect: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
            instructions: instructions.into(),
        }
    }

    /// Creates a builder from agent config, loading instructions from
    /// `instructions_file`, `instructions`, or the built-in rulebook.
    pub async fn from_config(config: &AgentConfig) -> Result<Self, GeoaskError> {
        let instructions = load_instructions(config).await?;
        Ok(Self::new(config.dialect.clone(), instructions))
    }

    pub fn dialect(&self) -> &str {
        &self.dialect
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Assembles the messages for one question.
    ///
    /// Layout:
    /// 1. system: dialect line, instructions, `===Tables` (budgeted DDL),
    ///    `===Additional Context` (budgeted documentation), `===Previous Error`
    ///    when feedback is present, `===Response Guidelines`
    /// 2. one user/assistant pair per well-formed prior example
    /// 3. user: the question, verbatim
    pub fn build(&self, context: &PromptContext) -> Vec<Message> {
        let mut system = format!(
            "You are a {} expert. Generate a SQL query that answers the question. \
             Base your answer only on the context below and follow the response guidelines.\n\n{}\n",
            self.dialect, self.instructions
        );

        let ddl = within_budget(&context.ddl_snippets, context.max_tokens);
        if ddl.len() < context.ddl_snippets.len() {
            debug!(
                kept = ddl.len(),
                dropped = context.ddl_snippets.len() - ddl.len(),
                "DDL section truncated to token budget"
            );
        }
        push_section(&mut system, "===Tables", ddl);

        let docs = within_budget(&context.doc_snippets, context.max_tokens);
        if docs.len() < context.doc_snippets.len() {
            debug!(
                kept = docs.len(),
                dropped = context.doc_snippets.len() - docs.len(),
                "documentation section truncated to token budget"
            );
        }
        push_section(&mut system, "===Additional Context", docs);

        if let Some(ref error) = context.error_feedback {
            system.push_str("\n===Previous Error\n");
            system.push_str(
                "The previous query for this question failed with the error below. \
                 Write a corrected query that avoids it.\n",
            );
            system.push_str(error);
            system.push_str("\n\n");
        }

        system.push_str(&format!(
            "\n===Response Guidelines\n\
             1. Respond with exactly one valid {} statement and nothing else.\n\
             2. Do not explain the query and do not wrap it in Markdown.\n\
             3. Use only the tables, columns and values described above.\n\
             4. End the statement with a semicolon.\n",
            self.dialect
        ));

        let mut messages = Vec::with_capacity(2 + context.prior_examples.len() * 2);
        messages.push(Message::system(system));

        for example in &context.prior_examples {
            match example.pair() {
                Some((question, sql)) => {
                    messages.push(Message::user(question));
                    messages.push(Message::assistant(sql));
                }
                None => debug!("skipping malformed prior example"),
            }
        }

        messages.push(Message::user(context.question.clone()));
        messages
    }

    /// Messages asking the model to merge a question and a follow-up
    /// correction into one self-contained question.
    pub fn rewrite_messages(&self, question: &str, comment: &str) -> Vec<Message> {
        vec![
            Message::system(
                "You merge a question and a follow-up comment about its SQL answer into one \
                 question. Keep every constraint from the original question unless the comment \
                 replaces it, and add what the comment asks for. If the comment is a new, \
                 self-contained question, return it unchanged. Reply with the merged question \
                 only, no explanations. It must be answerable with a single SQL statement.",
            ),
            Message::user(format!("{question}\n\n{comment}")),
        ]
    }
}

fn push_section(out: &mut String, header: &str, snippets: &[String]) {
    if snippets.is_empty() {
        return;
    }
    out.push('\n');
    out.push_str(header);
    out.push('\n');
    for snippet in snippets {
        out.push_str(snippet);
        out.push_str("\n\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoask_core::{QuestionSql, Role};

    fn builder() -> PromptBuilder {
        PromptBuilder::new("PostgreSQL", "RULES")
    }

    fn context() -> PromptContext {
        PromptContext {
            question: "How many downloads in SHP?".into(),
            max_tokens: 1000,
            ..Default::default()
        }
    }

    #[test]
    fn system_first_question_last() {
        let messages = builder().build(&context());
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.starts_with("You are a PostgreSQL expert"));
        assert!(messages[0].content.contains("RULES"));
        let last = messages.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, "How many downloads in SHP?");
    }

    #[test]
    fn examples_become_turn_pairs_and_malformed_are_skipped() {
        let ctx = PromptContext {
            prior_examples: vec![
                QuestionSql::new("q1", "SELECT 1;"),
                QuestionSql {
                    question: Some("broken".into()),
                    sql: None,
                },
                QuestionSql::new("q2", "SELECT 2;"),
            ],
            ..context()
        };
        let messages = builder().build(&ctx);
        assert_eq!(messages.len(), 2 + 2 * 2);
        assert_eq!(messages[1], Message::user("q1"));
        assert_eq!(messages[2], Message::assistant("SELECT 1;"));
        assert_eq!(messages[3], Message::user("q2"));
        assert_eq!(messages[4], Message::assistant("SELECT 2;"));
    }

    #[test]
    fn sections_appear_in_order() {
        let ctx = PromptContext {
            ddl_snippets: vec!["CREATE TABLE descarregues (id int);".into()],
            doc_snippets: vec!["format is the requested file format".into()],
            error_feedback: Some("column \"fmt\" does not exist".into()),
            ..context()
        };
        let system = &builder().build(&ctx)[0].content;
        let tables = system.find("===Tables").unwrap();
        let extra = system.find("===Additional Context").unwrap();
        let error = system.find("===Previous Error").unwrap();
        let guidelines = system.find("===Response Guidelines").unwrap();
        assert!(tables < extra && extra < error && error < guidelines);
        assert!(system.contains("column \"fmt\" does not exist"));
    }

    #[test]
    fn empty_sections_are_omitted() {
        let system = &builder().build(&context())[0].content;
        assert!(!system.contains("===Tables"));
        assert!(!system.contains("===Additional Context"));
        assert!(!system.contains("===Previous Error"));
        assert!(system.contains("===Response Guidelines"));
    }

    #[test]
    fn sections_are_budgeted_independently() {
        let ctx = PromptContext {
            ddl_snippets: vec!["D1".repeat(20), "D2".repeat(20), "D3".repeat(20)],
            doc_snippets: vec!["X1".repeat(20), "X2".repeat(20)],
            max_tokens: 20,
            ..context()
        };
        // Each snippet is 40 chars = 10 tokens; two fit per section.
        let system = &builder().build(&ctx)[0].content;
        assert!(system.contains(&"D1".repeat(20)));
        assert!(system.contains(&"D2".repeat(20)));
        assert!(!system.contains(&"D3".repeat(20)));
        assert!(system.contains(&"X1".repeat(20)));
        assert!(system.contains(&"X2".repeat(20)));
    }

    #[test]
    fn build_is_deterministic() {
        let ctx = PromptContext {
            ddl_snippets: vec!["CREATE TABLE t (a int);".into()],
            prior_examples: vec![QuestionSql::new("q", "SELECT a FROM t;")],
            ..context()
        };
        assert_eq!(builder().build(&ctx), builder().build(&ctx));
    }

    #[test]
    fn rewrite_combines_question_and_comment() {
        let messages = builder().rewrite_messages("Downloads by format", "only in 2025");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "Downloads by format\n\nonly in 2025");
    }

    #[tokio::test]
    async fn from_config_uses_dialect_and_rulebook() {
        let config = AgentConfig {
            dialect: "SQLite".into(),
            ..Default::default()
        };
        let builder = PromptBuilder::from_config(&config).await.unwrap();
        assert_eq!(builder.dialect(), "SQLite");
        assert_eq!(builder.instructions(), crate::GEOPORTAL_RULEBOOK);
    }
}
