// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `geoask ask` and `geoask shell` command implementations.
//!
//! Both print the SQL for a question (and its rows when execution is
//! enabled), then let the user comment on or correct the result. A comment
//! is merged with the question by the backend and the merged question is
//! answered again. When the database rejects the SQL, the user may have it
//! regenerated with the database error in the prompt.

use colored::Colorize;
use geoask_agent::{Answer, FailureStage, Orchestrator, Outcome};
use geoask_config::GeoaskConfig;
use geoask_core::{ExecutionFeedback, GeoaskError, SqlOrigin};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::{app, render};

const COMMENT_PROMPT: &str = "comment or correct the SQL (Enter to finish)> ";
const REGENERATE_PROMPT: &str = "regenerate the SQL with this error? [y/N] ";

/// Runs `geoask ask`.
pub async fn run_ask(config: &GeoaskConfig, question: Option<String>) -> Result<(), GeoaskError> {
    let orchestrator = app::build_orchestrator(config).await?;
    let mut rl = editor()?;

    let question = match question {
        Some(question) => question,
        None => match read_line(&mut rl, "question> ")? {
            Some(question) if !question.is_empty() => question,
            _ => return Ok(()),
        },
    };

    converse(&orchestrator, &mut rl, question).await
}

/// Runs the `geoask shell` interactive loop.
pub async fn run_shell(config: &GeoaskConfig) -> Result<(), GeoaskError> {
    let orchestrator = app::build_orchestrator(config).await?;
    let mut rl = editor()?;

    println!("{}", "geoask shell".bold().green());
    println!("Type {} to exit.\n", "/quit".yellow());

    let prompt = format!("{}> ", config.agent.name.green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "/quit" || trimmed == "/exit" {
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                if let Err(e) = converse(&orchestrator, &mut rl, trimmed.to_string()).await {
                    eprintln!("{}: {e}", "error".red());
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }
    Ok(())
}

/// Answers a question, then keeps refining it while the user comments.
async fn converse(
    orchestrator: &Orchestrator,
    rl: &mut DefaultEditor,
    mut question: String,
) -> Result<(), GeoaskError> {
    loop {
        let mut outcome = orchestrator.answer(&question, true).await;
        loop {
            match &outcome {
                Outcome::Answered(answer) => {
                    print_answer(answer);
                    if answer.rows.is_none() && answer.sql.origin == SqlOrigin::Generated {
                        offer_to_store(orchestrator, rl, answer).await?;
                    }
                }
                Outcome::Failed { stage, message } => {
                    eprintln!("{} ({stage}): {message}", "failed".red());
                }
            }
            if rejected_sql_error(&outcome).is_none()
                || !is_yes(read_line(rl, REGENERATE_PROMPT)?.as_deref())
            {
                break;
            }
            let next = regenerate_after_rejection(orchestrator, &question, &outcome).await;
            match next {
                Some(next) => outcome = next,
                None => break,
            }
        }

        let comment = match read_line(rl, COMMENT_PROMPT)? {
            Some(comment) if !comment.is_empty() => comment,
            _ => return Ok(()),
        };

        question = match orchestrator.rewrite_question(&question, &comment).await {
            Ok(rewritten) => rewritten,
            Err(e) => {
                eprintln!("{}: {e}", "could not merge comment".red());
                return Ok(());
            }
        };
        println!("{} {question}", "question:".dimmed());
    }
}

/// Without an executor the user is the judge of whether the SQL works.
async fn offer_to_store(
    orchestrator: &Orchestrator,
    rl: &mut DefaultEditor,
    answer: &Answer,
) -> Result<(), GeoaskError> {
    let Some(reply) = read_line(rl, "store as a verified example? [y/N] ")? else {
        return Ok(());
    };
    let feedback = if is_yes(Some(reply.as_str())) {
        ExecutionFeedback::Success { row_count: 0 }
    } else {
        ExecutionFeedback::Failure {
            message: "not confirmed by user".into(),
        }
    };
    if orchestrator.confirm(&answer.sql, feedback).await? {
        println!("{}", "stored".green());
    }
    Ok(())
}

/// The database error of an outcome whose SQL was rejected on execution.
fn rejected_sql_error(outcome: &Outcome) -> Option<&str> {
    match outcome {
        Outcome::Failed {
            stage: FailureStage::Execution,
            message,
        } => Some(message),
        _ => None,
    }
}

/// Generates new SQL for `question` with the database error of `outcome`
/// in the prompt. `None` when `outcome` is not a rejected statement.
async fn regenerate_after_rejection(
    orchestrator: &Orchestrator,
    question: &str,
    outcome: &Outcome,
) -> Option<Outcome> {
    let error = rejected_sql_error(outcome)?;
    println!("{}", "regenerating...".dimmed());
    Some(orchestrator.regenerate(question, Some(error)).await)
}

fn is_yes(reply: Option<&str>) -> bool {
    reply.is_some_and(|r| r.eq_ignore_ascii_case("y") || r.eq_ignore_ascii_case("yes"))
}

fn print_answer(answer: &Answer) {
    if answer.sql.origin == SqlOrigin::Cache {
        println!("{}", "(from stored examples)".dimmed());
    }
    println!("{}", answer.sql.sanitized.cyan());
    if let Some(rows) = &answer.rows {
        println!();
        print!("{}", render::rows_table(rows));
    }
    if answer.persisted {
        println!("{}", "stored as a training example".dimmed());
    }
}

fn editor() -> Result<DefaultEditor, GeoaskError> {
    DefaultEditor::new()
        .map_err(|e| GeoaskError::Internal(format!("failed to initialize readline: {e}")))
}

/// Reads one trimmed line; `None` on Ctrl+C or Ctrl+D.
fn read_line(rl: &mut DefaultEditor, prompt: &str) -> Result<Option<String>, GeoaskError> {
    match rl.readline(prompt) {
        Ok(line) => Ok(Some(line.trim().to_string())),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(e) => Err(GeoaskError::Internal(format!("readline failed: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use geoask_agent::OrchestratorSettings;
    use geoask_core::RetrievalStore;
    use geoask_prompt::PromptBuilder;
    use geoask_test_utils::{InMemoryStore, MockExecutor, MockProvider};

    async fn orchestrator(
        provider: &MockProvider,
        executor: &MockExecutor,
    ) -> Orchestrator {
        let store = InMemoryStore::new();
        store
            .add_ddl("CREATE TABLE descarregues (id INT, format TEXT);")
            .await
            .unwrap();
        Orchestrator::new(
            Arc::new(store),
            Arc::new(provider.clone()),
            PromptBuilder::new("PostgreSQL", ""),
            OrchestratorSettings {
                max_retries: 0,
                ..OrchestratorSettings::default()
            },
        )
        .with_executor(Arc::new(executor.clone()))
    }

    #[test]
    fn only_execution_failures_offer_regeneration() {
        let rejected = Outcome::Failed {
            stage: FailureStage::Execution,
            message: "column \"fmt\" does not exist".into(),
        };
        assert_eq!(
            rejected_sql_error(&rejected),
            Some("column \"fmt\" does not exist")
        );

        let timed_out = Outcome::Failed {
            stage: FailureStage::Timeout,
            message: "backend timed out".into(),
        };
        assert_eq!(rejected_sql_error(&timed_out), None);
    }

    #[test]
    fn yes_answers() {
        assert!(is_yes(Some("y")));
        assert!(is_yes(Some("YES")));
        assert!(!is_yes(Some("")));
        assert!(!is_yes(Some("no")));
        assert!(!is_yes(None));
    }

    #[tokio::test]
    async fn rejected_sql_is_regenerated_with_the_database_error() {
        let provider = MockProvider::with_responses(vec![
            "SELECT fmt FROM descarregues;".into(),
            "SELECT format FROM descarregues;".into(),
        ]);
        let executor = MockExecutor::new();
        executor.push_error("column \"fmt\" does not exist").await;
        executor.push_rows(2).await;
        let orch = orchestrator(&provider, &executor).await;

        let first = orch.answer("formats?", true).await;
        assert!(rejected_sql_error(&first).is_some());

        let second = regenerate_after_rejection(&orch, "formats?", &first)
            .await
            .expect("regenerated");
        let answer = second.answer().expect("answered");
        assert_eq!(answer.sql.sanitized, "SELECT format FROM descarregues;");
        assert_eq!(answer.rows.as_ref().map(|r| r.len()), Some(2));

        assert_eq!(provider.call_count(), 2);
        let requests = provider.requests().await;
        assert!(
            requests[1]
                .iter()
                .any(|m| m.content.contains("column \"fmt\" does not exist"))
        );
        assert_eq!(executor.executed().await.len(), 2);
    }

    #[tokio::test]
    async fn answered_outcome_is_not_regenerated() {
        let provider = MockProvider::new();
        let executor = MockExecutor::new();
        let orch = orchestrator(&provider, &executor).await;

        let outcome = orch.answer("formats?", true).await;
        assert!(outcome.answer().is_some());
        assert!(
            regenerate_after_rejection(&orch, "formats?", &outcome)
                .await
                .is_none()
        );
        assert_eq!(provider.call_count(), 1);
    }
}
