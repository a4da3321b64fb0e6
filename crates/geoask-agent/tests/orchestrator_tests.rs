// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the question answering loop.

use std::sync::Arc;
use std::time::Duration;

use geoask_agent::{FailureStage, Orchestrator, OrchestratorSettings, Outcome};
use geoask_core::{ExecutionFeedback, RetrievalStore, Role, SqlOrigin};
use geoask_prompt::PromptBuilder;
use geoask_test_utils::{InMemoryStore, MockExecutor, MockProvider, MockReply};

const DDL: &str = "CREATE TABLE descarregues (id INT, format TEXT, data DATE);";

async fn store_with_schema() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.add_ddl(DDL).await.unwrap();
    store
        .add_documentation("format holds the file format of a download")
        .await
        .unwrap();
    store
}

fn build(
    store: &InMemoryStore,
    provider: &MockProvider,
    settings: OrchestratorSettings,
) -> Orchestrator {
    Orchestrator::new(
        Arc::new(store.clone()),
        Arc::new(provider.clone()),
        PromptBuilder::new("PostgreSQL", "Use only the geoportal tables."),
        settings,
    )
}

fn stage(outcome: &Outcome) -> Option<FailureStage> {
    match outcome {
        Outcome::Failed { stage, .. } => Some(*stage),
        Outcome::Answered(_) => None,
    }
}

#[tokio::test]
async fn cache_hit_never_calls_backend() {
    let store = store_with_schema().await;
    store
        .add_pair("How many downloads?", "SELECT COUNT(*) FROM descarregues;")
        .await
        .unwrap();
    let provider = MockProvider::new();
    let orch = build(&store, &provider, OrchestratorSettings::default());

    let outcome = orch.answer("how many   DOWNLOADS?", true).await;
    let answer = outcome.answer().expect("cache hit");

    assert_eq!(answer.sql.origin, SqlOrigin::Cache);
    assert_eq!(answer.sql.sanitized, "SELECT COUNT(*) FROM descarregues;");
    assert_eq!(answer.attempts, 0);
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn generated_sql_is_sanitized() {
    let store = store_with_schema().await;
    let provider = MockProvider::with_responses(vec![
        "Sure! Here it is:\n```sql\nSELECT COUNT(*) AS any FROM descarregues;\n```".into(),
    ]);
    let orch = build(&store, &provider, OrchestratorSettings::default());

    let outcome = orch.answer("How many downloads?", true).await;
    let answer = outcome.answer().expect("answered");

    assert_eq!(answer.sql.origin, SqlOrigin::Generated);
    assert_eq!(answer.sql.sanitized, "SELECT COUNT(*) AS y FROM descarregues;");
    assert!(answer.sql.raw_text.starts_with("Sure!"));
    assert_eq!(answer.sql.source_question, "How many downloads?");
    assert!(answer.rows.is_none());
    assert!(!answer.persisted);
}

#[tokio::test]
async fn prompt_carries_schema_and_question() {
    let store = store_with_schema().await;
    store
        .add_pair("Downloads by format", "SELECT format, COUNT(*) FROM descarregues GROUP BY format;")
        .await
        .unwrap();
    let provider = MockProvider::new();
    let orch = build(&store, &provider, OrchestratorSettings::default());

    orch.answer("Downloads in 2024", true).await;

    let requests = provider.requests().await;
    let messages = &requests[0];
    assert_eq!(messages[0].role, Role::System);
    assert!(messages[0].content.contains("===Tables"));
    assert!(messages[0].content.contains(DDL));
    assert!(messages[0].content.contains("===Additional Context"));
    assert_eq!(messages.len(), 4);
    let last = messages.last().unwrap();
    assert_eq!(last.role, Role::User);
    assert_eq!(last.content, "Downloads in 2024");
}

#[tokio::test]
async fn backend_failure_stores_nothing() {
    let store = store_with_schema().await;
    let provider = MockProvider::with_replies(vec![MockReply::Error("connection refused".into())]);
    let executor = MockExecutor::new();
    let orch = build(&store, &provider, OrchestratorSettings::default())
        .with_executor(Arc::new(executor.clone()));

    let outcome = orch.answer("How many downloads?", true).await;

    assert_eq!(stage(&outcome), Some(FailureStage::Backend));
    assert_eq!(store.add_pair_count(), 0);
    assert!(executor.executed().await.is_empty());
}

#[tokio::test]
async fn empty_reply_is_a_failure() {
    let store = store_with_schema().await;
    let provider = MockProvider::with_replies(vec![MockReply::Empty]);
    let orch = build(&store, &provider, OrchestratorSettings::default());

    let outcome = orch.answer("q", true).await;
    assert_eq!(stage(&outcome), Some(FailureStage::EmptyReply));
}

#[tokio::test]
async fn missing_schema_fails_before_backend() {
    let store = InMemoryStore::new();
    let provider = MockProvider::new();
    let orch = build(&store, &provider, OrchestratorSettings::default());

    let outcome = orch.answer("How many downloads?", true).await;

    assert_eq!(stage(&outcome), Some(FailureStage::Context));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_backend_times_out() {
    let store = store_with_schema().await;
    let provider = MockProvider::with_replies(vec![MockReply::Delayed(
        Duration::from_secs(60),
        "SELECT 1;".into(),
    )]);
    let settings = OrchestratorSettings {
        timeout: Duration::from_secs(1),
        ..OrchestratorSettings::default()
    };
    let orch = build(&store, &provider, settings);

    let outcome = orch.answer("q", true).await;

    assert_eq!(stage(&outcome), Some(FailureStage::Timeout));
    assert_eq!(store.add_pair_count(), 0);
}

#[tokio::test]
async fn successful_execution_with_rows_is_stored() {
    let store = store_with_schema().await;
    let provider = MockProvider::with_responses(vec!["SELECT id FROM descarregues;".into()]);
    let executor = MockExecutor::new();
    executor.push_rows(2).await;
    let orch = build(&store, &provider, OrchestratorSettings::default())
        .with_executor(Arc::new(executor.clone()));

    let outcome = orch.answer("List downloads", true).await;
    let answer = outcome.answer().expect("answered");

    assert_eq!(answer.rows.as_ref().map(|r| r.len()), Some(2));
    assert!(answer.persisted);
    assert_eq!(
        store.pairs().await,
        vec![(
            "List downloads".to_string(),
            "SELECT id FROM descarregues;".to_string()
        )]
    );
}

#[tokio::test]
async fn empty_result_is_not_stored() {
    let store = store_with_schema().await;
    let provider = MockProvider::with_responses(vec!["SELECT id FROM descarregues;".into()]);
    let executor = MockExecutor::new();
    executor.push_rows(0).await;
    let orch = build(&store, &provider, OrchestratorSettings::default())
        .with_executor(Arc::new(executor));

    let outcome = orch.answer("List downloads", true).await;

    assert!(!outcome.answer().expect("answered").persisted);
    assert_eq!(store.add_pair_count(), 0);
}

#[tokio::test]
async fn auto_train_off_stores_nothing() {
    let store = store_with_schema().await;
    let provider = MockProvider::with_responses(vec!["SELECT id FROM descarregues;".into()]);
    let executor = MockExecutor::new();
    executor.push_rows(5).await;
    let settings = OrchestratorSettings {
        auto_train: false,
        ..OrchestratorSettings::default()
    };
    let orch = build(&store, &provider, settings).with_executor(Arc::new(executor));

    orch.answer("List downloads", true).await;
    assert_eq!(store.add_pair_count(), 0);
}

#[tokio::test]
async fn failed_execution_is_retried_with_feedback() {
    let store = store_with_schema().await;
    let provider = MockProvider::with_responses(vec![
        "SELECT idd FROM descarregues;".into(),
        "SELECT id FROM descarregues;".into(),
    ]);
    let executor = MockExecutor::new();
    executor.push_error("no such column: idd").await;
    executor.push_rows(1).await;
    let orch = build(&store, &provider, OrchestratorSettings::default())
        .with_executor(Arc::new(executor.clone()));

    let outcome = orch.answer("List downloads", true).await;
    let answer = outcome.answer().expect("second attempt succeeds");

    assert_eq!(answer.attempts, 2);
    assert_eq!(answer.sql.sanitized, "SELECT id FROM descarregues;");
    assert_eq!(provider.call_count(), 2);

    let requests = provider.requests().await;
    assert!(!requests[0][0].content.contains("===Previous Error"));
    assert!(requests[1][0].content.contains("===Previous Error"));
    assert!(requests[1][0].content.contains("no such column: idd"));

    assert_eq!(
        store.pairs().await,
        vec![(
            "List downloads".to_string(),
            "SELECT id FROM descarregues;".to_string()
        )]
    );
}

#[tokio::test]
async fn failed_execution_without_retry_stores_nothing() {
    let store = store_with_schema().await;
    let provider = MockProvider::with_responses(vec!["SELECT idd FROM descarregues;".into()]);
    let executor = MockExecutor::new();
    executor.push_error("no such column: idd").await;
    let orch = build(&store, &provider, OrchestratorSettings::default())
        .with_executor(Arc::new(executor));

    let outcome = orch.answer("List downloads", false).await;

    match outcome {
        Outcome::Failed { stage, message } => {
            assert_eq!(stage, FailureStage::Execution);
            assert_eq!(message, "no such column: idd");
        }
        Outcome::Answered(_) => panic!("execution should fail"),
    }
    assert_eq!(provider.call_count(), 1);
    assert_eq!(store.add_pair_count(), 0);
}

#[tokio::test]
async fn retries_stop_after_limit() {
    let store = store_with_schema().await;
    let provider = MockProvider::new();
    let executor = MockExecutor::new();
    for _ in 0..4 {
        executor.push_error("syntax error").await;
    }
    let settings = OrchestratorSettings {
        max_retries: 2,
        ..OrchestratorSettings::default()
    };
    let orch = build(&store, &provider, settings).with_executor(Arc::new(executor.clone()));

    let outcome = orch.answer("q", true).await;

    assert_eq!(stage(&outcome), Some(FailureStage::Execution));
    assert_eq!(provider.call_count(), 3);
    assert_eq!(executor.executed().await.len(), 3);
    assert_eq!(store.add_pair_count(), 0);
}

#[tokio::test]
async fn lost_connection_is_not_retried() {
    let store = store_with_schema().await;
    let provider = MockProvider::new();
    let executor = MockExecutor::new();
    executor.push_connection_error().await;
    let orch = build(&store, &provider, OrchestratorSettings::default())
        .with_executor(Arc::new(executor.clone()));

    let outcome = orch.answer("q", true).await;

    match &outcome {
        Outcome::Failed { stage, message } => {
            assert_eq!(*stage, FailureStage::Execution);
            assert!(message.contains("connection reset"), "got: {message}");
        }
        Outcome::Answered(_) => panic!("expected failure"),
    }
    assert_eq!(provider.call_count(), 1);
    assert_eq!(executor.executed().await.len(), 1);
    assert_eq!(store.add_pair_count(), 0);
}

#[tokio::test]
async fn confirm_stores_only_successful_sql() {
    let store = store_with_schema().await;
    let provider = MockProvider::with_responses(vec![
        "SELECT id FROM descarregues;".into(),
        "SELECT format FROM descarregues;".into(),
    ]);
    let orch = build(&store, &provider, OrchestratorSettings::default());

    let first = orch.answer("List downloads", true).await;
    let first = &first.answer().expect("answered").sql;
    let stored = orch
        .confirm(
            first,
            ExecutionFeedback::Failure {
                message: "permission denied".into(),
            },
        )
        .await
        .unwrap();
    assert!(!stored);
    assert_eq!(store.add_pair_count(), 0);

    let second = orch.answer("List formats", true).await;
    let second = &second.answer().expect("answered").sql;
    let stored = orch
        .confirm(second, ExecutionFeedback::Success { row_count: 4 })
        .await
        .unwrap();
    assert!(stored);
    assert_eq!(store.find_similar("list formats").await.unwrap().len(), 1);
}

#[tokio::test]
async fn confirming_cached_sql_does_not_duplicate() {
    let store = store_with_schema().await;
    store.add_pair("q", "SELECT 1;").await.unwrap();
    let provider = MockProvider::new();
    let orch = build(&store, &provider, OrchestratorSettings::default());

    let outcome = orch.answer("q", true).await;
    let generated = &outcome.answer().expect("cache hit").sql;
    let stored = orch
        .confirm(generated, ExecutionFeedback::Success { row_count: 1 })
        .await
        .unwrap();

    assert!(!stored);
    assert_eq!(store.add_pair_count(), 1);
}

#[tokio::test]
async fn regenerate_skips_cache_and_passes_feedback() {
    let store = store_with_schema().await;
    store.add_pair("q", "SELECT 1;").await.unwrap();
    let provider = MockProvider::with_responses(vec!["SELECT 2;".into()]);
    let orch = build(&store, &provider, OrchestratorSettings::default());

    let outcome = orch.regenerate("q", Some("wrong answer")).await;
    let answer = outcome.answer().expect("answered");

    assert_eq!(answer.sql.origin, SqlOrigin::Generated);
    assert_eq!(answer.sql.sanitized, "SELECT 2;");
    assert_eq!(provider.call_count(), 1);
    assert!(provider.requests().await[0][0].content.contains("wrong answer"));
}
