// Integration tests for transcript stores
//
// Both stores must assign 1-based, gap-free sequence numbers and return
// messages in ascending sequence order. The JSONL store must also survive
// a restart and a torn trailing line.

use anyhow::Result;
use interview_orchestrator::error::SessionError;
use interview_orchestrator::transcript::{
    DraftMessage, InMemoryTranscriptStore, JsonlTranscriptStore, MessageKind, SenderRole,
    TranscriptStore,
};
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_append_assigns_sequential_numbers() -> Result<()> {
    let store = InMemoryTranscriptStore::new();
    store.register("s1").await?;

    let welcome = store.append("s1", DraftMessage::system("Welcome")).await?;
    let answer = store.append("s1", DraftMessage::answer("Hi")).await?;
    let followup = store.append("s1", DraftMessage::followup("Tell me more")).await?;

    assert_eq!(welcome.sequence, 1);
    assert_eq!(answer.sequence, 2);
    assert_eq!(followup.sequence, 3);

    assert_eq!(answer.sender, SenderRole::Candidate);
    assert_eq!(answer.kind, MessageKind::Answer);
    assert_eq!(followup.sender, SenderRole::Interviewer);

    let messages = store.list("s1").await?;
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["Welcome", "Hi", "Tell me more"]);
    Ok(())
}

#[tokio::test]
async fn test_sessions_have_independent_sequences() -> Result<()> {
    let store = InMemoryTranscriptStore::new();
    store.register("a").await?;
    store.register("b").await?;

    store.append("a", DraftMessage::answer("a1")).await?;
    store.append("a", DraftMessage::answer("a2")).await?;
    let b1 = store.append("b", DraftMessage::answer("b1")).await?;

    assert_eq!(b1.sequence, 1);
    assert_eq!(store.list("a").await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_unknown_session_is_rejected() {
    let store = InMemoryTranscriptStore::new();
    let err = store
        .append("missing", DraftMessage::answer("hello"))
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::SessionNotFound("missing".to_string()));
}

#[tokio::test]
async fn test_register_twice_keeps_messages() -> Result<()> {
    let store = InMemoryTranscriptStore::new();
    store.register("s1").await?;
    store.append("s1", DraftMessage::answer("kept")).await?;
    store.register("s1").await?;

    assert_eq!(store.list("s1").await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_appends_are_gap_free() -> Result<()> {
    let store = Arc::new(InMemoryTranscriptStore::new());
    store.register("s1").await?;

    let mut handles = Vec::new();
    for i in 0..50 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .append("s1", DraftMessage::answer(format!("message {}", i)))
                .await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let messages = store.list("s1").await?;
    assert_eq!(messages.len(), 50);

    let sequences: Vec<u64> = messages.iter().map(|m| m.sequence).collect();
    let expected: Vec<u64> = (1..=50).collect();
    assert_eq!(sequences, expected, "sequences must be 1..=n in order");

    let contents: HashSet<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents.len(), 50, "no append may be lost");
    Ok(())
}

#[tokio::test]
async fn test_recent_returns_tail_in_order() -> Result<()> {
    let store = InMemoryTranscriptStore::new();
    store.register("s1").await?;
    for i in 1..=5 {
        store.append("s1", DraftMessage::answer(format!("m{}", i))).await?;
    }

    let recent = store.recent("s1", 2).await?;
    let sequences: Vec<u64> = recent.iter().map(|m| m.sequence).collect();
    assert_eq!(sequences, vec![4, 5]);

    assert_eq!(store.recent("s1", 10).await?.len(), 5);
    Ok(())
}

#[tokio::test]
async fn test_jsonl_store_replays_after_restart() -> Result<()> {
    let temp_dir = TempDir::new()?;

    {
        let store = JsonlTranscriptStore::open(temp_dir.path()).await?;
        store.register("interview-1").await?;
        store.append("interview-1", DraftMessage::system("Welcome")).await?;
        store
            .append(
                "interview-1",
                DraftMessage::answer("I built a compiler").with_score(8.5),
            )
            .await?;
    }

    // Verify: file exists with one line per message
    let path = temp_dir.path().join("interview-1.jsonl");
    let content = std::fs::read_to_string(&path)?;
    assert_eq!(content.lines().count(), 2);

    let reopened = JsonlTranscriptStore::open(temp_dir.path()).await?;
    reopened.register("interview-1").await?;

    let messages = reopened.list("interview-1").await?;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].score, Some(8.5));

    let next = reopened
        .append("interview-1", DraftMessage::followup("Which language?"))
        .await?;
    assert_eq!(next.sequence, 3, "sequence continues after replay");
    Ok(())
}

#[tokio::test]
async fn test_jsonl_store_drops_torn_trailing_line() -> Result<()> {
    let temp_dir = TempDir::new()?;

    {
        let store = JsonlTranscriptStore::open(temp_dir.path()).await?;
        store.register("s1").await?;
        store.append("s1", DraftMessage::answer("complete")).await?;
    }

    // Simulate a crash mid-write
    let path = temp_dir.path().join("s1.jsonl");
    let mut content = std::fs::read_to_string(&path)?;
    content.push_str("{\"id\":\"partial");
    std::fs::write(&path, content)?;

    let store = JsonlTranscriptStore::open(temp_dir.path()).await?;
    store.register("s1").await?;

    let messages = store.list("s1").await?;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "complete");

    let next = store.append("s1", DraftMessage::answer("after crash")).await?;
    assert_eq!(next.sequence, 2);

    // Every line on disk parses again
    let content = std::fs::read_to_string(&path)?;
    for line in content.lines() {
        serde_json::from_str::<serde_json::Value>(line)?;
    }
    assert_eq!(content.lines().count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_jsonl_store_rejects_ids_unsafe_as_file_names() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = JsonlTranscriptStore::open(temp_dir.path()).await?;

    for id in ["a.b", "../s1", "a/b"] {
        assert_eq!(
            store.register(id).await.unwrap_err(),
            SessionError::InvalidSessionId(id.to_string())
        );
    }

    store.register("a_b").await?;
    store.append("a_b", DraftMessage::answer("from a_b")).await?;
    assert!(matches!(
        store.list("a.b").await,
        Err(SessionError::SessionNotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_jsonl_replay_skips_other_sessions_lines() -> Result<()> {
    let temp_dir = TempDir::new()?;

    {
        let store = JsonlTranscriptStore::open(temp_dir.path()).await?;
        store.register("s1").await?;
        store.register("s2").await?;
        store.append("s1", DraftMessage::answer("from s1")).await?;
        store.append("s2", DraftMessage::answer("from s2")).await?;
    }

    // A line from s2 ends up in s1's file
    let foreign = std::fs::read_to_string(temp_dir.path().join("s2.jsonl"))?;
    let s1_path = temp_dir.path().join("s1.jsonl");
    let mut content = std::fs::read_to_string(&s1_path)?;
    content.push_str(&foreign);
    std::fs::write(&s1_path, content)?;

    let store = JsonlTranscriptStore::open(temp_dir.path()).await?;
    store.register("s1").await?;

    let messages = store.list("s1").await?;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].session_id, "s1");
    assert_eq!(messages[0].content, "from s1");
    Ok(())
}

#[tokio::test]
async fn test_jsonl_failed_append_leaves_log_unchanged() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = JsonlTranscriptStore::open(temp_dir.path()).await?;
    store.register("s1").await?;
    store.append("s1", DraftMessage::system("Welcome")).await?;

    // Make the log path unwritable
    let path = temp_dir.path().join("s1.jsonl");
    std::fs::remove_file(&path)?;
    std::fs::create_dir(&path)?;

    let err = store
        .append("s1", DraftMessage::answer("lost"))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Persistence(_)));

    let messages = store.list("s1").await?;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "Welcome");

    // The caller retries the single failed append
    std::fs::remove_dir(&path)?;
    let retried = store.append("s1", DraftMessage::answer("retried")).await?;
    assert_eq!(retried.sequence, 2);
    assert_eq!(store.list("s1").await?.len(), 2);
    Ok(())
}
