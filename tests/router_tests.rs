// Integration tests for the per-session router
//
// These tests drive a router through its handle the way the WebSocket
// layer does and verify transcript contents, broadcast order and error
// reporting.

mod common;

use anyhow::Result;
use base64::Engine;
use common::{deps_with, deps_with_store, drain, event_types, registry, FixedGenerator, FlakyStore};
use interview_orchestrator::error::SessionError;
use interview_orchestrator::gateway::DEFAULT_FALLBACK_RESPONSE;
use interview_orchestrator::router::{InboundEvent, OutboundEvent, RouterSettings, SessionRegistry};
use interview_orchestrator::session::{
    Capabilities, LifecycleInput, SessionConfig, SessionState, Transition,
};
use interview_orchestrator::signals::SignalClass;
use interview_orchestrator::transcript::{MessageKind, SenderRole};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn candidate(content: &str) -> InboundEvent {
    InboundEvent::CandidateMessage {
        content: content.to_string(),
    }
}

#[tokio::test]
async fn test_start_message_end_scenario() -> Result<()> {
    let registry = registry();
    let router = registry.schedule(SessionConfig::new("s1")).await?;
    let mut client = router.attach().await?;

    router.send(Some(client.client_id), InboundEvent::StartInterview).await?;
    router.send(Some(client.client_id), candidate("Hi")).await?;
    router.send(Some(client.client_id), InboundEvent::EndInterview).await?;

    let transcript = registry.deps().transcripts.list("s1").await?;
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[0].kind, MessageKind::System);
    assert_eq!(transcript[1].sender, SenderRole::Candidate);
    assert_eq!(transcript[1].content, "Hi");
    assert_eq!(transcript[2].sender, SenderRole::Interviewer);
    assert_eq!(transcript[2].content, "Follow-up question?");

    let events = drain(&mut client.events);
    assert_eq!(
        event_types(&events),
        vec![
            "connection_established",
            "interview_started",
            "message",
            "message",
            "interview_ended"
        ]
    );

    let stats = router.stats().await?;
    assert_eq!(stats.state, SessionState::Completed);
    Ok(())
}

#[tokio::test]
async fn test_end_produces_score() -> Result<()> {
    let registry = registry();
    let router = registry.schedule(SessionConfig::new("scored")).await?;

    router.send(None, InboundEvent::StartInterview).await?;
    router.send(None, candidate("I have shipped three products")).await?;
    router.send(None, InboundEvent::EndInterview).await?;

    // Scoring runs in the background after the session completes
    let scores = registry.deps().aggregator.scores().clone();
    let mut score = None;
    for _ in 0..50 {
        score = scores.get("scored").await;
        if score.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let score = score.expect("score should be stored after end");
    assert_eq!(score.session_id, "scored");
    Ok(())
}

#[tokio::test]
async fn test_generator_timeout_uses_fallback() -> Result<()> {
    let deps = deps_with(
        Arc::new(FixedGenerator::slow("Too late", Duration::from_millis(500))),
        RouterSettings::default(),
    );
    let registry = SessionRegistry::new(deps);
    let router = registry.schedule(SessionConfig::new("slow")).await?;

    router.send(None, InboundEvent::StartInterview).await?;
    router.send(None, candidate("Hello")).await?;

    let transcript = registry.deps().transcripts.list("slow").await?;
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[2].content, DEFAULT_FALLBACK_RESPONSE);
    Ok(())
}

#[tokio::test]
async fn test_clients_observe_identical_order() -> Result<()> {
    let registry = registry();
    let router = registry.schedule(SessionConfig::new("shared")).await?;
    let mut first = router.attach().await?;
    let mut second = router.attach().await?;

    router.send(Some(first.client_id), InboundEvent::StartInterview).await?;

    // Interleave senders from concurrent tasks
    let mut handles = Vec::new();
    for i in 0..5 {
        let router = router.clone();
        let client = if i % 2 == 0 {
            first.client_id
        } else {
            second.client_id
        };
        handles.push(tokio::spawn(async move {
            router
                .send(Some(client), candidate(&format!("answer {}", i)))
                .await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let first_events = drain(&mut first.events);
    let second_events = drain(&mut second.events);

    let sequences = |events: &[OutboundEvent]| -> Vec<u64> {
        events
            .iter()
            .filter_map(|e| match e {
                OutboundEvent::Message { sequence, .. } => Some(*sequence),
                _ => None,
            })
            .collect()
    };

    let expected: Vec<u64> = (2..=11).collect();
    assert_eq!(sequences(&first_events), expected);
    assert_eq!(sequences(&second_events), expected);
    Ok(())
}

#[tokio::test]
async fn test_start_twice_reports_error_to_sender_only() -> Result<()> {
    let registry = registry();
    let router = registry.schedule(SessionConfig::new("twice")).await?;
    let mut sender = router.attach().await?;
    let mut observer = router.attach().await?;

    router.send(Some(sender.client_id), InboundEvent::StartInterview).await?;
    drain(&mut sender.events);
    drain(&mut observer.events);

    let err = router
        .send(Some(sender.client_id), InboundEvent::StartInterview)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::InvalidTransition { .. }));

    let events = drain(&mut sender.events);
    match events.as_slice() {
        [OutboundEvent::Error { code, .. }] => assert_eq!(code, "invalid_transition"),
        other => panic!("expected a single error event, got {:?}", other),
    }
    assert!(drain(&mut observer.events).is_empty());

    // No duplicate welcome message
    assert_eq!(registry.deps().transcripts.list("twice").await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_end_twice_is_noop() -> Result<()> {
    let registry = registry();
    let router = registry.schedule(SessionConfig::new("end-twice")).await?;
    let mut client = router.attach().await?;

    router.send(None, InboundEvent::StartInterview).await?;
    router.send(None, InboundEvent::EndInterview).await?;
    router.send(None, InboundEvent::EndInterview).await?;

    let events = drain(&mut client.events);
    let ended = event_types(&events)
        .into_iter()
        .filter(|t| *t == "interview_ended")
        .count();
    assert_eq!(ended, 1);
    Ok(())
}

#[tokio::test]
async fn test_message_after_end_is_rejected() -> Result<()> {
    let registry = registry();
    let router = registry.schedule(SessionConfig::new("closed")).await?;
    let mut client = router.attach().await?;

    router.send(None, InboundEvent::StartInterview).await?;
    router.send(None, InboundEvent::EndInterview).await?;
    drain(&mut client.events);

    let err = router
        .send(Some(client.client_id), candidate("one more thing"))
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::SessionClosed(SessionState::Completed));

    let events = drain(&mut client.events);
    assert_eq!(event_types(&events), vec!["error"]);

    // Only the welcome message was stored
    assert_eq!(registry.deps().transcripts.list("closed").await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_message_before_start_is_rejected() -> Result<()> {
    let registry = registry();
    let router = registry.schedule(SessionConfig::new("early")).await?;

    let err = router.send(None, candidate("hello?")).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidTransition {
            from: SessionState::Scheduled,
            ..
        }
    ));
    assert!(registry.deps().transcripts.list("early").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_late_attach_gets_no_replay() -> Result<()> {
    let registry = registry();
    let router = registry.schedule(SessionConfig::new("late")).await?;

    router.send(None, InboundEvent::StartInterview).await?;
    router.send(None, candidate("early answer")).await?;

    let mut late = router.attach().await?;
    assert_eq!(event_types(&drain(&mut late.events)), vec!["connection_established"]);

    router.send(None, candidate("later answer")).await?;
    let events = drain(&mut late.events);
    match events.first() {
        Some(OutboundEvent::Message {
            content, sequence, ..
        }) => {
            assert_eq!(content, "later answer");
            assert_eq!(*sequence, 4);
        }
        other => panic!("expected a message event, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_lagging_client_is_detached() -> Result<()> {
    let settings = RouterSettings {
        client_buffer: 2,
        ..RouterSettings::default()
    };
    let registry = SessionRegistry::new(deps_with(
        Arc::new(FixedGenerator::new("Next?")),
        settings,
    ));
    let router = registry.schedule(SessionConfig::new("lagging")).await?;
    let mut client = router.attach().await?;

    router.send(None, InboundEvent::StartInterview).await?;
    router.send(None, candidate("first")).await?;

    assert_eq!(router.stats().await?.attached_clients, 0);

    // The detached client sees a gap-free prefix, then the end of the stream
    let mut received = Vec::new();
    while let Some(event) = client.events.recv().await {
        received.push(event);
    }
    assert_eq!(
        event_types(&received),
        vec!["connection_established", "interview_started"]
    );
    Ok(())
}

#[tokio::test]
async fn test_media_ack_goes_to_sender() -> Result<()> {
    let registry = registry();
    let mut config = SessionConfig::new("media");
    config.capabilities = Capabilities {
        video_analysis: false,
        recording: false,
    };
    let router = registry.schedule(config).await?;
    let mut sender = router.attach().await?;
    let mut observer = router.attach().await?;

    router.send(None, InboundEvent::StartInterview).await?;
    drain(&mut sender.events);
    drain(&mut observer.events);

    let pcm = base64::engine::general_purpose::STANDARD.encode([0u8; 320]);
    router
        .send(
            Some(sender.client_id),
            InboundEvent::AudioData {
                data: pcm.clone(),
                timestamp: None,
            },
        )
        .await?;
    router
        .send(
            Some(sender.client_id),
            InboundEvent::VideoFrame {
                data: pcm,
                timestamp: None,
            },
        )
        .await?;
    router
        .send(
            Some(sender.client_id),
            InboundEvent::AudioData {
                data: "not base64!".to_string(),
                timestamp: None,
            },
        )
        .await?;

    let statuses: Vec<String> = drain(&mut sender.events)
        .into_iter()
        .filter_map(|e| match e {
            OutboundEvent::AudioProcessed { status } | OutboundEvent::VideoProcessed { status } => {
                Some(status)
            }
            _ => None,
        })
        .collect();
    assert_eq!(statuses, vec!["received", "disabled", "dropped"]);
    assert!(drain(&mut observer.events).is_empty());

    // Media never touches the transcript
    assert_eq!(registry.deps().transcripts.list("media").await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_audio_reaches_signal_log() -> Result<()> {
    let registry = registry();
    let router = registry.schedule(SessionConfig::new("signals")).await?;
    router.send(None, InboundEvent::StartInterview).await?;

    let pcm = base64::engine::general_purpose::STANDARD.encode([1u8; 64]);
    router
        .send(
            None,
            InboundEvent::AudioData {
                data: pcm,
                timestamp: None,
            },
        )
        .await?;

    // Ingest is asynchronous
    let signals = registry.deps().signals.clone();
    let mut events = Vec::new();
    for _ in 0..50 {
        events = signals.events("signals").await;
        if !events.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].class, SignalClass::Audio);
    Ok(())
}

#[tokio::test]
async fn test_connection_status_is_logged() -> Result<()> {
    let registry = registry();
    let router = registry.schedule(SessionConfig::new("ping")).await?;

    router
        .send(
            None,
            InboundEvent::ConnectionStatus {
                status: "good".to_string(),
                quality: Some(serde_json::json!({"latency_ms": 40})),
            },
        )
        .await?;

    assert_eq!(router.stats().await?.connection_events, 1);
    let events = registry.deps().signals.events("ping").await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].class, SignalClass::Connection);
    Ok(())
}

#[tokio::test]
async fn test_recording_written_on_end() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let settings = RouterSettings {
        recordings_dir: Some(temp_dir.path().to_path_buf()),
        ..RouterSettings::default()
    };
    let registry = SessionRegistry::new(deps_with(
        Arc::new(FixedGenerator::new("Next?")),
        settings,
    ));
    let router = registry.schedule(SessionConfig::new("recorded")).await?;

    router.send(None, InboundEvent::StartInterview).await?;
    let samples: Vec<u8> = [100i16, -100, 200, -200]
        .iter()
        .flat_map(|s| s.to_le_bytes())
        .collect();
    router
        .send(
            None,
            InboundEvent::AudioData {
                data: base64::engine::general_purpose::STANDARD.encode(&samples),
                timestamp: None,
            },
        )
        .await?;
    router.send(None, InboundEvent::EndInterview).await?;

    let path = temp_dir.path().join("recorded-audio.wav");
    let reader = hound::WavReader::open(&path)?;
    assert_eq!(reader.spec().sample_rate, 16000);
    assert_eq!(reader.len(), 4);
    Ok(())
}

#[tokio::test]
async fn test_unknown_event_is_ignored() -> Result<()> {
    let registry = registry();
    let router = registry.schedule(SessionConfig::new("unknown")).await?;
    let mut client = router.attach().await?;
    drain(&mut client.events);

    router
        .send(
            Some(client.client_id),
            InboundEvent::parse(r#"{"type":"telemetry","x":1}"#),
        )
        .await?;
    router
        .send(Some(client.client_id), InboundEvent::parse("not json"))
        .await?;

    assert!(drain(&mut client.events).is_empty());
    assert_eq!(router.stats().await?.state, SessionState::Scheduled);
    Ok(())
}

#[tokio::test]
async fn test_lifecycle_inputs_through_handle() -> Result<()> {
    let registry = registry();
    let router = registry.schedule(SessionConfig::new("lifecycle")).await?;
    let mut client = router.attach().await?;

    assert!(router.lifecycle(LifecycleInput::Invite).await?.is_applied());
    assert!(router.lifecycle(LifecycleInput::Cancel).await?.is_applied());
    assert_eq!(
        router.lifecycle(LifecycleInput::Cancel).await?,
        Transition::Unchanged
    );

    let events = drain(&mut client.events);
    assert_eq!(
        event_types(&events),
        vec!["connection_established", "interview_cancelled"]
    );
    Ok(())
}

#[tokio::test]
async fn test_duplicate_schedule_is_rejected() -> Result<()> {
    let registry = registry();
    registry.schedule(SessionConfig::new("dup")).await?;

    let err = registry
        .schedule(SessionConfig::new("dup"))
        .await
        .err()
        .expect("second schedule should fail");
    assert_eq!(err, SessionError::DuplicateSession("dup".to_string()));

    assert!(matches!(
        registry.get("nope").await.err(),
        Some(SessionError::SessionNotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_terminal_router_stops_after_idle_timeout() -> Result<()> {
    let settings = RouterSettings {
        idle_timeout: Duration::from_millis(50),
        ..RouterSettings::default()
    };
    let registry = SessionRegistry::new(deps_with(
        Arc::new(FixedGenerator::new("Next?")),
        settings,
    ));
    let router = registry.schedule(SessionConfig::new("idle")).await?;
    router.lifecycle(LifecycleInput::Cancel).await?;

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(router.is_closed());
    assert_eq!(registry.sweep().await, 1);
    assert!(registry.is_empty().await);
    assert_eq!(registry.deps().archive.len().await, 1);
    Ok(())
}

fn idle_registry() -> SessionRegistry {
    let settings = RouterSettings {
        idle_timeout: Duration::from_millis(50),
        ..RouterSettings::default()
    };
    SessionRegistry::new(deps_with(Arc::new(FixedGenerator::new("Next?")), settings))
}

#[tokio::test]
async fn test_completed_session_survives_router_exit() -> Result<()> {
    let registry = idle_registry();
    let router = registry.schedule(SessionConfig::new("S1")).await?;
    router.send(None, InboundEvent::StartInterview).await?;
    router.send(None, InboundEvent::EndInterview).await?;

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(router.is_closed());

    let stats = registry.status("S1").await?;
    assert_eq!(stats.state, SessionState::Completed);
    assert!(stats.started_at.is_some());
    assert!(stats.ended_at.is_some());

    assert_eq!(
        registry.get("S1").await.err(),
        Some(SessionError::SessionClosed(SessionState::Completed))
    );
    Ok(())
}

#[tokio::test]
async fn test_finished_id_cannot_be_rescheduled() -> Result<()> {
    let registry = idle_registry();
    let router = registry.schedule(SessionConfig::new("S1")).await?;
    router.send(None, InboundEvent::StartInterview).await?;
    router.send(None, InboundEvent::EndInterview).await?;

    tokio::time::sleep(Duration::from_millis(200)).await;
    registry.sweep().await;

    assert_eq!(
        registry.schedule(SessionConfig::new("S1")).await.err(),
        Some(SessionError::DuplicateSession("S1".to_string()))
    );

    // The old transcript is untouched
    let transcript = registry.deps().transcripts.list("S1").await?;
    assert_eq!(transcript.len(), 1);
    assert_eq!(transcript[0].kind, MessageKind::System);
    Ok(())
}

#[tokio::test]
async fn test_schedule_rejects_unsafe_ids() -> Result<()> {
    let registry = registry();

    for id in ["../escaped", "a.b", "has space", ""] {
        assert_eq!(
            registry.schedule(SessionConfig::new(id)).await.err(),
            Some(SessionError::InvalidSessionId(id.to_string())),
            "{:?} should be rejected",
            id
        );
    }
    assert!(registry.is_empty().await);

    registry.schedule(SessionConfig::new("interview_42-b")).await?;
    Ok(())
}

#[tokio::test]
async fn test_failed_start_leaves_session_scheduled() -> Result<()> {
    let store = Arc::new(FlakyStore::default());
    let registry = SessionRegistry::new(deps_with_store(
        store.clone(),
        Arc::new(FixedGenerator::new("Next?")),
        RouterSettings::default(),
    ));
    let router = registry.schedule(SessionConfig::new("s1")).await?;
    let mut client = router.attach().await?;
    drain(&mut client.events);

    store.set_fail_appends(true);
    let err = router
        .send(Some(client.client_id), InboundEvent::StartInterview)
        .await
        .err()
        .expect("start should fail");
    assert!(matches!(err, SessionError::Persistence(_)));
    assert_eq!(router.stats().await?.state, SessionState::Scheduled);
    assert!(registry.deps().transcripts.list("s1").await?.is_empty());

    let events = drain(&mut client.events);
    assert_eq!(event_types(&events), vec!["error"]);
    match &events[0] {
        OutboundEvent::Error { code, .. } => assert_eq!(code, "persistence_error"),
        other => panic!("unexpected event: {:?}", other),
    }

    // Retry succeeds with the first sequence number
    store.set_fail_appends(false);
    router.send(Some(client.client_id), InboundEvent::StartInterview).await?;
    assert_eq!(router.stats().await?.state, SessionState::InProgress);
    let transcript = registry.deps().transcripts.list("s1").await?;
    assert_eq!(transcript.len(), 1);
    assert_eq!(transcript[0].sequence, 1);
    Ok(())
}

#[tokio::test]
async fn test_failed_answer_append_is_retryable() -> Result<()> {
    let store = Arc::new(FlakyStore::default());
    let registry = SessionRegistry::new(deps_with_store(
        store.clone(),
        Arc::new(FixedGenerator::new("Next?")),
        RouterSettings::default(),
    ));
    let router = registry.schedule(SessionConfig::new("s1")).await?;
    router.send(None, InboundEvent::StartInterview).await?;

    store.set_fail_appends(true);
    assert!(router.send(None, candidate("lost")).await.is_err());
    assert_eq!(registry.deps().transcripts.list("s1").await?.len(), 1);

    store.set_fail_appends(false);
    router.send(None, candidate("again")).await?;
    let transcript = registry.deps().transcripts.list("s1").await?;
    let sequences: Vec<u64> = transcript.iter().map(|m| m.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
    assert_eq!(transcript[1].content, "again");
    Ok(())
}

#[tokio::test]
async fn test_transcript_read_failure_still_gets_followup() -> Result<()> {
    let store = Arc::new(FlakyStore::default());
    let registry = SessionRegistry::new(deps_with_store(
        store.clone(),
        Arc::new(FixedGenerator::new("Next?")),
        RouterSettings::default(),
    ));
    let router = registry.schedule(SessionConfig::new("s1")).await?;
    let mut client = router.attach().await?;
    router.send(None, InboundEvent::StartInterview).await?;
    drain(&mut client.events);

    store.set_fail_reads(true);
    router.send(None, candidate("My answer")).await?;
    store.set_fail_reads(false);

    let events = drain(&mut client.events);
    assert_eq!(event_types(&events), vec!["message", "message"]);

    let transcript = registry.deps().transcripts.list("s1").await?;
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[1].content, "My answer");
    assert_eq!(transcript[2].kind, MessageKind::Followup);
    assert_eq!(transcript[2].content, DEFAULT_FALLBACK_RESPONSE);
    Ok(())
}
