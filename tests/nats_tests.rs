use base64::Engine;
use interview_orchestrator::nats::messages::{AnalysisResultMessage, MediaFrameMessage};
use interview_orchestrator::signals::SignalClass;

#[test]
fn test_media_frame_serialization() {
    let msg = MediaFrameMessage {
        session_id: "interview-1".to_string(),
        sequence: 3,
        data: base64::engine::general_purpose::STANDARD.encode([0u8; 100]),
        timestamp: "2025-10-27T14:30:00Z".to_string(),
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("interview-1"));
    assert!(json.contains("\"sequence\":3"));

    let deserialized: MediaFrameMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.session_id, "interview-1");
    assert_eq!(deserialized.sequence, 3);
    assert_eq!(
        base64::engine::general_purpose::STANDARD
            .decode(&deserialized.data)
            .unwrap()
            .len(),
        100
    );
}

#[test]
fn test_audio_result_deserialization() {
    let json = r#"{
        "session_id": "interview-1",
        "class": "audio",
        "timestamp": "2025-10-27T14:30:05Z",
        "payload": {"transcript": "I led the migration", "confidence": 0.95}
    }"#;

    let msg: AnalysisResultMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.session_id, "interview-1");
    assert_eq!(msg.class, SignalClass::Audio);

    let event = msg.into_event();
    assert_eq!(event.class, SignalClass::Audio);
    assert_eq!(event.confidence, Some(0.95));
    assert_eq!(
        event.client_timestamp.map(|t| t.to_rfc3339()),
        Some("2025-10-27T14:30:05+00:00".to_string())
    );
}

#[test]
fn test_video_result_derives_engagement() {
    let json = r#"{
        "session_id": "interview-1",
        "class": "video",
        "payload": {
            "facial_analysis": {"face_detected": true, "eye_contact": true, "emotion": "happy"},
            "body_analysis": {"pose_detected": true, "posture": "slouched", "confidence_level": 0.5}
        }
    }"#;

    let msg: AnalysisResultMessage = serde_json::from_str(json).unwrap();
    assert!(msg.timestamp.is_none());

    let event = msg.into_event();
    // eye contact 0.3 + positive emotion 0.2 + 0.3 * 0.5
    let engagement = event.engagement.unwrap();
    assert!((engagement - 0.65).abs() < 1e-9);
    assert_eq!(event.confidence, Some(0.5));
    assert!(event.client_timestamp.is_none());
}

#[test]
fn test_unparseable_result_timestamp_is_ignored() {
    let msg = AnalysisResultMessage {
        session_id: "interview-1".to_string(),
        class: SignalClass::Audio,
        timestamp: Some("yesterday".to_string()),
        payload: serde_json::json!({}),
    };

    let event = msg.into_event();
    assert!(event.client_timestamp.is_none());
    assert_eq!(event.confidence, None);
}

#[test]
fn test_pcm_encoding_roundtrip() {
    let original_samples: Vec<i16> = vec![100, -200, 300, -400];

    // Convert to bytes
    let pcm_bytes: Vec<u8> = original_samples
        .iter()
        .flat_map(|&s| s.to_le_bytes())
        .collect();

    let msg = MediaFrameMessage {
        session_id: "test".to_string(),
        sequence: 0,
        data: base64::engine::general_purpose::STANDARD.encode(&pcm_bytes),
        timestamp: "2025-10-27T14:30:00Z".to_string(),
    };

    // Serialize and deserialize
    let json = serde_json::to_string(&msg).unwrap();
    let deserialized: MediaFrameMessage = serde_json::from_str(&json).unwrap();

    // Decode base64
    let decoded_bytes = base64::engine::general_purpose::STANDARD
        .decode(&deserialized.data)
        .unwrap();

    // Convert back to i16 samples
    let decoded_samples: Vec<i16> = decoded_bytes
        .chunks_exact(2)
        .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();

    assert_eq!(decoded_samples, original_samples);
}
