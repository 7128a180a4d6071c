//! WebSocket message types for the Deepgram live transcription API.
//!
//! - **Incoming**: `Results`, `Metadata`, `SpeechStarted`, `UtteranceEnd`, `Error`
//! - **Outgoing**: binary audio (no wrapper), [`ControlMessage::KeepAlive`],
//!   [`ControlMessage::CloseStream`]

use serde::{Deserialize, Serialize};

// =============================================================================
// Incoming Messages (Server to Client)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Alternative {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
}

/// Transcription result for one chunk of audio.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultsMessage {
    pub channel: Channel,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub speech_final: bool,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub start: f64,
}

impl ResultsMessage {
    /// Only the first alternative is used.
    pub fn first_alternative(&self) -> Option<&Alternative> {
        self.channel.alternatives.first()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataMessage {
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorMessage {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub variant: Option<String>,
}

impl ErrorMessage {
    pub fn text(&self) -> String {
        self.description
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "Unknown Deepgram error".to_string())
    }
}

/// All server messages, keyed by their `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum DeepgramMessage {
    Results(ResultsMessage),
    Metadata(MetadataMessage),
    SpeechStarted,
    UtteranceEnd,
    Error(ErrorMessage),
    #[serde(other)]
    Unknown,
}

impl DeepgramMessage {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

// =============================================================================
// Outgoing Messages (Client to Server)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    /// Keeps the stream open while no audio is flowing
    KeepAlive,
    /// Flush pending audio; the server replies with final results and closes
    CloseStream,
}

impl ControlMessage {
    pub fn to_json(self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_results() {
        let json = r#"{
            "type": "Results",
            "channel_index": [0, 1],
            "duration": 1.2,
            "start": 0.0,
            "is_final": true,
            "speech_final": true,
            "channel": {
                "alternatives": [
                    {"transcript": "I run a plumbing business", "confidence": 0.98, "words": []},
                    {"transcript": "I run a plumbing busyness", "confidence": 0.41}
                ]
            }
        }"#;

        match DeepgramMessage::parse(json).unwrap() {
            DeepgramMessage::Results(results) => {
                assert!(results.is_final);
                assert!(results.speech_final);
                let alt = results.first_alternative().unwrap();
                assert_eq!(alt.transcript, "I run a plumbing business");
                assert!((alt.confidence - 0.98).abs() < f64::EPSILON);
            }
            other => panic!("Expected Results, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_results_without_alternatives() {
        let json = r#"{"type":"Results","channel":{"alternatives":[]}}"#;
        match DeepgramMessage::parse(json).unwrap() {
            DeepgramMessage::Results(results) => {
                assert!(results.first_alternative().is_none());
                assert!(!results.is_final);
            }
            other => panic!("Expected Results, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_metadata_and_vad_events() {
        assert!(matches!(
            DeepgramMessage::parse(r#"{"type":"Metadata","request_id":"abc"}"#).unwrap(),
            DeepgramMessage::Metadata(MetadataMessage { request_id: Some(_) })
        ));
        assert!(matches!(
            DeepgramMessage::parse(r#"{"type":"SpeechStarted","timestamp":0.4}"#).unwrap(),
            DeepgramMessage::SpeechStarted
        ));
        assert!(matches!(
            DeepgramMessage::parse(r#"{"type":"UtteranceEnd","last_word_end":2.1}"#).unwrap(),
            DeepgramMessage::UtteranceEnd
        ));
    }

    #[test]
    fn test_parse_error_prefers_description() {
        let json = r#"{"type":"Error","description":"bad audio","message":"fallback","variant":"x"}"#;
        match DeepgramMessage::parse(json).unwrap() {
            DeepgramMessage::Error(err) => assert_eq!(err.text(), "bad audio"),
            other => panic!("Expected Error, got {other:?}"),
        }

        let json = r#"{"type":"Error"}"#;
        match DeepgramMessage::parse(json).unwrap() {
            DeepgramMessage::Error(err) => assert_eq!(err.text(), "Unknown Deepgram error"),
            other => panic!("Expected Error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_is_tolerated() {
        assert!(matches!(
            DeepgramMessage::parse(r#"{"type":"SomethingNew","x":1}"#).unwrap(),
            DeepgramMessage::Unknown
        ));
        assert!(DeepgramMessage::parse("not json").is_err());
    }

    #[test]
    fn test_control_messages_serialize() {
        assert_eq!(
            ControlMessage::KeepAlive.to_json().unwrap(),
            r#"{"type":"KeepAlive"}"#
        );
        assert_eq!(
            ControlMessage::CloseStream.to_json().unwrap(),
            r#"{"type":"CloseStream"}"#
        );
    }
}
