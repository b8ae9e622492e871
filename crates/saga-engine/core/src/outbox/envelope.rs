//! Message envelope shared by the outbox and inbound dispatch.

use serde::{Deserialize, Serialize};

/// `{messageId, type, data}` wrapper carried on every topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub message_id: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(message_id: impl Into<String>, message_type: impl Into<String>, data: T) -> Self {
        Self {
            message_id: message_id.into(),
            message_type: message_type.into(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_parses_untyped_data() {
        let raw = r#"{"messageId":"m-1","type":"topic-requested","data":{"topicId":"t"}}"#;
        let envelope: Envelope<serde_json::Value> = serde_json::from_str(raw).unwrap();

        assert_eq!(envelope.message_id, "m-1");
        assert_eq!(envelope.message_type, "topic-requested");
        assert_eq!(envelope.data["topicId"], "t");
    }
}
