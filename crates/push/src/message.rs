//! Wire types for the push provider's send and receipt endpoints.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use vigia_common::types::PushChannel;

/// Token-independent content of a push message. The client expands this into
/// one provider payload per target token.
#[derive(Debug, Clone)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    /// Opaque payload forwarded to the app (notification id, deep-link data).
    pub data: serde_json::Value,
    pub channel: PushChannel,
    /// Emergency messages are delivered with high priority.
    pub high_priority: bool,
    pub badge: i32,
}

impl PushMessage {
    fn priority(&self) -> &'static str {
        if self.high_priority { "high" } else { "default" }
    }
}

/// One message as submitted to the provider.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PushRequestItem<'a> {
    pub to: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub data: &'a serde_json::Value,
    pub channel_id: &'static str,
    pub priority: &'static str,
    pub badge: i32,
}

impl<'a> PushRequestItem<'a> {
    pub fn new(message: &'a PushMessage, token: &'a str) -> Self {
        Self {
            to: token,
            title: &message.title,
            body: &message.body,
            data: &message.data,
            channel_id: message.channel.as_str(),
            priority: message.priority(),
            badge: message.badge,
        }
    }
}

/// Per-message submission acknowledgement.
#[derive(Debug, Clone, Deserialize)]
pub struct PushTicket {
    pub status: String,
    pub id: Option<String>,
    pub message: Option<String>,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PushSendResponse {
    pub data: Vec<PushTicket>,
}

/// Delivery outcome fetched by ticket id.
#[derive(Debug, Clone, Deserialize)]
pub struct PushReceipt {
    pub status: String,
    pub message: Option<String>,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReceiptRequest<'a> {
    pub ids: &'a [String],
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReceiptResponse {
    pub data: HashMap<String, PushReceipt>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_message(high_priority: bool) -> PushMessage {
        PushMessage {
            title: "Water outage".to_string(),
            body: "Maintenance on sector 3".to_string(),
            data: serde_json::json!({"notificationId": "abc"}),
            channel: PushChannel::General,
            high_priority,
            badge: 1,
        }
    }

    #[test]
    fn test_request_item_wire_shape() {
        let message = make_message(false);
        let item = PushRequestItem::new(&message, "ExponentPushToken[xxx]");
        let value = serde_json::to_value(&item).unwrap();

        assert_eq!(value["to"], "ExponentPushToken[xxx]");
        assert_eq!(value["channelId"], "general-notifications");
        assert_eq!(value["priority"], "default");
        assert_eq!(value["badge"], 1);
        assert_eq!(value["data"]["notificationId"], "abc");
    }

    #[test]
    fn test_high_priority_serializes_as_high() {
        let message = make_message(true);
        let item = PushRequestItem::new(&message, "ExponentPushToken[yyy]");
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["priority"], "high");
    }
}
