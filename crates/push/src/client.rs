//! Push client — batch submission and receipt reconciliation.
//!
//! The provider accepts at most 100 messages per send request and 300 ticket
//! ids per receipt request. Chunks are submitted sequentially to respect the
//! provider's rate limits.

use vigia_common::config::AppConfig;
use vigia_common::error::AppError;

use crate::message::{
    PushMessage, PushReceipt, PushRequestItem, PushSendResponse, PushTicket, ReceiptRequest,
    ReceiptResponse,
};

/// Maximum messages per send request.
pub const PUSH_CHUNK_SIZE: usize = 100;

/// Maximum ticket ids per receipt request.
pub const RECEIPT_CHUNK_SIZE: usize = 300;

/// Check a device token against the provider's token format.
pub fn is_valid_push_token(token: &str) -> bool {
    let inner = token
        .strip_prefix("ExponentPushToken[")
        .or_else(|| token.strip_prefix("ExpoPushToken["))
        .and_then(|rest| rest.strip_suffix(']'));

    match inner {
        Some(body) => !body.is_empty() && !body.contains(']'),
        None => false,
    }
}

/// HTTP client for the push provider.
#[derive(Debug, Clone)]
pub struct PushClient {
    http: reqwest::Client,
    send_url: String,
    receipts_url: String,
}

impl PushClient {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_urls(config.push_send_url.clone(), config.push_receipts_url.clone())
    }

    pub fn with_urls(send_url: String, receipts_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            send_url,
            receipts_url,
        }
    }

    /// Deliver one message to a list of device tokens.
    ///
    /// Returns `true` when every chunk was submitted. Returns `false` when
    /// any token fails format validation (nothing is sent in that case) or
    /// when a chunk submission errors — chunks already submitted at that
    /// point are NOT rolled back, so `false` does not mean nothing was
    /// delivered.
    ///
    /// Receipt reconciliation runs after submission and never affects the
    /// returned value.
    pub async fn push_notification(&self, message: &PushMessage, tokens: &[String]) -> bool {
        if tokens.is_empty() {
            tracing::debug!("No push tokens to deliver to");
            return true;
        }

        // Whole-batch validation gate: one bad token rejects the entire call.
        if let Some(bad) = tokens.iter().find(|t| !is_valid_push_token(t)) {
            tracing::warn!(token = %bad, "Rejecting push batch: invalid push token");
            return false;
        }

        let mut tickets: Vec<PushTicket> = Vec::with_capacity(tokens.len());

        for chunk in tokens.chunks(PUSH_CHUNK_SIZE) {
            match self.submit_chunk(message, chunk).await {
                Ok(mut chunk_tickets) => tickets.append(&mut chunk_tickets),
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        submitted = tickets.len(),
                        "Push chunk submission failed"
                    );
                    return false;
                }
            }
        }

        for ticket in tickets.iter().filter(|t| t.status != "ok") {
            tracing::error!(
                status = %ticket.status,
                message = ?ticket.message,
                details = ?ticket.details,
                "Push ticket reported submission error"
            );
        }

        let ticket_ids: Vec<String> = tickets
            .iter()
            .filter(|t| t.status == "ok")
            .filter_map(|t| t.id.clone())
            .collect();
        self.check_receipts(&ticket_ids).await;

        true
    }

    /// Submit one chunk of messages, returning the provider's tickets.
    async fn submit_chunk(
        &self,
        message: &PushMessage,
        tokens: &[String],
    ) -> Result<Vec<PushTicket>, AppError> {
        let payload: Vec<PushRequestItem<'_>> = tokens
            .iter()
            .map(|token| PushRequestItem::new(message, token))
            .collect();

        let response = self
            .http
            .post(&self.send_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Provider(format!(
                "Send request returned {}",
                response.status()
            )));
        }

        let body: PushSendResponse = response
            .json()
            .await
            .map_err(|e| AppError::Provider(e.to_string()))?;

        tracing::debug!(tokens = tokens.len(), tickets = body.data.len(), "Push chunk submitted");
        Ok(body.data)
    }

    /// Fetch delivery receipts for submitted tickets and log errors.
    ///
    /// This path is diagnostic only — failures are logged and swallowed.
    pub async fn check_receipts(&self, ticket_ids: &[String]) {
        for chunk in ticket_ids.chunks(RECEIPT_CHUNK_SIZE) {
            match self.fetch_receipt_chunk(chunk).await {
                Ok(receipts) => {
                    for (id, receipt) in receipts {
                        if receipt.status == "error" {
                            tracing::error!(
                                ticket_id = %id,
                                message = ?receipt.message,
                                details = ?receipt.details,
                                "Push receipt reported delivery error"
                            );
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to fetch push receipts");
                }
            }
        }
    }

    async fn fetch_receipt_chunk(
        &self,
        ticket_ids: &[String],
    ) -> Result<std::collections::HashMap<String, PushReceipt>, AppError> {
        let response = self
            .http
            .post(&self.receipts_url)
            .json(&ReceiptRequest { ids: ticket_ids })
            .send()
            .await
            .map_err(|e| AppError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Provider(format!(
                "Receipt request returned {}",
                response.status()
            )));
        }

        let body: ReceiptResponse = response
            .json()
            .await
            .map_err(|e| AppError::Provider(e.to_string()))?;

        Ok(body.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigia_common::types::PushChannel;

    fn make_message() -> PushMessage {
        PushMessage {
            title: "t".to_string(),
            body: "b".to_string(),
            data: serde_json::json!({}),
            channel: PushChannel::General,
            high_priority: false,
            badge: 1,
        }
    }

    /// Client pointed at an unroutable endpoint.
    fn offline_client() -> PushClient {
        PushClient::with_urls(
            "http://127.0.0.1:1/send".to_string(),
            "http://127.0.0.1:1/receipts".to_string(),
        )
    }

    #[test]
    fn test_token_format_accepted() {
        assert!(is_valid_push_token("ExponentPushToken[abc123]"));
        assert!(is_valid_push_token("ExpoPushToken[abc123]"));
    }

    #[test]
    fn test_token_format_rejected() {
        assert!(!is_valid_push_token(""));
        assert!(!is_valid_push_token("abc123"));
        assert!(!is_valid_push_token("ExponentPushToken[]"));
        assert!(!is_valid_push_token("ExponentPushToken[abc"));
        assert!(!is_valid_push_token("ExponentPushToken[a]b]"));
        assert!(!is_valid_push_token("FcmToken[abc123]"));
    }

    #[tokio::test]
    async fn test_invalid_token_aborts_whole_batch() {
        let client = offline_client();
        let tokens = vec![
            "ExponentPushToken[valid1]".to_string(),
            "not-a-token".to_string(),
            "ExponentPushToken[valid2]".to_string(),
        ];
        assert!(!client.push_notification(&make_message(), &tokens).await);
    }

    #[tokio::test]
    async fn test_empty_token_list_is_success() {
        let client = offline_client();
        assert!(client.push_notification(&make_message(), &[]).await);
    }
}
