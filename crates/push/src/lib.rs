//! Push delivery client for the Expo-style push provider.
//!
//! Responsibilities:
//! - Validate device token format before anything is sent
//! - Partition messages into provider-mandated chunks
//! - Submit chunks sequentially, collecting per-message tickets
//! - Reconcile delivery receipts best-effort (diagnostic only)

pub mod client;
pub mod message;

pub use client::{PushClient, is_valid_push_token};
pub use message::{PushMessage, PushReceipt, PushTicket};
