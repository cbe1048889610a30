//! Notification fan-out: targeting, cross-community expansion, durable inbox
//! persistence, push dispatch, and escalation.
//!
//! Pipeline for a created notification:
//! 1. Build a recipient filter from the notification + owning community
//! 2. Query candidate recipients through the recipient store
//! 3. Expand additional cross-community targets and merge
//! 4. Persist one inbox row per recipient (idempotent)
//! 5. Deliver pushes for recipients with device tokens (best-effort)

pub mod escalation;
pub mod expander;
pub mod inbox;
pub mod notification;
pub mod recipients;
pub mod targeting;
