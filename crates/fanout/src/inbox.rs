//! Durable inbox rows — the artifact a recipient later lists and marks read,
//! independent of push success.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use vigia_common::error::AppError;
use vigia_common::types::NotificationKind;

/// An inbox row joined with its notification, as listed by a recipient.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct InboxEntry {
    pub record_id: Uuid,
    pub notification_id: Uuid,
    pub title: String,
    pub description: String,
    pub kind: NotificationKind,
    pub emergency: bool,
    pub image: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Writes and mutates the per-recipient delivery records.
pub struct DeliveryRecordWriter;

impl DeliveryRecordWriter {
    /// Persist one inbox row per recipient id.
    ///
    /// Idempotent under retry: the `(notification_id, recipient_id)`
    /// uniqueness constraint absorbs overlapping id sets, so re-invocation
    /// never creates duplicate rows. Returns the number of rows actually
    /// inserted.
    pub async fn record(
        pool: &PgPool,
        notification_id: Uuid,
        recipient_ids: &[Uuid],
    ) -> Result<u64, AppError> {
        if recipient_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO notification_recipients (notification_id, recipient_id)
            SELECT $1, unnest($2::uuid[])
            ON CONFLICT (notification_id, recipient_id) DO NOTHING
            "#,
        )
        .bind(notification_id)
        .bind(recipient_ids)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Mark an inbox row read, scoped to its owner.
    ///
    /// A `(record_id, owner_id)` pair that does not match an existing row is
    /// not-found — a third party can never observe or flip someone else's
    /// record. Marking an already-read row again succeeds and leaves it read.
    pub async fn mark_read(pool: &PgPool, record_id: Uuid, owner_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE notification_recipients SET read = true WHERE id = $1 AND recipient_id = $2",
        )
        .bind(record_id)
        .bind(owner_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Notification record {} not found",
                record_id
            )));
        }

        Ok(())
    }

    /// List a recipient's inbox, newest first.
    pub async fn list_for_recipient(
        pool: &PgPool,
        recipient_id: Uuid,
    ) -> Result<Vec<InboxEntry>, AppError> {
        let rows: Vec<InboxEntry> = sqlx::query_as(
            r#"
            SELECT nr.id AS record_id, n.id AS notification_id, n.title, n.description,
                   n.kind, n.emergency, n.image, nr.read, nr.created_at
            FROM notification_recipients nr
            JOIN notifications n ON n.id = nr.notification_id
            WHERE nr.recipient_id = $1
            ORDER BY nr.created_at DESC
            "#,
        )
        .bind(recipient_id)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}
