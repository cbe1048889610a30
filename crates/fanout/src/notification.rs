//! Notification creation pipeline.
//!
//! A created notification flows through:
//! 1. Filter construction from the owning community (via `RecipientFilter`)
//! 2. Candidate lookup (via `RecipientStore`)
//! 3. Additional cross-community expansion (via `AdditionalTargetExpander`)
//! 4. Durable inbox rows (via `DeliveryRecordWriter`)
//! 5. Best-effort push delivery (via `PushClient`)
//!
//! All validation runs before anything is persisted, so a validation failure
//! leaves no notification and no inbox rows behind. Push failure is logged
//! and never rolls the durable rows back.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use vigia_common::error::AppError;
use vigia_common::types::{Community, Location, Notification, PushChannel};
use vigia_push::{PushClient, PushMessage};

use crate::expander::AdditionalTargetExpander;
use crate::inbox::DeliveryRecordWriter;
use crate::recipients::{RecipientDevice, RecipientStore};
use crate::targeting::{RecipientFilter, TargetSpec};

/// Parameters for creating a notification.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateNotificationParams {
    pub customer_id: Uuid,
    pub title: String,
    pub description: String,
    pub kind: String,
    #[serde(default)]
    pub emergency: bool,
    pub from_lot: Option<String>,
    pub to_lot: Option<String>,
    pub location_id: Option<Uuid>,
    pub send_at: Option<DateTime<Utc>>,
    pub image: Option<String>,
    #[serde(default)]
    pub additional_target_community_ids: Vec<Uuid>,
}

/// Result of a create call: the persisted notification plus how many
/// recipients were targeted.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CreatedNotification {
    pub notification: Notification,
    pub recipients: usize,
}

/// Orchestrates notification creation and fan-out.
pub struct NotificationService;

impl NotificationService {
    /// Valid kind strings, matching `NotificationKind::Display` output.
    const VALID_KINDS: &[&str] = &["massive", "authorization", "user", "monitoring", "panic"];

    /// Create a notification and fan it out to its recipients.
    pub async fn create(
        pool: &PgPool,
        push: &PushClient,
        author_user_id: Uuid,
        params: &CreateNotificationParams,
    ) -> Result<CreatedNotification, AppError> {
        Self::validate_kind(&params.kind)?;

        let community: Community = sqlx::query_as("SELECT * FROM communities WHERE id = $1")
            .bind(params.customer_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Community {} not found", params.customer_id))
            })?;

        // Preload the referenced location; filter construction rejects a
        // dangling reference before anything is persisted.
        let location: Option<Location> = match params.location_id {
            Some(id) => {
                sqlx::query_as("SELECT * FROM locations WHERE id = $1 AND customer_id = $2")
                    .bind(id)
                    .bind(community.id)
                    .fetch_optional(pool)
                    .await?
            }
            None => None,
        };

        let spec = TargetSpec {
            location_id: params.location_id,
            from_lot: params.from_lot.clone(),
            to_lot: params.to_lot.clone(),
        };
        let filter = RecipientFilter::build(&spec, &community, location.as_ref())?;

        // Both resolution paths run before the insert so cross-community
        // validation failures abort the whole call.
        let primary = RecipientStore::find_active_recipients(pool, &filter).await?;
        let additional = AdditionalTargetExpander::expand(
            pool,
            &params.additional_target_community_ids,
            community.id,
            &community.community_type.to_string(),
        )
        .await?;
        let recipients = Self::merge_recipients(primary, additional);

        // Trial flag is stamped from the owning community at write time.
        let notification: Notification = sqlx::query_as(
            r#"
            INSERT INTO notifications
                (title, description, kind, emergency, from_lot, to_lot, location_id,
                 customer_id, author_user_id, send_at, image, additional_target_ids, trial_period)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(&params.title)
        .bind(&params.description)
        .bind(&params.kind)
        .bind(params.emergency)
        .bind(&params.from_lot)
        .bind(&params.to_lot)
        .bind(params.location_id)
        .bind(community.id)
        .bind(author_user_id)
        .bind(params.send_at)
        .bind(&params.image)
        .bind(&params.additional_target_community_ids)
        .bind(community.trial_period)
        .fetch_one(pool)
        .await?;

        let ids: Vec<Uuid> = recipients.iter().map(|d| d.id).collect();
        let recorded = DeliveryRecordWriter::record(pool, notification.id, &ids).await?;

        tracing::info!(
            notification_id = %notification.id,
            kind = %notification.kind,
            recipients = ids.len(),
            recorded,
            "Notification fanned out"
        );

        let tokens: Vec<String> = recipients.into_iter().filter_map(|d| d.push_token).collect();
        let delivered = Self::dispatch_push(push, &notification, &tokens).await;
        if !delivered {
            tracing::warn!(
                notification_id = %notification.id,
                "Push delivery failed; inbox rows remain queryable"
            );
        }

        Ok(CreatedNotification {
            notification,
            recipients: ids.len(),
        })
    }

    /// Deliver the push for a persisted notification. Returns the
    /// dispatcher's boolean; failures never propagate.
    pub async fn dispatch_push(
        push: &PushClient,
        notification: &Notification,
        tokens: &[String],
    ) -> bool {
        let message = PushMessage {
            title: notification.title.clone(),
            body: notification.description.clone(),
            data: serde_json::json!({ "notificationId": notification.id }),
            channel: PushChannel::select(notification.kind, notification.emergency),
            high_priority: notification.emergency,
            badge: 1,
        };
        push.push_notification(&message, tokens).await
    }

    fn validate_kind(kind: &str) -> Result<(), AppError> {
        if !Self::VALID_KINDS.contains(&kind) {
            return Err(AppError::Validation(format!(
                "Invalid kind '{}'. Valid kinds: {}",
                kind,
                Self::VALID_KINDS.join(", ")
            )));
        }
        Ok(())
    }

    /// Merge the two resolution paths, deduping by recipient id. The paths
    /// target disjoint user sets by construction, but storage uniqueness
    /// only protects rows — batch sizing and logging need the dedupe too.
    fn merge_recipients(
        primary: Vec<RecipientDevice>,
        additional: Vec<RecipientDevice>,
    ) -> Vec<RecipientDevice> {
        let mut merged = Vec::with_capacity(primary.len() + additional.len());
        let mut seen = HashSet::new();
        for device in primary.into_iter().chain(additional) {
            if seen.insert(device.id) {
                merged.push(device);
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: Uuid) -> RecipientDevice {
        RecipientDevice {
            id,
            push_token: None,
        }
    }

    #[test]
    fn test_valid_kinds_accepted() {
        for kind in ["massive", "authorization", "user", "monitoring", "panic"] {
            assert!(NotificationService::validate_kind(kind).is_ok());
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = NotificationService::validate_kind("broadcast").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_merge_dedupes_across_paths() {
        let shared = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let merged = NotificationService::merge_recipients(
            vec![device(a), device(shared)],
            vec![device(shared), device(b)],
        );

        let ids: Vec<Uuid> = merged.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![a, shared, b]);
    }

    #[test]
    fn test_merge_keeps_disjoint_sets_intact() {
        let merged = NotificationService::merge_recipients(
            vec![device(Uuid::new_v4())],
            vec![device(Uuid::new_v4()), device(Uuid::new_v4())],
        );
        assert_eq!(merged.len(), 3);
    }
}
