//! Escalation — turns a single user action into an emergency broadcast to
//! the community's configured escalation contacts.
//!
//! Escalation is a silent no-op (not an error) when the community has no
//! settings, the category list is unset, or the list resolves to zero active
//! recipients sharing the triggering user's customer type.

use sqlx::PgPool;
use uuid::Uuid;

use vigia_common::error::AppError;
use vigia_common::types::{Community, EscalationCategory, Notification};
use vigia_push::PushClient;

use crate::inbox::DeliveryRecordWriter;
use crate::notification::NotificationService;
use crate::recipients::RecipientStore;

pub struct EscalationService;

impl EscalationService {
    /// Panic button: escalate through the community's `panic_notifications`
    /// list. Returns the broadcast message, or `None` when nothing fired.
    pub async fn panic(
        pool: &PgPool,
        push: &PushClient,
        triggering_user_id: Uuid,
    ) -> Result<Option<String>, AppError> {
        Self::escalate(pool, push, EscalationCategory::Panic, triggering_user_id).await
    }

    /// Escalate a category for the triggering user's community.
    pub async fn escalate(
        pool: &PgPool,
        push: &PushClient,
        category: EscalationCategory,
        triggering_user_id: Uuid,
    ) -> Result<Option<String>, AppError> {
        let user = RecipientStore::find_by_id(pool, triggering_user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("User {} not found", triggering_user_id))
            })?;

        let community: Community = sqlx::query_as("SELECT * FROM communities WHERE id = $1")
            .bind(user.customer_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Community {} not found", user.customer_id))
            })?;

        if community.settings.is_none() {
            tracing::debug!(
                community_id = %community.id,
                category = %category,
                "Escalation skipped: community has no settings"
            );
            return Ok(None);
        }

        let usernames = community.settings().escalation_list(category);
        if usernames.is_empty() {
            tracing::debug!(
                community_id = %community.id,
                category = %category,
                "Escalation skipped: no contacts configured"
            );
            return Ok(None);
        }

        let customer_type = user.customer_type.as_deref().unwrap_or_default();
        let recipients = RecipientStore::find_by_usernames(pool, &usernames, customer_type).await?;
        if recipients.is_empty() {
            tracing::debug!(
                community_id = %community.id,
                category = %category,
                "Escalation skipped: configured contacts resolve to no active recipients"
            );
            return Ok(None);
        }

        let description = match &user.lot {
            Some(lot) => format!(
                "{} reported by {} from lot {}",
                category.title(),
                user.username,
                lot
            ),
            None => format!("{} reported by {}", category.title(), user.username),
        };

        let notification: Notification = sqlx::query_as(
            r#"
            INSERT INTO notifications
                (title, description, kind, emergency, customer_id, author_user_id, trial_period)
            VALUES ($1, $2, $3, true, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(category.title())
        .bind(&description)
        .bind(category.kind().to_string())
        .bind(community.id)
        .bind(user.id)
        .bind(community.trial_period)
        .fetch_one(pool)
        .await?;

        let ids: Vec<Uuid> = recipients.iter().map(|d| d.id).collect();
        DeliveryRecordWriter::record(pool, notification.id, &ids).await?;

        let tokens: Vec<String> = recipients.into_iter().filter_map(|d| d.push_token).collect();
        let delivered = NotificationService::dispatch_push(push, &notification, &tokens).await;

        tracing::info!(
            notification_id = %notification.id,
            category = %category,
            recipients = ids.len(),
            delivered,
            "Escalation dispatched"
        );

        Ok(Some(description))
    }
}
