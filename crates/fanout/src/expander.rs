//! Additional-target expansion — a second, independent resolution path that
//! pulls recipients from the phone-number settings of child communities.

use std::collections::HashSet;

use sqlx::PgPool;
use uuid::Uuid;

use vigia_common::error::AppError;
use vigia_common::types::Community;

use crate::recipients::{RecipientDevice, RecipientStore};

pub struct AdditionalTargetExpander;

impl AdditionalTargetExpander {
    /// Resolve the recipients configured as additional targets.
    ///
    /// Every target id must name a child community of the originating one;
    /// anything else fails with `InvalidCommunity`. Each valid target's
    /// `additional_notifications` username list is resolved to active
    /// recipients sharing `customer_type`. Results are deduped by recipient
    /// id across targets.
    pub async fn expand(
        pool: &PgPool,
        target_ids: &[Uuid],
        origin_community_id: Uuid,
        customer_type: &str,
    ) -> Result<Vec<RecipientDevice>, AppError> {
        let mut merged: Vec<RecipientDevice> = Vec::new();
        let mut seen: HashSet<Uuid> = HashSet::new();

        for &target_id in target_ids {
            let community: Option<Community> =
                sqlx::query_as("SELECT * FROM communities WHERE id = $1")
                    .bind(target_id)
                    .fetch_optional(pool)
                    .await?;

            let community = community
                .filter(|c| c.parent_id == Some(origin_community_id))
                .ok_or(AppError::InvalidCommunity(target_id))?;

            let usernames = community.settings().additional_usernames();
            if usernames.is_empty() {
                tracing::debug!(
                    community_id = %target_id,
                    "Additional target has no configured usernames"
                );
                continue;
            }

            let resolved =
                RecipientStore::find_by_usernames(pool, &usernames, customer_type).await?;
            for device in resolved {
                if seen.insert(device.id) {
                    merged.push(device);
                }
            }
        }

        Ok(merged)
    }
}
