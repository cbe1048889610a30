//! Recipient store — the queries behind notification fan-out.
//!
//! Every query here applies the base scoping (`role = 'user' AND active`)
//! so callers never see inactive or non-recipient rows.

use sqlx::PgPool;
use uuid::Uuid;

use vigia_common::error::AppError;
use vigia_common::types::Recipient;

use crate::targeting::{RecipientFilter, TargetingRule};

/// The id + device token pair fan-out works with.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecipientDevice {
    pub id: Uuid,
    pub push_token: Option<String>,
}

/// Recipient query service.
pub struct RecipientStore;

impl RecipientStore {
    /// Find the active recipients of a community matching a filter.
    ///
    /// Lot ranges compare as strings (`BETWEEN` on text), city and
    /// neighborhood rules match against the JSONB address blobs.
    pub async fn find_active_recipients(
        pool: &PgPool,
        filter: &RecipientFilter,
    ) -> Result<Vec<RecipientDevice>, AppError> {
        let rows: Vec<RecipientDevice> = match &filter.rule {
            TargetingRule::All => {
                sqlx::query_as(
                    r#"
                    SELECT id, push_token FROM users
                    WHERE customer_id = $1 AND role = 'user' AND active = true
                    "#,
                )
                .bind(filter.community_id)
                .fetch_all(pool)
                .await?
            }
            TargetingRule::LotRange { from, to } => {
                sqlx::query_as(
                    r#"
                    SELECT id, push_token FROM users
                    WHERE customer_id = $1 AND role = 'user' AND active = true
                      AND lot BETWEEN $2 AND $3
                    "#,
                )
                .bind(filter.community_id)
                .bind(from)
                .bind(to)
                .fetch_all(pool)
                .await?
            }
            TargetingRule::City { name } => {
                sqlx::query_as(
                    r#"
                    SELECT id, push_token FROM users
                    WHERE customer_id = $1 AND role = 'user' AND active = true
                      AND (home_address->>'city' = $2 OR work_address->>'city' = $2)
                    "#,
                )
                .bind(filter.community_id)
                .bind(name)
                .fetch_all(pool)
                .await?
            }
            TargetingRule::Neighborhood { location_id } => {
                sqlx::query_as(
                    r#"
                    SELECT id, push_token FROM users
                    WHERE customer_id = $1 AND role = 'user' AND active = true
                      AND home_address->>'neighborhood_id' = $2
                    "#,
                )
                .bind(filter.community_id)
                .bind(location_id.to_string())
                .fetch_all(pool)
                .await?
            }
        };

        Ok(rows)
    }

    /// Resolve usernames to active recipients sharing a customer type.
    /// Used by additional-target expansion and escalation.
    pub async fn find_by_usernames(
        pool: &PgPool,
        usernames: &[String],
        customer_type: &str,
    ) -> Result<Vec<RecipientDevice>, AppError> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<RecipientDevice> = sqlx::query_as(
            r#"
            SELECT id, push_token FROM users
            WHERE username = ANY($1) AND role = 'user' AND active = true
              AND customer_type = $2
            "#,
        )
        .bind(usernames)
        .bind(customer_type)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Look up a single recipient by id.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Recipient>, AppError> {
        let row: Option<Recipient> =
            sqlx::query_as("SELECT * FROM users WHERE id = $1 AND role = 'user'")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(row)
    }
}
