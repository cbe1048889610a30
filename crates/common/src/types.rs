use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of managed community.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CommunityType {
    Business,
    Government,
}

impl std::fmt::Display for CommunityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommunityType::Business => write!(f, "business"),
            CommunityType::Government => write!(f, "government"),
        }
    }
}

/// Geographic scope of a government-community location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    Locality,
    Neighborhood,
}

/// Kinds of notifications the platform produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Massive,
    Authorization,
    User,
    Monitoring,
    Panic,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Massive => write!(f, "massive"),
            NotificationKind::Authorization => write!(f, "authorization"),
            NotificationKind::User => write!(f, "user"),
            NotificationKind::Monitoring => write!(f, "monitoring"),
            NotificationKind::Panic => write!(f, "panic"),
        }
    }
}

/// Push channel a message is routed through on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PushChannel {
    General,
    Emergency,
}

impl PushChannel {
    /// Select the channel for a notification.
    ///
    /// Panic notifications and anything flagged emergency go through the
    /// emergency channel; everything else through the general one.
    pub fn select(kind: NotificationKind, emergency: bool) -> Self {
        if emergency || kind == NotificationKind::Panic {
            PushChannel::Emergency
        } else {
            PushChannel::General
        }
    }

    /// Provider-facing channel id.
    pub fn as_str(&self) -> &'static str {
        match self {
            PushChannel::General => "general-notifications",
            PushChannel::Emergency => "emergency-notifications",
        }
    }
}

/// Per-category escalation lists configured on a community.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationCategory {
    Panic,
    PerimeterViolation,
    AlarmActivated,
    BadCompany,
    PublicViolence,
}

impl EscalationCategory {
    /// Notification kind produced when this category escalates.
    pub fn kind(&self) -> NotificationKind {
        match self {
            EscalationCategory::Panic => NotificationKind::Panic,
            _ => NotificationKind::Monitoring,
        }
    }

    /// Title used on the escalation notification.
    pub fn title(&self) -> &'static str {
        match self {
            EscalationCategory::Panic => "Panic alert",
            EscalationCategory::PerimeterViolation => "Perimeter violation",
            EscalationCategory::AlarmActivated => "Alarm activated",
            EscalationCategory::BadCompany => "Bad company report",
            EscalationCategory::PublicViolence => "Public violence report",
        }
    }
}

impl std::fmt::Display for EscalationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EscalationCategory::Panic => write!(f, "panic"),
            EscalationCategory::PerimeterViolation => write!(f, "perimeter_violation"),
            EscalationCategory::AlarmActivated => write!(f, "alarm_activated"),
            EscalationCategory::BadCompany => write!(f, "bad_company"),
            EscalationCategory::PublicViolence => write!(f, "public_violence"),
        }
    }
}

/// A managed community (gated neighborhood or municipality).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Community {
    pub id: Uuid,
    pub name: String,
    pub community_type: CommunityType,
    pub parent_id: Option<Uuid>,
    pub trial_period: bool,
    pub settings: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Community {
    /// Typed view of the `settings` JSONB column. Missing or malformed
    /// settings read as empty.
    pub fn settings(&self) -> CommunitySettings {
        self.settings
            .clone()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }
}

/// Typed representation of a community's `settings` JSON.
///
/// Each escalation field is a comma-separated list of usernames (phone
/// numbers). All fields are optional — omitted fields mean "not configured".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommunitySettings {
    pub panic_notifications: Option<String>,
    pub perimeter_violation_notifications: Option<String>,
    pub alarm_activated_notifications: Option<String>,
    pub bad_company_notifications: Option<String>,
    pub public_violence_notifications: Option<String>,
    pub additional_notifications: Option<String>,
}

impl CommunitySettings {
    /// Usernames configured for an escalation category.
    pub fn escalation_list(&self, category: EscalationCategory) -> Vec<String> {
        let raw = match category {
            EscalationCategory::Panic => &self.panic_notifications,
            EscalationCategory::PerimeterViolation => &self.perimeter_violation_notifications,
            EscalationCategory::AlarmActivated => &self.alarm_activated_notifications,
            EscalationCategory::BadCompany => &self.bad_company_notifications,
            EscalationCategory::PublicViolence => &self.public_violence_notifications,
        };
        Self::split_list(raw.as_deref())
    }

    /// Usernames configured as cross-community additional targets.
    pub fn additional_usernames(&self) -> Vec<String> {
        Self::split_list(self.additional_notifications.as_deref())
    }

    fn split_list(raw: Option<&str>) -> Vec<String> {
        raw.map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
    }
}

/// A location inside a government community.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Location {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub location_type: LocationType,
    pub name: String,
}

/// Address blob stored on a recipient (home or work).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Address {
    pub city: Option<String>,
    pub neighborhood_id: Option<Uuid>,
}

/// A platform user. Fan-out only ever targets rows with `role = "user"`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Recipient {
    pub id: Uuid,
    pub username: String,
    pub role: String,
    pub active: bool,
    pub push_token: Option<String>,
    pub lot: Option<String>,
    pub customer_type: Option<String>,
    pub home_address: Option<serde_json::Value>,
    pub work_address: Option<serde_json::Value>,
    pub customer_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A broadcast notification. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub kind: NotificationKind,
    pub emergency: bool,
    pub from_lot: Option<String>,
    pub to_lot: Option<String>,
    pub location_id: Option<Uuid>,
    pub customer_id: Uuid,
    pub author_user_id: Uuid,
    pub send_at: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub additional_target_ids: Vec<Uuid>,
    pub trial_period: bool,
    pub created_at: DateTime<Utc>,
}

/// Durable per-recipient inbox row. Created only by fan-out; `read` moves
/// false → true exactly once and never back.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationRecipient {
    pub id: Uuid,
    pub notification_id: Uuid,
    pub recipient_id: Uuid,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_general_by_default() {
        assert_eq!(
            PushChannel::select(NotificationKind::Massive, false),
            PushChannel::General
        );
        assert_eq!(
            PushChannel::select(NotificationKind::Authorization, false),
            PushChannel::General
        );
    }

    #[test]
    fn test_channel_emergency_for_panic_kind() {
        assert_eq!(
            PushChannel::select(NotificationKind::Panic, false),
            PushChannel::Emergency
        );
    }

    #[test]
    fn test_channel_emergency_for_flag() {
        assert_eq!(
            PushChannel::select(NotificationKind::Massive, true),
            PushChannel::Emergency
        );
        assert_eq!(PushChannel::Emergency.as_str(), "emergency-notifications");
        assert_eq!(PushChannel::General.as_str(), "general-notifications");
    }

    #[test]
    fn test_settings_split_trims_and_drops_empties() {
        let settings = CommunitySettings {
            panic_notifications: Some("555100, 555200 ,,555300 ".to_string()),
            ..Default::default()
        };
        assert_eq!(
            settings.escalation_list(EscalationCategory::Panic),
            vec!["555100", "555200", "555300"]
        );
    }

    #[test]
    fn test_settings_unset_list_is_empty() {
        let settings = CommunitySettings::default();
        assert!(settings.escalation_list(EscalationCategory::Panic).is_empty());
        assert!(settings.additional_usernames().is_empty());
    }

    #[test]
    fn test_escalation_category_kinds() {
        assert_eq!(EscalationCategory::Panic.kind(), NotificationKind::Panic);
        assert_eq!(
            EscalationCategory::AlarmActivated.kind(),
            NotificationKind::Monitoring
        );
    }
}
