//! Notification targeting — turns a notification + its owning community into
//! a recipient filter.
//!
//! Rules, evaluated in order:
//! 1. Government community with a location set: locality → city match,
//!    neighborhood → neighborhood match
//! 2. Business community with both lot bounds set: lexicographic lot range
//! 3. Otherwise: every recipient of the community
//!
//! Filter construction is pure; the referenced location is preloaded by the
//! caller so a missing location can be rejected before anything is persisted.

use uuid::Uuid;

use vigia_common::error::AppError;
use vigia_common::types::{Community, CommunityType, Location, LocationType};

/// Targeting behavior, selected once per community type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetingStrategy {
    Government,
    Business,
}

impl TargetingStrategy {
    pub fn for_community(community: &Community) -> Self {
        match community.community_type {
            CommunityType::Government => TargetingStrategy::Government,
            CommunityType::Business => TargetingStrategy::Business,
        }
    }
}

/// Targeting-relevant fields of a notification, available before the row
/// exists.
#[derive(Debug, Clone, Default)]
pub struct TargetSpec {
    pub location_id: Option<Uuid>,
    pub from_lot: Option<String>,
    pub to_lot: Option<String>,
}

/// How candidate recipients are narrowed inside the community scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetingRule {
    /// Home or work city equals the locality name.
    City { name: String },
    /// Home address neighborhood equals the location id.
    Neighborhood { location_id: Uuid },
    /// Lot code lexicographically between `from` and `to`, inclusive.
    /// String compare, not numeric — callers must zero-pad lot codes.
    LotRange { from: String, to: String },
    /// Every recipient of the community.
    All,
}

/// Recipient filter handed to the recipient store. Always additionally
/// scoped to active role-"user" rows of the community.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientFilter {
    pub community_id: Uuid,
    pub rule: TargetingRule,
}

impl RecipientFilter {
    /// Build the filter for a notification.
    ///
    /// `location` must be the preloaded location named by
    /// `spec.location_id` — `None` (or a mismatched id) fails with
    /// `InvalidLocation` when a government notification references one.
    pub fn build(
        spec: &TargetSpec,
        community: &Community,
        location: Option<&Location>,
    ) -> Result<Self, AppError> {
        let rule = match TargetingStrategy::for_community(community) {
            TargetingStrategy::Government => match spec.location_id {
                Some(location_id) => {
                    let location = location
                        .filter(|l| l.id == location_id)
                        .ok_or(AppError::InvalidLocation(location_id))?;
                    match location.location_type {
                        LocationType::Locality => TargetingRule::City {
                            name: location.name.clone(),
                        },
                        LocationType::Neighborhood => TargetingRule::Neighborhood {
                            location_id: location.id,
                        },
                    }
                }
                None => TargetingRule::All,
            },
            TargetingStrategy::Business => match (&spec.from_lot, &spec.to_lot) {
                (Some(from), Some(to)) => TargetingRule::LotRange {
                    from: from.clone(),
                    to: to.clone(),
                },
                _ => TargetingRule::All,
            },
        };

        Ok(RecipientFilter {
            community_id: community.id,
            rule,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_community(community_type: CommunityType) -> Community {
        Community {
            id: Uuid::new_v4(),
            name: "Los Alamos".to_string(),
            community_type,
            parent_id: None,
            trial_period: false,
            settings: None,
            created_at: Utc::now(),
        }
    }

    fn make_location(location_type: LocationType, name: &str) -> Location {
        Location {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            location_type,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_government_locality_targets_city() {
        let community = make_community(CommunityType::Government);
        let location = make_location(LocationType::Locality, "Rosario");
        let spec = TargetSpec {
            location_id: Some(location.id),
            ..Default::default()
        };

        let filter = RecipientFilter::build(&spec, &community, Some(&location)).unwrap();
        assert_eq!(filter.community_id, community.id);
        assert_eq!(
            filter.rule,
            TargetingRule::City {
                name: "Rosario".to_string()
            }
        );
    }

    #[test]
    fn test_government_neighborhood_targets_neighborhood() {
        let community = make_community(CommunityType::Government);
        let location = make_location(LocationType::Neighborhood, "Centro");
        let spec = TargetSpec {
            location_id: Some(location.id),
            ..Default::default()
        };

        let filter = RecipientFilter::build(&spec, &community, Some(&location)).unwrap();
        assert_eq!(
            filter.rule,
            TargetingRule::Neighborhood {
                location_id: location.id
            }
        );
    }

    #[test]
    fn test_government_missing_location_is_invalid() {
        let community = make_community(CommunityType::Government);
        let location_id = Uuid::new_v4();
        let spec = TargetSpec {
            location_id: Some(location_id),
            ..Default::default()
        };

        let err = RecipientFilter::build(&spec, &community, None).unwrap_err();
        assert!(matches!(err, AppError::InvalidLocation(id) if id == location_id));
    }

    #[test]
    fn test_government_mismatched_location_is_invalid() {
        let community = make_community(CommunityType::Government);
        let other = make_location(LocationType::Locality, "Rosario");
        let spec = TargetSpec {
            location_id: Some(Uuid::new_v4()),
            ..Default::default()
        };

        let result = RecipientFilter::build(&spec, &community, Some(&other));
        assert!(matches!(result, Err(AppError::InvalidLocation(_))));
    }

    #[test]
    fn test_government_without_location_targets_all() {
        let community = make_community(CommunityType::Government);
        let filter =
            RecipientFilter::build(&TargetSpec::default(), &community, None).unwrap();
        assert_eq!(filter.rule, TargetingRule::All);
    }

    #[test]
    fn test_business_lot_bounds_target_range() {
        let community = make_community(CommunityType::Business);
        let spec = TargetSpec {
            from_lot: Some("020".to_string()),
            to_lot: Some("050".to_string()),
            ..Default::default()
        };

        let filter = RecipientFilter::build(&spec, &community, None).unwrap();
        assert_eq!(
            filter.rule,
            TargetingRule::LotRange {
                from: "020".to_string(),
                to: "050".to_string()
            }
        );
    }

    #[test]
    fn test_business_single_bound_targets_all() {
        let community = make_community(CommunityType::Business);
        let spec = TargetSpec {
            from_lot: Some("020".to_string()),
            ..Default::default()
        };

        let filter = RecipientFilter::build(&spec, &community, None).unwrap();
        assert_eq!(filter.rule, TargetingRule::All);
    }

    #[test]
    fn test_business_ignores_location() {
        // Location-based targeting only applies to government communities.
        let community = make_community(CommunityType::Business);
        let spec = TargetSpec {
            location_id: Some(Uuid::new_v4()),
            ..Default::default()
        };

        let filter = RecipientFilter::build(&spec, &community, None).unwrap();
        assert_eq!(filter.rule, TargetingRule::All);
    }
}
