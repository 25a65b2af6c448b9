use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Normalized record extracted from one event page. Created once per
/// successful run and immutable afterwards; persistence belongs to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    pub title: String,
    pub host: String,
    pub date: NaiveDate,
    pub time: String,
    pub venue: VenueInfo,
    pub fee: FeeClass,
    pub availability: AvailabilityState,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<BannerInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VenueInfo {
    Physical { name: String },
    Online { label: String },
    HiddenUntilRegistration,
    Unknown,
}

impl VenueInfo {
    pub fn kind(&self) -> &'static str {
        match self {
            VenueInfo::Physical { .. } => "physical",
            VenueInfo::Online { .. } => "online",
            VenueInfo::HiddenUntilRegistration => "hidden_until_registration",
            VenueInfo::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeClass {
    Free,
    Paid,
}

impl FeeClass {
    pub fn as_str(self) -> &'static str {
        match self {
            FeeClass::Free => "FREE",
            FeeClass::Paid => "PAID",
        }
    }
}

/// Mutually exclusive availability states of an event page. `Unknown` is the
/// terminal fallback when no indicator matches; a valid output, not an error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityState {
    Available,
    AvailableOnline,
    Waitlist,
    NotAvailable,
    EventExpired,
    Unknown,
}

impl AvailabilityState {
    pub fn as_str(self) -> &'static str {
        match self {
            AvailabilityState::Available => "available",
            AvailabilityState::AvailableOnline => "available_online",
            AvailabilityState::Waitlist => "waitlist",
            AvailabilityState::NotAvailable => "not_available",
            AvailabilityState::EventExpired => "event_expired",
            AvailabilityState::Unknown => "unknown",
        }
    }
}

/// Banner image; both fields come from the same `<img>` element, so the value
/// is all-or-nothing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BannerInfo {
    pub url: String,
    pub alt: String,
}
