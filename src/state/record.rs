use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One validated profile
///
/// A record only exists when the page carried a name and a phone number
/// that passed validation. Records are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Profile ID, unique across the sweep
    pub id: u64,

    /// Display name from the profile heading
    pub name: String,

    /// Canonical 9-digit phone number
    pub phone: String,

    /// Registration date label, verbatim from the page
    pub registration_date_raw: Option<String>,

    /// Last-seen date label, verbatim from the page
    pub last_seen_date_raw: Option<String>,

    /// Number of listings the profile advertises
    pub listing_count: Option<u32>,

    /// URL the profile was fetched from
    pub source_url: String,

    /// When the page was parsed
    pub fetched_at: DateTime<Utc>,
}

impl Record {
    /// Two-digit operator prefix of the phone number
    pub fn phone_prefix(&self) -> &str {
        self.phone.get(..2).unwrap_or("")
    }
}
