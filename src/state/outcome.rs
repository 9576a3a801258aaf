/// Per-ID outcome definitions
///
/// Every ID the sweep attempts settles into exactly one of these outcomes.
/// None of them is an error: they are counted and the sweep moves on.
use crate::phone::PhoneRejection;
use crate::state::Record;
use std::fmt;

/// The settled result of fetching, extracting and validating one ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdOutcome {
    // ===== Success =====
    /// A validated record was produced
    Collected(Record),

    // ===== Fetched, but no record =====
    /// The page has no name heading (deleted or never-registered profile)
    MissingName,

    /// The profile has no phone-shaped text
    MissingIdentifier,

    /// The phone-shaped text failed validation
    InvalidIdentifier {
        /// The phone-shaped substring as found on the page
        raw: String,
        /// Which validation rule rejected it
        reason: PhoneRejection,
    },

    // ===== Fetch failures =====
    /// The server answered with something other than 200
    HttpError(u16),

    /// The request did not finish within its timeout
    Timeout,

    /// Any other transport failure
    NetworkError(String),
}

impl IdOutcome {
    /// Stable snake_case label for logs and reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Collected(_) => "collected",
            Self::MissingName => "missing_name",
            Self::MissingIdentifier => "missing_identifier",
            Self::InvalidIdentifier { reason, .. } => reason.kind(),
            Self::HttpError(_) => "http_non_200",
            Self::Timeout => "network_timeout",
            Self::NetworkError(_) => "network_error",
        }
    }
}

impl fmt::Display for IdOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collected(record) => write!(f, "{} - {}", record.name, record.phone),
            Self::MissingName => write!(f, "no name"),
            Self::MissingIdentifier => write!(f, "no phone found"),
            Self::InvalidIdentifier { raw, reason } => {
                write!(f, "invalid phone '{}': {}", raw, reason)
            }
            Self::HttpError(status) => write!(f, "HTTP {}", status),
            Self::Timeout => write!(f, "timeout"),
            Self::NetworkError(cause) => write!(f, "network error: {}", cause),
        }
    }
}
