use thiserror::Error;

/// Two-digit operator prefixes accepted after normalization
pub const VALID_PREFIXES: [&str; 8] = ["10", "50", "51", "55", "60", "70", "77", "99"];

/// Length of a canonical identifier
const CANONICAL_LEN: usize = 9;

/// Why a raw phone string was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneRejection {
    /// Fewer than nine digits survived cleaning
    #[error("expected at least 9 digits, found {digits}")]
    TooShort { digits: usize },

    /// The first two digits are not an operator prefix
    #[error("prefix '{0}' is not an allowed operator prefix")]
    BadPrefix(String),

    /// Subscriber numbers never start with 0 or 1
    #[error("third digit '{0}' must not be 0 or 1")]
    BadThirdDigit(char),
}

impl PhoneRejection {
    /// Stable label used in logs and reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TooShort { .. } => "invalid_identifier_format",
            Self::BadPrefix(_) => "invalid_identifier_prefix",
            Self::BadThirdDigit(_) => "invalid_identifier_digit",
        }
    }
}

/// Strips every non-digit character
pub fn clean_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Reduces a raw phone-like string to its canonical 9-digit form
///
/// # Rules
///
/// 1. Drop every non-digit character
/// 2. Keep the last 9 digits (country code and trunk prefix fall away)
/// 3. Reject when fewer than 9 digits remain
/// 4. The first two digits must be one of [`VALID_PREFIXES`]
/// 5. The third digit must not be `0` or `1`
///
/// # Example
///
/// ```
/// use mojo_sweep::phone::validate_phone;
///
/// assert_eq!(validate_phone("+994 50 555 12 34").unwrap(), "505551234");
/// assert!(validate_phone("994405551234").is_err());
/// ```
pub fn validate_phone(raw: &str) -> Result<String, PhoneRejection> {
    let digits = clean_phone(raw);

    if digits.len() < CANONICAL_LEN {
        return Err(PhoneRejection::TooShort {
            digits: digits.len(),
        });
    }

    // ASCII digits only, so byte slicing is char-aligned
    let canonical = &digits[digits.len() - CANONICAL_LEN..];

    let prefix = &canonical[..2];
    if !VALID_PREFIXES.contains(&prefix) {
        return Err(PhoneRejection::BadPrefix(prefix.to_string()));
    }

    let third = char::from(canonical.as_bytes()[2]);
    if third == '0' || third == '1' {
        return Err(PhoneRejection::BadThirdDigit(third));
    }

    Ok(canonical.to_string())
}
