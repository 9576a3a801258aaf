//! Profile page parser
//!
//! This module turns one fetched profile page into an `IdOutcome`:
//! - A `ProfileParser` pulls candidate fields out of the markup
//! - `extract` hands the phone candidate to the validator and assembles the record
//!
//! The markup dependency stays behind `ProfileParser`, so a layout change on
//! the target site only touches `MarkupParser`.

use crate::phone::validate_phone;
use crate::state::{IdOutcome, Record};
use chrono::Utc;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Heading that carries the profile's display name
const NAME_SELECTOR: &str = "h2.pb-0";

/// Class of the `div` that wraps the profile details
const CONTENT_BLOCK_CLASS: &str = "p-2";

/// Loose phone shape: 3-3-2-2 digit groups with optional separators
const PHONE_PATTERN: &str = r"\(?\d{3}\)?\s*\d{3}[-\s]?\d{2}[-\s]?\d{2}";

const REGISTRATION_PATTERN: &str = r"(?s)Qeydiyyat tarixi:\s*(.+?)(?:\n|<br)";
const LAST_SEEN_PATTERN: &str = r"(?s)Saytda olduğu tarix:\s*(.+?)(?:\n|<br)";
const LISTING_COUNT_PATTERN: &str = r"Elan sayı:\s*(\d+)";

/// Candidate fields of one profile, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileFields {
    /// Display name, trimmed and non-empty
    pub name: String,

    /// Phone-shaped substring, unvalidated
    pub phone_raw: Option<String>,

    /// Registration date label
    pub registration_date_raw: Option<String>,

    /// Last-seen date label
    pub last_seen_date_raw: Option<String>,

    /// Listing count
    pub listing_count: Option<u32>,
}

/// Strategy for reading candidate fields out of a page body
pub trait ProfileParser: Send + Sync {
    /// Parses a page body
    ///
    /// # Returns
    ///
    /// * `Some(ProfileFields)` - The page names a profile
    /// * `None` - No name heading, or its text is empty
    fn parse(&self, body: &str) -> Option<ProfileFields>;
}

/// Parser for the profile page markup
///
/// Regexes are compiled once per parser and shared by every pipeline task.
#[derive(Debug, Clone)]
pub struct MarkupParser {
    phone: Regex,
    registration: Regex,
    last_seen: Regex,
    listing_count: Regex,
}

impl MarkupParser {
    /// Creates a parser, compiling its label patterns
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            phone: Regex::new(PHONE_PATTERN)?,
            registration: Regex::new(REGISTRATION_PATTERN)?,
            last_seen: Regex::new(LAST_SEEN_PATTERN)?,
            listing_count: Regex::new(LISTING_COUNT_PATTERN)?,
        })
    }

    /// Captures the first group of `pattern` in `text`, trimmed
    fn capture(pattern: &Regex, text: &str) -> Option<String> {
        pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

impl ProfileParser for MarkupParser {
    fn parse(&self, body: &str) -> Option<ProfileFields> {
        let document = Html::parse_document(body);
        let name_selector = Selector::parse(NAME_SELECTOR).ok()?;

        let heading = document.select(&name_selector).next()?;
        let name = heading.text().collect::<String>().trim().to_string();
        if name.is_empty() {
            return None;
        }

        let mut fields = ProfileFields {
            name,
            ..ProfileFields::default()
        };

        let Some(block) = content_block(heading) else {
            tracing::trace!("Profile '{}' has no content block", fields.name);
            return Some(fields);
        };
        let text = block.text().collect::<String>();

        fields.phone_raw = self.phone.find(&text).map(|m| m.as_str().to_string());
        fields.registration_date_raw = Self::capture(&self.registration, &text);
        fields.last_seen_date_raw = Self::capture(&self.last_seen, &text);
        fields.listing_count =
            Self::capture(&self.listing_count, &text).and_then(|count| count.parse().ok());

        Some(fields)
    }
}

/// Finds the nearest enclosing `div` with the content block class
fn content_block(heading: ElementRef<'_>) -> Option<ElementRef<'_>> {
    heading.ancestors().filter_map(ElementRef::wrap).find(|element| {
        element.value().name() == "div"
            && element
                .value()
                .classes()
                .any(|class| class == CONTENT_BLOCK_CLASS)
    })
}

/// Extracts and validates one profile page
///
/// # Arguments
///
/// * `parser` - Strategy reading candidate fields out of the markup
/// * `body` - Raw page body
/// * `id` - Profile ID the page was fetched for
/// * `source_url` - URL the page was fetched from
///
/// # Returns
///
/// `IdOutcome::Collected` when a name and a valid phone were found, otherwise
/// the outcome naming what was missing or rejected.
pub fn extract(parser: &dyn ProfileParser, body: &str, id: u64, source_url: &str) -> IdOutcome {
    let Some(fields) = parser.parse(body) else {
        return IdOutcome::MissingName;
    };

    let Some(phone_raw) = fields.phone_raw else {
        return IdOutcome::MissingIdentifier;
    };

    let phone = match validate_phone(&phone_raw) {
        Ok(phone) => phone,
        Err(reason) => {
            return IdOutcome::InvalidIdentifier {
                raw: phone_raw,
                reason,
            }
        }
    };

    IdOutcome::Collected(Record {
        id,
        name: fields.name,
        phone,
        registration_date_raw: fields.registration_date_raw,
        last_seen_date_raw: fields.last_seen_date_raw,
        listing_count: fields.listing_count,
        source_url: source_url.to_string(),
        fetched_at: Utc::now(),
    })
}
