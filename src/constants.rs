// Environment variable names
pub const FEED_URL_VAR: &str = "FEED_URL";
pub const EMAIL_FROM_VAR: &str = "EMAIL_FROM";
pub const EMAIL_TO_VAR: &str = "EMAIL_TO";
pub const EMAIL_SUBJECT_VAR: &str = "EMAIL_SUBJECT";
pub const SMTP_SERVER_VAR: &str = "SMTP_SERVER";
pub const HTML_PREAMBLE_FILE_VAR: &str = "HTML_PREAMBLE_FILE";
pub const HTML_CSS_FILE_VAR: &str = "HTML_CSS_FILE";
pub const TEXT_PREAMBLE_FILE_VAR: &str = "TEXT_PREAMBLE_FILE";
pub const DETAILS_BASE_URL_VAR: &str = "DETAILS_BASE_URL";
pub const BANK_HOLIDAYS_URL_VAR: &str = "BANK_HOLIDAYS_URL";
pub const BANK_HOLIDAY_DIVISION_VAR: &str = "BANK_HOLIDAY_DIVISION";

// Defaults
pub const DEFAULT_DETAILS_BASE_URL: &str = "https://data.ox.ac.uk/v/";
pub const DEFAULT_BANK_HOLIDAYS_URL: &str = "https://www.gov.uk/bank-holidays.json";
pub const DEFAULT_BANK_HOLIDAY_DIVISION: &str = "england-and-wales";
pub const DEFAULT_SMTP_PORT: u16 = 25;

// Description markers and the tags they produce
pub const INTERNAL_MARKER: &str = "INTERNAL";
pub const READVERTISEMENT_MARKER: &str = "ADVERTISEMENT";
pub const INTERNAL_TAG: &str = "internal applicants only";
pub const READVERTISEMENT_TAG: &str = "re-advertisement";

// Feed format
pub const HTML_MEDIA_TYPE: &str = "text/html";

// Rendering
/// Fill width of the text body. Wrapping breaks at spaces and after in-word
/// hyphens but collapses whitespace runs, unlike a column-preserving fill.
pub const TEXT_WIDTH: usize = 70;
pub const CLOSING_SOON_HOURS: i64 = 48;
pub const CLOSING_DATE_FORMAT: &str = "%a, %d %b %Y, %I:%M %p";
pub const UNKNOWN_CLOSING_DATE: &str = "unknown";
pub const NEW_BADGE: &str = "\u{2605} new";
pub const MORE_DETAILS_LABEL: &str = "More details\u{2026}";
