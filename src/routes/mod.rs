use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub mod auth;
pub mod billing;
pub mod downloads;
pub mod plans;
pub mod stripe;
pub mod subscription;
pub mod usage;

/// API timestamps are RFC 3339 strings; formatting failures degrade to
/// null rather than dropping the response.
pub(crate) fn rfc3339(dt: OffsetDateTime) -> Option<String> {
    dt.format(&Rfc3339).ok()
}
