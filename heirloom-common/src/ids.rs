//! Canonical identifier utilities

use uuid::Uuid;

/// Generate a new canonical identifier (UUIDv4)
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Check whether a reference string is already in canonical form.
///
/// This is a format check only; it does not verify that a row with this
/// identifier exists.
pub fn is_canonical(reference: &str) -> bool {
    Uuid::parse_str(reference).is_ok()
}

/// Parse a canonical identifier from a string
pub fn parse(s: &str) -> Result<Uuid, uuid::Error> {
    Uuid::parse_str(s)
}
