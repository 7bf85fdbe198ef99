//! Syntax rules for creator ids, work ids and backup names.
//!
//! Ids are opaque tokens matching `[0-9a-z-]+`; backup names are decimal
//! strings. Everything else in the storage layer assumes its inputs already
//! passed these checks.

/// Why an id was rejected.
#[derive(Debug, PartialEq, Eq)]
pub enum IdError {
    /// Id is empty or whitespace-only.
    Required,
    /// Id contains a character outside `[0-9a-z-]`.
    Invalid,
}

/// Validates a creator or work id, returning the trimmed value.
pub fn validate_id(id: &str) -> Result<&str, IdError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(IdError::Required);
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(IdError::Invalid);
    }
    Ok(trimmed)
}

/// Returns true if `id` is a syntactically valid creator/work id.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Returns true if `name` is a syntactically valid backup name (decimal digits).
pub fn is_valid_backup_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_digit())
}
