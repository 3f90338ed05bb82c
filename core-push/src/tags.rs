//! Device tag parsing and validation.

use crate::error::{PushError, Result};

/// Longest accepted tag, in characters.
pub const MAX_TAG_LENGTH: usize = 12;

/// Split a raw comma-separated tag string into normalized tags.
///
/// Tags are lower-cased and trimmed; empty entries and duplicates are dropped
/// while keeping first-seen order.
///
/// ```
/// use core_push::parse_tags;
///
/// assert_eq!(parse_tags(" News, sports,,NEWS "), vec!["news", "sports"]);
/// ```
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let tag = part.to_lowercase().trim().to_string();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Check a single normalized tag.
pub fn validate_tag(tag: &str) -> Result<()> {
    if tag.chars().count() > MAX_TAG_LENGTH {
        return Err(PushError::Validation(format!(
            "tag '{}' is longer than {} characters",
            tag, MAX_TAG_LENGTH
        )));
    }

    if !tag
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(PushError::Validation(format!(
            "tag '{}' may only contain letters, digits, '_' and '-'",
            tag
        )));
    }

    Ok(())
}

/// Parse `raw` and validate every resulting tag.
pub fn validate_tags(raw: &str) -> Result<Vec<String>> {
    let tags = parse_tags(raw);
    for tag in &tags {
        validate_tag(tag)?;
    }
    Ok(tags)
}
