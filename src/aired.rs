//! Release-year extraction from the free-text `Aired` column.
//!
//! `Aired` holds either a single broadcast date (`"Jan 1, 2005"`) or a range
//! (`"Apr 3, 1998 to Sep 25, 1998"`). The release year is the first token of
//! the segment that follows the first `", "`. Anything without that comma is
//! rejected; callers treat the failure as fatal.

use thiserror::Error;

const DATE_SEPARATOR: &str = ", ";
const RANGE_MARKER: &str = " to ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AiredError {
    #[error("aired value '{0}' has no ', ' separator before the year")]
    MissingComma(String),
    #[error("aired value '{aired}' does not start its year segment with an integer ('{token}')")]
    InvalidYear { aired: String, token: String },
}

pub fn parse_release_year(aired: &str) -> Result<i32, AiredError> {
    let (_, after_comma) = aired
        .split_once(DATE_SEPARATOR)
        .ok_or_else(|| AiredError::MissingComma(aired.to_string()))?;
    let segment = after_comma
        .split(DATE_SEPARATOR)
        .next()
        .unwrap_or(after_comma);
    let token = if aired.contains(RANGE_MARKER) {
        segment.split(' ').next().unwrap_or(segment)
    } else {
        segment
    };
    token
        .trim()
        .parse::<i32>()
        .map_err(|_| AiredError::InvalidYear {
            aired: aired.to_string(),
            token: token.to_string(),
        })
}
