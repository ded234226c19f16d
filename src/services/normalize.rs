//! Content normalization applied before a post or comment is admitted.
//!
//! Collapses runs of blank lines and enforces the per-kind length bounds.
//! Nothing else is sanitized; content is stored verbatim otherwise.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{AppError, Result};

const MAX_CONSECUTIVE_NEWLINES: usize = 3;

/// A newline optionally followed by whitespace, repeated 4+ times.
static NEWLINE_RUN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\n\s*){4,}").expect("Invalid newline run regex"));

/// Which entity kind the text is destined for; each kind carries its own
/// length bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Post,
    Comment,
}

impl ContentKind {
    pub fn bounds(self) -> (usize, usize) {
        match self {
            ContentKind::Post => (10, 500),
            ContentKind::Comment => (10, 300),
        }
    }

    fn label(self) -> &'static str {
        match self {
            ContentKind::Post => "Post",
            ContentKind::Comment => "Comment",
        }
    }
}

/// Validate the raw text against the kind's bounds and collapse excessive
/// blank-line runs down to exactly three newlines.
///
/// The bound is checked on the original text; collapsing only shortens, so
/// the re-check on the output normally cannot fire on the upper bound.
pub fn normalize(raw: &str, kind: ContentKind) -> Result<String> {
    let (min, max) = kind.bounds();

    check_bounds(raw.chars().count(), kind, min, max)?;

    let collapsed = collapse_newlines(raw);

    check_bounds(collapsed.chars().count(), kind, min, max)?;

    Ok(collapsed)
}

/// Collapse any run of 4+ newline-like separators to exactly three
/// newlines.
pub fn collapse_newlines(text: &str) -> String {
    NEWLINE_RUN_REGEX
        .replace_all(text, "\n".repeat(MAX_CONSECUTIVE_NEWLINES))
        .into_owned()
}

fn check_bounds(len: usize, kind: ContentKind, min: usize, max: usize) -> Result<()> {
    if len < min || len > max {
        return Err(AppError::Validation(format!(
            "{} must be between {} and {} characters",
            kind.label(),
            min,
            max
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_five_blank_line_run_to_three() {
        assert_eq!(collapse_newlines("a\n\n\n\n\nb"), "a\n\n\nb");
    }

    #[test]
    fn test_normalize_applies_collapse() {
        let text = format!("padpadpad a{}b padpadpad", "\n".repeat(5));
        let out = normalize(&text, ContentKind::Post).unwrap();
        assert!(out.contains("a\n\n\nb"));
        assert!(!out.contains("\n\n\n\n"));
    }

    #[test]
    fn test_collapses_newlines_with_interleaved_whitespace() {
        let text = "left margin \n \n\t\n \n right margin";
        let out = normalize(text, ContentKind::Post).unwrap();
        assert_eq!(out, "left margin \n\n\nright margin");
    }

    #[test]
    fn test_three_newlines_left_untouched() {
        let text = "first block\n\n\nsecond block";
        let out = normalize(text, ContentKind::Post).unwrap();
        assert_eq!(out, text);
    }

    #[test]
    fn test_post_too_short_rejected() {
        let err = normalize("short", ContentKind::Post).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_post_too_long_rejected() {
        let text = "x".repeat(501);
        assert!(normalize(&text, ContentKind::Post).is_err());
        let text = "x".repeat(500);
        assert!(normalize(&text, ContentKind::Post).is_ok());
    }

    #[test]
    fn test_comment_bounds_are_tighter() {
        let text = "x".repeat(400);
        assert!(normalize(&text, ContentKind::Post).is_ok());
        assert!(normalize(&text, ContentKind::Comment).is_err());
    }

    #[test]
    fn test_content_otherwise_verbatim() {
        let text = "  <b>unsanitized</b> & emoji 🦀 stay as-is  ";
        let out = normalize(text, ContentKind::Comment).unwrap();
        assert_eq!(out, text);
    }
}
