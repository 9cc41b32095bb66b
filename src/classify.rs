//! Translation of raw engine diagnostics into user-facing error messages
//!
//! Matching is substring-based and evaluated in a fixed priority order; the
//! first matching rule wins. Text matching no rule is passed through unchanged
//! so unanticipated failures lose no information.

use serde::{Deserialize, Serialize};

/// User-facing failure category
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    /// The site refused the request (bot check, rate limit, forbidden)
    RateLimitedOrBlocked,
    /// The media is private, removed, or region-locked
    ContentUnavailable,
    /// DNS, connection, or timeout failure
    NetworkFailure,
    /// Anything else; the raw text is kept
    Unknown,
}

/// Result of classifying a diagnostic
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifiedError {
    /// Matched category
    pub category: ErrorCategory,
    /// Text to show the user
    pub message: String,
}

const BLOCKED_MESSAGE: &str = "The site is blocking automated downloads from this server \
     (bot check or rate limit). Please try again later.";

const UNAVAILABLE_MESSAGE: &str =
    "This content is unavailable: it may be private, removed, or restricted in this region.";

const NETWORK_MESSAGE: &str =
    "Network error while contacting the site. Check the URL and try again.";

/// Rules in priority order
const RULES: &[(ErrorCategory, &[&str])] = &[
    (
        ErrorCategory::RateLimitedOrBlocked,
        &[
            "Sign in to confirm you're not a bot",
            "Sign in to confirm you’re not a bot",
            "HTTP Error 429",
            "Too Many Requests",
            "HTTP Error 403",
        ],
    ),
    (
        ErrorCategory::ContentUnavailable,
        &[
            "Video unavailable",
            "Private video",
            "This video is not available",
            "This video has been removed",
            "not available in your country",
            "HTTP Error 404",
        ],
    ),
    (
        ErrorCategory::NetworkFailure,
        &[
            "timed out",
            "Connection refused",
            "Connection reset",
            "Network is unreachable",
            "Temporary failure in name resolution",
            "Name or service not known",
            "Unable to download webpage",
        ],
    ),
];

/// Classify raw diagnostic text
pub fn classify(raw: &str) -> ClassifiedError {
    for (category, needles) in RULES {
        if needles.iter().any(|needle| raw.contains(needle)) {
            return ClassifiedError {
                category: *category,
                message: category_message(*category).to_string(),
            };
        }
    }

    ClassifiedError {
        category: ErrorCategory::Unknown,
        message: raw.to_string(),
    }
}

fn category_message(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::RateLimitedOrBlocked => BLOCKED_MESSAGE,
        ErrorCategory::ContentUnavailable => UNAVAILABLE_MESSAGE,
        ErrorCategory::NetworkFailure => NETWORK_MESSAGE,
        ErrorCategory::Unknown => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bot_check_is_rate_limited_or_blocked() {
        let result = classify(
            "ERROR: [youtube] dQw4w9WgXcQ: Sign in to confirm you're not a bot. Use --cookies",
        );
        assert_eq!(result.category, ErrorCategory::RateLimitedOrBlocked);
        assert_eq!(result.message, BLOCKED_MESSAGE);
    }

    #[test]
    fn video_unavailable_is_content_unavailable() {
        let result = classify("ERROR: [youtube] abc: Video unavailable");
        assert_eq!(result.category, ErrorCategory::ContentUnavailable);
        assert_eq!(result.message, UNAVAILABLE_MESSAGE);
    }

    #[test]
    fn timeouts_are_network_failures() {
        let result = classify("ERROR: Unable to download webpage: The read operation timed out");
        assert_eq!(result.category, ErrorCategory::NetworkFailure);
    }

    #[test]
    fn earlier_rule_wins_when_several_match() {
        // Both a block marker and an unavailability marker: block has priority
        let result = classify("HTTP Error 429: Too Many Requests; Video unavailable");
        assert_eq!(result.category, ErrorCategory::RateLimitedOrBlocked);

        // Unavailable outranks network
        let result = classify("Video unavailable (connection timed out while retrying)");
        assert_eq!(result.category, ErrorCategory::ContentUnavailable);
    }

    #[test]
    fn unrecognized_text_passes_through_verbatim() {
        let raw = "ERROR: ffprobe and ffmpeg not found. Please install";
        let result = classify(raw);
        assert_eq!(result.category, ErrorCategory::Unknown);
        assert_eq!(result.message, raw);
    }

    #[test]
    fn classification_is_deterministic() {
        let raw = "Video unavailable";
        assert_eq!(classify(raw), classify(raw));
    }

    #[test]
    fn empty_text_is_unknown_and_empty() {
        let result = classify("");
        assert_eq!(result.category, ErrorCategory::Unknown);
        assert!(result.message.is_empty());
    }
}
