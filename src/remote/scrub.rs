use std::borrow::Cow;

const MAX_REMOTE_ERROR_CHARS: usize = 200;

// Secret-bearing prefixes and markers that can show up in service error bodies
// (OpenAI and Stability keys, Telegram api_hash, bearer tokens).
const PREFIX_PATTERNS: [&str; 2] = ["sk-", "sk_"];

const MARKER_PATTERNS: [&str; 10] = [
    "Authorization: Bearer ",
    "authorization: bearer ",
    "api_key=",
    "api_hash=",
    "\"api_key\":\"",
    "\"api_hash\":\"",
    "\"openai_key\":\"",
    "\"stability_key\":\"",
    "\"telegram_api_hash\":\"",
    "\"token\":\"",
];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+' | '/' | '=')
}

fn token_end(input: &str, from: usize) -> usize {
    let mut end = from;
    for (i, c) in input[from..].char_indices() {
        if is_secret_char(c) {
            end = from + i + c.len_utf8();
        } else {
            break;
        }
    }
    end
}

fn scrub_after_marker(scrubbed: &mut String, marker: &str) {
    let mut search_from = 0;
    while let Some(rel) = scrubbed[search_from..].find(marker) {
        let start = search_from + rel;
        let content_start = start + marker.len();
        let end = token_end(scrubbed, content_start);

        // Bare marker without a value.
        if end == content_start {
            search_from = content_start;
            continue;
        }

        scrubbed.replace_range(start..end, "[REDACTED]");
        search_from = start + "[REDACTED]".len();
    }
}

/// Redact secret-like tokens from text received from the service.
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    let needs_scrubbing = PREFIX_PATTERNS
        .iter()
        .chain(MARKER_PATTERNS.iter())
        .any(|pattern| input.contains(pattern));
    if !needs_scrubbing {
        return Cow::Borrowed(input);
    }

    let mut scrubbed = input.to_string();
    for pattern in PREFIX_PATTERNS.iter().chain(MARKER_PATTERNS.iter()) {
        scrub_after_marker(&mut scrubbed, pattern);
    }
    Cow::Owned(scrubbed)
}

/// Scrub secrets and truncate a remote error for display and logging.
pub fn sanitize_remote_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input.trim());

    if scrubbed.chars().count() <= MAX_REMOTE_ERROR_CHARS {
        return scrubbed.into_owned();
    }

    let scrubbed = scrubbed.as_ref();
    let mut end = MAX_REMOTE_ERROR_CHARS;
    while end > 0 && !scrubbed.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...", &scrubbed[..end])
}

/// Mask a configuration value for display, keeping a short prefix.
pub fn mask_secret(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let prefix: String = value.chars().take(4).collect();
    if value.chars().count() <= 8 {
        return "****".to_string();
    }
    format!("{prefix}****")
}
