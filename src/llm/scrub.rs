use crate::error::LlmError;
use std::borrow::Cow;

const MAX_API_ERROR_CHARS: usize = 200;
const REDACTED: &str = "[REDACTED]";

/// Key prefixes used by the narrative and image providers.
const PREFIX_PATTERNS: [&str; 3] = ["sk-ant-", "sk-proj-", "sk-"];

/// Header / query / JSON markers that precede a credential.
const MARKER_PATTERNS: [&str; 6] = [
    "Authorization: Bearer ",
    "authorization: bearer ",
    "x-api-key: ",
    "api_key=",
    "\"api_key\":\"",
    "\"x-api-key\":\"",
];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+' | '/' | '=')
}

fn token_end(input: &str, from: usize) -> usize {
    input[from..]
        .char_indices()
        .find(|(_, c)| !is_secret_char(*c))
        .map_or(input.len(), |(i, _)| from + i)
}

/// Redact the token following every occurrence of `marker`. For prefix
/// patterns the prefix itself is part of the secret.
fn redact_after(scrubbed: &mut String, marker: &str, include_marker: bool) {
    let mut search_from = 0;
    while let Some(rel) = scrubbed[search_from..].find(marker) {
        let start = search_from + rel;
        let content_start = start + marker.len();
        let end = token_end(scrubbed, content_start);

        if end == content_start {
            search_from = content_start;
            continue;
        }

        let redact_from = if include_marker { start } else { content_start };
        scrubbed.replace_range(redact_from..end, REDACTED);
        search_from = redact_from + REDACTED.len();
    }
}

/// Scrub API keys and bearer tokens out of provider error text.
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    let needs_scrubbing = PREFIX_PATTERNS
        .iter()
        .chain(MARKER_PATTERNS.iter())
        .any(|pattern| input.contains(pattern));
    if !needs_scrubbing {
        return Cow::Borrowed(input);
    }

    let mut scrubbed = input.to_string();
    for marker in MARKER_PATTERNS {
        redact_after(&mut scrubbed, marker, false);
    }
    for prefix in PREFIX_PATTERNS {
        redact_after(&mut scrubbed, prefix, true);
    }
    Cow::Owned(scrubbed)
}

/// Sanitize API error text by scrubbing secrets and truncating length.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);
    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed.into_owned();
    }

    let scrubbed = scrubbed.as_ref();
    let mut end = MAX_API_ERROR_CHARS;
    while end > 0 && !scrubbed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &scrubbed[..end])
}

/// Build a sanitized provider error from a failed HTTP response.
pub async fn api_error(provider: &str, response: reqwest::Response) -> LlmError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read provider error body>".to_string());
    LlmError::Status {
        provider: provider.to_string(),
        status,
        message: sanitize_api_error(&body),
    }
}

/// Wrap a transport failure, scrubbing anything echoed back from the request.
pub fn request_error(provider: &str, err: &reqwest::Error) -> LlmError {
    LlmError::Request {
        provider: provider.to_string(),
        message: sanitize_api_error(&err.to_string()),
    }
}
