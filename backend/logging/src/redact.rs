//! Log Redaction Layer
//!
//! Scrubs provider credentials from strings before they reach a log sink.
//! Remote error bodies sometimes echo the key that was sent, so everything
//! user- or service-provided goes through here first.

use regex::Regex;
use std::sync::LazyLock;

static OPENAI_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"sk-[A-Za-z0-9_\-]{16,}").unwrap());
static BEARER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bearer\s+[A-Za-z0-9\-\._~+/]+=*").unwrap());
static AUTH_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)("?authorization"?\s*[:=]\s*"?)[^\s",}]+"#).unwrap());
// AssemblyAI keys are bare 32-character lowercase hex strings.
static HEX_KEY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[0-9a-f]{32}\b").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = BEARER_RE.replace_all(input, "[REDACTED_TOKEN]");
    let redacted = AUTH_HEADER_RE.replace_all(&redacted, "${1}[REDACTED_TOKEN]");
    let redacted = OPENAI_KEY_RE.replace_all(&redacted, "[REDACTED_KEY]");
    HEX_KEY_RE
        .replace_all(&redacted, "[REDACTED_KEY]")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_openai_key_and_bearer() {
        let raw = "Incorrect API key provided: sk-proj-abcdefghijklmnop1234. Bearer eyJhbGciOiJIUzI1NiJ9";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("sk-proj-abcdefghijklmnop1234"));
        assert!(!clean.contains("eyJhbGciOiJIUzI1NiJ9"));
        assert!(clean.starts_with("Incorrect API key provided:"));
    }

    #[test]
    fn redacts_authorization_header_value() {
        let clean = redact_sensitive_data(r#"{"authorization": "abc123secret", "x": 1}"#);
        assert!(!clean.contains("abc123secret"));
        assert!(clean.contains("authorization"));
    }

    #[test]
    fn redacts_hex_keys_only_when_whole() {
        let key = "0123456789abcdef0123456789abcdef";
        assert_eq!(redact_sensitive_data(key), "[REDACTED_KEY]");
        let id = "job 0123456789abcdef";
        assert_eq!(redact_sensitive_data(id), id);
    }

    #[test]
    fn leaves_ordinary_text_alone() {
        let text = "تحليل الفيديو اكتمل في 12 ثانية";
        assert_eq!(redact_sensitive_data(text), text);
    }
}
