//! Best-effort text scraping from raw PDF bytes.
//!
//! This does not parse PDF objects, fonts or encodings. It decodes the bytes
//! permissively and harvests two kinds of fragments:
//!
//! - literal strings in parentheses, the way uncompressed content streams
//!   draw text (`(Photosynthesis converts light) Tj`);
//! - long runs of letters and spaces found between `stream` / `endstream`.
//!
//! Compressed streams yield nothing useful, so output is often short or
//! empty. Callers decide what to do with that.

use once_cell::sync::Lazy;
use regex::Regex;

static PAREN_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((.*?)\)").expect("literal string pattern"));
static STREAM_BODY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)stream\s*(.*?)\s*endstream").expect("stream pattern"));
static READABLE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z\s]{10,}").expect("readable run pattern"));
static NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\s.,!?;:\-]").expect("noise pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Extract readable text from raw document bytes.
///
/// Never fails: an input with nothing recognizable produces an empty string.
pub fn extract_text(bytes: &[u8]) -> String {
    let decoded = String::from_utf8_lossy(bytes);
    let mut fragments: Vec<String> = Vec::new();

    for caps in PAREN_TEXT.captures_iter(&decoded) {
        let Some(inner) = caps.get(1) else { continue };
        let stripped = inner.as_str().replace(['(', ')'], "");
        let candidate = stripped.trim();
        if candidate.chars().count() > 2 && candidate.chars().any(|c| c.is_ascii_alphabetic()) {
            fragments.push(candidate.to_string());
        }
    }

    for caps in STREAM_BODY.captures_iter(&decoded) {
        let Some(body) = caps.get(1) else { continue };
        for run in READABLE_RUN.find_iter(body.as_str()) {
            let run = run.as_str().trim();
            if run.chars().count() > 10 {
                fragments.push(run.to_string());
            }
        }
    }

    let joined = fragments.join(" ");
    let text = clean_text(&joined);
    tracing::debug!(bytes = bytes.len(), chars = text.len(), "extracted text from document");
    text
}

/// Replace punctuation noise with spaces and collapse whitespace.
///
/// Noise is removed first, so a stray symbol between two words never leaves
/// a run of spaces behind.
///
/// The result is ASCII: letters, digits, underscores, single spaces and
/// sentence punctuation.
pub fn clean_text(raw: &str) -> String {
    let denoised = NOISE.replace_all(raw, " ");
    let ascii: String = denoised
        .chars()
        .map(|c| if c.is_ascii() { c } else { ' ' })
        .collect();
    WHITESPACE.replace_all(&ascii, " ").trim().to_string()
}
