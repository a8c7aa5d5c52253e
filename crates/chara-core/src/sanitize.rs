//! Markdown-to-plain-text sanitizer for TTS.
//!
//! The reply shown to the user keeps its Markdown; the copy sent to the
//! TTS server must not, or the voice reads out asterisks and URLs. The
//! transform is an ordered chain of rewrites and is idempotent on its
//! own output.

use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").unwrap());
// The regex crate has no backreferences, so emphasis is stripped with
// one pass per delimiter, longest first.
static EMPHASIS: Lazy<[Regex; 6]> = Lazy::new(|| {
    [
        Regex::new(r"\*{3}([^*]+)\*{3}").unwrap(),
        Regex::new(r"\*{2}([^*]+)\*{2}").unwrap(),
        Regex::new(r"\*([^*]+)\*").unwrap(),
        Regex::new(r"_{3}([^_]+)_{3}").unwrap(),
        Regex::new(r"_{2}([^_]+)_{2}").unwrap(),
        Regex::new(r"_([^_]+)_").unwrap(),
    ]
});
// Any indent depth: a marker that survived one pass would be pulled to
// the string start by the whitespace collapse and stripped on the next
// pass, breaking idempotence.
static LINE_MARKERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*[#>\-+*]+\s*").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Converts Markdown reply text into speech-friendly plain text.
///
/// Rewrites, in order: drop fenced code blocks, unwrap inline code,
/// drop images, unwrap links to their label, strip emphasis delimiters,
/// strip leading heading/quote/list markers per line, collapse
/// whitespace runs to single spaces and trim.
pub fn markdown_to_plain(text: &str) -> String {
    let s = FENCED_CODE.replace_all(text, " ");
    let s = INLINE_CODE.replace_all(&s, "$1");
    let s = IMAGE.replace_all(&s, " ");
    let s = LINK.replace_all(&s, "$1");
    let mut s = s.into_owned();
    for re in EMPHASIS.iter() {
        s = re.replace_all(&s, "$1").into_owned();
    }
    let s = LINE_MARKERS.replace_all(&s, "");
    let s = WHITESPACE.replace_all(&s, " ");
    s.trim().to_string()
}
