//! Lexical call-site scanning

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static CALL_SITE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(").ok());

static BLOCK_COMMENT: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").ok());
static LINE_COMMENT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?m)(^|[^:])//.*$").ok());
static HASH_COMMENT: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#.*$").ok());
static TRIPLE_QUOTED: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(?s)""".*?"""|'''.*?'''"#).ok());
static QUOTED: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"'(?:\\.|[^'\\\n])*'|"(?:\\.|[^"\\\n])*""#).ok());
static TEMPLATE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)`(?:\\.|[^\\`])*`").ok());
static INTERPOLATION: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\$\{([^}]*)\}").ok());

/// Identifiers followed by `(` that are control flow, not calls.
const KEYWORDS: &[&str] = &[
    "new", "class", "if", "for", "while", "switch", "return", "function", "elif", "catch", "def",
    "await", "typeof", "with", "except", "lambda",
];

/// Words that introduce a definition rather than a call.
const DEFINERS: &[&str] = &["def", "function", "fn", "class", "async"];

/// Remove comments and string literals so their contents are not scanned.
/// Template-literal interpolations are kept.
pub fn strip_strings_and_comments(source: &str) -> String {
    let mut text = source.to_string();
    if let Some(re) = BLOCK_COMMENT.as_ref() {
        text = re.replace_all(&text, "").into_owned();
    }
    if let Some(re) = LINE_COMMENT.as_ref() {
        text = re.replace_all(&text, "$1").into_owned();
    }
    if let Some(re) = HASH_COMMENT.as_ref() {
        text = re.replace_all(&text, "").into_owned();
    }
    if let Some(re) = TRIPLE_QUOTED.as_ref() {
        text = re.replace_all(&text, "").into_owned();
    }
    if let Some(re) = QUOTED.as_ref() {
        text = re.replace_all(&text, "").into_owned();
    }
    if let (Some(re), Some(inner)) = (TEMPLATE.as_ref(), INTERPOLATION.as_ref()) {
        text = re
            .replace_all(&text, |caps: &regex::Captures<'_>| {
                inner
                    .captures_iter(&caps[0])
                    .map(|c| c[1].to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .into_owned();
    }
    text
}

/// Bare call names in a snippet, in order of first appearance.
///
/// Member calls (`obj.name(`), keywords and definitions (`def name(`) are
/// skipped.
pub fn call_sites(snippet: &str) -> Vec<String> {
    let Some(re) = CALL_SITE.as_ref() else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for caps in re.captures_iter(snippet) {
        let Some(name) = caps.get(1) else { continue };
        let before = &snippet[..name.start()];
        if before.ends_with('.') {
            continue;
        }
        let word = name.as_str();
        if KEYWORDS.contains(&word) || follows_definer(before) {
            continue;
        }
        if seen.insert(word) {
            names.push(word.to_string());
        }
    }
    names
}

fn follows_definer(before: &str) -> bool {
    let trimmed = before.trim_end();
    if trimmed.len() == before.len() {
        return false;
    }
    let last = trimmed
        .rsplit(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .next()
        .unwrap_or("");
    DEFINERS.contains(&last)
}
