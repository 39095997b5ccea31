use crate::config::MatchMode;

/// File extensions stripped from raw identifiers before matching.
pub const KNOWN_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp", "svg", "avif"];

/// Tokens that carry no product information (camera/phone file naming).
const PLACEHOLDER_TOKENS: &[&str] = &[
    "img", "image", "images", "photo", "pic", "picture", "dsc", "dscn", "dcim", "screenshot",
    "file", "untitled", "copy", "product", "item", "whatsapp", "thumb", "scaled", "edited",
];

/// A raw identifier after extension stripping and tokenizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    /// Lowercased tokens joined by single spaces.
    pub key: String,
    /// Lowercased tokens.
    pub tokens: Vec<String>,
    /// Tokens in their original case, same positions as `tokens`.
    pub original: Vec<String>,
}

impl NormalizedText {
    /// Returns `None` when nothing alphanumeric is left.
    pub fn new(raw: &str) -> Option<Self> {
        let original = tokenize(strip_extension(raw));
        if original.is_empty() {
            return None;
        }
        let tokens: Vec<String> = original.iter().map(|t| t.to_lowercase()).collect();
        Some(Self {
            key: tokens.join(" "),
            tokens,
            original,
        })
    }

    pub fn has_token(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t.eq_ignore_ascii_case(token))
    }

    /// True when every token is a number, a hash or a placeholder word.
    pub fn is_uninformative(&self) -> bool {
        self.tokens.iter().all(|t| is_uninformative_token(t))
    }
}

/// Trims whitespace and drops a trailing image extension, if any.
pub fn strip_extension(raw: &str) -> &str {
    let trimmed = raw.trim();
    match trimmed.rsplit_once('.') {
        Some((stem, ext))
            if !stem.trim().is_empty()
                && KNOWN_EXTENSIONS.iter().any(|k| ext.eq_ignore_ascii_case(k)) =>
        {
            stem.trim_end()
        }
        _ => trimmed,
    }
}

/// Splits on every non-alphanumeric character, keeping case.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn tokenize_lower(text: &str) -> Vec<String> {
    tokenize(&text.to_lowercase())
}

/// Whether `needle` occurs as a contiguous run inside `haystack`.
pub fn contains_run(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty()
        && needle.len() <= haystack.len()
        && haystack.windows(needle.len()).any(|w| w == needle)
}

pub fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

/// Long hex strings with at least one digit, as produced by uploaders and CDNs.
pub fn is_hash_like(token: &str) -> bool {
    token.len() >= 8
        && token.chars().all(|c| c.is_ascii_hexdigit())
        && token.chars().any(|c| c.is_ascii_digit())
}

fn is_uninformative_token(token: &str) -> bool {
    is_numeric(token) || is_hash_like(token) || PLACEHOLDER_TOKENS.contains(&token)
}

/// A rule keyword prepared for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    pub text: String,
    pub tokens: Vec<String>,
    pub mode: MatchMode,
}

impl Keyword {
    pub fn new(raw: &str, mode: MatchMode) -> Option<Self> {
        let tokens = tokenize_lower(raw);
        if tokens.is_empty() {
            return None;
        }
        Some(Self {
            text: tokens.join(" "),
            tokens,
            mode,
        })
    }

    pub fn matches(&self, input: &NormalizedText) -> bool {
        match self.mode {
            MatchMode::Token => contains_run(&input.tokens, &self.tokens),
            MatchMode::Substring => input.key.contains(&self.text),
        }
    }
}

/// Index of the first entry, in declaration order, with a matching keyword.
pub fn first_match<'a, I>(input: &NormalizedText, rules: I) -> Option<usize>
where
    I: IntoIterator<Item = &'a [Keyword]>,
{
    rules
        .into_iter()
        .position(|keywords| keywords.iter().any(|k| k.matches(input)))
}
