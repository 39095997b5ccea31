// Utility functions

/// Capitalizes an all-lowercase word; words that already carry capitals
/// ("LaserJet", "HP", "iPhone") are kept as written.
pub fn title_case(word: &str) -> String {
    if word.chars().any(char::is_uppercase) {
        return word.to_string();
    }
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Uppercased leading alphanumerics of `text`, at most `len` of them.
pub fn short_code(text: &str, len: usize) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(len)
        .collect::<String>()
        .to_ascii_uppercase()
}
