//! Email address validation.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,6}$").expect("email regex is valid")
});

/// Strip every space and lowercase `raw`, without validating it.
pub fn fold_email(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Fold `raw`, then check the result looks like an address. Returns `None`
/// when it does not.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = fold_email(raw);
    EMAIL_RE.is_match(&email).then_some(email)
}
