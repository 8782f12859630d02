//! URL slug normalization.
//!
//! A wishlist's URL fragment is derived from its name: lowercased, accents
//! folded away, every run of characters outside `[a-z0-9]` collapsed into a
//! single hyphen, and hyphens trimmed from both ends. Uniqueness is the
//! store's business; this module only produces the ordered candidates to try.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Fragments that collide with site routes and can never be used bare.
pub const RESERVED_URLS: &[&str] = &[
    "newlist",
    "login",
    "logout",
    "challenge",
    "invite",
    "css",
    "images",
    "js",
    "themes",
    "about",
    "help",
];

/// An immutable folding table, looked up after lowercasing. Letters with no
/// entry are decomposed (NFD) and stripped of their combining marks.
#[derive(Debug, Clone, Copy)]
pub struct Transliteration {
    table: &'static [(char, &'static str)],
}

impl Transliteration {
    /// Latin letters that have no canonical decomposition.
    pub const LATIN: Self = Self::new(&[
        ('æ', "ae"),
        ('œ', "oe"),
        ('ß', "ss"),
        ('ø', "o"),
        ('ð', "d"),
        ('đ', "d"),
        ('þ', "th"),
        ('ħ', "h"),
        ('ı', "i"),
        ('ĸ', "k"),
        ('ŀ', "l"),
        ('ł', "l"),
        ('ŋ', "n"),
        ('ŧ', "t"),
    ]);

    pub const fn new(table: &'static [(char, &'static str)]) -> Self {
        Self { table }
    }

    fn fold(&self, c: char) -> Option<&'static str> {
        self.table
            .iter()
            .find(|(from, _)| *from == c)
            .map(|(_, to)| *to)
    }

    /// Normalize free text into a URL fragment. May return an empty string.
    pub fn normalize(&self, text: &str) -> String {
        fn push(piece: char, out: &mut String, separated: &mut bool) {
            if piece.is_ascii_lowercase() || piece.is_ascii_digit() {
                if *separated && !out.is_empty() {
                    out.push('-');
                }
                *separated = false;
                out.push(piece);
            } else {
                *separated = true;
            }
        }

        let mut out = String::with_capacity(text.len());
        let mut separated = false;
        for c in text.chars().flat_map(char::to_lowercase) {
            // Marks left over by lowercasing (`İ`) or by decomposed input.
            if is_combining_mark(c) {
                continue;
            }
            match self.fold(c) {
                Some(folded) => folded
                    .chars()
                    .for_each(|f| push(f, &mut out, &mut separated)),
                None => std::iter::once(c)
                    .nfd()
                    .filter(|d| !is_combining_mark(*d))
                    .for_each(|d| push(d, &mut out, &mut separated)),
            }
        }
        out
    }
}

impl Default for Transliteration {
    fn default() -> Self {
        Self::LATIN
    }
}

/// Normalize with the default table.
pub fn normalize_url(text: &str) -> String {
    Transliteration::LATIN.normalize(text)
}

pub fn is_reserved(url: &str) -> bool {
    RESERVED_URLS.contains(&url)
}

/// Candidate URLs for `base` in the order they should be tried: the base
/// itself (unless empty or reserved), then `base-1`, `base-2`, ...
pub fn candidates(base: &str) -> impl Iterator<Item = String> + '_ {
    let bare = (!base.is_empty() && !is_reserved(base)).then(|| base.to_string());
    bare.into_iter()
        .chain((1u64..).map(move |n| format!("{base}-{n}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_accents() {
        assert_eq!(normalize_url("Le Noël de Pierre"), "le-noel-de-pierre");
        assert_eq!(normalize_url("Ça déménage !"), "ca-demenage");
        assert_eq!(normalize_url("Cœur"), "coeur");
        assert_eq!(normalize_url("Cadeaux pour Åsa"), "cadeaux-pour-asa");
        assert_eq!(normalize_url("São Paulo"), "sao-paulo");
        assert_eq!(normalize_url("Søren"), "soren");
        assert_eq!(normalize_url("Ýmir"), "ymir");
        assert_eq!(normalize_url("İstanbul"), "istanbul");
        assert_eq!(normalize_url("Dvořák"), "dvorak");
        assert_eq!(normalize_url("Łódź Žižkov"), "lodz-zizkov");
        assert_eq!(normalize_url("Straße Ìòõ"), "strasse-ioo");
    }

    #[test]
    fn test_decomposed_input() {
        assert_eq!(normalize_url("Noe\u{308}l"), "noel");
    }

    #[test]
    fn test_normalize_collapses_runs() {
        assert_eq!(normalize_url("  a -- b__c  "), "a-b-c");
        assert_eq!(normalize_url("Liste 2024"), "liste-2024");
        assert_eq!(normalize_url("!!!"), "");
        assert_eq!(normalize_url(""), "");
    }

    #[test]
    fn test_non_latin_letters_become_separators() {
        assert_eq!(normalize_url("Noël в Москве"), "noel");
        assert_eq!(normalize_url("Ωmega"), "mega");
    }

    #[test]
    fn test_custom_table() {
        let table = Transliteration::new(&[('ø', "oe")]);
        assert_eq!(table.normalize("Smørrebrød"), "smoerrebroed");
        assert_eq!(table.normalize("Noël"), "noel");
        assert_eq!(table.normalize("Æble"), "ble");
    }

    #[test]
    fn test_candidates() {
        let first: Vec<_> = candidates("noel").take(3).collect();
        assert_eq!(first, ["noel", "noel-1", "noel-2"]);

        let reserved: Vec<_> = candidates("login").take(2).collect();
        assert_eq!(reserved, ["login-1", "login-2"]);

        let empty: Vec<_> = candidates("").take(2).collect();
        assert_eq!(empty, ["-1", "-2"]);
    }
}
