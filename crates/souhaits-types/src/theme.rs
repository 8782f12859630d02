//! Wishlist themes.
//!
//! The registry is an immutable table built at compile time. Callers hold a
//! `&ThemeRegistry` instead of reaching for a global so tests can supply
//! their own table.

use serde::Serialize;

/// A visual theme a wishlist can pick. Only the key is persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub key: &'static str,
    pub name: &'static str,
}

/// Lookup table of known themes. The first entry is the fallback.
#[derive(Clone, Copy, Debug)]
pub struct ThemeRegistry {
    themes: &'static [Theme],
}

const BUILTIN_THEMES: &[Theme] = &[
    Theme {
        key: "default",
        name: "Classic",
    },
    Theme {
        key: "xmas",
        name: "Christmas",
    },
    Theme {
        key: "baby",
        name: "Birth",
    },
    Theme {
        key: "bday",
        name: "Birthday",
    },
    Theme {
        key: "doudou",
        name: "Cuddly toy",
    },
];

impl ThemeRegistry {
    /// Themes shipped with the application.
    pub const BUILTIN: ThemeRegistry = ThemeRegistry {
        themes: BUILTIN_THEMES,
    };

    /// Build a registry over a static table. `themes` must not be empty.
    pub const fn new(themes: &'static [Theme]) -> Self {
        Self { themes }
    }

    /// Fallback theme for lists with no or an unknown key.
    pub fn default_theme(&self) -> &'static Theme {
        &self.themes[0]
    }

    /// Resolve a stored key, falling back to the default theme.
    pub fn resolve(&self, key: &str) -> &'static Theme {
        self.find(key).unwrap_or_else(|| self.default_theme())
    }

    /// Exact lookup.
    pub fn find(&self, key: &str) -> Option<&'static Theme> {
        self.themes.iter().find(|t| t.key == key)
    }

    pub fn all(&self) -> &'static [Theme] {
        self.themes
    }
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        Self::BUILTIN
    }
}
