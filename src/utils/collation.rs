//! Locale-aware comparison for translated compendium indices.

use std::cmp::Ordering;
use std::fmt;

use icu_collator::{Collator, CollatorOptions};
use icu_locid::Locale;

/// Compares display names with the collation rules of one language.
///
/// When neither the requested language nor the fallback locale can be resolved the
/// comparison degrades to a case-insensitive code point order.
pub struct IndexCollator {
    language: String,
    collator: Option<Collator>,
}

impl IndexCollator {
    /// Builds a collator for `lang`, falling back to `fallback` when `lang` has no rules.
    pub fn for_language(lang: &str, fallback: &str) -> Self {
        if let Some(collator) = Self::try_collator(lang) {
            return Self {
                language: lang.to_string(),
                collator: Some(collator),
            };
        }

        tracing::debug!(lang, fallback, "no collation rules for language, using fallback");
        Self {
            language: fallback.to_string(),
            collator: Self::try_collator(fallback),
        }
    }

    fn try_collator(lang: &str) -> Option<Collator> {
        let locale: Locale = lang.trim().parse().ok()?;
        Collator::try_new(&(&locale).into(), CollatorOptions::new()).ok()
    }

    /// The language whose rules are in effect.
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn compare(&self, left: &str, right: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(left, right),
            None => left
                .to_lowercase()
                .cmp(&right.to_lowercase())
                .then_with(|| left.cmp(right)),
        }
    }
}

impl fmt::Debug for IndexCollator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexCollator")
            .field("language", &self.language)
            .field("icu", &self.collator.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_german_collation_groups_umlauts() {
        let collator = IndexCollator::for_language("de", "en");
        let mut names = vec!["Banane", "Äpfel", "apfel"];
        names.sort_by(|a, b| collator.compare(a, b));

        assert_eq!(names[2], "Banane", "umlaut should sort with its base letter");
        assert!(names[..2].contains(&"Äpfel"));
        assert!(names[..2].contains(&"apfel"));
    }

    #[test]
    fn test_unparseable_language_uses_fallback() {
        let collator = IndexCollator::for_language("not a locale!", "en");
        assert_eq!(collator.language(), "en");
        assert_eq!(collator.compare("a", "B"), Ordering::Less);
    }
}
