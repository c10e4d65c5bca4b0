//! Stop name normalization.
//!
//! Feeds publish one stop per platform, entrance or direction, with names
//! like `"Piata Unirii 2 - Peron"` and `"Metrou Piata Unirii"`. Normalizing
//! them to a shared key lets the transfer inference recognise stops that
//! belong to the same interchange.

use std::collections::HashSet;

/// Normalizes stop display names into cluster keys.
#[derive(Debug, Clone, Default)]
pub struct NameNormalizer {
    boilerplate: HashSet<String>,
}

impl NameNormalizer {
    /// Create a normalizer that strips the given boilerplate words.
    ///
    /// Words are matched case-insensitively as whole words.
    pub fn new<I, S>(boilerplate: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            boilerplate: boilerplate
                .into_iter()
                .map(|w| w.as_ref().trim().to_uppercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Normalize a display name.
    ///
    /// Uppercases, removes boilerplate words, drops a trailing single-letter
    /// token (platform or exit letters), then keeps only `A-Z`, `0-9` and
    /// space and collapses whitespace.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_router::stations::NameNormalizer;
    ///
    /// let normalizer = NameNormalizer::new(["station", "platform"]);
    /// assert_eq!(normalizer.normalize("Central Station - Platform B"), "CENTRAL");
    /// assert_eq!(normalizer.normalize("central  station"), "CENTRAL");
    /// ```
    pub fn normalize(&self, name: &str) -> String {
        let upper = name.to_uppercase();

        let mut stripped = String::with_capacity(upper.len());
        let mut word = String::new();
        for c in upper.chars() {
            if c.is_alphanumeric() || c == '_' {
                word.push(c);
            } else {
                self.flush_word(&mut word, &mut stripped);
                stripped.push(c);
            }
        }
        self.flush_word(&mut word, &mut stripped);

        let filtered: String = strip_trailing_letter(&stripped)
            .chars()
            .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == ' ')
            .collect();
        filtered.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn flush_word(&self, word: &mut String, out: &mut String) {
        if word.is_empty() {
            return;
        }
        if self.boilerplate.contains(word.as_str()) {
            out.push(' ');
        } else {
            out.push_str(word);
        }
        word.clear();
    }
}

/// Drop a final `A-Z` letter preceded by whitespace, with that whitespace.
fn strip_trailing_letter(s: &str) -> &str {
    let mut tail = s.char_indices().rev();
    match (tail.next(), tail.next()) {
        (Some((_, last)), Some((i, before))) if last.is_ascii_uppercase() && before.is_whitespace() => {
            s[..i].trim_end()
        }
        _ => s,
    }
}
