use std::collections::BTreeSet;

/// Configured high-interest phrases. Each phrase is kept as a set of
/// lowercase words; a title matches a phrase when it contains every word of
/// it, in any order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorityTerms {
    phrases: Vec<BTreeSet<String>>,
}

impl PriorityTerms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a term set from raw phrases. Blank phrases and repeats are dropped.
    pub fn from_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut terms = Self::new();
        for phrase in phrases {
            terms.add(phrase.as_ref());
        }
        terms
    }

    pub fn add(&mut self, phrase: &str) {
        let words = word_set(phrase);
        if words.is_empty() || self.phrases.contains(&words) {
            return;
        }
        self.phrases.push(words);
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Phrases rendered back as space-joined words (sorted within a phrase).
    pub fn phrases(&self) -> impl Iterator<Item = String> + '_ {
        self.phrases
            .iter()
            .map(|words| words.iter().cloned().collect::<Vec<_>>().join(" "))
    }

    /// True when every word of at least one phrase appears in the title.
    pub fn matches(&self, title: &str) -> bool {
        if self.phrases.is_empty() {
            return false;
        }
        let title_words = word_set(title);
        if title_words.is_empty() {
            return false;
        }
        self.phrases
            .iter()
            .any(|phrase| phrase.is_subset(&title_words))
    }
}

fn word_set(text: &str) -> BTreeSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}
