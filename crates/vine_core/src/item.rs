use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The three independently polled Vine listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueueId {
    Recommended,
    Additional,
    AvailableForAll,
}

impl QueueId {
    /// Poll order used by the scheduler.
    pub const ALL: [QueueId; 3] = [
        QueueId::Recommended,
        QueueId::AvailableForAll,
        QueueId::Additional,
    ];

    /// Value of the `queue=` query parameter on the vine-items page.
    pub fn query_value(self) -> &'static str {
        match self {
            QueueId::Recommended => "potluck",
            QueueId::Additional => "encore",
            QueueId::AvailableForAll => "last_chance",
        }
    }

    /// Number of pages fetched and aggregated for one snapshot.
    pub fn page_count(self) -> u32 {
        match self {
            QueueId::Additional => 5,
            QueueId::Recommended | QueueId::AvailableForAll => 1,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            QueueId::Recommended => "Recommended for you",
            QueueId::Additional => "Additional Items",
            QueueId::AvailableForAll => "Available for all",
        }
    }

    /// Stable wire name, used in persisted state.
    pub fn as_str(self) -> &'static str {
        match self {
            QueueId::Recommended => "RECOMMENDED",
            QueueId::Additional => "ADDITIONAL",
            QueueId::AvailableForAll => "AVAILABLE_FOR_ALL",
        }
    }

    pub fn parse(raw: &str) -> Option<QueueId> {
        QueueId::ALL.into_iter().find(|queue| queue.as_str() == raw)
    }

    pub fn category(self) -> Category {
        match self {
            QueueId::Recommended => Category::Recommended,
            QueueId::Additional => Category::Additional,
            QueueId::AvailableForAll => Category::AvailableForAll,
        }
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Notification destination category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Recommended,
    Additional,
    AvailableForAll,
    Priority,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Recommended => "RECOMMENDED",
            Category::Additional => "ADDITIONAL",
            Category::AvailableForAll => "AVAILABLE_FOR_ALL",
            Category::Priority => "PRIORITY",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One listing entry. Identity is the `id` alone: metadata may be refreshed
/// between fetches without the item counting as new.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub url: String,
    pub image_url: Option<String>,
    pub source_queue: QueueId,
}

impl Item {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        image_url: Option<String>,
        source_queue: QueueId,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            image_url,
            source_queue,
        }
    }

    /// First `words` words of the title, joined by single spaces.
    pub fn title_prefix(&self, words: usize) -> Option<String> {
        let prefix = self
            .title
            .split_whitespace()
            .take(words)
            .collect::<Vec<_>>()
            .join(" ");
        (!prefix.is_empty()).then_some(prefix)
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Item {}

impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Item {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Item {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}
