use std::fmt;

use sha2::{Digest, Sha256};

use crate::Page;

/// SHA-256 over the raw bodies of a queue's fetched pages, taken before
/// parsing so unchanged content can skip extraction entirely.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    pub fn of_pages(pages: &[Page]) -> Self {
        let mut hasher = Sha256::new();
        for page in pages {
            hasher.update(page.number.to_le_bytes());
            hasher.update((page.body.len() as u64).to_le_bytes());
            hasher.update(&page.body);
        }
        Self(hasher.finalize().into())
    }

    /// First four bytes as hex, for log lines.
    pub fn short_hex(&self) -> String {
        self.0
            .iter()
            .take(4)
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.short_hex())
    }
}
