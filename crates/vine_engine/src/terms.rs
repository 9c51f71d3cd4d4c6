use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine_logging::{engine_info, engine_warn};
use serde::{Deserialize, Serialize};
use vine_core::PriorityTerms;

use crate::persist::{write_atomic, PersistError};

pub const DEFAULT_TERMS_FILE: &str = "priority_terms.json";

const SAMPLE_TERMS: [&str; 3] = ["bluetooth mouse", "usb c hub", "espresso"];

#[derive(Debug, thiserror::Error)]
pub enum TermsError {
    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid terms file {path:?}: {reason}")]
    Invalid { path: PathBuf, reason: String },
    #[error(transparent)]
    Write(#[from] PersistError),
}

/// Accepted JSON layouts: a bare array of phrases, or an object whose
/// `terms` hold the phrases (other keys such as `examples` are ignored).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TermsDocument {
    List(Vec<String>),
    Object { terms: Vec<String> },
}

#[derive(Debug, Serialize)]
struct SampleDocument<'a> {
    terms: Vec<&'a str>,
    examples: Vec<&'a str>,
}

/// Reads the priority phrases. A missing file yields an empty set after a
/// sample file is written in its place; an unreadable one yields an empty
/// set. Either way the monitor keeps running.
pub fn load_priority_terms(path: &Path) -> PriorityTerms {
    match read_terms(path) {
        Ok(terms) => {
            engine_info!("Loaded {} priority terms from {:?}", terms.len(), path);
            terms
        }
        Err(TermsError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            engine_warn!("Priority terms file {:?} not found; no priority matching", path);
            match write_sample_terms(path) {
                Ok(()) => engine_info!("Wrote a sample priority terms file to {:?}", path),
                Err(err) => engine_warn!("Could not write sample terms file: {}", err),
            }
            PriorityTerms::new()
        }
        Err(err) => {
            engine_warn!("{}; no priority matching", err);
            PriorityTerms::new()
        }
    }
}

pub fn read_terms(path: &Path) -> Result<PriorityTerms, TermsError> {
    let text = fs::read_to_string(path).map_err(|source| TermsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if is_plain_text(path) {
        return Ok(parse_lines(&text));
    }
    let document: TermsDocument =
        serde_json::from_str(&text).map_err(|err| TermsError::Invalid {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
    let phrases = match document {
        TermsDocument::List(terms) | TermsDocument::Object { terms } => terms,
    };
    Ok(PriorityTerms::from_phrases(phrases))
}

/// Writes a starter file in the format the extension selects.
pub fn write_sample_terms(path: &Path) -> Result<(), TermsError> {
    let content = if is_plain_text(path) {
        let mut text = String::from("# One phrase per line. All words must appear in a title.\n");
        for term in SAMPLE_TERMS {
            text.push_str(term);
            text.push('\n');
        }
        text
    } else {
        let sample = SampleDocument {
            terms: SAMPLE_TERMS.to_vec(),
            examples: vec![
                "\"bluetooth mouse\" matches \"Wireless Mouse with Bluetooth\"",
                "\"usb c hub\" does not match \"USB-C Hub\"",
            ],
        };
        serde_json::to_string_pretty(&sample).map_err(PersistError::from)? + "\n"
    };
    write_atomic(path, &content)?;
    Ok(())
}

fn parse_lines(text: &str) -> PriorityTerms {
    PriorityTerms::from_phrases(
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#')),
    )
}

fn is_plain_text(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
}
