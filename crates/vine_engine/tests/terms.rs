use std::fs;

use tempfile::TempDir;
use vine_engine::{load_priority_terms, read_terms, TermsError};

#[test]
fn json_array_of_phrases() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("priority_terms.json");
    fs::write(&path, r#"["Bluetooth Mouse", "espresso", "  "]"#).unwrap();

    let terms = load_priority_terms(&path);
    assert_eq!(terms.len(), 2);
    assert!(terms.matches("Silent mouse with bluetooth"));
    assert!(terms.matches("Espresso cups, set of 4"));
    assert!(!terms.matches("Wired mouse"));
}

#[test]
fn json_object_with_terms_and_examples() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("priority_terms.json");
    fs::write(
        &path,
        r#"{"terms": ["usb c hub"], "examples": ["usb c hub matches 'USB C Hub 7-in-1'"]}"#,
    )
    .unwrap();

    let terms = read_terms(&path).unwrap();
    assert_eq!(terms.len(), 1);
    assert!(terms.matches("USB C Hub 7-in-1"));
}

#[test]
fn text_file_skips_comments_and_blanks() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keywords.txt");
    fs::write(&path, "# wishlist\n\nstanding desk\n  # indented comment\nlamp\n").unwrap();

    let terms = read_terms(&path).unwrap();
    assert_eq!(terms.len(), 2);
    assert!(terms.matches("Electric Standing Desk"));
}

#[test]
fn missing_file_writes_a_loadable_sample() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("priority_terms.json");

    let terms = load_priority_terms(&path);
    assert!(terms.is_empty());
    assert!(path.exists());

    let sample = read_terms(&path).unwrap();
    assert!(!sample.is_empty());
}

#[test]
fn invalid_json_yields_no_terms() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("priority_terms.json");
    fs::write(&path, "{ broken").unwrap();

    assert!(matches!(read_terms(&path), Err(TermsError::Invalid { .. })));
    assert!(load_priority_terms(&path).is_empty());
}
