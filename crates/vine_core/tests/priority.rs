use vine_core::PriorityTerms;

#[test]
fn all_phrase_words_present_in_any_order_matches() {
    let terms = PriorityTerms::from_phrases(["bluetooth mouse"]);
    assert!(terms.matches("Wireless Bluetooth Mouse"));
    assert!(terms.matches("Mouse with Bluetooth receiver"));
}

#[test]
fn punctuation_stays_attached_to_words() {
    let terms = PriorityTerms::from_phrases(["bluetooth mouse"]);
    assert!(!terms.matches("Mouse, ergonomic, with Bluetooth"));
}

#[test]
fn partial_phrase_does_not_match() {
    let terms = PriorityTerms::from_phrases(["wireless keyboard"]);
    assert!(!terms.matches("Wireless Bluetooth Mouse"));
}

#[test]
fn words_need_not_be_adjacent() {
    let terms = PriorityTerms::from_phrases(["wireless mouse"]);
    assert!(terms.matches("Wireless Ergonomic Vertical Mouse"));
}

#[test]
fn matching_is_word_based_not_substring() {
    let terms = PriorityTerms::from_phrases(["cat"]);
    assert!(!terms.matches("Concatenated cable"));
    assert!(terms.matches("Cat toy"));
}

#[test]
fn empty_term_set_never_matches() {
    let terms = PriorityTerms::new();
    assert!(terms.is_empty());
    assert!(!terms.matches("Wireless Bluetooth Mouse"));
    assert!(!terms.matches(""));
}

#[test]
fn empty_title_never_matches() {
    let terms = PriorityTerms::from_phrases(["mouse"]);
    assert!(!terms.matches(""));
    assert!(!terms.matches("   "));
}

#[test]
fn phrases_are_case_insensitive_and_deduplicated() {
    let terms = PriorityTerms::from_phrases(["Bluetooth MOUSE", "mouse bluetooth", "  ", "mouse mouse bluetooth"]);
    assert_eq!(terms.len(), 1);
    assert_eq!(terms.phrases().collect::<Vec<_>>(), vec!["bluetooth mouse"]);
    assert!(terms.matches("bluetooth mouse"));
}

#[test]
fn any_matching_phrase_is_enough() {
    let terms = PriorityTerms::from_phrases(["espresso machine", "usb c hub"]);
    assert!(terms.matches("7-in-1 USB C Hub with HDMI"));
    assert!(!terms.matches("Espresso cups, set of 4"));
}
