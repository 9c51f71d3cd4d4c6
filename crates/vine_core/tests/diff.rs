use vine_core::{diff, Item, QueueId, QueueSnapshot};

fn item(id: &str, title: &str) -> Item {
    Item::new(
        id,
        title,
        format!("https://www.amazon.com/dp/{id}"),
        None,
        QueueId::Additional,
    )
}

fn snapshot(ids: &[&str]) -> QueueSnapshot {
    ids.iter().map(|id| item(id, "")).collect()
}

fn ids(items: &[Item]) -> Vec<&str> {
    items.iter().map(|item| item.id.as_str()).collect()
}

#[test]
fn diff_returns_items_whose_id_is_absent_from_previous() {
    let previous = snapshot(&["B000000001", "B000000002", "B000000003"]);
    let current = snapshot(&["B000000002", "B000000004", "B000000003", "B000000005"]);

    let delta = diff(&previous, &current);
    assert_eq!(ids(&delta), vec!["B000000004", "B000000005"]);
}

#[test]
fn diff_of_snapshot_with_itself_is_empty() {
    let snap = snapshot(&["B000000001", "B000000002"]);
    assert!(diff(&snap, &snap).is_empty());
    assert!(diff(&QueueSnapshot::new(), &QueueSnapshot::new()).is_empty());
}

#[test]
fn diff_against_empty_previous_returns_everything() {
    let current = snapshot(&["B000000002", "B000000001"]);
    let delta = diff(&QueueSnapshot::new(), &current);
    assert_eq!(ids(&delta), vec!["B000000001", "B000000002"]);
}

#[test]
fn refreshed_metadata_is_not_new() {
    let previous: QueueSnapshot = vec![item("B000000001", "Old title")].into_iter().collect();
    let current: QueueSnapshot = vec![item("B000000001", "Brand new title")].into_iter().collect();
    assert!(diff(&previous, &current).is_empty());
}

#[test]
fn reappearing_item_counts_as_new_again() {
    let first = snapshot(&["B000000001", "B000000002"]);
    let second = snapshot(&["B000000002"]);
    let third = snapshot(&["B000000001", "B000000002"]);

    assert!(diff(&first, &second).is_empty());
    assert_eq!(ids(&diff(&second, &third)), vec!["B000000001"]);
}

#[test]
fn duplicate_ids_keep_the_last_item() {
    let mut snap = QueueSnapshot::new();
    assert!(snap.insert(item("B000000001", "first")).is_none());
    let replaced = snap.insert(item("B000000001", "second")).expect("duplicate reported");

    assert_eq!(replaced.title, "first");
    assert_eq!(snap.len(), 1);
    assert_eq!(snap.get("B000000001").unwrap().title, "second");
}

#[test]
fn item_identity_ignores_metadata() {
    let a = item("B000000001", "one");
    let mut b = item("B000000001", "two");
    b.image_url = Some("https://m.media-amazon.com/x.jpg".to_string());
    b.source_queue = QueueId::Recommended;
    assert_eq!(a, b);
    assert_ne!(a, item("B000000002", "one"));
}

#[test]
fn title_prefix_takes_leading_words() {
    let it = item("B000000001", "  Wireless   Bluetooth Mouse for laptops ");
    assert_eq!(it.title_prefix(3).as_deref(), Some("Wireless Bluetooth Mouse"));
    assert_eq!(item("B000000002", "   ").title_prefix(3), None);
}
