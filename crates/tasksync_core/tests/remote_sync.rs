use tasksync_core::{FilterMode, MemoryServer, StoreError, TodoList, TrackerConfig};

fn pair(server: &MemoryServer) -> (TodoList, TodoList) {
    let left = TodoList::with_client(TrackerConfig::default(), server.connect());
    let right = TodoList::with_client(TrackerConfig::default(), server.connect());
    (left, right)
}

#[test]
fn remote_add_creates_wrapper_with_synced_fields() {
    let server = MemoryServer::new();
    let (left, right) = pair(&server);

    let key = left.add_title("from left").expect("title should be added");
    assert!(right.is_empty());

    server.flush();
    let mirrored = right.find(&key).expect("right should list the new key");
    assert_eq!(mirrored.title().get(), "from left");
    assert!(!mirrored.is_completed());
    assert_eq!(right.remaining_count(), 1);
}

#[test]
fn late_client_sees_existing_items() {
    let server = MemoryServer::new();
    let left = TodoList::with_client(TrackerConfig::default(), server.connect());
    left.add_title("one").expect("one");
    left.add_title("two").expect("two");
    server.flush();

    let late = TodoList::with_client(TrackerConfig::default(), server.connect());
    let titles: Vec<String> = late.todos().iter().map(|item| item.title().get()).collect();
    assert_eq!(titles, vec!["one", "two"]);
}

#[test]
fn remote_toggle_updates_derived_values() {
    let server = MemoryServer::new();
    let (left, right) = pair(&server);
    let key = left.add_title("shared").expect("title should be added");
    server.flush();

    right.set_filter_mode(FilterMode::Active);
    assert_eq!(right.filtered_todos().len(), 1);

    left.find(&key)
        .expect("left item")
        .completed()
        .set(true);
    server.flush();

    assert_eq!(right.filtered_todos().len(), 0);
    assert_eq!(right.completed_count(), 1);
    assert!(right.all_completed());
}

#[test]
fn remote_title_edit_reaches_other_client() {
    let server = MemoryServer::new();
    let (left, right) = pair(&server);
    let key = left.add_title("draft").expect("title should be added");
    server.flush();

    let item = left.find(&key).expect("left item");
    left.edit_item(&item);
    item.title().set("  final  ".to_string());
    left.save_editing(&item);
    server.flush();

    assert_eq!(right.find(&key).expect("right item").title().get(), "final");
}

#[test]
fn last_writer_wins_per_field() {
    let server = MemoryServer::new();
    let (left, right) = pair(&server);
    let key = left.add_title("contested").expect("title should be added");
    server.flush();

    left.find(&key).expect("left").title().set("left wins?".to_string());
    right.find(&key).expect("right").title().set("right wins".to_string());
    server.flush();

    assert_eq!(
        server.record(&key).expect("record").title,
        "right wins".to_string()
    );
    assert_eq!(left.find(&key).expect("left").title().get(), "right wins");
    assert_eq!(right.find(&key).expect("right").title().get(), "right wins");
}

#[test]
fn remote_remove_destroys_wrapper() {
    let server = MemoryServer::new();
    let (left, right) = pair(&server);
    let key = left.add_title("doomed").expect("title should be added");
    left.add_title("keeper").expect("title should be added");
    server.flush();

    let item = left.find(&key).expect("left item");
    left.remove(&item);
    server.flush();

    assert!(right.find(&key).is_none());
    assert_eq!(right.len(), 1);
    assert_eq!(right.remaining_count(), 1);
}

#[test]
fn offline_writes_fail_without_local_rollback() {
    let server = MemoryServer::new();
    let (left, right) = pair(&server);
    server.set_offline(true);

    let key = left.add_title("lost in transit").expect("title should be added");
    let report = server.flush();

    assert_eq!(report.applied, 0);
    assert_eq!(report.failed, 2);
    assert!(left.find(&key).is_some());
    assert!(right.is_empty());
    assert!(server
        .take_errors()
        .iter()
        .all(|err| matches!(err, StoreError::Unavailable { .. })));
}

#[test]
fn toggle_racing_a_remote_remove_does_not_revive_record() {
    let server = MemoryServer::new();
    let (left, right) = pair(&server);
    let key = left.add_title("contested").expect("title should be added");
    server.flush();

    let doomed = left.find(&key).expect("left item");
    left.remove(&doomed);
    right.find(&key)
        .expect("right item")
        .completed()
        .set(true);

    let report = server.flush();
    assert_eq!(report.failed, 0);
    assert!(server.record(&key).is_none());
    assert!(server.list("todos").is_empty());
    assert!(right.is_empty());
}
