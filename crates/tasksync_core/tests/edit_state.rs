use tasksync_core::{
    cancel_key, confirm_key, EditOutcome, EditState, KeyCode, KeyEvent, MemoryServer, TodoItem,
    TodoList, TrackerConfig,
};

fn list_with(server: &MemoryServer, title: &str) -> (TodoList, std::rc::Rc<TodoItem>) {
    let list = TodoList::with_client(TrackerConfig::default(), server.connect());
    let key = list.add_title(title).expect("title should be added");
    let item = list.find(&key).expect("item should be listed");
    (list, item)
}

#[test]
fn edit_then_cancel_restores_title() {
    let server = MemoryServer::new();
    let (list, item) = list_with(&server, "Buy milk");

    assert_eq!(list.edit_item(&item), EditOutcome::Entered);
    assert_eq!(
        item.edit_state(),
        EditState::Editing {
            previous_title: "Buy milk".to_string()
        }
    );

    assert_eq!(list.cancel_editing(&item), EditOutcome::Reverted);
    assert_eq!(item.title().get(), "Buy milk");
    assert!(!item.is_editing());
    assert_eq!(item.previous_title(), None);
}

#[test]
fn cancel_discards_intermediate_edits() {
    let server = MemoryServer::new();
    let (list, item) = list_with(&server, "Buy milk");

    list.edit_item(&item);
    item.title().set("Buy oat milk".to_string());
    list.cancel_editing(&item);

    assert_eq!(item.title().get(), "Buy milk");
}

#[test]
fn save_trims_surrounding_whitespace() {
    let server = MemoryServer::new();
    let (list, item) = list_with(&server, "Buy milk");

    list.edit_item(&item);
    item.title().set("  Buy milk  ".to_string());
    assert_eq!(list.save_editing(&item), EditOutcome::Trimmed);

    assert_eq!(item.title().get(), "Buy milk");
    assert!(!item.is_editing());
    assert_eq!(item.edit_state(), EditState::Viewing);
}

#[test]
fn save_without_whitespace_keeps_title() {
    let server = MemoryServer::new();
    let (list, item) = list_with(&server, "Buy milk");

    list.edit_item(&item);
    item.title().set("Buy bread".to_string());
    assert_eq!(list.save_editing(&item), EditOutcome::Kept);
    assert_eq!(item.title().get(), "Buy bread");
}

#[test]
fn save_with_blank_title_removes_item() {
    let server = MemoryServer::new();
    let (list, item) = list_with(&server, "Buy milk");
    server.flush();

    list.edit_item(&item);
    item.title().set("   ".to_string());
    assert_eq!(list.save_editing(&item), EditOutcome::Emptied);

    assert!(list.is_empty());
    assert_eq!(item.title().get(), "");
    server.flush();
    assert!(server.record(item.key()).is_none());
}

#[test]
fn commit_after_cancel_is_a_noop() {
    let server = MemoryServer::new();
    let (list, item) = list_with(&server, "Buy milk");

    list.edit_item(&item);
    list.cancel_editing(&item);
    assert_eq!(list.save_editing(&item), EditOutcome::NotEditing);
    assert_eq!(list.len(), 1);
}

#[test]
fn edit_state_is_never_persisted() {
    let server = MemoryServer::new();
    let (list, item) = list_with(&server, "Buy milk");
    server.flush();

    list.edit_item(&item);
    assert_eq!(server.pending_writes(), 0);
}

#[test]
fn focus_requests_are_deferred_until_drained() {
    let server = MemoryServer::new();
    let (list, item) = list_with(&server, "Buy milk");

    list.edit_item(&item);
    list.edit_item(&item);
    assert_eq!(list.take_focus_requests(), vec![item.key().clone()]);
    assert!(list.take_focus_requests().is_empty());
}

#[test]
fn focus_requests_skip_items_no_longer_editing() {
    let server = MemoryServer::new();
    let (list, item) = list_with(&server, "Buy milk");

    list.edit_item(&item);
    list.cancel_editing(&item);
    assert!(list.take_focus_requests().is_empty());
}

#[test]
fn key_gates_drive_edit_commands() {
    let server = MemoryServer::new();
    let (list, item) = list_with(&server, "Buy milk");

    let mut confirm = confirm_key(|target: &TodoItem, _: &KeyEvent| {
        list.save_editing(target);
    });
    let mut cancel = cancel_key(|target: &TodoItem, _: &KeyEvent| {
        list.cancel_editing(target);
    });

    list.edit_item(&item);
    item.title().set("Buy milk and eggs ".to_string());
    assert!(!cancel.handle(&*item, &KeyEvent::new(KeyCode(65))));
    assert!(item.is_editing());

    assert!(confirm.handle(&*item, &KeyEvent::new(KeyCode::ENTER)));
    assert_eq!(item.title().get(), "Buy milk and eggs");

    list.edit_item(&item);
    item.title().set("scratch".to_string());
    assert!(cancel.handle(&*item, &KeyEvent::new(KeyCode::ESCAPE)));
    assert_eq!(item.title().get(), "Buy milk and eggs");
}
