//! Behavioral properties of the task list presenter, exercised through the
//! public API only.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

use pretty_assertions::assert_eq;
use tasks::model::{ItemKey, Task, TaskColor, TaskItem};
use tasks::presenter::{AllTaskItemsPresenter, PresenterEvent, TaskPresenterDelegate, TaskPresenting};

#[derive(Default)]
struct EventLog {
    events: RefCell<Vec<PresenterEvent>>,
}

impl TaskPresenterDelegate for EventLog {
    fn task_presenter_did_change(&self, event: &PresenterEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

fn presenter(texts: &[&str]) -> (AllTaskItemsPresenter, Vec<ItemKey>) {
    let items: Vec<TaskItem> = texts.iter().map(|t| TaskItem::new(*t)).collect();
    let keys = items.iter().map(|i| i.key).collect();
    (
        AllTaskItemsPresenter::from_task(Task::new(TaskColor::Orange, items)),
        keys,
    )
}

fn attach(presenter: &mut AllTaskItemsPresenter) -> Rc<EventLog> {
    let log = Rc::new(EventLog::default());
    let delegate: Weak<dyn TaskPresenterDelegate> = Rc::<EventLog>::downgrade(&log);
    presenter.set_delegate(delegate);
    log
}

/// Apply one of a handful of scripted mutations
fn mutate(presenter: &mut AllTaskItemsPresenter, step: usize, keys: &[ItemKey]) {
    let key = keys[step % keys.len()];
    match step % 6 {
        0 => presenter.toggle_task_item(&key),
        1 => presenter.update_task_item(&key, format!("edit {}", step)),
        2 => presenter.move_task_item(&key, 0),
        3 => presenter.remove_task_item(&key),
        4 => presenter.insert_task_item(TaskItem::new(format!("new {}", step))),
        _ => presenter.update_presented_task_items_to_completion_state(step % 2 == 0),
    }
}

// ============================================================================
// Key-set algebra
// ============================================================================

#[test]
fn key_set_is_inserted_minus_removed() {
    let (mut presenter, mut keys) = presenter(&["A", "B", "C"]);
    let mut expected: BTreeSet<ItemKey> = keys.iter().copied().collect();

    for n in 0..5 {
        let item = TaskItem::new(format!("extra {}", n));
        expected.insert(item.key);
        keys.push(item.key);
        presenter.insert_task_item(item);
    }
    for key in [keys[0], keys[4], keys[6]] {
        presenter.remove_task_item(&key);
        expected.remove(&key);
    }
    presenter.move_task_item(&keys[1], 3);
    presenter.move_task_item(&keys[7], 0);
    presenter.remove_task_item(&keys[0]);

    let live: BTreeSet<ItemKey> = presenter.presented_task_items().iter().map(|i| i.key).collect();
    assert_eq!(live, expected);
    assert_eq!(presenter.count(), expected.len());
}

// ============================================================================
// Undo / redo
// ============================================================================

#[test]
fn undo_restores_exact_prior_sequence() {
    for step in 0..12 {
        let (mut presenter, keys) = presenter(&["A", "B", "C", "D"]);
        presenter.toggle_task_item(&keys[2]);
        let before = presenter.presented_task_items();

        mutate(&mut presenter, step, &keys);
        if presenter.presented_task_items() == before {
            continue;
        }
        assert!(presenter.undo(), "step {} left nothing to undo", step);
        assert_eq!(presenter.presented_task_items(), before, "step {}", step);
    }
}

#[test]
fn redo_reproduces_post_mutation_state() {
    for step in 0..12 {
        let (mut presenter, keys) = presenter(&["A", "B", "C", "D"]);
        mutate(&mut presenter, step, &keys);
        let after = presenter.presented_task_items();
        if !presenter.undo() {
            continue;
        }
        assert!(presenter.redo());
        assert_eq!(presenter.presented_task_items(), after, "step {}", step);
    }
}

#[test]
fn new_mutation_after_undo_clears_redo() {
    let (mut presenter, keys) = presenter(&["A", "B"]);
    presenter.toggle_task_item(&keys[0]);
    presenter.undo();
    assert!(presenter.can_redo());

    presenter.update_task_item(&keys[1], "Bee");
    let state = presenter.presented_task_items();
    assert!(!presenter.redo());
    assert_eq!(presenter.presented_task_items(), state);
}

#[test]
fn undo_and_redo_on_empty_history_are_noops() {
    let (mut presenter, _) = presenter(&["A"]);
    let log = attach(&mut presenter);
    assert!(!presenter.undo());
    assert!(!presenter.redo());
    assert!(log.events.borrow().is_empty());
}

#[test]
fn complete_all_is_reverted_by_one_undo() {
    let (mut presenter, keys) = presenter(&["A", "B", "C", "D"]);
    presenter.toggle_task_item(&keys[1]);
    presenter.toggle_task_item(&keys[3]);
    let mixed = presenter.presented_task_items();

    presenter.update_presented_task_items_to_completion_state(true);
    assert!(presenter.presented_task_items().iter().all(|i| i.is_complete));

    presenter.undo();
    assert_eq!(presenter.presented_task_items(), mixed);
}

// ============================================================================
// Delegate notifications
// ============================================================================

#[test]
fn move_onto_own_index_is_silent() {
    let (mut presenter, keys) = presenter(&["A", "B", "C"]);
    let log = attach(&mut presenter);
    presenter.move_task_item(&keys[2], 2);
    assert!(log.events.borrow().is_empty());
    assert!(!presenter.can_undo());
}

#[test]
fn notifications_name_kind_and_indices() {
    let (mut presenter, keys) = presenter(&["A", "B", "C"]);
    let log = attach(&mut presenter);

    presenter.insert_task_item(TaskItem::new("D"));
    presenter.move_task_item(&keys[0], 3);
    presenter.toggle_task_item(&keys[1]);
    presenter.remove_task_items(&[keys[1], keys[2]]);
    presenter.set_color(TaskColor::Green);

    assert_eq!(
        *log.events.borrow(),
        vec![
            PresenterEvent::Inserted(vec![3]),
            PresenterEvent::Moved { from: 0, to: 3 },
            PresenterEvent::Updated(vec![0]),
            PresenterEvent::Removed(vec![1, 0]),
            PresenterEvent::ColorChanged(TaskColor::Green),
        ]
    );
}

#[test]
fn stale_keys_never_panic() {
    let (mut presenter, keys) = presenter(&["A"]);
    presenter.remove_task_item(&keys[0]);
    presenter.toggle_task_item(&keys[0]);
    presenter.update_task_item(&keys[0], "gone");
    presenter.move_task_item(&keys[0], 0);
    assert!(!presenter.can_move_task_item(&keys[0], 0));
    assert!(presenter.is_empty());
}

// ============================================================================
// Persistence boundary
// ============================================================================

#[test]
fn archive_then_reload_round_trips() {
    let (mut presenter, keys) = presenter(&["A", "B"]);
    presenter.toggle_task_item(&keys[0]);
    presenter.set_color(TaskColor::Red);

    let snapshot = presenter.archiveable_task();
    let reloaded = AllTaskItemsPresenter::from_task(snapshot.clone());
    assert_eq!(reloaded.archiveable_task(), snapshot);
    assert_eq!(reloaded.color(), TaskColor::Red);
    assert!(!reloaded.can_undo());
}

#[test]
fn presenters_are_usable_through_the_capability() {
    let mut variants: Vec<Box<dyn TaskPresenting>> =
        vec![Box::new(AllTaskItemsPresenter::new())];
    for presenter in &mut variants {
        assert!(presenter.is_empty());
        presenter.set_task(Task::new(TaskColor::Blue, vec![TaskItem::new("X")]));
        assert_eq!(presenter.count(), 1);
        assert_eq!(presenter.archiveable_task().color, TaskColor::Blue);
    }
}
