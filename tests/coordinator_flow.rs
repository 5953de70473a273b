//! Coordinator behavior over a real directory namespace.

use std::cell::RefCell;
use std::fs;
use std::rc::Rc;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use tasks::cloud::{CoordinatorState, DirectoryProvider, TaskCoordinator};
use tasks::model::DocRef;
use tempfile::TempDir;

type Changes = Rc<RefCell<Vec<(Vec<String>, Vec<String>, Vec<String>)>>>;

fn names(docs: &[DocRef]) -> Vec<String> {
    docs.iter().map(|d| d.name.clone()).collect()
}

fn listen(coordinator: &mut TaskCoordinator) -> Changes {
    let changes: Changes = Rc::default();
    let sink = Rc::clone(&changes);
    coordinator.add_listener(move |added, removed, updated| {
        sink.borrow_mut()
            .push((names(added), names(removed), names(updated)));
    });
    changes
}

/// Pump the coordinator until `done` holds or the deadline passes
fn pump_until(coordinator: &mut TaskCoordinator, done: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        coordinator.wait_and_process(Duration::from_millis(50));
        if done() {
            return true;
        }
    }
    false
}

#[test]
fn initial_gather_reports_matching_documents() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Groceries.task"), "milk").unwrap();
    fs::write(tmp.path().join("Work.task"), "ship it").unwrap();
    fs::write(tmp.path().join("readme.txt"), "ignored").unwrap();

    let fired = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&fired);
    let mut coordinator = TaskCoordinator::with_path_extension(
        "task",
        Box::new(DirectoryProvider::new(tmp.path())),
        move || *counter.borrow_mut() += 1,
    );
    let changes = listen(&mut coordinator);

    assert!(coordinator.wait_and_process(Duration::from_secs(5)));
    assert_eq!(coordinator.state(), CoordinatorState::Live);
    assert_eq!(*fired.borrow(), 1);
    assert_eq!(
        changes.borrow()[0].0,
        vec!["Groceries.task".to_string(), "Work.task".to_string()]
    );
    coordinator.stop();
}

#[test]
fn missing_directory_degrades_to_no_documents() {
    let tmp = TempDir::new().unwrap();
    let mut coordinator = TaskCoordinator::with_path_extension(
        "task",
        Box::new(DirectoryProvider::new(tmp.path().join("not-synced-yet"))),
        || {},
    );
    let changes = listen(&mut coordinator);

    assert!(coordinator.wait_and_process(Duration::from_secs(5)));
    assert_eq!(coordinator.state(), CoordinatorState::Live);
    assert!(coordinator.documents().is_empty());
    assert!(changes.borrow().is_empty());
}

#[test]
fn offline_coordinator_waits_instead_of_spinning() {
    let tmp = TempDir::new().unwrap();
    let mut coordinator = TaskCoordinator::with_path_extension(
        "task",
        Box::new(DirectoryProvider::new(tmp.path().join("offline"))),
        || {},
    );
    assert!(coordinator.wait_and_process(Duration::from_secs(5)));

    let begun = Instant::now();
    let mut calls = 0;
    while begun.elapsed() < Duration::from_millis(300) {
        assert!(!coordinator.wait_and_process(Duration::from_millis(100)));
        calls += 1;
    }
    assert!(calls <= 4, "{} waits in 300ms", calls);
}

#[test]
fn exact_name_tracks_one_document() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Today.task"), "").unwrap();
    fs::write(tmp.path().join("Tomorrow.task"), "").unwrap();

    let mut coordinator = TaskCoordinator::with_last_path_component(
        "Today.task",
        Box::new(DirectoryProvider::new(tmp.path())),
        || {},
    );
    coordinator.wait_and_process(Duration::from_secs(5));
    assert_eq!(names(coordinator.documents()), vec!["Today.task".to_string()]);
}

#[test]
fn file_system_changes_reach_listeners() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Old.task"), "x").unwrap();

    let mut coordinator = TaskCoordinator::with_path_extension(
        "task",
        Box::new(DirectoryProvider::new(tmp.path())),
        || {},
    );
    let changes = listen(&mut coordinator);
    coordinator.wait_and_process(Duration::from_secs(5));
    changes.borrow_mut().clear();

    fs::write(tmp.path().join("New.task"), "y").unwrap();
    let seen = Rc::clone(&changes);
    assert!(pump_until(&mut coordinator, || {
        seen.borrow().iter().any(|(added, _, _)| added.contains(&"New.task".to_string()))
    }));

    fs::remove_file(tmp.path().join("Old.task")).unwrap();
    let seen = Rc::clone(&changes);
    assert!(pump_until(&mut coordinator, || {
        seen.borrow().iter().any(|(_, removed, _)| removed.contains(&"Old.task".to_string()))
    }));

    assert_eq!(names(coordinator.documents()), vec!["New.task".to_string()]);
    coordinator.stop();
}
