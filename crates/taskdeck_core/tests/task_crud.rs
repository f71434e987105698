use taskdeck_core::{
    SortDirection, SortField, SortKey, StoreMode, Task, TaskFilter, TaskRepository, TaskStore,
};
use uuid::Uuid;

fn empty_repo() -> TaskRepository {
    let store = TaskStore::open(StoreMode::Testing).unwrap();
    TaskRepository::new(store)
}

#[test]
fn create_appends_exactly_one_task_to_the_live_view() {
    let mut repo = empty_repo();

    let task = repo.create("buy milk");

    assert_eq!(task.title, "buy milk");
    assert!(!task.is_complete);

    let snapshot = repo.snapshot();
    assert_eq!(snapshot.len(), 1);
    let cached = repo.get(task.id).unwrap();
    assert_eq!(cached.title, "buy milk");
    assert!(!cached.is_complete);
}

#[test]
fn live_view_defaults_to_title_descending() {
    let mut repo = empty_repo();

    repo.create("alpha");
    repo.create("charlie");
    repo.create("bravo");

    let titles: Vec<String> = repo
        .snapshot()
        .into_values()
        .map(|task| task.title)
        .collect();
    assert_eq!(titles, ["charlie", "bravo", "alpha"]);
}

#[test]
fn update_overwrites_mutable_fields_of_existing_record() {
    let mut repo = empty_repo();
    let task = repo.create("draft");

    let mut updated = task.clone();
    updated.title = "final".to_string();
    updated.is_complete = true;
    repo.update(&updated);

    let loaded = repo.get(task.id).unwrap();
    assert_eq!(loaded.title, "final");
    assert!(loaded.is_complete);
    assert_eq!(repo.snapshot().len(), 1);
}

#[test]
fn update_with_unknown_id_falls_back_to_insert() {
    let mut repo = empty_repo();

    let synthesized = Task::with_id(Uuid::new_v4(), "client-side id", false);
    repo.update(&synthesized);

    let loaded = repo.get(synthesized.id).unwrap();
    assert_eq!(loaded.title, "client-side id");
    assert_eq!(repo.snapshot().len(), 1);
}

#[test]
fn update_twice_with_identical_value_is_idempotent() {
    let mut repo = empty_repo();
    let task = repo.create("stable");

    let mut updated = task.clone();
    updated.is_complete = true;
    repo.update(&updated);
    let first: Vec<(String, bool)> = view_fields(&repo);

    repo.update(&updated);
    let second: Vec<(String, bool)> = view_fields(&repo);

    assert_eq!(first, second);
    assert_eq!(repo.snapshot().len(), 1);
}

#[test]
fn delete_removes_the_task_and_repeat_delete_is_a_noop() {
    let mut repo = empty_repo();
    let keep = repo.create("keep");
    let gone = repo.create("gone");

    repo.delete(&gone);
    assert!(repo.get(gone.id).is_none());
    assert_eq!(repo.snapshot().len(), 1);

    repo.delete(&gone);
    assert_eq!(repo.snapshot().len(), 1);
    assert!(repo.get(keep.id).is_some());
}

#[test]
fn get_with_unknown_id_returns_none() {
    let repo = empty_repo();
    assert!(repo.get(Uuid::new_v4()).is_none());
}

#[test]
fn refresh_with_sort_override_reorders_without_data_loss() {
    let mut repo = empty_repo();
    repo.create("alpha");
    repo.create("bravo");
    repo.create("charlie");

    repo.refresh(
        None,
        Some(SortKey {
            field: SortField::Title,
            direction: SortDirection::Ascending,
        }),
    );

    let titles: Vec<String> = repo
        .snapshot()
        .into_values()
        .map(|task| task.title)
        .collect();
    assert_eq!(titles, ["alpha", "bravo", "charlie"]);
}

#[test]
fn refresh_substitutes_filter_and_reset_restores_defaults() {
    let mut repo = empty_repo();
    let done = repo.create("done");
    repo.create("open");

    let mut completed = done.clone();
    completed.is_complete = true;
    repo.update(&completed);

    repo.refresh(
        Some(TaskFilter {
            is_complete: Some(false),
            title_contains: None,
        }),
        None,
    );
    let titles: Vec<String> = repo
        .snapshot()
        .into_values()
        .map(|task| task.title)
        .collect();
    assert_eq!(titles, ["open"]);

    repo.reset();
    assert_eq!(repo.snapshot().len(), 2);
    assert_eq!(repo.query(), &Default::default());
}

#[test]
fn refresh_filters_by_title_fragment() {
    let mut repo = empty_repo();
    repo.create("water the plants");
    repo.create("buy groceries");

    repo.refresh(
        Some(TaskFilter {
            is_complete: None,
            title_contains: Some("plants".to_string()),
        }),
        None,
    );

    let titles: Vec<String> = repo
        .snapshot()
        .into_values()
        .map(|task| task.title)
        .collect();
    assert_eq!(titles, ["water the plants"]);
}

#[test]
fn subscribers_receive_the_new_ordered_mapping_on_every_change() {
    let mut repo = empty_repo();
    let subscription = repo.subscribe();

    let task = repo.create("observed");

    let event = subscription.events().try_recv().unwrap();
    assert_eq!(event.tasks.len(), 1);
    assert!(event.tasks.contains_key(&task.id));

    repo.delete(&task);
    let event = subscription.events().try_recv().unwrap();
    assert!(event.tasks.is_empty());
}

#[test]
fn unsubscribed_observers_stop_receiving_events() {
    let mut repo = empty_repo();
    let subscription = repo.subscribe();

    repo.unsubscribe(subscription.id());
    repo.create("unseen");

    assert!(subscription.events().try_recv().is_err());
}

fn view_fields(repo: &TaskRepository) -> Vec<(String, bool)> {
    repo.snapshot()
        .into_values()
        .map(|task| (task.title, task.is_complete))
        .collect()
}
