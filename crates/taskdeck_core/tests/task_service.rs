use chrono::{DateTime, TimeZone, Utc};
use taskdeck_core::{
    Category, FixedClock, Identity, KvTaskRepository, MemoryStore, Priority, SessionService,
    TaskId, TaskPatch, TaskQuery, TaskRepository, TaskService, TaskServiceError,
    TaskValidationError,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0)
        .single()
        .expect("fixed timestamp should be valid")
}

fn ann() -> Identity {
    Identity::new("ann", "ann@example.com")
}

fn service(
    store: &MemoryStore,
    identity: Option<Identity>,
) -> TaskService<KvTaskRepository<&MemoryStore>, Option<Identity>, FixedClock> {
    TaskService::with_clock(KvTaskRepository::new(store), identity, FixedClock(now()))
}

#[test]
fn add_creates_open_record_for_current_owner() {
    let store = MemoryStore::new();
    let service = service(&store, Some(ann()));

    let created = service
        .add("Buy milk", Category::Shopping, Priority::Low)
        .expect("add should succeed")
        .expect("add should create a record");
    assert!(!created.completed);
    assert_eq!(created.created_at, now());
    assert_eq!(created.due_date, None);
    assert!(created.tags.is_empty());
    assert_eq!(created.owner, ann().owner_id());
    assert_eq!(service.records(), vec![created]);
}

#[test]
fn add_is_a_noop_for_blank_text_or_missing_identity() {
    let store = MemoryStore::new();
    let signed_in = service(&store, Some(ann()));
    assert!(signed_in
        .add("   ", Category::Other, Priority::Medium)
        .expect("blank add should not fail")
        .is_none());

    let signed_out = service(&store, None);
    assert!(signed_out
        .add("Buy milk", Category::Other, Priority::Medium)
        .expect("signed-out add should not fail")
        .is_none());
    assert!(signed_in.records().is_empty());
}

#[test]
fn ids_stay_unique_when_added_within_one_millisecond() {
    let store = MemoryStore::new();
    let service = service(&store, Some(ann()));
    let first = service
        .add("a", Category::Work, Priority::Low)
        .expect("add should succeed")
        .expect("add should create a record");
    let second = service
        .add("b", Category::Work, Priority::Low)
        .expect("add should succeed")
        .expect("add should create a record");
    assert_ne!(first.id, second.id);
}

#[test]
fn toggle_and_delete_target_one_record() {
    let store = MemoryStore::new();
    let service = service(&store, Some(ann()));
    let keep = service
        .add("keep", Category::Work, Priority::Low)
        .expect("add should succeed")
        .expect("add should create a record");
    let gone = service
        .add("drop", Category::Work, Priority::Low)
        .expect("add should succeed")
        .expect("add should create a record");

    assert!(
        service
            .toggle_complete(keep.id)
            .expect("first toggle should succeed")
            .completed
    );
    assert!(
        !service
            .toggle_complete(keep.id)
            .expect("second toggle should succeed")
            .completed
    );

    service.delete(gone.id).expect("delete should succeed");
    let remaining = service.records();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep.id);

    assert!(matches!(
        service.delete(gone.id),
        Err(TaskServiceError::NotFound(id)) if id == gone.id
    ));
}

#[test]
fn edit_merges_patch_fields() {
    let store = MemoryStore::new();
    let service = service(&store, Some(ann()));
    let task = service
        .add("Draft", Category::Work, Priority::Low)
        .expect("add should succeed")
        .expect("add should create a record");
    let due = Utc
        .with_ymd_and_hms(2024, 6, 9, 0, 0, 0)
        .single()
        .expect("fixed timestamp should be valid");

    let edited = service
        .edit(
            task.id,
            &TaskPatch {
                text: Some("Final".to_string()),
                priority: Some(Priority::High),
                due_date: Some(Some(due)),
                notes: Some(Some("by friday".to_string())),
                tags: Some(vec!["q2".to_string()]),
                ..TaskPatch::default()
            },
        )
        .expect("valid edit should succeed");
    assert_eq!(edited.text, "Final");
    assert_eq!(edited.priority, Priority::High);
    assert_eq!(edited.due_date, Some(due));
    assert_eq!(edited.category, Category::Work);
    assert_eq!(service.records(), vec![edited]);
}

#[test]
fn edit_rejects_more_than_three_tags_and_saves_nothing() {
    let store = MemoryStore::new();
    let service = service(&store, Some(ann()));
    let task = service
        .add("Tagged", Category::Work, Priority::Low)
        .expect("add should succeed")
        .expect("add should create a record");

    let err = service
        .edit(
            task.id,
            &TaskPatch {
                text: Some("Renamed".to_string()),
                tags: Some(vec!["a".into(), "b".into(), "c".into(), "d".into()]),
                ..TaskPatch::default()
            },
        )
        .expect_err("four tags should be rejected");
    assert!(matches!(
        err,
        TaskServiceError::Validation(TaskValidationError::TooManyTags { count: 4, max: 3 })
    ));
    assert_eq!(service.records(), vec![task]);
}

#[test]
fn edit_rejects_blank_text() {
    let store = MemoryStore::new();
    let service = service(&store, Some(ann()));
    let task = service
        .add("Named", Category::Work, Priority::Low)
        .expect("add should succeed")
        .expect("add should create a record");
    let err = service
        .edit(
            task.id,
            &TaskPatch {
                text: Some("  ".to_string()),
                ..TaskPatch::default()
            },
        )
        .expect_err("blank text should be rejected");
    assert!(matches!(
        err,
        TaskServiceError::Validation(TaskValidationError::EmptyText)
    ));
}

#[test]
fn add_tag_stops_at_three_and_remove_tag_frees_a_slot() {
    let store = MemoryStore::new();
    let service = service(&store, Some(ann()));
    let task = service
        .add("Tagged", Category::Work, Priority::Low)
        .expect("add should succeed")
        .expect("add should create a record");

    for tag in ["one", "two", "three"] {
        service
            .add_tag(task.id, tag)
            .expect("tags below the cap should be accepted");
    }
    let err = service
        .add_tag(task.id, "four")
        .expect_err("a fourth tag should be rejected");
    assert!(matches!(
        err,
        TaskServiceError::Validation(TaskValidationError::TooManyTags { .. })
    ));
    assert_eq!(service.records()[0].tags.len(), 3);

    let after_remove = service
        .remove_tag(task.id, "two")
        .expect("remove_tag should succeed");
    assert_eq!(after_remove.tags, vec!["one".to_string(), "three".to_string()]);
    service
        .add_tag(task.id, "four")
        .expect("a freed slot should accept a tag");
}

#[test]
fn mutations_without_identity_fail_explicitly() {
    let store = MemoryStore::new();
    let service = service(&store, None);
    assert!(matches!(
        service.toggle_complete(TaskId(1)),
        Err(TaskServiceError::NoIdentity)
    ));
    assert!(matches!(
        service.add_tag(TaskId(1), "x"),
        Err(TaskServiceError::NoIdentity)
    ));
    assert!(service.list(&TaskQuery::default()).is_empty());
    assert_eq!(service.stats().total_todos, 0);
}

#[test]
fn owners_never_see_each_others_records() {
    let store = MemoryStore::new();
    let ann_service = service(&store, Some(ann()));
    let bob_service = service(&store, Some(Identity::new("bob", "bob@example.com")));
    let ann_task = ann_service
        .add("ann only", Category::Personal, Priority::High)
        .expect("add should succeed")
        .expect("add should create a record");
    bob_service
        .add("bob only", Category::Personal, Priority::High)
        .expect("add should succeed");

    assert!(matches!(
        bob_service.toggle_complete(ann_task.id),
        Err(TaskServiceError::NotFound(_))
    ));
    let ann_view = ann_service.list(&TaskQuery::default());
    assert_eq!(ann_view.len(), 1);
    assert_eq!(ann_view[0].text, "ann only");

    let repo = KvTaskRepository::new(&store);
    let bob = Identity::new("bob", "bob@example.com").owner_id();
    assert_eq!(repo.load(&bob).len(), 1);
}

#[test]
fn session_login_scopes_the_service() {
    let store = MemoryStore::new();
    let session = SessionService::new(&store);
    let service =
        TaskService::with_clock(KvTaskRepository::new(&store), &session, FixedClock(now()));

    assert!(service
        .add("before login", Category::Other, Priority::Low)
        .expect("signed-out add should not fail")
        .is_none());

    session.login("ann", "secret").expect("login should succeed");
    let created = service
        .add("after login", Category::Other, Priority::Low)
        .expect("add should succeed")
        .expect("add should create a record");
    assert_eq!(created.owner.as_str(), "ann@example.com");

    session.logout().expect("logout should succeed");
    assert!(service.records().is_empty());
}

#[test]
fn identity_with_blank_email_counts_as_signed_out() {
    let store = MemoryStore::new();
    let seeded = service(&store, Some(ann()));
    let task = seeded
        .add("ann only", Category::Work, Priority::Low)
        .expect("add should succeed")
        .expect("add should create a record");

    let blank = service(&store, Some(Identity::new("ghost", "  ")));
    assert!(blank
        .add("orphan", Category::Other, Priority::Low)
        .expect("add without an owner should not fail")
        .is_none());
    assert!(matches!(
        blank.toggle_complete(task.id),
        Err(TaskServiceError::NoIdentity)
    ));
    assert!(blank.records().is_empty());
    assert_eq!(seeded.records(), vec![task]);
}
