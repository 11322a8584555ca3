use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;

use shared_database::{Collection, DocumentStore, InMemoryStore, Query, SortDirection, StoreError};

#[tokio::test]
async fn duplicate_ids_are_rejected() {
    let store = InMemoryStore::new();
    let doc = json!({ "id": "doctor:1", "holder": "a" });

    store.insert(Collection::SchedulingLocks, doc.clone()).await.unwrap();
    let err = store.insert(Collection::SchedulingLocks, doc).await.unwrap_err();

    assert_matches!(err, StoreError::Duplicate(_));
}

#[tokio::test]
async fn range_queries_are_ordered_and_limited() {
    let store = InMemoryStore::new();
    let doctor = Uuid::new_v4().to_string();

    for (id, hour) in [("a", 11), ("b", 9), ("c", 10), ("d", 15)] {
        store
            .insert(
                Collection::Appointments,
                json!({
                    "id": id,
                    "doctor_id": doctor,
                    "scheduled_time": format!("2025-03-05T{:02}:00:00Z", hour),
                }),
            )
            .await
            .unwrap();
    }

    let query = Query::new()
        .eq("doctor_id", &doctor)
        .gte("scheduled_time", "2025-03-05T09:00:00Z")
        .lte("scheduled_time", "2025-03-05T11:00:00Z")
        .order_by("scheduled_time", SortDirection::Asc)
        .limit(2);
    let hits = store.find(Collection::Appointments, &query).await.unwrap();

    let ids: Vec<&str> = hits.iter().filter_map(|d| d["id"].as_str()).collect();
    assert_eq!(ids, vec!["b", "c"]);
}

#[tokio::test]
async fn guarded_writes_only_apply_when_the_guard_matches() {
    let store = InMemoryStore::new();
    store
        .insert(
            Collection::Appointments,
            json!({ "id": "a1", "reminder_sent_at": null, "notes": "x" }),
        )
        .await
        .unwrap();

    let guard = Query::new().is_null("reminder_sent_at");
    let first = store
        .update(
            Collection::Appointments,
            "a1",
            json!({ "reminder_sent_at": "2025-03-05T09:00:00Z" }),
            &guard,
        )
        .await
        .unwrap();
    assert!(first.is_some());
    assert_eq!(first.unwrap()["notes"], "x");

    let second = store
        .update(
            Collection::Appointments,
            "a1",
            json!({ "reminder_sent_at": "2025-03-05T10:00:00Z" }),
            &guard,
        )
        .await
        .unwrap();
    assert!(second.is_none());

    let wrong_holder = Query::new().eq("notes", "y");
    assert!(!store
        .delete(Collection::Appointments, "a1", &wrong_holder)
        .await
        .unwrap());
    assert!(store
        .delete(Collection::Appointments, "a1", &Query::new())
        .await
        .unwrap());
}

#[tokio::test]
async fn references_are_pushed_and_pulled() {
    let store = InMemoryStore::new();
    store
        .insert(Collection::Patients, json!({ "id": "p1" }))
        .await
        .unwrap();

    assert!(store
        .push_reference(Collection::Patients, "p1", "appointments", "a1")
        .await
        .unwrap());
    assert!(store
        .push_reference(Collection::Patients, "p1", "appointments", "a2")
        .await
        .unwrap());
    assert!(store
        .pull_reference(Collection::Patients, "p1", "appointments", "a1")
        .await
        .unwrap());

    let patient = store.get(Collection::Patients, "p1").await.unwrap().unwrap();
    assert_eq!(patient["appointments"], json!(["a2"]));

    assert!(!store
        .push_reference(Collection::Patients, "missing", "appointments", "a1")
        .await
        .unwrap());
}
