use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Method, Request, StatusCode},
};
use tower::ServiceExt;

use notification_cell::models::messages;
use notification_cell::router::notification_routes;
use notification_cell::{NotificationError, NotificationService, NotificationSink, NotificationType};
use shared_database::InMemoryStore;
use shared_utils::test_utils::{TestConfig, TestUser};

#[tokio::test]
async fn unread_notifications_are_listed_first() {
    let store = Arc::new(InMemoryStore::new());
    let service = NotificationService::new(store.clone());
    let patient = TestUser::patient();

    let first = service
        .emit(patient.id, NotificationType::Appointment, messages::CONFIRMED)
        .await
        .unwrap();
    service
        .emit(patient.id, NotificationType::Update, messages::NOTES_UPDATED)
        .await
        .unwrap();
    service
        .mark_read(&patient.to_credentials(), first.id)
        .await
        .unwrap();

    let listed = service.list_for_user(patient.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(!listed[0].is_read);
    assert_eq!(listed[0].message, messages::NOTES_UPDATED);
    assert!(listed[1].is_read);
}

#[tokio::test]
async fn other_users_notifications_look_missing() {
    let store = Arc::new(InMemoryStore::new());
    let service = NotificationService::new(store.clone());
    let owner = TestUser::patient();
    let stranger = TestUser::doctor();

    let notification = service
        .emit(owner.id, NotificationType::Appointment, messages::CANCELLED)
        .await
        .unwrap();

    assert_matches!(
        service.mark_read(&stranger.to_credentials(), notification.id).await,
        Err(NotificationError::NotFound)
    );
    assert_matches!(
        service.delete(&stranger.to_credentials(), notification.id).await,
        Err(NotificationError::NotFound)
    );
    service
        .delete(&owner.to_credentials(), notification.id)
        .await
        .unwrap();
    assert!(service.list_for_user(owner.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn mark_all_read_only_touches_the_callers_notifications() {
    let store = Arc::new(InMemoryStore::new());
    let service = NotificationService::new(store.clone());
    let me = TestUser::patient();
    let someone_else = TestUser::patient();

    for _ in 0..3 {
        service
            .emit(me.id, NotificationType::Appointment, messages::REMINDER)
            .await
            .unwrap();
    }
    service
        .emit(someone_else.id, NotificationType::Appointment, messages::REMINDER)
        .await
        .unwrap();

    assert_eq!(service.mark_all_read(me.id).await.unwrap(), 3);
    let theirs = service.list_for_user(someone_else.id).await.unwrap();
    assert!(!theirs[0].is_read);
}

#[tokio::test]
async fn list_route_returns_the_callers_notifications() {
    let config = TestConfig::default();
    let store = Arc::new(InMemoryStore::new());
    let user = TestUser::doctor();

    NotificationService::new(store.clone())
        .emit(user.id, NotificationType::Appointment, messages::BOOKED_FOR_DOCTOR)
        .await
        .unwrap();

    let app = notification_routes(config.memory_state(store));
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/")
                .header(AUTHORIZATION, user.bearer(&config.jwt_secret))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
