//! Write ordering, partial writes, stale writes, and concurrent transitions.

mod helpers;

use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use eventhub_core::error::{ErrorCategory, ErrorKind};
use eventhub_entity::activity::Role;

use helpers::TestApp;

#[tokio::test]
async fn test_failed_roster_write_reports_partial_write() {
    let app = TestApp::new();
    let organizer = app.user("olga").await;
    let participant = app.user("pat").await;
    let event_id = app.event(organizer).await;

    app.faults.event_replace.store(true, Ordering::SeqCst);
    let err = app
        .services
        .registration
        .register(&app.ctx(participant), &event_id)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::PartialWrite);
    assert_eq!(err.category(), ErrorCategory::Infrastructure);

    // Activity landed, roster did not.
    let user = app.stored_user(&participant).await;
    assert_eq!(user.active_role(&event_id), Some(Role::StandardParticipant));
    assert!(app.stored_event(&event_id).await.roster().is_empty());

    app.heal();
    let report = app
        .services
        .reconciler
        .reconcile_event(&app.ctx(organizer), &event_id)
        .await
        .expect("reconcile");
    assert_eq!(report.roster_added, vec![participant]);
    app.assert_consistent().await;
}

#[tokio::test]
async fn test_failed_activity_write_applies_nothing() {
    let app = TestApp::new();
    let organizer = app.user("olga").await;
    let participant = app.user("pat").await;
    let event_id = app.event(organizer).await;

    app.faults.user_replace_budget.store(0, Ordering::SeqCst);
    let err = app
        .services
        .registration
        .register(&app.ctx(participant), &event_id)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Database);
    assert!(err.is_retryable());
    assert!(!app.stored_user(&participant).await.has_activity(&event_id));
    assert!(app.stored_event(&event_id).await.roster().is_empty());
}

#[tokio::test]
async fn test_stale_write_is_retryable_conflict() {
    let app = TestApp::new();
    let organizer = app.user("olga").await;
    let participant = app.user("pat").await;
    let event_id = app.event(organizer).await;
    let ctx = app.ctx(participant);

    app.faults.race_next_user_replace.store(true, Ordering::SeqCst);
    let err = app
        .services
        .registration
        .register(&ctx, &event_id)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Conflict);
    assert!(err.is_retryable());
    assert!(err.reason.is_none());
    app.assert_consistent().await;

    app.services
        .registration
        .register(&ctx, &event_id)
        .await
        .expect("retry succeeds");
    app.assert_consistent().await;
}

#[tokio::test]
async fn test_interrupted_delete_is_repaired_and_retried() {
    let app = TestApp::new();
    let organizer = app.user("olga").await;
    let first = app.user("pat").await;
    let second = app.user("sam").await;
    let event_id = app.event(organizer).await;

    for user in [first, second] {
        app.services
            .registration
            .register(&app.ctx(user), &event_id)
            .await
            .expect("register");
    }

    app.faults.user_replace_budget.store(1, Ordering::SeqCst);
    let err = app
        .services
        .events
        .delete_event(&app.ctx(organizer), &event_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PartialWrite);
    app.stored_event(&event_id).await;

    app.heal();
    app.services
        .reconciler
        .reconcile_event(&app.ctx(organizer), &event_id)
        .await
        .expect("reconcile");
    app.assert_consistent().await;

    app.services
        .events
        .delete_event(&app.ctx(organizer), &event_id)
        .await
        .expect("retry delete");
    app.assert_consistent().await;
}

#[tokio::test]
async fn test_cancelled_context_writes_nothing() {
    let app = TestApp::new();
    let organizer = app.user("olga").await;
    let participant = app.user("pat").await;
    let event_id = app.event(organizer).await;

    let token = CancellationToken::new();
    token.cancel();
    let ctx = app.ctx(participant).with_cancellation(token);

    let err = app
        .services
        .registration
        .register(&ctx, &event_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Cancelled);
    assert!(!app.stored_user(&participant).await.has_activity(&event_id));
}

#[tokio::test]
async fn test_expired_deadline_writes_nothing() {
    let app = TestApp::new();
    let organizer = app.user("olga").await;
    let participant = app.user("pat").await;
    let event_id = app.event(organizer).await;

    let ctx = app.ctx(participant).with_timeout(Duration::ZERO);
    let err = app
        .services
        .registration
        .register(&ctx, &event_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Timeout);
    assert!(!app.stored_user(&participant).await.has_activity(&event_id));
    assert!(app.stored_event(&event_id).await.roster().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_transitions_on_one_event_stay_consistent() {
    let app = TestApp::new();
    let organizer = app.user("olga").await;
    let event_id = app.event(organizer).await;

    let mut users = Vec::new();
    for i in 0..16 {
        users.push(app.user(&format!("user{i}")).await);
    }

    let mut handles = Vec::new();
    for (i, user) in users.iter().copied().enumerate() {
        let registration = std::sync::Arc::clone(&app.services.registration);
        let crew = std::sync::Arc::clone(&app.services.crew);
        let user_ctx = app.ctx(user);
        let organizer_ctx = app.ctx(organizer);
        handles.push(tokio::spawn(async move {
            registration.register(&user_ctx, &event_id).await?;
            match i % 4 {
                0 => crew.add_co_organizer(&organizer_ctx, &event_id, &user).await,
                1 => registration.leave(&user_ctx, &event_id).await,
                2 => crew.ban_participant(&organizer_ctx, &event_id, &user).await,
                _ => Ok(()),
            }
        }));
    }
    for handle in handles {
        handle.await.expect("task").expect("transition");
    }

    let event = app.stored_event(&event_id).await;
    assert_eq!(event.roster().co_organizers().len(), 4);
    assert_eq!(event.roster().standard_participants().len(), 4);
    app.assert_consistent().await;
}
