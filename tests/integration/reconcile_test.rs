//! Reconciliation of drifted rosters and activities.

mod helpers;

use std::sync::atomic::Ordering;

use eventhub_core::traits::Repository;
use eventhub_entity::activity::{ActivityStatus, Role};
use eventhub_service::RequestContext;

use helpers::TestApp;

#[tokio::test]
async fn test_clean_event_needs_no_repair() {
    let app = TestApp::new();
    let organizer = app.user("olga").await;
    let participant = app.user("pat").await;
    let event_id = app.event(organizer).await;
    app.services
        .registration
        .register(&app.ctx(participant), &event_id)
        .await
        .expect("register");

    let report = app
        .services
        .reconciler
        .reconcile_event(&RequestContext::system(), &event_id)
        .await
        .expect("reconcile");
    assert!(report.is_clean());
}

#[tokio::test]
async fn test_roster_is_rebuilt_from_activities() {
    let app = TestApp::new();
    let organizer = app.user("olga").await;
    let kept = app.user("pat").await;
    let ghost = app.user("gus").await;
    let event_id = app.event(organizer).await;
    app.services
        .registration
        .register(&app.ctx(kept), &event_id)
        .await
        .expect("register");

    // Drop `kept` from the roster and put `ghost` on it without a record.
    let mut event = app.stored_event(&event_id).await;
    event.remove_from_roster(&kept);
    event.add_to_roster(ghost, Role::CoOrganizer);
    app.events.inner.replace(&event).await.expect("inject drift");

    let reconciler = &app.services.reconciler;
    let report = reconciler
        .reconcile_event(&RequestContext::system(), &event_id)
        .await
        .expect("reconcile");
    assert_eq!(report.roster_added, vec![kept]);
    assert_eq!(report.roster_removed, vec![ghost]);
    app.assert_consistent().await;

    let again = reconciler
        .reconcile_event(&RequestContext::system(), &event_id)
        .await
        .expect("second pass");
    assert!(again.is_clean());
}

#[tokio::test]
async fn test_wrong_roster_role_is_corrected() {
    let app = TestApp::new();
    let organizer = app.user("olga").await;
    let co = app.user("cora").await;
    let event_id = app.event(organizer).await;
    app.services
        .crew
        .add_co_organizer(&app.ctx(organizer), &event_id, &co)
        .await
        .expect("promote");

    let mut event = app.stored_event(&event_id).await;
    event.add_to_roster(co, Role::StandardParticipant);
    app.events.inner.replace(&event).await.expect("inject drift");

    let report = app
        .services
        .reconciler
        .reconcile_event(&RequestContext::system(), &event_id)
        .await
        .expect("reconcile");
    assert_eq!(report.roster_added, vec![co]);
    assert!(app.stored_event(&event_id).await.is_co_organizer(&co));
}

#[tokio::test]
async fn test_missing_organizer_record_is_restored() {
    let app = TestApp::new();
    let organizer = app.user("olga").await;
    let event_id = app.event(organizer).await;

    let mut user = app.stored_user(&organizer).await;
    user.remove_activity(&event_id, chrono::Utc::now());
    app.users.inner.replace(&user).await.expect("inject drift");

    let report = app
        .services
        .reconciler
        .reconcile_event(&RequestContext::system(), &event_id)
        .await
        .expect("reconcile");
    assert!(report.organizer_restored);

    let user = app.stored_user(&organizer).await;
    assert_eq!(user.active_role(&event_id), Some(Role::Organizer));
}

#[tokio::test]
async fn test_activities_of_deleted_event_are_removed() {
    let app = TestApp::new();
    let organizer = app.user("olga").await;
    let participant = app.user("pat").await;
    let event_id = app.event(organizer).await;
    app.services
        .registration
        .register(&app.ctx(participant), &event_id)
        .await
        .expect("register");

    app.events.inner.delete(&event_id).await.expect("drop event");

    let summary = app
        .services
        .reconciler
        .reconcile_all(&RequestContext::system())
        .await
        .expect("reconcile all");
    assert_eq!(summary.events_checked, 1);
    assert_eq!(summary.repaired.len(), 1);
    assert!(summary.failed.is_empty());

    let mut removed = summary.repaired[0].activities_removed.clone();
    removed.sort();
    let mut expected = vec![organizer, participant];
    expected.sort();
    assert_eq!(removed, expected);
    app.assert_consistent().await;
}

#[tokio::test]
async fn test_left_and_banned_records_stay_off_the_roster() {
    let app = TestApp::new();
    let organizer = app.user("olga").await;
    let leaver = app.user("lee").await;
    let banned = app.user("bob").await;
    let event_id = app.event(organizer).await;

    for user in [leaver, banned] {
        app.services
            .registration
            .register(&app.ctx(user), &event_id)
            .await
            .expect("register");
    }
    app.services
        .registration
        .leave(&app.ctx(leaver), &event_id)
        .await
        .expect("leave");
    app.services
        .crew
        .ban_participant(&app.ctx(organizer), &event_id, &banned)
        .await
        .expect("ban");

    let mut event = app.stored_event(&event_id).await;
    event.add_to_roster(leaver, Role::StandardParticipant);
    event.add_to_roster(banned, Role::StandardParticipant);
    app.events.inner.replace(&event).await.expect("inject drift");

    let summary = app
        .services
        .reconciler
        .reconcile_all(&RequestContext::system())
        .await
        .expect("reconcile all");
    assert_eq!(summary.repaired.len(), 1);
    assert!(app.stored_event(&event_id).await.roster().is_empty());

    let banned_user = app.stored_user(&banned).await;
    assert_eq!(
        banned_user.activity(&event_id).map(|r| r.status),
        Some(ActivityStatus::Banned)
    );
    app.assert_consistent().await;
}

#[tokio::test(start_paused = true)]
async fn test_full_pass_does_not_read_every_user() {
    let app = TestApp::new();
    let organizer = app.user("olga").await;
    app.event(organizer).await;
    for n in 0..300 {
        app.user(&format!("bystander{n}")).await;
    }

    // 300 lookups at 50ms each would overrun the 10s default deadline.
    app.faults.user_read_delay_ms.store(50, Ordering::SeqCst);

    let summary = app
        .services
        .reconciler
        .reconcile_all(&RequestContext::system())
        .await
        .expect("reconcile all");
    assert_eq!(summary.events_checked, 1);
    assert!(summary.failed.is_empty());
    assert!(summary.repaired.is_empty());
}
