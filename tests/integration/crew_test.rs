//! Crew moderation and account tests.

mod helpers;

use eventhub_core::error::Reason;
use eventhub_core::types::UserId;
use eventhub_entity::activity::{ActivityStatus, Role};
use eventhub_entity::user::CreateUser;
use eventhub_service::RequestContext;

use helpers::TestApp;

#[tokio::test]
async fn test_promoting_participant_moves_between_roster_roles() {
    let app = TestApp::new();
    let organizer = app.user("olga").await;
    let participant = app.user("pat").await;
    let event_id = app.event(organizer).await;

    app.services
        .registration
        .register(&app.ctx(participant), &event_id)
        .await
        .expect("register");
    app.services
        .crew
        .add_co_organizer(&app.ctx(organizer), &event_id, &participant)
        .await
        .expect("promote");

    let event = app.stored_event(&event_id).await;
    assert!(event.roster().standard_participants().is_empty());
    assert_eq!(event.roster().co_organizers(), vec![participant]);

    let user = app.stored_user(&participant).await;
    assert_eq!(user.activities().len(), 1);
    assert_eq!(user.active_role(&event_id), Some(Role::CoOrganizer));
    app.assert_consistent().await;
}

#[tokio::test]
async fn test_promote_then_demote_leaves_active_participant() {
    let app = TestApp::new();
    let organizer = app.user("olga").await;
    let user_id = app.user("cora").await;
    let event_id = app.event(organizer).await;
    let ctx = app.ctx(organizer);

    app.services
        .crew
        .add_co_organizer(&ctx, &event_id, &user_id)
        .await
        .expect("promote");
    app.services
        .crew
        .remove_co_organizer(&ctx, &event_id, &user_id)
        .await
        .expect("demote");

    let event = app.stored_event(&event_id).await;
    assert_eq!(event.roster().standard_participants(), vec![user_id]);
    assert!(event.roster().co_organizers().is_empty());

    let user = app.stored_user(&user_id).await;
    let record = user.activity(&event_id).expect("record kept");
    assert_eq!(record.role, Role::StandardParticipant);
    assert_eq!(record.status, ActivityStatus::Active);
    app.assert_consistent().await;
}

#[tokio::test]
async fn test_add_co_organizer_rules() {
    let app = TestApp::new();
    let organizer = app.user("olga").await;
    let co = app.user("cora").await;
    let other = app.user("otto").await;
    let event_id = app.event(organizer).await;

    app.services
        .crew
        .add_co_organizer(&app.ctx(organizer), &event_id, &co)
        .await
        .expect("promote");

    let err = app
        .services
        .crew
        .add_co_organizer(&app.ctx(organizer), &event_id, &co)
        .await
        .unwrap_err();
    assert!(err.is(Reason::AlreadyRegistered));

    let err = app
        .services
        .crew
        .add_co_organizer(&app.ctx(organizer), &event_id, &organizer)
        .await
        .unwrap_err();
    assert!(err.is(Reason::AlreadyRegistered));

    let err = app
        .services
        .crew
        .add_co_organizer(&app.ctx(co), &event_id, &other)
        .await
        .unwrap_err();
    assert!(err.is(Reason::Forbidden));

    let err = app
        .services
        .crew
        .add_co_organizer(&app.ctx(organizer), &event_id, &UserId::new())
        .await
        .unwrap_err();
    assert!(err.is(Reason::UserNotFound));
}

#[tokio::test]
async fn test_remove_co_organizer_rules() {
    let app = TestApp::new();
    let organizer = app.user("olga").await;
    let participant = app.user("pat").await;
    let outsider = app.user("otto").await;
    let event_id = app.event(organizer).await;
    let ctx = app.ctx(organizer);

    app.services
        .registration
        .register(&app.ctx(participant), &event_id)
        .await
        .expect("register");

    let err = app
        .services
        .crew
        .remove_co_organizer(&ctx, &event_id, &outsider)
        .await
        .unwrap_err();
    assert!(err.is(Reason::NotRegistered));

    let err = app
        .services
        .crew
        .remove_co_organizer(&ctx, &event_id, &participant)
        .await
        .unwrap_err();
    assert!(err.is(Reason::InvalidRole));
}

#[tokio::test]
async fn test_organizer_can_never_be_removed() {
    let app = TestApp::new();
    let organizer = app.user("olga").await;
    let co = app.user("cora").await;
    let participant = app.user("pat").await;
    let outsider = app.user("otto").await;
    let event_id = app.event(organizer).await;

    app.services
        .crew
        .add_co_organizer(&app.ctx(organizer), &event_id, &co)
        .await
        .expect("promote");
    app.services
        .registration
        .register(&app.ctx(participant), &event_id)
        .await
        .expect("register");

    for actor in [organizer, co, participant, outsider] {
        let ctx = app.ctx(actor);
        let crew = &app.services.crew;

        let err = crew
            .remove_participant(&ctx, &event_id, &organizer)
            .await
            .unwrap_err();
        assert!(err.is(Reason::OrganizerCannotBeRemoved));

        let err = crew
            .ban_participant(&ctx, &event_id, &organizer)
            .await
            .unwrap_err();
        assert!(err.is(Reason::OrganizerCannotBeRemoved));

        let err = crew
            .remove_co_organizer(&ctx, &event_id, &organizer)
            .await
            .unwrap_err();
        assert!(err.is(Reason::OrganizerCannotBeRemoved));
    }

    let organizer_user = app.stored_user(&organizer).await;
    assert_eq!(organizer_user.active_role(&event_id), Some(Role::Organizer));
}

#[tokio::test]
async fn test_ban_keeps_record_and_blocks_return() {
    let app = TestApp::new();
    let organizer = app.user("olga").await;
    let participant = app.user("pat").await;
    let event_id = app.event(organizer).await;

    app.services
        .registration
        .register(&app.ctx(participant), &event_id)
        .await
        .expect("register");
    app.services
        .crew
        .ban_participant(&app.ctx(organizer), &event_id, &participant)
        .await
        .expect("ban");

    let user = app.stored_user(&participant).await;
    assert_eq!(
        user.activity(&event_id).map(|r| r.status),
        Some(ActivityStatus::Banned)
    );
    let event = app.stored_event(&event_id).await;
    assert!(!event.roster().contains(&participant));

    let err = app
        .services
        .registration
        .register(&app.ctx(participant), &event_id)
        .await
        .unwrap_err();
    assert!(err.is(Reason::UserBanned));

    let err = app
        .services
        .crew
        .add_co_organizer(&app.ctx(organizer), &event_id, &participant)
        .await
        .unwrap_err();
    assert!(err.is(Reason::UserBanned));
    app.assert_consistent().await;
}

#[tokio::test]
async fn test_remove_participant_deletes_record() {
    let app = TestApp::new();
    let organizer = app.user("olga").await;
    let co = app.user("cora").await;
    let participant = app.user("pat").await;
    let event_id = app.event(organizer).await;

    app.services
        .crew
        .add_co_organizer(&app.ctx(organizer), &event_id, &co)
        .await
        .expect("promote");
    app.services
        .registration
        .register(&app.ctx(participant), &event_id)
        .await
        .expect("register");

    let err = app
        .services
        .crew
        .remove_participant(&app.ctx(participant), &event_id, &co)
        .await
        .unwrap_err();
    assert!(err.is(Reason::Forbidden));

    app.services
        .crew
        .remove_participant(&app.ctx(co), &event_id, &participant)
        .await
        .expect("remove");

    let user = app.stored_user(&participant).await;
    assert!(!user.has_activity(&event_id));
    assert!(!app.stored_event(&event_id).await.roster().contains(&participant));

    let err = app
        .services
        .crew
        .remove_participant(&app.ctx(co), &event_id, &participant)
        .await
        .unwrap_err();
    assert!(err.is(Reason::NotRegistered));

    app.services
        .registration
        .register(&app.ctx(participant), &event_id)
        .await
        .expect("removed users may register again");
    app.assert_consistent().await;
}

#[tokio::test]
async fn test_create_user_rejects_taken_email() {
    let app = TestApp::new();
    let ctx = RequestContext::system();
    let req = CreateUser {
        email: "ada@example.com".to_string(),
        display_name: None,
    };

    app.services
        .users
        .create_user(&ctx, req.clone())
        .await
        .expect("first");
    let err = app
        .services
        .users
        .create_user(
            &ctx,
            CreateUser {
                email: "ADA@example.com".to_string(),
                display_name: None,
            },
        )
        .await
        .unwrap_err();
    assert!(err.is(Reason::EmailTaken));
}

#[tokio::test]
async fn test_delete_user_detaches_from_rosters() {
    let app = TestApp::new();
    let organizer = app.user("olga").await;
    let participant = app.user("pat").await;
    let event_id = app.event(organizer).await;

    app.services
        .registration
        .register(&app.ctx(participant), &event_id)
        .await
        .expect("register");

    let err = app
        .services
        .users
        .delete_user(&app.ctx(organizer), &participant)
        .await
        .unwrap_err();
    assert!(err.is(Reason::Forbidden));

    let err = app
        .services
        .users
        .delete_user(&app.ctx(organizer), &organizer)
        .await
        .unwrap_err();
    assert!(err.is(Reason::Forbidden));

    app.services
        .users
        .delete_user(&app.ctx(participant), &participant)
        .await
        .expect("delete");

    assert!(app.stored_event(&event_id).await.roster().is_empty());
    let err = app
        .services
        .users
        .get_user(&app.ctx(organizer), &participant)
        .await
        .unwrap_err();
    assert!(err.is(Reason::UserNotFound));
    app.assert_consistent().await;
}
