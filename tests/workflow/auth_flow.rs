use crate::fake_service::{Event, Harness, ScriptedPrompter, ScriptedService, accepted, success};
use postgate::config::PublishConfig;
use postgate::error::{ValidationError, WorkflowError};
use postgate::remote::{CodeVerification, RemoteOutcome};
use postgate::workflow::{AuthResolution, MessageLevel, PublishReport, PublishState, StoryMode};
use std::time::Duration;

async fn suspended(service: ScriptedService) -> Harness {
    let h = Harness::new(service);
    h.ready_to_publish().await;
    let report = h.orchestrator.publish(StoryMode::Channel).await.unwrap();
    assert_eq!(report, PublishReport::AwaitingAuth);
    h
}

#[tokio::test]
async fn blank_code_is_rejected_locally() {
    let h = suspended(
        ScriptedService::new().with_publish(vec![Ok(RemoteOutcome::AuthRequired)]),
    )
    .await;

    let err = h.orchestrator.submit_auth_code("   ").await.unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Validation(ValidationError::EmptyCode)
    ));
    assert_eq!(h.service.verify_count(), 0);
    assert_eq!(h.orchestrator.state(), PublishState::AuthPending);
    assert!(h.observer.has_message(MessageLevel::Warning, "verification code"));
}

#[tokio::test]
async fn two_factor_rejection_gives_guidance_and_stays_suspended() {
    let verdict = CodeVerification {
        accepted: false,
        resume_publish: false,
        needs_two_factor: true,
        message: Some("Two-step verification is enabled".into()),
    };
    let h = suspended(
        ScriptedService::new()
            .with_publish(vec![Ok(RemoteOutcome::AuthRequired)])
            .with_verifications(vec![verdict]),
    )
    .await;

    let resolution = h.orchestrator.submit_auth_code("55555").await.unwrap();

    assert_eq!(
        resolution,
        AuthResolution::Rejected {
            needs_two_factor: true
        }
    );
    assert_eq!(h.orchestrator.state(), PublishState::AuthPending);
    assert!(h.orchestrator.pending_request().is_some());
    assert_eq!(h.service.publish_requests().len(), 1);
    assert_eq!(h.observer.count(&Event::AuthClosed), 0);
    assert!(h.observer.has_message(MessageLevel::Danger, "Two-step verification is enabled"));
    assert!(h.observer.has_message(MessageLevel::Warning, "two-step verification password"));
    assert!(h.observer.has_message(MessageLevel::Info, "disable two-step verification"));
}

#[tokio::test]
async fn wrong_code_can_be_followed_by_right_code() {
    let wrong = CodeVerification {
        message: Some("Invalid code".into()),
        ..CodeVerification::default()
    };
    let h = suspended(
        ScriptedService::new()
            .with_publish(vec![Ok(RemoteOutcome::AuthRequired), success()])
            .with_verifications(vec![wrong, accepted(true)]),
    )
    .await;
    let captured = h.orchestrator.pending_request().unwrap();

    let first = h.orchestrator.submit_auth_code("11111").await.unwrap();
    assert_eq!(
        first,
        AuthResolution::Rejected {
            needs_two_factor: false
        }
    );

    let second = h.orchestrator.submit_auth_code("22222").await.unwrap();
    assert!(matches!(second, AuthResolution::Resumed(_)));
    assert_eq!(*h.service.verify_calls.lock().unwrap(), vec!["11111", "22222"]);
    assert_eq!(h.service.publish_requests(), vec![captured.clone(), captured]);
}

#[tokio::test]
async fn accepted_code_without_resume_releases_the_session() {
    let h = suspended(
        ScriptedService::new()
            .with_publish(vec![Ok(RemoteOutcome::AuthRequired), success()])
            .with_verifications(vec![accepted(false)]),
    )
    .await;

    let resolution = h.orchestrator.submit_auth_code("12345").await.unwrap();

    assert_eq!(resolution, AuthResolution::Verified);
    assert_eq!(h.orchestrator.state(), PublishState::Idle);
    assert!(h.orchestrator.pending_request().is_none());
    assert_eq!(h.service.publish_requests().len(), 1);
    assert!(h.orchestrator.approvals().is_fully_approved());

    // A fresh attempt is allowed once the session is released.
    let report = h.orchestrator.publish(StoryMode::None).await.unwrap();
    assert!(matches!(report, PublishReport::Published { .. }));
}

#[tokio::test]
async fn code_accepted_with_nothing_suspended_is_only_verified() {
    let h = Harness::new(ScriptedService::new().with_verifications(vec![accepted(true)]));

    let resolution = h.orchestrator.submit_auth_code("12345").await.unwrap();

    assert_eq!(resolution, AuthResolution::Verified);
    assert!(h.service.publish_requests().is_empty());
    assert_eq!(h.orchestrator.state(), PublishState::Idle);
}

#[tokio::test]
async fn reset_abandons_suspended_attempt() {
    let h = suspended(
        ScriptedService::new()
            .with_publish(vec![Ok(RemoteOutcome::AuthRequired)])
            .with_verifications(vec![accepted(true)]),
    )
    .await;

    h.orchestrator.reset_form().await.unwrap();

    assert_eq!(h.orchestrator.state(), PublishState::Idle);
    assert!(h.orchestrator.pending_request().is_none());
    assert!(h.orchestrator.artifact().is_none());
    assert_eq!(h.observer.count(&Event::AuthClosed), 1);

    // A late code no longer replays anything.
    let resolution = h.orchestrator.submit_auth_code("12345").await.unwrap();
    assert_eq!(resolution, AuthResolution::Verified);
    assert_eq!(h.service.publish_requests().len(), 1);
}

#[tokio::test]
async fn resumed_attempt_can_suspend_again() {
    let h = suspended(
        ScriptedService::new()
            .with_publish(vec![
                Ok(RemoteOutcome::AuthRequired),
                Ok(RemoteOutcome::AuthRequired),
            ])
            .with_verifications(vec![accepted(true)]),
    )
    .await;
    let captured = h.orchestrator.pending_request().unwrap();

    let resolution = h.orchestrator.submit_auth_code("12345").await.unwrap();

    assert_eq!(
        resolution,
        AuthResolution::Resumed(PublishReport::AwaitingAuth)
    );
    assert_eq!(h.orchestrator.state(), PublishState::AuthPending);
    assert_eq!(h.orchestrator.pending_request(), Some(captured));
    assert_eq!(h.observer.count(&Event::AuthRequested), 2);
}

#[tokio::test(start_paused = true)]
async fn resumed_publish_waits_for_the_default_settle_delay() {
    let settings = PublishConfig::default();
    assert_eq!(settings.resume_delay(), Duration::from_millis(1_000));
    let h = Harness::with(
        ScriptedService::new()
            .with_publish(vec![Ok(RemoteOutcome::AuthRequired), success()])
            .with_verifications(vec![accepted(true)]),
        ScriptedPrompter::default(),
        settings,
    );
    h.ready_to_publish().await;
    let report = h.orchestrator.publish(StoryMode::None).await.unwrap();
    assert_eq!(report, PublishReport::AwaitingAuth);

    let orchestrator = h.orchestrator.clone();
    let resume = tokio::spawn(async move { orchestrator.submit_auth_code("12345").await });

    tokio::time::sleep(Duration::from_millis(999)).await;
    assert_eq!(h.service.verify_count(), 1);
    assert_eq!(h.service.publish_requests().len(), 1);
    assert_eq!(h.orchestrator.state(), PublishState::AuthPending);

    tokio::time::sleep(Duration::from_millis(2)).await;
    let resolution = resume.await.unwrap().unwrap();

    assert!(matches!(
        resolution,
        AuthResolution::Resumed(PublishReport::Published { .. })
    ));
    let requests = h.service.publish_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], requests[1]);
}
