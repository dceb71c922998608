use crate::fake_service::{
    Event, Harness, ScriptedPrompter, ScriptedService, success, test_settings,
};
use postgate::config::PublishConfig;
use postgate::error::{AmbiguityKind, RemoteError, WorkflowError};
use postgate::remote::RemoteOutcome;
use postgate::workflow::{
    Facet, MessageLevel, PublishReport, PublishState, RetryReason, StoryMode, TerminalKind,
};

#[tokio::test]
async fn accepted_timeout_retry_replays_identical_request() {
    let h = Harness::with(
        ScriptedService::new().with_publish(vec![Ok(RemoteOutcome::Timeout), success()]),
        ScriptedPrompter::answering(&[true]),
        test_settings(),
    );
    h.ready_to_publish().await;

    let report = h.orchestrator.publish(StoryMode::Personal).await.unwrap();

    assert!(matches!(report, PublishReport::Published { .. }));
    let requests = h.service.publish_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], requests[1]);
    assert_eq!(requests[1].story_mode, StoryMode::Personal);
    assert_eq!(h.prompter.asked(), vec![RetryReason::Timeout]);
}

#[tokio::test]
async fn network_error_retry_replays_identical_request() {
    let h = Harness::with(
        ScriptedService::new().with_publish(vec![
            Err(RemoteError::Network("connection reset".into())),
            success(),
        ]),
        ScriptedPrompter::answering(&[true]),
        test_settings(),
    );
    h.ready_to_publish().await;

    h.orchestrator.publish(StoryMode::Both).await.unwrap();

    let requests = h.service.publish_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], requests[1]);
    assert_eq!(
        h.prompter.asked(),
        vec![RetryReason::Network {
            message: "connection reset".into()
        }]
    );
    assert!(h.observer.has_message(MessageLevel::Danger, "connection reset"));
}

#[tokio::test]
async fn declined_network_retry_fails_but_keeps_approvals() {
    let h = Harness::with(
        ScriptedService::new()
            .with_publish(vec![Err(RemoteError::Network("unreachable".into()))]),
        ScriptedPrompter::answering(&[false]),
        test_settings(),
    );
    h.ready_to_publish().await;

    let err = h.orchestrator.publish(StoryMode::None).await.unwrap_err();

    assert!(matches!(err, WorkflowError::Network(ref m) if m == "unreachable"));
    assert_eq!(h.orchestrator.state(), PublishState::Idle);
    assert_eq!(h.orchestrator.last_terminal(), Some(TerminalKind::Failed));
    assert!(h.orchestrator.pending_request().is_none());
    assert!(h.orchestrator.approvals().is_fully_approved());
    assert_eq!(h.service.publish_requests().len(), 1);
}

#[tokio::test]
async fn unknown_status_is_ambiguous_and_keeps_content() {
    let h = Harness::new(
        ScriptedService::new().with_publish(vec![Ok(RemoteOutcome::UnknownStatus)]),
    );
    h.ready_to_publish().await;

    let err = h.orchestrator.publish(StoryMode::None).await.unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::AmbiguousOutcome(AmbiguityKind::UnknownStatus)
    ));
    assert_eq!(h.orchestrator.state(), PublishState::Idle);
    assert!(h.orchestrator.artifact().is_some());
    assert!(h.orchestrator.approvals().is_fully_approved());
    // Ambiguous outcomes are never retried on their own.
    assert!(h.prompter.asked().is_empty());
    assert_eq!(h.service.publish_requests().len(), 1);
}

#[tokio::test]
async fn plain_failure_returns_to_idle_without_auth_challenge() {
    let h = Harness::new(ScriptedService::new().with_publish(vec![Ok(
        RemoteOutcome::Failure {
            message: "Channel not found".into(),
        },
    )]));
    h.ready_to_publish().await;

    let err = h.orchestrator.publish(StoryMode::None).await.unwrap_err();

    assert!(matches!(err, WorkflowError::RemoteFailure(ref m) if m == "Channel not found"));
    assert_eq!(h.orchestrator.state(), PublishState::Idle);
    assert_eq!(h.orchestrator.last_terminal(), Some(TerminalKind::Failed));
    assert!(h.orchestrator.pending_request().is_none());
    assert_eq!(h.observer.count(&Event::AuthRequested), 0);
    assert!(h.observer.has_message(MessageLevel::Danger, "Channel not found"));
    assert!(h.orchestrator.approvals().is_fully_approved());
}

#[tokio::test]
async fn failure_mentioning_verification_suspends_for_code() {
    let h = Harness::new(ScriptedService::new().with_publish(vec![Ok(
        RemoteOutcome::Failure {
            message: "Требуется Авторизация в Telegram".into(),
        },
    )]));
    h.ready_to_publish().await;

    let report = h.orchestrator.publish(StoryMode::Channel).await.unwrap();

    assert_eq!(report, PublishReport::AwaitingAuth);
    assert_eq!(h.orchestrator.state(), PublishState::AuthPending);
    assert_eq!(h.observer.count(&Event::AuthRequested), 1);
    assert_eq!(
        h.orchestrator.pending_request().map(|r| r.story_mode),
        Some(StoryMode::Channel)
    );
}

#[tokio::test]
async fn partial_success_clears_by_default() {
    let h = Harness::new(ScriptedService::new().with_publish(vec![Ok(
        RemoteOutcome::PartialSuccess {
            warnings: vec!["Story upload failed".into()],
        },
    )]));
    h.ready_to_publish().await;

    let report = h.orchestrator.publish(StoryMode::Both).await.unwrap();

    assert_eq!(
        report,
        PublishReport::PartiallyPublished {
            warnings: vec!["Story upload failed".into()]
        }
    );
    assert_eq!(
        h.orchestrator.state(),
        PublishState::Terminal(TerminalKind::PartialSuccess)
    );
    assert!(h.orchestrator.artifact().is_none());
    assert!(h.observer.has_message(MessageLevel::Danger, "Story upload failed"));
}

#[tokio::test]
async fn partial_success_can_keep_the_session() {
    let settings = PublishConfig {
        clear_on_partial: false,
        ..test_settings()
    };
    let h = Harness::with(
        ScriptedService::new().with_publish(vec![Ok(RemoteOutcome::PartialSuccess {
            warnings: Vec::new(),
        })]),
        ScriptedPrompter::default(),
        settings,
    );
    h.ready_to_publish().await;

    h.orchestrator.publish(StoryMode::Both).await.unwrap();

    assert!(h.orchestrator.artifact().is_some());
    assert!(h.orchestrator.approvals().is_fully_approved());
    assert!(h.orchestrator.pending_request().is_none());
}

#[tokio::test]
async fn failed_session_can_publish_again_with_new_request() {
    let h = Harness::new(ScriptedService::new().with_publish(vec![
        Ok(RemoteOutcome::Failure {
            message: "flood wait".into(),
        }),
        success(),
    ]));
    h.ready_to_publish().await;

    assert!(h.orchestrator.publish(StoryMode::None).await.is_err());
    assert_eq!(h.orchestrator.last_terminal(), Some(TerminalKind::Failed));
    h.orchestrator.publish(StoryMode::Channel).await.unwrap();
    assert_eq!(h.orchestrator.last_terminal(), Some(TerminalKind::Success));

    let requests = h.service.publish_requests();
    assert_eq!(requests.len(), 2);
    assert_ne!(requests[0].attempt_id, requests[1].attempt_id);
    assert_eq!(requests[1].story_mode, StoryMode::Channel);
}

#[tokio::test]
async fn success_with_warnings_reports_them_and_clears_session() {
    let warnings = vec![
        "Personal story skipped".to_string(),
        "Channel story skipped".to_string(),
    ];
    let h = Harness::new(ScriptedService::new().with_publish(vec![Ok(
        RemoteOutcome::Success {
            details: vec!["Post published".into()],
            warnings: warnings.clone(),
        },
    )]));
    h.ready_to_publish().await;

    let report = h.orchestrator.publish(StoryMode::Both).await.unwrap();

    assert_eq!(
        report,
        PublishReport::Published {
            details: vec!["Post published".into()],
            warnings: warnings.clone(),
        }
    );
    for warning in &warnings {
        assert!(h.observer.has_message(MessageLevel::Warning, warning));
    }
    assert!(h.observer.has_message(MessageLevel::Success, "successfully"));
    assert_eq!(
        h.orchestrator.state(),
        PublishState::Terminal(TerminalKind::Success)
    );
    assert!(h.orchestrator.artifact().is_none());
    assert_eq!(h.orchestrator.approvals().missing(), Facet::ALL.to_vec());
    assert!(h.orchestrator.pending_request().is_none());
}
