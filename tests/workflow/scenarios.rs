use crate::fake_service::{
    Event, Harness, ScriptedPrompter, ScriptedService, accepted, success, test_settings,
};
use postgate::error::{AmbiguityKind, WorkflowError};
use postgate::remote::{FacetUpdate, RemoteOutcome};
use postgate::workflow::{
    AuthResolution, Facet, MessageLevel, PublishReport, PublishState, RetryReason, StoryMode,
    TerminalKind,
};

#[tokio::test]
async fn approved_post_publishes_and_clears_session() {
    let h = Harness::new(ScriptedService::new().with_publish(vec![success()]));
    h.ready_to_publish().await;
    assert_eq!(h.observer.count(&Event::PublishEnabled(true)), 1);

    let report = h.orchestrator.publish(StoryMode::None).await.unwrap();

    assert!(matches!(report, PublishReport::Published { .. }));
    assert_eq!(
        h.orchestrator.state(),
        PublishState::Terminal(TerminalKind::Success)
    );
    assert!(h.orchestrator.artifact().is_none());
    assert_eq!(h.orchestrator.approvals().missing(), Facet::ALL.to_vec());
    assert!(h.orchestrator.pending_request().is_none());
    assert_eq!(h.observer.count(&Event::PublishEnabled(false)), 1);
    assert!(h.observer.has_message(MessageLevel::Success, "successfully"));
    assert!(h.observer.has_message(MessageLevel::Info, "Post published"));

    let requests = h.service.publish_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].story_mode, StoryMode::None);
}

#[tokio::test]
async fn missing_approval_blocks_publish_without_remote_call() {
    let h = Harness::new(ScriptedService::new().with_publish(vec![success()]));
    h.orchestrator.generate("launch announcement").await.unwrap();
    h.orchestrator.approve(Facet::Text);
    h.orchestrator.approve(Facet::Image);

    let err = h.orchestrator.publish(StoryMode::None).await.unwrap_err();

    match err {
        WorkflowError::PreconditionNotMet { missing } => {
            assert_eq!(missing, vec![Facet::Headline]);
        }
        other => panic!("expected PreconditionNotMet, got {other:?}"),
    }
    assert!(h.service.publish_requests().is_empty());
    assert_eq!(h.orchestrator.state(), PublishState::Idle);
    assert!(h.orchestrator.pending_request().is_none());
    assert!(h.orchestrator.artifact().is_some());
}

#[tokio::test]
async fn verification_code_resumes_the_captured_request() {
    let service = ScriptedService::new()
        .with_publish(vec![Ok(RemoteOutcome::AuthRequired), success()])
        .with_verifications(vec![accepted(true)]);
    let h = Harness::new(service);
    h.ready_to_publish().await;

    let report = h.orchestrator.publish(StoryMode::Channel).await.unwrap();
    assert_eq!(report, PublishReport::AwaitingAuth);
    assert_eq!(h.orchestrator.state(), PublishState::AuthPending);
    assert_eq!(h.observer.count(&Event::AuthRequested), 1);
    let suspended = h.orchestrator.pending_request().unwrap();
    assert_eq!(suspended.story_mode, StoryMode::Channel);

    // The form cannot start a new attempt or edit content while suspended.
    assert!(matches!(
        h.orchestrator.publish(StoryMode::Both).await,
        Err(WorkflowError::PublishInFlight)
    ));
    assert!(matches!(
        h.orchestrator.regenerate(Facet::Text).await,
        Err(WorkflowError::PublishInFlight)
    ));
    assert!(h.service.regenerate_calls.lock().unwrap().is_empty());

    let resolution = h.orchestrator.submit_auth_code(" 12345 ").await.unwrap();

    assert!(matches!(
        resolution,
        AuthResolution::Resumed(PublishReport::Published { .. })
    ));
    assert_eq!(*h.service.verify_calls.lock().unwrap(), vec!["12345"]);
    let requests = h.service.publish_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], suspended);
    assert_eq!(requests[1], suspended);
    assert_eq!(h.observer.count(&Event::AuthClosed), 1);
    assert_eq!(
        h.orchestrator.state(),
        PublishState::Terminal(TerminalKind::Success)
    );
    assert!(h.orchestrator.artifact().is_none());
}

#[tokio::test]
async fn declined_timeout_keeps_content_and_approvals() {
    let h = Harness::with(
        ScriptedService::new().with_publish(vec![Ok(RemoteOutcome::Timeout)]),
        ScriptedPrompter::answering(&[false]),
        test_settings(),
    );
    h.ready_to_publish().await;

    let err = h.orchestrator.publish(StoryMode::None).await.unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::AmbiguousOutcome(AmbiguityKind::Timeout)
    ));
    assert_eq!(h.prompter.asked(), vec![RetryReason::Timeout]);
    assert_eq!(h.orchestrator.state(), PublishState::Idle);
    assert!(h.orchestrator.pending_request().is_none());
    assert!(h.orchestrator.artifact().is_some());
    assert!(h.orchestrator.approvals().is_fully_approved());
    assert!(h.observer.has_message(MessageLevel::Warning, "timed out"));
    assert_eq!(h.service.publish_requests().len(), 1);
}

#[tokio::test]
async fn headline_regeneration_replaces_image_but_revokes_only_headline() {
    let service = ScriptedService::new().with_regenerations(vec![Ok(FacetUpdate::Headline {
        headline: "H2".into(),
        image: "I2".into(),
    })]);
    let h = Harness::new(service);
    h.ready_to_publish().await;

    let artifact = h.orchestrator.regenerate(Facet::Headline).await.unwrap();

    assert_eq!(artifact.headline, "H2");
    assert_eq!(artifact.image, "I2");
    assert_eq!(artifact.text, "T1");
    let approvals = h.orchestrator.approvals();
    assert!(approvals.is_approved(Facet::Text));
    assert!(approvals.is_approved(Facet::Image));
    assert!(!approvals.is_approved(Facet::Headline));
    assert_eq!(approvals.missing(), vec![Facet::Headline]);

    let events = h.observer.events();
    assert!(events.contains(&Event::Content(Facet::Headline, "H2".into())));
    assert!(events.contains(&Event::Content(Facet::Image, "I2".into())));
    assert!(events.contains(&Event::Approval(Facet::Headline, false)));
    let last_image_approval = events
        .iter()
        .rev()
        .find(|e| matches!(e, Event::Approval(Facet::Image, _)));
    assert_eq!(last_image_approval, Some(&Event::Approval(Facet::Image, true)));
    assert_eq!(
        events.last(),
        Some(&Event::Message(
            MessageLevel::Success,
            "Headline updated.".into()
        ))
    );
}
