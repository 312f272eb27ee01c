//! End-to-end navigation scenarios against an in-memory transport

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use pantrybot::discord::Embed;
use pantrybot::slider::{
    Affordance, DispatchOutcome, InteractionAck, InteractionDispatcher, MessageId,
    NavigationEvent, Navigator, NavigatorRegistry, Page, SliderError, Transport, TransportError,
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Create {
        channel: String,
        title: String,
        affordance: Affordance,
    },
    Edit {
        message: String,
        title: String,
        affordance: Affordance,
    },
    Ack {
        interaction: String,
        title: String,
        affordance: Affordance,
    },
}

/// Transport that records every call and hands out sequential message ids
#[derive(Default)]
struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    fail_edits: bool,
}

impl RecordingTransport {
    async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }
}

fn title(page: &Page) -> String {
    page.title.clone().unwrap_or_default()
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn create_message(
        &self,
        channel_id: &str,
        page: &Page,
        affordance: Affordance,
    ) -> Result<MessageId, TransportError> {
        let mut calls = self.calls.lock().await;
        calls.push(Call::Create {
            channel: channel_id.to_string(),
            title: title(page),
            affordance,
        });
        Ok(format!("message-{}", calls.len()))
    }

    async fn edit_message(
        &self,
        _channel_id: &str,
        message_id: &str,
        page: &Page,
        affordance: Affordance,
    ) -> Result<(), TransportError> {
        self.calls.lock().await.push(Call::Edit {
            message: message_id.to_string(),
            title: title(page),
            affordance,
        });
        if self.fail_edits {
            return Err(TransportError::new("missing permissions"));
        }
        Ok(())
    }

    async fn acknowledge_update(
        &self,
        ack: &InteractionAck,
        _channel_id: &str,
        _message_id: &str,
        page: &Page,
        affordance: Affordance,
    ) -> Result<(), TransportError> {
        self.calls.lock().await.push(Call::Ack {
            interaction: ack.id.clone(),
            title: title(page),
            affordance,
        });
        Ok(())
    }
}

fn pages(n: usize) -> Vec<Page> {
    (0..n)
        .map(|i| Embed::new().title(format!("page {}", i)))
        .collect()
}

fn setup() -> (Arc<RecordingTransport>, Arc<NavigatorRegistry>, InteractionDispatcher) {
    let transport = Arc::new(RecordingTransport::default());
    let registry = Arc::new(NavigatorRegistry::new());
    let dispatcher = InteractionDispatcher::new(registry.clone(), transport.clone());
    (transport, registry, dispatcher)
}

const BOTH: Affordance = Affordance {
    retreat: true,
    advance: true,
};

#[tokio::test]
async fn test_three_page_walkthrough() {
    let (transport, registry, _) = setup();
    let navigator = Navigator::new(pages(3), "kitchen", Duration::ZERO).unwrap();
    navigator.send(transport.clone(), registry.clone()).await.unwrap();

    let first = navigator.render_current().await;
    assert_eq!(first.position, 0);
    assert_eq!(title(&first.page), "page 0");
    assert!(first.affordance.advance);
    assert!(!first.affordance.retreat);

    navigator.advance().await;
    let second = navigator.render_current().await;
    assert_eq!(title(&second.page), "page 1");
    assert_eq!(second.affordance, BOTH);

    navigator.advance().await;
    let third = navigator.render_current().await;
    assert_eq!(title(&third.page), "page 2");
    assert!(!third.affordance.advance);
    assert!(third.affordance.retreat);

    navigator.retreat().await;
    navigator.retreat().await;
    assert_eq!(navigator.position().await, 0);

    assert_eq!(
        transport.calls().await,
        vec![Call::Create {
            channel: "kitchen".to_string(),
            title: "page 0".to_string(),
            affordance: Affordance::for_position(0, 3),
        }]
    );
}

#[tokio::test]
async fn test_single_page_has_no_enabled_controls() {
    let (transport, registry, _) = setup();
    let navigator = Navigator::new(pages(1), "kitchen", Duration::ZERO).unwrap();
    navigator.send(transport.clone(), registry).await.unwrap();

    assert_eq!(navigator.advance().await, 0);
    assert_eq!(navigator.retreat().await, 0);
    match &transport.calls().await[0] {
        Call::Create { affordance, .. } => assert_eq!(*affordance, Affordance::DISABLED),
        other => panic!("unexpected call {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_page_set_registers_nothing() {
    let (transport, registry, _) = setup();
    let result = Navigator::new(Vec::new(), "kitchen", Duration::from_secs(1));
    assert!(matches!(result, Err(SliderError::EmptyPageSet)));
    assert!(registry.is_empty().await);
    assert!(transport.calls().await.is_empty());
}

#[tokio::test]
async fn test_dispatch_moves_and_updates_message() {
    let (transport, registry, dispatcher) = setup();
    let navigator = Navigator::new(pages(3), "kitchen", Duration::ZERO).unwrap();
    let id = navigator.send(transport.clone(), registry).await.unwrap();

    let outcome = dispatcher.dispatch(NavigationEvent::new(id.clone(), "next")).await;
    assert_eq!(outcome, DispatchOutcome::Updated { position: 1 });

    let ack = InteractionAck {
        id: "interaction-7".to_string(),
        token: "tok".to_string(),
    };
    let outcome = dispatcher
        .dispatch(NavigationEvent::new(id.clone(), "next").with_ack(ack))
        .await;
    assert_eq!(outcome, DispatchOutcome::Updated { position: 2 });

    // clicking past the end re-renders the same page
    let outcome = dispatcher.dispatch(NavigationEvent::new(id.clone(), "next")).await;
    assert_eq!(outcome, DispatchOutcome::Updated { position: 2 });

    let calls = transport.calls().await;
    assert_eq!(
        calls[1],
        Call::Edit {
            message: id.clone(),
            title: "page 1".to_string(),
            affordance: BOTH,
        }
    );
    assert_eq!(
        calls[2],
        Call::Ack {
            interaction: "interaction-7".to_string(),
            title: "page 2".to_string(),
            affordance: Affordance::for_position(2, 3),
        }
    );
    assert_eq!(calls.len(), 4);
}

#[tokio::test]
async fn test_unknown_session_is_dropped_silently() {
    let (transport, registry, dispatcher) = setup();
    let navigator = Navigator::new(pages(2), "kitchen", Duration::ZERO).unwrap();
    navigator.send(transport.clone(), registry).await.unwrap();

    let outcome = dispatcher
        .dispatch(NavigationEvent::new("never-registered", "next"))
        .await;
    assert_eq!(outcome, DispatchOutcome::Dropped);
    assert_eq!(navigator.position().await, 0);
    assert_eq!(transport.calls().await.len(), 1);
}

#[tokio::test]
async fn test_unknown_token_is_dropped() {
    let (transport, registry, dispatcher) = setup();
    let navigator = Navigator::new(pages(2), "kitchen", Duration::ZERO).unwrap();
    let id = navigator.send(transport.clone(), registry).await.unwrap();

    let outcome = dispatcher.dispatch(NavigationEvent::new(id, "prev")).await;
    assert_eq!(outcome, DispatchOutcome::Dropped);
    assert_eq!(navigator.position().await, 0);
}

#[tokio::test]
async fn test_failed_update_keeps_the_move() {
    let transport = Arc::new(RecordingTransport {
        fail_edits: true,
        ..Default::default()
    });
    let registry = Arc::new(NavigatorRegistry::new());
    let dispatcher = InteractionDispatcher::new(registry.clone(), transport.clone());
    let navigator = Navigator::new(pages(2), "kitchen", Duration::ZERO).unwrap();
    let id = navigator.send(transport.clone(), registry).await.unwrap();

    let outcome = dispatcher.dispatch(NavigationEvent::new(id, "next")).await;
    assert_eq!(outcome, DispatchOutcome::UpdateFailed { position: 1 });
    assert_eq!(navigator.position().await, 1);
    assert!(navigator.is_active());
}

#[tokio::test]
async fn test_disabled_navigator_ignores_clicks() {
    let (transport, registry, dispatcher) = setup();
    let navigator = Navigator::new(pages(3), "kitchen", Duration::ZERO).unwrap();
    let id = navigator.send(transport.clone(), registry.clone()).await.unwrap();
    dispatcher.dispatch(NavigationEvent::new(id.clone(), "next")).await;

    assert!(navigator.disable(transport.as_ref(), &registry).await);
    assert!(!navigator.disable(transport.as_ref(), &registry).await);

    let outcome = dispatcher.dispatch(NavigationEvent::new(id.clone(), "next")).await;
    assert_eq!(outcome, DispatchOutcome::Dropped);
    assert_eq!(navigator.position().await, 1);
    assert!(!navigator.is_active());

    // the final edit shows the current page with both controls off
    let calls = transport.calls().await;
    assert_eq!(
        calls.last(),
        Some(&Call::Edit {
            message: id,
            title: "page 1".to_string(),
            affordance: Affordance::DISABLED,
        })
    );
    assert_eq!(calls.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_clicks_racing_disable_never_reenable_controls() {
    let (transport, registry, dispatcher) = setup();
    let navigator = Navigator::new(pages(5), "kitchen", Duration::ZERO).unwrap();
    let id = navigator.send(transport.clone(), registry.clone()).await.unwrap();

    let mut clicks = Vec::new();
    for i in 0..16 {
        let dispatcher = dispatcher.clone();
        let token = if i % 3 == 0 { "previous" } else { "next" };
        let event = NavigationEvent::new(id.clone(), token);
        clicks.push(tokio::spawn(async move { dispatcher.dispatch(event).await }));
    }
    let mut disables = Vec::new();
    for _ in 0..3 {
        let navigator = navigator.clone();
        let transport = transport.clone();
        let registry = registry.clone();
        disables.push(tokio::spawn(async move {
            navigator.disable(transport.as_ref(), &registry).await
        }));
    }

    for click in clicks {
        let outcome = click.await.unwrap();
        assert!(
            matches!(outcome, DispatchOutcome::Updated { .. } | DispatchOutcome::Dropped),
            "unexpected outcome {:?}",
            outcome
        );
    }
    let mut winners = 0;
    for disable in disables {
        if disable.await.unwrap() {
            winners += 1;
        }
    }

    assert_eq!(winners, 1);
    assert!(!navigator.is_active());
    assert!(registry.is_empty().await);

    let calls = transport.calls().await;
    let disabled_edits = calls
        .iter()
        .filter(|call| matches!(call, Call::Edit { affordance, .. } if *affordance == Affordance::DISABLED))
        .count();
    assert_eq!(disabled_edits, 1);
    assert!(matches!(
        calls.last(),
        Some(Call::Edit { affordance, .. }) if *affordance == Affordance::DISABLED
    ));

    // clicks after the fact are dropped
    let late = dispatcher.dispatch(NavigationEvent::new(id, "next")).await;
    assert_eq!(late, DispatchOutcome::Dropped);
}

#[tokio::test(start_paused = true)]
async fn test_expiry_disables_and_deregisters() {
    let (transport, registry, dispatcher) = setup();
    let navigator = Navigator::new(pages(2), "kitchen", Duration::from_millis(50)).unwrap();
    let id = navigator.send(transport.clone(), registry.clone()).await.unwrap();
    assert!(registry.lookup(&id).await.is_some());

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(!navigator.is_active());
    assert!(registry.lookup(&id).await.is_none());
    let outcome = dispatcher.dispatch(NavigationEvent::new(id, "next")).await;
    assert_eq!(outcome, DispatchOutcome::Dropped);
}

#[tokio::test(start_paused = true)]
async fn test_expiry_after_manual_disable_is_harmless() {
    let (transport, registry, _) = setup();
    let navigator = Navigator::new(pages(2), "kitchen", Duration::from_millis(50)).unwrap();
    navigator.send(transport.clone(), registry.clone()).await.unwrap();

    assert!(navigator.disable(transport.as_ref(), &registry).await);
    tokio::time::sleep(Duration::from_millis(100)).await;

    // one create plus exactly one disabling edit
    assert_eq!(transport.calls().await.len(), 2);
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn test_navigators_are_independent() {
    let (transport, registry, dispatcher) = setup();
    let a = Navigator::new(pages(3), "kitchen", Duration::ZERO).unwrap();
    let b = Navigator::new(pages(3), "pantry", Duration::ZERO).unwrap();
    let id_a = a.send(transport.clone(), registry.clone()).await.unwrap();
    let id_b = b.send(transport.clone(), registry.clone()).await.unwrap();
    assert_ne!(id_a, id_b);
    assert_eq!(registry.len().await, 2);

    dispatcher.dispatch(NavigationEvent::new(id_a.clone(), "next")).await;
    dispatcher.dispatch(NavigationEvent::new(id_a, "next")).await;
    dispatcher.dispatch(NavigationEvent::new(id_b, "next")).await;

    assert_eq!(a.position().await, 2);
    assert_eq!(b.position().await, 1);
}
