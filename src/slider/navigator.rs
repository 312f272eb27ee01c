//! Navigator session controlling one paginated message

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::SliderError;
use super::dispatcher::Direction;
use super::page::{Affordance, Page, RenderedPage};
use super::registry::NavigatorRegistry;
use super::transport::{ChannelId, InteractionAck, MessageId, Transport, TransportError};

/// Mutable cursor state, guarded by the navigator's mutex
#[derive(Debug)]
struct NavigatorState {
    position: usize,
    message_id: Option<MessageId>,
}

/// Owns an ordered page set and the cursor over it.
///
/// `active` flips from true to false exactly once; after that every move is a
/// no-op.
pub struct Navigator {
    pages: Vec<Page>,
    channel_id: ChannelId,
    expiry: Duration,
    active: AtomicBool,
    state: Mutex<NavigatorState>,
}

impl std::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("pages", &self.pages.len())
            .field("channel_id", &self.channel_id)
            .field("expiry", &self.expiry)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Navigator {
    /// Create a navigator positioned on the first page.
    ///
    /// An `expiry` of zero means the navigator never disables itself.
    pub fn new(
        pages: Vec<Page>,
        channel_id: impl Into<ChannelId>,
        expiry: Duration,
    ) -> Result<Arc<Self>, SliderError> {
        if pages.is_empty() {
            return Err(SliderError::EmptyPageSet);
        }

        Ok(Arc::new(Self {
            pages,
            channel_id: channel_id.into(),
            expiry,
            active: AtomicBool::new(true),
            state: Mutex::new(NavigatorState {
                position: 0,
                message_id: None,
            }),
        }))
    }

    /// Send the current page, register under the new message id and arm the expiry timer.
    ///
    /// On transport failure nothing is registered and no timer is scheduled.
    /// Registration happens under the state lock, so a concurrent `disable`
    /// always sees the message id and removes the entry afterwards.
    pub async fn send(
        self: &Arc<Self>,
        transport: Arc<dyn Transport>,
        registry: Arc<NavigatorRegistry>,
    ) -> Result<MessageId, SliderError> {
        let mut state = self.state.lock().await;
        if let Some(message_id) = &state.message_id {
            return Err(SliderError::AlreadySent(message_id.clone()));
        }
        if !self.is_active() {
            return Err(SliderError::Disabled);
        }

        let rendered = RenderedPage::at(&self.pages, state.position);
        let message_id = transport
            .create_message(&self.channel_id, &rendered.page, rendered.affordance)
            .await?;
        state.message_id = Some(message_id.clone());
        registry.register(message_id.clone(), Arc::clone(self)).await;
        drop(state);

        metrics::increment_counter!("slider_navigators_sent");
        info!(
            "Sent navigator with {} pages as message {} in channel {}",
            self.pages.len(),
            message_id,
            self.channel_id
        );

        if !self.expiry.is_zero() {
            self.schedule_expiry(transport, registry);
        }

        Ok(message_id)
    }

    /// One-shot timer that disables the navigator. Never cancelled; holds only a
    /// weak reference so a released navigator is simply skipped.
    fn schedule_expiry(
        self: &Arc<Self>,
        transport: Arc<dyn Transport>,
        registry: Arc<NavigatorRegistry>,
    ) {
        let navigator = Arc::downgrade(self);
        let expiry = self.expiry;

        tokio::spawn(async move {
            tokio::time::sleep(expiry).await;
            match navigator.upgrade() {
                Some(navigator) => {
                    debug!("Navigator expiry of {:?} elapsed", expiry);
                    navigator.disable(transport.as_ref(), &registry).await;
                }
                None => debug!("Navigator released before its expiry fired"),
            }
        });
    }

    /// Move one page forward unless inactive or already on the last page
    pub async fn advance(&self) -> usize {
        self.step(Direction::Next).await
    }

    /// Move one page back unless inactive or already on the first page
    pub async fn retreat(&self) -> usize {
        self.step(Direction::Previous).await
    }

    async fn step(&self, direction: Direction) -> usize {
        let mut state = self.state.lock().await;
        Self::apply(&mut state, direction, self.pages.len(), self.is_active());
        state.position
    }

    /// Apply a move and push the result to the message.
    ///
    /// The state lock is held across the remote update, so updates reach the
    /// message in order and the disabled edit from `disable` always lands last.
    /// Returns `None` once the navigator is inactive.
    pub async fn navigate_remote(
        &self,
        direction: Direction,
        transport: &dyn Transport,
        message_id: &str,
        ack: Option<&InteractionAck>,
    ) -> Option<(RenderedPage, Result<(), TransportError>)> {
        let mut state = self.state.lock().await;
        if !self.is_active() {
            return None;
        }
        Self::apply(&mut state, direction, self.pages.len(), true);
        let rendered = RenderedPage::at(&self.pages, state.position);

        let result = match ack {
            Some(ack) => {
                transport
                    .acknowledge_update(
                        ack,
                        &self.channel_id,
                        message_id,
                        &rendered.page,
                        rendered.affordance,
                    )
                    .await
            }
            None => {
                transport
                    .edit_message(&self.channel_id, message_id, &rendered.page, rendered.affordance)
                    .await
            }
        };
        Some((rendered, result))
    }

    fn apply(state: &mut NavigatorState, direction: Direction, len: usize, active: bool) {
        if !active {
            return;
        }
        match direction {
            Direction::Previous if state.position > 0 => state.position -= 1,
            Direction::Next if state.position + 1 < len => state.position += 1,
            _ => {}
        }
    }

    pub async fn render_current(&self) -> RenderedPage {
        let state = self.state.lock().await;
        RenderedPage::at(&self.pages, state.position)
    }

    /// Deactivate, grey out the controls and deregister.
    ///
    /// Only the first call does anything and returns `true`. A failed edit is
    /// logged; the navigator is deregistered regardless.
    pub async fn disable(&self, transport: &dyn Transport, registry: &NavigatorRegistry) -> bool {
        if self
            .active
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Navigator already disabled");
            return false;
        }

        let (message_id, rendered) = {
            let state = self.state.lock().await;
            (
                state.message_id.clone(),
                RenderedPage::at(&self.pages, state.position),
            )
        };

        // Never sent, so there is neither a remote message nor a registry entry
        let Some(message_id) = message_id else {
            return true;
        };

        if let Err(e) = transport
            .edit_message(&self.channel_id, &message_id, &rendered.page, Affordance::DISABLED)
            .await
        {
            warn!("Failed to disable controls on message {}: {}", message_id, e);
        }

        registry.remove(&message_id).await;
        metrics::increment_counter!("slider_navigators_disabled");
        info!("Navigator for message {} disabled", message_id);
        true
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub async fn position(&self) -> usize {
        self.state.lock().await.position
    }

    pub async fn message_id(&self) -> Option<MessageId> {
        self.state.lock().await.message_id.clone()
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discord::types::Embed;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct CountingTransport {
        created: AtomicUsize,
        edits: AtomicUsize,
        fail_create: bool,
        fail_edit: bool,
    }

    #[async_trait]
    impl Transport for CountingTransport {
        async fn create_message(
            &self,
            _channel_id: &str,
            _page: &Page,
            _affordance: Affordance,
        ) -> Result<MessageId, TransportError> {
            if self.fail_create {
                return Err(TransportError::new("channel unavailable"));
            }
            let n = self.created.fetch_add(1, Ordering::SeqCst);
            Ok(format!("msg-{}", n))
        }

        async fn edit_message(
            &self,
            _channel_id: &str,
            _message_id: &str,
            _page: &Page,
            _affordance: Affordance,
        ) -> Result<(), TransportError> {
            self.edits.fetch_add(1, Ordering::SeqCst);
            if self.fail_edit {
                return Err(TransportError::new("unknown message"));
            }
            Ok(())
        }
    }

    fn pages(n: usize) -> Vec<Page> {
        (0..n).map(|i| Embed::new().title(format!("page {}", i))).collect()
    }

    #[test]
    fn empty_page_set_is_rejected() {
        let result = Navigator::new(Vec::new(), "c", Duration::ZERO);
        assert!(matches!(result, Err(SliderError::EmptyPageSet)));
    }

    #[tokio::test]
    async fn fresh_navigator_starts_on_first_page() {
        for n in 1..5 {
            let navigator = Navigator::new(pages(n), "c", Duration::ZERO).unwrap();
            let rendered = navigator.render_current().await;
            assert_eq!(rendered.position, 0);
            assert!(!rendered.affordance.retreat);
            assert_eq!(rendered.affordance.advance, n > 1);
        }
    }

    #[tokio::test]
    async fn moves_stop_at_boundaries() {
        let navigator = Navigator::new(pages(2), "c", Duration::ZERO).unwrap();
        assert_eq!(navigator.retreat().await, 0);
        assert_eq!(navigator.advance().await, 1);
        assert_eq!(navigator.advance().await, 1);
        assert_eq!(navigator.retreat().await, 0);
    }

    #[tokio::test]
    async fn failed_send_registers_nothing() {
        let transport = Arc::new(CountingTransport {
            fail_create: true,
            ..Default::default()
        });
        let registry = Arc::new(NavigatorRegistry::new());
        let navigator = Navigator::new(pages(2), "c", Duration::from_millis(5)).unwrap();

        let result = navigator.send(transport, registry.clone()).await;
        assert!(matches!(result, Err(SliderError::Transport(_))));
        assert!(registry.is_empty().await);
        assert!(navigator.message_id().await.is_none());
    }

    #[tokio::test]
    async fn second_send_is_rejected() {
        let transport = Arc::new(CountingTransport::default());
        let registry = Arc::new(NavigatorRegistry::new());
        let navigator = Navigator::new(pages(2), "c", Duration::ZERO).unwrap();

        let id = navigator.send(transport.clone(), registry.clone()).await.unwrap();
        let again = navigator.send(transport.clone(), registry.clone()).await;
        assert!(matches!(again, Err(SliderError::AlreadySent(ref existing)) if *existing == id));
        assert_eq!(transport.created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn disable_freezes_position() {
        let transport = Arc::new(CountingTransport::default());
        let registry = Arc::new(NavigatorRegistry::new());
        let navigator = Navigator::new(pages(3), "c", Duration::ZERO).unwrap();
        navigator.send(transport.clone(), registry.clone()).await.unwrap();
        navigator.advance().await;

        assert!(navigator.disable(transport.as_ref(), &registry).await);
        assert_eq!(navigator.advance().await, 1);
        assert_eq!(navigator.retreat().await, 1);
        assert!(!navigator.is_active());
        let moved = navigator
            .navigate_remote(Direction::Next, transport.as_ref(), "msg-0", None)
            .await;
        assert!(moved.is_none());
    }

    #[tokio::test]
    async fn disable_deregisters_even_when_edit_fails() {
        let transport = Arc::new(CountingTransport {
            fail_edit: true,
            ..Default::default()
        });
        let registry = Arc::new(NavigatorRegistry::new());
        let navigator = Navigator::new(pages(2), "c", Duration::ZERO).unwrap();
        let id = navigator.send(transport.clone(), registry.clone()).await.unwrap();

        assert!(navigator.disable(transport.as_ref(), &registry).await);
        assert!(registry.lookup(&id).await.is_none());
        assert!(!navigator.is_active());
    }

    #[tokio::test]
    async fn concurrent_disable_happens_once() {
        let transport = Arc::new(CountingTransport::default());
        let registry = Arc::new(NavigatorRegistry::new());
        let navigator = Navigator::new(pages(2), "c", Duration::ZERO).unwrap();
        navigator.send(transport.clone(), registry.clone()).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let navigator = navigator.clone();
            let transport = transport.clone();
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                navigator.disable(transport.as_ref(), &registry).await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(transport.edits.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty().await);
    }

    /// Holds `create_message` open until released
    #[derive(Default)]
    struct GatedTransport {
        started: Notify,
        release: Notify,
        edits: AtomicUsize,
    }

    #[async_trait]
    impl Transport for GatedTransport {
        async fn create_message(
            &self,
            _channel_id: &str,
            _page: &Page,
            _affordance: Affordance,
        ) -> Result<MessageId, TransportError> {
            self.started.notify_one();
            self.release.notified().await;
            Ok("msg-gated".to_string())
        }

        async fn edit_message(
            &self,
            _channel_id: &str,
            _message_id: &str,
            _page: &Page,
            affordance: Affordance,
        ) -> Result<(), TransportError> {
            assert_eq!(affordance, Affordance::DISABLED);
            self.edits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn disable_during_send_leaves_nothing_registered() {
        let transport = Arc::new(GatedTransport::default());
        let registry = Arc::new(NavigatorRegistry::new());
        let navigator = Navigator::new(pages(2), "c", Duration::ZERO).unwrap();

        let send = tokio::spawn({
            let navigator = navigator.clone();
            let transport: Arc<dyn Transport> = transport.clone();
            let registry = registry.clone();
            async move { navigator.send(transport, registry).await }
        });
        transport.started.notified().await;

        let disable = tokio::spawn({
            let navigator = navigator.clone();
            let transport = transport.clone();
            let registry = registry.clone();
            async move { navigator.disable(transport.as_ref(), &registry).await }
        });
        while navigator.is_active() {
            tokio::task::yield_now().await;
        }
        transport.release.notify_one();

        let id = send.await.unwrap().unwrap();
        assert!(disable.await.unwrap());
        assert!(registry.lookup(&id).await.is_none());
        assert!(registry.is_empty().await);
        assert_eq!(transport.edits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn disabled_navigator_cannot_be_sent() {
        let transport = Arc::new(CountingTransport::default());
        let registry = Arc::new(NavigatorRegistry::new());
        let navigator = Navigator::new(pages(2), "c", Duration::ZERO).unwrap();
        assert!(navigator.disable(transport.as_ref(), &registry).await);

        let result = navigator.send(transport.clone(), registry.clone()).await;
        assert!(matches!(result, Err(SliderError::Disabled)));
        assert_eq!(transport.created.load(Ordering::SeqCst), 0);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn disabling_unsent_navigator_touches_nothing() {
        let transport = CountingTransport::default();
        let registry = NavigatorRegistry::new();
        let navigator = Navigator::new(pages(1), "c", Duration::ZERO).unwrap();

        assert!(navigator.disable(&transport, &registry).await);
        assert_eq!(transport.edits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_timer_disables_and_deregisters() {
        let transport = Arc::new(CountingTransport::default());
        let registry = Arc::new(NavigatorRegistry::new());
        let navigator = Navigator::new(pages(2), "c", Duration::from_secs(300)).unwrap();
        let id = navigator.send(transport.clone(), registry.clone()).await.unwrap();

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert!(navigator.is_active());

        tokio::time::sleep(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert!(!navigator.is_active());
        assert!(registry.lookup(&id).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_expiry_never_fires() {
        let transport = Arc::new(CountingTransport::default());
        let registry = Arc::new(NavigatorRegistry::new());
        let navigator = Navigator::new(pages(2), "c", Duration::ZERO).unwrap();
        let id = navigator.send(transport.clone(), registry.clone()).await.unwrap();

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(navigator.is_active());
        assert!(registry.lookup(&id).await.is_some());
    }
}
