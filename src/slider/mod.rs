//! Paginated response navigator
//!
//! A [`Navigator`] owns a fixed set of pages and a cursor, sends the first page
//! as a message with Previous/Next buttons, and registers itself in the
//! [`NavigatorRegistry`] under that message's id. Button clicks are routed
//! through the [`InteractionDispatcher`]; an expiry timer eventually disables
//! the navigator and removes it from the registry.

pub mod dispatcher;
pub mod navigator;
pub mod page;
pub mod registry;
pub mod transport;

pub use dispatcher::{DispatchOutcome, Direction, InteractionDispatcher, NavigationEvent};
pub use navigator::Navigator;
pub use page::{Affordance, Page, RenderedPage};
pub use registry::NavigatorRegistry;
pub use transport::{ChannelId, InteractionAck, MessageId, Transport, TransportError};

/// Error types for navigator operations
#[derive(Debug, thiserror::Error)]
pub enum SliderError {
    #[error("page set cannot be empty")]
    EmptyPageSet,
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("navigator was already sent as message {0}")]
    AlreadySent(MessageId),
    #[error("navigator was disabled before it was sent")]
    Disabled,
}
