//! Pages and navigation affordances

use crate::discord::types::Embed;

/// One unit of paginated content. Immutable once handed to a navigator.
pub type Page = Embed;

/// Whether the Previous/Next controls are usable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affordance {
    pub retreat: bool,
    pub advance: bool,
}

impl Affordance {
    /// Both directions unusable, shown once a navigator is disabled
    pub const DISABLED: Self = Self {
        retreat: false,
        advance: false,
    };

    /// Affordances for a cursor at `position` within `len` pages
    pub fn for_position(position: usize, len: usize) -> Self {
        Self {
            retreat: position > 0,
            advance: position + 1 < len,
        }
    }
}

/// Current page together with its navigation state
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub position: usize,
    pub total: usize,
    pub page: Page,
    pub affordance: Affordance,
}

impl RenderedPage {
    pub(crate) fn at(pages: &[Page], position: usize) -> Self {
        Self {
            position,
            total: pages.len(),
            page: pages[position].clone(),
            affordance: Affordance::for_position(position, pages.len()),
        }
    }
}
