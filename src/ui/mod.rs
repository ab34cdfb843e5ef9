//! UI side effects of the real-time layer.
//!
//! The session never renders anything itself. Every visible change goes
//! through a [`UiSurface`], and [`Ui`] keeps the bookkeeping the surface
//! should not have to: indicator flags and banner timers.

mod banner;
mod indicator;
mod memory;
mod terminal;

pub use banner::{Banner, BannerBoard, BannerId};
pub use indicator::{Indicator, Indicators};
pub use memory::{BannerRecord, MemorySurface};
pub use terminal::TerminalSurface;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::config::BannerConfig;

/// Visual variant of a chat bubble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleStyle {
    /// Posted by the session's own user
    Own,
    Other,
}

/// One rendered lobby post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatBubble {
    pub sender: String,
    /// e.g. `alice (Teacher) says`
    pub label: String,
    pub body: String,
    pub style: BubbleStyle,
    pub received_at: DateTime<Utc>,
}

/// Where the real-time layer's output lands
pub trait UiSurface {
    fn set_indicator_visible(&mut self, indicator: Indicator, visible: bool);

    fn show_banner(&mut self, banner: &Banner);

    /// Start the fade-out of a banner that is still on screen
    fn fade_banner(&mut self, id: BannerId);

    fn remove_banner(&mut self, id: BannerId);

    fn append_bubble(&mut self, bubble: &ChatBubble);

    fn scroll_transcript_to_end(&mut self);

    fn clear_compose(&mut self);
}

/// Surface plus the state the real-time layer keeps about it
pub struct Ui<S: UiSurface> {
    surface: S,
    indicators: Indicators,
    banners: BannerBoard,
}

impl<S: UiSurface> Ui<S> {
    /// Both indicators start hidden
    pub fn new(surface: S, banners: &BannerConfig) -> Self {
        Self::with_indicators(surface, banners, Indicators::default())
    }

    /// Start from indicator state left over from a previous render
    pub fn with_indicators(surface: S, banners: &BannerConfig, indicators: Indicators) -> Self {
        Self {
            surface,
            indicators,
            banners: BannerBoard::new(banners),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn is_visible(&self, indicator: Indicator) -> bool {
        self.indicators.is_visible(indicator)
    }

    pub fn reveal(&mut self, indicator: Indicator) {
        self.indicators.reveal(indicator, &mut self.surface);
    }

    pub fn hide(&mut self, indicator: Indicator) {
        self.indicators.hide(indicator, &mut self.surface);
    }

    pub fn show_alert(&mut self, now: Instant, title: &str, message: &str) -> BannerId {
        self.banners.push(now, title, message, &mut self.surface)
    }

    /// Run banner timers that are due at `now`
    pub fn advance(&mut self, now: Instant) {
        self.banners.advance(now, &mut self.surface);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.banners.next_deadline()
    }

    pub fn banner_count(&self) -> usize {
        self.banners.len()
    }

    /// Append a bubble and keep the latest content in view
    pub fn append_bubble(&mut self, bubble: &ChatBubble) {
        self.surface.append_bubble(bubble);
        self.surface.scroll_transcript_to_end();
    }

    pub fn clear_compose(&mut self) {
        self.surface.clear_compose();
    }
}
