use std::fmt;

use super::UiSurface;

/// The two "something new" markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    /// Unseen lobby activity
    Chat,
    /// Unseen notifications
    Notifications,
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indicator::Chat => f.write_str("chat"),
            Indicator::Notifications => f.write_str("notifications"),
        }
    }
}

/// Visibility flags. Both operations are idempotent and only touch the
/// surface when a flag actually flips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Indicators {
    chat: bool,
    notifications: bool,
}

impl Indicators {
    pub fn new(chat: bool, notifications: bool) -> Self {
        Self { chat, notifications }
    }

    pub fn is_visible(&self, indicator: Indicator) -> bool {
        match indicator {
            Indicator::Chat => self.chat,
            Indicator::Notifications => self.notifications,
        }
    }

    pub fn reveal(&mut self, indicator: Indicator, surface: &mut impl UiSurface) {
        self.set(indicator, true, surface);
    }

    pub fn hide(&mut self, indicator: Indicator, surface: &mut impl UiSurface) {
        self.set(indicator, false, surface);
    }

    fn set(&mut self, indicator: Indicator, visible: bool, surface: &mut impl UiSurface) {
        let flag = match indicator {
            Indicator::Chat => &mut self.chat,
            Indicator::Notifications => &mut self.notifications,
        };
        if *flag == visible {
            return;
        }
        *flag = visible;
        surface.set_indicator_visible(indicator, visible);
        tracing::debug!(indicator = %indicator, visible, "Indicator changed");
    }
}
