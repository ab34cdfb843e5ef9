use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use super::UiSurface;
use crate::config::BannerConfig;
use crate::metrics::BannerMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BannerId(pub u64);

impl fmt::Display for BannerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A transient alert on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    pub message: String,
    pub shown_at: DateTime<Utc>,
}

struct LiveBanner {
    id: BannerId,
    fade_at: Instant,
    remove_at: Instant,
    fading: bool,
}

impl LiveBanner {
    fn deadline(&self) -> Instant {
        if self.fading {
            self.remove_at
        } else {
            self.fade_at
        }
    }
}

/// Stack of transient banners, each with its own fade and removal deadline.
///
/// At most `max_visible` banners are kept (0 disables the cap); pushing past
/// the cap removes the oldest one immediately.
pub struct BannerBoard {
    display: Duration,
    fade: Duration,
    max_visible: usize,
    next_id: u64,
    live: VecDeque<LiveBanner>,
}

impl BannerBoard {
    pub fn new(config: &BannerConfig) -> Self {
        Self {
            display: config.display(),
            fade: config.fade(),
            max_visible: config.max_visible,
            next_id: 1,
            live: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn push(
        &mut self,
        now: Instant,
        title: &str,
        message: &str,
        surface: &mut impl UiSurface,
    ) -> BannerId {
        if self.max_visible > 0 {
            let mut evicted = 0;
            while self.live.len() >= self.max_visible {
                if let Some(oldest) = self.live.pop_front() {
                    surface.remove_banner(oldest.id);
                    evicted += 1;
                }
            }
            if evicted > 0 {
                BannerMetrics::record_evicted(evicted);
                tracing::debug!(evicted, "Banner cap reached, oldest removed");
            }
        }

        let id = BannerId(self.next_id);
        self.next_id += 1;

        let fade_at = now + self.display;
        self.live.push_back(LiveBanner {
            id,
            fade_at,
            remove_at: fade_at + self.fade,
            fading: false,
        });

        surface.show_banner(&Banner {
            id,
            title: title.to_string(),
            message: message.to_string(),
            shown_at: Utc::now(),
        });
        BannerMetrics::record_shown();

        id
    }

    /// Fade and remove whatever is due at `now`
    pub fn advance(&mut self, now: Instant, surface: &mut impl UiSurface) {
        for banner in self.live.iter_mut() {
            if !banner.fading && now >= banner.fade_at {
                banner.fading = true;
                surface.fade_banner(banner.id);
            }
        }

        self.live.retain(|banner| {
            if now >= banner.remove_at {
                surface.remove_banner(banner.id);
                false
            } else {
                true
            }
        });
    }

    /// Earliest pending fade or removal
    pub fn next_deadline(&self) -> Option<Instant> {
        self.live.iter().map(LiveBanner::deadline).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MemorySurface;

    fn board(max_visible: usize) -> BannerBoard {
        BannerBoard::new(&BannerConfig {
            display_secs: 5,
            fade_secs: 1,
            max_visible,
        })
    }

    #[test]
    fn test_banner_fades_then_is_removed() {
        let mut surface = MemorySurface::new();
        let mut board = board(5);
        let t0 = Instant::now();

        let id = board.push(t0, "New Material", "Slides", &mut surface);
        assert_eq!(board.next_deadline(), Some(t0 + Duration::from_secs(5)));

        board.advance(t0 + Duration::from_millis(4999), &mut surface);
        assert!(!surface.banner(id).unwrap().fading);

        board.advance(t0 + Duration::from_secs(5), &mut surface);
        assert!(surface.banner(id).unwrap().fading);
        assert_eq!(board.next_deadline(), Some(t0 + Duration::from_secs(6)));

        board.advance(t0 + Duration::from_secs(6), &mut surface);
        assert!(surface.banner(id).is_none());
        assert!(board.is_empty());
        assert_eq!(board.next_deadline(), None);
    }

    #[test]
    fn test_late_tick_fades_and_removes_together() {
        let mut surface = MemorySurface::new();
        let mut board = board(5);
        let t0 = Instant::now();

        let id = board.push(t0, "t", "m", &mut surface);
        board.advance(t0 + Duration::from_secs(30), &mut surface);

        assert!(surface.banner(id).is_none());
        assert_eq!(surface.faded_ids(), vec![id]);
    }

    #[test]
    fn test_banners_keep_independent_timers() {
        let mut surface = MemorySurface::new();
        let mut board = board(5);
        let t0 = Instant::now();

        let first = board.push(t0, "a", "1", &mut surface);
        let second = board.push(t0 + Duration::from_secs(3), "b", "2", &mut surface);

        board.advance(t0 + Duration::from_secs(6), &mut surface);
        assert!(surface.banner(first).is_none());
        assert!(!surface.banner(second).unwrap().fading);

        board.advance(t0 + Duration::from_secs(9), &mut surface);
        assert!(surface.banner(second).is_none());
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut surface = MemorySurface::new();
        let mut board = board(2);
        let t0 = Instant::now();

        let a = board.push(t0, "a", "1", &mut surface);
        let b = board.push(t0, "b", "2", &mut surface);
        let c = board.push(t0, "c", "3", &mut surface);

        assert_eq!(board.len(), 2);
        assert!(surface.banner(a).is_none());
        assert!(surface.banner(b).is_some());
        assert!(surface.banner(c).is_some());
    }

    #[test]
    fn test_zero_cap_is_unbounded() {
        let mut surface = MemorySurface::new();
        let mut board = board(0);
        let t0 = Instant::now();

        for i in 0..20 {
            board.push(t0, "burst", &i.to_string(), &mut surface);
        }
        assert_eq!(board.len(), 20);
        assert_eq!(surface.banners().len(), 20);
    }
}
