use super::{Banner, BannerId, ChatBubble, Indicator, UiSurface};

/// What a banner looks like on a [`MemorySurface`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerRecord {
    pub id: BannerId,
    pub title: String,
    pub message: String,
    pub fading: bool,
}

/// Headless surface that keeps the rendered state in memory
#[derive(Debug, Default)]
pub struct MemorySurface {
    chat_indicator: bool,
    notifications_indicator: bool,
    indicator_writes: usize,
    banners: Vec<BannerRecord>,
    faded: Vec<BannerId>,
    shown: usize,
    transcript: Vec<ChatBubble>,
    scrolled_to: usize,
    compose_clears: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indicator(&self, indicator: Indicator) -> bool {
        match indicator {
            Indicator::Chat => self.chat_indicator,
            Indicator::Notifications => self.notifications_indicator,
        }
    }

    /// Number of times any indicator was flipped
    pub fn indicator_writes(&self) -> usize {
        self.indicator_writes
    }

    /// Banners currently on screen, oldest first
    pub fn banners(&self) -> &[BannerRecord] {
        &self.banners
    }

    pub fn banner(&self, id: BannerId) -> Option<&BannerRecord> {
        self.banners.iter().find(|b| b.id == id)
    }

    /// Banners that started fading, in order
    pub fn faded_ids(&self) -> Vec<BannerId> {
        self.faded.clone()
    }

    /// Banners ever shown
    pub fn banners_shown(&self) -> usize {
        self.shown
    }

    pub fn transcript(&self) -> &[ChatBubble] {
        &self.transcript
    }

    /// True when the last scroll happened after the last append
    pub fn scrolled_to_end(&self) -> bool {
        self.scrolled_to == self.transcript.len()
    }

    pub fn compose_clears(&self) -> usize {
        self.compose_clears
    }
}

impl UiSurface for MemorySurface {
    fn set_indicator_visible(&mut self, indicator: Indicator, visible: bool) {
        match indicator {
            Indicator::Chat => self.chat_indicator = visible,
            Indicator::Notifications => self.notifications_indicator = visible,
        }
        self.indicator_writes += 1;
    }

    fn show_banner(&mut self, banner: &Banner) {
        self.shown += 1;
        self.banners.push(BannerRecord {
            id: banner.id,
            title: banner.title.clone(),
            message: banner.message.clone(),
            fading: false,
        });
    }

    fn fade_banner(&mut self, id: BannerId) {
        if let Some(banner) = self.banners.iter_mut().find(|b| b.id == id) {
            banner.fading = true;
            self.faded.push(id);
        }
    }

    fn remove_banner(&mut self, id: BannerId) {
        self.banners.retain(|b| b.id != id);
    }

    fn append_bubble(&mut self, bubble: &ChatBubble) {
        self.transcript.push(bubble.clone());
    }

    fn scroll_transcript_to_end(&mut self) {
        self.scrolled_to = self.transcript.len();
    }

    fn clear_compose(&mut self) {
        self.compose_clears += 1;
    }
}
