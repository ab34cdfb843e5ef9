use std::io::{self, Write};

use super::{Banner, BannerId, BubbleStyle, ChatBubble, Indicator, UiSurface};

/// Line-oriented surface for running the client from a terminal
pub struct TerminalSurface<W: Write> {
    out: W,
}

impl TerminalSurface<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: std::fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.out, "{}", text) {
            tracing::warn!(error = %e, "Failed to write to terminal");
        }
    }
}

impl<W: Write> UiSurface for TerminalSurface<W> {
    fn set_indicator_visible(&mut self, indicator: Indicator, visible: bool) {
        let mark = if visible { "NEW" } else { "-" };
        self.line(format_args!("[{}] {}", indicator, mark));
    }

    fn show_banner(&mut self, banner: &Banner) {
        if banner.title.is_empty() {
            self.line(format_args!("[banner {}] {}", banner.id, banner.message));
        } else {
            self.line(format_args!(
                "[banner {}] {}: {}",
                banner.id, banner.title, banner.message
            ));
        }
    }

    fn fade_banner(&mut self, _id: BannerId) {}

    fn remove_banner(&mut self, id: BannerId) {
        self.line(format_args!("[banner {}] dismissed", id));
    }

    fn append_bubble(&mut self, bubble: &ChatBubble) {
        let lead = match bubble.style {
            BubbleStyle::Own => ">>",
            BubbleStyle::Other => "<<",
        };
        self.line(format_args!(
            "{} {} {}: {}",
            bubble.received_at.format("%H:%M:%S"),
            lead,
            bubble.label,
            bubble.body
        ));
    }

    fn scroll_transcript_to_end(&mut self) {
        let _ = self.out.flush();
    }

    fn clear_compose(&mut self) {}
}
