use crate::model::FieldPosition;

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 3.0;
pub const ZOOM_STEP: f32 = 1.2;

pub const MIN_ZOOM_PERCENT: u32 = 50;
pub const MAX_ZOOM_PERCENT: u32 = 200;

/// Zoom factor as a multiplier (1.0 = 100%), clamped to `[0.5, 3.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom(f32);

impl Default for Zoom {
    fn default() -> Self {
        Self(1.0)
    }
}

impl Zoom {
    pub fn level(self) -> f32 {
        self.0
    }

    pub fn zoom_in(&mut self) {
        self.0 = (self.0 * ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.0 = (self.0 / ZOOM_STEP).max(MIN_ZOOM);
    }

    /// Explicit percentage set from the zoom slider, clamped to `[50, 200]`.
    pub fn set_percent(&mut self, percent: u32) {
        let clamped = percent.clamp(MIN_ZOOM_PERCENT, MAX_ZOOM_PERCENT);
        self.0 = clamped as f32 / 100.0;
    }

    pub fn percent(self) -> u32 {
        (self.0 * 100.0).round() as u32
    }
}

/// On-screen pixel rectangle produced by the zoom transform.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// Top-left of the rendered page within the viewer viewport. Changes with
/// scroll and page navigation, so the transform is reapplied to every
/// visible field whenever it moves.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OverlayOrigin {
    pub x: f32,
    pub y: f32,
}

/// Pure unscaled-to-screen transform: each stored coordinate times the zoom
/// level, offset by the page origin.
pub fn screen_rect(position: &FieldPosition, zoom: Zoom, origin: OverlayOrigin) -> ScreenRect {
    ScreenRect {
        left: origin.x + position.x * zoom.level(),
        top: origin.y + position.y * zoom.level(),
        width: position.width * zoom.level(),
        height: position.height * zoom.level(),
    }
}

/// 0-based page cursor over a document with a known page count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    current: u32,
    total: u32,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new(1)
    }
}

impl PageCursor {
    pub fn new(total: u32) -> Self {
        Self {
            current: 0,
            total: total.max(1),
        }
    }

    pub fn current(self) -> u32 {
        self.current
    }

    pub fn total(self) -> u32 {
        self.total
    }

    pub fn next(&mut self) -> bool {
        if self.current + 1 < self.total {
            self.current += 1;
            true
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    pub fn at_first(self) -> bool {
        self.current == 0
    }

    pub fn at_last(self) -> bool {
        self.current + 1 == self.total
    }

    /// Human-facing 1-based label; storage stays 0-based.
    pub fn label(self) -> String {
        format!("Page {} of {}", self.current + 1, self.total)
    }
}
