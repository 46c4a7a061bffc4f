//! Page navigation and zoom state.

use serde::{Deserialize, Serialize};

/// Smallest allowed zoom level.
pub const MIN_ZOOM: f64 = 0.25;
/// Largest allowed zoom level.
pub const MAX_ZOOM: f64 = 3.0;
/// Zoom increment used by the zoom in/out controls.
pub const DEFAULT_ZOOM_STEP: f64 = 0.25;

/// Current page and zoom level of a viewer.
///
/// The page is always within `[1, total_pages]` and the zoom always within
/// [`MIN_ZOOM`, `MAX_ZOOM`]. Invalid requests are clamped or ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    current_page: u32,
    total_pages: u32,
    zoom: f64,
}

impl ViewportState {
    /// Create a viewport on page 1 at 100% zoom.
    pub fn new(total_pages: u32) -> Self {
        Self {
            current_page: 1,
            total_pages: total_pages.max(1),
            zoom: 1.0,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Whether `page` is a valid 1-based page number.
    pub fn contains_page(&self, page: u32) -> bool {
        (1..=self.total_pages).contains(&page)
    }

    /// Move to `page`. Out-of-range pages are ignored.
    pub fn set_current_page(&mut self, page: u32) -> bool {
        if !self.contains_page(page) || page == self.current_page {
            return false;
        }
        self.current_page = page;
        true
    }

    /// The page after the current one, if any.
    pub fn next_page(&self) -> Option<u32> {
        (self.current_page < self.total_pages).then(|| self.current_page + 1)
    }

    /// The page before the current one, if any.
    pub fn prev_page(&self) -> Option<u32> {
        (self.current_page > 1).then(|| self.current_page - 1)
    }

    /// Parse user-typed page input. Returns `None` for anything that is not
    /// a page number in range.
    pub fn parse_page_input(&self, input: &str) -> Option<u32> {
        input
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|page| self.contains_page(*page))
    }

    /// Set the zoom level, clamped to the allowed range.
    ///
    /// Non-finite input is ignored. Returns true if the zoom changed.
    pub fn set_zoom(&mut self, level: f64) -> bool {
        if !level.is_finite() {
            return false;
        }
        let level = level.clamp(MIN_ZOOM, MAX_ZOOM);
        if (level - self.zoom).abs() < f64::EPSILON {
            return false;
        }
        self.zoom = level;
        true
    }

    /// Adjust the zoom by `delta`, clamped to the allowed range.
    pub fn zoom_by(&mut self, delta: f64) -> bool {
        self.set_zoom(self.zoom + delta)
    }

    /// Zoom as a rounded percentage (e.g. 125 for 1.25).
    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_viewport() {
        let vp = ViewportState::new(5);
        assert_eq!(vp.current_page(), 1);
        assert_eq!(vp.total_pages(), 5);
        assert!((vp.zoom() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_pages_becomes_one() {
        let vp = ViewportState::new(0);
        assert_eq!(vp.total_pages(), 1);
        assert!(vp.contains_page(1));
    }

    #[test]
    fn test_zoom_clamp() {
        let mut vp = ViewportState::new(1);
        assert!(vp.set_zoom(10.0));
        assert!((vp.zoom() - MAX_ZOOM).abs() < f64::EPSILON);
        assert!(vp.set_zoom(0.0));
        assert!((vp.zoom() - MIN_ZOOM).abs() < f64::EPSILON);
        assert!(!vp.set_zoom(-3.0));
        assert!(!vp.set_zoom(f64::NAN));
        assert!((vp.zoom() - MIN_ZOOM).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_steps() {
        let mut vp = ViewportState::new(1);
        vp.zoom_by(DEFAULT_ZOOM_STEP);
        assert_eq!(vp.zoom_percent(), 125);
        for _ in 0..20 {
            vp.zoom_by(DEFAULT_ZOOM_STEP);
        }
        assert_eq!(vp.zoom_percent(), 300);
        assert!(!vp.zoom_by(DEFAULT_ZOOM_STEP));
    }

    #[test]
    fn test_page_bounds() {
        let mut vp = ViewportState::new(3);
        assert_eq!(vp.prev_page(), None);
        assert_eq!(vp.next_page(), Some(2));
        assert!(vp.set_current_page(3));
        assert_eq!(vp.next_page(), None);
        assert!(!vp.set_current_page(4));
        assert!(!vp.set_current_page(0));
        assert_eq!(vp.current_page(), 3);
    }

    #[test]
    fn test_parse_page_input() {
        let vp = ViewportState::new(10);
        assert_eq!(vp.parse_page_input(" 7 "), Some(7));
        assert_eq!(vp.parse_page_input("11"), None);
        assert_eq!(vp.parse_page_input("0"), None);
        assert_eq!(vp.parse_page_input("-2"), None);
        assert_eq!(vp.parse_page_input("abc"), None);
        assert_eq!(vp.parse_page_input(""), None);
    }
}
