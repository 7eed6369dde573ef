//! Blink gesture detection.
//!
//! Holding both eyes shut for a few frames is a click. Three clicks within a
//! short window form a triple-blink, which toggles voice mode. The detector
//! only decides; the frame loop performs the click and flips the flag.

use crate::constants::TRIPLE_BLINK_COUNT;
use log::debug;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Result of feeding one frame to the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlinkEvent {
    /// Eyes open, or no measurement this frame
    #[default]
    None,
    /// Eyes closed, not held long enough for a click yet
    Closed,
    /// Eyes held closed long enough: click once
    Click,
    /// Click that completed a triple-blink: click and toggle voice mode
    ClickAndToggle,
}

impl BlinkEvent {
    #[must_use]
    pub const fn is_click(self) -> bool {
        matches!(self, Self::Click | Self::ClickAndToggle)
    }

    #[must_use]
    pub const fn is_toggle(self) -> bool {
        matches!(self, Self::ClickAndToggle)
    }

    /// The eyes measured closed this frame
    #[must_use]
    pub const fn eyes_closed(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Blink thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlinkSettings {
    /// Ratio above which the eyes count as closed
    pub threshold: f64,
    /// Consecutive closed frames per click
    pub frame_limit: u32,
    /// Window in which three clicks make a triple-blink
    pub triple_window: Duration,
}

impl Default for BlinkSettings {
    fn default() -> Self {
        Self {
            threshold: crate::constants::DEFAULT_BLINK_THRESH,
            frame_limit: crate::constants::DEFAULT_BLINK_LIMIT,
            triple_window: Duration::from_secs_f64(crate::constants::DEFAULT_TRIPLE_BLINK_WINDOW),
        }
    }
}

/// Debounced blink-to-click state machine
#[derive(Debug, Clone)]
pub struct BlinkDetector {
    settings: BlinkSettings,
    consecutive_closed_frames: u32,
    recent_clicks: VecDeque<Instant>,
}

impl BlinkDetector {
    #[must_use]
    pub fn new(settings: BlinkSettings) -> Self {
        Self {
            settings,
            consecutive_closed_frames: 0,
            recent_clicks: VecDeque::with_capacity(TRIPLE_BLINK_COUNT + 1),
        }
    }

    /// Feed the averaged eye ratio for one frame.
    ///
    /// `None` means nothing was measured (face lost); the detector keeps its
    /// state so a held blink survives a dropped frame.
    pub fn update(&mut self, ratio: Option<f64>, now: Instant) -> BlinkEvent {
        let Some(ratio) = ratio else {
            return BlinkEvent::None;
        };

        if ratio <= self.settings.threshold {
            self.consecutive_closed_frames = 0;
            return BlinkEvent::None;
        }

        self.consecutive_closed_frames += 1;
        if self.consecutive_closed_frames < self.settings.frame_limit {
            return BlinkEvent::Closed;
        }

        // Held long enough: one click, then start counting again
        self.consecutive_closed_frames = 0;
        self.recent_clicks.push_back(now);
        self.purge(now);
        debug!("Blink click ({} in window)", self.recent_clicks.len());

        if self.recent_clicks.len() >= TRIPLE_BLINK_COUNT {
            self.recent_clicks.clear();
            BlinkEvent::ClickAndToggle
        } else {
            BlinkEvent::Click
        }
    }

    fn purge(&mut self, now: Instant) {
        while let Some(&oldest) = self.recent_clicks.front() {
            if now.saturating_duration_since(oldest) > self.settings.triple_window {
                self.recent_clicks.pop_front();
            } else {
                break;
            }
        }
    }

    #[must_use]
    pub const fn consecutive_closed_frames(&self) -> u32 {
        self.consecutive_closed_frames
    }

    /// Click timestamps still inside the triple-blink window
    #[must_use]
    pub fn recent_clicks(&self) -> usize {
        self.recent_clicks.len()
    }

    #[must_use]
    pub const fn settings(&self) -> &BlinkSettings {
        &self.settings
    }

    /// Reset the detector
    pub fn reset(&mut self) {
        self.consecutive_closed_frames = 0;
        self.recent_clicks.clear();
    }
}

impl Default for BlinkDetector {
    fn default() -> Self {
        Self::new(BlinkSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLOSED: Option<f64> = Some(8.0);
    const OPEN: Option<f64> = Some(3.0);

    #[test]
    fn test_two_closed_frames_click_once() {
        let mut detector = BlinkDetector::default();
        let t = Instant::now();
        assert_eq!(detector.update(CLOSED, t), BlinkEvent::Closed);
        assert_eq!(detector.update(CLOSED, t), BlinkEvent::Click);
        assert_eq!(detector.consecutive_closed_frames(), 0);
    }

    #[test]
    fn test_open_eye_resets_counter() {
        let mut detector = BlinkDetector::default();
        let t = Instant::now();
        detector.update(CLOSED, t);
        assert_eq!(detector.update(OPEN, t), BlinkEvent::None);
        assert_eq!(detector.update(CLOSED, t), BlinkEvent::Closed);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut detector = BlinkDetector::default();
        let t = Instant::now();
        assert_eq!(detector.update(Some(5.5), t), BlinkEvent::None);
        assert_eq!(detector.update(Some(5.5), t), BlinkEvent::None);
    }

    #[test]
    fn test_missing_ratio_preserves_held_blink() {
        let mut detector = BlinkDetector::default();
        let t = Instant::now();
        detector.update(CLOSED, t);
        assert_eq!(detector.update(None, t), BlinkEvent::None);
        assert_eq!(detector.consecutive_closed_frames(), 1);
        assert_eq!(detector.update(CLOSED, t), BlinkEvent::Click);
    }

    #[test]
    fn test_stale_clicks_are_purged() {
        let mut detector = BlinkDetector::default();
        let t0 = Instant::now();
        for i in 0..3u64 {
            let t = t0 + Duration::from_secs(3 * i);
            detector.update(CLOSED, t);
            assert_eq!(detector.update(CLOSED, t), BlinkEvent::Click);
            assert_eq!(detector.recent_clicks(), 1);
        }
    }

    #[test]
    fn test_frame_limit_of_one() {
        let mut detector = BlinkDetector::new(BlinkSettings {
            frame_limit: 1,
            ..BlinkSettings::default()
        });
        let t = Instant::now();
        assert_eq!(detector.update(CLOSED, t), BlinkEvent::Click);
        assert_eq!(detector.update(CLOSED, t), BlinkEvent::Click);
        assert_eq!(detector.update(CLOSED, t), BlinkEvent::ClickAndToggle);
    }
}
