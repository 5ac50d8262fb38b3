use crate::models::PaceSample;

/// Accumulates pace samples into a score.
pub trait PaceMetric {
    type Score;
    fn next_sample(&mut self, sample: &PaceSample);
    fn finish(&self) -> Self::Score;
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsSummary {
    pub total_distance: f32,
    pub total_time: f32,
    /// Average speed in raw pace units, `None` until time has accumulated.
    pub average_pace: Option<f32>,
}

/// Distance and walking time of the current session.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    distance: DistanceMetric,
    duration: DurationMetric,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_distance(&self) -> f32 {
        self.distance.finish()
    }

    pub fn total_time(&self) -> f32 {
        self.duration.finish()
    }

    pub fn average_pace(&self) -> Option<f32> {
        let time = self.total_time();
        if time > 0.0 {
            Some(self.total_distance() / time)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl PaceMetric for SessionStats {
    type Score = StatsSummary;

    fn next_sample(&mut self, sample: &PaceSample) {
        self.distance.next_sample(sample);
        self.duration.next_sample(sample);
    }

    fn finish(&self) -> StatsSummary {
        StatsSummary {
            total_distance: self.total_distance(),
            total_time: self.total_time(),
            average_pace: self.average_pace(),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct DistanceMetric {
    total_distance: f32,
}

impl PaceMetric for DistanceMetric {
    type Score = f32;

    fn next_sample(&mut self, sample: &PaceSample) {
        // Totals never decrease; negative or NaN deltas are dropped.
        if sample.distance_delta > 0.0 {
            self.total_distance += sample.distance_delta;
        }
    }

    fn finish(&self) -> f32 {
        self.total_distance
    }
}

#[derive(Debug, Clone, Default)]
struct DurationMetric {
    total_time: f32,
}

impl PaceMetric for DurationMetric {
    type Score = f32;

    fn next_sample(&mut self, sample: &PaceSample) {
        if sample.time_delta > 0.0 {
            self.total_time += sample.time_delta;
        }
    }

    fn finish(&self) -> f32 {
        self.total_time
    }
}

/// Result of feeding one pace reading to the [`PaceMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaceSignals {
    /// New warning state when the threshold was crossed this tick.
    pub warning_toggled: Option<bool>,
    /// Whether the UI should be hidden for this reading.
    pub hide_ui: bool,
}

/// Edge-triggered over-speed warning plus the UI visibility gate.
#[derive(Debug, Clone)]
pub struct PaceMonitor {
    warning_threshold: f32,
    ui_hide_threshold: f32,
    display_factor: f32,
    warning_shown: bool,
}

impl PaceMonitor {
    pub fn new(warning_threshold: f32, ui_hide_threshold: f32, display_factor: f32) -> Self {
        Self {
            warning_threshold,
            ui_hide_threshold,
            display_factor,
            warning_shown: false,
        }
    }

    pub fn is_warning_shown(&self) -> bool {
        self.warning_shown
    }

    pub fn observe(&mut self, pace: f32) -> PaceSignals {
        let display_pace = pace * self.display_factor;

        let mut warning_toggled = None;
        if self.warning_shown && display_pace < self.warning_threshold {
            self.warning_shown = false;
            warning_toggled = Some(false);
        } else if !self.warning_shown && display_pace > self.warning_threshold {
            self.warning_shown = true;
            warning_toggled = Some(true);
        }

        PaceSignals {
            warning_toggled,
            hide_ui: pace > self.ui_hide_threshold,
        }
    }

    /// Clears the warning, returning true when it was shown.
    pub fn reset(&mut self) -> bool {
        std::mem::take(&mut self.warning_shown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(distance: f32, time: f32, pace: f32) -> PaceSample {
        PaceSample {
            distance_delta: distance,
            time_delta: time,
            pace,
            ..Default::default()
        }
    }

    #[test]
    fn test_accumulates_distance_and_time() {
        let mut stats = SessionStats::new();
        assert_eq!(stats.average_pace(), None);

        stats.next_sample(&sample(10.0, 1.0, 10.0));
        stats.next_sample(&sample(30.0, 1.0, 30.0));

        let summary = stats.finish();
        assert_eq!(summary.total_distance, 40.0);
        assert_eq!(summary.total_time, 2.0);
        assert_eq!(summary.average_pace, Some(20.0));
    }

    #[test]
    fn test_totals_are_monotonic() {
        let mut stats = SessionStats::new();
        stats.next_sample(&sample(5.0, 0.5, 10.0));
        stats.next_sample(&sample(-3.0, -0.1, 0.0));
        stats.next_sample(&sample(f32::NAN, f32::NAN, 0.0));
        assert_eq!(stats.total_distance(), 5.0);
        assert_eq!(stats.total_time(), 0.5);

        stats.reset();
        assert_eq!(stats.total_distance(), 0.0);
    }

    #[test]
    fn test_warning_is_edge_triggered() {
        let mut monitor = PaceMonitor::new(15.0, 13.0, 1.0);

        assert_eq!(monitor.observe(10.0).warning_toggled, None);
        assert_eq!(monitor.observe(16.0).warning_toggled, Some(true));
        assert_eq!(monitor.observe(20.0).warning_toggled, None);
        // Exactly at the threshold is neither above nor below.
        assert_eq!(monitor.observe(15.0).warning_toggled, None);
        assert_eq!(monitor.observe(14.0).warning_toggled, Some(false));
        assert_eq!(monitor.observe(1.0).warning_toggled, None);
    }

    #[test]
    fn test_ui_gate_uses_raw_pace() {
        let mut monitor = PaceMonitor::new(15.0, 13.0, 0.5);
        assert!(monitor.observe(14.0).hide_ui);
        assert!(!monitor.observe(13.0).hide_ui);
        // 28 raw is 14 in display units: hidden, but no warning yet.
        let signals = monitor.observe(28.0);
        assert!(signals.hide_ui);
        assert_eq!(signals.warning_toggled, None);
    }
}
