/// Converts a spline parameter into the completion fraction shown to the
/// walker.
///
/// The indicator always reads progress toward the finish that is currently
/// active, so a reversed sprint reports `1 - t`.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    last: Option<f32>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn adjusted(t: f32, is_forward: bool) -> f32 {
        if is_forward { t } else { 1.0 - t }
    }

    /// Records and returns the display value for `t`.
    pub fn report(&mut self, t: f32, is_forward: bool) -> f32 {
        let progress = Self::adjusted(t, is_forward);
        self.last = Some(progress);
        progress
    }

    /// Last value handed to the display.
    pub fn last(&self) -> Option<f32> {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_and_reverse() {
        let mut reporter = ProgressReporter::new();
        assert_eq!(reporter.report(0.25, true), 0.25);
        assert_eq!(reporter.report(0.25, false), 0.75);
        assert_eq!(reporter.last(), Some(0.75));

        reporter.reset();
        assert_eq!(reporter.last(), None);
    }
}
