//! Debouncing for the power-present line

/// Holds back a change of the binary power status until it has been seen on
/// `threshold` consecutive polls.
#[derive(Debug, Clone)]
pub struct PowerStatusDebouncer {
    threshold: u8,
    published: Option<bool>,
    pending: Option<bool>,
    count: u8,
}

impl PowerStatusDebouncer {
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold: threshold.max(1),
            published: None,
            pending: None,
            count: 0,
        }
    }

    /// Feed one raw sample and return the status to publish
    pub fn update(&mut self, raw: bool) -> bool {
        let Some(published) = self.published else {
            // Nothing to flap against yet
            self.published = Some(raw);
            return raw;
        };

        if raw == published {
            self.reset_pending();
            return published;
        }

        if self.pending == Some(raw) {
            self.count = self.count.saturating_add(1);
        } else {
            self.pending = Some(raw);
            self.count = 1;
        }

        if self.count >= self.threshold {
            tracing::debug!(
                "Power status changed to {} after {} polls",
                raw,
                self.count
            );
            self.published = Some(raw);
            self.reset_pending();
            return raw;
        }

        published
    }

    /// Last published status, if any sample has been seen
    pub fn published(&self) -> Option<bool> {
        self.published
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Consecutive samples agreeing with the pending change
    pub fn pending_count(&self) -> u8 {
        self.count
    }

    fn reset_pending(&mut self) {
        self.pending = None;
        self.count = 0;
    }
}

impl Default for PowerStatusDebouncer {
    fn default() -> Self {
        Self::new(crate::DEFAULT_DEBOUNCE_POLLS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settled(threshold: u8, value: bool) -> PowerStatusDebouncer {
        let mut debouncer = PowerStatusDebouncer::new(threshold);
        debouncer.update(value);
        debouncer
    }

    #[test]
    fn test_first_sample_published_immediately() {
        let mut debouncer = PowerStatusDebouncer::new(3);
        assert_eq!(debouncer.published(), None);
        assert!(debouncer.update(true));
        assert_eq!(debouncer.published(), Some(true));
    }

    #[test]
    fn test_interrupted_change_does_not_flip() {
        let mut debouncer = settled(3, false);

        // N-1 disagreeing polls, then one agreeing with the old value
        assert!(!debouncer.update(true));
        assert!(!debouncer.update(true));
        assert!(!debouncer.update(false));
        assert_eq!(debouncer.pending_count(), 0);

        // The count starts over
        assert!(!debouncer.update(true));
        assert!(!debouncer.update(true));
        assert_eq!(debouncer.published(), Some(false));
    }

    #[test]
    fn test_sustained_change_flips_exactly_once() {
        let mut debouncer = settled(3, false);

        let outputs: Vec<bool> = (0..6).map(|_| debouncer.update(true)).collect();
        assert_eq!(outputs, vec![false, false, true, true, true, true]);

        let flips = outputs.windows(2).filter(|w| w[0] != w[1]).count();
        assert_eq!(flips, 1);
    }

    #[test]
    fn test_threshold_one_follows_raw() {
        let mut debouncer = settled(1, true);
        assert!(!debouncer.update(false));
        assert!(debouncer.update(true));
    }

    #[test]
    fn test_zero_threshold_is_treated_as_one() {
        assert_eq!(PowerStatusDebouncer::new(0).threshold(), 1);
    }

    #[test]
    fn test_default_threshold() {
        let debouncer = PowerStatusDebouncer::default();
        assert_eq!(debouncer.threshold(), crate::DEFAULT_DEBOUNCE_POLLS);
    }
}
