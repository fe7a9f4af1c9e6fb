use std::time::{Duration, Instant};

/// Explicit debounce timer.
///
/// Each [`schedule`](Debouncer::schedule) replaces the pending value and
/// restarts the delay; [`poll`](Debouncer::poll) hands the value out once the
/// delay elapsed without a newer one. The clock is always supplied by the
/// caller.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Some((now + self.delay, value));
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if *deadline <= now => self.pending.take().map(|(_, v)| v),
            _ => None,
        }
    }

    /// Drops the pending value, if any, and returns it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, value)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_only_after_quiet_interval() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(400));
        debouncer.schedule("a", start);

        assert_eq!(debouncer.poll(start + Duration::from_millis(399)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(400)), Some("a"));
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(start + Duration::from_millis(800)), None);
    }

    #[test]
    fn newer_value_restarts_delay() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(400));
        debouncer.schedule(1, start);
        debouncer.schedule(2, start + Duration::from_millis(300));

        assert_eq!(debouncer.poll(start + Duration::from_millis(500)), None);
        assert_eq!(
            debouncer.deadline(),
            Some(start + Duration::from_millis(700))
        );
        assert_eq!(debouncer.poll(start + Duration::from_millis(700)), Some(2));
    }

    #[test]
    fn cancel_drops_pending_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        debouncer.schedule('x', start);
        assert_eq!(debouncer.cancel(), Some('x'));
        assert_eq!(debouncer.poll(start + Duration::from_secs(1)), None);
    }
}
