use instant::Instant;
use std::time::Duration;

/// Trailing-edge coalescing: every request restarts the window and replaces
/// the pending value; `poll` hands out the latest value once the window has
/// passed without further requests.
#[derive(Clone, Debug)]
pub struct ResizeDebouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> ResizeDebouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn request(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.window));
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, due)) if now >= *due => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// When the pending value becomes due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, due)| *due)
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_collapses_to_last_value() {
        let t0 = Instant::now();
        let mut d = ResizeDebouncer::new(Duration::from_millis(100));
        d.request(1, t0);
        d.request(2, t0 + Duration::from_millis(40));
        d.request(3, t0 + Duration::from_millis(80));
        assert_eq!(d.poll(t0 + Duration::from_millis(150)), None);
        assert_eq!(d.poll(t0 + Duration::from_millis(180)), Some(3));
        assert_eq!(d.poll(t0 + Duration::from_millis(500)), None);
    }

    #[test]
    fn deadline_tracks_latest_request() {
        let t0 = Instant::now();
        let mut d = ResizeDebouncer::new(Duration::from_millis(100));
        assert_eq!(d.deadline(), None);
        d.request((), t0 + Duration::from_millis(30));
        assert_eq!(d.deadline(), Some(t0 + Duration::from_millis(130)));
        d.clear();
        assert_eq!(d.deadline(), None);
    }
}
