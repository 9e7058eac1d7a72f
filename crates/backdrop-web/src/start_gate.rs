//! Start requests against a renderer that initialises asynchronously (the
//! WebGPU adapter and device). Repeated `start` calls share one init, and a
//! `stop` issued while it is in flight wins.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartAction {
    /// Renderer ready; start the loop now.
    Run,
    /// Kick off the init; the caller reports back with `init_finished`.
    BeginInit,
    /// An init is already running and will start the loop when it lands.
    Wait,
}

#[derive(Debug, Default)]
pub struct StartGate {
    wants_run: bool,
    initialising: bool,
    ready: bool,
}

impl StartGate {
    pub fn request_start(&mut self) -> StartAction {
        self.wants_run = true;
        if self.ready {
            StartAction::Run
        } else if self.initialising {
            StartAction::Wait
        } else {
            self.initialising = true;
            StartAction::BeginInit
        }
    }

    pub fn request_stop(&mut self) {
        self.wants_run = false;
    }

    /// Returns whether the loop should start now.
    pub fn init_finished(&mut self, ok: bool) -> bool {
        self.initialising = false;
        self.ready = ok;
        if !ok {
            self.wants_run = false;
        }
        ok && self.wants_run
    }

    pub fn is_initialising(&self) -> bool {
        self.initialising
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_start_during_init_waits() {
        let mut g = StartGate::default();
        assert_eq!(g.request_start(), StartAction::BeginInit);
        assert_eq!(g.request_start(), StartAction::Wait);
        assert!(g.is_initialising());
        assert!(g.init_finished(true));
        assert_eq!(g.request_start(), StartAction::Run);
    }

    #[test]
    fn stop_during_init_keeps_the_loop_stopped() {
        let mut g = StartGate::default();
        g.request_start();
        g.request_stop();
        assert!(!g.init_finished(true));
        assert_eq!(g.request_start(), StartAction::Run);
    }

    #[test]
    fn stop_then_start_during_init_still_runs_once_ready() {
        let mut g = StartGate::default();
        g.request_start();
        g.request_stop();
        assert_eq!(g.request_start(), StartAction::Wait);
        assert!(g.init_finished(true));
    }

    #[test]
    fn failed_init_does_not_run() {
        let mut g = StartGate::default();
        g.request_start();
        assert!(!g.init_finished(false));
        assert!(!g.is_initialising());
    }
}
