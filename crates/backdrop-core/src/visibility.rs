//! Visibility/hover signals and whether they allow the loop to run.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibilityPolicy {
    pub pause_on_hidden: bool,
    pub pause_on_offscreen: bool,
    pub pause_on_hover: bool,
}

impl Default for VisibilityPolicy {
    fn default() -> Self {
        Self {
            pause_on_hidden: true,
            pause_on_offscreen: true,
            pause_on_hover: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibilityState {
    pub page_visible: bool,
    pub in_viewport: bool,
    pub hovered: bool,
}

impl Default for VisibilityState {
    fn default() -> Self {
        Self {
            page_visible: true,
            in_viewport: true,
            hovered: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisibilitySignal {
    PageHidden,
    PageShown,
    LeftViewport,
    EnteredViewport,
    PointerEntered,
    PointerLeft,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopTransition {
    Pause,
    Resume,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct VisibilityTracker {
    policy: VisibilityPolicy,
    state: VisibilityState,
}

impl VisibilityTracker {
    pub fn new(policy: VisibilityPolicy) -> Self {
        Self {
            policy,
            state: VisibilityState::default(),
        }
    }

    pub fn should_run(&self) -> bool {
        let p = &self.policy;
        let s = &self.state;
        !(p.pause_on_hidden && !s.page_visible
            || p.pause_on_offscreen && !s.in_viewport
            || p.pause_on_hover && s.hovered)
    }

    /// Record a signal; returns a transition only when the run decision flips.
    pub fn apply(&mut self, signal: VisibilitySignal) -> Option<LoopTransition> {
        let before = self.should_run();
        match signal {
            VisibilitySignal::PageHidden => self.state.page_visible = false,
            VisibilitySignal::PageShown => self.state.page_visible = true,
            VisibilitySignal::LeftViewport => self.state.in_viewport = false,
            VisibilitySignal::EnteredViewport => self.state.in_viewport = true,
            VisibilitySignal::PointerEntered => self.state.hovered = true,
            VisibilitySignal::PointerLeft => self.state.hovered = false,
        }
        match (before, self.should_run()) {
            (true, false) => Some(LoopTransition::Pause),
            (false, true) => Some(LoopTransition::Resume),
            _ => None,
        }
    }

    pub fn state(&self) -> VisibilityState {
        self.state
    }

    pub fn policy(&self) -> VisibilityPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_page_pauses_and_shown_resumes() {
        let mut t = VisibilityTracker::new(VisibilityPolicy::default());
        assert_eq!(t.apply(VisibilitySignal::PageHidden), Some(LoopTransition::Pause));
        assert_eq!(t.apply(VisibilitySignal::PageHidden), None);
        assert_eq!(t.apply(VisibilitySignal::PageShown), Some(LoopTransition::Resume));
    }

    #[test]
    fn resume_waits_for_every_blocking_signal_to_clear() {
        let mut t = VisibilityTracker::new(VisibilityPolicy::default());
        assert_eq!(t.apply(VisibilitySignal::LeftViewport), Some(LoopTransition::Pause));
        assert_eq!(t.apply(VisibilitySignal::PageHidden), None);
        assert_eq!(t.apply(VisibilitySignal::EnteredViewport), None);
        assert_eq!(t.apply(VisibilitySignal::PageShown), Some(LoopTransition::Resume));
    }

    #[test]
    fn hover_only_matters_when_policy_asks() {
        let mut t = VisibilityTracker::new(VisibilityPolicy::default());
        assert_eq!(t.apply(VisibilitySignal::PointerEntered), None);

        let mut t = VisibilityTracker::new(VisibilityPolicy {
            pause_on_hover: true,
            ..Default::default()
        });
        assert_eq!(t.apply(VisibilitySignal::PointerEntered), Some(LoopTransition::Pause));
        assert_eq!(t.apply(VisibilitySignal::PointerLeft), Some(LoopTransition::Resume));
    }

    #[test]
    fn disabled_policy_never_pauses() {
        let mut t = VisibilityTracker::new(VisibilityPolicy {
            pause_on_hidden: false,
            pause_on_offscreen: false,
            pause_on_hover: false,
        });
        for s in [
            VisibilitySignal::PageHidden,
            VisibilitySignal::LeftViewport,
            VisibilitySignal::PointerEntered,
        ] {
            assert_eq!(t.apply(s), None);
        }
        assert!(t.should_run());
    }
}
