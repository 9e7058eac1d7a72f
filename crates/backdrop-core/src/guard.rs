//! Release list for everything a backdrop acquires after its surface:
//! listeners, observers, timers. Entries are released exactly once, newest
//! first, and one failing release never stops the rest.

use crate::error::BackdropError;
use smallvec::SmallVec;
use std::borrow::Cow;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ReleaseId(u64);

type ReleaseFn = Box<dyn FnOnce() -> anyhow::Result<()>>;

struct Entry {
    id: u64,
    label: Cow<'static, str>,
    release: ReleaseFn,
}

impl Entry {
    fn run(self) -> Result<(), BackdropError> {
        let Entry { label, release, .. } = self;
        release().map_err(|e| {
            log::warn!("[guard] release of `{}` failed: {:#}", label, e);
            BackdropError::Disposal {
                label: label.into_owned(),
                reason: format!("{:#}", e),
            }
        })
    }
}

#[derive(Default)]
pub struct DisposalGuard {
    entries: SmallVec<[Entry; 8]>,
    next_id: u64,
    disposed: bool,
}

impl DisposalGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a release to the list. After `dispose` the release runs at once,
    /// so nothing acquired late can leak.
    pub fn register(
        &mut self,
        label: impl Into<Cow<'static, str>>,
        release: impl FnOnce() -> anyhow::Result<()> + 'static,
    ) -> ReleaseId {
        self.next_id += 1;
        let entry = Entry {
            id: self.next_id,
            label: label.into(),
            release: Box::new(release),
        };
        if self.disposed {
            log::debug!("[guard] `{}` registered after dispose; releasing now", entry.label);
            let _ = entry.run();
        } else {
            self.entries.push(entry);
        }
        ReleaseId(self.next_id)
    }

    /// Release a single entry ahead of `dispose`. Unknown or already released
    /// ids are ignored.
    pub fn release(&mut self, id: ReleaseId) -> Result<(), BackdropError> {
        match self.entries.iter().position(|e| e.id == id.0) {
            Some(pos) => self.entries.remove(pos).run(),
            None => Ok(()),
        }
    }

    /// Release everything in reverse registration order. Failures are logged
    /// and collected; the next call returns an empty list.
    pub fn dispose(&mut self) -> Vec<BackdropError> {
        if self.disposed {
            return Vec::new();
        }
        self.disposed = true;
        let mut failures = Vec::new();
        while let Some(entry) = self.entries.pop() {
            log::trace!("[guard] releasing `{}`", entry.label);
            if let Err(e) = entry.run() {
                failures.push(e);
            }
        }
        failures
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_ref()).collect()
    }
}

impl Drop for DisposalGuard {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> Rc<RefCell<Vec<&'static str>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn releases_newest_first() {
        let log = recorder();
        let mut g = DisposalGuard::new();
        for name in ["context", "resize", "pointer"] {
            let l = log.clone();
            g.register(name, move || {
                l.borrow_mut().push(name);
                Ok(())
            });
        }
        assert!(g.dispose().is_empty());
        assert_eq!(*log.borrow(), vec!["pointer", "resize", "context"]);
        assert!(g.is_empty());
    }

    #[test]
    fn failing_release_does_not_block_the_others() {
        let log = recorder();
        let mut g = DisposalGuard::new();
        let l = log.clone();
        g.register("first", move || {
            l.borrow_mut().push("first");
            Ok(())
        });
        g.register("broken", || Err(anyhow::anyhow!("observer already gone")));
        let l = log.clone();
        g.register("last", move || {
            l.borrow_mut().push("last");
            Ok(())
        });
        let failures = g.dispose();
        assert_eq!(failures.len(), 1);
        assert!(matches!(&failures[0], BackdropError::Disposal { label, .. } if label == "broken"));
        assert_eq!(*log.borrow(), vec!["last", "first"]);
    }

    #[test]
    fn second_dispose_is_a_no_op() {
        let count = Rc::new(RefCell::new(0));
        let mut g = DisposalGuard::new();
        let c = count.clone();
        g.register("timer", move || {
            *c.borrow_mut() += 1;
            Ok(())
        });
        g.dispose();
        g.dispose();
        drop(g);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn late_registration_is_released_immediately() {
        let count = Rc::new(RefCell::new(0));
        let mut g = DisposalGuard::new();
        g.dispose();
        let c = count.clone();
        g.register("late", move || {
            *c.borrow_mut() += 1;
            Ok(())
        });
        assert_eq!(*count.borrow(), 1);
        assert!(g.is_empty());
    }

    #[test]
    fn early_release_removes_only_that_entry() {
        let log = recorder();
        let mut g = DisposalGuard::new();
        let l = log.clone();
        let a = g.register("a", move || {
            l.borrow_mut().push("a");
            Ok(())
        });
        let l = log.clone();
        g.register("b", move || {
            l.borrow_mut().push("b");
            Ok(())
        });
        g.release(a).unwrap();
        g.release(a).unwrap();
        assert_eq!(g.labels(), vec!["b"]);
        g.dispose();
        assert_eq!(*log.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn drop_releases_outstanding_entries() {
        let count = Rc::new(RefCell::new(0));
        {
            let mut g = DisposalGuard::new();
            let c = count.clone();
            g.register("listener", move || {
                *c.borrow_mut() += 1;
                Ok(())
            });
        }
        assert_eq!(*count.borrow(), 1);
    }
}
