// Shared host-side fakes: a counting surface backend and frame helpers.

#![allow(dead_code)]
use backdrop_core::*;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default, Debug)]
pub struct BackendStats {
    pub acquired: Option<ContextKind>,
    pub allocations: Vec<BackingSize>,
    pub releases: usize,
}

#[derive(Clone, Default)]
pub struct CountingBackend {
    pub stats: Rc<RefCell<BackendStats>>,
    pub refuse: Option<ContextKind>,
    pub fail_release: bool,
}

impl CountingBackend {
    pub fn refusing(kind: ContextKind) -> Self {
        Self {
            refuse: Some(kind),
            ..Default::default()
        }
    }

    pub fn allocations(&self) -> usize {
        self.stats.borrow().allocations.len()
    }

    pub fn releases(&self) -> usize {
        self.stats.borrow().releases
    }
}

impl SurfaceBackend for CountingBackend {
    fn acquire(&mut self, kind: ContextKind, _background: BackgroundMode) -> anyhow::Result<()> {
        if self.refuse == Some(kind) {
            anyhow::bail!("{} not supported", kind);
        }
        self.stats.borrow_mut().acquired = Some(kind);
        Ok(())
    }

    fn allocate(&mut self, size: BackingSize) {
        self.stats.borrow_mut().allocations.push(size);
    }

    fn release(&mut self) -> anyhow::Result<()> {
        self.stats.borrow_mut().releases += 1;
        if self.fail_release {
            anyhow::bail!("context lost");
        }
        Ok(())
    }
}

pub type TestBackdrop = Backdrop<CountingBackend, ManualScheduler>;

pub fn mount_with(options: BackdropOptions) -> (TestBackdrop, CountingBackend, ManualScheduler) {
    let backend = CountingBackend::default();
    let sched = ManualScheduler::new();
    let bd = Backdrop::mount(
        backend.clone(),
        sched.clone(),
        ContainerSize::new(320.0, 180.0),
        1.0,
        &options,
    )
    .expect("mount");
    (bd, backend, sched)
}

pub fn mount() -> (TestBackdrop, CountingBackend, ManualScheduler) {
    let options = BackdropOptions::for_effect(EffectKind::PixelBlast)
        .with_param("pixelSize", ParamValue::Number(3.0))
        .with_param("color", "#B19EEF");
    mount_with(BackdropOptions {
        seed: Some(42),
        ..options
    })
}

/// Deliver every pending frame at `ts` (ms). Returns the first error.
pub fn tick(bd: &mut TestBackdrop, sched: &ManualScheduler, ts: f64) -> Result<()> {
    for h in sched.take_due() {
        bd.on_frame(h, ts)?;
    }
    Ok(())
}

/// `n` ticks, 16 ms apart, starting at `start_ms`.
pub fn ticks(bd: &mut TestBackdrop, sched: &ManualScheduler, start_ms: f64, n: usize) -> Result<()> {
    for i in 0..n {
        tick(bd, sched, start_ms + i as f64 * 16.0)?;
    }
    Ok(())
}
