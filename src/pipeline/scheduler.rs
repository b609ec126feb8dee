//! Frame scheduling - deferring renders to the host's next paint.
//!
//! [`FrameScheduler`] is the host seam: request a callback on the next frame,
//! or cancel one that has not run yet. [`RenderSlot`] builds the per-element
//! single-slot queue on top of it, and [`ManualFrames`] is a scheduler driven
//! by explicit [`tick`](ManualFrames::tick) calls.
//!
//! # Coalescing
//!
//! ```text
//! set count=1  → slot.submit(A)            pending: A
//! set count=2  → cancel A, slot.submit(B)  pending: B
//! tick         → B runs (sees count=2)     pending: -
//! ```

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Work queued for the next frame.
pub type FrameTask = Box<dyn FnOnce()>;

/// Identifies a requested frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

/// The host's paint cycle.
pub trait FrameScheduler {
    /// Run `task` at the next frame.
    fn request_frame(&self, task: FrameTask) -> FrameHandle;

    /// Drop a requested task that has not run yet. Unknown or already-run
    /// handles are ignored.
    fn cancel_frame(&self, handle: FrameHandle);
}

// =============================================================================
// Render Slot
// =============================================================================

/// Single-slot task queue: submitting while a task is pending cancels the
/// pending one and queues the new one in its place.
///
/// The slot is cleared just before its task runs, so a task may resubmit.
#[derive(Default)]
pub struct RenderSlot {
    pending: Rc<Cell<Option<FrameHandle>>>,
}

impl RenderSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task`, replacing any pending task.
    pub fn submit(&self, frames: &dyn FrameScheduler, task: FrameTask) -> FrameHandle {
        if let Some(previous) = self.pending.take() {
            frames.cancel_frame(previous);
            tracing::trace!(handle = previous.0, "render_slot.cancel");
        }

        let pending = Rc::clone(&self.pending);
        let handle = frames.request_frame(Box::new(move || {
            pending.set(None);
            task();
        }));
        self.pending.set(Some(handle));
        handle
    }

    /// Cancel the pending task, if any.
    pub fn cancel(&self, frames: &dyn FrameScheduler) {
        if let Some(handle) = self.pending.take() {
            frames.cancel_frame(handle);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending.get()
    }
}

impl fmt::Debug for RenderSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderSlot")
            .field("pending", &self.pending.get())
            .finish()
    }
}

// =============================================================================
// Manual Frames
// =============================================================================

/// Frame scheduler advanced by hand.
///
/// [`tick`](Self::tick) runs every task that was queued when the tick began,
/// in request order. Tasks requested while a tick is running wait for the
/// next tick; tasks cancelled while a tick is running are skipped.
#[derive(Default)]
pub struct ManualFrames {
    queue: RefCell<BTreeMap<FrameHandle, FrameTask>>,
    next_handle: Cell<u64>,
    ticks: Cell<u64>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one frame. Returns the number of tasks that ran.
    pub fn tick(&self) -> usize {
        self.ticks.set(self.ticks.get() + 1);
        let due: Vec<FrameHandle> = self.queue.borrow().keys().copied().collect();

        let mut ran = 0;
        for handle in due {
            let task = self.queue.borrow_mut().remove(&handle);
            if let Some(task) = task {
                task();
                ran += 1;
            }
        }
        ran
    }

    /// Tick until no tasks are queued or `max_ticks` frames have run.
    /// Returns the total number of tasks that ran.
    pub fn run_until_idle(&self, max_ticks: usize) -> usize {
        let mut ran = 0;
        for _ in 0..max_ticks {
            if self.is_idle() {
                break;
            }
            ran += self.tick();
        }
        ran
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Number of ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.get()
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&self, task: FrameTask) -> FrameHandle {
        let handle = FrameHandle(self.next_handle.get());
        self.next_handle.set(handle.0 + 1);
        self.queue.borrow_mut().insert(handle, task);
        handle
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.queue.borrow_mut().remove(&handle);
    }
}

impl fmt::Debug for ManualFrames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualFrames")
            .field("pending", &self.pending())
            .field("ticks", &self.ticks.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_task(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> FrameTask {
        let log = log.clone();
        Box::new(move || log.borrow_mut().push(name))
    }

    #[test]
    fn test_tick_runs_in_request_order() {
        let frames = ManualFrames::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        frames.request_frame(log_task(&log, "a"));
        frames.request_frame(log_task(&log, "b"));

        assert_eq!(frames.pending(), 2);
        assert_eq!(frames.tick(), 2);
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        assert!(frames.is_idle());
        assert_eq!(frames.ticks(), 1);
    }

    #[test]
    fn test_cancelled_task_never_runs() {
        let frames = ManualFrames::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let handle = frames.request_frame(log_task(&log, "a"));
        frames.cancel_frame(handle);
        frames.cancel_frame(handle);

        assert_eq!(frames.tick(), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_requests_during_tick_wait_for_next_tick() {
        let frames = Rc::new(ManualFrames::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        let frames_clone = frames.clone();
        let log_clone = log.clone();
        frames.request_frame(Box::new(move || {
            log_clone.borrow_mut().push("first");
            frames_clone.request_frame(log_task(&log_clone, "second"));
        }));

        assert_eq!(frames.tick(), 1);
        assert_eq!(*log.borrow(), vec!["first"]);
        assert_eq!(frames.tick(), 1);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_slot_replaces_pending_task() {
        let frames = ManualFrames::new();
        let slot = RenderSlot::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        slot.submit(&frames, log_task(&log, "first"));
        slot.submit(&frames, log_task(&log, "second"));

        assert!(slot.is_pending());
        assert_eq!(frames.pending(), 1);

        frames.tick();
        assert_eq!(*log.borrow(), vec!["second"]);
        assert!(!slot.is_pending());
    }

    #[test]
    fn test_slot_cancel() {
        let frames = ManualFrames::new();
        let slot = RenderSlot::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        slot.submit(&frames, log_task(&log, "a"));
        slot.cancel(&frames);

        assert!(!slot.is_pending());
        assert_eq!(frames.tick(), 0);
    }

    #[test]
    fn test_run_until_idle() {
        let frames = Rc::new(ManualFrames::new());
        let remaining = Rc::new(Cell::new(3));

        fn chain(frames: Rc<ManualFrames>, remaining: Rc<Cell<u32>>) {
            let f = frames.clone();
            frames.request_frame(Box::new(move || {
                remaining.set(remaining.get() - 1);
                if remaining.get() > 0 {
                    chain(f, remaining);
                }
            }));
        }

        chain(frames.clone(), remaining.clone());
        assert_eq!(frames.run_until_idle(10), 3);
        assert_eq!(remaining.get(), 0);
    }
}
