use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

/// Deferred "next tick" queue.
///
/// Work scheduled with [`next`](RunLoop::next) runs at the following
/// [`flush`](RunLoop::flush), never synchronously. Whoever owns the event
/// loop decides when that is: the browser binding flushes from a microtask
/// via the waker, tests and the simulator call `flush` by hand.
#[derive(Default)]
pub struct RunLoop {
    queue: RefCell<VecDeque<Task>>,
    waker: RefCell<Option<Rc<dyn Fn()>>>,
    flushing: Cell<bool>,
}

impl RunLoop {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Called whenever the queue goes from empty to non-empty.
    pub fn set_waker(&self, waker: impl Fn() + 'static) {
        *self.waker.borrow_mut() = Some(Rc::new(waker));
    }

    pub fn next(&self, task: impl FnOnce() + 'static) {
        let was_empty = {
            let mut queue = self.queue.borrow_mut();
            let was_empty = queue.is_empty();
            queue.push_back(Box::new(task));
            was_empty
        };
        if was_empty {
            let waker = self.waker.borrow().clone();
            if let Some(waker) = waker {
                waker();
            }
        }
    }

    /// Run every task queued before this call.
    ///
    /// Tasks scheduled while flushing are left for the next flush. A nested
    /// call from inside a task does nothing and returns 0.
    pub fn flush(&self) -> usize {
        if self.flushing.replace(true) {
            return 0;
        }
        let _guard = FlushGuard(&self.flushing);
        let batch = std::mem::take(&mut *self.queue.borrow_mut());
        let count = batch.len();
        for task in batch {
            task();
        }
        tracing::trace!(count, pending = self.pending(), "run loop flushed");
        count
    }

    /// Flush until the queue stays empty, up to `max_rounds` flushes.
    /// Returns the total number of tasks run.
    pub fn settle(&self, max_rounds: usize) -> usize {
        let mut total = 0;
        for _ in 0..max_rounds {
            if self.pending() == 0 {
                break;
            }
            total += self.flush();
        }
        total
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Drop every pending task without running it.
    pub fn clear(&self) {
        let dropped = std::mem::take(&mut *self.queue.borrow_mut());
        tracing::trace!(count = dropped.len(), "run loop cleared");
    }
}

/// Clears the flushing flag even when a task unwinds.
struct FlushGuard<'a>(&'a Cell<bool>);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl fmt::Debug for RunLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunLoop")
            .field("pending", &self.pending())
            .field("flushing", &self.flushing.get())
            .finish()
    }
}
