//! Ordered queue of deferred actions.
//!
//! Actions that must not run while classes are still being entered (static
//! member imports, anything attribution hands back) are queued with
//! [`Annotate::later`] and run in enqueue order by
//! [`crate::Enter::flush_annotations`] once the queue is unblocked.

use crate::error::EnterResult;
use crate::state::Enter;
use std::collections::VecDeque;
use std::fmt;

pub type Deferred = Box<dyn FnOnce(&mut Enter) -> EnterResult<()>>;

#[derive(Default)]
pub struct Annotate {
    queue: VecDeque<Deferred>,
    block_count: u32,
}

impl Annotate {
    pub fn new() -> Self {
        Annotate::default()
    }

    pub fn later(&mut self, action: impl FnOnce(&mut Enter) -> EnterResult<()> + 'static) {
        self.queue.push_back(Box::new(action));
    }

    pub fn block(&mut self) {
        self.block_count += 1;
    }

    pub fn unblock(&mut self) {
        self.block_count = self.block_count.saturating_sub(1);
    }

    pub fn is_blocked(&self) -> bool {
        self.block_count > 0
    }

    pub(crate) fn pop(&mut self) -> Option<Deferred> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl fmt::Debug for Annotate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Annotate")
            .field("pending", &self.queue.len())
            .field("block_count", &self.block_count)
            .finish()
    }
}
