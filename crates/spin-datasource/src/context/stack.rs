//! Per-thread storage for every holder's stack.
//!
//! Entries are keyed by holder id and removed as soon as their stack is
//! empty, so a pooled thread carries nothing between requests. Borrows never
//! outlive a single call, which keeps interceptors free to re-enter the
//! holder.

use core::cell::RefCell;
use std::collections::HashMap;

use crate::CurrentDatasourceInfo;

thread_local! {
    static STACKS: RefCell<HashMap<u64, Vec<CurrentDatasourceInfo>>> =
        RefCell::new(HashMap::new());
}

pub(crate) fn push(holder: u64, info: CurrentDatasourceInfo) {
    STACKS.with_borrow_mut(|stacks| stacks.entry(holder).or_default().push(info));
}

pub(crate) fn pop(holder: u64) -> Option<CurrentDatasourceInfo> {
    STACKS.with_borrow_mut(|stacks| {
        let stack = stacks.get_mut(&holder)?;
        let top = stack.pop();
        if stack.is_empty() {
            stacks.remove(&holder);
        }
        top
    })
}

pub(crate) fn peek(holder: u64) -> Option<CurrentDatasourceInfo> {
    STACKS.with_borrow(|stacks| stacks.get(&holder).and_then(|stack| stack.last().cloned()))
}

pub(crate) fn depth(holder: u64) -> usize {
    STACKS.with_borrow(|stacks| stacks.get(&holder).map_or(0, Vec::len))
}

pub(crate) fn contains(holder: u64) -> bool {
    STACKS.with_borrow(|stacks| stacks.contains_key(&holder))
}

pub(crate) fn remove(holder: u64) -> usize {
    // Thread-local may already be gone when a holder drops during thread
    // teardown.
    STACKS
        .try_with(|stacks| {
            stacks
                .borrow_mut()
                .remove(&holder)
                .map_or(0, |stack| stack.len())
        })
        .unwrap_or(0)
}

#[cfg(test)]
pub(crate) fn entries() -> usize {
    STACKS.with_borrow(HashMap::len)
}
