use core::fmt;
use core::iter::FusedIterator;
use core::ptr::NonNull;

use crate::hash::HashMap;
use crate::link::Record;
use crate::list::{List, ListCore};
use crate::Weak;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    #[inline]
    fn step(self, record: &Record) -> Option<NonNull<Record>> {
        match self {
            Self::Forward => record.next(),
            Self::Reverse => record.prev(),
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub(crate) struct CursorId(u64);

#[derive(Debug, Clone, Copy)]
struct Cursor {
    direction: Direction,
    // The record the next call to `Iterator::next` yields.
    position: Option<NonNull<Record>>,
}

/// Live iterators of one list.
///
/// Every record release consults this registry so that no cursor is left
/// pointing at freed memory.
#[derive(Debug, Default)]
pub(crate) struct Cursors {
    registry: HashMap<CursorId, Cursor>,
    next_id: u64,
}

impl Cursors {
    fn register(&mut self, direction: Direction, position: Option<NonNull<Record>>) -> CursorId {
        let id = CursorId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.registry.insert(id, Cursor { direction, position });
        id
    }

    fn deregister(&mut self, id: CursorId) {
        self.registry.remove(&id);
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Move every cursor pending on `record` to the neighbor in its direction
    /// of travel.
    pub fn redirect(
        &mut self,
        record: NonNull<Record>,
        prev: Option<NonNull<Record>>,
        next: Option<NonNull<Record>>,
    ) {
        for cursor in self.registry.values_mut() {
            if cursor.position != Some(record) {
                continue;
            }
            cursor.position = match cursor.direction {
                Direction::Forward => next,
                Direction::Reverse => prev,
            };
        }
    }
}

/// An iterator over the members of a [`List`], front to back or back to front.
///
/// `Iter` yields a [`Weak`] reference per membership record, so an object added
/// twice is yielded twice.
///
/// The list may be mutated while it is iterated. If the element the iterator
/// would yield next is removed, either explicitly or because its object was
/// destroyed, the iterator moves on to that element's neighbor instead. Elements
/// appended to the list before a forward iterator reaches the end are yielded
/// too.
///
/// This struct is created by [`List::iter`] and [`List::iter_rev`].
///
/// # Examples
///
/// ```
/// use nullref::{List, Owned};
///
/// let a = Owned::new("a");
/// let b = Owned::new("b");
/// let c = Owned::new("c");
/// let list: List<&str> = [&a, &b, &c].into_iter().collect();
///
/// let mut seen = vec![];
/// for item in list.iter() {
///     let label = *item.get();
///     if label == "b" {
///         list.remove(&b);
///         list.remove(&c);
///     }
///     seen.push(label);
/// }
/// assert_eq!(seen, ["a", "b"]);
/// ```
pub struct Iter<'a, T> {
    list: &'a List<T>,
    id: Option<CursorId>,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(list: &'a List<T>, direction: Direction) -> Self {
        let core = list.core();
        let position = match direction {
            Direction::Forward => core.head(),
            Direction::Reverse => core.tail(),
        };
        let id = core.cursors().borrow_mut().register(direction, position);
        Self { list, id: Some(id) }
    }

    /// Advance the cursor past the next live record and return it.
    fn next_record(&mut self, core: &ListCore) -> Option<NonNull<Record>> {
        let id = self.id?;
        let mut cursors = core.cursors().borrow_mut();
        let cursor = cursors.registry.get_mut(&id)?;
        while let Some(record) = cursor.position {
            // SAFETY: positions are redirected before a record is freed, so a
            // registered position always points at a live allocation.
            let current = unsafe { record.as_ref() };
            cursor.position = cursor.direction.step(current);
            if current.is_live() {
                return Some(record);
            }
        }
        // Reaching the end deregisters the cursor.
        cursors.deregister(id);
        self.id = None;
        None
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = Weak<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let list = self.list;
        let core = list.core();
        let record = self.next_record(core)?;
        // SAFETY: `next_record` only returns live records and records of a
        // `List<T>` always point at an `ObjBox<T>`.
        unsafe {
            let object = record.as_ref().object()?;
            Some(Weak::register(object))
        }
    }
}

impl<'a, T> FusedIterator for Iter<'a, T> {}

impl<'a, T> Clone for Iter<'a, T> {
    fn clone(&self) -> Self {
        let core = self.list.core();
        let mut cursors = core.cursors().borrow_mut();
        let id = self
            .id
            .and_then(|id| cursors.registry.get(&id).copied())
            .map(|cursor| cursors.register(cursor.direction, cursor.position));
        Self {
            list: self.list,
            id,
        }
    }
}

impl<'a, T> Drop for Iter<'a, T> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.list.core().cursors().borrow_mut().deregister(id);
        }
    }
}

impl<'a, T> fmt::Debug for Iter<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.list.core();
        let cursors = core.cursors().borrow();
        let cursor = self.id.and_then(|id| cursors.registry.get(&id).copied());
        f.debug_struct("Iter")
            .field("direction", &cursor.map(|cursor| cursor.direction))
            .field("position", &cursor.and_then(|cursor| cursor.position))
            .finish()
    }
}
