use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::Cell;
use core::fmt;
use core::ptr::NonNull;

use crate::hash::HashSet;
use crate::list::ListCore;
use crate::ptr::Header;

/// One membership of an observed object in one list.
///
/// A live record is linked into its list's ordering chain through
/// `prev`/`next` and registered in its object's [`Memberships`]. Releasing a
/// record clears `object`; a record with no object is either about to be
/// freed or waiting for a sort pass to finish.
pub(crate) struct Record {
    object: Cell<Option<NonNull<Header>>>,
    list: NonNull<ListCore>,
    prev: Cell<Option<NonNull<Record>>>,
    next: Cell<Option<NonNull<Record>>>,
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("object", &self.object.get())
            .field("list", &self.list)
            .field("prev", &self.prev.get())
            .field("next", &self.next.get())
            .finish()
    }
}

impl Record {
    #[inline]
    pub fn allocate(object: NonNull<Header>, list: NonNull<ListCore>) -> NonNull<Self> {
        let record = Box::new(Self {
            object: Cell::new(Some(object)),
            list,
            prev: Cell::new(None),
            next: Cell::new(None),
        });
        NonNull::from(Box::leak(record))
    }

    /// # Safety
    ///
    /// `this` must have been returned by [`Record::allocate`], be unlinked from
    /// its list and deregistered from its object, and not be used afterward.
    #[inline]
    pub unsafe fn deallocate(this: NonNull<Self>) {
        drop(Box::from_raw(this.as_ptr()));
    }

    #[inline]
    pub fn object(&self) -> Option<NonNull<Header>> {
        self.object.get()
    }

    #[inline]
    pub fn take_object(&self) -> Option<NonNull<Header>> {
        self.object.take()
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.object.get().is_some()
    }

    #[inline]
    pub fn list(&self) -> NonNull<ListCore> {
        self.list
    }

    #[inline]
    pub fn prev(&self) -> Option<NonNull<Record>> {
        self.prev.get()
    }

    #[inline]
    pub fn next(&self) -> Option<NonNull<Record>> {
        self.next.get()
    }

    #[inline]
    pub fn set_prev(&self, prev: Option<NonNull<Record>>) {
        self.prev.set(prev);
    }

    #[inline]
    pub fn set_next(&self, next: Option<NonNull<Record>>) {
        self.next.set(next);
    }
}

/// The set of records through which an object is a member of some list.
///
/// An object added to the same list twice owns two distinct records.
#[derive(Default)]
pub(crate) struct Memberships {
    registry: HashSet<NonNull<Record>>,
}

impl fmt::Debug for Memberships {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memberships")
            .field("registry", &self.registry)
            .finish()
    }
}

impl Memberships {
    #[inline]
    pub fn insert(&mut self, record: NonNull<Record>) {
        self.registry.insert(record);
    }

    #[inline]
    pub fn remove(&mut self, record: NonNull<Record>) {
        self.registry.remove(&record);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Collect the records of this object that belong to `list`.
    pub fn in_list(&self, list: NonNull<ListCore>) -> Vec<NonNull<Record>> {
        self.registry
            .iter()
            .copied()
            .filter(|record| {
                // SAFETY: registered records are live allocations.
                let record = unsafe { record.as_ref() };
                record.list() == list
            })
            .collect()
    }

    pub fn count_in_list(&self, list: NonNull<ListCore>) -> usize {
        self.registry
            .iter()
            .filter(|record| {
                // SAFETY: registered records are live allocations.
                let record = unsafe { record.as_ref() };
                record.list() == list
            })
            .count()
    }
}

impl IntoIterator for Memberships {
    type Item = NonNull<Record>;
    type IntoIter = hashbrown::hash_set::IntoIter<NonNull<Record>>;

    fn into_iter(self) -> Self::IntoIter {
        self.registry.into_iter()
    }
}
