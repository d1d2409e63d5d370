use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ptr::NonNull;

use crate::iter::{Cursors, Direction, Iter};
use crate::link::Record;
use crate::observe::Observe;
use crate::ptr::Header;
use crate::Weak;

/// The heap-allocated state of a [`List`].
///
/// Records keep a back-link to their `ListCore`, so it must not move while the
/// list has members.
pub(crate) struct ListCore {
    head: Cell<Option<NonNull<Record>>>,
    tail: Cell<Option<NonNull<Record>>>,
    len: Cell<usize>,
    cursors: RefCell<Cursors>,
    sorting: Cell<bool>,
    // Records released during a sort pass. They stay linked until the pass
    // finishes so the pass never follows a freed record.
    deferred: RefCell<Vec<NonNull<Record>>>,
}

impl fmt::Debug for ListCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListCore")
            .field("head", &self.head.get())
            .field("tail", &self.tail.get())
            .field("len", &self.len.get())
            .field("cursors", &self.cursors)
            .field("sorting", &self.sorting.get())
            .finish()
    }
}

impl ListCore {
    fn allocate() -> NonNull<Self> {
        let core = Box::new(Self {
            head: Cell::new(None),
            tail: Cell::new(None),
            len: Cell::new(0),
            cursors: RefCell::new(Cursors::default()),
            sorting: Cell::new(false),
            deferred: RefCell::new(Vec::new()),
        });
        NonNull::from(Box::leak(core))
    }

    #[inline]
    pub fn head(&self) -> Option<NonNull<Record>> {
        self.head.get()
    }

    #[inline]
    pub fn tail(&self) -> Option<NonNull<Record>> {
        self.tail.get()
    }

    #[inline]
    pub fn set_head(&self, head: Option<NonNull<Record>>) {
        self.head.set(head);
    }

    #[inline]
    pub fn set_tail(&self, tail: Option<NonNull<Record>>) {
        self.tail.set(tail);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len.get()
    }

    #[inline]
    pub fn cursors(&self) -> &RefCell<Cursors> {
        &self.cursors
    }

    #[inline]
    pub fn is_sorting(&self) -> bool {
        self.sorting.get()
    }

    #[inline]
    pub fn set_sorting(&self, sorting: bool) {
        self.sorting.set(sorting);
    }

    /// Append a new record for `object` and register it with the object.
    pub fn push_back(&self, object: NonNull<Header>) {
        let record = Record::allocate(object, NonNull::from(self));
        let tail = self.tail.get();
        // SAFETY: `record` was just allocated and `tail`, if any, is a live
        // record of this list.
        unsafe {
            record.as_ref().set_prev(tail);
            match tail {
                Some(tail) => tail.as_ref().set_next(Some(record)),
                None => self.head.set(Some(record)),
            }
            object.as_ref().memberships().borrow_mut().insert(record);
        }
        self.tail.set(Some(record));
        self.len.set(self.len.get() + 1);
    }

    /// Remove exactly `record` from this list and from its object's
    /// memberships.
    ///
    /// This is the single removal routine used by `remove`, `clear`, list drop
    /// and object destruction. Releasing an already released record is a no-op.
    ///
    /// # Safety
    ///
    /// `record` must belong to this list and not have been freed.
    pub unsafe fn release(&self, record: NonNull<Record>) {
        let Some(object) = record.as_ref().take_object() else {
            return;
        };
        object.as_ref().memberships().borrow_mut().remove(record);
        self.len.set(self.len.get() - 1);
        if self.sorting.get() {
            trace!("nullref deferring release of record {:p} until sort completes", record);
            self.deferred.borrow_mut().push(record);
            return;
        }
        self.unlink(record);
        Record::deallocate(record);
    }

    /// Splice `record` out of the ordering chain and move every cursor pending
    /// on it to its neighbor.
    ///
    /// # Safety
    ///
    /// `record` must be linked into this list.
    unsafe fn unlink(&self, record: NonNull<Record>) {
        let prev = record.as_ref().prev();
        let next = record.as_ref().next();
        match prev {
            Some(prev) => prev.as_ref().set_next(next),
            None => self.head.set(next),
        }
        match next {
            Some(next) => next.as_ref().set_prev(prev),
            None => self.tail.set(prev),
        }
        self.cursors.borrow_mut().redirect(record, prev, next);
    }

    /// Free records whose release was deferred by a sort pass.
    pub fn sweep_deferred(&self) {
        let deferred = mem::take(&mut *self.deferred.borrow_mut());
        if deferred.is_empty() {
            return;
        }
        trace!(
            "nullref releasing {} records removed during sort",
            deferred.len()
        );
        for record in deferred {
            // SAFETY: deferred records stay linked until this sweep and are
            // not referenced by any object.
            unsafe {
                self.unlink(record);
                Record::deallocate(record);
            }
        }
    }

    /// Release every record of `object` in this list.
    pub fn remove_object(&self, object: NonNull<Header>) -> usize {
        // SAFETY: callers pass the header of a live object.
        let records = unsafe { object.as_ref() }
            .memberships()
            .borrow()
            .in_list(NonNull::from(self));
        for &record in &records {
            // SAFETY: `in_list` only yields live records of this list.
            unsafe {
                self.release(record);
            }
        }
        records.len()
    }

    pub fn count_object(&self, object: NonNull<Header>) -> usize {
        // SAFETY: callers pass the header of a live object.
        unsafe { object.as_ref() }
            .memberships()
            .borrow()
            .count_in_list(NonNull::from(self))
    }

    /// Release every record, front to back.
    pub fn clear(&self) -> usize {
        let mut released = 0;
        let mut cursor = self.head.get();
        while let Some(record) = cursor {
            // SAFETY: `record` is linked into this list. Its successor is read
            // before `release` may free it.
            unsafe {
                cursor = record.as_ref().next();
                if record.as_ref().is_live() {
                    released += 1;
                }
                self.release(record);
            }
        }
        released
    }

    /// The first live record from `start` walking in `direction`.
    fn first_live(
        start: Option<NonNull<Record>>,
        direction: Direction,
    ) -> Option<NonNull<Header>> {
        let mut cursor = start;
        while let Some(record) = cursor {
            // SAFETY: linked records are live allocations.
            let record = unsafe { record.as_ref() };
            if let Some(object) = record.object() {
                return Some(object);
            }
            cursor = match direction {
                Direction::Forward => record.next(),
                Direction::Reverse => record.prev(),
            };
        }
        None
    }
}

/// An intrusive, non-owning list of observed objects.
///
/// A `List<T>` records that some [`Owned<T>`] objects belong to a relationship,
/// such as "the children of this node" or "the registered providers", without
/// owning them. An object may belong to many lists at once, and to the same
/// list more than once. When an object is destroyed it disappears from every
/// list it belonged to, and any iterator that was about to yield it moves on to
/// its neighbor.
///
/// All operations take `&self`, so a list may be modified while it is being
/// iterated.
///
/// [`Owned<T>`]: crate::Owned
///
/// # Examples
///
/// ```
/// use nullref::{List, Owned};
///
/// let a = Owned::new("a");
/// let b = Owned::new("b");
///
/// let list = List::new();
/// list.add(&a);
/// list.add(&b);
/// list.add(&a);
/// assert_eq!(list.len(), 3);
///
/// drop(a);
/// assert_eq!(list.len(), 1);
/// assert_eq!(*list.first().unwrap().get(), "b");
/// ```
pub struct List<T> {
    core: NonNull<ListCore>,
    phantom: PhantomData<Weak<T>>,
}

impl<T> List<T> {
    /// Constructs an empty `List<T>`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: ListCore::allocate(),
            phantom: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn core(&self) -> &ListCore {
        // SAFETY: the core is freed only when the list is dropped.
        unsafe { self.core.as_ref() }
    }

    /// Append `object` to the end of the list.
    ///
    /// Adding an object that is already a member adds a second membership.
    /// Adding an empty [`Weak`] has no effect.
    pub fn add<O>(&self, object: &O)
    where
        O: Observe<T> + ?Sized,
    {
        if let Some(header) = object.live_header() {
            self.core().push_back(header);
        }
    }

    /// Remove every membership of `object` in this list and return how many
    /// were removed.
    ///
    /// Removing an empty [`Weak`] or a non-member has no effect and returns
    /// `0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use nullref::{List, Owned};
    ///
    /// let a = Owned::new(1);
    /// let b = Owned::new(2);
    /// let list: List<i32> = [&a, &b, &a].into_iter().collect();
    ///
    /// assert_eq!(list.remove(&a), 2);
    /// assert_eq!(list.remove(&a), 0);
    /// assert_eq!(list.len(), 1);
    /// ```
    pub fn remove<O>(&self, object: &O) -> usize
    where
        O: Observe<T> + ?Sized,
    {
        match object.live_header() {
            Some(header) => self.core().remove_object(header),
            None => 0,
        }
    }

    /// Remove every membership from the list.
    pub fn clear(&self) {
        let released = self.core().clear();
        if released > 0 {
            debug!("nullref cleared {} memberships from list", released);
        }
    }

    /// Keep only the objects for which `keep` returns `true`.
    ///
    /// `keep` is called once per membership in order. When it returns `false`
    /// every membership of that object in this list is removed. `keep` may
    /// modify the list.
    pub fn retain<F>(&self, mut keep: F)
    where
        F: FnMut(&Weak<T>) -> bool,
    {
        for item in self.iter() {
            if !keep(&item) {
                self.remove(&item);
            }
        }
    }

    /// The number of memberships in the list.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.core().len()
    }

    /// Returns `true` if the list has no members.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `object` is a member of this list.
    #[must_use]
    pub fn contains<O>(&self, object: &O) -> bool
    where
        O: Observe<T> + ?Sized,
    {
        self.count(object) > 0
    }

    /// The number of memberships `object` has in this list.
    #[must_use]
    pub fn count<O>(&self, object: &O) -> usize
    where
        O: Observe<T> + ?Sized,
    {
        match object.live_header() {
            Some(header) => self.core().count_object(header),
            None => 0,
        }
    }

    /// A [`Weak`] to the first member, or [`None`] if the list is empty.
    #[must_use]
    pub fn first(&self) -> Option<Weak<T>> {
        let header = ListCore::first_live(self.core().head(), Direction::Forward)?;
        // SAFETY: live records of a `List<T>` point at live `ObjBox<T>`s.
        Some(unsafe { Weak::register(header) })
    }

    /// A [`Weak`] to the last member, or [`None`] if the list is empty.
    #[must_use]
    pub fn last(&self) -> Option<Weak<T>> {
        let header = ListCore::first_live(self.core().tail(), Direction::Reverse)?;
        // SAFETY: live records of a `List<T>` point at live `ObjBox<T>`s.
        Some(unsafe { Weak::register(header) })
    }

    /// Collect a [`Weak`] for every membership, in order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Weak<T>> {
        self.iter().collect()
    }

    /// Iterate over the members front to back.
    ///
    /// See [`Iter`] for how iteration behaves when the list is modified.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self, Direction::Forward)
    }

    /// Iterate over the members back to front.
    ///
    /// See [`Iter`] for how iteration behaves when the list is modified.
    pub fn iter_rev(&self) -> Iter<'_, T> {
        Iter::new(self, Direction::Reverse)
    }
}

impl<T> Drop for List<T> {
    /// Removes every remaining membership, then frees the list.
    fn drop(&mut self) {
        let core = self.core();
        let released = core.clear();
        if released > 0 {
            debug!("nullref dropped list with {} memberships", released);
        }
        // SAFETY: no record refers to the core anymore and no iterator can
        // outlive the `&List` it borrows.
        unsafe {
            drop(Box::from_raw(self.core.as_ptr()));
        }
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = Weak<T>;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, O> Extend<&'a O> for List<T>
where
    O: Observe<T> + ?Sized + 'a,
{
    fn extend<I: IntoIterator<Item = &'a O>>(&mut self, iter: I) {
        for object in iter {
            self.add(object);
        }
    }
}

impl<'a, T, O> FromIterator<&'a O> for List<T>
where
    O: Observe<T> + ?Sized + 'a,
{
    fn from_iter<I: IntoIterator<Item = &'a O>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

#[cfg(test)]
mod tests {
    use crate::{List, Owned, Weak};

    #[test]
    fn add_appends_in_order() {
        let a = Owned::new(1);
        let b = Owned::new(2);
        let c = Owned::new(3);
        let list = List::new();
        list.add(&a);
        list.add(&Owned::downgrade(&b));
        list.add(&c);
        let order = list.iter().map(|item| *item.get()).collect::<Vec<_>>();
        assert_eq!(order, [1, 2, 3]);
        assert_eq!(list.len(), 3);
        assert_eq!(Owned::membership_count(&b), 1);
    }

    #[test]
    fn add_and_remove_empty_are_noops() {
        let list = List::<u8>::new();
        list.add(&Weak::new());
        assert!(list.is_empty());
        assert_eq!(list.remove(&Weak::new()), 0);
        let outsider = Owned::new(9);
        assert_eq!(list.remove(&outsider), 0);
        assert!(!list.contains(&outsider));
    }

    #[test]
    fn remove_drops_every_duplicate() {
        let a = Owned::new('a');
        let b = Owned::new('b');
        let list: List<char> = [&a, &b, &a, &a].into_iter().collect();
        assert_eq!(list.count(&a), 3);
        assert_eq!(list.remove(&a), 3);
        assert_eq!(list.len(), 1);
        assert_eq!(Owned::membership_count(&a), 0);
        assert_eq!(list.first(), list.last());
        assert!(list.first().unwrap() == b);
    }

    #[test]
    fn clear_detaches_objects() {
        let a = Owned::new(1);
        let list = List::new();
        list.add(&a);
        list.add(&a);
        list.clear();
        assert!(list.is_empty());
        assert!(list.first().is_none());
        assert_eq!(Owned::membership_count(&a), 0);
        list.add(&a);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn memberships_in_other_lists_are_untouched() {
        let a = Owned::new(1);
        let left = List::new();
        let right = List::new();
        left.add(&a);
        right.add(&a);
        assert_eq!(Owned::membership_count(&a), 2);
        left.remove(&a);
        assert!(right.contains(&a));
        assert_eq!(Owned::membership_count(&a), 1);
    }

    #[test]
    fn dropping_list_detaches_objects() {
        let a = Owned::new(1);
        let list = List::new();
        list.add(&a);
        list.add(&a);
        drop(list);
        assert_eq!(Owned::membership_count(&a), 0);
    }

    #[test]
    fn retain_removes_rejected_objects() {
        let objects = (0..6).map(Owned::new).collect::<Vec<_>>();
        let list: List<i32> = objects.iter().collect();
        list.retain(|item| *item.get() % 2 == 0);
        let order = list.iter().map(|item| *item.get()).collect::<Vec<_>>();
        assert_eq!(order, [0, 2, 4]);
    }

    #[test]
    fn list_may_move_while_populated() {
        let a = Owned::new(1);
        let list = List::new();
        list.add(&a);
        let moved = Box::new(list);
        drop(a);
        assert!(moved.is_empty());
    }

    #[test]
    fn debug_lists_members() {
        let list = List::<u8>::new();
        assert_eq!(format!("{list:?}"), "[]");
    }
}
