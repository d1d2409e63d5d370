use core::cmp::Ordering;
use core::ptr::NonNull;

use crate::link::Record;
use crate::list::{List, ListCore};
use crate::Weak;

impl<T> List<T> {
    /// Sort the list in place with a comparator function.
    ///
    /// This sort is stable: members that compare equal keep their relative
    /// order. It reorders the membership records themselves rather than their
    /// contents, so an iterator that is about to yield a member still yields
    /// that same member after the sort.
    ///
    /// The sort is an adjacent-exchange pass: whenever a member compares
    /// greater than its successor the two are exchanged, and the successor
    /// keeps moving toward the front until it settles before the pass
    /// continues. It performs `O(n²)` comparisons in the worst case and always
    /// terminates, even for comparators that are not a total order.
    ///
    /// `compare` may inspect or modify the list. Members removed while sorting
    /// are no longer yielded, and calling `sort_by` from within `compare` has
    /// no effect.
    ///
    /// # Examples
    ///
    /// ```
    /// use nullref::{List, Owned};
    ///
    /// let c = Owned::new("c");
    /// let a = Owned::new("a");
    /// let b = Owned::new("b");
    /// let list: List<&str> = [&c, &a, &b].into_iter().collect();
    ///
    /// list.sort_by(|left, right| left.get().cmp(&*right.get()));
    ///
    /// let labels = list.iter().map(|item| *item.get()).collect::<Vec<_>>();
    /// assert_eq!(labels, ["a", "b", "c"]);
    /// ```
    pub fn sort_by<F>(&self, mut compare: F)
    where
        F: FnMut(&Weak<T>, &Weak<T>) -> Ordering,
    {
        let core = self.core();
        if core.is_sorting() {
            return;
        }
        let pass = SortPass::begin(core);

        let mut exchanges = 0_usize;
        // Last record of the sorted prefix.
        let mut sorted_end = core.head();
        while let Some(end) = sorted_end {
            // SAFETY: records are not freed while `sorting` is set.
            let Some(record) = (unsafe { end.as_ref() }).next() else {
                break;
            };
            let mut moved = false;
            // SAFETY: as above.
            while let Some(prev) = unsafe { record.as_ref() }.prev() {
                // SAFETY: as above.
                if !unsafe { out_of_order(prev, record, &mut compare) } {
                    break;
                }
                // SAFETY: `record` directly follows `prev` in this list.
                unsafe {
                    exchange(core, prev, record);
                }
                exchanges += 1;
                moved = true;
            }
            if !moved {
                sorted_end = Some(record);
            }
        }

        drop(pass);
        debug!(
            "nullref sorted list of {} members with {} exchanges",
            core.len(),
            exchanges
        );
    }

    /// Sort the list in place by a key extracted from each member's value.
    ///
    /// This is [`sort_by`] comparing `key(a)` with `key(b)`, and is stable.
    ///
    /// [`sort_by`]: List::sort_by
    ///
    /// # Examples
    ///
    /// ```
    /// use nullref::{List, Owned};
    ///
    /// let long = Owned::new("ccc");
    /// let short = Owned::new("a");
    /// let list: List<&str> = [&long, &short].into_iter().collect();
    ///
    /// list.sort_by_key(|label| label.len());
    /// assert!(list.first().unwrap() == short);
    /// ```
    pub fn sort_by_key<K, F>(&self, mut key: F)
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        self.sort_by(|left, right| match (left.upgrade(), right.upgrade()) {
            (Some(left), Some(right)) => key(&left).cmp(&key(&right)),
            _ => Ordering::Equal,
        });
    }
}

/// Marks a list as being sorted until dropped, including when the comparator
/// panics.
struct SortPass<'a> {
    core: &'a ListCore,
}

impl<'a> SortPass<'a> {
    fn begin(core: &'a ListCore) -> Self {
        core.set_sorting(true);
        Self { core }
    }
}

impl<'a> Drop for SortPass<'a> {
    fn drop(&mut self) {
        self.core.set_sorting(false);
        self.core.sweep_deferred();
    }
}

/// Returns `true` if `current` must move after `next`.
///
/// Records released during the sort compare greater than every live record, so
/// they sink to the end instead of pinning live records in place.
///
/// # Safety
///
/// Both records must be linked into a list that is being sorted.
unsafe fn out_of_order<T, F>(current: NonNull<Record>, next: NonNull<Record>, compare: &mut F) -> bool
where
    F: FnMut(&Weak<T>, &Weak<T>) -> Ordering,
{
    let (Some(left), Some(right)) = (current.as_ref().object(), next.as_ref().object()) else {
        return !current.as_ref().is_live();
    };
    let left = Weak::<T>::register(left);
    let right = Weak::<T>::register(right);
    compare(&left, &right) == Ordering::Greater
}

/// Swap two adjacent records in the ordering chain.
///
/// # Safety
///
/// `next` must directly follow `current` in the list owning `core`.
unsafe fn exchange(core: &ListCore, current: NonNull<Record>, next: NonNull<Record>) {
    let before = current.as_ref().prev();
    let after = next.as_ref().next();

    next.as_ref().set_prev(before);
    next.as_ref().set_next(Some(current));
    current.as_ref().set_prev(Some(next));
    current.as_ref().set_next(after);

    match before {
        Some(before) => before.as_ref().set_next(Some(next)),
        None => core.set_head(Some(next)),
    }
    match after {
        Some(after) => after.as_ref().set_prev(Some(current)),
        None => core.set_tail(Some(current)),
    }
}
