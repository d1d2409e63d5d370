use core::mem;

use crate::ptr::{HeaderPtr, ObjBox};
use crate::Owned;

impl<T> Drop for Owned<T> {
    /// Destroys the object.
    ///
    /// Every [`Weak`] to the object becomes empty and every [`List`]
    /// membership of the object is removed, then the value is dropped.
    ///
    /// [`Weak`]: crate::Weak
    /// [`List`]: crate::List
    ///
    /// # Examples
    ///
    /// ```
    /// use nullref::{List, Owned};
    ///
    /// struct Node;
    ///
    /// impl Drop for Node {
    ///     fn drop(&mut self) {
    ///         println!("dropped!");
    ///     }
    /// }
    ///
    /// let node = Owned::new(Node);
    /// let weak = Owned::downgrade(&node);
    /// let list = List::new();
    /// list.add(&node);
    ///
    /// drop(node); // Prints "dropped!"
    /// assert!(weak.is_empty());
    /// assert!(list.is_empty());
    /// ```
    ///
    /// # Destruction Algorithm
    ///
    /// The object's allocation carries a header with an alive flag, a count of
    /// registered `Weak`s, and the set of membership records that include the
    /// object.
    ///
    /// Clearing the alive flag empties every `Weak` at once: a `Weak` checks
    /// the flag on every access, so none of them has to be visited.
    ///
    /// Each membership record is then handed to the list that owns it, which
    /// unlinks the record, moves any of its iterators pending on the record to
    /// the record's neighbor, and frees it. Memberships are visited through the
    /// object, so the cost is proportional to the number of memberships, not
    /// the size of the lists.
    ///
    /// The value is dropped next, unless a [`Guard`] returned by
    /// [`Weak::upgrade`] still borrows it, in which case the last guard drops
    /// it. The header is freed once no `Weak` refers to it.
    ///
    /// [`Guard`]: crate::Guard
    /// [`Weak::upgrade`]: crate::Weak::upgrade
    fn drop(&mut self) {
        let ptr = Owned::inner_ptr(self);
        let inner = self.inner();
        inner.kill();

        let memberships = mem::take(&mut *inner.header().memberships().borrow_mut());
        let detached = memberships.len();
        for record in memberships {
            // SAFETY: registered records are live, and a list frees its core
            // only after releasing all of its records.
            unsafe {
                let list = record.as_ref().list();
                trace!(
                    "nullref detaching record {:p} from list {:p}",
                    record,
                    list
                );
                list.as_ref().release(record);
            }
        }

        debug!(
            "nullref destroyed object {:p}, emptied {} weak references and detached {} memberships",
            ptr,
            Owned::weak_count(self),
            detached
        );

        if inner.pins() == 0 {
            // SAFETY: the object is dead so no new guard can pin the value,
            // none pins it now, and the owner's own borrows end here.
            unsafe {
                inner.drop_value();
            }
        } else {
            trace!(
                "nullref deferring drop of {:p} to its last guard",
                ptr
            );
        }

        // Release the owner's implicit registration. Holding it until now keeps
        // the header alive while the value's destructor drops `Weak`s to this
        // object.
        if inner.dec_weak() == 0 {
            // SAFETY: no `Weak` remains and the value has been dropped.
            unsafe {
                ObjBox::deallocate(ptr);
            }
        }
    }
}
