use core::borrow::Borrow;
use core::fmt;
use core::marker::PhantomData;
use core::ops::Deref;
use core::ptr::{self, NonNull};

use crate::ptr::{HeaderPtr, ObjBox};
use crate::Weak;

#[cfg(test)]
mod tests;

/// The owning handle of an observed object.
///
/// `Owned<T>` places a `T` on the heap and is its only owner: it is not
/// [`Clone`], and dropping it destroys the value. Any number of [`Weak`]
/// references and [`List`] memberships may observe the object while it lives.
/// Dropping the `Owned` empties every such `Weak` and removes the object from
/// every `List` in the same step, no matter how many there are or where they
/// are stored.
///
/// `Owned<T>` automatically dereferences to `T`. Mutation goes through interior
/// mutability such as [`RefCell`], since `Weak` references may be reading the
/// value.
///
/// The inherent functions of `Owned` are associated functions, called as
/// `Owned::downgrade(&owner)`, so they cannot be shadowed by methods on `T`.
///
/// [`List`]: crate::List
/// [`RefCell`]: core::cell::RefCell
///
/// # Examples
///
/// ```
/// use std::cell::RefCell;
/// use nullref::Owned;
///
/// let owner = Owned::new(RefCell::new(vec![1, 2]));
/// let weak = Owned::downgrade(&owner);
///
/// weak.get().borrow_mut().push(3);
/// assert_eq!(*owner.borrow(), [1, 2, 3]);
///
/// drop(owner);
/// assert!(weak.is_empty());
/// ```
pub struct Owned<T> {
    ptr: NonNull<ObjBox<T>>,
    phantom: PhantomData<ObjBox<T>>,
}

impl<T> Owned<T> {
    /// Constructs a new `Owned<T>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use nullref::Owned;
    ///
    /// let five = Owned::new(5);
    /// assert_eq!(*five, 5);
    /// ```
    pub fn new(value: T) -> Self {
        Self {
            ptr: ObjBox::allocate(value),
            phantom: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn inner(&self) -> &ObjBox<T> {
        // SAFETY: the allocation lives at least as long as its owner.
        unsafe { self.ptr.as_ref() }
    }

    #[inline]
    pub(crate) fn inner_ptr(this: &Self) -> NonNull<ObjBox<T>> {
        this.ptr
    }

    /// Creates a new [`Weak`] reference to this object.
    ///
    /// # Examples
    ///
    /// ```
    /// use nullref::Owned;
    ///
    /// let five = Owned::new(5);
    /// let weak_five = Owned::downgrade(&five);
    /// assert!(weak_five == five);
    /// ```
    #[must_use]
    pub fn downgrade(this: &Self) -> Weak<T> {
        // SAFETY: `this` is alive, so its header belongs to a live
        // `ObjBox<T>`.
        unsafe { Weak::register(ObjBox::as_header(this.ptr)) }
    }

    /// Gets the number of [`Weak`] references to this object.
    ///
    /// # Examples
    ///
    /// ```
    /// use nullref::Owned;
    ///
    /// let five = Owned::new(5);
    /// let _weak_five = Owned::downgrade(&five);
    ///
    /// assert_eq!(1, Owned::weak_count(&five));
    /// ```
    #[inline]
    #[must_use]
    pub fn weak_count(this: &Self) -> usize {
        // Discount the implicit registration held by `this`.
        this.inner().weak() - 1
    }

    /// Gets the number of [`List`] memberships of this object, counting an
    /// object added to the same list twice as two memberships.
    ///
    /// [`List`]: crate::List
    ///
    /// # Examples
    ///
    /// ```
    /// use nullref::{List, Owned};
    ///
    /// let five = Owned::new(5);
    /// let list = List::new();
    /// list.add(&five);
    /// list.add(&five);
    ///
    /// assert_eq!(2, Owned::membership_count(&five));
    /// ```
    #[inline]
    #[must_use]
    pub fn membership_count(this: &Self) -> usize {
        this.inner().membership_count()
    }

    /// Provides a raw pointer to the value.
    ///
    /// The pointer is valid as long as the `Owned` is alive.
    #[inline]
    #[must_use]
    pub fn as_ptr(this: &Self) -> *const T {
        this.inner().value_ptr()
    }

    /// Returns `true` if the two `Owned`s are the same object.
    ///
    /// Distinct `Owned`s never share an object, so this is only `true` when
    /// both arguments are the same handle.
    #[inline]
    #[must_use]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        ptr::eq(this.ptr.as_ptr(), other.ptr.as_ptr())
    }
}

impl<T> Deref for Owned<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // SAFETY: the value is initialized until the owner is dropped.
        unsafe { &*self.inner().value_ptr() }
    }
}

impl<T> AsRef<T> for Owned<T> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T> Borrow<T> for Owned<T> {
    fn borrow(&self) -> &T {
        self
    }
}

impl<T: Default> Default for Owned<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for Owned<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Owned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: fmt::Display> fmt::Display for Owned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

impl<T> fmt::Pointer for Owned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&Owned::as_ptr(self), f)
    }
}
