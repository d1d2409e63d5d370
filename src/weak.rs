use core::any::{Any, TypeId};
use core::fmt;
use core::marker::PhantomData;
use core::mem::ManuallyDrop;
use core::ops::Deref;
use core::ptr::{self, NonNull};

use crate::ptr::{Header, HeaderPtr, ObjBox};
use crate::Owned;

/// `Weak` is a non-owning reference to the value behind an [`Owned`] that
/// empties itself when the `Owned` is dropped.
///
/// A `Weak` is obtained with [`Owned::downgrade`], by cloning another `Weak`,
/// or by iterating a [`List`]. It never dangles: once the owner destroys the
/// object every `Weak` to it tests empty, compares equal to [`Weak::new`], and
/// [`upgrade`] returns [`None`]. The owner does not need to know where its weak
/// references live to empty them.
///
/// `Weak` does not keep the value alive. It only keeps a small header
/// allocation alive until the last `Weak` to a destroyed object is dropped.
///
/// Equality compares the address of the referenced object, never the value.
///
/// [`List`]: crate::List
/// [`upgrade`]: Weak::upgrade
///
/// # Examples
///
/// ```
/// use nullref::{Owned, Weak};
///
/// let owner = Owned::new(5);
/// let weak = Owned::downgrade(&owner);
/// assert_eq!(*weak.get(), 5);
/// assert!(weak == owner);
///
/// drop(owner);
/// assert!(weak.is_empty());
/// assert!(weak.upgrade().is_none());
/// assert_eq!(weak, Weak::new());
/// ```
pub struct Weak<T> {
    ptr: Option<NonNull<ObjBox<T>>>,
    phantom: PhantomData<ObjBox<T>>,
}

impl<T> Weak<T> {
    /// Constructs an empty `Weak<T>` that refers to no object.
    ///
    /// # Examples
    ///
    /// ```
    /// use nullref::Weak;
    ///
    /// let empty: Weak<i64> = Weak::new();
    /// assert!(empty.upgrade().is_none());
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ptr: None,
            phantom: PhantomData,
        }
    }

    /// Register a new `Weak` on the object behind `header`.
    ///
    /// # Safety
    ///
    /// `header` must point at the header of a live `ObjBox<T>`.
    pub(crate) unsafe fn register(header: NonNull<Header>) -> Self {
        header.as_ref().inc_weak();
        Self {
            ptr: Some(ObjBox::from_header(header)),
            phantom: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn raw(&self) -> Option<NonNull<ObjBox<T>>> {
        self.ptr
    }

    /// The registered allocation if its object has not been destroyed.
    #[inline]
    fn live(&self) -> Option<NonNull<ObjBox<T>>> {
        let ptr = self.ptr?;
        // SAFETY: a registered `Weak` keeps its allocation alive.
        if unsafe { ptr.as_ref() }.is_alive() {
            Some(ptr)
        } else {
            None
        }
    }

    /// Returns `true` if the referenced object has not been destroyed.
    ///
    /// An empty `Weak` returns `false`.
    #[inline]
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.live().is_some()
    }

    /// Returns `true` if this `Weak` refers to no object, either because it
    /// was never assigned or because its object has been destroyed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.is_alive()
    }

    /// Borrow the referenced value, or return [`None`] if this `Weak` is
    /// empty.
    ///
    /// The returned [`Guard`] keeps the value from being dropped while it is
    /// held, even if the owner is dropped in the meantime. It does not delay
    /// the object's destruction otherwise: once the owner is gone, this and
    /// every other `Weak` are empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use nullref::Owned;
    ///
    /// let owner = Owned::new(String::from("node"));
    /// let weak = Owned::downgrade(&owner);
    ///
    /// let guard = weak.upgrade().unwrap();
    /// drop(owner);
    /// assert_eq!(guard.as_str(), "node");
    /// assert!(weak.is_empty());
    /// ```
    #[must_use]
    pub fn upgrade(&self) -> Option<Guard<'_, T>> {
        let ptr = self.live()?;
        // SAFETY: `live` checked the object is alive.
        unsafe { ptr.as_ref() }.inc_pins();
        Some(Guard {
            ptr,
            phantom: PhantomData,
        })
    }

    /// Borrow the referenced value.
    ///
    /// Callers must check [`is_alive`] first, or use [`upgrade`] instead.
    ///
    /// [`is_alive`]: Weak::is_alive
    /// [`upgrade`]: Weak::upgrade
    ///
    /// # Panics
    ///
    /// Panics if this `Weak` is empty. Dereferencing an empty `Weak` is a
    /// programming error.
    #[must_use]
    #[track_caller]
    pub fn get(&self) -> Guard<'_, T> {
        match self.upgrade() {
            Some(guard) => guard,
            None => panic!("dereferenced an empty nullref::Weak"),
        }
    }

    /// Point this `Weak` at `target`, deregistering from its previous object
    /// first.
    ///
    /// # Examples
    ///
    /// ```
    /// use nullref::Owned;
    ///
    /// let first = Owned::new(1);
    /// let second = Owned::new(2);
    /// let mut weak = Owned::downgrade(&first);
    /// weak.set(&second);
    /// assert_eq!(Owned::weak_count(&first), 0);
    /// assert_eq!(Owned::weak_count(&second), 1);
    /// ```
    pub fn set(&mut self, target: &Owned<T>) {
        self.clear();
        *self = Owned::downgrade(target);
    }

    /// Deregister from the referenced object, if any, and become empty.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Returns a raw pointer to the referenced value, or a null pointer if this
    /// `Weak` is empty.
    ///
    /// The pointer is only valid while the object is alive.
    #[must_use]
    pub fn as_ptr(&self) -> *const T {
        match self.live() {
            // SAFETY: `live` checked the object is alive.
            Some(ptr) => unsafe { ptr.as_ref() }.value_ptr(),
            None => ptr::null(),
        }
    }

    /// Returns `true` if the two `Weak`s refer to the same object, or are both
    /// empty.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        ptr::eq(self.as_ptr(), other.as_ptr())
    }

    /// The number of `Weak`s registered on the referenced object, including
    /// this one.
    ///
    /// Returns `0` if this `Weak` is empty.
    #[must_use]
    pub fn weak_count(&self) -> usize {
        match self.live() {
            // Discount the owner's implicit registration.
            // SAFETY: `live` checked the object is alive.
            Some(ptr) => unsafe { ptr.as_ref() }.weak() - 1,
            None => 0,
        }
    }

    /// Erase the type of the referenced object.
    ///
    /// The registration moves into the returned [`AnyWeak`], which can be
    /// narrowed back with [`AnyWeak::downcast`].
    #[must_use]
    pub fn into_any(self) -> AnyWeak
    where
        T: Any,
    {
        let this = ManuallyDrop::new(self);
        AnyWeak {
            header: this.ptr.map(ObjBox::as_header),
            type_id: TypeId::of::<T>(),
            deallocate: ObjBox::<T>::deallocate_header,
        }
    }
}

impl<T> Drop for Weak<T> {
    /// Deregisters the `Weak` from its object.
    ///
    /// If the object has been destroyed and this was its last `Weak`, the
    /// header allocation is freed.
    fn drop(&mut self) {
        let Some(ptr) = self.ptr.take() else {
            return;
        };
        // SAFETY: a registered `Weak` keeps its allocation alive.
        let remaining = unsafe { ptr.as_ref() }.dec_weak();
        if remaining == 0 {
            // SAFETY: the owner's implicit registration is released only after
            // the value is dropped, so a count of zero means the object is
            // destroyed and nothing else refers to the allocation.
            unsafe {
                ObjBox::deallocate(ptr);
            }
        }
    }
}

impl<T> Clone for Weak<T> {
    /// Register another `Weak` on the same object.
    ///
    /// Cloning an empty `Weak` yields an empty, unregistered `Weak`.
    fn clone(&self) -> Self {
        match self.live() {
            Some(ptr) => {
                // SAFETY: `live` checked the object is alive.
                unsafe { ptr.as_ref() }.inc_weak();
                Self {
                    ptr: Some(ptr),
                    phantom: PhantomData,
                }
            }
            None => Self::new(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        if self.ptr == source.ptr && self.is_alive() {
            return;
        }
        self.clear();
        *self = source.clone();
    }
}

impl<T> Default for Weak<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<&Owned<T>> for Weak<T> {
    fn from(owner: &Owned<T>) -> Self {
        Owned::downgrade(owner)
    }
}

impl<T> PartialEq for Weak<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T> Eq for Weak<T> {}

impl<T> PartialEq<Owned<T>> for Weak<T> {
    fn eq(&self, other: &Owned<T>) -> bool {
        ptr::eq(self.as_ptr(), Owned::as_ptr(other))
    }
}

impl<T> PartialEq<*const T> for Weak<T> {
    fn eq(&self, other: &*const T) -> bool {
        ptr::eq(self.as_ptr(), *other)
    }
}

impl<T> PartialEq<Weak<T>> for Owned<T> {
    fn eq(&self, other: &Weak<T>) -> bool {
        other == self
    }
}

impl<T> fmt::Debug for Weak<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Weak").field("ptr", &self.as_ptr()).finish()
    }
}

impl<T> fmt::Pointer for Weak<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.as_ptr(), f)
    }
}

/// A borrow of the value behind a [`Weak`], returned by [`Weak::upgrade`] and
/// [`Weak::get`].
///
/// While a `Guard` is held the value is not dropped, even if its [`Owned`]
/// handle is. The value is dropped when the last guard goes away instead.
pub struct Guard<'a, T> {
    ptr: NonNull<ObjBox<T>>,
    phantom: PhantomData<&'a Weak<T>>,
}

impl<'a, T> Deref for Guard<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the value is not dropped while a guard pins it and the
        // borrowed `Weak` keeps the allocation alive.
        unsafe { &*self.ptr.as_ref().value_ptr() }
    }
}

impl<'a, T> Drop for Guard<'a, T> {
    fn drop(&mut self) {
        // SAFETY: the borrowed `Weak` keeps the allocation alive.
        let inner = unsafe { self.ptr.as_ref() };
        if inner.dec_pins() == 0 && !inner.is_alive() {
            trace!(
                "nullref dropping value of {:p} after its last guard",
                self.ptr
            );
            // SAFETY: the owner skipped dropping the value because this guard
            // pinned it, and no other guard remains.
            unsafe {
                inner.drop_value();
            }
        }
    }
}

impl<'a, T: fmt::Debug> fmt::Debug for Guard<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<'a, T: fmt::Display> fmt::Display for Guard<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

/// A type-erased [`Weak`].
///
/// `AnyWeak` widens a `Weak<T>` so references to objects of different types
/// can be stored together. [`downcast`] narrows it back with a dynamic type
/// check; a mismatched type yields an empty `Weak` rather than an error.
///
/// [`downcast`]: AnyWeak::downcast
///
/// # Examples
///
/// ```
/// use nullref::{AnyWeak, Owned};
///
/// struct Button;
/// struct Slider;
///
/// let button = Owned::new(Button);
/// let any = AnyWeak::from(&button);
///
/// assert!(any.is::<Button>());
/// assert!(any.downcast::<Button>().is_alive());
/// assert!(any.downcast::<Slider>().is_empty());
///
/// drop(button);
/// assert!(any.downcast::<Button>().is_empty());
/// ```
pub struct AnyWeak {
    header: Option<NonNull<Header>>,
    type_id: TypeId,
    deallocate: unsafe fn(NonNull<Header>),
}

impl AnyWeak {
    #[inline]
    fn live(&self) -> Option<NonNull<Header>> {
        let header = self.header?;
        // SAFETY: a registered `AnyWeak` keeps its allocation alive.
        if unsafe { header.as_ref() }.is_alive() {
            Some(header)
        } else {
            None
        }
    }

    /// Returns `true` if the referenced object has not been destroyed.
    #[inline]
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.live().is_some()
    }

    /// Returns `true` if this `AnyWeak` refers to no object.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.is_alive()
    }

    /// Returns `true` if the referenced object is alive and holds a `U`.
    #[must_use]
    pub fn is<U: Any>(&self) -> bool {
        self.is_alive() && self.type_id == TypeId::of::<U>()
    }

    /// Narrow to a `Weak<U>`.
    ///
    /// Returns an empty `Weak` if the object has been destroyed or does not
    /// hold a `U`.
    #[must_use]
    pub fn downcast<U: Any>(&self) -> Weak<U> {
        match self.live() {
            // SAFETY: the type check guarantees the header belongs to an
            // `ObjBox<U>` and `live` checked the object is alive.
            Some(header) if self.type_id == TypeId::of::<U>() => unsafe { Weak::register(header) },
            _ => Weak::new(),
        }
    }

    /// Returns `true` if the two `AnyWeak`s refer to the same object, or are
    /// both empty.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.live() == other.live()
    }
}

impl<T: Any> From<Weak<T>> for AnyWeak {
    fn from(weak: Weak<T>) -> Self {
        weak.into_any()
    }
}

impl<T: Any> From<&Owned<T>> for AnyWeak {
    fn from(owner: &Owned<T>) -> Self {
        Owned::downgrade(owner).into_any()
    }
}

impl Clone for AnyWeak {
    fn clone(&self) -> Self {
        let header = self.live();
        if let Some(header) = header {
            // SAFETY: `live` checked the object is alive.
            unsafe { header.as_ref() }.inc_weak();
        }
        Self {
            header,
            type_id: self.type_id,
            deallocate: self.deallocate,
        }
    }
}

impl Drop for AnyWeak {
    fn drop(&mut self) {
        let Some(header) = self.header.take() else {
            return;
        };
        // SAFETY: a registered `AnyWeak` keeps its allocation alive.
        let remaining = unsafe { header.as_ref() }.dec_weak();
        if remaining == 0 {
            // SAFETY: see `Weak::drop`. `deallocate` was instantiated for the
            // type this header was allocated with.
            unsafe {
                (self.deallocate)(header);
            }
        }
    }
}

impl PartialEq for AnyWeak {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for AnyWeak {}

impl fmt::Debug for AnyWeak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyWeak")
            .field("header", &self.live())
            .field("type_id", &self.type_id)
            .finish()
    }
}
