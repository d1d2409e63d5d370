use alloc::boxed::Box;
use core::cell::{Cell, RefCell, UnsafeCell};
use core::fmt;
use core::mem::MaybeUninit;
use core::ptr::{self, NonNull};

use crate::link::Memberships;

/// Bookkeeping shared by every observed allocation regardless of the type of
/// value it holds.
///
/// `ObjBox<T>` is `repr(C)` with the header as its first field, so a pointer to
/// an `ObjBox<T>` may be cast to a pointer to its `Header` and back.
pub struct Header {
    alive: Cell<bool>,
    // Number of registered weak references plus one implicit registration held
    // by the owner until its drop completes.
    weak: Cell<usize>,
    // Number of live `Guard`s dereferencing the value.
    pins: Cell<usize>,
    memberships: RefCell<Memberships>,
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Header")
            .field("alive", &self.alive.get())
            .field("weak", &self.weak.get())
            .field("pins", &self.pins.get())
            .field("memberships", &self.memberships)
            .finish()
    }
}

impl Header {
    fn new() -> Self {
        Self {
            alive: Cell::new(true),
            weak: Cell::new(1),
            pins: Cell::new(0),
            memberships: RefCell::new(Memberships::default()),
        }
    }

    #[inline]
    pub fn memberships(&self) -> &RefCell<Memberships> {
        &self.memberships
    }
}

#[allow(clippy::module_name_repetitions)]
pub trait HeaderPtr {
    fn header(&self) -> &Header;

    #[inline]
    fn is_alive(&self) -> bool {
        self.header().alive.get()
    }

    #[inline]
    fn kill(&self) {
        self.header().alive.set(false);
    }

    #[inline]
    fn weak(&self) -> usize {
        self.header().weak.get()
    }

    #[inline]
    fn inc_weak(&self) {
        // We want to abort on overflow instead of handing out a registration
        // that could later free the allocation while it is still in use.
        let weak_count = self.weak();
        if weak_count == 0 || weak_count == usize::MAX || weak_count + 1 == usize::MAX {
            overflow();
        }
        // guaranteed not to overflow by the abort above.
        self.header().weak.set(weak_count + 1);
    }

    /// Deregister one weak reference and return the remaining count.
    #[inline]
    fn dec_weak(&self) -> usize {
        let weak_count = self.weak().saturating_sub(1);
        self.header().weak.set(weak_count);
        weak_count
    }

    #[inline]
    fn pins(&self) -> usize {
        self.header().pins.get()
    }

    #[inline]
    fn inc_pins(&self) {
        let pins = self.pins();
        if pins == usize::MAX {
            overflow();
        }
        self.header().pins.set(pins + 1);
    }

    /// Release one guard and return the remaining count.
    #[inline]
    fn dec_pins(&self) -> usize {
        let pins = self.pins().saturating_sub(1);
        self.header().pins.set(pins);
        pins
    }

    #[inline]
    fn membership_count(&self) -> usize {
        self.header().memberships.borrow().len()
    }
}

impl HeaderPtr for Header {
    fn header(&self) -> &Header {
        self
    }
}

impl<T> HeaderPtr for ObjBox<T> {
    fn header(&self) -> &Header {
        &self.header
    }
}

#[repr(C)]
pub struct ObjBox<T> {
    header: Header,
    value: UnsafeCell<MaybeUninit<T>>,
}

impl<T> ObjBox<T> {
    /// Move `value` to the heap behind a fresh header.
    pub fn allocate(value: T) -> NonNull<Self> {
        let boxed = Box::new(Self {
            header: Header::new(),
            value: UnsafeCell::new(MaybeUninit::new(value)),
        });
        NonNull::from(Box::leak(boxed))
    }

    #[inline]
    pub fn as_header(this: NonNull<Self>) -> NonNull<Header> {
        this.cast()
    }

    /// # Safety
    ///
    /// `header` must have been produced by [`ObjBox::as_header`] on an
    /// `ObjBox<T>` of the same `T`.
    #[inline]
    pub unsafe fn from_header(header: NonNull<Header>) -> NonNull<Self> {
        header.cast()
    }

    #[inline]
    pub fn value_ptr(&self) -> *const T {
        self.value.get().cast::<T>()
    }

    /// # Safety
    ///
    /// The value must still be initialized and no `&T` derived from it may be
    /// live. This must be called at most once per allocation.
    pub unsafe fn drop_value(&self) {
        ptr::drop_in_place(self.value.get().cast::<T>());
    }

    /// # Safety
    ///
    /// `this` must have been returned by [`ObjBox::allocate`], its value must
    /// already be dropped, and no pointer to it may be used afterward.
    pub unsafe fn deallocate(this: NonNull<Self>) {
        trace!("nullref deallocating ObjBox {:p}", this);
        // `value` is a `MaybeUninit` so dropping the box only drops the header.
        drop(Box::from_raw(this.as_ptr()));
    }

    /// Type-erased [`ObjBox::deallocate`] for handles that only know the
    /// header.
    ///
    /// # Safety
    ///
    /// Same as [`ObjBox::deallocate`]; `header` must point into an
    /// `ObjBox<T>` of this `T`.
    pub unsafe fn deallocate_header(header: NonNull<Header>) {
        Self::deallocate(Self::from_header(header));
    }
}

#[cold]
#[inline(never)]
fn overflow() -> ! {
    #[cfg(feature = "std")]
    std::process::abort();
    #[cfg(not(feature = "std"))]
    panic!("nullref registration count overflowed");
}

#[cfg(test)]
mod tests {
    use core::ptr::NonNull;

    use super::{Header, HeaderPtr, ObjBox};

    #[test]
    fn header_is_first_field() {
        let ptr = ObjBox::allocate(17_u64);
        let header = ObjBox::as_header(ptr);
        assert_eq!(header.as_ptr().cast::<u8>(), ptr.as_ptr().cast::<u8>());
        unsafe {
            let roundtrip: NonNull<ObjBox<u64>> = ObjBox::from_header(header);
            assert_eq!(*roundtrip.as_ref().value_ptr(), 17);
            roundtrip.as_ref().drop_value();
            ObjBox::deallocate(roundtrip);
        }
    }

    #[test]
    fn fresh_header_counts_owner_registration() {
        let header = Header::new();
        assert!(header.is_alive());
        assert_eq!(header.weak(), 1);
        assert_eq!(header.pins(), 0);
        assert_eq!(header.membership_count(), 0);
        header.inc_weak();
        assert_eq!(header.dec_weak(), 1);
        header.kill();
        assert!(!header.is_alive());
    }

    #[test]
    fn header_debug_reports_counts() {
        let header = Header::new();
        header.inc_weak();
        let debug = format!("{header:?}");
        assert!(debug.starts_with("Header { alive: true, weak: 2, pins: 0, memberships:"));
    }
}
