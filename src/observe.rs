use crate::{Owned, Weak};

pub(crate) mod sealed {
    use core::ptr::NonNull;

    use crate::ptr::{Header, HeaderPtr, ObjBox};
    use crate::{Owned, Weak};

    #[doc(hidden)]
    pub trait Sealed<T> {
        /// The header of the observed object, or `None` if `self` does not
        /// refer to a live object.
        fn live_header(&self) -> Option<NonNull<Header>>;
    }

    impl<T> Sealed<T> for Owned<T> {
        #[inline]
        fn live_header(&self) -> Option<NonNull<Header>> {
            Some(ObjBox::as_header(Owned::inner_ptr(self)))
        }
    }

    impl<T> Sealed<T> for Weak<T> {
        #[inline]
        fn live_header(&self) -> Option<NonNull<Header>> {
            let ptr = self.raw()?;
            // SAFETY: a registered `Weak` keeps its allocation alive.
            if unsafe { ptr.as_ref() }.is_alive() {
                Some(ObjBox::as_header(ptr))
            } else {
                None
            }
        }
    }
}

/// A handle that can name an observed object when adding it to or removing it
/// from a [`List`].
///
/// `Observe` is implemented for the owning [`Owned`] handle and for [`Weak`]
/// references. An empty or expired [`Weak`] names no object, which turns
/// [`List::add`] and [`List::remove`] into no-ops.
///
/// This trait is sealed and cannot be implemented outside of `nullref`.
///
/// [`List`]: crate::List
/// [`List::add`]: crate::List::add
/// [`List::remove`]: crate::List::remove
pub trait Observe<T>: sealed::Sealed<T> {}

impl<T> Observe<T> for Owned<T> {}

impl<T> Observe<T> for Weak<T> {}
