#![cfg_attr(not(feature = "std"), no_std)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::inline_always)]
#![allow(clippy::option_if_let_else)]
#![allow(unknown_lints)]
#![warn(missing_copy_implementations)]
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(unused_qualifications)]
#![warn(variant_size_differences)]

//! Single-threaded owned objects observed by auto-nulling weak references and
//! intrusive lists.
//!
//! The type [`Owned<T>`] places a value of type `T` on the heap and is its
//! only owner. Any number of [`Weak<T>`] references may observe the object,
//! and the object may be a member of any number of [`List<T>`]s, any number of
//! times each. When the `Owned` is dropped:
//!
//! - Every `Weak` to the object becomes empty. Reading an empty `Weak` yields
//!   nothing instead of a dangling pointer.
//! - Every membership of the object is removed from every list that holds it.
//! - Every list iterator that was about to yield one of those memberships
//!   moves on to the next member.
//!
//! The cost of destroying an object is proportional to the number of its
//! memberships, not the number of `Weak`s or the size of the lists.
//!
//! [`Owned<T>`]: crate::Owned
//! [`Weak<T>`]: crate::Weak
//! [`List<T>`]: crate::List
//!
//! # Lists
//!
//! A [`List`] is an ordered sequence of memberships. It never owns its
//! members: adding an object to a list neither keeps it alive nor delays its
//! destruction. Lists hand out members as `Weak`s, and iterate with
//! mutation-safe [`Iter`]ators that tolerate members being added, removed or
//! destroyed while iteration is suspended, including from within the loop
//! body.
//!
//! ```
//! use nullref::{List, Owned};
//!
//! let a = Owned::new("a");
//! let b = Owned::new("b");
//! let c = Owned::new("c");
//! let list: List<&str> = [&a, &b, &c].into_iter().collect();
//!
//! let mut seen = vec![];
//! for item in &list {
//!     seen.push(*item.get());
//!     list.remove(&b);
//! }
//! assert_eq!(seen, ["a", "c"]);
//! ```
//!
//! Lists sort in place with [`List::sort_by`], a stable sort that reorders the
//! memberships themselves so pending iterators keep their place.
//!
//! # Weak references
//!
//! A [`Weak`] is either empty or refers to a live object. [`Weak::upgrade`]
//! borrows the value through a [`Guard`]; [`Weak::get`] does the same and
//! panics on an empty `Weak`. A `Weak` may be erased to an [`AnyWeak`] and
//! downcast back to its concrete type.
//!
//! Like [`std::rc`], [`Owned`], [`Weak`] and [`List`] are not `Send` and are
//! not `Sync`.
//!
//! [`std::rc`]: https://doc.rust-lang.org/stable/std/rc/index.html
//!
//! # Logging
//!
//! nullref logs object destruction and list maintenance with the [`log`]
//! crate at `debug` and `trace` levels.
//!
//! [`log`]: https://docs.rs/log
//!
//! # Crate features
//!
//! - **std** - Enabled by default. Without it nullref is `no_std` and only
//!   depends on `alloc`, and overflowing a reference count panics instead of
//!   aborting the process.

#![doc(html_root_url = "https://docs.rs/nullref/0.1.0")]

// Ensure code blocks in README.md compile
#[cfg(doctest)]
#[doc = include_str!("../README.md")]
mod readme {}

extern crate alloc;
#[macro_use]
extern crate log;

mod drop;
mod hash;
mod iter;
mod link;
mod list;
mod observe;
mod owned;
mod ptr;
mod sort;
mod weak;

// Doc modules
#[cfg(any(doctest, docsrs))]
#[path = "doc/building_scene_graphs.rs"]
/// Examples of building object graphs whose nodes observe each other.
pub mod building_scene_graphs;

pub use iter::Iter;
pub use list::List;
pub use observe::Observe;
pub use owned::Owned;
pub use weak::{AnyWeak, Guard, Weak};
