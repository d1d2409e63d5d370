#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use nullref::{List, Owned, Weak};

#[test]
fn list_forgets_destroyed_member() {
    let _ = env_logger::Builder::from_env("NULLREF_LOG").try_init();

    let a = Owned::new("A");
    let r1 = Owned::downgrade(&a);
    let r2 = r1.clone();
    let list = List::new();
    list.add(&a);
    list.add(&r1);

    assert_eq!(list.len(), 2);
    assert_eq!(list.count(&a), 2);
    assert_eq!(Owned::weak_count(&a), 2);
    assert_eq!(Owned::membership_count(&a), 2);

    drop(a);

    assert!(r1.is_empty());
    assert!(r2.is_empty());
    assert!(list.is_empty());
    assert_eq!(list.iter().count(), 0);
    assert!(list.first().is_none());
}

#[test]
fn adding_empty_weak_is_a_noop() {
    let _ = env_logger::Builder::from_env("NULLREF_LOG").try_init();

    let list = List::<u8>::new();
    list.add(&Weak::new());
    assert!(list.is_empty());

    let owner = Owned::new(1_u8);
    let weak = Owned::downgrade(&owner);
    drop(owner);
    list.add(&weak);
    assert!(list.is_empty());
    assert_eq!(list.remove(&weak), 0);
}
