#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use nullref::{List, Owned};

#[test]
fn multi_membership_independence() {
    let _ = env_logger::Builder::from_env("NULLREF_LOG").try_init();

    let a = Owned::new('A');
    let b = Owned::new('B');
    let l1 = List::new();
    let l2 = List::new();
    l1.add(&a);
    l1.add(&b);
    l1.add(&a);
    l2.add(&a);

    assert_eq!(Owned::membership_count(&a), 3);

    // Removing from one list leaves the other untouched.
    assert_eq!(l1.remove(&a), 2);
    assert_eq!(l1.len(), 1);
    assert_eq!(l2.len(), 1);
    assert!(l2.contains(&a));
    assert_eq!(Owned::membership_count(&a), 1);

    l1.add(&a);
    drop(l2);
    assert_eq!(Owned::membership_count(&a), 1);
    assert!(l1.contains(&a));

    drop(a);
    let remaining = l1.iter().map(|item| *item.get()).collect::<Vec<_>>();
    assert_eq!(remaining, ['B']);
}
