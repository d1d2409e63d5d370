use std::cell::RefCell;
use std::mem::drop;

use crate::{List, Owned, Weak};

#[test]
fn test_simple() {
    let x = Owned::new(5);
    assert_eq!(*x, 5);
}

#[test]
fn test_interior_mutability() {
    let x = Owned::new(RefCell::new(5));
    let y = Owned::downgrade(&x);
    *x.borrow_mut() = 20;
    assert_eq!(*y.get().borrow(), 20);
}

#[test]
fn test_destructor() {
    let x: Owned<Box<_>> = Owned::new(Box::new(5));
    assert_eq!(**x, 5);
}

#[test]
fn test_live() {
    let x = Owned::new(5);
    let y = Owned::downgrade(&x);
    assert!(y.upgrade().is_some());
    assert!(y.is_alive());
}

#[test]
fn test_dead() {
    let x = Owned::new(5);
    let y = Owned::downgrade(&x);
    drop(x);
    assert!(y.upgrade().is_none());
    assert!(y.is_empty());
}

#[test]
fn test_weak_count() {
    let a = Owned::new(0);
    assert_eq!(Owned::weak_count(&a), 0);
    let w = Owned::downgrade(&a);
    assert_eq!(Owned::weak_count(&a), 1);
    let w2 = w.clone();
    assert_eq!(Owned::weak_count(&a), 2);
    drop(w);
    assert_eq!(Owned::weak_count(&a), 1);
    drop(w2);
    assert_eq!(Owned::weak_count(&a), 0);
}

#[test]
fn weak_counts() {
    assert_eq!(Weak::weak_count(&Weak::<u64>::new()), 0);

    let a = Owned::new(0);
    let w = Owned::downgrade(&a);
    assert_eq!(Weak::weak_count(&w), 1);
    let w2 = w.clone();
    assert_eq!(Weak::weak_count(&w), 2);
    assert_eq!(Weak::weak_count(&w2), 2);
    drop(w);
    assert_eq!(Weak::weak_count(&w2), 1);
    drop(a);
    assert_eq!(Weak::weak_count(&w2), 0);
    drop(w2);
}

#[test]
fn test_membership_count() {
    let a = Owned::new(0);
    assert_eq!(Owned::membership_count(&a), 0);
    let left = List::new();
    let right = List::new();
    left.add(&a);
    left.add(&a);
    right.add(&a);
    assert_eq!(Owned::membership_count(&a), 3);
    left.remove(&a);
    assert_eq!(Owned::membership_count(&a), 1);
    drop(right);
    assert_eq!(Owned::membership_count(&a), 0);
}

#[test]
fn test_weak_outlives_owner() {
    let a = Owned::new(String::from("observed"));
    let w = Owned::downgrade(&a);
    let w2 = w.clone();
    drop(a);
    assert!(w.is_empty());
    assert!(w2.is_empty());
    assert!(w.as_ptr().is_null());
    drop(w);
    drop(w2);
}

#[test]
fn test_show() {
    let foo = Owned::new(75);
    assert_eq!(format!("{:?}", foo), "75");
    assert_eq!(format!("{}", foo), "75");
}

#[test]
fn test_from_owned() {
    let foo = 123;
    let foo_owned = Owned::from(foo);
    assert!(123 == *foo_owned);
}

#[test]
fn test_new_weak() {
    let foo: Weak<usize> = Weak::new();
    assert!(foo.upgrade().is_none());
    assert!(foo.is_empty());
}

#[test]
fn test_ptr_eq() {
    let five = Owned::new(5);
    let other_five = Owned::new(5);

    assert!(Owned::ptr_eq(&five, &five));
    assert!(!Owned::ptr_eq(&five, &other_five));
    assert_eq!(Owned::as_ptr(&five), Owned::downgrade(&five).as_ptr());
}

#[test]
fn test_weak_eq_owner() {
    let five = Owned::new(5);
    let other_five = Owned::new(5);
    let weak = Owned::downgrade(&five);

    assert!(weak == five);
    assert!(five == weak);
    assert!(weak != other_five);
}

#[test]
fn test_zero_sized_type() {
    let a = Owned::new(());
    let b = Owned::new(());
    let w = Owned::downgrade(&a);
    assert!(!Owned::ptr_eq(&a, &b));
    assert!(w.upgrade().is_some());
    drop(a);
    assert!(w.upgrade().is_none());
}
