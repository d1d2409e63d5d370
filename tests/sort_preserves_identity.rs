#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use nullref::{List, Owned};

#[test]
fn sort_preserves_identity() {
    let _ = env_logger::Builder::from_env("NULLREF_LOG").try_init();

    let c = Owned::new("C");
    let a = Owned::new("A");
    let b = Owned::new("B");
    let list: List<&str> = [&c, &a, &b].into_iter().collect();

    list.sort_by(|left, right| left.get().cmp(&*right.get()));

    let sorted = list.to_vec();
    assert_eq!(sorted.len(), 3);
    assert!(sorted[0] == a);
    assert!(sorted[1] == b);
    assert!(sorted[2] == c);

    // Sorted members are still the same objects: destroying one removes it.
    drop(b);
    let labels = list.iter().map(|item| *item.get()).collect::<Vec<_>>();
    assert_eq!(labels, ["A", "C"]);
}

#[test]
fn sort_skips_members_destroyed_by_comparator() {
    let _ = env_logger::Builder::from_env("NULLREF_LOG").try_init();

    let mut objects = [4, 3, 2, 1, 0].map(Owned::new).into_iter().map(Some).collect::<Vec<_>>();
    let list: List<i32> = objects.iter().flatten().collect();

    let mut calls = 0;
    list.sort_by(|left, right| {
        calls += 1;
        if calls == 2 {
            // Destroy the object holding 0 while it waits unsorted at the end.
            objects[4] = None;
        }
        left.get().cmp(&*right.get())
    });

    let order = list.iter().map(|item| *item.get()).collect::<Vec<_>>();
    assert_eq!(order, [1, 2, 3, 4]);
    assert!(objects[4].is_none());
    assert_eq!(list.len(), 4);
}
