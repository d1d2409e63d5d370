#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use nullref::{List, Owned};

fn abc() -> [Owned<char>; 3] {
    [Owned::new('A'), Owned::new('B'), Owned::new('C')]
}

#[test]
fn remove_pending_member() {
    let _ = env_logger::Builder::from_env("NULLREF_LOG").try_init();

    let [a, b, c] = abc();
    let list: List<char> = [&a, &b, &c].into_iter().collect();
    let mut iter = list.iter();
    assert_eq!(*iter.next().unwrap().get(), 'A');

    // The iterator is about to yield B.
    list.remove(&b);

    assert_eq!(*iter.next().unwrap().get(), 'C');
    assert!(iter.next().is_none());
}

#[test]
fn destroy_pending_member() {
    let _ = env_logger::Builder::from_env("NULLREF_LOG").try_init();

    let [a, b, c] = abc();
    let list: List<char> = [&a, &b, &c].into_iter().collect();
    let mut iter = list.iter();
    assert_eq!(*iter.next().unwrap().get(), 'A');

    drop(b);

    assert_eq!(*iter.next().unwrap().get(), 'C');
    assert!(iter.next().is_none());
}

#[test]
fn reverse_iterator_moves_to_predecessor() {
    let _ = env_logger::Builder::from_env("NULLREF_LOG").try_init();

    let [a, b, c] = abc();
    let list: List<char> = [&a, &b, &c].into_iter().collect();
    let mut iter = list.iter_rev();
    assert_eq!(*iter.next().unwrap().get(), 'C');

    list.remove(&b);

    assert_eq!(*iter.next().unwrap().get(), 'A');
    assert!(iter.next().is_none());
}

#[test]
fn many_iterators_on_one_member() {
    let _ = env_logger::Builder::from_env("NULLREF_LOG").try_init();

    let [a, b, c] = abc();
    let list: List<char> = [&a, &b, &c].into_iter().collect();
    let mut forward = list.iter();
    forward.next();
    let mut backward = list.iter_rev();
    backward.next();
    let mut copy = forward.clone();

    // All three are pending on B.
    drop(b);

    assert_eq!(*forward.next().unwrap().get(), 'C');
    assert_eq!(*copy.next().unwrap().get(), 'C');
    assert_eq!(*backward.next().unwrap().get(), 'A');
}

#[test]
fn clear_ends_iteration() {
    let _ = env_logger::Builder::from_env("NULLREF_LOG").try_init();

    let [a, b, c] = abc();
    let list: List<char> = [&a, &b, &c].into_iter().collect();
    let mut iter = list.iter();
    assert_eq!(*iter.next().unwrap().get(), 'A');

    list.clear();

    assert!(iter.next().is_none());
    assert_eq!(Owned::membership_count(&a), 0);
}

#[test]
fn remove_from_loop_body() {
    let _ = env_logger::Builder::from_env("NULLREF_LOG").try_init();

    let objects = (0..10_usize).map(Owned::new).collect::<Vec<_>>();
    let list: List<usize> = objects.iter().collect();

    let mut visited = vec![];
    for item in &list {
        let n = *item.get();
        visited.push(n);
        // Remove the current member and the one after it.
        list.remove(&item);
        if let Some(next) = objects.get(n + 1) {
            list.remove(next);
        }
    }

    assert_eq!(visited, [0, 2, 4, 6, 8]);
    assert!(list.is_empty());
}
