//! nullref can model object graphs where many parts of a program observe
//! objects they do not own.
//!
//! # Scene Graph
//!
//! The following scene owns its nodes in a `Vec`. Each node observes its
//! parent with a [`Weak`] and its children with a [`List`], and the editor
//! tracks a selection as another `List` over the same nodes. Deleting a node
//! empties every `Weak` to it and drops it from every list, so neither the
//! children lists nor the selection need manual cleanup.
//!
//! [`Weak`]: crate::Weak
//! [`List`]: crate::List
//!
//! ```rust
//! use std::cell::RefCell;
//!
//! use nullref::{List, Owned, Weak};
//!
//! struct Node {
//!     name: &'static str,
//!     parent: RefCell<Weak<Node>>,
//!     children: List<Node>,
//! }
//!
//! impl Node {
//!     fn new(name: &'static str) -> Owned<Self> {
//!         Owned::new(Self {
//!             name,
//!             parent: RefCell::new(Weak::new()),
//!             children: List::new(),
//!         })
//!     }
//! }
//!
//! fn attach(parent: &Owned<Node>, child: &Owned<Node>) {
//!     child.parent.borrow_mut().set(parent);
//!     parent.children.add(child);
//! }
//!
//! fn names(list: &List<Node>) -> Vec<&'static str> {
//!     list.iter().map(|node| node.get().name).collect()
//! }
//!
//! let mut scene = vec![
//!     Node::new("root"),
//!     Node::new("camera"),
//!     Node::new("light"),
//!     Node::new("mesh"),
//! ];
//! for child in &scene[1..] {
//!     attach(&scene[0], child);
//! }
//!
//! let selection = List::new();
//! selection.add(&scene[3]);
//! selection.add(&scene[1]);
//!
//! assert_eq!(names(&scene[0].children), ["camera", "light", "mesh"]);
//! assert_eq!(names(&selection), ["mesh", "camera"]);
//!
//! // Delete the camera.
//! drop(scene.remove(1));
//!
//! assert_eq!(names(&scene[0].children), ["light", "mesh"]);
//! assert_eq!(names(&selection), ["mesh"]);
//!
//! // Deleting the root empties its children's parent references.
//! let mesh_parent = scene[2].parent.borrow().clone();
//! assert!(mesh_parent.is_alive());
//! drop(scene.remove(0));
//! assert!(mesh_parent.is_empty());
//! assert!(scene[1].parent.borrow().is_empty());
//! ```
//!
//! # Deleting While Iterating
//!
//! Iterators over a `List` stay valid while the members they have not yet
//! reached are destroyed. Here every visited enemy destroys the next one in
//! line, and the loop skips the destroyed members instead of reading freed
//! memory.
//!
//! ```rust
//! use std::cell::RefCell;
//!
//! use nullref::{List, Owned};
//!
//! let enemies = RefCell::new((0..6).map(Owned::new).collect::<Vec<_>>());
//! let alive: List<i32> = enemies.borrow().iter().collect();
//!
//! let mut visited = vec![];
//! for enemy in &alive {
//!     let id = *enemy.get();
//!     visited.push(id);
//!     let mut enemies = enemies.borrow_mut();
//!     if let Some(index) = enemies.iter().position(|e| **e == id + 1) {
//!         drop(enemies.remove(index));
//!     }
//! }
//!
//! assert_eq!(visited, [0, 2, 4]);
//! assert_eq!(alive.len(), 3);
//! ```
