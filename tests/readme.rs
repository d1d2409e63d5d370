use nullref::{List, Owned};

struct Enemy {
    name: &'static str,
}

#[test]
fn readme() {
    let goblin = Owned::new(Enemy { name: "goblin" });
    let troll = Owned::new(Enemy { name: "troll" });

    let target = Owned::downgrade(&troll);
    let visible = List::new();
    visible.add(&goblin);
    visible.add(&troll);

    // this loop will print:
    //
    // goblin
    // troll
    let mut names = vec![];
    for enemy in &visible {
        println!("{}", enemy.get().name);
        names.push(enemy.get().name);
    }
    assert_eq!(names, ["goblin", "troll"]);

    drop(troll);

    assert!(target.is_empty());
    assert_eq!(visible.len(), 1);
    assert_eq!(visible.first().unwrap().get().name, "goblin");
}
