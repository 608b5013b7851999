use log::LevelFilter;
use simplelog::{Config, SimpleLogger};

use avl_balanced::AvlTree;

fn print_keys(label: &str, visit: impl FnOnce(&mut dyn FnMut(&i32))) {
    print!("{label}: ");
    visit(&mut |key| print!("{key} "));
    println!();
}

fn main() {
    let _ = SimpleLogger::init(LevelFilter::Debug, Config::default());

    let mut tree = AvlTree::new();
    for key in 0..10 {
        tree.insert(key);
    }
    println!("The height of the tree: {}", tree.height());
    print_keys("preOrder", |f| tree.preorder(f));
    print_keys("inOrder", |f| tree.inorder(f));
    print_keys("postOrder", |f| tree.postorder(f));
    print_keys("levelOrder", |f| tree.level_order(f));

    println!("delete element: 10");
    tree.remove(&10);

    for key in [10, 7] {
        match tree.search_iterative(&key) {
            Some(found) => println!("{found}"),
            None => println!("not found such element"),
        }
    }

    match tree.find_min().and_then(|min| tree.find_max().map(|max| (min, max))) {
        Ok((min, max)) => println!("min: {min}, max: {max}"),
        Err(err) => println!("{err}"),
    }
}
