//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;
use termtree::Tree;

use crate::domain::{Category, CategoryNode};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print labelled value (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// One-line label: `name (name_en) #id`
pub fn category_label(category: &Category) -> String {
    let name = if category.name.is_empty() {
        "<unnamed>"
    } else {
        category.name.as_str()
    };
    if category.name_en.is_empty() || category.name_en == category.name {
        format!("{} #{}", name, category.id)
    } else {
        format!("{} ({}) #{}", name, category.name_en, category.id)
    }
}

/// Convert a nested node into a printable tree.
pub fn category_tree(node: &CategoryNode) -> Tree<String> {
    Tree::new(category_label(&node.category))
        .with_leaves(node.children.iter().map(category_tree))
}
