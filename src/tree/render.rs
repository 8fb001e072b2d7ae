//! Tree rendering for the confirmation screen and status mode.
use std::fmt;

use super::{Node, PathTree};

const BRANCH: &str = "├── ";
const LAST: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

impl fmt::Display for PathTree {
    /// One line per directory and per file.  Directories are bold blue with a
    /// trailing `/`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\x1b[1;34m{}/\x1b[0m", self.path.display())?;
        render_children(self, "", f)
    }
}

fn render_children(tree: &PathTree, prefix: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let count = tree.children.len();
    for (idx, node) in tree.children.iter().enumerate() {
        let last = idx + 1 == count;
        let marker = if last { LAST } else { BRANCH };
        match node {
            Node::File(path) => {
                let name = path.file_name().map_or_else(
                    || path.display().to_string(),
                    |n| n.to_string_lossy().into_owned(),
                );
                writeln!(f, "{prefix}{marker}{name}")?;
            }
            Node::Branch(child) => {
                writeln!(f, "{prefix}{marker}\x1b[1;34m{}/\x1b[0m", child.name())?;
                let nested = format!("{prefix}{}", if last { SPACE } else { PIPE });
                render_children(child, &nested, f)?;
            }
        }
    }
    Ok(())
}
