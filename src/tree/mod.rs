//! In-memory mirror of a source directory.
//!
//! A [`PathTree`] is built once per run by [`PathTree::traverse`] and from
//! then on only shrinks: every trim operation removes children, nothing is
//! ever added back.  Paths inside the tree are the canonical root joined
//! with directory entry names, so equality and containment are plain
//! component comparisons.
mod render;

use std::path::{Path, PathBuf};

use crate::config::{CONFIG_FILE_NAME, Ignorable, IgnoreConfig};
use crate::error::{IgnoreError, TreeError};
use crate::logging::Log;

/// Depth that never stops a recursive walk.
pub const UNBOUNDED: usize = usize::MAX;

/// A child of a [`PathTree`].
#[derive(Debug)]
pub enum Node {
    /// A regular file, a symlink, or anything else that is not a real
    /// directory.  Symlinked directories land here and are linked as a unit.
    File(PathBuf),
    /// A real subdirectory.
    Branch(PathTree),
}

impl Node {
    /// Path of the child.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::File(path) => path,
            Self::Branch(tree) => tree.path(),
        }
    }
}

/// One directory and everything below it.
#[derive(Debug)]
pub struct PathTree {
    path: PathBuf,
    children: Vec<Node>,
    config: Option<IgnoreConfig>,
}

impl PartialEq for PathTree {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for PathTree {}

impl PathTree {
    /// Create an empty tree rooted at `path`.
    ///
    /// `path` must already be canonical; nothing here resolves it again.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self {
            path,
            children: Vec::new(),
            config: None,
        }
    }

    /// Populate the tree from the filesystem and return it.
    ///
    /// Each directory is listed once.  Real subdirectories become branches
    /// and are traversed in turn; symlinks are never followed.  A directory
    /// that cannot be listed is logged and left empty.
    #[must_use]
    pub fn traverse(mut self, log: &dyn Log) -> Self {
        let entries = match std::fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(e) => {
                log.warn(&format!("cannot read {}: {e}", self.path.display()));
                return self;
            }
        };

        let mut listed = Vec::new();
        for entry in entries {
            match entry.and_then(|e| e.file_type().map(|t| (e.file_name(), t.is_dir()))) {
                Ok(item) => listed.push(item),
                Err(e) => log.warn(&format!("cannot read entry in {}: {e}", self.path.display())),
            }
        }
        listed.sort();

        for (name, is_dir) in listed {
            let path = self.path.join(&name);
            if is_dir {
                self.children
                    .push(Node::Branch(Self::new(path).traverse(log)));
            } else {
                if name == CONFIG_FILE_NAME {
                    self.config = Some(IgnoreConfig::new(path.clone()));
                }
                self.children.push(Node::File(path));
            }
        }
        self
    }

    /// Canonical path of this directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final component of the path, or the whole path for a filesystem root.
    #[must_use]
    pub fn name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        )
    }

    /// The bound `.stowconfig`, if this directory has one that has not been
    /// trimmed.
    #[must_use]
    pub const fn config(&self) -> Option<&IgnoreConfig> {
        self.config.as_ref()
    }

    /// Direct children in traversal order.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Direct subtrees.
    pub fn branches(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|node| match node {
            Node::Branch(tree) => Some(tree),
            Node::File(_) => None,
        })
    }

    fn branches_mut(&mut self) -> impl Iterator<Item = &mut Self> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Branch(tree) => Some(tree),
            Node::File(_) => None,
        })
    }

    /// Direct file children.
    pub fn contents(&self) -> impl Iterator<Item = &Path> {
        self.children.iter().filter_map(|node| match node {
            Node::File(path) => Some(path.as_path()),
            Node::Branch(_) => None,
        })
    }

    /// Every file in the tree, depth first: this level, then each branch.
    #[must_use]
    pub fn files(&self) -> Box<dyn Iterator<Item = &Path> + '_> {
        Box::new(self.contents().chain(self.branches().flat_map(Self::files)))
    }

    /// Number of files in this directory and every descendant.  Directories
    /// themselves are not counted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children
            .iter()
            .map(|node| match node {
                Node::File(_) => 1,
                Node::Branch(tree) => tree.len(),
            })
            .sum()
    }

    /// `true` when no file remains anywhere below this directory.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` if `path` is this directory or lies below it.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.path)
    }

    /// `true` if `other` is this tree or a subtree of it.
    #[must_use]
    pub fn contains_tree(&self, other: &Self) -> bool {
        self.contains(&other.path)
    }

    /// `path` relative to this tree's root, if it lies below it.
    #[must_use]
    pub fn relative<'a>(&self, path: &'a Path) -> Option<&'a Path> {
        path.strip_prefix(&self.path).ok()
    }

    /// Remove the first file equal to `path`, searching this level first and
    /// then each branch in order, at most `depth` levels down.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::RemoveSelf`] if `path` is this tree's own path.
    pub fn trim_file(&mut self, path: &Path, depth: usize) -> Result<bool, TreeError> {
        self.guard_self(path)?;
        Ok(self.remove_file(path, depth))
    }

    /// Remove the first subtree rooted at `branch`, searching this level
    /// first and then each branch in order, at most `depth` levels down.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::RemoveSelf`] if `branch` is this tree's own path.
    pub fn trim_branch(&mut self, branch: &Path, depth: usize) -> Result<bool, TreeError> {
        self.guard_self(branch)?;
        Ok(self.remove_branch(branch, depth))
    }

    fn guard_self(&self, path: &Path) -> Result<(), TreeError> {
        if path == self.path {
            return Err(TreeError::RemoveSelf(self.path.clone()));
        }
        Ok(())
    }

    fn remove_file(&mut self, path: &Path, depth: usize) -> bool {
        let found = self
            .children
            .iter()
            .position(|node| matches!(node, Node::File(p) if p == path));
        if let Some(idx) = found {
            self.children.remove(idx);
            self.unbind_if(path);
            return true;
        }
        if depth == 0 || !self.contains(path) {
            return false;
        }
        self.branches_mut().any(|b| b.remove_file(path, depth - 1))
    }

    fn remove_branch(&mut self, path: &Path, depth: usize) -> bool {
        let found = self
            .children
            .iter()
            .position(|node| matches!(node, Node::Branch(t) if t.path == path));
        if let Some(idx) = found {
            self.children.remove(idx);
            return true;
        }
        if depth == 0 || !self.contains(path) {
            return false;
        }
        self.branches_mut().any(|b| b.remove_branch(path, depth - 1))
    }

    fn unbind_if(&mut self, removed: &Path) {
        if self.config.as_ref().is_some_and(|c| c.path() == removed) {
            self.config = None;
        }
    }

    /// At every level down to `depth`, remove each file for which
    /// `pred(path, remaining_depth)` holds.  Returns the number removed.
    pub fn trim_file_rule<F>(&mut self, pred: &mut F, depth: usize) -> usize
    where
        F: FnMut(&Path, usize) -> bool,
    {
        let before = self.children.len();
        let config = self.config.as_ref().map(|c| c.path().to_path_buf());
        let mut unbind = false;
        self.children.retain(|node| match node {
            Node::File(path) => {
                let drop = pred(path, depth);
                if drop && config.as_deref() == Some(path.as_path()) {
                    unbind = true;
                }
                !drop
            }
            Node::Branch(_) => true,
        });
        if unbind {
            self.config = None;
        }
        let mut removed = before - self.children.len();
        if depth > 0 {
            for branch in self.branches_mut() {
                removed += branch.trim_file_rule(&mut *pred, depth - 1);
            }
        }
        removed
    }

    /// At every level down to `depth`, remove each subtree for which
    /// `pred(subtree, remaining_depth)` holds, then recurse into the
    /// survivors.  Returns the number of subtrees removed.
    pub fn trim_branch_rule<F>(&mut self, pred: &mut F, depth: usize) -> usize
    where
        F: FnMut(&Self, usize) -> bool,
    {
        let before = self.children.len();
        self.children.retain(|node| match node {
            Node::Branch(tree) => !pred(tree, depth),
            Node::File(_) => true,
        });
        let mut removed = before - self.children.len();
        if depth > 0 {
            for branch in self.branches_mut() {
                removed += branch.trim_branch_rule(&mut *pred, depth - 1);
            }
        }
        removed
    }

    /// Apply every bound `.stowconfig` from this directory down.
    ///
    /// Each config only trims its own directory's subtree, and the config
    /// file itself is dropped from the tree once applied.  Returns the
    /// number of ignored entries removed.
    ///
    /// # Errors
    ///
    /// Returns the first [`IgnoreError`] hit while resolving patterns.
    pub fn trim_ignored(&mut self, depth: usize, log: &dyn Log) -> Result<usize, IgnoreError> {
        let mut removed = 0;
        if let Some(config) = self.config.take() {
            let ignorables = config.ignorables(log)?;
            log.debug(&format!(
                "{}: {} ignorable entries",
                config.path().display(),
                ignorables.len()
            ));
            for ignorable in ignorables {
                let hit = match ignorable {
                    Ignorable::File(path) => self.remove_file(path, depth),
                    Ignorable::Branch(path) => self.remove_branch(path, depth),
                };
                removed += usize::from(hit);
            }
            self.remove_file(config.path(), 0);
        }
        if depth > 0 {
            for branch in self.branches_mut() {
                removed += branch.trim_ignored(depth - 1, log)?;
            }
        }
        Ok(removed)
    }
}
