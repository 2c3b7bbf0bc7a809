//! Disposable directory tree fixtures for tests.
//!
//! `dirlay` models a directory tree (files and nested folders) in memory,
//! built declaratively from nested entries, and materializes it onto the real
//! filesystem for the duration of a test.
//!
//! ### Overview
//!
//! Two layers, leaves first:
//! - [`NestedMap`] — an ordered key-value container where a flat `"a/b/c"`
//!   key addresses a value nested inside intermediate maps.
//! - [`DirLayout`] — a tree of directories and file contents with a
//!   filesystem lifecycle: `mktree` creates it (in an owned temporary
//!   directory by default), `chdir` enters it remembering where you were,
//!   `rmtree` removes it and restores the working directory. The [`Mounted`]
//!   guard runs `rmtree` on scope exit, whatever the exit path.
//!
//! **Key ideas**:
//! - **Declarative**: Describe the fixture as data, with `/`-joined shorthand
//!   for deep paths.
//! - **Self-cleaning**: Materialized state (root directory, working
//!   directory) is saved on entry and restored on teardown.
//! - **Inspectable**: Enumerate every entry with [`DirLayout::leaves`] or
//!   render the tree with [`render_tree`].
//!
//! ### Example
//!
//! ```
//! use dirlay::{DirLayout, Node};
//!
//! let mut layout = DirLayout::new([
//!     ("docs/index.md", Node::from("# Docs\n")),
//!     ("src", Node::empty_dir()),
//! ])
//! .unwrap();
//!
//! let tree = layout.mount().unwrap();
//! assert!(tree.basedir().unwrap().join("docs/index.md").is_file());
//! drop(tree); // fixture removed, nothing left behind
//! assert!(layout.basedir().is_none());
//! ```

mod error;
mod format;
mod layout;
mod nested;
mod node;

pub use error::{Error, Result};
pub use format::{TreeFormat, render_tree};
pub use layout::{Chdir, DirLayout, Mounted};
pub use nested::{DEFAULT_SEPARATOR, Iter, NestedMap, Value};
pub use node::{Leaf, Node, Walk};
