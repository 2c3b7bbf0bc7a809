//! Directory tree nodes and depth-first traversal.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// A single node of a directory tree: a directory holding named children, or
/// a file holding its text content verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A directory; an empty map denotes an empty directory.
    Dir(BTreeMap<String, Node>),
    /// A file and its content.
    File(String),
}

impl Node {
    /// Creates a directory node from named entries.
    ///
    /// Entry names may use `/`-joined shorthand; expansion happens when the
    /// node is handed to [`DirLayout::new`](crate::DirLayout::new). Later
    /// duplicates of the same literal name win.
    pub fn dir<K, I>(entries: I) -> Node
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Node)>,
    {
        Node::Dir(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Creates an empty directory node.
    pub fn empty_dir() -> Node {
        Node::Dir(BTreeMap::new())
    }

    /// Creates a file node.
    pub fn file(content: impl Into<String>) -> Node {
        Node::File(content.into())
    }

    /// Returns `true` for a directory node.
    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Dir(_))
    }

    /// File content, or `None` for a directory.
    pub fn content(&self) -> Option<&str> {
        match self {
            Node::Dir(_) => None,
            Node::File(content) => Some(content),
        }
    }
}

impl From<&str> for Node {
    fn from(content: &str) -> Node {
        Node::File(content.to_string())
    }
}

impl From<String> for Node {
    fn from(content: String) -> Node {
        Node::File(content)
    }
}

/// A single enumerated tree entry: its path relative to the layout base,
/// whether it is a directory, and the file content for file entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf<'a> {
    /// Path relative to the layout base directory.
    pub path: PathBuf,
    /// `true` for directories (including empty ones).
    pub is_dir: bool,
    /// File content; `None` for directories.
    pub content: Option<&'a str>,
}

/// Lazy depth-first pre-order iterator over every entry of a tree.
/// Directories are yielded before their children.
pub struct Walk<'a> {
    stack: Vec<std::collections::btree_map::Iter<'a, String, Node>>,
    prefix: PathBuf,
}

pub(crate) fn walk(tree: &BTreeMap<String, Node>) -> Walk<'_> {
    Walk {
        stack: vec![tree.iter()],
        prefix: PathBuf::new(),
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = Leaf<'a>;

    fn next(&mut self) -> Option<Leaf<'a>> {
        loop {
            let current = self.stack.last_mut()?;
            match current.next() {
                Some((name, node)) => {
                    let path = self.prefix.join(name);
                    return Some(match node {
                        Node::Dir(children) => {
                            self.stack.push(children.iter());
                            self.prefix.push(name);
                            Leaf {
                                path,
                                is_dir: true,
                                content: None,
                            }
                        }
                        Node::File(content) => Leaf {
                            path,
                            is_dir: false,
                            content: Some(content),
                        },
                    });
                }
                None => {
                    self.stack.pop();
                    self.prefix.pop();
                }
            }
        }
    }
}
