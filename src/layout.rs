//! Directory layout model and its filesystem lifecycle.
//!
//! A [`DirLayout`] holds an in-memory tree of directories and file contents,
//! built once from declarative nested entries. The tree can be materialized
//! onto the real filesystem (`mktree`), entered (`chdir`), and torn down
//! again (`rmtree`), restoring the previous working directory. The
//! [`Mounted`] guard ties teardown to scope exit.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::TempDir;

use crate::error::{Error, Result};
use crate::node::{Leaf, Node, Walk, walk};

/// Working-directory behavior of [`DirLayout::mktree_with`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Chdir {
    /// Leave the working directory untouched.
    #[default]
    Stay,
    /// Change into the freshly created base directory.
    Root,
    /// Change into a subdirectory of the base directory.
    /// The path must be relative and must exist after materialization.
    Into(PathBuf),
}

/// An in-memory model of a directory tree with a filesystem lifecycle.
///
/// ### Internal state
///
/// * `tree` — directories and file contents, fixed at construction time.
/// * `basedir` — absolute root path once materialized, else unset.
/// * `tempdir` — the owned temporary directory, present only when no
///   explicit base directory was given to `mktree`.
/// * `prevdir` — the working directory saved by the first `chdir`, restored
///   by `rmtree`.
///
/// The process working directory and the owned temporary directory are
/// treated as exclusively owned by this layout for its lifetime; two layouts
/// both calling `chdir` concurrently is unsupported.
///
/// ### Example
///
/// ```
/// use dirlay::{DirLayout, Node};
///
/// let mut layout = DirLayout::new([
///     ("docs/index.md", Node::from("# Docs\n")),
///     ("src", Node::empty_dir()),
/// ])
/// .unwrap();
///
/// let tree = layout.mount().unwrap();
/// assert!(tree.basedir().unwrap().join("docs/index.md").is_file());
/// drop(tree); // removes the materialized tree
/// assert!(layout.basedir().is_none());
/// ```
#[derive(Debug)]
pub struct DirLayout {
    tree: BTreeMap<String, Node>,
    basedir: Option<PathBuf>,
    tempdir: Option<TempDir>,
    prevdir: Option<PathBuf>,
}

impl DirLayout {
    /// Builds a layout from `(path, node)` entries.
    ///
    /// Paths may use `/`-joined shorthand for nested directories; directory
    /// nodes may nest further entries recursively. The entries are validated
    /// and merged into a canonical per-segment tree. No filesystem access
    /// happens here.
    ///
    /// Fails with [`Error::AbsolutePath`] for absolute paths or paths
    /// escaping the root, [`Error::NotADirectory`] when a segment collides
    /// with an already-added file, and [`Error::AlreadyExists`] for duplicate
    /// file paths.
    pub fn new<K, N, I>(entries: I) -> Result<Self>
    where
        K: AsRef<str>,
        N: Into<Node>,
        I: IntoIterator<Item = (K, N)>,
    {
        let mut tree = BTreeMap::new();
        for (path, node) in entries {
            add_path(&mut tree, Path::new(""), path.as_ref(), node.into())?;
        }
        Ok(Self {
            tree,
            basedir: None,
            tempdir: None,
            prevdir: None,
        })
    }

    /// Creates a layout with an empty tree.
    pub fn empty() -> Self {
        Self {
            tree: BTreeMap::new(),
            basedir: None,
            tempdir: None,
            prevdir: None,
        }
    }

    /// The absolute base directory, or `None` before `mktree` (and again
    /// after `rmtree`).
    pub fn basedir(&self) -> Option<&Path> {
        self.basedir.as_deref()
    }

    pub(crate) fn tree(&self) -> &BTreeMap<String, Node> {
        &self.tree
    }

    /// Returns a nested mapping snapshot of the tree, keys sorted at every
    /// level, directories as nested maps and files as their content.
    pub fn to_map(&self) -> BTreeMap<String, Node> {
        self.tree.clone()
    }

    /// Lazy depth-first enumeration of every tree entry with its relative
    /// path, kind and content. Directories come before their children.
    pub fn leaves(&self) -> Walk<'_> {
        walk(&self.tree)
    }

    // filesystem lifecycle

    /// Materializes the layout in a fresh uniquely-named temporary directory
    /// owned by the layout.
    pub fn mktree(&mut self) -> Result<()> {
        self.mktree_with(None, Chdir::Stay)
    }

    /// Materializes the layout under an explicit base directory, which must
    /// not already exist on disk.
    pub fn mktree_at<P: AsRef<Path>>(&mut self, basedir: P) -> Result<()> {
        self.mktree_with(Some(basedir.as_ref()), Chdir::Stay)
    }

    /// Materializes the layout and optionally changes into it.
    ///
    /// Without a base directory a temporary one is allocated and owned.
    /// Every directory node is created (parents as needed, idempotently) and
    /// every file node is written verbatim, overwriting existing files.
    /// The `chdir` step runs last, so its target already exists.
    pub fn mktree_with(&mut self, basedir: Option<&Path>, chdir: Chdir) -> Result<()> {
        let root = match basedir {
            None => {
                let tempdir = TempDir::new()?;
                let root = tempdir.path().to_path_buf();
                self.tempdir = Some(tempdir);
                root
            }
            Some(dir) => {
                if self.tempdir.is_none() && dir.exists() {
                    return Err(Error::AlreadyExists {
                        path: dir.to_path_buf(),
                    });
                }
                std::path::absolute(dir)?
            }
        };
        debug!("creating directory tree at {}", root.display());
        fs::create_dir_all(&root)?;
        for leaf in walk(&self.tree) {
            let target = root.join(&leaf.path);
            match leaf.content {
                None => fs::create_dir_all(&target)?,
                Some(content) => {
                    if let Some(parent) = target.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(&target, content)?;
                }
            }
        }
        self.basedir = Some(root);
        match chdir {
            Chdir::Stay => Ok(()),
            Chdir::Root => self.chdir("."),
            Chdir::Into(path) => self.chdir(path),
        }
    }

    /// Removes the materialized tree and restores prior state.
    ///
    /// Restores the working directory saved by `chdir`, releases the owned
    /// temporary directory, deletes the root recursively if it still exists
    /// and unsets the base directory. The in-memory tree is untouched; the
    /// layout can be materialized again.
    ///
    /// Fails with [`Error::NotMaterialized`] if `mktree` has not been called.
    pub fn rmtree(&mut self) -> Result<()> {
        if self.basedir.is_none() {
            return Err(Error::NotMaterialized);
        }
        if let Some(prevdir) = &self.prevdir {
            debug!("restoring working directory to {}", prevdir.display());
            // restore first; a failed restore keeps the saved directory so
            // rmtree can be retried
            env::set_current_dir(prevdir)?;
            self.prevdir = None;
        }
        if let Some(tempdir) = self.tempdir.take() {
            tempdir.close()?;
        }
        if let Some(basedir) = self.basedir.take() {
            if basedir.exists() {
                debug!("removing directory tree at {}", basedir.display());
                fs::remove_dir_all(&basedir)?;
            }
        }
        Ok(())
    }

    /// Changes the process working directory to a subdirectory of the base
    /// directory (`"."` or an empty path targets the base directory itself).
    ///
    /// The first call since materialization saves the current working
    /// directory; `rmtree` restores it.
    ///
    /// Fails with [`Error::NotMaterialized`] before `mktree`,
    /// [`Error::AbsolutePath`] for absolute input and [`Error::NotFound`] if
    /// the target directory does not exist.
    pub fn chdir<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let basedir = self.basedir.as_ref().ok_or(Error::NotMaterialized)?;
        let path = path.as_ref();
        if path.is_absolute() {
            return Err(Error::AbsolutePath {
                path: path.to_path_buf(),
            });
        }
        let target = basedir.join(path);
        if !target.is_dir() {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            });
        }
        if self.prevdir.is_none() {
            self.prevdir = Some(env::current_dir()?);
        }
        debug!("changing working directory to {}", target.display());
        env::set_current_dir(&target)?;
        Ok(())
    }

    // scoped lifecycle

    /// Materializes the layout in an owned temporary directory and returns a
    /// guard that removes it again when dropped.
    pub fn mount(&mut self) -> Result<Mounted<'_>> {
        self.mount_with(None, Chdir::Stay)
    }

    /// Like [`Self::mktree_at`], returning a cleanup guard.
    pub fn mount_at<P: AsRef<Path>>(&mut self, basedir: P) -> Result<Mounted<'_>> {
        self.mount_with(Some(basedir.as_ref()), Chdir::Stay)
    }

    /// Like [`Self::mktree_with`], returning a cleanup guard.
    pub fn mount_with(&mut self, basedir: Option<&Path>, chdir: Chdir) -> Result<Mounted<'_>> {
        self.mktree_with(basedir, chdir)?;
        Ok(Mounted { layout: self })
    }
}

impl Default for DirLayout {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for DirLayout {
    fn eq(&self, other: &Self) -> bool {
        self.basedir == other.basedir && self.tree == other.tree
    }
}

impl<'a> IntoIterator for &'a DirLayout {
    type Item = Leaf<'a>;
    type IntoIter = Walk<'a>;

    fn into_iter(self) -> Walk<'a> {
        self.leaves()
    }
}

/// Scoped handle to a materialized [`DirLayout`].
///
/// Dereferences to the layout; dropping it runs [`DirLayout::rmtree`] on
/// every exit path, including unwinding. A teardown failure during drop is
/// logged and otherwise ignored; call `rmtree` explicitly to observe it.
#[derive(Debug)]
pub struct Mounted<'a> {
    layout: &'a mut DirLayout,
}

impl Deref for Mounted<'_> {
    type Target = DirLayout;

    fn deref(&self) -> &DirLayout {
        self.layout
    }
}

impl DerefMut for Mounted<'_> {
    fn deref_mut(&mut self) -> &mut DirLayout {
        self.layout
    }
}

impl Drop for Mounted<'_> {
    fn drop(&mut self) {
        if self.layout.basedir.is_some() {
            if let Err(err) = self.layout.rmtree() {
                log::warn!("failed to remove directory tree: {err}");
            }
        }
    }
}

/// Validates `path`, splits it into segments and merges `node` into `base`.
/// `base_path` is the already-validated location of `base`, used in errors.
fn add_path(
    base: &mut BTreeMap<String, Node>,
    base_path: &Path,
    path: &str,
    node: Node,
) -> Result<()> {
    let parts = split_path(base_path, path)?;
    let (last, dirs) = match parts.split_last() {
        Some(parts) => parts,
        None => {
            // the whole path normalized away ("", "." and the like)
            return match node {
                Node::Dir(children) => {
                    for (name, child) in children {
                        add_path(base, base_path, &name, child)?;
                    }
                    Ok(())
                }
                Node::File(_) => Err(Error::InvalidPath {
                    path: path.to_string(),
                }),
            };
        }
    };

    // drill down intermediate directories
    let mut current = base;
    let mut walked = base_path.to_path_buf();
    for part in dirs {
        walked.push(part);
        current = match current
            .entry(part.clone())
            .or_insert_with(Node::empty_dir)
        {
            Node::Dir(children) => children,
            Node::File(_) => return Err(Error::NotADirectory { path: walked }),
        };
    }

    match node {
        Node::Dir(children) => {
            let target = match current.entry(last.clone()).or_insert_with(Node::empty_dir) {
                Node::Dir(existing) => existing,
                Node::File(_) => {
                    return Err(Error::NotADirectory {
                        path: walked.join(last),
                    });
                }
            };
            let child_base = walked.join(last);
            for (name, child) in children {
                add_path(target, &child_base, &name, child)?;
            }
        }
        Node::File(content) => {
            if current.contains_key(last) {
                return Err(Error::AlreadyExists {
                    path: walked.join(last),
                });
            }
            current.insert(last.clone(), Node::File(content));
        }
    }
    Ok(())
}

/// Splits a relative path into normalized segments. `.` segments vanish and
/// `..` pops, so `a/../b` becomes `b`; absolute paths and paths climbing out
/// of the root are rejected.
fn split_path(base_path: &Path, path: &str) -> Result<Vec<String>> {
    if Path::new(path).is_absolute() {
        return Err(Error::AbsolutePath {
            path: PathBuf::from(path),
        });
    }
    let mut parts: Vec<String> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return Err(Error::AbsolutePath {
                        path: base_path.join(path),
                    });
                }
            }
            name => parts.push(name.to_string()),
        }
    }
    Ok(parts)
}
