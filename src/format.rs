//! Plain-text tree rendering of a directory layout.

use std::collections::BTreeMap;

use crate::layout::DirLayout;
use crate::node::Node;

/// Rendering options, both off by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeFormat {
    /// Show the resolved base directory as the root line instead of `.`.
    /// Falls back to `.` while the layout is not materialized.
    pub show_basedir: bool,
    /// Render non-empty file contents in a box under the file name.
    pub show_content: bool,
}

/// Renders the layout as a tree with box-drawing guides.
///
/// ```
/// use dirlay::{DirLayout, Node, TreeFormat, render_tree};
///
/// let layout = DirLayout::new([(
///     "a",
///     Node::dir([("b/c.txt", Node::from("ccc")), ("d.txt", Node::from("ddd"))]),
/// )])
/// .unwrap();
///
/// assert_eq!(
///     render_tree(&layout, &TreeFormat::default()),
///     ".\n\
///      └── a\n\
///      \x20   ├── b\n\
///      \x20   │   └── c.txt\n\
///      \x20   └── d.txt\n",
/// );
/// ```
pub fn render_tree(layout: &DirLayout, format: &TreeFormat) -> String {
    let mut out = String::new();
    match layout.basedir() {
        Some(basedir) if format.show_basedir => out.push_str(&basedir.display().to_string()),
        _ => out.push('.'),
    }
    out.push('\n');
    render_children(layout.tree(), "", format, &mut out);
    out
}

fn render_children(
    children: &BTreeMap<String, Node>,
    prefix: &str,
    format: &TreeFormat,
    out: &mut String,
) {
    let last_index = children.len().saturating_sub(1);
    for (index, (name, node)) in children.iter().enumerate() {
        let (branch, guide) = if index == last_index {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        out.push_str(prefix);
        out.push_str(branch);
        out.push_str(name);
        out.push('\n');
        let child_prefix = format!("{prefix}{guide}");
        match node {
            Node::Dir(grandchildren) => {
                render_children(grandchildren, &child_prefix, format, out);
            }
            Node::File(content) => {
                if format.show_content && !content.is_empty() {
                    render_content_box(content, &child_prefix, out);
                }
            }
        }
    }
}

/// Draws file content in a rounded box under the file name.
fn render_content_box(content: &str, prefix: &str, out: &mut String) {
    let lines: Vec<&str> = content.lines().collect();
    let width = lines.iter().map(|line| line.chars().count()).max().unwrap_or(0);

    out.push_str(prefix);
    out.push('╭');
    for _ in 0..width + 2 {
        out.push('─');
    }
    out.push_str("╮\n");
    for line in &lines {
        out.push_str(prefix);
        out.push_str("│ ");
        out.push_str(line);
        for _ in line.chars().count()..width {
            out.push(' ');
        }
        out.push_str(" │\n");
    }
    out.push_str(prefix);
    out.push('╰');
    for _ in 0..width + 2 {
        out.push('─');
    }
    out.push_str("╯\n");
}

impl DirLayout {
    /// Prints the tree rendering to stdout.
    pub fn print_tree(&self, format: &TreeFormat) {
        print!("{}", render_tree(self, format));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DirLayout {
        DirLayout::new([(
            "a",
            Node::dir([("b/c.txt", Node::from("ccc")), ("d.txt", Node::from("ddd"))]),
        )])
        .unwrap()
    }

    #[test]
    fn test_render_plain() {
        let rendered = render_tree(&sample(), &TreeFormat::default());
        let expected = "\
.
└── a
    ├── b
    │   └── c.txt
    └── d.txt
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_render_with_content() {
        let format = TreeFormat {
            show_content: true,
            ..TreeFormat::default()
        };
        let rendered = render_tree(&sample(), &format);
        let expected = "\
.
└── a
    ├── b
    │   └── c.txt
    │       ╭─────╮
    │       │ ccc │
    │       ╰─────╯
    └── d.txt
        ╭─────╮
        │ ddd │
        ╰─────╯
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_render_multiline_content_pads_to_widest_line() {
        let layout = DirLayout::new([("notes.txt", Node::from("one\nlonger line\n"))]).unwrap();
        let format = TreeFormat {
            show_content: true,
            ..TreeFormat::default()
        };
        let rendered = render_tree(&layout, &format);
        let expected = "\
.
└── notes.txt
    ╭─────────────╮
    │ one         │
    │ longer line │
    ╰─────────────╯
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_render_empty_file_content_is_skipped() {
        let layout = DirLayout::new([("empty.txt", Node::from(""))]).unwrap();
        let format = TreeFormat {
            show_content: true,
            ..TreeFormat::default()
        };
        assert_eq!(render_tree(&layout, &format), ".\n└── empty.txt\n");
    }

    #[test]
    fn test_render_basedir_root() {
        let mut layout = sample();
        // not materialized yet, placeholder root
        let format = TreeFormat {
            show_basedir: true,
            ..TreeFormat::default()
        };
        assert!(render_tree(&layout, &format).starts_with(".\n"));

        layout.mktree().unwrap();
        let rendered = render_tree(&layout, &format);
        let basedir = layout.basedir().unwrap().display().to_string();
        assert!(rendered.starts_with(&basedir));
        layout.rmtree().unwrap();
    }

    #[test]
    fn test_render_basedir_and_content_together() {
        let mut layout = sample();
        layout.mktree().unwrap();
        let format = TreeFormat {
            show_basedir: true,
            show_content: true,
        };
        let rendered = render_tree(&layout, &format);
        let mut expected = layout.basedir().unwrap().display().to_string();
        expected.push('\n');
        expected.push_str(
            "\
└── a
    ├── b
    │   └── c.txt
    │       ╭─────╮
    │       │ ccc │
    │       ╰─────╯
    └── d.txt
        ╭─────╮
        │ ddd │
        ╰─────╯
",
        );
        assert_eq!(rendered, expected);
        layout.rmtree().unwrap();
    }
}
