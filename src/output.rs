//! Plain-text rendering of a dependency tree

use crate::lookup::traversal::Node;

const INDENT: &str = "    ";

/// One line per node, indented by depth:
///
/// ```text
/// express@4.18.2
///     accepts@1.3.8
///     left-pad ERROR: Package Not Found
/// ```
pub fn render_tree(root: &Node) -> String {
    let mut out = String::new();

    root.walk(|node, depth| {
        out.push_str(&INDENT.repeat(depth));
        out.push_str(&node_label(node));
        out.push('\n');
    });

    out
}

/// `name@version`, `name ERROR: <tag>`, or `name@range` for a node that was
/// never resolved
fn node_label(node: &Node) -> String {
    match (&node.error, &node.version) {
        (Some(error), _) => format!("{} ERROR: {error}", node.name),
        (None, Some(version)) => format!("{}@{version}", node.name),
        (None, None) => format!("{}@{}", node.name, node.range),
    }
}
