//! Common helper functions for walking tree-sitter nodes

/// Get the text content of a node
pub fn get_text<'a>(node: &tree_sitter::Node<'a>, source: &'a str) -> Option<&'a str> {
    node.utf8_text(source.as_bytes()).ok()
}

/// Get text from a named field in a node
pub fn get_field_text<'a>(
    node: &tree_sitter::Node<'a>,
    field: &str,
    source: &'a str,
) -> Option<String> {
    node.child_by_field_name(field)
        .and_then(|n| get_text(&n, source))
        .map(|s| s.to_string())
}

/// 1-based line of a node's first row
pub fn line_of(node: &tree_sitter::Node) -> u32 {
    node.start_position().row as u32 + 1
}

/// Python 2 statement forms the grammar still accepts, keyed by node kind
const LEGACY_STATEMENTS: &[(&str, &str)] = &[
    ("print_statement", "print"),
    ("exec_statement", "exec"),
];

/// Describe the first ERROR or MISSING node, or Python 2 only statement,
/// under `root` in source order
pub fn first_syntax_error(root: &tree_sitter::Node) -> Option<String> {
    let mut stack = vec![*root];
    while let Some(node) = stack.pop() {
        if node.is_missing() {
            return Some(format!("missing '{}' at line {}", node.kind(), line_of(&node)));
        }
        if node.is_error() {
            return Some(format!("syntax error at line {}", line_of(&node)));
        }
        if let Some((_, keyword)) = LEGACY_STATEMENTS
            .iter()
            .find(|(kind, _)| *kind == node.kind())
        {
            return Some(format!(
                "Python 2 {keyword} statement at line {}",
                line_of(&node)
            ));
        }

        let mut cursor = node.walk();
        let children: Vec<tree_sitter::Node> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}
