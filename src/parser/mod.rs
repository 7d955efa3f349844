//! Tree-sitter based Python parser
//!
//! Turns one source file into the entities and relations of the code graph.
//! Extraction is pure: no I/O, no store access.

pub mod helpers;
pub mod python;

use crate::error::{GraphError, Result};
use crate::neo4j::models::*;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tree_sitter::Parser;

/// File extensions accepted by [`CodeParser::parse_file`]
pub const PYTHON_EXTENSIONS: &[&str] = &["py", "pyi"];

/// How entity names are formed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityMode {
    /// Declared names only (`Class.method` for methods); same names in
    /// different files collide into one entity
    #[default]
    Bare,
    /// Names prefixed by the dotted module path of their file
    Qualified,
}

impl std::str::FromStr for IdentityMode {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bare" => Ok(Self::Bare),
            "qualified" => Ok(Self::Qualified),
            other => Err(GraphError::Config(format!(
                "unknown identity mode '{other}' (expected 'bare' or 'qualified')"
            ))),
        }
    }
}

/// Result of parsing a file
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub path: String,
    pub entities: Vec<Entity>,
    pub relations: Vec<Relation>,
}

/// Code parser using tree-sitter
pub struct CodeParser {
    parser: Parser,
    identity: IdentityMode,
    source_root: Option<PathBuf>,
}

impl CodeParser {
    /// Create a new code parser
    pub fn new(identity: IdentityMode) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| GraphError::ParserInit(e.to_string()))?;

        Ok(Self {
            parser,
            identity,
            source_root: None,
        })
    }

    /// Root that module paths are computed against in qualified mode
    pub fn with_source_root(mut self, root: Option<PathBuf>) -> Self {
        self.source_root = root;
        self
    }

    pub fn identity(&self) -> IdentityMode {
        self.identity
    }

    /// Parse a Python file, using the configured source root for module paths
    pub fn parse_file(&mut self, path: &Path, content: &str) -> Result<ParsedFile> {
        let root = self.source_root.clone();
        self.parse_file_under(path, content, root.as_deref())
    }

    /// Parse a Python file whose module path is relative to `root`
    pub fn parse_file_under(
        &mut self,
        path: &Path,
        content: &str,
        root: Option<&Path>,
    ) -> Result<ParsedFile> {
        let path_str = path.to_string_lossy().to_string();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();

        if !PYTHON_EXTENSIONS.contains(&ext.as_str()) {
            return Err(GraphError::parse(
                &path_str,
                format!("unsupported file extension '{ext}'"),
            ));
        }

        let module = match self.identity {
            IdentityMode::Bare => None,
            IdentityMode::Qualified => Some(module_path(path, root)),
        };

        self.parse_source(&path_str, content, module.as_deref())
    }

    /// Parse source text directly. `file_path` is recorded as metadata only;
    /// `module` prefixes names when set.
    pub fn parse_source(
        &mut self,
        file_path: &str,
        content: &str,
        module: Option<&str>,
    ) -> Result<ParsedFile> {
        let tree = self
            .parser
            .parse(content, None)
            .ok_or_else(|| GraphError::parse(file_path, "parser produced no tree"))?;

        let root = tree.root_node();
        if let Some(message) = helpers::first_syntax_error(&root) {
            return Err(GraphError::parse(file_path, message));
        }

        Ok(python::extract(&root, content, file_path, module))
    }
}

/// Dotted module path of a file: `pkg/util.py` -> `pkg.util`,
/// `pkg/__init__.py` -> `pkg`. Components above `root` are dropped when the
/// path lies under it.
pub fn module_path(path: &Path, root: Option<&Path>) -> String {
    let relative = root
        .and_then(|r| path.strip_prefix(r).ok())
        .unwrap_or(path);

    let mut parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if let Some(last) = parts.last_mut() {
        let stem = Path::new(last.as_str())
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned());
        if let Some(stem) = stem {
            *last = stem;
        }
    }
    if parts.last().is_some_and(|p| p == "__init__") {
        parts.pop();
    }

    parts.join(".")
}
