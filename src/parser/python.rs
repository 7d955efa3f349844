//! Python graph extractor
//!
//! Walks a tree-sitter Python tree once and records:
//! - `Class` entities and `INHERITS` edges for plain-identifier bases
//! - `Function` / `Method` entities and `BELONGS_TO` edges for methods
//! - `CALLS` edges from the nearest enclosing function to each resolvable callee
//!
//! Scope is an explicit stack pushed on entering a class or function body and
//! popped on exit, so arbitrarily nested closures and inner classes keep the
//! right caller and the right `self` class.

use crate::neo4j::models::*;
use crate::parser::helpers::*;
use crate::parser::ParsedFile;

#[derive(Debug, Clone)]
enum Scope {
    Class(String),
    Function(String),
}

struct Extractor<'a> {
    source: &'a str,
    file_path: &'a str,
    /// Dotted module prefix in qualified identity mode
    module: Option<&'a str>,
    scopes: Vec<Scope>,
    entities: Vec<Entity>,
    relations: Vec<Relation>,
}

/// Extract entities and relations from a parsed Python module
pub fn extract(
    root: &tree_sitter::Node,
    source: &str,
    file_path: &str,
    module: Option<&str>,
) -> ParsedFile {
    let mut extractor = Extractor {
        source,
        file_path,
        module: module.filter(|m| !m.is_empty()),
        scopes: Vec::new(),
        entities: Vec::new(),
        relations: Vec::new(),
    };
    extractor.visit(root);

    ParsedFile {
        path: file_path.to_string(),
        entities: extractor.entities,
        relations: extractor.relations,
    }
}

impl Extractor<'_> {
    fn visit(&mut self, node: &tree_sitter::Node) {
        match node.kind() {
            "class_definition" => self.visit_class(node),
            "function_definition" => self.visit_function(node),
            "call" => {
                self.record_call(node);
                self.visit_children(node);
            }
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: &tree_sitter::Node) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(&child);
        }
    }

    fn visit_class(&mut self, node: &tree_sitter::Node) {
        let Some(name) = get_field_text(node, "name", self.source) else {
            self.visit_children(node);
            return;
        };
        let class_name = self.qualify(&name);

        self.entities.push(Entity {
            name: class_name.clone(),
            kind: EntityKind::Class,
            filepath: self.file_path.to_string(),
            line: line_of(node),
        });

        if let Some(bases) = node.child_by_field_name("superclasses") {
            let mut cursor = bases.walk();
            for base in bases.named_children(&mut cursor) {
                if base.kind() != "identifier" {
                    continue;
                }
                if let Some(base_name) = get_text(&base, self.source) {
                    let base_name = self.qualify(base_name);
                    self.relations.push(Relation::new(
                        class_name.clone(),
                        base_name,
                        RelationKind::Inherits,
                    ));
                }
            }
            // Base expressions run in the enclosing scope
            self.visit(&bases);
        }

        if let Some(body) = node.child_by_field_name("body") {
            self.scopes.push(Scope::Class(class_name));
            self.visit(&body);
            self.scopes.pop();
        }
    }

    fn visit_function(&mut self, node: &tree_sitter::Node) {
        let Some(name) = get_field_text(node, "name", self.source) else {
            self.visit_children(node);
            return;
        };

        // Any def under a class, including one nested in a method, is a method
        // of the nearest class
        let (full_name, kind, owner) = match self.current_class() {
            Some(class) => (
                format!("{}.{}", class, name),
                EntityKind::Method,
                Some(class.to_string()),
            ),
            None => (self.qualify(&name), EntityKind::Function, None),
        };

        self.entities.push(Entity {
            name: full_name.clone(),
            kind,
            filepath: self.file_path.to_string(),
            line: line_of(node),
        });

        if let Some(class) = owner {
            self.relations.push(Relation::new(
                full_name.clone(),
                class,
                RelationKind::BelongsTo,
            ));
        }

        // Defaults and annotations are evaluated in the enclosing scope
        for field in ["parameters", "return_type"] {
            if let Some(child) = node.child_by_field_name(field) {
                self.visit(&child);
            }
        }

        if let Some(body) = node.child_by_field_name("body") {
            self.scopes.push(Scope::Function(full_name));
            self.visit(&body);
            self.scopes.pop();
        }
    }

    fn record_call(&mut self, node: &tree_sitter::Node) {
        let Some(caller) = self.current_function() else {
            return;
        };
        let Some(callee) = node
            .child_by_field_name("function")
            .and_then(|func| self.resolve_callee(&func))
        else {
            return;
        };

        self.relations
            .push(Relation::new(caller, callee, RelationKind::Calls));
    }

    /// `f()` -> `f`, `self.m()` -> `Class.m`, `obj.m()` -> `m`.
    ///
    /// `obj.m()` keeps only the attribute name: without type inference the
    /// receiver is unknown, so unrelated classes sharing a method name collide.
    fn resolve_callee(&self, func: &tree_sitter::Node) -> Option<String> {
        match func.kind() {
            "identifier" => get_text(func, self.source).map(|name| self.qualify(name)),
            "attribute" => {
                let object = func.child_by_field_name("object")?;
                if object.kind() != "identifier" {
                    return None;
                }
                let attr = get_field_text(func, "attribute", self.source)?;
                match (get_text(&object, self.source)?, self.current_class()) {
                    ("self", Some(class)) => Some(format!("{}.{}", class, attr)),
                    _ => Some(attr),
                }
            }
            _ => None,
        }
    }

    fn current_function(&self) -> Option<String> {
        self.scopes.iter().rev().find_map(|scope| match scope {
            Scope::Function(name) => Some(name.clone()),
            Scope::Class(_) => None,
        })
    }

    fn current_class(&self) -> Option<&str> {
        self.scopes.iter().rev().find_map(|scope| match scope {
            Scope::Class(name) => Some(name.as_str()),
            Scope::Function(_) => None,
        })
    }

    fn qualify(&self, name: &str) -> String {
        match self.module {
            Some(module) => format!("{}.{}", module, name),
            None => name.to_string(),
        }
    }
}
