//! Static schema inference
//!
//! Walks a template's syntax tree and derives the nested shape of
//! configuration data required to render it, without executing the template.
//! Fragments produced at different points of the walk accumulate through the
//! set merger, so the first shape observed for a key wins.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::warn;

use crate::ast::{Arg, Ast, Branch, Node, Pipe};
use crate::merge::merge_objects;

/// A mapping from field name to either the leaf marker or a nested schema
pub type Schema = Map<String, Value>;

/// The leaf marker: the value recorded where a scalar (or opaque) value is
/// required. The empty string doubles as the placeholder written into
/// synthesized configurations.
pub fn leaf() -> Value {
    Value::String(String::new())
}

/// Resolves inclusion names against a set of parsed templates during a walk.
pub trait TemplateLookup {
    fn lookup(&self, name: &str) -> Option<&Ast>;

    /// The canonical form of an inclusion name, used to detect repeat visits.
    /// Implementations that normalize names (default extensions, path forms)
    /// override this to match their `lookup`.
    fn canonical(&self, name: &str) -> String {
        name.to_string()
    }
}

/// Schema fragment implied by one pipe: every field and variable path becomes
/// a chain of nested requirements ending in a leaf marker.
///
/// Paths insert into a shared accumulator: intermediate segments reuse an
/// existing sub-mapping or replace a colliding non-mapping value with a fresh
/// one (deepening, never flattening); the terminal segment sets its key to
/// the leaf marker. Context references, literals, bare identifiers, and the
/// pipe's own declarations contribute nothing.
pub fn pipe_schema(pipe: &Pipe) -> Schema {
    let mut data = Schema::new();
    for cmd in &pipe.cmds {
        for arg in &cmd.args {
            match arg {
                Arg::Field(path) | Arg::Variable(path) => insert_path(&mut data, path),
                Arg::Context | Arg::Str(_) | Arg::Number(_) | Arg::Bool(_) | Arg::Ident(_) => {}
            }
        }
    }
    data
}

fn insert_path(data: &mut Schema, path: &[String]) {
    let Some((key, rest)) = path.split_first() else {
        return;
    };
    if rest.is_empty() {
        data.insert(key.clone(), leaf());
        return;
    }
    let entry = data
        .entry(key.clone())
        .or_insert_with(|| Value::Object(Schema::new()));
    if !entry.is_object() {
        *entry = Value::Object(Schema::new());
    }
    if let Value::Object(nested) = entry {
        insert_path(nested, rest);
    }
}

/// Recursive walker producing the full nested schema for a template tree.
///
/// Holds the template set for resolving inclusions and a visited-name set so
/// that cyclic inclusion graphs expand each template at most once per walk;
/// contributions that would only appear on a second pass are knowingly
/// dropped.
pub struct SchemaWalker<'a> {
    templates: &'a dyn TemplateLookup,
    visited: HashSet<String>,
}

impl<'a> SchemaWalker<'a> {
    pub fn new(templates: &'a dyn TemplateLookup) -> Self {
        SchemaWalker {
            templates,
            visited: HashSet::new(),
        }
    }

    /// Walk a named template's tree. The name is marked visited first so
    /// self-inclusion cannot re-expand the root.
    pub fn walk_template(&mut self, name: &str, ast: &Ast) -> Schema {
        self.visited.insert(self.templates.canonical(name));
        self.walk(&ast.root)
    }

    /// Schema fragment required by one node and everything beneath it.
    pub fn walk(&mut self, node: &Node) -> Schema {
        match node {
            Node::Text(_) => Schema::new(),
            Node::List(children) => {
                let mut data = Schema::new();
                for child in children {
                    data = merge_objects(&data, &self.walk(child));
                }
                data
            }
            Node::Action(pipe) => pipe_schema(pipe),
            // A loop's source pipe marks the sequence key with a leaf; the
            // body describes one element but its fields surface as top-level
            // requirements (deliberate flattening, kept for compatibility
            // with the configurations this schema format has always implied).
            Node::Conditional(branch) | Node::Loop(branch) => self.walk_branch(branch),
            Node::Rebind(branch) => self.walk_rebind(branch),
            Node::Include(include) => {
                let mut data = Schema::new();
                if self.visited.insert(self.templates.canonical(&include.name)) {
                    match self.templates.lookup(&include.name) {
                        Some(ast) => data = merge_objects(&data, &self.walk(&ast.root)),
                        None => {
                            warn!(template = %include.name, "included template not resolved, contributing nothing");
                        }
                    }
                }
                if let Some(pipe) = &include.pipe {
                    data = merge_objects(&data, &pipe_schema(pipe));
                }
                data
            }
        }
    }

    fn walk_branch(&mut self, branch: &Branch) -> Schema {
        let mut data = pipe_schema(&branch.pipe);
        data = merge_objects(&data, &self.walk(&branch.body));
        if let Some(else_branch) = &branch.else_branch {
            data = merge_objects(&data, &self.walk(else_branch));
        }
        data
    }

    /// A rebind changes the reference context, so the body's fragment is
    /// reparented under the target key instead of merging at the top level:
    /// the leaf the target pipe produced becomes a nested mapping holding the
    /// body's requirements.
    fn walk_rebind(&mut self, branch: &Branch) -> Schema {
        let target = pipe_schema(&branch.pipe);
        let mut data = target.clone();
        let inner = self.walk(&branch.body);
        for key in target.keys() {
            let entry = data
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Schema::new()));
            if !entry.is_object() {
                *entry = Value::Object(Schema::new());
            }
            if let Value::Object(nested) = entry {
                for (inner_key, inner_value) in &inner {
                    nested.insert(inner_key.clone(), inner_value.clone());
                }
            }
        }
        if let Some(else_branch) = &branch.else_branch {
            data = merge_objects(&data, &self.walk(else_branch));
        }
        data
    }
}
