//! Syntax tree for the `[[ ]]`-delimited template language
//!
//! The node kinds are fixed by the template grammar, so the tree is a closed
//! sum type and every consumer matches exhaustively. Trees are produced once
//! by the parser and then only read.

use std::collections::HashSet;

/// A parsed template: its registry name plus the root of its syntax tree
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    pub name: String,
    pub root: Node,
}

impl Ast {
    /// Names of all templates referenced by inclusion nodes anywhere in the
    /// tree, in first-seen order, deduplicated.
    pub fn include_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut seen = HashSet::new();
        collect_includes(&self.root, &mut names, &mut seen);
        names
    }
}

/// One node of a template's syntax tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text between actions
    Text(String),
    /// Ordered sequence of child nodes
    List(Vec<Node>),
    /// A single evaluated expression: `[[pipe]]`
    Action(Pipe),
    /// `[[if pipe]] … [[else]] … [[end]]`
    Conditional(Box<Branch>),
    /// `[[range pipe]] … [[else]] … [[end]]` over the collection named by the pipe
    Loop(Box<Branch>),
    /// `[[with pipe]] … [[end]]`; the pipe's value becomes the context for the body
    Rebind(Box<Branch>),
    /// `[[template "name" pipe?]]` reference to another template
    Include(Include),
}

/// Shared shape of the three block constructs (if/range/with)
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub pipe: Pipe,
    pub body: Node,
    pub else_branch: Option<Node>,
}

/// An inclusion site, optionally passing an argument expression
#[derive(Debug, Clone, PartialEq)]
pub struct Include {
    pub line: usize,
    pub name: String,
    pub pipe: Option<Pipe>,
}

/// One evaluated expression: optional variable declarations followed by
/// `|`-chained commands
#[derive(Debug, Clone, PartialEq)]
pub struct Pipe {
    pub line: usize,
    /// Variables declared by this pipe (`$a, $b :=`); invisible to schema
    /// inference, bound by range/with at render time
    pub decls: Vec<String>,
    pub cmds: Vec<Command>,
}

/// One command of a pipe: an ordered sequence of arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub args: Vec<Arg>,
}

/// One argument of a command
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Context-rooted field path with the root marker stripped: `.a.b` → `["a", "b"]`
    Field(Vec<String>),
    /// Variable reference: `$v.x` → `["$v", "x"]`
    Variable(Vec<String>),
    /// The bare context reference `.`
    Context,
    /// Quoted string literal
    Str(String),
    /// Numeric literal
    Number(f64),
    /// `true` / `false`
    Bool(bool),
    /// Bare identifier (a function name); opaque to schema inference
    Ident(String),
}

fn collect_includes(node: &Node, names: &mut Vec<String>, seen: &mut HashSet<String>) {
    match node {
        Node::Text(_) | Node::Action(_) => {}
        Node::List(children) => {
            for child in children {
                collect_includes(child, names, seen);
            }
        }
        Node::Conditional(branch) | Node::Loop(branch) | Node::Rebind(branch) => {
            collect_includes(&branch.body, names, seen);
            if let Some(else_branch) = &branch.else_branch {
                collect_includes(else_branch, names, seen);
            }
        }
        Node::Include(include) => {
            if seen.insert(include.name.clone()) {
                names.push(include.name.clone());
            }
        }
    }
}
