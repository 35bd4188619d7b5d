//! TemplateKit - template language core for promptstore
//!
//! Parses `[[ ]]`-delimited prompt templates into a syntax tree, statically
//! infers the nested configuration schema a template (and its inclusions)
//! requires, and renders templates against a configuration. No file-system
//! access: inclusion names resolve through the [`TemplateLookup`] trait,
//! implemented by whoever owns the template set.
//!
//! # Example
//!
//! ```ignore
//! use templatekit::{parse, render, SchemaWalker};
//!
//! let ast = parse("greeting.tmpl", "Hello [[.user.name]]")?;
//! let mut walker = SchemaWalker::new(&set);
//! let schema = walker.walk_template("greeting.tmpl", &ast);
//! // schema == {"user": {"name": ""}}
//! let text = render("greeting.tmpl", &set, &config)?;
//! ```

pub mod ast;
pub mod error;
mod lexer;
pub mod merge;
pub mod parser;
pub mod render;
pub mod schema;

pub use ast::{Arg, Ast, Branch, Command, Include, Node, Pipe};
pub use error::Error;
pub use merge::merge_as_set;
pub use parser::parse;
pub use render::{MAX_INCLUDE_DEPTH, render};
pub use schema::{Schema, SchemaWalker, TemplateLookup, leaf, pipe_schema};
