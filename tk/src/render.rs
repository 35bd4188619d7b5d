//! Rendering engine for parsed templates
//!
//! Substitutes configuration values into a template's syntax tree. Binding
//! semantics mirror the schema walker's interpretation: field paths resolve
//! from the current context, `with` rebinds the context, `range` binds each
//! element as the context, and a missing conditional or loop source is
//! falsey rather than an error. Only an output action over a missing field
//! fails, so a configuration covering the inferred schema renders cleanly.

use serde_json::{Number, Value};

use crate::ast::{Arg, Branch, Command, Node, Pipe};
use crate::error::Error;
use crate::schema::TemplateLookup;

/// Upper bound on nested `[[template]]` expansion; cyclic inclusion sets hit
/// this instead of recursing unboundedly.
pub const MAX_INCLUDE_DEPTH: usize = 16;

/// Render the named template against a configuration value.
pub fn render(name: &str, templates: &dyn TemplateLookup, config: &Value) -> Result<String, Error> {
    let ast = templates
        .lookup(name)
        .ok_or_else(|| Error::UnknownTemplate {
            name: name.to_string(),
        })?;
    let mut out = String::new();
    let mut renderer = Renderer {
        templates,
        depth: 0,
    };
    let mut vars = VarScope::new();
    renderer.node(&ast.root, config, &mut vars, &mut out)?;
    Ok(out)
}

type VarScope = Vec<(String, Value)>;

struct Renderer<'a> {
    templates: &'a dyn TemplateLookup,
    depth: usize,
}

impl Renderer<'_> {
    fn node(
        &mut self,
        node: &Node,
        ctx: &Value,
        vars: &mut VarScope,
        out: &mut String,
    ) -> Result<(), Error> {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::List(children) => {
                let mark = vars.len();
                for child in children {
                    self.node(child, ctx, vars, out)?;
                }
                vars.truncate(mark);
            }
            Node::Action(pipe) => {
                if pipe.decls.is_empty() {
                    let value = self.pipe(pipe, ctx, vars, true)?;
                    write_value(&value, out)?;
                } else {
                    // An assignment action binds its value and emits nothing.
                    let value = self.pipe(pipe, ctx, vars, false)?;
                    for name in &pipe.decls {
                        vars.push((name.clone(), value.clone()));
                    }
                }
            }
            Node::Conditional(branch) => {
                let condition = self.pipe(&branch.pipe, ctx, vars, false)?;
                if is_truthy(&condition) {
                    self.node(&branch.body, ctx, vars, out)?;
                } else if let Some(else_branch) = &branch.else_branch {
                    self.node(else_branch, ctx, vars, out)?;
                }
            }
            Node::Loop(branch) => self.loop_node(branch, ctx, vars, out)?,
            Node::Rebind(branch) => {
                let target = self.pipe(&branch.pipe, ctx, vars, false)?;
                if is_truthy(&target) {
                    let mark = vars.len();
                    if let Some(name) = branch.pipe.decls.first() {
                        vars.push((name.clone(), target.clone()));
                    }
                    self.node(&branch.body, &target, vars, out)?;
                    vars.truncate(mark);
                } else if let Some(else_branch) = &branch.else_branch {
                    self.node(else_branch, ctx, vars, out)?;
                }
            }
            Node::Include(include) => {
                if self.depth >= MAX_INCLUDE_DEPTH {
                    return Err(Error::IncludeDepth {
                        max: MAX_INCLUDE_DEPTH,
                    });
                }
                let ast = self.templates.lookup(&include.name).ok_or_else(|| {
                    Error::UnknownTemplate {
                        name: include.name.clone(),
                    }
                })?;
                let arg = match &include.pipe {
                    Some(pipe) => self.pipe(pipe, ctx, vars, false)?,
                    None => Value::Null,
                };
                self.depth += 1;
                // Variables do not cross template boundaries.
                let mut inner_vars = VarScope::new();
                let result = self.node(&ast.root, &arg, &mut inner_vars, out);
                self.depth -= 1;
                result?;
            }
        }
        Ok(())
    }

    fn loop_node(
        &mut self,
        branch: &Branch,
        ctx: &Value,
        vars: &mut VarScope,
        out: &mut String,
    ) -> Result<(), Error> {
        let source = self.pipe(&branch.pipe, ctx, vars, false)?;
        match &source {
            Value::Array(items) if !items.is_empty() => {
                for (index, item) in items.iter().enumerate() {
                    let mark = vars.len();
                    bind_loop_vars(&branch.pipe.decls, Value::from(index), item, vars);
                    self.node(&branch.body, item, vars, out)?;
                    vars.truncate(mark);
                }
            }
            Value::Object(entries) if !entries.is_empty() => {
                for (key, item) in entries {
                    let mark = vars.len();
                    bind_loop_vars(
                        &branch.pipe.decls,
                        Value::String(key.clone()),
                        item,
                        vars,
                    );
                    self.node(&branch.body, item, vars, out)?;
                    vars.truncate(mark);
                }
            }
            Value::Array(_) | Value::Object(_) | Value::Null => {
                if let Some(else_branch) = &branch.else_branch {
                    self.node(else_branch, ctx, vars, out)?;
                }
            }
            other => {
                return Err(Error::NotIterable {
                    kind: value_kind(other),
                });
            }
        }
        Ok(())
    }

    /// Evaluate a pipe. Without functions a pipeline degenerates to its last
    /// command's value. `strict` makes a missing field an error; lenient
    /// evaluation resolves it to null (conditions, loop sources, arguments).
    fn pipe(
        &mut self,
        pipe: &Pipe,
        ctx: &Value,
        vars: &VarScope,
        strict: bool,
    ) -> Result<Value, Error> {
        let mut value = Value::Null;
        for cmd in &pipe.cmds {
            value = self.command(cmd, ctx, vars, strict)?;
        }
        Ok(value)
    }

    fn command(
        &mut self,
        cmd: &Command,
        ctx: &Value,
        vars: &VarScope,
        strict: bool,
    ) -> Result<Value, Error> {
        match cmd.args.as_slice() {
            [] => Ok(Value::Null),
            [arg] => self.arg(arg, ctx, vars, strict),
            [first, ..] => Err(Error::NotCallable {
                what: arg_display(first),
            }),
        }
    }

    fn arg(
        &mut self,
        arg: &Arg,
        ctx: &Value,
        vars: &VarScope,
        strict: bool,
    ) -> Result<Value, Error> {
        match arg {
            Arg::Context => Ok(ctx.clone()),
            Arg::Str(value) => Ok(Value::String(value.clone())),
            Arg::Bool(value) => Ok(Value::Bool(*value)),
            Arg::Number(value) => Ok(number_value(*value)),
            Arg::Ident(name) => Err(Error::NotCallable { what: name.clone() }),
            Arg::Field(path) => match lookup_path(ctx, path) {
                Some(value) => Ok(value.clone()),
                None if strict => Err(Error::MissingValue {
                    path: format!(".{}", path.join(".")),
                }),
                None => Ok(Value::Null),
            },
            Arg::Variable(path) => {
                let Some((name, rest)) = path.split_first() else {
                    return Ok(Value::Null);
                };
                let base = vars
                    .iter()
                    .rev()
                    .find(|(bound, _)| bound == name)
                    .map(|(_, value)| value)
                    .ok_or_else(|| Error::UndefinedVariable { name: name.clone() })?;
                match lookup_path(base, rest) {
                    Some(value) => Ok(value.clone()),
                    None if strict => Err(Error::MissingValue {
                        path: path.join("."),
                    }),
                    None => Ok(Value::Null),
                }
            }
        }
    }
}

fn bind_loop_vars(decls: &[String], index: Value, element: &Value, vars: &mut VarScope) {
    match decls {
        [] => {}
        [element_var] => vars.push((element_var.clone(), element.clone())),
        [index_var, element_var, ..] => {
            vars.push((index_var.clone(), index));
            vars.push((element_var.clone(), element.clone()));
        }
    }
}

fn lookup_path<'v>(base: &'v Value, path: &[String]) -> Option<&'v Value> {
    let mut current = base;
    for segment in path {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn write_value(value: &Value, out: &mut String) -> Result<(), Error> {
    match value {
        Value::String(text) => out.push_str(text),
        Value::Number(number) => out.push_str(&number.to_string()),
        Value::Bool(flag) => out.push_str(if *flag { "true" } else { "false" }),
        Value::Null | Value::Array(_) | Value::Object(_) => {
            return Err(Error::Unrenderable {
                kind: value_kind(value),
            });
        }
    }
    Ok(())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|f| f != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(entries) => !entries.is_empty(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn arg_display(arg: &Arg) -> String {
    match arg {
        Arg::Field(path) => format!(".{}", path.join(".")),
        Arg::Variable(path) => path.join("."),
        Arg::Context => ".".to_string(),
        Arg::Str(value) => format!("{value:?}"),
        Arg::Number(value) => value.to_string(),
        Arg::Bool(value) => value.to_string(),
        Arg::Ident(name) => name.clone(),
    }
}
