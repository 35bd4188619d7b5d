//! Parser for the `[[ ]]`-delimited template syntax
//!
//! The source is walked once, splitting it into literal text and actions. A
//! stack of control frames tracks open `if`/`range`/`with` blocks so their
//! bodies can be populated when the matching `[[end]]` arrives; `else if`
//! chains push an extra frame that the same `end` closes. Trim markers
//! (`[[-` / `-]]`) strip whitespace adjacent to an action.

use crate::ast::{Arg, Ast, Branch, Command, Include, Node, Pipe};
use crate::error::Error;
use crate::lexer::{self, Token};

const OPEN: &str = "[[";
const CLOSE: &str = "]]";

/// Parse template source into a syntax tree.
pub fn parse(name: &str, source: &str) -> Result<Ast, Error> {
    let parser = Parser {
        source,
        cursor: 0,
        root: Vec::new(),
        stack: Vec::new(),
    };
    Ok(Ast {
        name: name.to_string(),
        root: parser.run()?,
    })
}

#[derive(Clone, Copy, PartialEq)]
enum FrameKind {
    If,
    Range,
    With,
}

impl FrameKind {
    fn keyword(self) -> &'static str {
        match self {
            FrameKind::If => "if",
            FrameKind::Range => "range",
            FrameKind::With => "with",
        }
    }
}

struct Frame {
    kind: FrameKind,
    line: usize,
    pipe: Pipe,
    body: Vec<Node>,
    else_nodes: Vec<Node>,
    in_else: bool,
    /// Opened by `else if`: the enclosing `end` closes this frame and its parent
    else_if: bool,
}

impl Frame {
    fn new(kind: FrameKind, pipe: Pipe, line: usize, else_if: bool) -> Self {
        Frame {
            kind,
            line,
            pipe,
            body: Vec::new(),
            else_nodes: Vec::new(),
            in_else: false,
            else_if,
        }
    }

    fn into_node(self) -> Node {
        let Frame {
            kind,
            pipe,
            body,
            else_nodes,
            in_else,
            ..
        } = self;
        let branch = Box::new(Branch {
            pipe,
            body: Node::List(body),
            else_branch: in_else.then(|| Node::List(else_nodes)),
        });
        match kind {
            FrameKind::If => Node::Conditional(branch),
            FrameKind::Range => Node::Loop(branch),
            FrameKind::With => Node::Rebind(branch),
        }
    }
}

struct Parser<'a> {
    source: &'a str,
    cursor: usize,
    root: Vec<Node>,
    stack: Vec<Frame>,
}

impl Parser<'_> {
    fn run(mut self) -> Result<Node, Error> {
        while self.cursor < self.source.len() {
            match self.source[self.cursor..].find(OPEN) {
                None => {
                    let text = &self.source[self.cursor..];
                    self.push(Node::Text(text.to_string()));
                    self.cursor = self.source.len();
                }
                Some(offset) => {
                    let open = self.cursor + offset;
                    if open > self.cursor {
                        let text = &self.source[self.cursor..open];
                        self.push(Node::Text(text.to_string()));
                    }
                    self.cursor = open;
                    self.action()?;
                }
            }
        }
        if let Some(frame) = self.stack.last() {
            return Err(Error::parse(
                frame.line,
                format!("unterminated {} block", frame.kind.keyword()),
            ));
        }
        Ok(Node::List(self.root))
    }

    fn action(&mut self) -> Result<(), Error> {
        let line = line_of(self.source, self.cursor);
        let start = self.cursor + OPEN.len();
        let Some(close) = find_close(self.source, start) else {
            return Err(Error::parse(line, "unclosed action"));
        };
        let mut body = &self.source[start..close];

        let mut trim_right = false;
        if let Some(rest) = body.strip_prefix('-') {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                self.trim_trailing_text();
                body = rest;
            }
        }
        if let Some(rest) = body.strip_suffix('-') {
            if rest.is_empty() || rest.ends_with(char::is_whitespace) {
                trim_right = true;
                body = rest;
            }
        }
        self.cursor = close + CLOSE.len();
        if trim_right {
            let rest = &self.source[self.cursor..];
            self.cursor += rest.len() - rest.trim_start().len();
        }

        let trimmed = body.trim();
        if trimmed.starts_with("/*") {
            if !trimmed.ends_with("*/") {
                return Err(Error::parse(line, "unclosed comment"));
            }
            return Ok(());
        }

        let tokens = lexer::lex(body, line)?;
        match tokens.first() {
            None => Err(Error::parse(line, "empty action")),
            Some(Token::Ident(word)) if word == "if" => {
                let pipe = parse_pipe(&tokens[1..], line)?;
                self.stack.push(Frame::new(FrameKind::If, pipe, line, false));
                Ok(())
            }
            Some(Token::Ident(word)) if word == "range" => {
                let pipe = parse_pipe(&tokens[1..], line)?;
                self.stack
                    .push(Frame::new(FrameKind::Range, pipe, line, false));
                Ok(())
            }
            Some(Token::Ident(word)) if word == "with" => {
                let pipe = parse_pipe(&tokens[1..], line)?;
                self.stack
                    .push(Frame::new(FrameKind::With, pipe, line, false));
                Ok(())
            }
            Some(Token::Ident(word)) if word == "else" => self.else_action(&tokens[1..], line),
            Some(Token::Ident(word)) if word == "end" => {
                if tokens.len() > 1 {
                    return Err(Error::parse(line, "unexpected tokens after end"));
                }
                self.end_action(line)
            }
            Some(Token::Ident(word)) if word == "template" => self.include_action(&tokens, line),
            Some(_) => {
                let pipe = parse_pipe(&tokens, line)?;
                self.push(Node::Action(pipe));
                Ok(())
            }
        }
    }

    fn include_action(&mut self, tokens: &[Token], line: usize) -> Result<(), Error> {
        let Some(Token::Str(name)) = tokens.get(1) else {
            return Err(Error::parse(line, "template action requires a quoted name"));
        };
        let pipe = if tokens.len() > 2 {
            Some(parse_pipe(&tokens[2..], line)?)
        } else {
            None
        };
        self.push(Node::Include(Include {
            line,
            name: name.clone(),
            pipe,
        }));
        Ok(())
    }

    fn else_action(&mut self, rest: &[Token], line: usize) -> Result<(), Error> {
        let Some(frame) = self.stack.last_mut() else {
            return Err(Error::parse(line, "unexpected else"));
        };
        if frame.in_else {
            return Err(Error::parse(line, "duplicate else"));
        }
        match rest {
            [] => {
                frame.in_else = true;
                Ok(())
            }
            [Token::Ident(word), condition @ ..] if word == "if" => {
                if frame.kind != FrameKind::If {
                    return Err(Error::parse(line, "else if outside of if block"));
                }
                frame.in_else = true;
                let pipe = parse_pipe(condition, line)?;
                self.stack.push(Frame::new(FrameKind::If, pipe, line, true));
                Ok(())
            }
            _ => Err(Error::parse(line, "unexpected tokens after else")),
        }
    }

    fn end_action(&mut self, line: usize) -> Result<(), Error> {
        loop {
            let Some(frame) = self.stack.pop() else {
                return Err(Error::parse(line, "unexpected end"));
            };
            let else_if = frame.else_if;
            let node = frame.into_node();
            if else_if {
                // This frame is the else branch of the frame below it, and the
                // same `end` closes that one as well.
                match self.stack.last_mut() {
                    Some(parent) => parent.else_nodes.push(node),
                    None => return Err(Error::parse(line, "unexpected end")),
                }
            } else {
                self.push(node);
                return Ok(());
            }
        }
    }

    fn push(&mut self, node: Node) {
        if let Node::Text(text) = &node {
            if text.is_empty() {
                return;
            }
        }
        self.current_nodes().push(node);
    }

    fn current_nodes(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(frame) if frame.in_else => &mut frame.else_nodes,
            Some(frame) => &mut frame.body,
            None => &mut self.root,
        }
    }

    fn trim_trailing_text(&mut self) {
        let nodes = self.current_nodes();
        if let Some(Node::Text(text)) = nodes.last_mut() {
            text.truncate(text.trim_end().len());
            if text.is_empty() {
                nodes.pop();
            }
        }
    }
}

/// Find the closing delimiter from `from`, skipping over string literals.
fn find_close(source: &str, from: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut in_string = false;
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_string => i += 1,
            b'"' => in_string = !in_string,
            b']' if !in_string && bytes.get(i + 1) == Some(&b']') => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

fn line_of(source: &str, pos: usize) -> usize {
    source.as_bytes()[..pos]
        .iter()
        .filter(|b| **b == b'\n')
        .count()
        + 1
}

fn parse_pipe(tokens: &[Token], line: usize) -> Result<Pipe, Error> {
    let mut decls = Vec::new();
    let mut rest = tokens;

    if let Some(pos) = tokens.iter().position(|t| matches!(t, Token::Declare)) {
        let mut expect_var = true;
        for token in &tokens[..pos] {
            match token {
                Token::Variable(path) if expect_var && path.len() == 1 => {
                    decls.push(path[0].clone());
                    expect_var = false;
                }
                Token::Comma if !expect_var => expect_var = true,
                _ => return Err(Error::parse(line, "malformed variable declaration")),
            }
        }
        if expect_var {
            return Err(Error::parse(line, "malformed variable declaration"));
        }
        rest = &tokens[pos + 1..];
    }

    let mut cmds = Vec::new();
    let mut args = Vec::new();
    for token in rest {
        match token {
            Token::Pipe => {
                if args.is_empty() {
                    return Err(Error::parse(line, "empty command in pipeline"));
                }
                cmds.push(Command {
                    args: std::mem::take(&mut args),
                });
            }
            Token::Declare => return Err(Error::parse(line, "unexpected ':='")),
            Token::Comma => return Err(Error::parse(line, "unexpected ','")),
            other => args.push(arg_from(other)),
        }
    }
    if args.is_empty() {
        return Err(Error::parse(line, "missing value in action"));
    }
    cmds.push(Command { args });

    Ok(Pipe { line, decls, cmds })
}

fn arg_from(token: &Token) -> Arg {
    match token {
        Token::Field(path) if path.is_empty() => Arg::Context,
        Token::Field(path) => Arg::Field(path.clone()),
        Token::Variable(path) => Arg::Variable(path.clone()),
        Token::Str(value) => Arg::Str(value.clone()),
        Token::Number(value) => Arg::Number(*value),
        Token::Bool(value) => Arg::Bool(*value),
        Token::Ident(name) => Arg::Ident(name.clone()),
        Token::Pipe | Token::Declare | Token::Comma => {
            // Filtered out by the caller before arg conversion.
            Arg::Context
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(path: &[&str]) -> Arg {
        Arg::Field(path.iter().map(|s| s.to_string()).collect())
    }

    fn action_pipe(args: Vec<Arg>) -> Node {
        Node::Action(Pipe {
            line: 1,
            decls: vec![],
            cmds: vec![Command { args }],
        })
    }

    #[test]
    fn test_parse_text_and_action() {
        let ast = parse("greeting.tmpl", "Hello [[.user.name]]!").unwrap();
        assert_eq!(
            ast.root,
            Node::List(vec![
                Node::Text("Hello ".to_string()),
                action_pipe(vec![field(&["user", "name"])]),
                Node::Text("!".to_string()),
            ])
        );
    }

    #[test]
    fn test_parse_conditional_with_else() {
        let ast = parse("t.tmpl", "[[if .premium]]yes[[else]]no[[end]]").unwrap();
        let Node::List(nodes) = &ast.root else {
            panic!("expected list root");
        };
        let Node::Conditional(branch) = &nodes[0] else {
            panic!("expected conditional, got {:?}", nodes[0]);
        };
        assert_eq!(branch.body, Node::List(vec![Node::Text("yes".to_string())]));
        assert_eq!(
            branch.else_branch,
            Some(Node::List(vec![Node::Text("no".to_string())]))
        );
    }

    #[test]
    fn test_parse_else_if_desugars_to_nested_conditional() {
        let ast = parse("t.tmpl", "[[if .a]]A[[else if .b]]B[[else]]C[[end]]").unwrap();
        let Node::List(nodes) = &ast.root else {
            panic!("expected list root");
        };
        let Node::Conditional(outer) = &nodes[0] else {
            panic!("expected conditional");
        };
        let Some(Node::List(else_nodes)) = &outer.else_branch else {
            panic!("expected else branch");
        };
        let Node::Conditional(inner) = &else_nodes[0] else {
            panic!("expected nested conditional");
        };
        assert_eq!(inner.body, Node::List(vec![Node::Text("B".to_string())]));
        assert_eq!(
            inner.else_branch,
            Some(Node::List(vec![Node::Text("C".to_string())]))
        );
    }

    #[test]
    fn test_parse_range_with_declarations() {
        let ast = parse("t.tmpl", "[[range $i, $e := .items]][[$e.name]][[end]]").unwrap();
        let Node::List(nodes) = &ast.root else {
            panic!("expected list root");
        };
        let Node::Loop(branch) = &nodes[0] else {
            panic!("expected loop");
        };
        assert_eq!(branch.pipe.decls, vec!["$i".to_string(), "$e".to_string()]);
        assert_eq!(
            branch.pipe.cmds,
            vec![Command {
                args: vec![field(&["items"])]
            }]
        );
    }

    #[test]
    fn test_parse_include_with_and_without_argument() {
        let ast = parse(
            "t.tmpl",
            "[[template \"header.tmpl\" .]][[template \"footer.tmpl\"]]",
        )
        .unwrap();
        let Node::List(nodes) = &ast.root else {
            panic!("expected list root");
        };
        let Node::Include(header) = &nodes[0] else {
            panic!("expected include");
        };
        assert_eq!(header.name, "header.tmpl");
        assert!(header.pipe.is_some());
        let Node::Include(footer) = &nodes[1] else {
            panic!("expected include");
        };
        assert_eq!(footer.name, "footer.tmpl");
        assert!(footer.pipe.is_none());
    }

    #[test]
    fn test_parse_with_block() {
        let ast = parse("t.tmpl", "[[with .contact]][[.email]][[end]]").unwrap();
        let Node::List(nodes) = &ast.root else {
            panic!("expected list root");
        };
        assert!(matches!(&nodes[0], Node::Rebind(_)));
    }

    #[test]
    fn test_trim_markers_strip_whitespace() {
        let ast = parse("t.tmpl", "a   [[- .x -]]   b").unwrap();
        assert_eq!(
            ast.root,
            Node::List(vec![
                Node::Text("a".to_string()),
                action_pipe(vec![field(&["x"])]),
                Node::Text("b".to_string()),
            ])
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let ast = parse("t.tmpl", "a[[/* ignored */]]b").unwrap();
        assert_eq!(
            ast.root,
            Node::List(vec![
                Node::Text("a".to_string()),
                Node::Text("b".to_string()),
            ])
        );
    }

    #[test]
    fn test_unclosed_action_reports_line() {
        let err = parse("t.tmpl", "line one\nHello [[.name").unwrap_err();
        assert_eq!(err.to_string(), "parse error at line 2: unclosed action");
    }

    #[test]
    fn test_unterminated_block_reports_opening_line() {
        let err = parse("t.tmpl", "[[if .x]]\nbody").unwrap_err();
        assert_eq!(err.to_string(), "parse error at line 1: unterminated if block");
    }

    #[test]
    fn test_unexpected_end() {
        assert!(parse("t.tmpl", "text[[end]]").is_err());
    }

    #[test]
    fn test_unclosed_comment() {
        assert!(parse("t.tmpl", "[[/* never closed ]]").is_err());
    }

    #[test]
    fn test_empty_action() {
        assert!(parse("t.tmpl", "[[ ]]").is_err());
        assert!(parse("t.tmpl", "[[if]]x[[end]]").is_err());
    }

    #[test]
    fn test_include_requires_quoted_name() {
        assert!(parse("t.tmpl", "[[template .name]]").is_err());
    }

    #[test]
    fn test_bare_context_parses_to_context_arg() {
        let ast = parse("t.tmpl", "[[.]]").unwrap();
        assert_eq!(ast.root, Node::List(vec![action_pipe(vec![Arg::Context])]));
    }

    #[test]
    fn test_close_delimiter_inside_string_literal() {
        let ast = parse("t.tmpl", "[[\"a]]b\"]]").unwrap();
        assert_eq!(
            ast.root,
            Node::List(vec![action_pipe(vec![Arg::Str("a]]b".to_string())])])
        );
    }
}
