//! Tokenizer for the body of one `[[ … ]]` action

use crate::error::Error;

/// One token of an action body
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// Bare identifier: keywords (`if`, `range`, …) or function names
    Ident(String),
    /// Field path; empty for the bare context reference `.`
    Field(Vec<String>),
    /// Variable path; the first segment keeps its `$` prefix
    Variable(Vec<String>),
    Str(String),
    Number(f64),
    Bool(bool),
    /// `|`
    Pipe,
    /// `:=`
    Declare,
    /// `,`
    Comma,
}

/// Tokenize an action body. `line` is the template line the action starts on,
/// used for error positions.
pub(crate) fn lex(body: &str, line: usize) -> Result<Vec<Token>, Error> {
    let chars: Vec<char> = body.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == '|' {
            tokens.push(Token::Pipe);
            i += 1;
        } else if c == ',' {
            tokens.push(Token::Comma);
            i += 1;
        } else if c == ':' {
            if chars.get(i + 1) == Some(&'=') {
                tokens.push(Token::Declare);
                i += 2;
            } else {
                return Err(Error::parse(line, "expected ':='"));
            }
        } else if c == '"' {
            let (value, next) = lex_string(&chars, i + 1, line)?;
            tokens.push(Token::Str(value));
            i = next;
        } else if c == '.' {
            let (path, next) = lex_path(&chars, i + 1);
            tokens.push(Token::Field(path));
            i = next;
        } else if c == '$' {
            let (name, next) = lex_ident(&chars, i + 1);
            let mut path = vec![format!("${name}")];
            let mut pos = next;
            if chars.get(pos) == Some(&'.') {
                let (rest, after) = lex_path(&chars, pos + 1);
                path.extend(rest);
                pos = after;
            }
            tokens.push(Token::Variable(path));
            i = pos;
        } else if c.is_ascii_digit()
            || ((c == '-' || c == '+') && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()))
        {
            let (value, next) = lex_number(&chars, i, line)?;
            tokens.push(Token::Number(value));
            i = next;
        } else if is_ident_start(c) {
            let (name, next) = lex_ident(&chars, i);
            tokens.push(match name.as_str() {
                "true" => Token::Bool(true),
                "false" => Token::Bool(false),
                _ => Token::Ident(name),
            });
            i = next;
        } else {
            return Err(Error::parse(
                line,
                format!("unexpected character {c:?} in action"),
            ));
        }
    }

    Ok(tokens)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn lex_ident(chars: &[char], mut i: usize) -> (String, usize) {
    let mut name = String::new();
    while i < chars.len() && is_ident_char(chars[i]) {
        name.push(chars[i]);
        i += 1;
    }
    (name, i)
}

/// Dotted path segments following a leading `.` (already consumed). A lone
/// dot yields an empty path: the bare context reference.
fn lex_path(chars: &[char], mut i: usize) -> (Vec<String>, usize) {
    let mut path = Vec::new();
    loop {
        let (segment, next) = lex_ident(chars, i);
        if segment.is_empty() {
            break;
        }
        path.push(segment);
        i = next;
        if chars.get(i) == Some(&'.') {
            i += 1;
        } else {
            break;
        }
    }
    (path, i)
}

fn lex_string(chars: &[char], mut i: usize, line: usize) -> Result<(String, usize), Error> {
    let mut value = String::new();
    while i < chars.len() {
        match chars[i] {
            '"' => return Ok((value, i + 1)),
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .ok_or_else(|| Error::parse(line, "unterminated string literal"))?;
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => *other,
                });
                i += 2;
            }
            other => {
                value.push(other);
                i += 1;
            }
        }
    }
    Err(Error::parse(line, "unterminated string literal"))
}

fn lex_number(chars: &[char], start: usize, line: usize) -> Result<(f64, usize), Error> {
    let mut i = start;
    if chars[i] == '-' || chars[i] == '+' {
        i += 1;
    }
    while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
        i += 1;
    }
    let text: String = chars[start..i].iter().collect();
    let value = text
        .parse::<f64>()
        .map_err(|_| Error::parse(line, format!("malformed number {text:?}")))?;
    Ok((value, i))
}
