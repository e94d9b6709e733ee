//! JSX lowering
//!
//! Rewrites JSX elements and fragments into `React.createElement(...)` calls
//! so the output is plain JavaScript syntax. Runs as a character-level
//! recursive descent over the source: code mode copies everything verbatim
//! (string, template and comment aware) and hands off to the element parser
//! whenever a `<` can start JSX in its expression context.

use super::lexer::{is_ident_continue, is_ident_start};
use super::TransformError;

pub(crate) fn lower(source: &str, file: &str) -> Result<String, TransformError> {
    let mut lowerer = Lowerer {
        source,
        src: source.as_bytes(),
        pos: 0,
        file,
    };
    let mut out = String::with_capacity(source.len());
    lowerer.emit_code(&mut out, false)?;
    Ok(out)
}

/// Last significant thing copied in code mode; decides whether a following
/// `<` begins JSX or is a comparison/generic.
#[derive(Debug, Clone, PartialEq)]
enum Prev {
    Start,
    Word(String),
    Sym(u8),
    Arrow,
    Value,
}

const KEYWORDS_BEFORE_JSX: &[&str] = &[
    "return", "default", "case", "do", "else", "yield", "await", "in", "of",
];

fn jsx_can_follow(prev: &Prev) -> bool {
    match prev {
        Prev::Start | Prev::Arrow => true,
        Prev::Word(w) => KEYWORDS_BEFORE_JSX.contains(&w.as_str()),
        Prev::Sym(c) => matches!(
            c,
            b'(' | b'{' | b'[' | b',' | b';' | b'=' | b':' | b'?' | b'&' | b'|' | b'!' | b'+'
                | b'-' | b'*' | b'/' | b'%'
        ),
        Prev::Value => false,
    }
}

enum PropPart {
    Pair(String, String),
    Spread(String),
}

struct Lowerer<'a> {
    source: &'a str,
    src: &'a [u8],
    pos: usize,
    file: &'a str,
}

impl Lowerer<'_> {
    fn err(&self, offset: usize, message: &str) -> TransformError {
        TransformError::at(self.file, self.source, offset, message)
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.src.get(self.pos + n).copied()
    }

    /// Copy the next full character (UTF-8 aware) into `out`
    fn copy_char(&mut self, out: &mut String) {
        if let Some(ch) = self.source[self.pos..].chars().next() {
            out.push(ch);
            self.pos += ch.len_utf8();
        }
    }

    /// Copy code verbatim, lowering any JSX encountered. With `stop_at_brace`
    /// set, an unmatched `}` ends the scan and is left unconsumed.
    fn emit_code(&mut self, out: &mut String, stop_at_brace: bool) -> Result<(), TransformError> {
        let mut depth = 0usize;
        let mut prev = Prev::Start;
        while let Some(c) = self.peek() {
            match c {
                b'"' | b'\'' => {
                    self.copy_string(out)?;
                    prev = Prev::Value;
                }
                b'`' => {
                    self.copy_template(out)?;
                    prev = Prev::Value;
                }
                b'/' => match self.peek_at(1) {
                    Some(b'/') => self.copy_line_comment(out),
                    Some(b'*') => self.copy_block_comment(out)?,
                    _ => {
                        out.push('/');
                        self.pos += 1;
                        prev = Prev::Sym(b'/');
                    }
                },
                b'{' => {
                    depth += 1;
                    out.push('{');
                    self.pos += 1;
                    prev = Prev::Sym(b'{');
                }
                b'}' => {
                    if depth == 0 && stop_at_brace {
                        return Ok(());
                    }
                    depth = depth.saturating_sub(1);
                    out.push('}');
                    self.pos += 1;
                    prev = Prev::Sym(b'}');
                }
                b'<' => {
                    let starts_tag = matches!(
                        self.peek_at(1),
                        Some(n) if n == b'>' || is_ident_start(n)
                    );
                    if starts_tag && jsx_can_follow(&prev) {
                        let rendered = self.parse_element()?;
                        out.push_str(&rendered);
                        prev = Prev::Value;
                    } else {
                        out.push('<');
                        self.pos += 1;
                        prev = Prev::Sym(b'<');
                    }
                }
                b'=' => {
                    if self.peek_at(1) == Some(b'>') {
                        out.push_str("=>");
                        self.pos += 2;
                        prev = Prev::Arrow;
                    } else {
                        out.push('=');
                        self.pos += 1;
                        prev = Prev::Sym(b'=');
                    }
                }
                b')' | b']' => {
                    out.push(c as char);
                    self.pos += 1;
                    prev = Prev::Value;
                }
                _ if c.is_ascii_whitespace() => {
                    out.push(c as char);
                    self.pos += 1;
                }
                _ if is_ident_start(c) => {
                    let start = self.pos;
                    while self.peek().is_some_and(is_ident_continue) {
                        self.pos += 1;
                    }
                    let word = &self.source[start..self.pos];
                    out.push_str(word);
                    prev = Prev::Word(word.to_string());
                }
                _ if c.is_ascii_digit() => {
                    let start = self.pos;
                    while self
                        .peek()
                        .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'.' || c == b'_')
                    {
                        self.pos += 1;
                    }
                    out.push_str(&self.source[start..self.pos]);
                    prev = Prev::Value;
                }
                _ => {
                    out.push(c as char);
                    self.pos += 1;
                    prev = Prev::Sym(c);
                }
            }
        }
        if stop_at_brace {
            Err(self.err(self.pos, "unexpected end of input in braced expression"))
        } else {
            Ok(())
        }
    }

    fn copy_string(&mut self, out: &mut String) -> Result<(), TransformError> {
        let start = self.pos;
        let quote = self.src[self.pos];
        self.pos += 1;
        while let Some(c) = self.peek() {
            if c == b'\\' {
                self.pos = (self.pos + 2).min(self.src.len());
                continue;
            }
            self.pos += 1;
            if c == quote {
                out.push_str(&self.source[start..self.pos]);
                return Ok(());
            }
            if c == b'\n' {
                break;
            }
        }
        Err(self.err(start, "unterminated string literal"))
    }

    fn copy_template(&mut self, out: &mut String) -> Result<(), TransformError> {
        let start = self.pos;
        out.push('`');
        self.pos += 1;
        while let Some(c) = self.peek() {
            match c {
                b'\\' => {
                    out.push('\\');
                    self.pos += 1;
                    self.copy_char(out);
                }
                b'`' => {
                    out.push('`');
                    self.pos += 1;
                    return Ok(());
                }
                b'$' if self.peek_at(1) == Some(b'{') => {
                    out.push_str("${");
                    self.pos += 2;
                    self.emit_code(out, true)?;
                    if self.peek() == Some(b'}') {
                        out.push('}');
                        self.pos += 1;
                    } else {
                        return Err(self.err(start, "unterminated template expression"));
                    }
                }
                _ => self.copy_char(out),
            }
        }
        Err(self.err(start, "unterminated template literal"))
    }

    fn copy_line_comment(&mut self, out: &mut String) {
        while self.peek().is_some_and(|c| c != b'\n') {
            self.copy_char(out);
        }
    }

    fn copy_block_comment(&mut self, out: &mut String) -> Result<(), TransformError> {
        let start = self.pos;
        out.push_str("/*");
        self.pos += 2;
        while self.pos < self.src.len() {
            if self.src[self.pos] == b'*' && self.peek_at(1) == Some(b'/') {
                out.push_str("*/");
                self.pos += 2;
                return Ok(());
            }
            self.copy_char(out);
        }
        Err(self.err(start, "unterminated block comment"))
    }

    fn skip_jsx_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn read_name(&mut self, extra: &[u8]) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| is_ident_continue(c) || extra.contains(&c))
        {
            self.pos += 1;
        }
        self.source[start..self.pos].to_string()
    }

    /// Capture the inside of a `{ ... }` expression, lowered recursively.
    /// The braces themselves are consumed and not included.
    fn capture_braced(&mut self) -> Result<String, TransformError> {
        let start = self.pos;
        self.pos += 1;
        let mut buf = String::new();
        self.emit_code(&mut buf, true)?;
        if self.peek() == Some(b'}') {
            self.pos += 1;
            Ok(buf)
        } else {
            Err(self.err(start, "unterminated braced expression"))
        }
    }

    /// Parse one element (or fragment) starting at `<`, returning the
    /// rendered `React.createElement` expression
    fn parse_element(&mut self) -> Result<String, TransformError> {
        let open = self.pos;
        self.pos += 1;

        if self.peek() == Some(b'>') {
            self.pos += 1;
            let children = self.parse_children(open, "")?;
            return Ok(render_element("React.Fragment", &[], &children));
        }

        let name = self.read_name(&[b'.', b'-']);
        if name.is_empty() {
            return Err(self.err(open, "expected JSX tag name"));
        }
        let tag = tag_to_expr(&name);

        let mut parts: Vec<PropPart> = Vec::new();
        loop {
            self.skip_jsx_ws();
            match self.peek() {
                None => return Err(self.err(open, "unterminated JSX element")),
                Some(b'/') => {
                    if self.peek_at(1) != Some(b'>') {
                        return Err(self.err(self.pos, "expected '/>'"));
                    }
                    self.pos += 2;
                    return Ok(render_element(&tag, &parts, &[]));
                }
                Some(b'>') => {
                    self.pos += 1;
                    let children = self.parse_children(open, &name)?;
                    return Ok(render_element(&tag, &parts, &children));
                }
                Some(b'{') => {
                    let expr = self.capture_braced()?;
                    let trimmed = expr.trim();
                    if let Some(rest) = trimmed.strip_prefix("...") {
                        parts.push(PropPart::Spread(rest.trim().to_string()));
                    } else if !trimmed.is_empty() && !is_comment_only(trimmed) {
                        return Err(self.err(self.pos, "expected spread attribute"));
                    }
                }
                Some(c) if is_ident_start(c) => {
                    let attr = self.read_name(&[b'-', b':']);
                    self.skip_jsx_ws();
                    let value = if self.peek() == Some(b'=') {
                        self.pos += 1;
                        self.skip_jsx_ws();
                        match self.peek() {
                            Some(b'"') | Some(b'\'') => {
                                let mut buf = String::new();
                                self.copy_string(&mut buf)?;
                                buf
                            }
                            Some(b'{') => self.capture_braced()?.trim().to_string(),
                            _ => return Err(self.err(self.pos, "expected attribute value")),
                        }
                    } else {
                        "true".to_string()
                    };
                    parts.push(PropPart::Pair(attr, value));
                }
                Some(_) => return Err(self.err(self.pos, "unexpected character in JSX tag")),
            }
        }
    }

    fn parse_children(
        &mut self,
        open: usize,
        closing: &str,
    ) -> Result<Vec<String>, TransformError> {
        let mut children = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.err(open, "unterminated JSX element")),
                Some(b'<') => {
                    if self.peek_at(1) == Some(b'/') {
                        self.pos += 2;
                        self.skip_jsx_ws();
                        let name = self.read_name(&[b'.', b'-']);
                        self.skip_jsx_ws();
                        if self.peek() != Some(b'>') {
                            return Err(self.err(self.pos, "expected '>' in closing tag"));
                        }
                        self.pos += 1;
                        if name != closing {
                            return Err(self.err(open, "mismatched JSX closing tag"));
                        }
                        return Ok(children);
                    }
                    children.push(self.parse_element()?);
                }
                Some(b'{') => {
                    let expr = self.capture_braced()?;
                    let trimmed = expr.trim();
                    if !trimmed.is_empty() && !is_comment_only(trimmed) {
                        children.push(trimmed.to_string());
                    }
                }
                _ => {
                    let mut text = String::new();
                    while self.peek().is_some_and(|c| c != b'<' && c != b'{') {
                        self.copy_char(&mut text);
                    }
                    if let Some(cleaned) = clean_jsx_text(&text) {
                        children.push(quote_js_string(&decode_entities(&cleaned)));
                    }
                }
            }
        }
    }
}

/// Lowercase or dashed tags are DOM elements (string literals); everything
/// else is a component reference used as-is
fn tag_to_expr(name: &str) -> String {
    let lowercase_start = name
        .chars()
        .next()
        .map(|c| c.is_ascii_lowercase())
        .unwrap_or(false);
    if name.contains('-') || (lowercase_start && !name.contains('.')) {
        format!("\"{name}\"")
    } else {
        name.to_string()
    }
}

fn render_props(parts: &[PropPart]) -> String {
    if parts.is_empty() {
        return "null".to_string();
    }
    let pair_text = |name: &str, value: &str| {
        if name.contains('-') || name.contains(':') {
            format!("\"{name}\": {value}")
        } else {
            format!("{name}: {value}")
        }
    };
    let has_spread = parts.iter().any(|p| matches!(p, PropPart::Spread(_)));
    if !has_spread {
        let pairs: Vec<String> = parts
            .iter()
            .filter_map(|p| match p {
                PropPart::Pair(n, v) => Some(pair_text(n, v)),
                PropPart::Spread(_) => None,
            })
            .collect();
        return format!("{{ {} }}", pairs.join(", "));
    }
    let mut segments: Vec<String> = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    for part in parts {
        match part {
            PropPart::Pair(n, v) => pending.push(pair_text(n, v)),
            PropPart::Spread(expr) => {
                if !pending.is_empty() {
                    segments.push(format!("{{ {} }}", pending.join(", ")));
                    pending.clear();
                }
                segments.push(expr.clone());
            }
        }
    }
    if !pending.is_empty() {
        segments.push(format!("{{ {} }}", pending.join(", ")));
    }
    format!("Object.assign({{}}, {})", segments.join(", "))
}

fn render_element(tag: &str, parts: &[PropPart], children: &[String]) -> String {
    let props = render_props(parts);
    if children.is_empty() {
        format!("React.createElement({tag}, {props})")
    } else {
        format!("React.createElement({tag}, {props}, {})", children.join(", "))
    }
}

fn is_comment_only(s: &str) -> bool {
    s.starts_with("/*") && s.ends_with("*/") && s.len() >= 4 && !s[2..s.len() - 2].contains("*/")
}

/// JSX text semantics: indentation-only lines vanish, interior line breaks
/// collapse to a single space, single-line spacing is preserved
fn clean_jsx_text(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw.split('\n').collect();
    let last = lines.len() - 1;
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let mut l: &str = line;
        if i != 0 {
            l = l.trim_start();
        }
        if i != last {
            l = l.trim_end();
        }
        if l.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(l);
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", "\u{a0}")
}

fn quote_js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}
