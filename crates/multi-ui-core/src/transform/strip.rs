//! Type stripping
//!
//! Deletes TypeScript-only syntax from the token stream: interface and type
//! alias declarations, parameter/variable/return annotations, `as` casts,
//! non-null assertions, generic argument lists and type-only imports. Runs
//! after JSX lowering, so `<` only ever means comparison or generics here.
//!
//! The stripper never rewrites code. It collects byte-range deletions against
//! the original source and splices the survivors back together, so everything
//! it does not understand passes through untouched. Constructs with runtime
//! semantics (enum, namespace, parameter properties) are rejected instead of
//! silently mistranslated.

use std::collections::{HashMap, HashSet};

use super::lexer::{self, Tok, TokKind};
use super::TransformError;

pub(crate) fn strip(source: &str, file: &str) -> Result<String, TransformError> {
    let toks = lexer::scan(source, file)?;
    let matches = match_brackets(&toks, source, file)?;
    let mut stripper = Stripper {
        source,
        file,
        toks,
        matches,
        edits: Vec::new(),
        jumps: HashMap::new(),
        param_parens: HashSet::new(),
        stack: Vec::new(),
    };
    stripper.walk()?;
    Ok(apply_edits(source, stripper.edits))
}

/// Byte range scheduled for deletion
#[derive(Debug, Clone, Copy)]
struct Edit {
    start: usize,
    end: usize,
}

fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| (e.start, e.end));
    let mut out = String::with_capacity(source.len());
    let mut pos = 0;
    for e in edits {
        if e.start < pos {
            pos = pos.max(e.end);
            continue;
        }
        out.push_str(&source[pos..e.start]);
        pos = e.end;
    }
    out.push_str(&source[pos..]);
    out
}

fn match_brackets(
    toks: &[Tok],
    source: &str,
    file: &str,
) -> Result<HashMap<usize, usize>, TransformError> {
    let mut map = HashMap::new();
    let mut stack: Vec<(usize, &str)> = Vec::new();
    for (i, t) in toks.iter().enumerate() {
        if t.kind != TokKind::Punct {
            continue;
        }
        match t.text.as_str() {
            "(" | "[" | "{" => stack.push((i, t.text.as_str())),
            ")" | "]" | "}" => {
                let expected = match t.text.as_str() {
                    ")" => "(",
                    "]" => "[",
                    _ => "{",
                };
                match stack.pop() {
                    Some((open, kind)) if kind == expected => {
                        map.insert(open, i);
                    }
                    _ => {
                        return Err(TransformError::at(
                            file,
                            source,
                            t.start,
                            "unbalanced brackets",
                        ))
                    }
                }
            }
            _ => {}
        }
    }
    if let Some((open, _)) = stack.last() {
        return Err(TransformError::at(
            file,
            source,
            toks[*open].start,
            "unbalanced brackets",
        ));
    }
    Ok(map)
}

/// Identifiers after which `<` or `!` never continue a value expression
const NON_VALUE_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "case",
    "do",
    "else",
    "yield",
    "await",
    "throw",
    "export",
    "default",
    "if",
    "while",
    "for",
    "switch",
    "function",
    "const",
    "let",
    "var",
    "import",
    "from",
    "extends",
    "class",
    "as",
];

/// Keywords that take a parenthesized head followed by a block, so the paren
/// is not a parameter list even though an identifier precedes it
const BLOCK_HEAD_KEYWORDS: &[&str] = &[
    "if", "while", "for", "switch", "catch", "return", "typeof", "do", "else", "new", "await",
    "yield", "in", "of", "case", "throw",
];

const TYPE_PREFIX_OPERATORS: &[&str] = &["keyof", "typeof", "readonly", "infer", "unique", "new"];

/// Bracket nesting context while walking expressions. Parameter frames are
/// where `?` optional markers and `:` annotations get stripped; `in_default`
/// suspends that between a default value `=` and the next `,`.
struct Frame {
    param: bool,
    in_default: bool,
}

struct Stripper<'a> {
    source: &'a str,
    file: &'a str,
    toks: Vec<Tok>,
    matches: HashMap<usize, usize>,
    edits: Vec<Edit>,
    /// Token index of a region deleted ahead of the walk -> resume index
    jumps: HashMap<usize, usize>,
    /// Opening parens known to be parameter lists (function headers)
    param_parens: HashSet<usize>,
    stack: Vec<Frame>,
}

impl Stripper<'_> {
    fn err_at(&self, i: usize, message: &str) -> TransformError {
        let offset = self
            .toks
            .get(i)
            .map(|t| t.start)
            .unwrap_or(self.source.len());
        TransformError::at(self.file, self.source, offset, message)
    }

    fn tok_is(&self, i: usize, s: &str) -> bool {
        self.toks.get(i).is_some_and(|t| t.text == s)
    }

    fn ident_at(&self, i: usize) -> bool {
        self.toks.get(i).is_some_and(|t| t.kind == TokKind::Ident)
    }

    fn close_of(&self, i: usize) -> Result<usize, TransformError> {
        self.matches
            .get(&i)
            .copied()
            .ok_or_else(|| self.err_at(i, "unbalanced brackets"))
    }

    fn edit(&self, a: usize, b: usize) -> Edit {
        Edit {
            start: self.toks[a].start,
            end: self.toks[b].end,
        }
    }

    /// Like `edit` but also swallows horizontal whitespace before the range
    fn edit_ws(&self, a: usize, b: usize) -> Edit {
        let mut e = self.edit(a, b);
        let bytes = self.source.as_bytes();
        while e.start > 0 && matches!(bytes[e.start - 1], b' ' | b'\t') {
            e.start -= 1;
        }
        e
    }

    /// Extend a byte offset over trailing spaces and one line break
    fn eat_line(&self, mut end: usize) -> usize {
        let bytes = self.source.as_bytes();
        while bytes.get(end).is_some_and(|c| *c == b' ' || *c == b'\t') {
            end += 1;
        }
        if bytes.get(end) == Some(&b'\r') {
            end += 1;
        }
        if bytes.get(end) == Some(&b'\n') {
            end += 1;
        }
        end
    }

    /// True when token `i` begins a statement: file start, after `;`/`{`/`}`,
    /// or on a fresh line (ASI position)
    fn at_stmt_start(&self, i: usize) -> bool {
        if i == 0 {
            return true;
        }
        let prev = &self.toks[i - 1];
        if matches!(prev.text.as_str(), ";" | "{" | "}") {
            return true;
        }
        self.source[prev.end..self.toks[i].start].contains('\n')
    }

    /// Statement start, allowing one `export` prefix
    fn starts_decl(&self, i: usize) -> bool {
        self.at_stmt_start(i)
            || (i > 0 && self.toks[i - 1].text == "export" && self.at_stmt_start(i - 1))
    }

    fn decl_start(&self, i: usize) -> usize {
        if i > 0 && self.toks[i - 1].text == "export" && self.at_stmt_start(i - 1) {
            i - 1
        } else {
            i
        }
    }

    /// Does the token before `i` end a value expression?
    fn prev_value_ish(&self, i: usize) -> bool {
        let Some(prev) = i.checked_sub(1).and_then(|p| self.toks.get(p)) else {
            return false;
        };
        match prev.kind {
            TokKind::Number | TokKind::Str | TokKind::Template => true,
            TokKind::Ident => !NON_VALUE_KEYWORDS.contains(&prev.text.as_str()),
            TokKind::Punct => matches!(prev.text.as_str(), ")" | "]"),
        }
    }

    /// Can a cast keyword at `i` actually be a cast? Any value expression
    /// qualifies, and so does an object literal's closing `}`. The other
    /// `as` contexts (import/export specifier lists) are consumed whole by
    /// `handle_import`/`handle_export` and never reach this check.
    fn cast_position(&self, i: usize) -> bool {
        self.prev_value_ish(i)
            || i.checked_sub(1)
                .is_some_and(|p| self.toks[p].text == "}")
    }

    /// From a `<` at `i`, find the matching `>` of a type argument list.
    /// Returns None when the span cannot be one (comparison operators,
    /// logical connectives or a statement boundary show up first).
    fn skip_angle(&self, i: usize) -> Result<Option<usize>, TransformError> {
        let mut depth = 0usize;
        let mut j = i;
        while let Some(t) = self.toks.get(j) {
            match t.text.as_str() {
                "<" => depth += 1,
                ">" => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(Some(j));
                    }
                }
                "(" | "[" | "{" => j = self.close_of(j)?,
                ";" | ")" | "]" | "}" | "&&" | "||" | "=" => return Ok(None),
                _ => {}
            }
            j += 1;
        }
        Ok(None)
    }

    /// Parse a type starting at `i`, returning the index of its last token.
    /// Handles unions, intersections and conditional types at the top level.
    fn parse_type(&self, mut i: usize) -> Result<usize, TransformError> {
        if self.tok_is(i, "|") || self.tok_is(i, "&") {
            i += 1;
        }
        let mut last = self.parse_type_operand(i)?;
        loop {
            let next = last + 1;
            if self.tok_is(next, "|") || self.tok_is(next, "&") {
                last = self.parse_type_operand(next + 1)?;
            } else if self.tok_is(next, "extends") {
                let probe = self.parse_type_operand(next + 1)?;
                if !self.tok_is(probe + 1, "?") {
                    return Err(self.err_at(next, "malformed conditional type"));
                }
                let then_end = self.parse_type(probe + 2)?;
                if !self.tok_is(then_end + 1, ":") {
                    return Err(self.err_at(then_end, "malformed conditional type"));
                }
                last = self.parse_type(then_end + 2)?;
            } else {
                return Ok(last);
            }
        }
    }

    fn parse_type_operand(&self, mut i: usize) -> Result<usize, TransformError> {
        while self
            .toks
            .get(i)
            .is_some_and(|t| t.kind == TokKind::Ident && TYPE_PREFIX_OPERATORS.contains(&t.text.as_str()))
        {
            i += 1;
        }
        let tok = self.toks.get(i).ok_or_else(|| self.err_at(i, "expected type"))?;
        let mut end = match tok.kind {
            TokKind::Ident => {
                let mut e = i;
                while self.tok_is(e + 1, ".") && self.ident_at(e + 2) {
                    e += 2;
                }
                if self.tok_is(e + 1, "<") {
                    match self.skip_angle(e + 1)? {
                        Some(close) => e = close,
                        None => return Err(self.err_at(e + 1, "malformed type arguments")),
                    }
                }
                e
            }
            TokKind::Number | TokKind::Str | TokKind::Template => i,
            TokKind::Punct => match tok.text.as_str() {
                "-" if self.toks.get(i + 1).is_some_and(|t| t.kind == TokKind::Number) => i + 1,
                "..." => return self.parse_type_operand(i + 1),
                "{" | "[" => self.close_of(i)?,
                "(" => {
                    let close = self.close_of(i)?;
                    if self.tok_is(close + 1, "=>") {
                        return self.parse_type(close + 2);
                    }
                    close
                }
                _ => return Err(self.err_at(i, "expected type")),
            },
        };
        // array/index suffixes
        while self.tok_is(end + 1, "[") {
            end = self.close_of(end + 1)?;
        }
        Ok(end)
    }

    fn walk(&mut self) -> Result<(), TransformError> {
        let mut i = 0;
        while i < self.toks.len() {
            if let Some(&resume) = self.jumps.get(&i) {
                i = resume;
                continue;
            }
            let kind = self.toks[i].kind;
            let text = self.toks[i].text.clone();
            match kind {
                TokKind::Ident => match text.as_str() {
                    "interface" if self.ident_at(i + 1) && self.starts_decl(i) => {
                        i = self.delete_interface(i)?;
                    }
                    "type"
                        if self.starts_decl(i)
                            && self.ident_at(i + 1)
                            && (self.tok_is(i + 2, "=") || self.tok_is(i + 2, "<")) =>
                    {
                        i = self.delete_type_alias(i)?;
                    }
                    "import" if self.at_stmt_start(i) => {
                        i = self.handle_import(i)?;
                    }
                    "export" if self.at_stmt_start(i) => {
                        i = self.handle_export(i)?;
                    }
                    "function" => {
                        i = self.handle_function(i)?;
                    }
                    "as" | "satisfies" if self.cast_position(i) => {
                        let end = self.parse_type(i + 1)?;
                        self.edits.push(self.edit_ws(i, end));
                        i = end + 1;
                    }
                    "enum"
                        if (self.starts_decl(i)
                            || i.checked_sub(1).is_some_and(|p| self.toks[p].text == "const"))
                            && self.ident_at(i + 1)
                            && self.tok_is(i + 2, "{") =>
                    {
                        return Err(self.err_at(i, "unsupported TypeScript construct: enum"));
                    }
                    "namespace"
                        if self.starts_decl(i)
                            && self.ident_at(i + 1)
                            && (self.tok_is(i + 2, "{") || self.tok_is(i + 2, ".")) =>
                    {
                        return Err(self.err_at(i, "unsupported TypeScript construct: namespace"));
                    }
                    "declare" if self.at_stmt_start(i) && self.ident_at(i + 1) => {
                        return Err(self.err_at(i, "unsupported TypeScript construct: declare"));
                    }
                    "abstract" if self.tok_is(i + 1, "class") => {
                        return Err(self.err_at(
                            i,
                            "unsupported TypeScript construct: abstract class",
                        ));
                    }
                    "const" | "let" | "var" => {
                        self.handle_declarator(i)?;
                        i += 1;
                    }
                    _ => i += 1,
                },
                TokKind::Punct => match text.as_str() {
                    "(" => {
                        let param = self.classify_paren(i)?;
                        self.stack.push(Frame {
                            param,
                            in_default: false,
                        });
                        i += 1;
                    }
                    "{" | "[" => {
                        self.stack.push(Frame {
                            param: false,
                            in_default: false,
                        });
                        i += 1;
                    }
                    ")" | "}" | "]" => {
                        self.stack.pop();
                        i += 1;
                    }
                    ":" => {
                        if self
                            .stack
                            .last()
                            .is_some_and(|f| f.param && !f.in_default)
                        {
                            let end = self.parse_type(i + 1)?;
                            self.edits.push(self.edit(i, end));
                            i = end + 1;
                        } else {
                            i += 1;
                        }
                    }
                    "?" => {
                        let optional_marker = self
                            .stack
                            .last()
                            .is_some_and(|f| f.param && !f.in_default)
                            && (self.tok_is(i + 1, ":")
                                || self.tok_is(i + 1, ",")
                                || self.tok_is(i + 1, ")"));
                        if optional_marker {
                            self.edits.push(self.edit(i, i));
                        }
                        i += 1;
                    }
                    "=" => {
                        if let Some(f) = self.stack.last_mut() {
                            if f.param {
                                f.in_default = true;
                            }
                        }
                        i += 1;
                    }
                    "," => {
                        if let Some(f) = self.stack.last_mut() {
                            if f.param {
                                f.in_default = false;
                            }
                        }
                        i += 1;
                    }
                    "!" => {
                        if self.prev_value_ish(i) {
                            self.edits.push(self.edit(i, i));
                        }
                        i += 1;
                    }
                    "<" => {
                        i = self.handle_angle(i)?;
                    }
                    _ => i += 1,
                },
                _ => i += 1,
            }
        }
        Ok(())
    }

    /// Generic argument list on a call or tagged template, e.g.
    /// `useState<number>(0)`. Comparisons fall through untouched.
    fn handle_angle(&mut self, i: usize) -> Result<usize, TransformError> {
        if i > 0 && self.toks[i - 1].kind == TokKind::Ident && self.prev_value_ish(i) {
            if let Some(close) = self.skip_angle(i)? {
                let followed_by = self.toks.get(close + 1);
                let applies = followed_by.is_some_and(|t| {
                    t.text == "(" || t.text == "{" || t.kind == TokKind::Template
                });
                if applies {
                    self.edits.push(self.edit(i, close));
                    return Ok(close + 1);
                }
            }
        }
        Ok(i + 1)
    }

    fn delete_interface(&mut self, i: usize) -> Result<usize, TransformError> {
        let start = self.decl_start(i);
        let mut j = i + 2;
        if self.tok_is(j, "<") {
            j = self
                .skip_angle(j)?
                .ok_or_else(|| self.err_at(j, "malformed interface declaration"))?
                + 1;
        }
        while j < self.toks.len() && !self.tok_is(j, "{") {
            if self.tok_is(j, "<") {
                j = self
                    .skip_angle(j)?
                    .ok_or_else(|| self.err_at(j, "malformed interface declaration"))?;
            }
            j += 1;
        }
        if !self.tok_is(j, "{") {
            return Err(self.err_at(i, "malformed interface declaration"));
        }
        let close = self.close_of(j)?;
        let mut e = self.edit(start, close);
        e.end = self.eat_line(e.end);
        self.edits.push(e);
        Ok(close + 1)
    }

    fn delete_type_alias(&mut self, i: usize) -> Result<usize, TransformError> {
        let start = self.decl_start(i);
        let mut j = i + 2;
        if self.tok_is(j, "<") {
            j = self
                .skip_angle(j)?
                .ok_or_else(|| self.err_at(j, "malformed type alias"))?
                + 1;
        }
        if !self.tok_is(j, "=") {
            return Err(self.err_at(j, "malformed type alias"));
        }
        let end = self.parse_type(j + 1)?;
        let last = if self.tok_is(end + 1, ";") { end + 1 } else { end };
        let mut e = self.edit(start, last);
        e.end = self.eat_line(e.end);
        self.edits.push(e);
        Ok(last + 1)
    }

    /// Import statements are consumed whole so their `as` specifiers never
    /// look like casts. Type-only imports vanish entirely; inline `type`
    /// specifiers are cut out of the named list.
    fn handle_import(&mut self, i: usize) -> Result<usize, TransformError> {
        // dynamic import() and import.meta are plain expressions
        if self.tok_is(i + 1, "(") || self.tok_is(i + 1, ".") {
            return Ok(i + 1);
        }
        let mut spec = None;
        let mut j = i + 1;
        while let Some(t) = self.toks.get(j) {
            if t.kind == TokKind::Str {
                spec = Some(j);
                break;
            }
            if t.text == ";" {
                break;
            }
            j += 1;
        }
        let spec = spec.ok_or_else(|| self.err_at(i, "malformed import statement"))?;
        let last = if self.tok_is(spec + 1, ";") { spec + 1 } else { spec };

        let type_only = self.tok_is(i + 1, "type")
            && (self.tok_is(i + 2, "{")
                || self.tok_is(i + 2, "*")
                || self
                    .toks
                    .get(i + 2)
                    .is_some_and(|t| t.kind == TokKind::Ident && t.text != "from"));
        if type_only {
            let mut e = self.edit(i, last);
            e.end = self.eat_line(e.end);
            self.edits.push(e);
            return Ok(last + 1);
        }

        if let Some(brace) = (i + 1..spec).find(|&k| self.tok_is(k, "{")) {
            let close = self.close_of(brace)?;
            let mut k = brace + 1;
            while k < close {
                if self.toks[k].text == "type"
                    && self.toks[k].kind == TokKind::Ident
                    && self.ident_at(k + 1)
                {
                    let mut e = k + 1;
                    if self.tok_is(e + 1, "as") && self.ident_at(e + 2) {
                        e += 2;
                    }
                    if self.tok_is(e + 1, ",") {
                        e += 1;
                    }
                    self.edits.push(self.edit(k, e));
                    k = e + 1;
                } else {
                    k += 1;
                }
            }
        }
        Ok(last + 1)
    }

    fn handle_export(&mut self, i: usize) -> Result<usize, TransformError> {
        if self.tok_is(i + 1, "type") && self.tok_is(i + 2, "{") {
            // export type { ... } [from "..."] ;
            let close = self.close_of(i + 2)?;
            let mut last = close;
            if self.tok_is(close + 1, "from")
                && self.toks.get(close + 2).is_some_and(|t| t.kind == TokKind::Str)
            {
                last = close + 2;
            }
            if self.tok_is(last + 1, ";") {
                last += 1;
            }
            let mut e = self.edit(i, last);
            e.end = self.eat_line(e.end);
            self.edits.push(e);
            return Ok(last + 1);
        }
        if self.tok_is(i + 1, "{") {
            // re-export list; its `as` specifiers are not casts
            return Ok(self.close_of(i + 1)? + 1);
        }
        if self.tok_is(i + 1, "*") {
            let mut j = i + 2;
            while self
                .toks
                .get(j)
                .is_some_and(|t| t.kind != TokKind::Str && t.text != ";")
            {
                j += 1;
            }
            return Ok(j + 1);
        }
        Ok(i + 1)
    }

    /// Function headers: drop type parameters and the return annotation,
    /// remember the parameter paren for the main walk.
    fn handle_function(&mut self, i: usize) -> Result<usize, TransformError> {
        let mut j = i + 1;
        if self.tok_is(j, "*") {
            j += 1;
        }
        if self.ident_at(j) {
            j += 1;
        }
        if self.tok_is(j, "<") {
            let close = self
                .skip_angle(j)?
                .ok_or_else(|| self.err_at(j, "malformed type parameters"))?;
            self.edits.push(self.edit(j, close));
            self.jumps.insert(j, close + 1);
            j = close + 1;
        }
        if !self.tok_is(j, "(") {
            return Ok(i + 1);
        }
        self.param_parens.insert(j);
        let close = self.close_of(j)?;
        if self.tok_is(close + 1, ":") {
            let end = self.parse_type(close + 2)?;
            if self.tok_is(end + 1, "{") {
                self.edits.push(self.edit(close + 1, end));
                self.jumps.insert(close + 1, end + 1);
            }
        }
        Ok(i + 1)
    }

    /// `const x: T = ...`, including the definite assignment form `x!: T`
    fn handle_declarator(&mut self, i: usize) -> Result<(), TransformError> {
        let mut j = i + 1;
        if self.ident_at(j) {
            j += 1;
        } else if self.tok_is(j, "{") || self.tok_is(j, "[") {
            j = self.close_of(j)? + 1;
        } else {
            return Ok(());
        }
        if self.tok_is(j, "!") && self.tok_is(j + 1, ":") {
            let end = self.parse_type(j + 2)?;
            self.edits.push(self.edit(j, end));
            self.jumps.insert(j, end + 1);
        } else if self.tok_is(j, ":") {
            let end = self.parse_type(j + 1)?;
            self.edits.push(self.edit(j, end));
            self.jumps.insert(j, end + 1);
        }
        Ok(())
    }

    /// Decide whether an opening paren starts a parameter list. Arrow
    /// functions (with or without a return annotation) and object/class
    /// method shorthand count; call and grouping parens do not.
    fn classify_paren(&mut self, i: usize) -> Result<bool, TransformError> {
        if self.param_parens.contains(&i) {
            return Ok(true);
        }
        let close = self.close_of(i)?;
        if self.tok_is(close + 1, "=>") {
            return Ok(true);
        }
        let method_prev = i > 0
            && self.toks[i - 1].kind == TokKind::Ident
            && !BLOCK_HEAD_KEYWORDS.contains(&self.toks[i - 1].text.as_str());
        if self.tok_is(close + 1, ":") {
            if let Ok(end) = self.parse_type(close + 2) {
                let arrow = self.tok_is(end + 1, "=>");
                let method_body = self.tok_is(end + 1, "{") && method_prev;
                if arrow || method_body {
                    self.edits.push(self.edit(close + 1, end));
                    self.jumps.insert(close + 1, end + 1);
                    return Ok(true);
                }
            }
            return Ok(false);
        }
        if self.tok_is(close + 1, "{") && method_prev {
            return Ok(true);
        }
        Ok(false)
    }
}
