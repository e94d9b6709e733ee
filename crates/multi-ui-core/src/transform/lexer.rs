//! Minimal ECMAScript token scanner for the type-stripping pass
//!
//! Runs after JSX lowering, so the input contains no JSX text. Whitespace and
//! comments are skipped rather than emitted; the stripper works on byte spans
//! and reconstructs output from the original source, so nothing is lost.

use super::TransformError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokKind {
    Ident,
    Number,
    Str,
    Template,
    Punct,
}

#[derive(Debug, Clone)]
pub(crate) struct Tok {
    pub kind: TokKind,
    /// Byte offset of the first byte of the token
    pub start: usize,
    /// Byte offset one past the last byte of the token
    pub end: usize,
    pub text: String,
}

// '<', '>' and their compounds are deliberately kept as single-byte tokens so
// the stripper can balance generic argument lists.
const PUNCTS3: &[&str] = &["===", "!==", "**=", "...", "&&=", "||=", "??="];
const PUNCTS2: &[&str] = &[
    "=>", "==", "!=", "&&", "||", "??", "?.", "++", "--", "**", "+=", "-=", "*=", "/=", "%=",
    "&=", "|=", "^=",
];

pub(crate) fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'$' || c >= 0x80
}

pub(crate) fn is_ident_continue(c: u8) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

struct Scanner<'a> {
    source: &'a str,
    src: &'a [u8],
    file: &'a str,
    pos: usize,
}

impl Scanner<'_> {
    fn err(&self, offset: usize, message: &str) -> TransformError {
        TransformError::at(self.file, self.source, offset, message)
    }

    fn peek(&self, n: usize) -> Option<u8> {
        self.src.get(self.pos + n).copied()
    }

    /// Skip a string literal, leaving `pos` one past the closing quote
    fn skip_string(&mut self) -> Result<(), TransformError> {
        let start = self.pos;
        let quote = self.src[self.pos];
        self.pos += 1;
        while let Some(c) = self.peek(0) {
            if c == b'\\' {
                self.pos = (self.pos + 2).min(self.src.len());
                continue;
            }
            self.pos += 1;
            if c == quote {
                return Ok(());
            }
            if c == b'\n' {
                return Err(self.err(start, "unterminated string literal"));
            }
        }
        Err(self.err(start, "unterminated string literal"))
    }

    /// Skip a template literal, including nested `${}` expressions
    fn skip_template(&mut self) -> Result<(), TransformError> {
        let start = self.pos;
        self.pos += 1;
        while let Some(c) = self.peek(0) {
            match c {
                b'\\' => self.pos = (self.pos + 2).min(self.src.len()),
                b'`' => {
                    self.pos += 1;
                    return Ok(());
                }
                b'$' if self.peek(1) == Some(b'{') => {
                    self.pos += 1;
                    self.skip_braced()?;
                }
                _ => self.pos += 1,
            }
        }
        Err(self.err(start, "unterminated template literal"))
    }

    /// Skip a brace-balanced region starting at `{`, string/template aware
    fn skip_braced(&mut self) -> Result<(), TransformError> {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(c) = self.peek(0) {
            match c {
                b'{' => {
                    depth += 1;
                    self.pos += 1;
                }
                b'}' => {
                    depth -= 1;
                    self.pos += 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                b'"' | b'\'' => self.skip_string()?,
                b'`' => self.skip_template()?,
                b'/' if self.peek(1) == Some(b'/') => {
                    while self.peek(0).is_some_and(|c| c != b'\n') {
                        self.pos += 1;
                    }
                }
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment()?,
                _ => self.pos += 1,
            }
        }
        Err(self.err(start, "unterminated template expression"))
    }

    fn skip_block_comment(&mut self) -> Result<(), TransformError> {
        let start = self.pos;
        self.pos += 2;
        while self.pos < self.src.len() {
            if self.src[self.pos] == b'*' && self.peek(1) == Some(b'/') {
                self.pos += 2;
                return Ok(());
            }
            self.pos += 1;
        }
        Err(self.err(start, "unterminated block comment"))
    }
}

/// Tokenize a source file
pub(crate) fn scan(source: &str, file: &str) -> Result<Vec<Tok>, TransformError> {
    let mut scanner = Scanner {
        source,
        src: source.as_bytes(),
        file,
        pos: 0,
    };
    let mut toks = Vec::new();

    while let Some(c) = scanner.peek(0) {
        if c.is_ascii_whitespace() {
            scanner.pos += 1;
            continue;
        }
        if c == b'/' && scanner.peek(1) == Some(b'/') {
            while scanner.peek(0).is_some_and(|c| c != b'\n') {
                scanner.pos += 1;
            }
            continue;
        }
        if c == b'/' && scanner.peek(1) == Some(b'*') {
            scanner.skip_block_comment()?;
            continue;
        }

        let start = scanner.pos;
        let kind = if is_ident_start(c) {
            while scanner.peek(0).is_some_and(is_ident_continue) {
                scanner.pos += 1;
            }
            TokKind::Ident
        } else if c.is_ascii_digit() {
            while scanner
                .peek(0)
                .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'.' || c == b'_')
            {
                scanner.pos += 1;
            }
            TokKind::Number
        } else if c == b'"' || c == b'\'' {
            scanner.skip_string()?;
            TokKind::Str
        } else if c == b'`' {
            scanner.skip_template()?;
            TokKind::Template
        } else {
            let rest = &source[scanner.pos..];
            let width = PUNCTS3
                .iter()
                .find(|p| rest.starts_with(**p))
                .map(|p| p.len())
                .or_else(|| {
                    PUNCTS2
                        .iter()
                        .find(|p| rest.starts_with(**p))
                        .map(|p| p.len())
                })
                .unwrap_or(1);
            scanner.pos += width;
            TokKind::Punct
        };

        toks.push(Tok {
            kind,
            start,
            end: scanner.pos,
            text: source[start..scanner.pos].to_string(),
        });
    }

    Ok(toks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &str) -> Vec<String> {
        scan(source, "test.tsx")
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_scan_basic_tokens() {
        assert_eq!(
            texts("const x = f(1);"),
            vec!["const", "x", "=", "f", "(", "1", ")", ";"]
        );
    }

    #[test]
    fn test_arrow_and_spread_are_single_tokens() {
        assert_eq!(texts("(...a) => a"), vec!["(", "...", "a", ")", "=>", "a"]);
    }

    #[test]
    fn test_angle_brackets_stay_single() {
        assert_eq!(texts("a<b>>c"), vec!["a", "<", "b", ">", ">", "c"]);
    }

    #[test]
    fn test_comments_and_whitespace_are_skipped() {
        assert_eq!(texts("a // c\n/* d */ b"), vec!["a", "b"]);
    }

    #[test]
    fn test_template_with_nested_expression() {
        let toks = scan("`a ${f(\"}\")} b` x", "test.tsx").unwrap();
        assert_eq!(toks[0].kind, TokKind::Template);
        assert_eq!(toks[1].text, "x");
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        assert!(scan("const a = 'oops", "test.tsx").is_err());
    }
}
