//! Tokenizer for the instrumenter.
//!
//! The scanner understands only as much of C as the syntax walker needs:
//! braces, parentheses, semicolons, identifier runs, and comments. Everything
//! else — string and character literals, numbers, operators, preprocessor
//! fragments — is folded into [`TokenKind::Identifier`] tokens, which the
//! walker treats as opaque filler.
//!
//! The scanner also carries the echo duty: every character it consumes is
//! copied verbatim into an output buffer, and the walker splices
//! instrumentation calls into that buffer at marker positions. This is what
//! turns a parse pass into an instrumented copy of the input.

use std::fmt;

/// Tag that turns a block comment into a coverage marker.
pub const MARKER_TAG: &str = "ILC:";

/// Token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// An identifier run, or any other character sequence the scanner has no
    /// interest in (literals, operators, preprocessor fragments).
    Identifier,
    /// `{`
    BraceOpen,
    /// `}`
    BraceClose,
    /// `(`
    ParenOpen,
    /// `)`
    ParenClose,
    /// `;`
    StatementEnd,
    /// The marker tag inside a block comment.
    MarkerComment,
    /// End of the input text.
    EndOfInput,
}

/// One scanned token with its literal text and 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: u64,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Identifier => write!(f, "identifier '{}'", self.text),
            TokenKind::BraceOpen => write!(f, "'{{'"),
            TokenKind::BraceClose => write!(f, "'}}'"),
            TokenKind::ParenOpen => write!(f, "'('"),
            TokenKind::ParenClose => write!(f, "')'"),
            TokenKind::StatementEnd => write!(f, "';'"),
            TokenKind::MarkerComment => write!(f, "coverage marker"),
            TokenKind::EndOfInput => write!(f, "end of input"),
        }
    }
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Streaming tokenizer over an in-memory copy of one source file.
///
/// `next_token` never fails; once the input is exhausted it keeps returning
/// [`TokenKind::EndOfInput`].
pub struct Scanner {
    chars: Vec<char>,
    tag: Vec<char>,
    pos: usize,
    line: u64,
    in_comment: bool,
    out: String,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            tag: MARKER_TAG.chars().collect(),
            pos: 0,
            line: 1,
            in_comment: false,
            out: String::with_capacity(source.len()),
        }
    }

    /// Current 1-based line number.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Append instrumentation text at the current echo position.
    ///
    /// Called by the walker immediately after a [`TokenKind::MarkerComment`]
    /// token, when the echo position sits right behind the marker tag.
    pub fn splice(&mut self, text: &str) {
        self.out.push_str(text);
    }

    /// The echoed (instrumented) source. Complete once `next_token` has
    /// returned [`TokenKind::EndOfInput`].
    pub fn into_output(self) -> String {
        self.out
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            if self.in_comment {
                if let Some(token) = self.resume_comment() {
                    return token;
                }
                continue;
            }

            let Some(ch) = self.peek() else {
                return Token {
                    kind: TokenKind::EndOfInput,
                    text: String::new(),
                    line: self.line,
                };
            };

            match ch {
                '{' => return self.single(TokenKind::BraceOpen, ch),
                '}' => return self.single(TokenKind::BraceClose, ch),
                '(' => return self.single(TokenKind::ParenOpen, ch),
                ')' => return self.single(TokenKind::ParenClose, ch),
                ';' => return self.single(TokenKind::StatementEnd, ch),
                '/' => {
                    if self.peek_at(1) == Some('/') {
                        self.line_comment();
                    } else if self.peek_at(1) == Some('*') {
                        self.echo();
                        self.echo();
                        self.in_comment = true;
                    } else {
                        return self.single(TokenKind::Identifier, ch);
                    }
                }
                '"' | '\'' => return self.quoted(ch),
                c if c.is_ascii_whitespace() => self.echo(),
                c if is_ident_char(c) => return self.ident(),
                _ => return self.symbol_run(),
            }
        }
    }

    /// Scan inside a block comment. Returns a marker token at every tag
    /// occurrence; `None` once the comment closes (or the input runs out).
    fn resume_comment(&mut self) -> Option<Token> {
        while let Some(ch) = self.peek() {
            if ch == '*' && self.peek_at(1) == Some('/') {
                self.echo();
                self.echo();
                self.in_comment = false;
                return None;
            }
            if self.chars[self.pos..].starts_with(&self.tag) {
                let line = self.line;
                for _ in 0..self.tag.len() {
                    self.echo();
                }
                return Some(Token {
                    kind: TokenKind::MarkerComment,
                    text: MARKER_TAG.to_string(),
                    line,
                });
            }
            self.echo();
        }
        // Unterminated comment: fall through to end of input.
        self.in_comment = false;
        None
    }

    fn single(&mut self, kind: TokenKind, ch: char) -> Token {
        let line = self.line;
        self.echo();
        Token { kind, text: ch.to_string(), line }
    }

    fn ident(&mut self) -> Token {
        let line = self.line;
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if !is_ident_char(ch) {
                break;
            }
            text.push(ch);
            self.echo();
        }
        Token { kind: TokenKind::Identifier, text, line }
    }

    /// A string or character literal, consumed as one opaque token so quoted
    /// braces, parentheses, and semicolons cannot confuse the walker.
    fn quoted(&mut self, delim: char) -> Token {
        let line = self.line;
        let mut text = String::new();
        text.push(delim);
        self.echo();
        while let Some(ch) = self.peek() {
            text.push(ch);
            self.echo();
            if ch == '\\' {
                if let Some(escaped) = self.peek() {
                    text.push(escaped);
                    self.echo();
                }
                continue;
            }
            if ch == delim {
                break;
            }
        }
        Token { kind: TokenKind::Identifier, text, line }
    }

    /// A run of characters with no meaning to the walker (operators, numbers
    /// already start in `ident`, punctuation).
    fn symbol_run(&mut self) -> Token {
        let line = self.line;
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_whitespace() || is_ident_char(ch) || "{}();/\"'".contains(ch) {
                break;
            }
            text.push(ch);
            self.echo();
        }
        Token { kind: TokenKind::Identifier, text, line }
    }

    fn line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            self.echo();
            if ch == '\n' {
                break;
            }
        }
    }

    /// Consume one character, counting lines and copying it to the output.
    fn echo(&mut self) {
        if let Some(ch) = self.chars.get(self.pos).copied() {
            self.pos += 1;
            if ch == '\n' {
                self.line += 1;
            }
            self.out.push(ch);
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }
}
