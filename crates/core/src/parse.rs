//! Recursive-descent syntax walker that drives instrumentation.
//!
//! The walker understands just enough of C to tell a function body apart from
//! a struct/union body and to find the matching brace of every block. Markers
//! inside a function body are recorded in the registry and mirrored as a
//! spliced `__ilc_check` call in the echoed output; everything else passes
//! through untouched.
//!
//! Grammar, loosely:
//!
//! ```text
//! statement   ::= declarators (';' | function)
//! declarators ::= (identifier | marker)* aggregate?
//! aggregate   ::= '{' <balanced braces> '}' identifier?
//! function    ::= '(' <until ')'> ')' (';' | body)
//! body        ::= <until '{'> '{' block '}'
//! block       ::= (marker | '{' block '}' | other)*
//! ```
//!
//! Expressions, types, and preprocessor lines are never interpreted; their
//! tokens fall into the `other` bucket.

use thiserror::Error;

use crate::model::{Registry, RegistryError};
use crate::scan::{Scanner, Token, TokenKind};

/// Fatal parse outcomes. Either one aborts the whole file; there is no
/// per-statement recovery.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The input did not match the supported grammar subset, or it ended
    /// where more tokens were structurally required.
    #[error("syntax error in {file} at line {line}: unexpected {found}")]
    Syntax { file: String, line: u64, found: String },

    /// The registry could not grow while recording a checkpoint.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Result of a successful instrumentation pass over one file.
#[derive(Debug)]
pub struct Instrumented {
    /// Functions and markers discovered during the pass.
    pub registry: Registry,
    /// The input source with a check call spliced in at every marker.
    pub text: String,
}

/// Render the run-time check call for one checkpoint.
///
/// The call closes the surrounding comment, reports the checkpoint key, and
/// reopens the comment so the rest of the marker text stays inert.
pub fn check_call(file: &str, function: &str, line: u64) -> String {
    format!("*/ __ilc_check( \"{file}:{function}:{line}\" ); /*")
}

/// One-shot walker over a single source file.
pub struct Parser {
    scanner: Scanner,
    registry: Registry,
    file_name: String,
    func_name: Option<String>,
}

impl Parser {
    pub fn new(source: &str, file_name: impl Into<String>) -> Self {
        Self::with_registry(source, file_name, Registry::new())
    }

    /// Parse into a caller-provided registry, e.g. one with a checkpoint cap.
    pub fn with_registry(
        source: &str,
        file_name: impl Into<String>,
        registry: Registry,
    ) -> Self {
        Self {
            scanner: Scanner::new(source),
            registry,
            file_name: file_name.into(),
            func_name: None,
        }
    }

    /// Walk every top-level statement, then yield the discoveries and the
    /// instrumented text. An error discards the whole pass.
    pub fn run(mut self) -> Result<Instrumented, ParseError> {
        loop {
            let token = self.scanner.next_token();
            if token.kind == TokenKind::EndOfInput {
                break;
            }
            self.statement(token)?;
            // The candidate name never outlives its statement.
            self.func_name = None;
        }
        Ok(Instrumented {
            registry: self.registry,
            text: self.scanner.into_output(),
        })
    }

    fn statement(&mut self, token: Token) -> Result<(), ParseError> {
        let token = self.skip_markers(token);
        match token.kind {
            // A trailing marker or an empty statement is fine here.
            TokenKind::EndOfInput | TokenKind::StatementEnd => Ok(()),
            _ => self.declaration(token),
        }
    }

    fn declaration(&mut self, token: Token) -> Result<(), ParseError> {
        let token = self.declarators(token)?;
        let token = self.skip_markers(token);
        match token.kind {
            TokenKind::EndOfInput => Err(self.unexpected(token)),
            // Plain variable or type declaration.
            TokenKind::StatementEnd => Ok(()),
            _ => self.function(token),
        }
    }

    /// Accumulate identifiers; the last one seen is the candidate function
    /// name. An aggregate body after the identifiers is skipped wholesale.
    fn declarators(&mut self, mut token: Token) -> Result<Token, ParseError> {
        loop {
            match token.kind {
                TokenKind::Identifier => self.func_name = Some(token.text),
                // Markers outside function bodies are inert.
                TokenKind::MarkerComment => {}
                _ => break,
            }
            token = self.scanner.next_token();
        }
        self.aggregate(token)
    }

    /// Skip a struct/union body with brace-depth tracking, plus one trailing
    /// identifier so `typedef struct { ... } Name;` reads as a declaration.
    fn aggregate(&mut self, token: Token) -> Result<Token, ParseError> {
        let token = self.skip_markers(token);
        if token.kind != TokenKind::BraceOpen {
            return Ok(token);
        }

        let mut depth = 1usize;
        while depth > 0 {
            let token = self.scanner.next_token();
            match token.kind {
                TokenKind::BraceOpen => depth += 1,
                TokenKind::BraceClose => depth -= 1,
                TokenKind::EndOfInput => return Err(self.unexpected(token)),
                _ => {}
            }
        }

        let token = self.scanner.next_token();
        let token = self.skip_markers(token);
        if token.kind == TokenKind::Identifier {
            Ok(self.scanner.next_token())
        } else {
            Ok(token)
        }
    }

    /// Parameter list, then either a prototype terminator or the body.
    fn function(&mut self, token: Token) -> Result<(), ParseError> {
        let token = self.skip_markers(token);
        if token.kind != TokenKind::ParenOpen {
            return Err(self.unexpected(token));
        }

        // Parameters are not validated as identifiers; stop at the first
        // close paren.
        loop {
            let token = self.scanner.next_token();
            match token.kind {
                TokenKind::ParenClose => break,
                TokenKind::EndOfInput => return Err(self.unexpected(token)),
                _ => {}
            }
        }

        let token = self.scanner.next_token();
        let token = self.skip_markers(token);
        match token.kind {
            TokenKind::EndOfInput => Err(self.unexpected(token)),
            // Prototype only.
            TokenKind::StatementEnd => Ok(()),
            _ => self.body(token),
        }
    }

    /// Find the opening brace — K&R parameter declarations may sit between
    /// the parameter list and the brace — then walk the block.
    fn body(&mut self, mut token: Token) -> Result<(), ParseError> {
        loop {
            match token.kind {
                TokenKind::BraceOpen => break,
                TokenKind::EndOfInput => return Err(self.unexpected(token)),
                _ => token = self.scanner.next_token(),
            }
        }
        self.block()
    }

    /// Contents of one `{ ... }`; recurses for nested blocks. Every marker in
    /// here belongs to the current function, at any depth.
    fn block(&mut self) -> Result<(), ParseError> {
        loop {
            let token = self.scanner.next_token();
            match token.kind {
                TokenKind::BraceClose => return Ok(()),
                TokenKind::BraceOpen => self.block()?,
                TokenKind::MarkerComment => self.checkpoint(token.line)?,
                TokenKind::EndOfInput => return Err(self.unexpected(token)),
                _ => {}
            }
        }
    }

    /// Register the checkpoint, then splice the check call right behind the
    /// marker tag in the echoed output.
    fn checkpoint(&mut self, line: u64) -> Result<(), ParseError> {
        let name = self.func_name.clone().unwrap_or_default();
        self.registry.record(&name, line)?;
        let call = check_call(&self.file_name, &name, line);
        self.scanner.splice(&call);
        Ok(())
    }

    fn skip_markers(&mut self, mut token: Token) -> Token {
        while token.kind == TokenKind::MarkerComment {
            token = self.scanner.next_token();
        }
        token
    }

    fn unexpected(&self, token: Token) -> ParseError {
        ParseError::Syntax {
            file: self.file_name.clone(),
            line: token.line,
            found: token.to_string(),
        }
    }
}
