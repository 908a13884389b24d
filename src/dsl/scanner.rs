//! Scanner (tokenizer) for the circuit description language.

use std::path::{Path, PathBuf};

use log::trace;

use super::keywords::{is_filler, Heading, Keyword};
use crate::error::{Diagnostic, DiagnosticKind, LogsimError, Result};
use crate::names::{NameId, Names};

/// Where the scanned text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    String,
}

/// A symbol produced by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// The kind of symbol
    pub kind: SymbolKind,
    /// The symbol's text as written
    pub text: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

/// Symbol types in the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Section heading (`devices`, `connections`, ...)
    Heading(Heading),
    /// Statement keyword (`is`, `has`, `to`, ...)
    Keyword(Keyword),
    /// Decimal literal
    Number(u32),
    /// Identifier with its interned ID
    Name(NameId),
    /// Identifier with no ID, only produced in [`NameMode::Query`]
    UnknownName,
    /// ','
    Comma,
    /// '=>'
    Arrow,
    /// '{'
    OpenBrace,
    /// '}'
    CloseBrace,
    /// ';'
    Semicolon,
    /// '.'
    Dot,
    /// '-'
    Minus,
    /// End of input
    Eof,
}

/// How identifiers are resolved against the name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameMode {
    /// First use of a name assigns it an ID.
    #[default]
    Declare,
    /// Names without an ID come back as [`SymbolKind::UnknownName`].
    Query,
}

/// Character-level scanner over one circuit description.
#[derive(Debug, Clone)]
pub struct Scanner {
    source: Source,
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    lines: Vec<String>,
}

impl Scanner {
    /// Create a scanner over in-memory text.
    pub fn new(text: &str) -> Self {
        Self::with_source(text, Source::String)
    }

    /// Create a scanner over the contents of a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| LogsimError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Self::with_source(&text, Source::File(path.to_path_buf())))
    }

    fn with_source(text: &str, source: Source) -> Self {
        Self {
            source,
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            lines: text.lines().map(String::from).collect(),
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// The lookahead character, `None` at end of input.
    pub fn current_character(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Text of a source line (1-indexed), empty past the end.
    pub fn line_text(&self, line: usize) -> &str {
        line.checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .map_or("", String::as_str)
    }

    /// Build a diagnostic pointing at `line`/`column` of this source.
    pub fn diagnostic(
        &self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Diagnostic {
        Diagnostic::new(kind, message, line, column, self.line_text(line))
    }

    /// Get the next symbol.
    ///
    /// Filler words and comments are skipped. On error the offending
    /// characters have been consumed, so the next call makes progress.
    pub fn get_symbol(
        &mut self,
        names: &mut Names,
        mode: NameMode,
    ) -> std::result::Result<Symbol, Diagnostic> {
        loop {
            self.skip_spaces();

            let line = self.line;
            let column = self.column;
            let Some(ch) = self.current_character() else {
                return Ok(self.symbol(SymbolKind::Eof, String::new(), line, column));
            };

            let kind = match ch {
                '#' => {
                    self.skip_line();
                    continue;
                }
                '/' => {
                    self.advance();
                    if self.current_character() != Some('/') {
                        return Err(self.diagnostic(
                            DiagnosticKind::Syntax,
                            "expected '//' to open a comment",
                            line,
                            column,
                        ));
                    }
                    self.advance();
                    self.skip_block_comment(line, column)?;
                    continue;
                }
                '=' => {
                    self.advance();
                    if self.current_character() != Some('>') {
                        return Err(self.diagnostic(
                            DiagnosticKind::Syntax,
                            "expected '=>'",
                            line,
                            column,
                        ));
                    }
                    self.advance();
                    return Ok(self.symbol(SymbolKind::Arrow, "=>".to_string(), line, column));
                }
                ',' => SymbolKind::Comma,
                '{' => SymbolKind::OpenBrace,
                '}' => SymbolKind::CloseBrace,
                ';' => SymbolKind::Semicolon,
                '.' => SymbolKind::Dot,
                '-' => SymbolKind::Minus,
                _ if ch.is_ascii_digit() => {
                    let text = self.read_while(|c| c.is_ascii_digit());
                    return match text.parse::<u32>() {
                        Ok(value) => Ok(self.symbol(SymbolKind::Number(value), text, line, column)),
                        Err(_) => Err(self.diagnostic(
                            DiagnosticKind::Syntax,
                            format!("number '{}' is too large", text),
                            line,
                            column,
                        )),
                    };
                }
                _ if ch.is_ascii_alphabetic() => {
                    let word = self.read_while(|c| c.is_ascii_alphanumeric());
                    if is_filler(&word) {
                        continue;
                    }
                    let kind = self.classify(&word, names, mode, line, column)?;
                    return Ok(self.symbol(kind, word, line, column));
                }
                _ => {
                    self.advance();
                    return Err(self.diagnostic(
                        DiagnosticKind::Syntax,
                        format!("invalid character '{}'", ch),
                        line,
                        column,
                    ));
                }
            };

            self.advance();
            return Ok(self.symbol(kind, ch.to_string(), line, column));
        }
    }

    /// Skip whitespace, newlines included.
    pub fn skip_spaces(&mut self) {
        while self.current_character().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn classify(
        &self,
        word: &str,
        names: &mut Names,
        mode: NameMode,
        line: usize,
        column: usize,
    ) -> std::result::Result<SymbolKind, Diagnostic> {
        if let Some(heading) = Heading::from_word(word) {
            return Ok(SymbolKind::Heading(heading));
        }
        if let Some(keyword) = Keyword::from_word(word) {
            return Ok(SymbolKind::Keyword(keyword));
        }
        match mode {
            NameMode::Declare => names
                .lookup(word)
                .map(SymbolKind::Name)
                .map_err(|e| self.diagnostic(DiagnosticKind::Syntax, e.to_string(), line, column)),
            NameMode::Query => Ok(names.query(word).map_or(SymbolKind::UnknownName, SymbolKind::Name)),
        }
    }

    fn symbol(&self, kind: SymbolKind, text: String, line: usize, column: usize) -> Symbol {
        trace!("symbol {:?} '{}' at {}:{}", kind, text, line, column);
        Symbol {
            kind,
            text,
            line,
            column,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current_character()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_line(&mut self) {
        while let Some(ch) = self.advance() {
            if ch == '\n' {
                break;
            }
        }
    }

    /// Skip to just past the next `//`. The opening `//` is already consumed.
    fn skip_block_comment(&mut self, line: usize, column: usize) -> std::result::Result<(), Diagnostic> {
        loop {
            match self.advance() {
                None => {
                    return Err(self.diagnostic(
                        DiagnosticKind::Syntax,
                        "comment is never closed with '//'",
                        line,
                        column,
                    ));
                }
                Some('/') if self.current_character() == Some('/') => {
                    self.advance();
                    return Ok(());
                }
                Some(_) => {}
            }
        }
    }

    fn read_while(&mut self, accept: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(ch) = self.current_character() {
            if !accept(ch) {
                break;
            }
            text.push(ch);
            self.advance();
        }
        text
    }
}
