//! Module `scanner` implements a one‑pass, streaming UTF‑8 lexer for Rox.
//!
//! It transforms a source string into a sequence of [`Token`]s, skipping
//! whitespace and comments, and emitting exactly one `EOF` token at the end.
//! Designed as a `FusedIterator`, it can be chained safely with other
//! iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src: &'a str) -> Scanner<'a>`
//!   Create a new lexer over the input buffer.
//!
//! - `impl Iterator for Scanner<'a>`
//!   Yields `Result<Token, LoxError>` on each `.next()`.  Lexical errors do
//!   not stop the scan; the caller decides whether to continue.
//!
//! - `scan_all(src) -> (Vec<Token>, Vec<LoxError>)`
//!   Convenience wrapper used by the CLI, the REPL and `import`.
//!
//! # Token Recognition
//!
//! - Punctuators: `( ) { } [ ] , . ; : ? ~ ...`
//! - Operators: `+ - * ** / % & | ^ << >> ! != = == => < <= > >=`
//! - Comments: `//` to end of line (skipped with `memchr`) and `/* … */`.
//! - Strings: `"…"` with escapes, `'…'` raw; both may span lines.
//! - Numbers: integers, floats (fraction and/or exponent), and bignum
//!   literals with an `n` suffix.  Integers too wide for `i64` become bignums.
//! - Identifiers/keywords: resolved via a perfect‑hash `KEYWORDS` map.
//!
//! # Example
//!
//! ```rust
//! use rox::scanner::Scanner;
//!
//! let scanner = Scanner::new("print 123; // example");
//! for result in scanner {
//!     match result {
//!         Ok(token) => println!("{}", token),
//!         Err(err) => eprintln!("Lex error: {}", err),
//!     }
//! }
//! ```

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"      => TokenType::AND,
    b"assert"   => TokenType::ASSERT,
    b"break"    => TokenType::BREAK,
    b"catch"    => TokenType::CATCH,
    b"class"    => TokenType::CLASS,
    b"continue" => TokenType::CONTINUE,
    b"do"       => TokenType::DO,
    b"else"     => TokenType::ELSE,
    b"enum"     => TokenType::ENUM,
    b"false"    => TokenType::FALSE,
    b"finally"  => TokenType::FINALLY,
    b"for"      => TokenType::FOR,
    b"foreach"  => TokenType::FOREACH,
    b"fun"      => TokenType::FUN,
    b"if"       => TokenType::IF,
    b"import"   => TokenType::IMPORT,
    b"in"       => TokenType::IN,
    b"nil"      => TokenType::NIL,
    b"or"       => TokenType::OR,
    b"print"    => TokenType::PRINT,
    b"put"      => TokenType::PUT,
    b"return"   => TokenType::RETURN,
    b"static"   => TokenType::STATIC,
    b"super"    => TokenType::SUPER,
    b"this"     => TokenType::THIS,
    b"throw"    => TokenType::THROW,
    b"true"     => TokenType::TRUE,
    b"try"      => TokenType::TRY,
    b"var"      => TokenType::VAR,
    b"while"    => TokenType::WHILE,
};

/// A single pass **scanner / lexer** that converts UTF‑8 source text into a
/// sequence of [`Token`]s.
pub struct Scanner<'a> {
    source: &'a str,            // entire source file
    src: &'a [u8],              // same buffer viewed as bytes
    start: usize,               // index of the *first* byte of the current lexeme
    curr: usize,                // index *one past* the last byte examined
    line: usize,                // 1‑based line counter (\n increments)
    token_line: usize,          // line the current lexeme started on
    pending: Option<TokenType>, // recognised token kind waiting to be emitted
    quote: Option<char>,        // quote marker of a pending string literal
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `source`.
    #[inline]
    pub fn new(source: &'a str) -> Self {
        info!("Scanner created over {} bytes", source.len());

        Self {
            source,
            src: source.as_bytes(),
            start: 0,
            curr: 0,
            line: 1,
            token_line: 1,
            pending: None,
            quote: None,
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    /// Return the length of the input slice.
    #[inline(always)]
    const fn len(&self) -> usize {
        self.src.len()
    }

    /// Are we at (or past) the end of input?
    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Advance one byte and return it.  Higher‑level code always guards with
    /// [`Self::is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it.  Returns `0` if past EOF
    /// to avoid branching at call‑site.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.src[self.curr]
        }
    }

    /// Peek one byte beyond [`Self::peek`].  Safe at EOF.
    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.len() {
            0
        } else {
            self.src[self.curr + 1]
        }
    }

    /// Conditionally consume a byte **iff** it matches `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    #[inline(always)]
    fn emit(&mut self, tt: TokenType) {
        self.pending = Some(tt);
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* token starting at `self.curr`.  If the lexeme produces an
    /// actual token the kind is stored in `self.pending`.  Whitespace and
    /// comments are skipped by returning `Ok(())` with `pending = None`.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        match b {
            // ── single‑character punctuators ──────────────────────────────
            b'(' => self.emit(TokenType::LEFT_PAREN),
            b')' => self.emit(TokenType::RIGHT_PAREN),
            b'{' => self.emit(TokenType::LEFT_BRACE),
            b'}' => self.emit(TokenType::RIGHT_BRACE),
            b'[' => self.emit(TokenType::LEFT_BRACKET),
            b']' => self.emit(TokenType::RIGHT_BRACKET),
            b',' => self.emit(TokenType::COMMA),
            b'-' => self.emit(TokenType::MINUS),
            b'+' => self.emit(TokenType::PLUS),
            b';' => self.emit(TokenType::SEMICOLON),
            b':' => self.emit(TokenType::COLON),
            b'?' => self.emit(TokenType::QUESTION),
            b'%' => self.emit(TokenType::PERCENT),
            b'&' => self.emit(TokenType::AMPERSAND),
            b'|' => self.emit(TokenType::PIPE),
            b'^' => self.emit(TokenType::CARET),
            b'~' => self.emit(TokenType::TILDE),

            b'.' => {
                if self.peek() == b'.' && self.peek_next() == b'.' {
                    self.curr += 2;
                    self.emit(TokenType::ELLIPSIS);
                } else {
                    self.emit(TokenType::DOT);
                }
            }

            // ── one‑or‑two‑character operators ───────────────────────────
            b'*' => {
                let tt = if self.match_byte(b'*') {
                    TokenType::STAR_STAR
                } else {
                    TokenType::STAR
                };

                self.emit(tt);
            }

            b'!' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                };

                self.emit(tt);
            }

            b'=' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else if self.match_byte(b'>') {
                    TokenType::ARROW
                } else {
                    TokenType::EQUAL
                };

                self.emit(tt);
            }

            b'<' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else if self.match_byte(b'<') {
                    TokenType::LESS_LESS
                } else {
                    TokenType::LESS
                };

                self.emit(tt);
            }

            b'>' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else if self.match_byte(b'>') {
                    TokenType::GREATER_GREATER
                } else {
                    TokenType::GREATER
                };

                self.emit(tt);
            }

            // ── whitespace / newline ─────────────────────────────────────
            b' ' | b'\r' | b'\t' => {
                return Ok(());
            }

            b'\n' => {
                self.line += 1;

                return Ok(());
            }

            // ── comments ─────────────────────────────────────────────────
            b'/' => {
                if self.match_byte(b'/') {
                    // Fast‑forward to next newline using `memchr`.  If none
                    // found, skip to EOF.
                    if let Some(pos) = memchr(b'\n', &self.src[self.curr..]) {
                        self.curr += pos;
                    } else {
                        self.curr = self.len();
                    }

                    return Ok(());
                }

                if self.match_byte(b'*') {
                    return self.skip_block_comment();
                }

                self.emit(TokenType::SLASH);
            }

            // ── string literals ──────────────────────────────────────────
            b'"' | b'\'' => {
                return self.parse_string(b);
            }

            // ── number literal (digit‑leading) ───────────────────────────
            b'0'..=b'9' => {
                self.parse_number();
            }

            // ── identifiers / keywords (alpha or underscore‑leading) ─────
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.parse_identifier();
            }

            // ── unexpected character ─────────────────────────────────────
            _ => {
                // Consume the rest of a multi‑byte character so the next
                // lexeme starts on a char boundary.
                while self.peek() & 0xC0 == 0x80 {
                    self.advance();
                }

                return Err(LoxError::lex(
                    self.line,
                    format!(
                        "Unexpected character: {}",
                        &self.source[self.start..self.curr]
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Skip a `/* … */` comment.  The opening delimiter is already consumed.
    fn skip_block_comment(&mut self) -> Result<()> {
        while !self.is_at_end() {
            if self.peek() == b'*' && self.peek_next() == b'/' {
                self.curr += 2;
                return Ok(());
            }

            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        Err(LoxError::lex(self.line, "Unterminated block comment."))
    }

    /// Parse a quoted string literal.
    ///
    /// * `self.start` still points to the opening quote.
    /// * When we return, `self.curr` points **past** the closing quote.
    /// * Double quotes process escape sequences; single quotes are raw.
    fn parse_string(&mut self, quote: u8) -> Result<()> {
        let raw = quote == b'\'';
        let mut value = String::new();
        let mut run_start = self.curr;

        while !self.is_at_end() && self.peek() != quote {
            let b = self.advance();

            if b == b'\n' {
                self.line += 1; // multi‑line strings are allowed
            }

            if b == b'\\' && !raw && !self.is_at_end() {
                value.push_str(&self.source[run_start..self.curr - 1]);

                // Unknown escapes are kept verbatim, backslash included.
                let ch = match self.peek() {
                    b'n' => Some('\n'),
                    b't' => Some('\t'),
                    b'r' => Some('\r'),
                    b'0' => Some('\0'),
                    b'\\' => Some('\\'),
                    b'"' => Some('"'),
                    b'\'' => Some('\''),
                    _ => None,
                };

                match ch {
                    Some(ch) => {
                        self.advance();
                        value.push(ch);
                    }
                    None => value.push('\\'),
                }

                run_start = self.curr;
            }
        }

        if self.is_at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        value.push_str(&self.source[run_start..self.curr]);
        self.advance(); // consume closing quote

        self.quote = Some(quote as char);
        self.emit(TokenType::STRING(value));

        Ok(())
    }

    /// Parse a numeric literal (`123`, `3.14`, `1e9`, `42n`, `0.5n`).
    fn parse_number(&mut self) {
        let mut is_float = false;

        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // Optional fractional part.
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            is_float = true;
            self.advance(); // consume "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        // Optional exponent.
        if matches!(self.peek(), b'e' | b'E') {
            let sign = matches!(self.peek_next(), b'+' | b'-');
            let digit_at = if sign { self.curr + 2 } else { self.curr + 1 };

            if self.src.get(digit_at).is_some_and(u8::is_ascii_digit) {
                is_float = true;
                self.curr = digit_at;

                while self.peek().is_ascii_digit() {
                    self.advance();
                }
            }
        }

        let text: &str = &self.source[self.start..self.curr];

        // Bignum suffix, unless it starts an identifier (`12name` stays split).
        if self.peek() == b'n' && !is_ident_byte(self.peek_next()) {
            self.advance();
            self.emit(TokenType::BIGNUM(text.to_owned()));
            return;
        }

        let tt = if is_float {
            // Digits were checked above, so the parse cannot fail.
            TokenType::FLOAT(text.parse::<f64>().unwrap_or(f64::NAN))
        } else {
            match text.parse::<i64>() {
                Ok(n) => TokenType::INTEGER(n),
                Err(_) => {
                    debug!("Integer literal {} overflows i64, promoting", text);
                    TokenType::BIGNUM(text.to_owned())
                }
            }
        };

        self.emit(tt);
    }

    /// Parse an identifier and decide if it is a **keyword** or a generic
    /// `IDENTIFIER` token.
    fn parse_identifier(&mut self) {
        while is_ident_byte(self.peek()) {
            self.advance();
        }

        let slice: &[u8] = &self.src[self.start..self.curr];

        let tt: TokenType = KEYWORDS
            .get(slice)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER);

        self.emit(tt);
    }
}

#[inline(always)]
fn is_ident_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// Scan the whole of `source`, separating tokens from lexical errors.
pub fn scan_all(source: &str) -> (Vec<Token>, Vec<LoxError>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for item in Scanner::new(source) {
        match item {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    info!(
        "Scanned {} token(s) with {} error(s)",
        tokens.len(),
        errors.len()
    );

    (tokens, errors)
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        // Loop until we either emit a token, hit EOF, or see an error.
        while self.curr <= self.len() {
            // 1. EOF guard – emit exactly one EOF then terminate.
            if self.curr == self.len() {
                self.curr += 1; // ensure fused semantics
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            // 2. Reset per‑token state.
            self.start = self.curr;
            self.token_line = self.line;
            self.pending = None;
            self.quote = None;

            // 3. Attempt to scan a token.
            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            // 4. If a real token was recognised, build and return it.
            if let Some(tt) = self.pending.take() {
                let lexeme: &str = &self.source[self.start..self.curr];
                debug!("Scanned token ({:?}) on line {}", tt, self.token_line);

                let token = Token::new(tt, lexeme, self.token_line);

                return Some(Ok(match self.quote.take() {
                    Some(q) => token.with_quote(q),
                    None => token,
                }));
            }
            // Otherwise it was whitespace / comment → continue loop.
        }

        None // already yielded EOF
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<&'static str> {
        Scanner::new(source)
            .filter_map(|r| r.ok())
            .map(|t| t.token_type.name())
            .collect()
    }

    #[test]
    fn multi_character_operators() {
        assert_eq!(
            kinds("** => ... << >> <= >= != =="),
            vec![
                "STAR_STAR",
                "ARROW",
                "ELLIPSIS",
                "LESS_LESS",
                "GREATER_GREATER",
                "LESS_EQUAL",
                "GREATER_EQUAL",
                "BANG_EQUAL",
                "EQUAL_EQUAL",
                "EOF"
            ]
        );
    }

    #[test]
    fn string_line_is_where_it_starts() {
        let tokens: Vec<Token> = Scanner::new("\"a\nb\" x")
            .filter_map(|r| r.ok())
            .collect();

        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn non_ascii_outside_strings_is_an_error() {
        let results: Vec<_> = Scanner::new("é 1").collect();

        assert!(results[0].is_err());
        assert!(matches!(
            results[1].as_ref().map(|t| t.token_type.clone()),
            Ok(TokenType::INTEGER(1))
        ));
    }
}
