use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::mem;

/// The different kinds of tokens recognized by the Rox scanner.
///
/// Variants without data represent punctuation, operators or keywords.
/// `STRING`, `INTEGER`, `FLOAT` and `BIGNUM` carry their literal values.
/// `IDENTIFIER` is used for user‑defined names.
/// `EOF` marks the end of input.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Serialize)]
pub enum TokenType {
    /// '('
    LEFT_PAREN,

    /// ')'
    RIGHT_PAREN,

    /// '{'
    LEFT_BRACE,

    /// '}'
    RIGHT_BRACE,

    /// '['
    LEFT_BRACKET,

    /// ']'
    RIGHT_BRACKET,

    /// ','
    COMMA,

    /// '.'
    DOT,

    /// '...'
    ELLIPSIS,

    /// '-'
    MINUS,

    /// '+'
    PLUS,

    /// ';'
    SEMICOLON,

    /// ':'
    COLON,

    /// '?'
    QUESTION,

    /// '/'
    SLASH,

    /// '*'
    STAR,

    /// '**'
    STAR_STAR,

    /// '%'
    PERCENT,

    /// '&'
    AMPERSAND,

    /// '|'
    PIPE,

    /// '^'
    CARET,

    /// '~'
    TILDE,

    /// '!'
    BANG,

    /// '!='
    BANG_EQUAL,

    /// '='
    EQUAL,

    /// '=='
    EQUAL_EQUAL,

    /// '=>'
    ARROW,

    /// '>'
    GREATER,

    /// '>='
    GREATER_EQUAL,

    /// '>>'
    GREATER_GREATER,

    /// '<'
    LESS,

    /// '<='
    LESS_EQUAL,

    /// '<<'
    LESS_LESS,

    /// A user‑defined identifier
    IDENTIFIER,

    /// A string literal (contents without quotes, escapes already applied)
    STRING(String),

    /// An integer literal that fits in 64 bits
    INTEGER(i64),

    /// A floating point literal
    FLOAT(f64),

    /// An arbitrary-precision literal (`12n`, `1.5n`, or an integer too wide
    /// for 64 bits); holds the digits without the suffix
    BIGNUM(String),

    AND,
    ASSERT,
    BREAK,
    CATCH,
    CLASS,
    CONTINUE,
    DO,
    ELSE,
    ENUM,
    FALSE,
    FINALLY,
    FOR,
    FOREACH,
    FUN,
    IF,
    IMPORT,
    IN,
    NIL,
    OR,
    PRINT,
    PUT,
    RETURN,
    STATIC,
    SUPER,
    THIS,
    THROW,
    TRUE,
    TRY,
    VAR,
    WHILE,

    /// End‑of‑file marker
    EOF,
}

impl PartialEq for TokenType {
    /// Two TokenTypes are equal if they share the same variant
    /// (ignoring any inner data). Uses `mem::discriminant` to compare.
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

impl TokenType {
    /// Variant name without payload, as printed by `rox tokenize`.
    pub fn name(&self) -> &'static str {
        match self {
            TokenType::LEFT_PAREN => "LEFT_PAREN",
            TokenType::RIGHT_PAREN => "RIGHT_PAREN",
            TokenType::LEFT_BRACE => "LEFT_BRACE",
            TokenType::RIGHT_BRACE => "RIGHT_BRACE",
            TokenType::LEFT_BRACKET => "LEFT_BRACKET",
            TokenType::RIGHT_BRACKET => "RIGHT_BRACKET",
            TokenType::COMMA => "COMMA",
            TokenType::DOT => "DOT",
            TokenType::ELLIPSIS => "ELLIPSIS",
            TokenType::MINUS => "MINUS",
            TokenType::PLUS => "PLUS",
            TokenType::SEMICOLON => "SEMICOLON",
            TokenType::COLON => "COLON",
            TokenType::QUESTION => "QUESTION",
            TokenType::SLASH => "SLASH",
            TokenType::STAR => "STAR",
            TokenType::STAR_STAR => "STAR_STAR",
            TokenType::PERCENT => "PERCENT",
            TokenType::AMPERSAND => "AMPERSAND",
            TokenType::PIPE => "PIPE",
            TokenType::CARET => "CARET",
            TokenType::TILDE => "TILDE",
            TokenType::BANG => "BANG",
            TokenType::BANG_EQUAL => "BANG_EQUAL",
            TokenType::EQUAL => "EQUAL",
            TokenType::EQUAL_EQUAL => "EQUAL_EQUAL",
            TokenType::ARROW => "ARROW",
            TokenType::GREATER => "GREATER",
            TokenType::GREATER_EQUAL => "GREATER_EQUAL",
            TokenType::GREATER_GREATER => "GREATER_GREATER",
            TokenType::LESS => "LESS",
            TokenType::LESS_EQUAL => "LESS_EQUAL",
            TokenType::LESS_LESS => "LESS_LESS",
            TokenType::IDENTIFIER => "IDENTIFIER",
            TokenType::STRING(_) => "STRING",
            TokenType::INTEGER(_) => "INTEGER",
            TokenType::FLOAT(_) => "FLOAT",
            TokenType::BIGNUM(_) => "BIGNUM",
            TokenType::AND => "AND",
            TokenType::ASSERT => "ASSERT",
            TokenType::BREAK => "BREAK",
            TokenType::CATCH => "CATCH",
            TokenType::CLASS => "CLASS",
            TokenType::CONTINUE => "CONTINUE",
            TokenType::DO => "DO",
            TokenType::ELSE => "ELSE",
            TokenType::ENUM => "ENUM",
            TokenType::FALSE => "FALSE",
            TokenType::FINALLY => "FINALLY",
            TokenType::FOR => "FOR",
            TokenType::FOREACH => "FOREACH",
            TokenType::FUN => "FUN",
            TokenType::IF => "IF",
            TokenType::IMPORT => "IMPORT",
            TokenType::IN => "IN",
            TokenType::NIL => "NIL",
            TokenType::OR => "OR",
            TokenType::PRINT => "PRINT",
            TokenType::PUT => "PUT",
            TokenType::RETURN => "RETURN",
            TokenType::STATIC => "STATIC",
            TokenType::SUPER => "SUPER",
            TokenType::THIS => "THIS",
            TokenType::THROW => "THROW",
            TokenType::TRUE => "TRUE",
            TokenType::TRY => "TRY",
            TokenType::VAR => "VAR",
            TokenType::WHILE => "WHILE",
            TokenType::EOF => "EOF",
        }
    }
}

/// A scanned token, including its type, the original lexeme,
/// and the line number where it was found.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token {
    /// The category of this token.
    pub token_type: TokenType,

    /// The exact substring from the source that produced this token.
    pub lexeme: String,

    /// 1‑based line number in the source.
    pub line: usize,

    /// Opening quote of a string literal: `"` processes escapes, `'` is raw.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<char>,
}

impl Token {
    /// Create a new Token with the given type, lexeme, and line.
    pub fn new(token_type: TokenType, lexeme: impl Into<String>, line: usize) -> Self {
        Self {
            token_type,
            lexeme: lexeme.into(),
            line,
            quote: None,
        }
    }

    /// Attach the quote marker of a string literal.
    pub fn with_quote(mut self, quote: char) -> Self {
        self.quote = Some(quote);
        self
    }

    /// Synthesised identifier token, used for implicit bindings such as `this`.
    pub fn synthetic(lexeme: &str, line: usize) -> Self {
        Self::new(TokenType::IDENTIFIER, lexeme, line)
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.token_type, TokenType::EOF)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 3 → "3", 3.0 → "3.0", 3.14 → "3.14"
        let literal: Cow<'_, str> = match &self.token_type {
            TokenType::STRING(s) => Cow::Borrowed(s),
            TokenType::BIGNUM(digits) => Cow::Borrowed(digits),
            TokenType::INTEGER(n) => {
                let mut buf = itoa::Buffer::new();
                Cow::Owned(buf.format(*n).to_owned())
            }
            TokenType::FLOAT(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    Cow::Owned(format!("{:.1}", n))
                } else {
                    Cow::Owned(n.to_string())
                }
            }
            _ => Cow::Borrowed("null"),
        };

        write!(f, "{} {} {}", self.token_type.name(), self.lexeme, literal)
    }
}
