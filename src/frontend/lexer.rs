//! Lexer for Brolga
//!
//! Converts source code into a stream of tokens.

use crate::frontend::token::{Token, TokenKind};
use crate::utils::Span;

/// The lexer state
pub struct Lexer {
    /// Source code as characters
    source: Vec<char>,
    /// Current position in source
    pos: usize,
    /// Start position of current token
    start: usize,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            start: 0,
        }
    }

    /// Get the current character without advancing
    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    /// Get the next character without advancing
    fn peek_next(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    /// Advance to the next character
    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    /// Check if we've reached the end of input
    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Create a span from start to current position
    fn make_span(&self) -> Span {
        Span::new(self.start, self.pos)
    }

    /// Create a token with the current span
    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.make_span())
    }

    /// Skip whitespace and line comments
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                '/' if self.peek_next() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.source[self.start..self.pos].iter().collect();

        let kind = TokenKind::keyword_from_str(&text).unwrap_or(TokenKind::Ident(text));

        self.make_token(kind)
    }

    /// Read a number literal
    ///
    /// Brolga numerals are decimal, with an optional fraction and an
    /// optional exponent. The dot and the `E` are only consumed when a
    /// digit actually follows, so `2.` and `5E` stop after the digits and
    /// leave the rest for the parser to reject.
    fn read_number(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        // Fraction
        if self.peek() == Some('.') && self.peek_next().map_or(false, |c| c.is_ascii_digit()) {
            self.advance(); // consume '.'
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        // Exponent, optionally signed
        if matches!(self.peek(), Some('e') | Some('E')) {
            let after_e = self.peek_next();
            let after_sign = self.source.get(self.pos + 2).copied();
            let has_exponent = match after_e {
                Some(c) if c.is_ascii_digit() => true,
                Some('+') | Some('-') => after_sign.map_or(false, |c| c.is_ascii_digit()),
                _ => false,
            };
            if has_exponent {
                self.advance(); // e
                if matches!(self.peek(), Some('+') | Some('-')) {
                    self.advance();
                }
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        let text: String = self.source[self.start..self.pos].iter().collect();
        let value = text.parse().unwrap_or(0.0);
        self.make_token(TokenKind::NumberLit(value))
    }

    /// Read a string literal
    ///
    /// Brolga strings have no escape sequences; any character except the
    /// closing quote and a newline may appear.
    fn read_string(&mut self) -> Token {
        self.advance(); // consume opening quote

        let mut value = String::new();

        while let Some(c) = self.peek() {
            if c == '"' {
                self.advance(); // consume closing quote
                break;
            } else if c == '\n' {
                // Unterminated string; the parser reports the mismatch
                break;
            } else {
                value.push(c);
                self.advance();
            }
        }

        self.make_token(TokenKind::StringLit(value))
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        self.start = self.pos;

        if self.is_at_end() {
            return Token::eof(self.make_span());
        }

        let c = self.advance().unwrap();

        // Identifiers and keywords
        if c.is_alphabetic() || c == '_' {
            self.pos -= 1; // back up
            return self.read_identifier();
        }

        // Numbers
        if c.is_ascii_digit() {
            self.pos -= 1; // back up
            return self.read_number();
        }

        // String literals
        if c == '"' {
            self.pos -= 1; // back up
            return self.read_string();
        }

        // Operators and punctuation
        let kind = match c {
            '+' => {
                if self.peek() == Some('+') {
                    self.advance();
                    TokenKind::PlusPlus
                } else {
                    TokenKind::Plus
                }
            }
            '-' => TokenKind::Minus,
            '*' => {
                if self.peek() == Some('*') {
                    self.advance();
                    TokenKind::StarStar
                } else {
                    TokenKind::Star
                }
            }
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Ne
                } else {
                    TokenKind::Not
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '#' => TokenKind::Hash,
            '?' => TokenKind::Question,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            _ => TokenKind::Unknown(c),
        };

        self.make_token(kind)
    }

    /// Tokenize the entire source and return all tokens
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_tokens() {
        let mut lexer = Lexer::new("let x = 1;");
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[0].kind, TokenKind::Let));
        assert!(matches!(tokens[1].kind, TokenKind::Ident(ref s) if s == "x"));
        assert!(matches!(tokens[2].kind, TokenKind::Eq));
        assert!(matches!(tokens[3].kind, TokenKind::NumberLit(n) if n == 1.0));
        assert!(matches!(tokens[4].kind, TokenKind::Semicolon));
        assert!(matches!(tokens[5].kind, TokenKind::Eof));
    }

    #[test]
    fn test_numeral_forms() {
        let mut lexer = Lexer::new("8 89.123 1.3E5 1.3E+5 1.3E-5");
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[0].kind, TokenKind::NumberLit(n) if n == 8.0));
        assert!(matches!(tokens[1].kind, TokenKind::NumberLit(n) if (n - 89.123).abs() < 1e-9));
        assert!(matches!(tokens[2].kind, TokenKind::NumberLit(n) if n == 1.3e5));
        assert!(matches!(tokens[3].kind, TokenKind::NumberLit(n) if n == 1.3e5));
        assert!(matches!(tokens[4].kind, TokenKind::NumberLit(n) if (n - 1.3e-5).abs() < 1e-12));
    }

    #[test]
    fn test_dot_without_fraction_not_consumed() {
        let mut lexer = Lexer::new("2.");
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[0].kind, TokenKind::NumberLit(n) if n == 2.0));
        assert!(matches!(tokens[1].kind, TokenKind::Unknown('.')));
    }

    #[test]
    fn test_exponent_without_digits_not_consumed() {
        let mut lexer = Lexer::new("5E * 11");
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[0].kind, TokenKind::NumberLit(n) if n == 5.0));
        assert!(matches!(tokens[1].kind, TokenKind::Ident(ref s) if s == "E"));
        assert!(matches!(tokens[2].kind, TokenKind::Star));
    }

    #[test]
    fn test_operators() {
        let mut lexer = Lexer::new("++ + - ** * / % == != <= < >= > = ! # ?");
        let kinds: Vec<TokenKind> = lexer.tokenize().into_iter().map(|t| t.kind).collect();

        assert_eq!(
            kinds,
            vec![
                TokenKind::PlusPlus,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::StarStar,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::EqEq,
                TokenKind::Ne,
                TokenKind::Le,
                TokenKind::Lt,
                TokenKind::Ge,
                TokenKind::Gt,
                TokenKind::Eq,
                TokenKind::Not,
                TokenKind::Hash,
                TokenKind::Question,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords() {
        let mut lexer = Lexer::new("let const fnc print if else while break true false nil");
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[0].kind, TokenKind::Let));
        assert!(matches!(tokens[1].kind, TokenKind::Const));
        assert!(matches!(tokens[2].kind, TokenKind::Fnc));
        assert!(matches!(tokens[3].kind, TokenKind::Print));
        assert!(matches!(tokens[4].kind, TokenKind::If));
        assert!(matches!(tokens[5].kind, TokenKind::Else));
        assert!(matches!(tokens[6].kind, TokenKind::While));
        assert!(matches!(tokens[7].kind, TokenKind::Break));
        assert!(matches!(tokens[8].kind, TokenKind::True));
        assert!(matches!(tokens[9].kind, TokenKind::False));
        assert!(matches!(tokens[10].kind, TokenKind::Nil));
    }

    #[test]
    fn test_strings() {
        let mut lexer = Lexer::new(r#"print("hello");"#);
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[2].kind, TokenKind::StringLit(ref s) if s == "hello"));
    }

    #[test]
    fn test_non_latin_identifiers() {
        let mut lexer = Lexer::new("let コンパイラ = 100;");
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[1].kind, TokenKind::Ident(ref s) if s == "コンパイラ"));
    }

    #[test]
    fn test_comments() {
        let mut lexer = Lexer::new("print(1);//\nprint(0);// yay");
        let tokens = lexer.tokenize();
        let prints = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Print)
            .count();

        assert_eq!(prints, 2);
        assert!(matches!(tokens.last().unwrap().kind, TokenKind::Eof));
    }

    #[test]
    fn test_spans_track_positions() {
        let mut lexer = Lexer::new("let x");
        let tokens = lexer.tokenize();

        assert_eq!(tokens[0].span, Span::new(0, 3));
        assert_eq!(tokens[1].span, Span::new(4, 5));
    }
}
