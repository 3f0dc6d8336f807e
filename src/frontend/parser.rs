//! Parser for Brolga
//!
//! Recursive descent over the token vector. The expression grammar is
//! layered (relation / additive / multiplicative / exponent / primary);
//! relational operators are non-associative, exponentiation is
//! right-associative, and a unary operand is a bare primary, so
//! `-2 ** 2` does not parse.

use crate::frontend::ast::*;
use crate::frontend::lexer::Lexer;
use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Result, Span};

/// The parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Create a new parser from a lexer
    pub fn new(mut lexer: Lexer) -> Self {
        Self {
            tokens: lexer.tokenize(),
            pos: 0,
        }
    }

    // ==================== Helper Methods ====================

    fn current(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .unwrap_or_else(|| self.tokens.last().expect("tokens should not be empty"))
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token> {
        if self.check(&expected) {
            Ok(self.advance())
        } else {
            Err(Error::UnexpectedToken {
                expected: format!("{:?}", expected),
                got: format!("{:?}", self.current_kind()),
                span: self.current().span,
            })
        }
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn prev_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    // ==================== Parsing Methods ====================

    /// Parse a complete program
    pub fn parse_program(&mut self) -> Result<Program> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.parse_stmt()?);
        }

        Ok(Program { statements })
    }

    /// Parse a statement
    fn parse_stmt(&mut self) -> Result<Stmt> {
        match self.current_kind() {
            TokenKind::Let | TokenKind::Const => self.parse_var_dec(),
            TokenKind::Fnc => self.parse_fun_dec(),
            TokenKind::Print => self.parse_print(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Break => self.parse_break(),
            TokenKind::PlusPlus => self.parse_increment(),
            TokenKind::Ident(_) => self.parse_assignment(),
            _ => Err(Error::UnexpectedToken {
                expected: "statement".to_string(),
                got: format!("{:?}", self.current_kind()),
                span: self.current().span,
            }),
        }
    }

    /// let/const name [: type] = expr ;
    fn parse_var_dec(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        let mutable = matches!(self.current_kind(), TokenKind::Let);
        self.advance(); // let or const

        let name = self.parse_ident()?;

        let annotation = if self.consume(&TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        self.expect(TokenKind::Eq)?;
        let initializer = self.parse_exp()?;
        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt::VarDec {
            mutable,
            name,
            annotation,
            initializer,
            span: start.merge(&self.prev_span()),
        })
    }

    /// fnc name(params) = expr ;
    fn parse_fun_dec(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Fnc)?;

        let name = self.parse_ident()?;

        self.expect(TokenKind::LParen)?;
        let params = self.parse_params()?;
        self.expect(TokenKind::RParen)?;

        self.expect(TokenKind::Eq)?;
        let body = self.parse_exp()?;
        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt::FunDec {
            name,
            params,
            body,
            span: start.merge(&self.prev_span()),
        })
    }

    fn parse_params(&mut self) -> Result<Vec<Param>> {
        let mut params = Vec::new();

        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            params.push(self.parse_param()?);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }

        Ok(params)
    }

    fn parse_param(&mut self) -> Result<Param> {
        let start = self.current().span;
        let name = self.parse_ident()?;
        self.expect(TokenKind::Colon)?;
        let annotation = self.parse_type()?;

        Ok(Param {
            name,
            annotation,
            span: start.merge(&self.prev_span()),
        })
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.current().clone();
        match &token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Ident {
                    name: name.clone(),
                    span: token.span,
                })
            }
            _ => Err(Error::ExpectedIdent { span: token.span }),
        }
    }

    /// A type annotation: a base type name with postfix `[]` and `?`
    fn parse_type(&mut self) -> Result<TypeAnn> {
        let token = self.current().clone();
        let mut ann = match &token.kind {
            TokenKind::Ident(name) => match name.as_str() {
                "number" => TypeAnn::Number { span: token.span },
                "boolean" => TypeAnn::Boolean { span: token.span },
                "string" => TypeAnn::Str { span: token.span },
                _ => return Err(Error::ExpectedType { span: token.span }),
            },
            _ => return Err(Error::ExpectedType { span: token.span }),
        };
        self.advance();

        loop {
            if self.consume(&TokenKind::LBracket) {
                self.expect(TokenKind::RBracket)?;
                ann = TypeAnn::Array {
                    element: Box::new(ann),
                    span: token.span.merge(&self.prev_span()),
                };
            } else if self.consume(&TokenKind::Question) {
                ann = TypeAnn::Optional {
                    inner: Box::new(ann),
                    span: token.span.merge(&self.prev_span()),
                };
            } else {
                break;
            }
        }

        Ok(ann)
    }

    /// print expr ;
    fn parse_print(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Print)?;
        let argument = self.parse_exp()?;
        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt::Print {
            argument,
            span: start.merge(&self.prev_span()),
        })
    }

    /// if expr { ... } [else { ... } | else if ...]
    fn parse_if(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::If)?;
        let test = self.parse_exp()?;
        let consequent = self.parse_block()?;

        let alternate = if self.consume(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                Some(ElseBranch::If(Box::new(self.parse_if()?)))
            } else {
                Some(ElseBranch::Block(self.parse_block()?))
            }
        } else {
            None
        };

        Ok(Stmt::If {
            test,
            consequent,
            alternate,
            span: start.merge(&self.prev_span()),
        })
    }

    /// while expr { ... }
    fn parse_while(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::While)?;
        let test = self.parse_exp()?;
        let body = self.parse_block()?;

        Ok(Stmt::While {
            test,
            body,
            span: start.merge(&self.prev_span()),
        })
    }

    /// break ;
    fn parse_break(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Break)?;
        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt::Break {
            span: start.merge(&self.prev_span()),
        })
    }

    /// ++name ;
    fn parse_increment(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::PlusPlus)?;
        let target = self.parse_ident()?;
        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt::Increment {
            target,
            span: start.merge(&self.prev_span()),
        })
    }

    /// name subscript* = expr ;
    fn parse_assignment(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        let name = self.parse_ident()?;
        let mut target = Expr::Id(name);

        while self.check(&TokenKind::LBracket) {
            target = self.parse_subscript(target)?;
        }

        self.expect(TokenKind::Eq)?;
        let source = self.parse_exp()?;
        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt::Assignment {
            target,
            source,
            span: start.merge(&self.prev_span()),
        })
    }

    /// { statement* }
    fn parse_block(&mut self) -> Result<Vec<Stmt>> {
        self.expect(TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            statements.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(statements)
    }

    // ==================== Expressions ====================

    /// Relation level: non-associative, so at most one operator
    fn parse_exp(&mut self) -> Result<Expr> {
        let left = self.parse_condition()?;

        let op = match self.current_kind() {
            TokenKind::EqEq => Some(BinOp::Eq),
            TokenKind::Ne => Some(BinOp::Ne),
            TokenKind::Lt => Some(BinOp::Lt),
            TokenKind::Le => Some(BinOp::Le),
            TokenKind::Gt => Some(BinOp::Gt),
            TokenKind::Ge => Some(BinOp::Ge),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let right = self.parse_condition()?;
            let span = left.span().merge(&right.span());
            return Ok(Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            });
        }

        Ok(left)
    }

    /// Additive level, left-associative
    fn parse_condition(&mut self) -> Result<Expr> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.current_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            let span = left.span().merge(&right.span());
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }

        Ok(left)
    }

    /// Multiplicative level, left-associative
    fn parse_term(&mut self) -> Result<Expr> {
        let mut left = self.parse_factor()?;

        loop {
            let op = match self.current_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_factor()?;
            let span = left.span().merge(&right.span());
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }

        Ok(left)
    }

    /// Unary prefix or right-associative exponentiation
    fn parse_factor(&mut self) -> Result<Expr> {
        let op = match self.current_kind() {
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Not => Some(UnOp::Not),
            TokenKind::Hash => Some(UnOp::Len),
            _ => None,
        };

        if let Some(op) = op {
            let start = self.current().span;
            self.advance();
            let operand = self.parse_primary()?;
            let span = start.merge(&operand.span());
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                span,
            });
        }

        let base = self.parse_primary()?;
        if self.consume(&TokenKind::StarStar) {
            let right = self.parse_factor()?;
            let span = base.span().merge(&right.span());
            return Ok(Expr::Binary {
                op: BinOp::Pow,
                left: Box::new(base),
                right: Box::new(right),
                span,
            });
        }

        Ok(base)
    }

    /// Primary expression plus postfix subscripts
    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.current().clone();

        let mut expr = match &token.kind {
            TokenKind::NumberLit(value) => {
                self.advance();
                Expr::Number {
                    value: *value,
                    span: token.span,
                }
            }
            TokenKind::StringLit(value) => {
                self.advance();
                Expr::Str {
                    value: value.clone(),
                    span: token.span,
                }
            }
            TokenKind::True => {
                self.advance();
                Expr::Boolean {
                    value: true,
                    span: token.span,
                }
            }
            TokenKind::False => {
                self.advance();
                Expr::Boolean {
                    value: false,
                    span: token.span,
                }
            }
            TokenKind::Nil => {
                self.advance();
                Expr::Nil { span: token.span }
            }
            TokenKind::LBracket => self.parse_array()?,
            TokenKind::Ident(_) => {
                let ident = self.parse_ident()?;
                if self.check(&TokenKind::LParen) {
                    self.parse_call(ident)?
                } else {
                    Expr::Id(ident)
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_exp()?;
                self.expect(TokenKind::RParen)?;
                // Parenthesization is transparent
                inner
            }
            _ => return Err(Error::ExpectedExpr { span: token.span }),
        };

        while self.check(&TokenKind::LBracket) {
            expr = self.parse_subscript(expr)?;
        }

        Ok(expr)
    }

    /// [ expr, ... ] with no trailing comma
    fn parse_array(&mut self) -> Result<Expr> {
        let start = self.current().span;
        self.expect(TokenKind::LBracket)?;

        let mut elements = Vec::new();
        if !self.check(&TokenKind::RBracket) {
            elements.push(self.parse_exp()?);
            while self.consume(&TokenKind::Comma) {
                elements.push(self.parse_exp()?);
            }
        }

        self.expect(TokenKind::RBracket)?;

        Ok(Expr::Array {
            elements,
            span: start.merge(&self.prev_span()),
        })
    }

    /// name ( expr, ... )
    fn parse_call(&mut self, callee: Ident) -> Result<Expr> {
        let start = callee.span;
        self.expect(TokenKind::LParen)?;

        let mut arguments = Vec::new();
        if !self.check(&TokenKind::RParen) {
            arguments.push(self.parse_exp()?);
            while self.consume(&TokenKind::Comma) {
                arguments.push(self.parse_exp()?);
            }
        }

        self.expect(TokenKind::RParen)?;

        Ok(Expr::Call {
            callee,
            arguments,
            span: start.merge(&self.prev_span()),
        })
    }

    /// base [ expr ]
    fn parse_subscript(&mut self, base: Expr) -> Result<Expr> {
        self.expect(TokenKind::LBracket)?;
        let index = self.parse_exp()?;
        self.expect(TokenKind::RBracket)?;
        let span = base.span().merge(&self.prev_span());

        Ok(Expr::Subscript {
            base: Box::new(base),
            index: Box::new(index),
            span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Program> {
        Parser::new(Lexer::new(source)).parse_program()
    }

    // Programs expected to be syntactically correct
    const SYNTAX_CHECKS: &[(&str, &str)] = &[
        ("simplest program", "break;"),
        ("multiple statements", "print 1;\nbreak;\nx=5;\nbreak;\n++x;"),
        ("variable declarations", "let e=99*1;\nconst z=false;"),
        ("annotated declarations", "let x: number? = nil; const a: string[] = [\"hi\"];"),
        ("function with no params", "fnc f() = 3;"),
        ("function with one param", "fnc f(x: number) = x;"),
        ("function with two params", "fnc f(x: number, y: boolean) = \"hello\";"),
        ("array type for param", "fnc f(x: boolean[][][]) = 3;"),
        ("optional array type", "fnc f(x: number[]?) = 3;"),
        ("assignments", "++a; abc=9*3; a=1;"),
        ("assignment to array element", "c[2] = 100;"),
        ("call in exp", "print 5 * f(x, y, 2 * y);"),
        ("call with parens", "print(f(1));"),
        ("short if", "if true { print 1; }"),
        ("longer if", "if true { print 1; } else { print 1; }"),
        ("even longer if", "if true { print 1; } else if false { print 1;}"),
        ("while with empty block", "while true {}"),
        ("while with one statement block", "while true { let x = 1; }"),
        ("relational operators", "a=1<2;a=1<=2;a=1==2;a=1!=2;a=1>=2;a=1>2;"),
        ("arithmetic", "print 2 * x + 3 / 5 - -1 % 7 ** 3 ** 3;"),
        ("length", "print #c; print #[1,2,3];"),
        ("boolean literals", "let x = false; x = true;"),
        ("all numeric literal forms", "print 8 * 89.123 * 1.3E5 * 1.3E+5 * 1.3E-5;"),
        ("empty array literal", "print [];"),
        ("nonempty array literal", "print [1, 2, 3];"),
        ("parentheses", "print 83 * ((((((((-(13 / 21))))))))) + 1 - 0;"),
        ("indexing array literals", "print [1,2,3][1];"),
        ("non-Latin letters in identifiers", "let コンパイラ = 100;"),
        ("nil literal", "let x: number? = nil;"),
        ("end of program inside comment", "print 0; // yay"),
        ("comments with no text", "print 1;//\nprint 0;//"),
    ];

    // Programs with syntax errors that the parser will detect
    const SYNTAX_ERRORS: &[(&str, &str)] = &[
        ("malformed number", "let x = 2.;"),
        ("a float with an E but no exponent", "let x = 5E * 11;"),
        ("a missing right operand", "print 5 -;"),
        ("a non-operator", "print 7 * ((2 _ 3));"),
        ("an expression starting with a )", "x = );"),
        ("a statement starting with expression", "x * 5;"),
        ("an illegal statement on line 2", "print 5;\nx * 5;"),
        ("a statement starting with a )", "print 5;\n)"),
        ("an expression starting with a *", "let x = * 71;"),
        ("negation before exponentiation", "print -2**2;"),
        ("associating relational operators", "print 1 < 2 < 3;"),
        ("while without braces", "while true\nprint 1;"),
        ("if without braces", "if x < 3\nprint 1;"),
        ("while as identifier", "let while = 3;"),
        ("if as identifier", "let if = 8;"),
        ("unbalanced brackets", "fnc f() = [;"),
        ("bad array literal", "print [1,2,];"),
        ("empty subscript", "print a[];"),
        ("true is not assignable", "true = 1;"),
        ("false is not assignable", "false = 1;"),
        ("incrementing a subscript", "++c[2];"),
        ("unknown type in annotation", "let x: int = 1;"),
        ("string lit with unbalanced quote", "print \"ok\"computer\";"),
    ];

    #[test]
    fn test_accepts_valid_programs() {
        for (scenario, source) in SYNTAX_CHECKS {
            assert!(parse(source).is_ok(), "should match {}", scenario);
        }
    }

    #[test]
    fn test_rejects_invalid_programs() {
        for (scenario, source) in SYNTAX_ERRORS {
            assert!(parse(source).is_err(), "should throw on {}", scenario);
        }
    }

    #[test]
    fn test_exponentiation_is_right_associative() {
        let program = parse("print 2 ** 3 ** 4;").unwrap();
        let Stmt::Print { argument, .. } = &program.statements[0] else {
            panic!("expected print statement");
        };
        let Expr::Binary { op: BinOp::Pow, right, .. } = argument else {
            panic!("expected outer **");
        };
        assert!(matches!(**right, Expr::Binary { op: BinOp::Pow, .. }));
    }

    #[test]
    fn test_subscript_chain_builds_nested_target() {
        let program = parse("a[0][1] = 2;").unwrap();
        let Stmt::Assignment { target, .. } = &program.statements[0] else {
            panic!("expected assignment");
        };
        let Expr::Subscript { base, .. } = target else {
            panic!("expected subscript target");
        };
        assert!(matches!(**base, Expr::Subscript { .. }));
    }

    #[test]
    fn test_else_if_chains_nest() {
        let program = parse("if true {} else if false {} else {}").unwrap();
        let Stmt::If { alternate, .. } = &program.statements[0] else {
            panic!("expected if statement");
        };
        let Some(ElseBranch::If(nested)) = alternate else {
            panic!("expected chained if");
        };
        let Stmt::If { alternate: inner, .. } = &**nested else {
            panic!("expected nested if statement");
        };
        assert!(matches!(inner, Some(ElseBranch::Block(_))));
    }

    #[test]
    fn test_annotation_postfix_order() {
        let program = parse("let x: number[]? = nil;").unwrap();
        let Stmt::VarDec { annotation: Some(ann), .. } = &program.statements[0] else {
            panic!("expected annotated declaration");
        };
        let TypeAnn::Optional { inner, .. } = ann else {
            panic!("expected optional annotation");
        };
        assert!(matches!(**inner, TypeAnn::Array { .. }));
    }
}
