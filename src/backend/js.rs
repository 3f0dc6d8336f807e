//! JavaScript code generator
//!
//! Translates the typed core program to JavaScript source lines. The
//! translation is purely syntax-directed; every scoping and typing rule
//! was already enforced by the analyzer, so nothing is checked here.

use crate::frontend::ast::{BinOp, UnOp};
use crate::middle::core::{Expr, IfAlternate, Program, Stmt};

/// JavaScript code generator
pub struct JsTranslator {
    target: Vec<String>,
    indent: usize,
}

impl JsTranslator {
    pub fn new() -> Self {
        Self {
            target: Vec::new(),
            indent: 0,
        }
    }

    /// Translate a program into JavaScript source lines
    pub fn translate(mut self, program: &Program) -> Vec<String> {
        for statement in &program.statements {
            self.emit_stmt(statement);
        }
        self.target
    }

    /// Append an indented line to the target
    fn emit(&mut self, line: String) {
        self.target.push(format!("{}{}", "  ".repeat(self.indent), line));
    }

    /// Emit a block body one level deeper
    fn emit_body(&mut self, statements: &[Stmt]) {
        self.indent += 1;
        for statement in statements {
            self.emit_stmt(statement);
        }
        self.indent -= 1;
    }

    fn emit_stmt(&mut self, statement: &Stmt) {
        match statement {
            Stmt::VariableDeclaration {
                variable,
                initializer,
            } => {
                let qualifier = if variable.mutable { "let" } else { "const" };
                let line = format!("{} {} = {};", qualifier, variable.name, self.expr(initializer));
                self.emit(line);
            }

            Stmt::FunctionDeclaration { function, body } => {
                let params: Vec<&str> = function
                    .parameters
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect();
                self.emit(format!("function {}({}) {{", function.name, params.join(", ")));
                let line = format!("return {};", self.expr(body));
                self.indent += 1;
                self.emit(line);
                self.indent -= 1;
                self.emit("}".to_string());
            }

            Stmt::Increment { variable } => {
                self.emit(format!("{}++;", variable.name));
            }

            Stmt::Break => {
                self.emit("break;".to_string());
            }

            Stmt::Print { argument } => {
                self.emit(format!("console.log({});", self.expr(argument)));
            }

            Stmt::Assignment { target, source } => {
                self.emit(format!("{} = {};", self.expr(target), self.expr(source)));
            }

            Stmt::ShortIf { test, consequent } => {
                self.emit(format!("if ({}) {{", self.expr(test)));
                self.emit_body(consequent);
                self.emit("}".to_string());
            }

            Stmt::If {
                test,
                consequent,
                alternate,
            } => {
                self.emit(format!("if ({}) {{", self.expr(test)));
                self.emit_body(consequent);
                self.emit_alternate(alternate);
            }

            Stmt::While { test, body } => {
                self.emit(format!("while ({}) {{", self.expr(test)));
                self.emit_body(body);
                self.emit("}".to_string());
            }
        }
    }

    fn emit_alternate(&mut self, alternate: &IfAlternate) {
        match alternate {
            IfAlternate::Block(statements) => {
                self.emit("} else {".to_string());
                self.emit_body(statements);
                self.emit("}".to_string());
            }
            IfAlternate::ElseIf(nested) => match &**nested {
                Stmt::If {
                    test,
                    consequent,
                    alternate,
                } => {
                    self.emit(format!("}} else if ({}) {{", self.expr(test)));
                    self.emit_body(consequent);
                    self.emit_alternate(alternate);
                }
                Stmt::ShortIf { test, consequent } => {
                    self.emit(format!("}} else if ({}) {{", self.expr(test)));
                    self.emit_body(consequent);
                    self.emit("}".to_string());
                }
                _ => unreachable!("else-if always chains to an if statement"),
            },
        }
    }

    /// Render an expression; compound expressions come back parenthesized
    fn expr(&self, expression: &Expr) -> String {
        match expression {
            Expr::Number(value) => format!("{}", value),
            Expr::Boolean(value) => format!("{}", value),
            Expr::Str(value) => format!("{:?}", value),
            Expr::Nil => "null".to_string(),
            Expr::Variable(variable) => variable.name.clone(),
            Expr::Function(function) => function.name.clone(),
            Expr::Array { elements, .. } => {
                let rendered: Vec<String> = elements.iter().map(|e| self.expr(e)).collect();
                format!("[{}]", rendered.join(", "))
            }
            Expr::Subscript { array, index, .. } => {
                format!("{}[{}]", self.expr(array), self.expr(index))
            }
            Expr::Call {
                callee, arguments, ..
            } => {
                let rendered: Vec<String> = arguments.iter().map(|a| self.expr(a)).collect();
                format!("{}({})", callee.name, rendered.join(", "))
            }
            Expr::Binary { op, left, right, .. } => {
                format!("({} {} {})", self.expr(left), js_binop(*op), self.expr(right))
            }
            Expr::Unary { op, operand, .. } => match op {
                UnOp::Neg => format!("(-{})", self.expr(operand)),
                UnOp::Not => format!("(!{})", self.expr(operand)),
                UnOp::Len => format!("{}.length", self.expr(operand)),
            },
        }
    }
}

impl Default for JsTranslator {
    fn default() -> Self {
        Self::new()
    }
}

/// Map an operator to its JavaScript spelling; equality is strict
fn js_binop(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::Pow => "**",
        BinOp::Eq => "===",
        BinOp::Ne => "!==",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::analyzer::Analyzer;
    use crate::frontend::lexer::Lexer;
    use crate::frontend::parser::Parser;
    use pretty_assertions::assert_eq;

    fn translate(source: &str) -> Vec<String> {
        let program = Parser::new(Lexer::new(source))
            .parse_program()
            .expect("syntax should be valid");
        let program = Analyzer::new()
            .analyze(&program)
            .expect("program should be well-typed");
        JsTranslator::new().translate(&program)
    }

    #[test]
    fn test_declarations_keep_their_qualifier() {
        assert_eq!(
            translate("let x = 1; const y = \"false\";"),
            vec!["let x = 1;", "const y = \"false\";"]
        );
    }

    #[test]
    fn test_while_with_increment_and_print() {
        assert_eq!(
            translate("let x = 0; while x < 3 { ++x; print x; }"),
            vec![
                "let x = 0;",
                "while ((x < 3)) {",
                "  x++;",
                "  console.log(x);",
                "}",
            ]
        );
    }

    #[test]
    fn test_function_declaration_and_call() {
        assert_eq!(
            translate("fnc double(x: number) = x * 2; print double(5);"),
            vec![
                "function double(x) {",
                "  return (x * 2);",
                "}",
                "console.log(double(5));",
            ]
        );
    }

    #[test]
    fn test_equality_becomes_strict() {
        assert_eq!(
            translate("print 1 == 2; print 1 != 2;"),
            vec!["console.log((1 === 2));", "console.log((1 !== 2));"]
        );
    }

    #[test]
    fn test_else_if_chain_stays_flat() {
        assert_eq!(
            translate("let x = 1; if x == 1 {print 1;} else if x == 2 {print 2;} else {print 3;}"),
            vec![
                "let x = 1;",
                "if ((x === 1)) {",
                "  console.log(1);",
                "} else if ((x === 2)) {",
                "  console.log(2);",
                "} else {",
                "  console.log(3);",
                "}",
            ]
        );
    }

    #[test]
    fn test_arrays_subscripts_and_length() {
        assert_eq!(
            translate("let a = [1,2,3]; a[0] = 10; print #a;"),
            vec!["let a = [1, 2, 3];", "a[0] = 10;", "console.log(a.length);"]
        );
    }

    #[test]
    fn test_nil_becomes_null() {
        assert_eq!(
            translate("const s: string? = nil; print s;"),
            vec!["const s = null;", "console.log(s);"]
        );
    }

    #[test]
    fn test_break_inside_loop() {
        assert_eq!(
            translate("while true { break; }"),
            vec!["while (true) {", "  break;", "}"]
        );
    }
}
