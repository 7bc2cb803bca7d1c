/*!

  Closed-form boolean expressions used to state puzzle targets,
  like `(door1 OR door2) AND armed`.

  Operators bind tightest first: `NOT` (`!`, `~`), `AND` (`&`, `&&`),
  `XOR` (`^`), then `OR` (`|`, `||`). Keywords are case-insensitive and
  `0`, `1`, `true` and `false` are constants.

*/

use crate::circuit::Identifier;
use crate::error::{CircuitError, Result};
use std::collections::BTreeSet;

/// A boolean expression over named inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A constant
    Const(bool),
    /// A named input
    Var(Identifier),
    /// Negation
    Not(Box<Expr>),
    /// Conjunction
    And(Box<Expr>, Box<Expr>),
    /// Disjunction
    Or(Box<Expr>, Box<Expr>),
    /// Exclusive or
    Xor(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Shorthand for a variable
    pub fn var(name: &str) -> Self {
        Expr::Var(name.into())
    }

    /// Evaluates the expression, looking up each variable with `env`.
    /// A variable `env` doesn't know fails with [CircuitError::UnknownVariable].
    pub fn eval<F>(&self, env: &F) -> Result<bool>
    where
        F: Fn(&Identifier) -> Option<bool>,
    {
        Ok(match self {
            Expr::Const(b) => *b,
            Expr::Var(name) => env(name).ok_or_else(|| CircuitError::UnknownVariable(name.clone()))?,
            Expr::Not(e) => !e.eval(env)?,
            Expr::And(l, r) => l.eval(env)? && r.eval(env)?,
            Expr::Or(l, r) => l.eval(env)? || r.eval(env)?,
            Expr::Xor(l, r) => l.eval(env)? ^ r.eval(env)?,
        })
    }

    /// Returns the names of the variables in the expression
    pub fn variables(&self) -> BTreeSet<&Identifier> {
        let mut vars = BTreeSet::new();
        let mut stack = vec![self];
        while let Some(e) = stack.pop() {
            match e {
                Expr::Const(_) => (),
                Expr::Var(name) => {
                    vars.insert(name);
                }
                Expr::Not(e) => stack.push(e),
                Expr::And(l, r) | Expr::Or(l, r) | Expr::Xor(l, r) => {
                    stack.push(l);
                    stack.push(r);
                }
            }
        }
        vars
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Or(..) => 1,
            Expr::Xor(..) => 2,
            Expr::And(..) => 3,
            Expr::Not(_) => 4,
            Expr::Const(_) | Expr::Var(_) => 5,
        }
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let child = |f: &mut std::fmt::Formatter<'_>, e: &Expr, min: u8| {
            if e.precedence() < min {
                write!(f, "({e})")
            } else {
                write!(f, "{e}")
            }
        };
        match self {
            Expr::Const(b) => write!(f, "{}", u8::from(*b)),
            Expr::Var(name) => write!(f, "{name}"),
            Expr::Not(e) => {
                write!(f, "NOT ")?;
                child(f, e, 4)
            }
            Expr::And(l, r) | Expr::Or(l, r) | Expr::Xor(l, r) => {
                let op = match self {
                    Expr::And(..) => "AND",
                    Expr::Or(..) => "OR",
                    _ => "XOR",
                };
                let p = self.precedence();
                child(f, l, p)?;
                write!(f, " {op} ")?;
                // Operators are left-associative, so an equal-precedence right side needs parens
                child(f, r, p + 1)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Const(bool),
    Not,
    And,
    Or,
    Xor,
    LParen,
    RParen,
}

fn tokenize(src: &str) -> Result<Vec<(usize, Token)>> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();
    while let Some(&(pos, c)) = chars.peek() {
        let token = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '(' => Token::LParen,
            ')' => Token::RParen,
            '!' | '~' => Token::Not,
            '^' => Token::Xor,
            '&' | '|' => {
                chars.next();
                if chars.peek().is_some_and(|&(_, n)| n == c) {
                    chars.next();
                }
                tokens.push((pos, if c == '&' { Token::And } else { Token::Or }));
                continue;
            }
            c if c.is_ascii_alphanumeric() || c == '_' => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let token = match word.to_ascii_lowercase().as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "xor" => Token::Xor,
                    "not" => Token::Not,
                    "true" | "1" => Token::Const(true),
                    "false" | "0" => Token::Const(false),
                    _ if word.starts_with(|c: char| c.is_ascii_digit()) => {
                        return Err(CircuitError::Parse {
                            position: pos,
                            message: format!("'{word}' is not a name or a constant"),
                        });
                    }
                    _ => Token::Ident(word),
                };
                tokens.push((pos, token));
                continue;
            }
            other => {
                return Err(CircuitError::Parse {
                    position: pos,
                    message: format!("unexpected character '{other}'"),
                });
            }
        };
        chars.next();
        tokens.push((pos, token));
    }
    Ok(tokens)
}

/// How deep an expression may nest, counting parentheses, negations and
/// chained operators. Evaluation and printing recurse this far.
pub const MAX_DEPTH: usize = 256;

/// Recursive descent over the token stream, one method per precedence level.
/// Each method returns the expression with its tree depth.
struct Parser {
    tokens: Vec<(usize, Token)>,
    next: usize,
    end: usize,
    nesting: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.next).map(|(_, t)| t)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.next).map_or(self.end, |(p, _)| *p)
    }

    fn error(&self, message: &str) -> CircuitError {
        CircuitError::Parse {
            position: self.position(),
            message: message.to_string(),
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.next += 1;
            true
        } else {
            false
        }
    }

    fn too_deep(&self) -> CircuitError {
        self.error("expression nested too deeply")
    }

    fn binary(
        &mut self,
        op: &Token,
        operand: fn(&mut Self) -> Result<(Expr, usize)>,
        build: fn(Box<Expr>, Box<Expr>) -> Expr,
    ) -> Result<(Expr, usize)> {
        let (mut lhs, mut depth) = operand(self)?;
        while self.eat(op) {
            let (rhs, rhs_depth) = operand(self)?;
            depth = depth.max(rhs_depth) + 1;
            if depth > MAX_DEPTH {
                return Err(self.too_deep());
            }
            lhs = build(Box::new(lhs), Box::new(rhs));
        }
        Ok((lhs, depth))
    }

    fn or(&mut self) -> Result<(Expr, usize)> {
        self.binary(&Token::Or, Self::xor, Expr::Or)
    }

    fn xor(&mut self) -> Result<(Expr, usize)> {
        self.binary(&Token::Xor, Self::and, Expr::Xor)
    }

    fn and(&mut self) -> Result<(Expr, usize)> {
        self.binary(&Token::And, Self::unary, Expr::And)
    }

    // Every parenthesis and negation passes through here, so this bounds the parser's own recursion
    fn unary(&mut self) -> Result<(Expr, usize)> {
        if self.nesting >= MAX_DEPTH {
            return Err(self.too_deep());
        }
        self.nesting += 1;
        let res = if self.eat(&Token::Not) {
            self.unary().and_then(|(e, depth)| {
                if depth >= MAX_DEPTH {
                    Err(self.too_deep())
                } else {
                    Ok((Expr::Not(Box::new(e)), depth + 1))
                }
            })
        } else {
            self.atom()
        };
        self.nesting -= 1;
        res
    }

    fn atom(&mut self) -> Result<(Expr, usize)> {
        let expr = match self.peek() {
            Some(Token::Ident(name)) => Expr::Var(name.as_str().into()),
            Some(Token::Const(b)) => Expr::Const(*b),
            Some(Token::LParen) => {
                self.next += 1;
                let inner = self.or()?;
                if !self.eat(&Token::RParen) {
                    return Err(self.error("expected ')'"));
                }
                return Ok(inner);
            }
            Some(_) => return Err(self.error("expected a name, a constant or '('")),
            None => return Err(self.error("unexpected end of expression")),
        };
        self.next += 1;
        Ok((expr, 0))
    }
}

impl std::str::FromStr for Expr {
    type Err = CircuitError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parser = Parser {
            tokens: tokenize(s)?,
            next: 0,
            end: s.len(),
            nesting: 0,
        };
        let (expr, _) = parser.or()?;
        if parser.peek().is_some() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &Expr, vars: &[(&str, bool)]) -> bool {
        expr.eval(&|name: &Identifier| {
            vars.iter()
                .find(|(n, _)| *n == name.get_name())
                .map(|(_, v)| *v)
        })
        .unwrap()
    }

    #[test]
    fn precedence() {
        let e: Expr = "a OR b AND c".parse().unwrap();
        assert_eq!(
            e,
            Expr::Or(
                Box::new(Expr::var("a")),
                Box::new(Expr::And(Box::new(Expr::var("b")), Box::new(Expr::var("c"))))
            )
        );
        let e: Expr = "!a & b".parse().unwrap();
        assert_eq!(
            e,
            Expr::And(Box::new(Expr::Not(Box::new(Expr::var("a")))), Box::new(Expr::var("b")))
        );
    }

    #[test]
    fn security_alarm_expression() {
        let e: Expr = "(door1 or door2) AND armed".parse().unwrap();
        assert!(eval(&e, &[("door1", true), ("door2", false), ("armed", true)]));
        assert!(!eval(&e, &[("door1", false), ("door2", false), ("armed", true)]));
        assert!(!eval(&e, &[("door1", true), ("door2", true), ("armed", false)]));
    }

    #[test]
    fn symbols_and_constants() {
        let e: Expr = "a ^ 1 || false".parse().unwrap();
        assert!(eval(&e, &[("a", false)]));
        assert!(!eval(&e, &[("a", true)]));
    }

    #[test]
    fn display_reparses() {
        for src in ["(a OR b) AND NOT c", "a XOR (b XOR c)", "NOT (a AND b)", "a OR b OR c"] {
            let e: Expr = src.parse().unwrap();
            assert_eq!(e.to_string().parse::<Expr>().unwrap(), e);
        }
        assert_eq!("(a OR b) AND c".parse::<Expr>().unwrap().to_string(), "(a OR b) AND c");
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            "a AND".parse::<Expr>(),
            Err(CircuitError::Parse {
                position: 5,
                message: "unexpected end of expression".to_string()
            })
        );
        assert!(matches!(
            "(a OR b".parse::<Expr>(),
            Err(CircuitError::Parse { position: 7, .. })
        ));
        assert!(matches!(
            "a $ b".parse::<Expr>(),
            Err(CircuitError::Parse { position: 2, .. })
        ));
        assert!("a b".parse::<Expr>().is_err());
        assert!("2x".parse::<Expr>().is_err());
    }

    #[test]
    fn deep_nesting_is_an_error() {
        let too_deep = |src: &str| {
            matches!(
                src.parse::<Expr>(),
                Err(CircuitError::Parse { ref message, .. }) if message == "expression nested too deeply"
            )
        };
        let parens = format!("{}a{}", "(".repeat(200_000), ")".repeat(200_000));
        assert!(too_deep(&parens));
        assert!(too_deep(&"NOT ".repeat(200_000)));
        let chain = vec!["a"; 200_000].join(" OR ");
        assert!(too_deep(&chain));

        // Right at the bound still parses
        let ok = format!("{}a{}", "(".repeat(MAX_DEPTH - 1), ")".repeat(MAX_DEPTH - 1));
        assert_eq!(ok.parse::<Expr>(), Ok(Expr::var("a")));
        let ok = vec!["a"; MAX_DEPTH + 1].join(" AND ");
        assert!(ok.parse::<Expr>().is_ok());
    }

    #[test]
    fn unknown_variable() {
        let e: Expr = "a AND z".parse().unwrap();
        let res = e.eval(&|name: &Identifier| (name.get_name() == "a").then_some(true));
        assert_eq!(res, Err(CircuitError::UnknownVariable("z".into())));
    }

    #[test]
    fn variables() {
        let e: Expr = "(a OR b) AND (a XOR c)".parse().unwrap();
        let names: Vec<_> = e.variables().into_iter().map(|v| v.get_name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
