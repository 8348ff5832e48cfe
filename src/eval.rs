// ABOUTME: Tree-walking evaluator executing a Program against the scope chain

use crate::ast::{BinOp, Expr, ExprKind, Lit, Program, Stmt, StmtKind, UnOp};
use crate::builtins::register_builtins;
use crate::env::Environment;
use crate::error::{HexError, Interrupt};
use crate::realm::Realm;
use crate::value::{Arity, Key, SpellFn, Value};
use indexmap::IndexMap;
use std::rc::Rc;

/// Result of evaluating one node: a value, or an interrupt on its way out
/// (a diagnostic, or a return/break/continue signal).
type Outcome = Result<Value, Interrupt>;

/// Evaluates HexScript ASTs.
pub struct Interpreter {
    pub globals: Rc<Environment>,
    pub realm: Realm,
}

impl Interpreter {
    /// An interpreter with natives registered and default collaborators
    /// (stdout, console voice, entropy-seeded rng).
    pub fn new() -> Self {
        Interpreter::with_realm(Realm::new())
    }

    /// An interpreter over a caller-supplied realm; used by tests to capture
    /// output and speech and to pin the rng seed.
    pub fn with_realm(realm: Realm) -> Self {
        let globals = Environment::new();
        register_builtins(&globals);
        Interpreter { globals, realm }
    }

    /// Execute a program top to bottom, yielding the last statement's value.
    pub fn interpret(&mut self, program: &Program) -> Result<Value, HexError> {
        let env = self.globals.clone();
        let mut result = Value::Void;
        for stmt in &program.statements {
            result = match self.exec_stmt(stmt, &env) {
                Ok(value) => value,
                Err(Interrupt::Error(err)) => return Err(err),
                Err(signal) => panic!(
                    "internal error: control-flow signal escaped the program: {:?}",
                    signal
                ),
            };
        }
        Ok(result)
    }

    fn exec_block(&mut self, statements: &[Stmt], env: &Rc<Environment>) -> Outcome {
        let mut result = Value::Void;
        for stmt in statements {
            result = self.exec_stmt(stmt, env)?;
        }
        Ok(result)
    }

    // ============ Statements ============

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Rc<Environment>) -> Outcome {
        let (line, column) = (stmt.line, stmt.column);

        match &stmt.kind {
            StmtKind::VarDecl {
                name,
                value,
                is_const,
                ..
            } => {
                let value = self.eval_expr(value, env)?;
                env.define(name.clone(), value.clone(), *is_const);
                Ok(value)
            }

            StmtKind::Assign { name, value } => {
                let value = self.eval_expr(value, env)?;
                env.assign(name, value.clone())
                    .map_err(|e| Interrupt::from(e.at(line, column)))?;
                Ok(value)
            }

            StmtKind::IndexAssign {
                collection,
                index,
                value,
            } => {
                let collection = self.eval_expr(collection, env)?;
                let index = self.eval_expr(index, env)?;
                let value = self.eval_expr(value, env)?;
                index_assign(&collection, &index, value.clone())
                    .map_err(|e| Interrupt::from(e.at(line, column)))?;
                Ok(value)
            }

            StmtKind::Delete { name } => {
                env.delete(name)
                    .map_err(|e| Interrupt::from(e.at(line, column)))?;
                Ok(Value::Void)
            }

            StmtKind::SpellDecl {
                name,
                params,
                body,
                auto_speak,
            } => {
                let func = Value::Spell(Rc::new(SpellFn {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                    closure: env.clone(),
                    auto_speak: *auto_speak,
                }));
                env.define(name.clone(), func.clone(), false);
                Ok(func)
            }

            StmtKind::Cast(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Value::Void,
                };
                Err(Interrupt::Return(value))
            }

            StmtKind::If {
                cond,
                then_branch,
                elif_branches,
                else_branch,
            } => {
                if self.eval_expr(cond, env)?.is_truthy() {
                    let child = Environment::with_parent(env.clone());
                    return self.exec_block(then_branch, &child);
                }
                for (elif_cond, elif_body) in elif_branches {
                    if self.eval_expr(elif_cond, env)?.is_truthy() {
                        let child = Environment::with_parent(env.clone());
                        return self.exec_block(elif_body, &child);
                    }
                }
                if let Some(else_body) = else_branch {
                    let child = Environment::with_parent(env.clone());
                    return self.exec_block(else_body, &child);
                }
                Ok(Value::Void)
            }

            StmtKind::While { cond, body } => {
                let mut result = Value::Void;
                // "patrol until" loops while the condition is still falsy
                while !self.eval_expr(cond, env)?.is_truthy() {
                    let child = Environment::with_parent(env.clone());
                    match self.exec_block(body, &child) {
                        Ok(value) => result = value,
                        Err(Interrupt::Break) => break,
                        Err(Interrupt::Continue) => continue,
                        Err(other) => return Err(other),
                    }
                }
                Ok(result)
            }

            StmtKind::For {
                var,
                iterable,
                body,
            } => {
                let iterable = self.eval_expr(iterable, env)?;
                let items = iteration_items(&iterable)
                    .map_err(|e| Interrupt::from(e.at(line, column)))?;

                let mut result = Value::Void;
                for item in items {
                    let child = Environment::with_parent(env.clone());
                    child.define(var.clone(), item, false);
                    match self.exec_block(body, &child) {
                        Ok(value) => result = value,
                        Err(Interrupt::Break) => break,
                        Err(Interrupt::Continue) => continue,
                        Err(other) => return Err(other),
                    }
                }
                Ok(result)
            }

            StmtKind::Break => Err(Interrupt::Break),
            StmtKind::Continue => Err(Interrupt::Continue),

            StmtKind::Expr(expr) => self.eval_expr(expr, env),
        }
    }

    // ============ Expressions ============

    fn eval_expr(&mut self, expr: &Expr, env: &Rc<Environment>) -> Outcome {
        let (line, column) = (expr.line, expr.column);

        match &expr.kind {
            ExprKind::Literal(lit) => Ok(match lit {
                Lit::Int(n) => Value::Int(*n),
                Lit::Float(n) => Value::Float(*n),
                Lit::Str(s) => Value::Str(s.clone()),
                Lit::Bool(b) => Value::Bool(*b),
                Lit::Void => Value::Void,
            }),

            ExprKind::Identifier(name) => env
                .get(name)
                .map_err(|e| Interrupt::from(e.at(line, column))),

            ExprKind::Binary { op, left, right } => match op {
                // Logical operators short-circuit and yield a charm
                BinOp::And => {
                    if !self.eval_expr(left, env)?.is_truthy() {
                        return Ok(Value::Bool(false));
                    }
                    let right = self.eval_expr(right, env)?;
                    Ok(Value::Bool(right.is_truthy()))
                }
                BinOp::Or => {
                    if self.eval_expr(left, env)?.is_truthy() {
                        return Ok(Value::Bool(true));
                    }
                    let right = self.eval_expr(right, env)?;
                    Ok(Value::Bool(right.is_truthy()))
                }
                _ => {
                    let left = self.eval_expr(left, env)?;
                    let right = self.eval_expr(right, env)?;
                    binary_op(*op, &left, &right)
                        .map_err(|e| Interrupt::from(e.at(line, column)))
                }
            },

            ExprKind::Unary { op, operand } => {
                let operand = self.eval_expr(operand, env)?;
                match op {
                    UnOp::Not => Ok(Value::Bool(!operand.is_truthy())),
                    UnOp::Neg => match operand {
                        Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
                        Value::Float(n) => Ok(Value::Float(-n)),
                        _ => Err(Interrupt::from(
                            HexError::forbidden("Negation requires a number").at(line, column),
                        )),
                    },
                }
            }

            ExprKind::TomeLit(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.eval_expr(element, env)?);
                }
                Ok(Value::tome(items))
            }

            ExprKind::GrimoireLit(pairs) => {
                let mut map = IndexMap::with_capacity(pairs.len());
                for (key_expr, value_expr) in pairs {
                    let key_value = self.eval_expr(key_expr, env)?;
                    let key = Key::from_value(&key_value)
                        .map_err(|e| Interrupt::from(e.at(key_expr.line, key_expr.column)))?;
                    let value = self.eval_expr(value_expr, env)?;
                    map.insert(key, value);
                }
                Ok(Value::grimoire(map))
            }

            ExprKind::Index { collection, index } => {
                let collection = self.eval_expr(collection, env)?;
                let index = self.eval_expr(index, env)?;
                index_value(&collection, &index)
                    .map_err(|e| Interrupt::from(e.at(line, column)))
            }

            ExprKind::Call { callee, args } => {
                let callee = self.eval_expr(callee, env)?;
                let mut arguments = Vec::with_capacity(args.len());
                for arg in args {
                    arguments.push(self.eval_expr(arg, env)?);
                }
                self.call_value(&callee, arguments, line, column)
            }

            ExprKind::Member { target, field } => {
                let target = self.eval_expr(target, env)?;
                if let Value::Grimoire(map) = &target {
                    if let Some(value) = map.borrow().get(&Key::Str(field.clone())) {
                        return Ok(value.clone());
                    }
                }
                Err(Interrupt::from(
                    HexError::forbidden(format!("No such member '{}'", field)).at(line, column),
                ))
            }
        }
    }

    /// Invoke a callable with already-evaluated arguments.
    fn call_value(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
        line: u32,
        column: u32,
    ) -> Outcome {
        match callee {
            Value::Spell(func) => {
                if func.params.len() != args.len() {
                    return Err(Interrupt::from(
                        HexError::forbidden(format!(
                            "Expected {} arguments but got {}",
                            func.params.len(),
                            args.len()
                        ))
                        .at(line, column),
                    ));
                }

                let frame = Environment::with_parent(func.closure.clone());
                for (param, arg) in func.params.iter().zip(args) {
                    frame.define(param.clone(), arg, false);
                }

                let result = match self.exec_block(&func.body, &frame) {
                    // Falling off the end of the body yields void
                    Ok(_) => Value::Void,
                    Err(Interrupt::Return(value)) => value,
                    Err(other) => return Err(other),
                };

                if func.auto_speak && !matches!(result, Value::Void) {
                    self.realm
                        .voice
                        .speak(&result.to_text())
                        .map_err(|e| Interrupt::from(e.at(line, column)))?;
                }

                Ok(result)
            }

            Value::Builtin(native) => {
                if let Arity::Exact(expected) = native.arity {
                    if args.len() != expected {
                        return Err(Interrupt::from(
                            HexError::forbidden(format!(
                                "Expected {} arguments but got {}",
                                expected,
                                args.len()
                            ))
                            .at(line, column),
                        ));
                    }
                }
                (native.func)(&mut self.realm, &args)
                    .map_err(|e| Interrupt::from(e.at(line, column)))
            }

            _ => Err(Interrupt::from(
                HexError::forbidden("Can only invoke spells and incantations").at(line, column),
            )),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

// ============ Operator semantics ============

/// A numeric operand pair after coercion: two runes stay runes, a potion on
/// either side promotes both.
enum NumPair {
    Ints(i64, i64),
    Floats(f64, f64),
}

fn num_pair(left: &Value, right: &Value) -> Option<NumPair> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(NumPair::Ints(*a, *b)),
        (Value::Int(a), Value::Float(b)) => Some(NumPair::Floats(*a as f64, *b)),
        (Value::Float(a), Value::Int(b)) => Some(NumPair::Floats(*a, *b as f64)),
        (Value::Float(a), Value::Float(b)) => Some(NumPair::Floats(*a, *b)),
        _ => None,
    }
}

fn binary_op(op: BinOp, left: &Value, right: &Value) -> Result<Value, HexError> {
    match op {
        BinOp::Add => add(left, right),
        BinOp::Sub => match num_pair(left, right) {
            Some(NumPair::Ints(a, b)) => Ok(Value::Int(a.wrapping_sub(b))),
            Some(NumPair::Floats(a, b)) => Ok(Value::Float(a - b)),
            None => Err(arithmetic_type_error()),
        },
        BinOp::Mul => multiply(left, right),
        BinOp::Div => match num_pair(left, right) {
            Some(NumPair::Ints(_, 0)) => {
                Err(HexError::forbidden("Division by void is forbidden"))
            }
            Some(NumPair::Floats(_, b)) if b == 0.0 => {
                Err(HexError::forbidden("Division by void is forbidden"))
            }
            Some(NumPair::Ints(a, b)) => Ok(Value::Float(a as f64 / b as f64)),
            Some(NumPair::Floats(a, b)) => Ok(Value::Float(a / b)),
            None => Err(arithmetic_type_error()),
        },
        BinOp::Rem => match num_pair(left, right) {
            Some(NumPair::Ints(_, 0)) => Err(HexError::forbidden("Modulo by void is forbidden")),
            Some(NumPair::Floats(_, b)) if b == 0.0 => {
                Err(HexError::forbidden("Modulo by void is forbidden"))
            }
            Some(NumPair::Ints(a, b)) => Ok(Value::Int(floored_rem(a, b))),
            Some(NumPair::Floats(a, b)) => Ok(Value::Float(a - b * (a / b).floor())),
            None => Err(arithmetic_type_error()),
        },
        BinOp::Pow => match num_pair(left, right) {
            Some(NumPair::Ints(base, exp)) => {
                if exp >= 0 {
                    Ok(Value::Int(int_pow(base, exp)))
                } else {
                    Ok(Value::Float((base as f64).powf(exp as f64)))
                }
            }
            Some(NumPair::Floats(a, b)) => Ok(Value::Float(a.powf(b))),
            None => Err(arithmetic_type_error()),
        },

        BinOp::Is => Ok(Value::Bool(left.structural_eq(right))),
        BinOp::Isnt => Ok(Value::Bool(!left.structural_eq(right))),
        BinOp::Exceeds => ordering(left, right, |o| o == std::cmp::Ordering::Greater),
        BinOp::Under => ordering(left, right, |o| o == std::cmp::Ordering::Less),
        BinOp::Atleast => ordering(left, right, |o| o != std::cmp::Ordering::Less),
        BinOp::Atmost => ordering(left, right, |o| o != std::cmp::Ordering::Greater),

        // Short-circuit forms are handled before operand evaluation
        BinOp::And | BinOp::Or => unreachable!("logical operators evaluate lazily"),
    }
}

fn arithmetic_type_error() -> HexError {
    HexError::forbidden("Arithmetic operations require numbers")
}

/// Addition: numbers, scroll concatenation (either side stringifies the
/// other), tome concatenation.
fn add(left: &Value, right: &Value) -> Result<Value, HexError> {
    if let Some(pair) = num_pair(left, right) {
        return Ok(match pair {
            NumPair::Ints(a, b) => Value::Int(a.wrapping_add(b)),
            NumPair::Floats(a, b) => Value::Float(a + b),
        });
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        (Value::Str(_), _) | (_, Value::Str(_)) => {
            Ok(Value::Str(format!("{}{}", left.to_text(), right.to_text())))
        }
        (Value::Tome(a), Value::Tome(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::tome(items))
        }
        _ => Err(HexError::forbidden("Invalid operands for addition")),
    }
}

/// Multiplication: numbers, scroll repetition, tome repetition. Negative
/// repeat counts clamp to empty.
fn multiply(left: &Value, right: &Value) -> Result<Value, HexError> {
    if let Some(pair) = num_pair(left, right) {
        return Ok(match pair {
            NumPair::Ints(a, b) => Value::Int(a.wrapping_mul(b)),
            NumPair::Floats(a, b) => Value::Float(a * b),
        });
    }
    match (left, right) {
        (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
            Ok(Value::Str(s.repeat((*n).max(0) as usize)))
        }
        (Value::Tome(items), Value::Int(n)) => {
            let items = items.borrow();
            let count = (*n).max(0) as usize;
            let mut repeated = Vec::with_capacity(items.len() * count);
            for _ in 0..count {
                repeated.extend(items.iter().cloned());
            }
            Ok(Value::tome(repeated))
        }
        _ => Err(HexError::forbidden("Invalid operands for multiplication")),
    }
}

/// Floored remainder: the result takes the divisor's sign.
fn floored_rem(a: i64, b: i64) -> i64 {
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) {
        r.wrapping_add(b)
    } else {
        r
    }
}

/// Integer power with a non-negative exponent, wrapping on overflow.
fn int_pow(base: i64, exp: i64) -> i64 {
    let mut result: i64 = 1;
    let mut base = base;
    let mut exp = exp as u64;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result.wrapping_mul(base);
        }
        base = base.wrapping_mul(base);
        exp >>= 1;
    }
    result
}

fn ordering(
    left: &Value,
    right: &Value,
    accept: fn(std::cmp::Ordering) -> bool,
) -> Result<Value, HexError> {
    let order = match num_pair(left, right) {
        Some(NumPair::Ints(a, b)) => a.cmp(&b),
        Some(NumPair::Floats(a, b)) => a
            .partial_cmp(&b)
            .ok_or_else(|| HexError::forbidden("Cannot order an unordered potion"))?,
        None => match (left, right) {
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            _ => {
                return Err(HexError::forbidden(format!(
                    "Cannot compare {} with {}",
                    left.type_name(),
                    right.type_name()
                )))
            }
        },
    };
    Ok(Value::Bool(accept(order)))
}

// ============ Indexing ============

fn index_value(collection: &Value, index: &Value) -> Result<Value, HexError> {
    match collection {
        Value::Tome(items) => {
            let idx = tome_index(index)?;
            let items = items.borrow();
            items.get(idx).cloned().ok_or_else(|| {
                HexError::forbidden(format!("Tome index {} out of range", idx))
            })
        }
        Value::Grimoire(map) => {
            let key = Key::from_value(index)?;
            map.borrow().get(&key).cloned().ok_or_else(|| {
                HexError::forbidden(format!(
                    "Key '{}' not found in grimoire",
                    index.to_text()
                ))
            })
        }
        Value::Str(s) => {
            let idx = match index {
                Value::Int(n) if *n >= 0 => *n as usize,
                Value::Int(n) => {
                    return Err(HexError::forbidden(format!(
                        "Scroll index {} out of range",
                        n
                    )))
                }
                _ => {
                    return Err(HexError::forbidden(
                        "Scroll index must be a rune (integer)",
                    ))
                }
            };
            s.chars()
                .nth(idx)
                .map(|c| Value::Str(c.to_string()))
                .ok_or_else(|| {
                    HexError::forbidden(format!("Scroll index {} out of range", idx))
                })
        }
        _ => Err(HexError::forbidden("Cannot index into this type")),
    }
}

fn index_assign(collection: &Value, index: &Value, value: Value) -> Result<(), HexError> {
    match collection {
        Value::Tome(items) => {
            let idx = tome_index(index)?;
            let mut items = items.borrow_mut();
            match items.get_mut(idx) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(HexError::forbidden(format!(
                    "Tome index {} out of range",
                    idx
                ))),
            }
        }
        Value::Grimoire(map) => {
            let key = Key::from_value(index)?;
            map.borrow_mut().insert(key, value);
            Ok(())
        }
        _ => Err(HexError::forbidden("Cannot index into this type")),
    }
}

fn tome_index(index: &Value) -> Result<usize, HexError> {
    match index {
        Value::Int(n) if *n >= 0 => Ok(*n as usize),
        Value::Int(n) => Err(HexError::forbidden(format!(
            "Tome index {} out of range",
            n
        ))),
        _ => Err(HexError::forbidden("Tome index must be a rune (integer)")),
    }
}

/// The item sequence a `hunt each` walks: tome elements, scroll characters,
/// or grimoire keys. Snapshotted so body mutation cannot upset the walk.
fn iteration_items(iterable: &Value) -> Result<Vec<Value>, HexError> {
    match iterable {
        Value::Tome(items) => Ok(items.borrow().clone()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        Value::Grimoire(map) => Ok(map.borrow().keys().map(Key::to_value).collect()),
        _ => Err(HexError::forbidden("Cannot hunt through non-iterable")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn run(source: &str) -> Result<Value, HexError> {
        let tokens = Lexer::new(source).tokenize()?;
        let program = Parser::new(tokens).parse()?;
        Interpreter::new().interpret(&program)
    }

    fn eval_ok(source: &str) -> Value {
        run(source).expect("evaluation failed")
    }

    fn eval_err(source: &str) -> HexError {
        run(source).expect_err("expected evaluation error")
    }

    #[test]
    fn test_arithmetic() {
        assert!(matches!(eval_ok("1 + 2 * 3"), Value::Int(7)));
        assert!(matches!(eval_ok("2 ** 10"), Value::Int(1024)));
        assert!(matches!(eval_ok("10 - 4 - 3"), Value::Int(3)));
        assert!(matches!(eval_ok("-2 ** 2"), Value::Int(-4)));
    }

    #[test]
    fn test_division_always_yields_potion() {
        assert!(matches!(eval_ok("7 / 2"), Value::Float(f) if f == 3.5));
        assert!(matches!(eval_ok("4 / 2"), Value::Float(f) if f == 2.0));
    }

    #[test]
    fn test_int_float_coercion() {
        assert!(matches!(eval_ok("1 + 2.5"), Value::Float(f) if f == 3.5));
        assert!(matches!(eval_ok("2.0 * 3"), Value::Float(f) if f == 6.0));
    }

    #[test]
    fn test_division_by_zero() {
        let err = eval_err("1 / 0");
        assert_eq!(err.kind, ErrorKind::ForbiddenMagic);
        assert!(err.to_string().contains("Division by void"));

        assert!(matches!(
            eval_err("1 % 0").kind,
            ErrorKind::ForbiddenMagic
        ));
        assert!(matches!(
            eval_err("1.5 / 0.0").kind,
            ErrorKind::ForbiddenMagic
        ));
    }

    #[test]
    fn test_floored_modulo() {
        assert!(matches!(eval_ok("-7 % 3"), Value::Int(2)));
        assert!(matches!(eval_ok("7 % -3"), Value::Int(-2)));
        assert!(matches!(eval_ok("7 % 3"), Value::Int(1)));
    }

    #[test]
    fn test_negative_exponent_promotes() {
        assert!(matches!(eval_ok("2 ** -1"), Value::Float(f) if f == 0.5));
    }

    #[test]
    fn test_string_concatenation() {
        assert!(matches!(
            eval_ok("\"fire\" + \"ball\""),
            Value::Str(s) if s == "fireball"
        ));
        assert!(matches!(
            eval_ok("\"level \" + 9"),
            Value::Str(s) if s == "level 9"
        ));
        assert!(matches!(
            eval_ok("9 + \" lives\""),
            Value::Str(s) if s == "9 lives"
        ));
    }

    #[test]
    fn test_string_repetition_clamps_negative() {
        assert!(matches!(eval_ok("\"ab\" * 3"), Value::Str(s) if s == "ababab"));
        assert!(matches!(eval_ok("2 * \"ha\""), Value::Str(s) if s == "haha"));
        assert!(matches!(eval_ok("\"ab\" * -1"), Value::Str(s) if s.is_empty()));
    }

    #[test]
    fn test_tome_concat_and_repeat() {
        assert!(eval_ok("[1, 2] + [3]").structural_eq(&Value::tome(vec![
            Value::Int(1),
            Value::Int(2),
            Value::Int(3),
        ])));
        assert!(eval_ok("[1] * 3").structural_eq(&Value::tome(vec![
            Value::Int(1),
            Value::Int(1),
            Value::Int(1),
        ])));
        assert!(eval_ok("[1] * -2").structural_eq(&Value::tome(vec![])));
    }

    #[test]
    fn test_addition_type_error() {
        let err = eval_err("[1] + 2");
        assert_eq!(err.kind, ErrorKind::ForbiddenMagic);
    }

    #[test]
    fn test_comparisons() {
        assert!(matches!(eval_ok("3 exceeds 2"), Value::Bool(true)));
        assert!(matches!(eval_ok("2 under 2"), Value::Bool(false)));
        assert!(matches!(eval_ok("2 atleast 2"), Value::Bool(true)));
        assert!(matches!(eval_ok("2 atmost 1"), Value::Bool(false)));
        assert!(matches!(eval_ok("\"abc\" under \"abd\""), Value::Bool(true)));
        assert!(matches!(eval_ok("1 is 1.0"), Value::Bool(true)));
        assert!(matches!(eval_ok("1 isnt 2"), Value::Bool(true)));
    }

    #[test]
    fn test_structural_equality_on_tomes() {
        assert!(matches!(eval_ok("[1, 2] is [1, 2]"), Value::Bool(true)));
        assert!(matches!(eval_ok("[1] is [2]"), Value::Bool(false)));
    }

    #[test]
    fn test_comparison_type_error() {
        let err = eval_err("[1] exceeds 2");
        assert_eq!(err.kind, ErrorKind::ForbiddenMagic);
    }

    #[test]
    fn test_logic_returns_charm_and_short_circuits() {
        assert!(matches!(eval_ok("1 and 2"), Value::Bool(true)));
        assert!(matches!(eval_ok("0 or \"\""), Value::Bool(false)));
        assert!(matches!(eval_ok("not 0"), Value::Bool(true)));

        // The right side must never run when the left decides
        assert!(matches!(eval_ok("false and missing_name"), Value::Bool(false)));
        assert!(matches!(eval_ok("true or missing_name"), Value::Bool(true)));
    }

    #[test]
    fn test_declaration_and_lookup() {
        assert!(matches!(eval_ok("conjure x as 5\nx"), Value::Int(5)));
        assert!(matches!(eval_ok("summon y as 2\ny + 1"), Value::Int(3)));
    }

    #[test]
    fn test_undefined_variable() {
        let err = eval_err("ghost");
        assert_eq!(err.kind, ErrorKind::UnknownIncantation);
        assert!(err.to_string().contains("'ghost'"));
    }

    #[test]
    fn test_assignment_walks_scope_chain() {
        let v = eval_ok(
            "conjure x as 1\nprophecy reveals true {\n  transmute x as 2\n}\nx",
        );
        assert!(matches!(v, Value::Int(2)));
    }

    #[test]
    fn test_block_scope_hygiene() {
        let v = eval_ok(
            "conjure x as 1\nprophecy reveals x is 1 { conjure x as 99 }\nx",
        );
        assert!(matches!(v, Value::Int(1)));
    }

    #[test]
    fn test_constant_protection() {
        let err = eval_err("const prophecy PI as 3\ntransmute PI as 4");
        assert_eq!(err.kind, ErrorKind::ProphecyViolation);

        let err = eval_err("const prophecy PI as 3\nvanquish PI");
        assert_eq!(err.kind, ErrorKind::ProphecyViolation);
    }

    #[test]
    fn test_vanquish_unbinds() {
        let err = eval_err("conjure x as 1\nvanquish x\nx");
        assert_eq!(err.kind, ErrorKind::UnknownIncantation);
    }

    #[test]
    fn test_if_branches() {
        assert!(matches!(
            eval_ok("prophecy reveals 1 exceeds 2 { 1 } otherwise prophecy 2 exceeds 1 { 2 } fate decrees { 3 }"),
            Value::Int(2)
        ));
        assert!(matches!(
            eval_ok("prophecy reveals false { 1 } fate decrees { 3 }"),
            Value::Int(3)
        ));
    }

    #[test]
    fn test_patrol_until_runs_while_falsy() {
        let v = eval_ok(
            "conjure n as 0\npatrol until n atleast 3 { transmute n as n + 1 }\nn",
        );
        assert!(matches!(v, Value::Int(3)));
    }

    #[test]
    fn test_patrol_until_true_never_runs() {
        let v = eval_ok("conjure n as 0\npatrol until true { transmute n as 9 }\nn");
        assert!(matches!(v, Value::Int(0)));
    }

    #[test]
    fn test_break_and_continue() {
        let v = eval_ok(
            "conjure n as 0\nconjure total as 0\npatrol until n atleast 10 {\n  transmute n as n + 1\n  prophecy reveals n is 3 { continue }\n  prophecy reveals n is 6 { break }\n  transmute total as total + n\n}\ntotal",
        );
        // 1 + 2 + 4 + 5
        assert!(matches!(v, Value::Int(12)));
    }

    #[test]
    fn test_hunt_each_over_tome() {
        let v = eval_ok(
            "conjure total as 0\nhunt each n in [1, 2, 3] { transmute total as total + n }\ntotal",
        );
        assert!(matches!(v, Value::Int(6)));
    }

    #[test]
    fn test_hunt_each_over_scroll() {
        let v = eval_ok(
            "conjure out as \"\"\nhunt each c in \"abc\" { transmute out as c + out }\nout",
        );
        assert!(matches!(v, Value::Str(s) if s == "cba"));
    }

    #[test]
    fn test_hunt_each_over_grimoire_keys_in_order() {
        let v = eval_ok(
            "conjure out as \"\"\nhunt each k in {\"a\": 1, \"b\": 2} { transmute out as out + k }\nout",
        );
        assert!(matches!(v, Value::Str(s) if s == "ab"));
    }

    #[test]
    fn test_hunt_each_non_iterable() {
        let err = eval_err("hunt each x in 5 { }");
        assert_eq!(err.kind, ErrorKind::ForbiddenMagic);
    }

    #[test]
    fn test_loop_variable_fresh_per_iteration() {
        // The loop variable is a fresh binding each pass, so conjuring over
        // it inside the body never leaks across iterations
        let v = eval_ok(
            "conjure out as 0\nhunt each n in [1, 2] {\n  conjure doubled as n * 2\n  transmute out as out + doubled\n}\nout",
        );
        assert!(matches!(v, Value::Int(6)));
    }

    #[test]
    fn test_spell_call_and_cast() {
        let v = eval_ok("spell double(n) { cast n * 2 }\ndouble(21)");
        assert!(matches!(v, Value::Int(42)));
    }

    #[test]
    fn test_spell_without_cast_yields_void() {
        let v = eval_ok("spell noop() { conjure x as 1 }\nnoop()");
        assert!(matches!(v, Value::Void));
    }

    #[test]
    fn test_cast_without_value_yields_void() {
        let v = eval_ok("spell f() { cast }\nf()");
        assert!(matches!(v, Value::Void));
    }

    #[test]
    fn test_arity_mismatch() {
        let err = eval_err("spell f(a, b) { cast a }\nf(1)");
        assert_eq!(err.kind, ErrorKind::ForbiddenMagic);
        assert!(err.to_string().contains("Expected 2 arguments but got 1"));
    }

    #[test]
    fn test_calling_non_callable() {
        let err = eval_err("conjure x as 5\nx()");
        assert_eq!(err.kind, ErrorKind::ForbiddenMagic);
    }

    #[test]
    fn test_closure_captures_declaration_environment() {
        let v = eval_ok(
            "spell make() { conjure c as 0\n  spell bump() { transmute c as c + 1\n    cast c }\n  cast bump }\nconjure b as make()\nb()\nb()",
        );
        assert!(matches!(v, Value::Int(2)));
    }

    #[test]
    fn test_recursion() {
        let v = eval_ok(
            "spell fact(n) {\n  prophecy reveals n atmost 1 { cast 1 }\n  cast n * fact(n - 1)\n}\nfact(5)",
        );
        assert!(matches!(v, Value::Int(120)));
    }

    #[test]
    fn test_indexing() {
        assert!(matches!(eval_ok("[10, 20, 30][1]"), Value::Int(20)));
        assert!(matches!(
            eval_ok("{\"hp\": 50}[\"hp\"]"),
            Value::Int(50)
        ));
        assert!(matches!(eval_ok("\"abc\"[2]"), Value::Str(s) if s == "c"));
    }

    #[test]
    fn test_index_errors() {
        assert_eq!(eval_err("[1][5]").kind, ErrorKind::ForbiddenMagic);
        assert_eq!(eval_err("[1][-1]").kind, ErrorKind::ForbiddenMagic);
        assert_eq!(eval_err("[1][\"x\"]").kind, ErrorKind::ForbiddenMagic);
        assert_eq!(eval_err("{\"a\": 1}[\"b\"]").kind, ErrorKind::ForbiddenMagic);
        assert_eq!(eval_err("\"ab\"[9]").kind, ErrorKind::ForbiddenMagic);
        assert_eq!(eval_err("5[0]").kind, ErrorKind::ForbiddenMagic);
    }

    #[test]
    fn test_member_access_on_grimoire() {
        let v = eval_ok("conjure hero as {\"name\": \"Kendra\"}\nhero.name");
        assert!(matches!(v, Value::Str(s) if s == "Kendra"));

        let err = eval_err("conjure hero as {\"name\": \"Kendra\"}\nhero.level");
        assert!(err.to_string().contains("No such member 'level'"));
    }

    #[test]
    fn test_alias_mutation_via_index_assign() {
        let v = eval_ok(
            "conjure a as tome [1, 2, 3]\nconjure b as a\ntransmute b[0] as 99\na[0]",
        );
        assert!(matches!(v, Value::Int(99)));
    }

    #[test]
    fn test_grimoire_index_assign_inserts() {
        let v = eval_ok(
            "conjure g as {\"a\": 1}\ntransmute g[\"b\"] as 2\ng[\"b\"]",
        );
        assert!(matches!(v, Value::Int(2)));
    }

    #[test]
    fn test_index_assign_out_of_range() {
        let err = eval_err("conjure t as [1]\ntransmute t[4] as 9");
        assert_eq!(err.kind, ErrorKind::ForbiddenMagic);
    }

    #[test]
    fn test_grimoire_float_key_rejected() {
        let err = eval_err("{1.5: \"x\"}");
        assert_eq!(err.kind, ErrorKind::ForbiddenMagic);
    }

    #[test]
    fn test_runtime_error_carries_position() {
        let err = eval_err("conjure x as 1\nghost");
        assert_eq!(err.pos.0, Some((2, 1)));
    }

    #[test]
    fn test_interpret_returns_last_value() {
        assert!(matches!(eval_ok("1\n2\n3"), Value::Int(3)));
    }

    #[test]
    fn test_type_hint_is_advisory() {
        // A wrong hint still evaluates; hints are recorded, not enforced
        assert!(matches!(eval_ok("conjure x as rune 5\nx"), Value::Int(5)));
    }
}
