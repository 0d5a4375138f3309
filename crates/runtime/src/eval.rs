//! The recursive expression evaluator (§4.1).
//!
//! `Vm::eval` computes the value of a single AST node against
//! `current_scope`. It is used from inside a single `step` to evaluate
//! right-hand sides and conditions, and — via [`Vm::call_user_function_eager`]
//! — as the fallback dispatch for user-defined calls that appear nested
//! inside a larger expression rather than in statement position. The frame
//! stepper in `vm.rs` is the only thing that pushes a [`crate::frame::Frame::Function`]
//! onto the execution stack; everything here runs to completion within one step.

use crate::error::{Result, RuntimeError};
use crate::value::{FunctionValue, ObjectValue, RangeValue, TypeDescriptor, Value};
use crate::vm::{ControlFlow, Vm};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;
use wisp_parser::{AssignTarget, AstFor, AstIf, AstIndex, BinaryOp, Node, UnaryOp};

fn as_f64(v: &Value) -> f64 {
    match v {
        Value::Int(n) => *n as f64,
        Value::Float(n) => *n,
        _ => unreachable!("caller already checked numeric type"),
    }
}

fn as_int(v: &Value, line: u32, column: u32) -> Result<i64> {
    match v {
        Value::Int(n) => Ok(*n),
        other => Err(RuntimeError::new(format!("Expected an integer, got {}", other.type_name()), line, column).into()),
    }
}

/// Native functions can't know where they were called from, so any runtime
/// error they raise is re-stamped with the call site's position.
fn attribute_native_error(e: crate::error::Error, line: u32, column: u32) -> crate::error::Error {
    match e {
        crate::error::Error::Runtime(re) => crate::error::Error::Runtime(RuntimeError { line, column, ..re }),
        other => other,
    }
}

impl Vm {
    /// Evaluates the node at `index` against `current_scope`.
    pub(crate) fn eval(&mut self, index: AstIndex) -> Result<Value> {
        let node = self.ast().node(index).clone();
        let line = node.span.start.line;
        let column = node.span.start.column;
        self.eval_node(node.node, line, column)
    }

    fn eval_node(&mut self, node: Node, line: u32, column: u32) -> Result<Value> {
        match node {
            Node::Nil => Ok(Value::Nil),
            Node::Bool(b) => Ok(Value::Bool(b)),
            Node::Int(n) => Ok(Value::Int(n)),
            Node::Float(n) => Ok(Value::Float(n)),
            Node::Str(s) => Ok(Value::str(s)),
            Node::Id(name) => self
                .current_scope
                .lookup(&name)
                .ok_or_else(|| RuntimeError::undefined_variable(&name, line, column).into()),
            Node::Unary { op, value } => self.eval_unary(op, value, line, column),
            Node::Binary { op, lhs, rhs } => self.eval_binary(op, lhs, rhs, line, column),
            Node::Call { callee, args } => self.eval_call(callee, &args, line, column),
            Node::Index { container, index } => self.eval_index(container, index, line, column),
            Node::Field { object, name } => self.eval_field(object, &name, line, column),
            Node::Array(items) => {
                let values = items.iter().map(|i| self.eval(*i)).collect::<Result<Vec<_>>>()?;
                Ok(Value::array(values))
            }
            Node::Table(entries) => {
                let mut out = Vec::with_capacity(entries.len());
                for (key, value_idx) in entries {
                    out.push((key, self.eval(value_idx)?));
                }
                Ok(Value::table(out))
            }
            Node::Set(items) => {
                let values = items.iter().map(|i| self.eval(*i)).collect::<Result<Vec<_>>>()?;
                Ok(Value::set(values))
            }
            Node::Range { start, end, inclusive } => {
                let start = self.eval(start)?;
                let end = self.eval(end)?;
                let start = as_int(&start, line, column)?;
                let end = as_int(&end, line, column)?;
                Ok(Value::Range(RangeValue { start, end, inclusive }))
            }
            Node::Echo(args) => {
                let mut parts = Vec::with_capacity(args.len());
                for a in &args {
                    parts.push(self.eval(*a)?.display_string());
                }
                self.output.push(parts.join(" "));
                Ok(Value::Nil)
            }
            Node::Let { name, value } => {
                let v = self.eval(value)?;
                self.current_scope.define(name, v, true);
                Ok(Value::Nil)
            }
            Node::Var { name, value } => {
                let v = self.eval(value)?;
                self.current_scope.define(name, v, false);
                Ok(Value::Nil)
            }
            Node::Assign { target, value } => {
                let v = self.eval(value)?;
                self.apply_assign(&target, v.clone(), line, column)?;
                Ok(v)
            }
            Node::FunctionDef(func) => {
                let value = Value::Function(Rc::new(FunctionValue {
                    name: func.name.clone(),
                    params: func.params,
                    body: func.body,
                    captured_scope: self.current_scope.clone(),
                }));
                self.current_scope.define(func.name, value, true);
                Ok(Value::Nil)
            }
            Node::TypeDef { name, fields } => {
                let value = Value::Type(Rc::new(TypeDescriptor { name: name.clone(), fields }));
                self.current_scope.define(name, value, true);
                Ok(Value::Nil)
            }
            Node::Return(expr) => {
                let value = match expr {
                    Some(e) => self.eval(e)?,
                    None => Value::Nil,
                };
                self.return_value = Some(value);
                self.control_flow = ControlFlow::Return;
                Ok(Value::Nil)
            }
            Node::Break => {
                self.control_flow = ControlFlow::Break;
                Ok(Value::Nil)
            }
            Node::Continue => {
                self.control_flow = ControlFlow::Continue;
                Ok(Value::Nil)
            }
            Node::If(ast_if) => self.eval_if(&ast_if),
            Node::For(ast_for) => self.eval_for(&ast_for, line, column),
            Node::While { condition, body } => self.eval_while(condition, &body),
            Node::Block(stmts) => self.eval_block(&stmts),
            Node::Program(stmts) => self.eval_block(&stmts),
        }
    }

    /// Runs a straight-line sequence of statements in `current_scope`,
    /// stopping early on `return`/`break`/`continue`.
    pub(crate) fn eval_block(&mut self, stmts: &[AstIndex]) -> Result<Value> {
        let mut last = Value::Nil;
        for &stmt in stmts {
            last = self.eval(stmt)?;
            if self.control_flow != ControlFlow::None {
                break;
            }
        }
        Ok(last)
    }

    fn eval_scoped_block(&mut self, stmts: &[AstIndex]) -> Result<Value> {
        let child = self.current_scope.child();
        let prev = std::mem::replace(&mut self.current_scope, child);
        let result = self.eval_block(stmts);
        self.current_scope = prev;
        result
    }

    fn eval_if(&mut self, ast_if: &AstIf) -> Result<Value> {
        if self.eval(ast_if.condition)?.is_truthy() {
            return self.eval_scoped_block(&ast_if.then_block);
        }
        for (cond, block) in &ast_if.elif_blocks {
            if self.eval(*cond)?.is_truthy() {
                return self.eval_scoped_block(block);
            }
        }
        if let Some(block) = &ast_if.else_block {
            return self.eval_scoped_block(block);
        }
        Ok(Value::Nil)
    }

    fn eval_for(&mut self, ast_for: &AstFor, line: u32, column: u32) -> Result<Value> {
        let iterable = self.eval(ast_for.iterable)?;
        let values = self.materialize_iterable(&iterable, line, column)?;
        for value in values {
            let child = self.current_scope.child();
            child.define(ast_for.var_name.clone(), value, false);
            let prev = std::mem::replace(&mut self.current_scope, child);
            let result = self.eval_block(&ast_for.body);
            self.current_scope = prev;
            result?;
            match self.control_flow {
                ControlFlow::Break => {
                    self.control_flow = ControlFlow::None;
                    break;
                }
                ControlFlow::Continue => {
                    self.control_flow = ControlFlow::None;
                }
                ControlFlow::Return => break,
                ControlFlow::None => {}
            }
        }
        Ok(Value::Nil)
    }

    fn eval_while(&mut self, condition: AstIndex, body: &[AstIndex]) -> Result<Value> {
        loop {
            if !self.eval(condition)?.is_truthy() {
                break;
            }
            let child = self.current_scope.child();
            let prev = std::mem::replace(&mut self.current_scope, child);
            let result = self.eval_block(body);
            self.current_scope = prev;
            result?;
            match self.control_flow {
                ControlFlow::Break => {
                    self.control_flow = ControlFlow::None;
                    break;
                }
                ControlFlow::Continue => {
                    self.control_flow = ControlFlow::None;
                }
                ControlFlow::Return => break,
                ControlFlow::None => {}
            }
        }
        Ok(Value::Nil)
    }

    /// Materialises an iterable value into the ordered list of values a
    /// `for` loop walks: a range's integers, an array's elements, or a
    /// string's single-character substrings.
    pub(crate) fn materialize_iterable(&self, value: &Value, line: u32, column: u32) -> Result<Vec<Value>> {
        match value {
            Value::Range(r) => Ok(r.to_vec().into_iter().map(Value::Int).collect()),
            Value::Array(items) => Ok(items.borrow().clone()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::str(c.to_string())).collect()),
            other => Err(RuntimeError::cannot_iterate(other.type_name(), line, column).into()),
        }
    }

    fn eval_unary(&mut self, op: UnaryOp, value: AstIndex, line: u32, column: u32) -> Result<Value> {
        let v = self.eval(value)?;
        match op {
            UnaryOp::Negate => match v {
                Value::Int(n) => Ok(Value::Int(-n)),
                Value::Float(n) => Ok(Value::Float(-n)),
                other => Err(RuntimeError::new(format!("Cannot negate {}", other.type_name()), line, column).into()),
            },
            UnaryOp::Not => Ok(Value::Bool(!v.is_truthy())),
            UnaryOp::ToString => Ok(Value::str(v.display_string())),
        }
    }

    fn eval_binary(&mut self, op: BinaryOp, lhs: AstIndex, rhs: AstIndex, line: u32, column: u32) -> Result<Value> {
        match op {
            BinaryOp::And => {
                let l = self.eval(lhs)?;
                if !l.is_truthy() {
                    return Ok(Value::Bool(false));
                }
                let r = self.eval(rhs)?;
                Ok(Value::Bool(r.is_truthy()))
            }
            BinaryOp::Or => {
                let l = self.eval(lhs)?;
                if l.is_truthy() {
                    return Ok(Value::Bool(true));
                }
                let r = self.eval(rhs)?;
                Ok(Value::Bool(r.is_truthy()))
            }
            _ => {
                let l = self.eval(lhs)?;
                let r = self.eval(rhs)?;
                apply_binary(op, l, r, line, column)
            }
        }
    }

    fn eval_index(&mut self, container: AstIndex, index: AstIndex, line: u32, column: u32) -> Result<Value> {
        let container_val = self.eval(container)?;
        let index_val = self.eval(index)?;
        match &container_val {
            Value::Array(items) => {
                let idx = as_int(&index_val, line, column)?;
                let items = items.borrow();
                if idx < 0 || idx as usize >= items.len() {
                    return Err(RuntimeError::index_out_of_bounds(idx, line, column).into());
                }
                Ok(items[idx as usize].clone())
            }
            Value::Str(s) => {
                let idx = as_int(&index_val, line, column)?;
                if idx < 0 {
                    return Err(RuntimeError::index_out_of_bounds(idx, line, column).into());
                }
                match s.chars().nth(idx as usize) {
                    Some(c) => Ok(Value::str(c.to_string())),
                    None => Err(RuntimeError::index_out_of_bounds(idx, line, column).into()),
                }
            }
            Value::Table(map) => match &index_val {
                Value::Str(key) => Ok(map.borrow().get(key.as_ref()).cloned().unwrap_or(Value::Nil)),
                _ => Err(RuntimeError::table_key_must_be_string(line, column).into()),
            },
            other => Err(RuntimeError::cannot_index(other.type_name(), line, column).into()),
        }
    }

    fn eval_field(&mut self, object: AstIndex, name: &str, line: u32, column: u32) -> Result<Value> {
        let object_val = self.eval(object)?;
        match &object_val {
            Value::Object(obj) => {
                if let Some(v) = obj.borrow().fields.get(name).cloned() {
                    return Ok(v);
                }
                if let Some(callable @ (Value::Function(_) | Value::Native(_))) = self.current_scope.lookup(name) {
                    return self.do_call(callable, vec![object_val.clone()], line, column);
                }
                Err(RuntimeError::new(format!("No such field '{name}' on {}", obj.borrow().type_name), line, column).into())
            }
            Value::Array(items) if name == "len" => Ok(Value::Int(items.borrow().len() as i64)),
            Value::Str(s) if name == "len" => Ok(Value::Int(s.chars().count() as i64)),
            Value::Table(map) if name == "len" => Ok(Value::Int(map.borrow().len() as i64)),
            Value::Set(items) if name == "len" || name == "card" => Ok(Value::Int(items.borrow().len() as i64)),
            other => Err(RuntimeError::cannot_index(other.type_name(), line, column).into()),
        }
    }

    /// Resolves a call's callee expression into a callable value plus, for
    /// UFCS dot-calls, the receiver value to prepend to the argument list.
    fn resolve_call_target(&mut self, callee: AstIndex) -> Result<(Value, Option<Value>)> {
        let node = self.ast().node(callee).clone();
        let line = node.span.start.line;
        let column = node.span.start.column;
        match node.node {
            Node::Id(name) => {
                let v = self
                    .current_scope
                    .lookup(&name)
                    .ok_or_else(|| RuntimeError::undefined_variable(&name, line, column))?;
                Ok((v, None))
            }
            Node::Field { object, name } => {
                let receiver = self.eval(object)?;
                if let Value::Object(obj) = &receiver {
                    if let Some(field_val) = obj.borrow().fields.get(&name).cloned() {
                        return Ok((field_val, None));
                    }
                }
                let func = self
                    .current_scope
                    .lookup(&name)
                    .ok_or_else(|| RuntimeError::new(format!("Cannot call {name}"), line, column))?;
                Ok((func, Some(receiver)))
            }
            _ => Ok((self.eval(callee)?, None)),
        }
    }

    fn eval_call(&mut self, callee: AstIndex, args: &[AstIndex], line: u32, column: u32) -> Result<Value> {
        let (callee_val, receiver) = self.resolve_call_target(callee)?;
        let mut arg_values = Vec::with_capacity(args.len() + 1);
        if let Some(r) = receiver {
            arg_values.push(r);
        }
        for a in args {
            arg_values.push(self.eval(*a)?);
        }
        self.do_call(callee_val, arg_values, line, column)
    }

    /// Invokes an already-resolved callable value: native functions run
    /// immediately, type descriptors construct an object, and user-defined
    /// functions run via the eager fallback path (§4.1, §9).
    pub(crate) fn do_call(&mut self, callee: Value, args: Vec<Value>, line: u32, column: u32) -> Result<Value> {
        match callee {
            Value::Native(native) => (native.func)(&args).map_err(|e| {
                tracing::warn!(name = %native.name, "native function returned an error");
                attribute_native_error(e, line, column)
            }),
            Value::Type(desc) => {
                if args.len() != desc.fields.len() {
                    return Err(RuntimeError::arity_mismatch(desc.fields.len(), args.len(), line, column).into());
                }
                let fields = desc.fields.iter().cloned().zip(args).collect();
                Ok(Value::Object(Rc::new(RefCell::new(ObjectValue {
                    type_name: desc.name.clone(),
                    fields,
                }))))
            }
            Value::Function(func) => self.call_user_function_eager(&func, args, line, column),
            other => Err(RuntimeError::cannot_call(other.type_name(), line, column).into()),
        }
    }

    /// Runs a user-defined function to completion inside the current step,
    /// without pushing a frame. Used for calls nested inside a larger
    /// expression, where the frame stepper cannot pause mid-evaluation.
    pub(crate) fn call_user_function_eager(
        &mut self,
        func: &Rc<FunctionValue>,
        args: Vec<Value>,
        line: u32,
        column: u32,
    ) -> Result<Value> {
        if args.len() != func.params.len() {
            return Err(RuntimeError::arity_mismatch(func.params.len(), args.len(), line, column).into());
        }
        let activation = func.captured_scope.child();
        for (param, arg) in func.params.iter().zip(args) {
            activation.define(param.clone(), arg, false);
        }
        let prev_scope = std::mem::replace(&mut self.current_scope, activation);
        let body = func.body.clone();
        let result = self.eval_block(&body);
        self.current_scope = prev_scope;
        let return_value = self.return_value.take().unwrap_or(Value::Nil);
        self.control_flow = ControlFlow::None;
        result?;
        Ok(return_value)
    }

    /// Applies an assignment to an identifier, index target, or object
    /// field, evaluated against `current_scope`.
    pub(crate) fn apply_assign(&mut self, target: &AssignTarget, value: Value, line: u32, column: u32) -> Result<()> {
        match target {
            AssignTarget::Id(name) => self.current_scope.assign(name, value, line, column),
            AssignTarget::Index { container, index } => {
                let container_val = self.eval(*container)?;
                let index_val = self.eval(*index)?;
                self.assign_index(&container_val, &index_val, value, line, column)
            }
            AssignTarget::Field { object, name } => {
                let object_val = self.eval(*object)?;
                match object_val {
                    Value::Object(obj) => {
                        obj.borrow_mut().fields.insert(name.clone(), value);
                        Ok(())
                    }
                    other => Err(RuntimeError::cannot_index(other.type_name(), line, column).into()),
                }
            }
        }
    }

    fn assign_index(&mut self, container: &Value, index: &Value, value: Value, line: u32, column: u32) -> Result<()> {
        match container {
            Value::Array(items) => {
                let idx = as_int(index, line, column)?;
                let mut items = items.borrow_mut();
                if idx < 0 || idx as usize >= items.len() {
                    return Err(RuntimeError::index_out_of_bounds(idx, line, column).into());
                }
                items[idx as usize] = value;
                Ok(())
            }
            Value::Table(map) => match index {
                Value::Str(key) => {
                    map.borrow_mut().insert(key.to_string(), value);
                    Ok(())
                }
                _ => Err(RuntimeError::table_key_must_be_string(line, column).into()),
            },
            other => Err(RuntimeError::cannot_index(other.type_name(), line, column).into()),
        }
    }
}

fn apply_binary(op: BinaryOp, l: Value, r: Value, line: u32, column: u32) -> Result<Value> {
    use BinaryOp::*;
    match op {
        Add | Subtract | Multiply | Divide | IntDivide | Modulo => arithmetic(op, &l, &r, line, column),
        Concat => Ok(Value::str(format!("{}{}", l.display_string(), r.display_string()))),
        Equal => Ok(Value::Bool(l.equals(&r))),
        NotEqual => Ok(Value::Bool(!l.equals(&r))),
        Less => Ok(Value::Bool(l.compare(&r, line, column)? == Ordering::Less)),
        LessOrEqual => Ok(Value::Bool(l.compare(&r, line, column)? != Ordering::Greater)),
        Greater => Ok(Value::Bool(l.compare(&r, line, column)? == Ordering::Greater)),
        GreaterOrEqual => Ok(Value::Bool(l.compare(&r, line, column)? != Ordering::Less)),
        In => membership(&l, &r, line, column),
        And | Or => unreachable!("short-circuited in eval_binary"),
    }
}

fn arithmetic(op: BinaryOp, l: &Value, r: &Value, line: u32, column: u32) -> Result<Value> {
    use BinaryOp::*;
    if let (Value::Set(a), Value::Set(b)) = (l, r) {
        let a = a.borrow();
        let b = b.borrow();
        return match op {
            Add => Ok(Value::set(a.iter().chain(b.iter()).cloned().collect())),
            Subtract => Ok(Value::set(a.iter().filter(|x| !b.iter().any(|y| x.equals(y))).cloned().collect())),
            Multiply => Ok(Value::set(a.iter().filter(|x| b.iter().any(|y| x.equals(y))).cloned().collect())),
            _ => Err(RuntimeError::new("Unsupported operator between sets", line, column).into()),
        };
    }
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => match op {
            Add => Ok(Value::Int(a.wrapping_add(*b))),
            Subtract => Ok(Value::Int(a.wrapping_sub(*b))),
            Multiply => Ok(Value::Int(a.wrapping_mul(*b))),
            Divide => {
                if *b == 0 {
                    return Err(RuntimeError::division_by_zero(line, column).into());
                }
                Ok(Value::Float(*a as f64 / *b as f64))
            }
            IntDivide => {
                if *b == 0 {
                    return Err(RuntimeError::division_by_zero(line, column).into());
                }
                Ok(Value::Int(a.div_euclid(*b)))
            }
            Modulo => {
                if *b == 0 {
                    return Err(RuntimeError::modulo_by_zero(line, column).into());
                }
                Ok(Value::Int(a.rem_euclid(*b)))
            }
            _ => unreachable!(),
        },
        (a, b) if is_numeric(a) && is_numeric(b) => {
            let af = as_f64(a);
            let bf = as_f64(b);
            match op {
                Add => Ok(Value::Float(af + bf)),
                Subtract => Ok(Value::Float(af - bf)),
                Multiply => Ok(Value::Float(af * bf)),
                Divide => {
                    if bf == 0.0 {
                        return Err(RuntimeError::division_by_zero(line, column).into());
                    }
                    Ok(Value::Float(af / bf))
                }
                IntDivide => {
                    if bf == 0.0 {
                        return Err(RuntimeError::division_by_zero(line, column).into());
                    }
                    Ok(Value::Int((af / bf).floor() as i64))
                }
                Modulo => {
                    if bf == 0.0 {
                        return Err(RuntimeError::modulo_by_zero(line, column).into());
                    }
                    Ok(Value::Float(af.rem_euclid(bf)))
                }
                _ => unreachable!(),
            }
        }
        _ => Err(RuntimeError::new(
            format!("Cannot apply operator to {} and {}", l.type_name(), r.type_name()),
            line,
            column,
        )
        .into()),
    }
}

fn is_numeric(v: &Value) -> bool {
    matches!(v, Value::Int(_) | Value::Float(_))
}

fn membership(l: &Value, r: &Value, line: u32, column: u32) -> Result<Value> {
    match r {
        Value::Array(items) => Ok(Value::Bool(items.borrow().iter().any(|x| x.equals(l)))),
        Value::Set(items) => Ok(Value::Bool(items.borrow().iter().any(|x| x.equals(l)))),
        Value::Str(s) => match l {
            Value::Str(needle) => Ok(Value::Bool(s.contains(needle.as_ref()))),
            _ => Err(RuntimeError::new("'in' on a string requires a string operand", line, column).into()),
        },
        Value::Table(map) => match l {
            Value::Str(key) => Ok(Value::Bool(map.borrow().contains_key(key.as_ref()))),
            _ => Err(RuntimeError::table_key_must_be_string(line, column).into()),
        },
        other => Err(RuntimeError::new(format!("Cannot test membership in {}", other.type_name()), line, column).into()),
    }
}
