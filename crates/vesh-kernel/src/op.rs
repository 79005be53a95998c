//! Compiled operations.
//!
//! The compiler turns syntax into two kinds of trees:
//!
//! - `ValuesOp`: produces an ordered sequence of values (compounds,
//!   indexings, primaries)
//! - `Op`: runs for its effects on the frame's ports and scopes (chunks,
//!   forms, assignments)
//!
//! Both are closed enums paired with the source span they came from. A
//! failure is tagged with the span of the innermost operation that raised it.
//! Execution returns boxed futures so trees can recurse.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::ast::Span;
use crate::capture::{capture_exception, capture_output};
use crate::closure::{Closure, LambdaDef};
use crate::error::{ErrorKind, Exception};
use crate::expand::{expand_globs, tilde};
use crate::frame::Frame;
use crate::paths::current_home;
use crate::product::{cat, outer_product};
use crate::scope::Namespace;
use crate::value::Value;

#[derive(Debug)]
pub struct ValuesOp {
    pub body: ValuesOpBody,
    pub span: Span,
}

#[derive(Debug)]
pub enum ValuesOpBody {
    /// Constant values.
    Literal(Vec<Value>),
    /// A lone `~`.
    Home,
    /// Outer product of the subops, then tilde and glob expansion.
    Compound { tilde: bool, subops: Vec<ValuesOp> },
    /// `head[i]...`: each index operand is applied to every value so far.
    Indexing { head: Box<ValuesOp>, indices: Vec<ValuesOp> },
    /// Sub-sequences concatenated in order, no outer product.
    Seq(Vec<ValuesOp>),
    /// Like `Seq`, wrapped into one list value.
    List(Vec<ValuesOp>),
    Variable(VariableOp),
    ExceptionCapture(Arc<Op>),
    OutputCapture(Arc<Op>),
    Lambda(Arc<LambdaDef>),
    MapPairs(Vec<PairOp>),
    /// Inclusive `{from..to}`.
    Range { from: Box<ValuesOp>, to: Box<ValuesOp> },
}

#[derive(Debug)]
pub struct VariableOp {
    pub explode: bool,
    pub ns: Namespace,
    pub name: String,
}

/// One `&key=value` pair. A pair without a value compiles to `$true`.
#[derive(Debug)]
pub struct PairOp {
    pub key: ValuesOp,
    pub value: ValuesOp,
    pub span: Span,
}

#[derive(Debug)]
pub struct Op {
    pub body: OpBody,
    pub span: Span,
}

#[derive(Debug)]
pub enum OpBody {
    Chunk(Vec<Op>),
    Form(FormOp),
    Assign(AssignOp),
}

#[derive(Debug)]
pub struct FormOp {
    pub head: ValuesOp,
    pub args: Vec<ValuesOp>,
    pub opts: Vec<PairOp>,
}

/// Assignment into the local scope or into a captured cell (`Up`).
#[derive(Debug)]
pub struct AssignOp {
    pub ns: Namespace,
    pub name: String,
    pub value: ValuesOp,
}

/// Take exactly one value.
pub(crate) fn one(mut values: Vec<Value>, what: &'static str) -> Result<Value, ErrorKind> {
    if values.len() == 1 {
        if let Some(value) = values.pop() {
            return Ok(value);
        }
    }
    Err(ErrorKind::NotOneValue { what, got: values.len() })
}

impl ValuesOp {
    pub fn new(body: ValuesOpBody, span: Span) -> Self {
        Self { body, span }
    }

    pub fn literal(values: Vec<Value>, span: Span) -> Self {
        Self::new(ValuesOpBody::Literal(values), span)
    }

    pub fn exec<'a>(&'a self, fm: &'a Frame) -> BoxFuture<'a, Result<Vec<Value>, Exception>> {
        Box::pin(async move {
            tracing::trace!(begin = self.span.begin, end = self.span.end, "exec values op");
            self.body.invoke(fm).await.map_err(|e| e.with_span(self.span))
        })
    }
}

impl ValuesOpBody {
    async fn invoke(&self, fm: &Frame) -> Result<Vec<Value>, Exception> {
        match self {
            ValuesOpBody::Literal(values) => Ok(values.clone()),
            ValuesOpBody::Home => {
                let home = current_home(fm.config().home_override.as_deref())?;
                Ok(vec![Value::String(home.to_string_lossy().into_owned())])
            }
            ValuesOpBody::Compound { tilde, subops } => compound(*tilde, subops, fm).await,
            ValuesOpBody::Indexing { head, indices } => indexing(head, indices, fm).await,
            ValuesOpBody::Seq(ops) => seq(ops, fm).await,
            ValuesOpBody::List(ops) => Ok(vec![Value::list(seq(ops, fm).await?)]),
            ValuesOpBody::Variable(var) => var.invoke(fm),
            ValuesOpBody::ExceptionCapture(op) => Ok(vec![capture_exception(fm, op).await]),
            ValuesOpBody::OutputCapture(op) => {
                let (values, result) = capture_output(fm, op).await;
                result?;
                Ok(values)
            }
            ValuesOpBody::Lambda(def) => Ok(vec![Value::Closure(Arc::new(Closure::new(def.clone(), fm)?))]),
            ValuesOpBody::MapPairs(pairs) => Ok(vec![Value::map(eval_pairs(pairs, fm).await?)]),
            ValuesOpBody::Range { from, to } => {
                let from = one(from.exec(fm).await?, "range bound")?;
                let to = one(to.exec(fm).await?, "range bound")?;
                Ok(range(&from, &to, fm.config().max_range_len)?)
            }
        }
    }
}

async fn compound(tilde_prefix: bool, subops: &[ValuesOp], fm: &Frame) -> Result<Vec<Value>, Exception> {
    let Some((first, rest)) = subops.split_first() else {
        return Ok(vec![Value::String(String::new())]);
    };
    let mut values = first.exec(fm).await?;
    for subop in rest {
        let more = subop.exec(fm).await?;
        values = outer_product(&values, &more, cat)?;
    }
    if tilde_prefix {
        let mut expanded = Vec::with_capacity(values.len());
        for value in values {
            expanded.push(tilde(value, fm).await?);
        }
        values = expanded;
    }
    Ok(expand_globs(values, fm).await?)
}

async fn indexing(head: &ValuesOp, indices: &[ValuesOp], fm: &Frame) -> Result<Vec<Value>, Exception> {
    let mut values = head.exec(fm).await?;
    for index_op in indices {
        let index_values = index_op.exec(fm).await?;
        if let Some(bad) = values.iter().find(|v| v.as_indexable().is_none()) {
            return Err(ErrorKind::NotIndexable(bad.kind()).into());
        }
        values = outer_product(&values, &index_values, |v, i| match v.as_indexable() {
            Some(indexable) => indexable.index(i),
            None => Err(ErrorKind::NotIndexable(v.kind())),
        })?;
    }
    Ok(values)
}

async fn seq(ops: &[ValuesOp], fm: &Frame) -> Result<Vec<Value>, Exception> {
    let mut values = Vec::new();
    for op in ops {
        values.extend(op.exec(fm).await?);
    }
    Ok(values)
}

/// Build a map from pairs; later keys overwrite earlier ones.
pub(crate) async fn eval_pairs(pairs: &[PairOp], fm: &Frame) -> Result<HashMap<Value, Value>, Exception> {
    let mut map = HashMap::new();
    for pair in pairs {
        let keys = pair.key.exec(fm).await?;
        let values = pair.value.exec(fm).await?;
        if keys.len() != values.len() {
            let kind = ErrorKind::MapCountMismatch {
                keys: keys.len(),
                values: values.len(),
            };
            return Err(Exception::new(kind).with_span(pair.span));
        }
        map.extend(keys.into_iter().zip(values));
    }
    Ok(map)
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Inclusive range of integers or single characters, counting down when
/// `from > to`. Ranges of more than `max_len` elements are rejected.
fn range(from: &Value, to: &Value, max_len: usize) -> Result<Vec<Value>, ErrorKind> {
    let (Value::String(from), Value::String(to)) = (from, to) else {
        return Err(ErrorKind::BadRange);
    };
    let too_long = |a: i64, b: i64| (i128::from(a) - i128::from(b)).unsigned_abs() >= max_len as u128;
    if let (Ok(a), Ok(b)) = (from.parse::<i64>(), to.parse::<i64>()) {
        if too_long(a, b) {
            return Err(ErrorKind::BadRange);
        }
        let values: Vec<Value> = if a <= b {
            (a..=b).map(|i| Value::String(i.to_string())).collect()
        } else {
            (b..=a).rev().map(|i| Value::String(i.to_string())).collect()
        };
        return Ok(values);
    }
    if let (Some(a), Some(b)) = (single_char(from), single_char(to)) {
        let (a, b) = (a as u32, b as u32);
        if too_long(a.into(), b.into()) {
            return Err(ErrorKind::BadRange);
        }
        let codes: Vec<u32> = if a <= b { (a..=b).collect() } else { (b..=a).rev().collect() };
        return Ok(codes
            .into_iter()
            .filter_map(char::from_u32)
            .map(|c| Value::String(c.to_string()))
            .collect());
    }
    Err(ErrorKind::BadRange)
}

impl VariableOp {
    fn qualified(&self) -> String {
        format!("{}{}", self.ns.prefix(), self.name)
    }

    fn invoke(&self, fm: &Frame) -> Result<Vec<Value>, Exception> {
        let variable = fm
            .resolve_var(self.ns, &self.name)
            .ok_or_else(|| ErrorKind::VariableNotFound(self.qualified()))?;
        let value = variable.get();
        if !self.explode {
            return Ok(vec![value]);
        }
        match value.as_iterable() {
            Some(iterable) => Ok(iterable.explode()),
            None => Err(ErrorKind::CannotExplode {
                name: self.qualified(),
                kind: value.kind(),
            }
            .into()),
        }
    }
}

impl Op {
    pub fn new(body: OpBody, span: Span) -> Self {
        Self { body, span }
    }

    pub fn exec<'a>(&'a self, fm: &'a Frame) -> BoxFuture<'a, Result<(), Exception>> {
        Box::pin(async move {
            let result = match &self.body {
                OpBody::Chunk(ops) => run_chunk(ops, fm).await,
                OpBody::Form(form) => form.invoke(fm).await,
                OpBody::Assign(assign) => assign.invoke(fm).await,
            };
            result.map_err(|e| e.with_span(self.span))
        })
    }
}

async fn run_chunk(ops: &[Op], fm: &Frame) -> Result<(), Exception> {
    for op in ops {
        op.exec(fm).await?;
    }
    Ok(())
}

impl FormOp {
    async fn invoke(&self, fm: &Frame) -> Result<(), Exception> {
        let head = one(self.head.exec(fm).await?, "command head")?;
        let mut args = Vec::new();
        for arg in &self.args {
            args.extend(arg.exec(fm).await?);
        }
        let mut opts = HashMap::new();
        for (key, value) in eval_pairs(&self.opts, fm).await? {
            match key {
                Value::String(key) => {
                    opts.insert(key, value);
                }
                other => return Err(ErrorKind::OptionNotString(other.kind()).into()),
            }
        }

        match head {
            Value::Closure(closure) => closure.call(fm, args, opts).await,
            Value::String(name) => {
                tracing::trace!(command = %name, args = args.len(), "dispatch");
                let dispatcher = fm.runtime().dispatcher.clone();
                dispatcher.dispatch(&name, args, opts, fm).await
            }
            other => Err(ErrorKind::NotCallable(other.kind()).into()),
        }
    }
}

impl AssignOp {
    /// The target cell exists before the value runs, so a closure built by
    /// the value can capture the variable it is being assigned to.
    async fn invoke(&self, fm: &Frame) -> Result<(), Exception> {
        let target = match self.ns {
            Namespace::Up => fm
                .up
                .get(&self.name)
                .ok_or_else(|| ErrorKind::VariableNotFound(format!("up:{}", self.name)))?,
            _ => fm.local.cell(&self.name, Value::Ok),
        };
        let value = one(self.value.exec(fm).await?, "assigned value")?;
        target.set(value)?;
        Ok(())
    }
}
