//! Closures: compiled lambdas bound to their captured variables.

use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::Source;
use crate::error::{ErrorKind, Exception};
use crate::frame::Frame;
use crate::op::{Op, ValuesOp, one};
use crate::scope::{Namespace, Ns, Variable};
use crate::value::Value;

/// The compiled, frame-independent part of a lambda.
#[derive(Debug)]
pub struct LambdaDef {
    pub arg_names: Vec<String>,
    /// Name of the `@rest` argument, if the signature has one.
    pub rest_arg: Option<String>,
    pub opt_names: Vec<String>,
    /// One default per option, evaluated at each call that omits it.
    pub opt_defaults: Vec<ValuesOp>,
    /// Names the body reads from enclosing scopes.
    pub captures: Vec<String>,
    pub body: Op,
    pub source: Arc<Source>,
}

/// A lambda value.
///
/// Captured variables are shared cells: writes made after the closure was
/// created, through either side, are visible to both.
#[derive(Debug)]
pub struct Closure {
    def: Arc<LambdaDef>,
    captured: Ns,
    defining_local: Ns,
    defining_up: Ns,
}

impl Closure {
    /// Bind `def` to the cells its captures resolve to in `fm`. Every
    /// capture must resolve.
    pub fn new(def: Arc<LambdaDef>, fm: &Frame) -> Result<Self, ErrorKind> {
        let captured = Ns::new();
        for name in &def.captures {
            let variable = fm
                .resolve_var(Namespace::Any, name)
                .ok_or_else(|| ErrorKind::VariableNotFound(name.clone()))?;
            captured.set(name.as_str(), variable);
        }
        tracing::trace!(captures = def.captures.len(), "closure created");
        Ok(Self {
            def,
            captured,
            defining_local: fm.local.clone(),
            defining_up: fm.up.clone(),
        })
    }

    pub fn arg_names(&self) -> &[String] {
        &self.def.arg_names
    }

    pub fn rest_arg(&self) -> Option<&str> {
        self.def.rest_arg.as_deref()
    }

    pub fn opt_names(&self) -> &[String] {
        &self.def.opt_names
    }

    /// The captured namespace. Shares cells with the defining scope.
    pub fn captured(&self) -> &Ns {
        &self.captured
    }

    /// Call with positional `args` and named `opts`.
    ///
    /// The body runs in a fresh local scope holding the arguments, the rest
    /// list, every option, and `opts`: a map of the effective option values.
    /// Output goes to the caller's ports.
    pub async fn call(
        &self,
        fm: &Frame,
        args: Vec<Value>,
        mut opts: HashMap<String, Value>,
    ) -> Result<(), Exception> {
        let def = &self.def;
        let need = def.arg_names.len();
        match def.rest_arg {
            None if args.len() != need => {
                return Err(ErrorKind::ArityMismatch { need, got: args.len() }.into());
            }
            Some(_) if args.len() < need => {
                return Err(ErrorKind::ArityAtLeast { need, got: args.len() }.into());
            }
            _ => {}
        }
        let mut unknown: Vec<&String> = opts.keys().filter(|k| !def.opt_names.contains(k)).collect();
        unknown.sort();
        if let Some(name) = unknown.first() {
            return Err(ErrorKind::UnknownOption(name.to_string()).into());
        }

        let local = Ns::new();
        let mut args = args.into_iter();
        for name in &def.arg_names {
            if let Some(value) = args.next() {
                local.set(name.as_str(), Variable::new(value));
            }
        }
        if let Some(rest) = &def.rest_arg {
            local.set(rest.as_str(), Variable::new(Value::list(args.collect())));
        }

        let defaults_frame = fm
            .with_scopes(self.defining_local.clone(), self.defining_up.clone())
            .with_source(def.source.clone());
        let mut effective = HashMap::new();
        for (name, default) in def.opt_names.iter().zip(&def.opt_defaults) {
            let value = match opts.remove(name) {
                Some(value) => value,
                None => one(default.exec(&defaults_frame).await?, "option default value")?,
            };
            local.set(name.as_str(), Variable::new(value.clone()));
            effective.insert(Value::String(name.clone()), value);
        }
        local.set("opts", Variable::new(Value::map(effective)));

        tracing::trace!(frame = fm.name(), "calling closure");
        let body_frame = fm
            .with_scopes(local, self.captured.clone())
            .with_source(def.source.clone());
        def.body.exec(&body_frame).await
    }
}
