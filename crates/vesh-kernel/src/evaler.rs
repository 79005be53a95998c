//! The evaler: entry point for embedders.
//!
//! An `Evaler` owns one runtime (builtin and global namespaces, command
//! dispatcher, filesystem adapter, config) and a cancellation token shared
//! by every frame it creates.
//!
//! ```
//! use vesh_kernel::ast::{Source, build::*};
//! use vesh_kernel::{EvalConfig, Evaler, Value};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let evaler = Evaler::new(EvalConfig::transient());
//! // a{1,2}
//! let values = evaler
//!     .eval_values(Source::new("doc", ""), &compound(vec![
//!         bareword("a").into(),
//!         braced(vec![word("1"), word("2")]).into(),
//!     ]))
//!     .await
//!     .unwrap();
//! assert_eq!(values, vec![Value::from("a1"), Value::from("a2")]);
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use vesh_glob::LocalFs;

use crate::ast::{Chunk, Compound, Source};
use crate::capture::capture_output;
use crate::compiler::Compiler;
use crate::config::EvalConfig;
use crate::dispatch::{CommandDispatcher, CoreDispatcher};
use crate::error::{CompileError, Exception};
use crate::frame::Frame;
use crate::op::{Op, ValuesOp};
use crate::port::Port;
use crate::scope::{Ns, Variable};
use crate::value::Value;

/// State shared by every frame of one evaler.
pub struct Runtime {
    pub builtin: Ns,
    pub global: Ns,
    pub dispatcher: Arc<dyn CommandDispatcher>,
    pub config: EvalConfig,
    pub fs: LocalFs,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("builtin", &self.builtin.names())
            .field("global", &self.global.names())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn builtin_ns() -> Ns {
    let ns = Ns::new();
    ns.set("true", Variable::new(Value::Bool(true)));
    ns.set("false", Variable::new(Value::Bool(false)));
    ns.set("ok", Variable::new(Value::Ok));
    ns
}

#[derive(Debug, Clone)]
pub struct Evaler {
    runtime: Arc<Runtime>,
    cancel: CancellationToken,
}

impl Evaler {
    /// An evaler dispatching string-headed forms to `CoreDispatcher`.
    pub fn new(config: EvalConfig) -> Self {
        Self::with_dispatcher(config, Arc::new(CoreDispatcher))
    }

    pub fn with_dispatcher(config: EvalConfig, dispatcher: Arc<dyn CommandDispatcher>) -> Self {
        tracing::debug!(name = %config.name, cwd = %config.cwd.display(), "creating evaler");
        Self {
            runtime: Arc::new(Runtime {
                builtin: builtin_ns(),
                global: Ns::new(),
                dispatcher,
                config,
                fs: LocalFs::new(),
            }),
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.runtime.config
    }

    pub fn global(&self) -> &Ns {
        &self.runtime.global
    }

    pub fn builtin(&self) -> &Ns {
        &self.runtime.builtin
    }

    /// Set a global variable, reusing its cell if it exists.
    pub fn set_global(&self, name: &str, value: Value) -> Result<()> {
        self.runtime
            .global
            .assign(name, value)
            .with_context(|| format!("setting global ${name}"))
    }

    /// Stop everything running under this evaler. Globbing in progress fails
    /// with "interrupted".
    pub fn interrupt(&self) {
        tracing::debug!("interrupt requested");
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// A compiler seeded with the current global and builtin names.
    pub fn compiler(&self, source: Arc<Source>) -> Compiler {
        Compiler::new(source, self.runtime.global.names(), self.runtime.builtin.names())
    }

    pub fn compile(&self, source: &Arc<Source>, chunk: &Chunk) -> Result<Op, CompileError> {
        self.compiler(source.clone()).compile_chunk(chunk)
    }

    pub fn compile_compound(&self, source: &Arc<Source>, compound: &Compound) -> Result<ValuesOp, CompileError> {
        self.compiler(source.clone()).compile_compound(compound)
    }

    /// A top-level frame: input closed, output and errors to the process.
    pub fn frame(&self, source: impl Into<Arc<Source>>) -> Frame {
        Frame::new(
            self.runtime.clone(),
            source.into(),
            [Port::null(), Port::stdout(), Port::stderr()],
            self.cancel.child_token(),
        )
    }

    /// Compile and run a chunk.
    pub async fn eval(&self, source: impl Into<Arc<Source>>, chunk: &Chunk) -> Result<()> {
        let source = source.into();
        let op = self.compile(&source, chunk)?;
        let fm = self.frame(source.clone());
        op.exec(&fm).await.map_err(|exc| located(exc, &source))
    }

    /// Compile and evaluate a compound to its values.
    pub async fn eval_values(&self, source: impl Into<Arc<Source>>, compound: &Compound) -> Result<Vec<Value>> {
        let source = source.into();
        let op = self.compile_compound(&source, compound)?;
        let fm = self.frame(source.clone());
        op.exec(&fm).await.map_err(|exc| located(exc, &source))
    }

    /// Compile and run a chunk, collecting its output.
    ///
    /// Compile errors fail the call; a run-time exception is returned next to
    /// the output produced before it.
    pub async fn capture(
        &self,
        source: impl Into<Arc<Source>>,
        chunk: &Chunk,
    ) -> Result<(Vec<Value>, Result<(), Exception>)> {
        let source = source.into();
        let op = self.compile(&source, chunk)?;
        let fm = self.frame(source);
        Ok(capture_output(&fm, &op).await)
    }
}

/// Wrap an exception with its rendered source position.
fn located(exc: Exception, source: &Source) -> anyhow::Error {
    let position = exc.span.map(|span| source.describe(span));
    let err = anyhow::Error::new(exc);
    match position {
        Some(position) => err.context(format!("at {position}")),
        None => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn globals_persist_between_evaluations() {
        let evaler = Evaler::new(EvalConfig::transient());
        evaler
            .eval(Source::new("one", ""), &chunk(vec![assign("x", word("hello"))]))
            .await
            .unwrap();
        let values = evaler.eval_values(Source::new("two", ""), &var("x")).await.unwrap();
        assert_eq!(values, vec![Value::from("hello")]);
    }

    #[tokio::test]
    async fn set_global_is_visible_to_the_compiler() {
        let evaler = Evaler::new(EvalConfig::transient());
        evaler.set_global("name", "v".into()).unwrap();
        let values = evaler.eval_values(Source::new("t", ""), &var("name")).await.unwrap();
        assert_eq!(values, vec![Value::from("v")]);
    }

    #[tokio::test]
    async fn runtime_errors_downcast_to_exceptions() {
        let evaler = Evaler::new(EvalConfig::transient());
        let err = evaler
            .eval(Source::new("t", ""), &chunk(vec![form(word("fail"), vec![word("x")])]))
            .await
            .unwrap_err();
        let exc = err.downcast_ref::<Exception>().unwrap();
        assert_eq!(exc.kind, ErrorKind::Failure("x".into()));
    }

    #[tokio::test]
    async fn compile_errors_downcast() {
        let evaler = Evaler::new(EvalConfig::transient());
        let err = evaler.eval_values(Source::new("t", ""), &var("missing")).await.unwrap_err();
        assert!(err.downcast_ref::<CompileError>().is_some());
    }

    #[tokio::test]
    async fn capture_returns_output() {
        let evaler = Evaler::new(EvalConfig::transient());
        let (values, result) = evaler
            .capture(Source::new("t", ""), &chunk(vec![form(word("put"), vec![var("ok")])]))
            .await
            .unwrap();
        assert!(result.is_ok());
        assert_eq!(values, vec![Value::Ok]);
    }

    #[test]
    fn interrupt_cancels_frames() {
        let evaler = Evaler::new(EvalConfig::transient());
        let fm = evaler.frame(Source::new("t", ""));
        evaler.interrupt();
        assert!(fm.is_cancelled());
    }
}
