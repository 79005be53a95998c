//! Execution frames.
//!
//! A `Frame` is everything an operation needs at run time:
//!
//! ```text
//!   Frame
//!   ├── runtime  (shared: builtin + global namespaces, dispatcher, config, fs)
//!   ├── local    innermost scope
//!   ├── up       captured / enclosing scope
//!   ├── ports    [input, output, errors]
//!   ├── source   for diagnostics
//!   └── cancel   cooperative cancellation, shared by forks
//! ```
//!
//! Frames are cheap to clone. `fork` keeps scopes and cancellation and lets
//! the child substitute its own ports.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use vesh_glob::Globber;

use crate::ast::Source;
use crate::config::EvalConfig;
use crate::error::ErrorKind;
use crate::evaler::Runtime;
use crate::port::Port;
use crate::scope::{Namespace, Ns, Variable};
use crate::value::Value;

pub const PORT_INPUT: usize = 0;
pub const PORT_OUTPUT: usize = 1;
pub const PORT_ERRORS: usize = 2;

#[derive(Debug, Clone)]
pub struct Frame {
    runtime: Arc<Runtime>,
    pub local: Ns,
    pub up: Ns,
    ports: [Port; 3],
    name: String,
    source: Arc<Source>,
    cancel: CancellationToken,
}

impl Frame {
    /// A top-level frame: `local` is the global namespace.
    pub fn new(runtime: Arc<Runtime>, source: Arc<Source>, ports: [Port; 3], cancel: CancellationToken) -> Self {
        Self {
            local: runtime.global.clone(),
            up: Ns::new(),
            name: source.name.clone(),
            runtime,
            ports,
            source,
            cancel,
        }
    }

    /// A child sharing scopes and cancellation. Ports start as copies.
    pub fn fork(&self, name: &str) -> Frame {
        tracing::trace!(parent = %self.name, child = name, "fork frame");
        Frame {
            name: name.to_string(),
            ..self.clone()
        }
    }

    /// A child with its own scopes, e.g. a closure body.
    pub fn with_scopes(&self, local: Ns, up: Ns) -> Frame {
        Frame {
            local,
            up,
            ..self.clone()
        }
    }

    pub fn with_source(mut self, source: Arc<Source>) -> Frame {
        self.source = source;
        self
    }

    pub fn set_port(&mut self, index: usize, port: Port) {
        self.ports[index] = port;
    }

    pub fn port(&self, index: usize) -> &Port {
        &self.ports[index]
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    pub fn config(&self) -> &EvalConfig {
        &self.runtime.config
    }

    pub fn source(&self) -> &Arc<Source> {
        &self.source
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Find the variable a reference names, if any.
    pub fn resolve_var(&self, ns: Namespace, name: &str) -> Option<Variable> {
        match ns {
            Namespace::Local => self.local.get(name),
            Namespace::Up => self.up.get(name),
            Namespace::Builtin => self.runtime.builtin.get(name),
            Namespace::Env => Some(Variable::Env(name.to_string())),
            Namespace::Any => self
                .local
                .get(name)
                .or_else(|| self.up.get(name))
                .or_else(|| self.runtime.builtin.get(name)),
        }
    }

    /// Emit a value on the output port.
    pub async fn put(&self, value: Value) -> Result<(), ErrorKind> {
        self.ports[PORT_OUTPUT].put(value).await
    }

    /// Write bytes on the output port.
    pub async fn write(&self, data: &[u8]) -> Result<(), ErrorKind> {
        self.ports[PORT_OUTPUT].write(data).await
    }

    /// A globber over the runtime's filesystem, rooted at the configured
    /// working directory and observing this frame's cancellation.
    pub fn globber(&self) -> Globber<'_, vesh_glob::LocalFs> {
        Globber::new(&self.runtime.fs, &self.runtime.config.cwd).with_cancel(self.cancel.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaler::Evaler;

    fn frame() -> Frame {
        Evaler::new(EvalConfig::transient()).frame(Source::new("test", ""))
    }

    #[test]
    fn unqualified_lookup_order() {
        let fm = frame();
        let up = Ns::new();
        up.set("x", Variable::new("up".into()));
        up.set("y", Variable::new("up".into()));
        let local = Ns::new();
        local.set("x", Variable::new("local".into()));
        let fm = fm.with_scopes(local, up);

        assert_eq!(fm.resolve_var(Namespace::Any, "x").unwrap().get(), Value::from("local"));
        assert_eq!(fm.resolve_var(Namespace::Any, "y").unwrap().get(), Value::from("up"));
        assert_eq!(fm.resolve_var(Namespace::Up, "x").unwrap().get(), Value::from("up"));
        assert!(fm.resolve_var(Namespace::Local, "y").is_none());
        assert_eq!(fm.resolve_var(Namespace::Any, "true").unwrap().get(), Value::Bool(true));
    }

    #[test]
    fn env_namespace_always_resolves() {
        let fm = frame();
        assert!(matches!(fm.resolve_var(Namespace::Env, "ANYTHING"), Some(Variable::Env(_))));
    }

    #[test]
    fn fork_shares_scopes_and_cancellation() {
        let fm = frame();
        let child = fm.fork("child");
        child.local.assign("z", "1".into()).unwrap();
        assert!(fm.local.has("z"));
        fm.cancel_token().cancel();
        assert!(child.is_cancelled());
    }
}
