//! Command dispatch for forms whose head is a string.
//!
//! ```text
//! Form ──▶ head value
//!            ├── closure ──▶ Closure::call
//!            ├── string  ──▶ dispatcher.dispatch(name, args, opts, frame)
//!            └── other   ──▶ "a KIND is not callable"
//! ```
//!
//! Embedders plug their own command table in through `CommandDispatcher`.
//! `CoreDispatcher` is the small built-in table used by default.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{ErrorKind, Exception};
use crate::frame::Frame;
use crate::value::Value;

/// Resolves and runs a named command.
///
/// Output goes through the frame's ports, so a dispatched command inside an
/// output capture is captured like any other.
#[async_trait]
pub trait CommandDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        name: &str,
        args: Vec<Value>,
        opts: HashMap<String, Value>,
        fm: &Frame,
    ) -> Result<(), Exception>;
}

/// `put`, `echo`, `print`, `fail` and `nop`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreDispatcher;

impl CoreDispatcher {
    pub const COMMANDS: [&'static str; 5] = ["echo", "fail", "nop", "print", "put"];
}

fn joined(args: &[Value]) -> String {
    args.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl CommandDispatcher for CoreDispatcher {
    async fn dispatch(
        &self,
        name: &str,
        args: Vec<Value>,
        opts: HashMap<String, Value>,
        fm: &Frame,
    ) -> Result<(), Exception> {
        if !Self::COMMANDS.iter().any(|c| *c == name) {
            return Err(ErrorKind::CommandNotFound(name.to_string()).into());
        }
        let mut names: Vec<&String> = opts.keys().collect();
        names.sort();
        if let Some(opt) = names.first() {
            return Err(ErrorKind::UnknownOption(opt.to_string()).into());
        }

        match name {
            "put" => {
                for value in args {
                    fm.put(value).await?;
                }
            }
            "echo" => fm.write(format!("{}\n", joined(&args)).as_bytes()).await?,
            "print" => fm.write(joined(&args).as_bytes()).await?,
            "fail" => return Err(ErrorKind::Failure(joined(&args)).into()),
            _ => {}
        }
        Ok(())
    }
}
