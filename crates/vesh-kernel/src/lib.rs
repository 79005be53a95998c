//! vesh-kernel: the expression core of the vesh shell.
//!
//! This crate provides:
//!
//! - **AST**: node types for already-parsed compound expressions and chunks
//! - **Values**: the runtime value union and its indexing/explosion capabilities
//! - **Compiler**: translation of AST nodes into executable operation trees
//! - **Frames**: scopes, ports and cancellation for running operations
//! - **Closures**: lambdas with by-reference captures and per-call defaults
//! - **Capture**: output capture (values + lines) and exception capture
//! - **Evaler**: the embedding surface tying it all together
//!
//! ```text
//!   Chunk / Compound (AST)
//!          │  compiler::Compiler
//!          ▼
//!   Op / ValuesOp tree ──exec(&Frame)──▶ Vec<Value> | Exception
//!          │                                 ▲
//!          └── Form ──▶ Closure::call / CommandDispatcher
//! ```

pub mod ast;
pub mod capture;
pub mod closure;
pub mod compiler;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod evaler;
pub mod expand;
pub mod frame;
pub mod op;
pub mod paths;
pub mod pipe_stream;
pub mod port;
pub mod product;
pub mod scope;
pub mod value;

pub use closure::Closure;
pub use compiler::Compiler;
pub use config::EvalConfig;
pub use dispatch::{CommandDispatcher, CoreDispatcher};
pub use error::{CompileError, ErrorKind, Exception};
pub use evaler::{Evaler, Runtime};
pub use frame::Frame;
pub use op::{Op, ValuesOp};
pub use scope::{Namespace, Ns, Variable};
pub use value::{GlobFlags, GlobPattern, Indexable, Iterable, Value, value_to_json};
