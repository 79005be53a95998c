//! Output and exception capture.
//!
//! Output capture runs a body with its output port redirected into two
//! drains:
//!
//! ```text
//!            ┌── values (mpsc) ──▶ value drain ──┐
//!   body ────┤                                   ├──▶ shared buffer
//!            └── bytes (pipe)  ──▶ line drain  ──┘
//! ```
//!
//! The value drain appends each value as-is. The line drain splits the byte
//! stream on `\n` and appends each complete line, without its terminator, as
//! a string. Both run concurrently with the body, so the buffer holds values
//! and lines in arrival order. A trailing fragment with no newline is
//! dropped.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::Exception;
use crate::frame::{Frame, PORT_OUTPUT};
use crate::op::Op;
use crate::pipe_stream::{PipeReader, pipe_stream};
use crate::port::Port;
use crate::value::Value;

type Buffer = Arc<Mutex<Vec<Value>>>;

fn push(buffer: &Buffer, value: Value) {
    buffer.lock().unwrap_or_else(|e| e.into_inner()).push(value);
}

async fn drain_values(mut rx: mpsc::Receiver<Value>, buffer: Buffer) {
    while let Some(value) = rx.recv().await {
        push(&buffer, value);
    }
}

async fn drain_lines(reader: PipeReader, buffer: Buffer) {
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) if line.last() == Some(&b'\n') => {
                line.pop();
                push(&buffer, Value::String(String::from_utf8_lossy(&line).into_owned()));
            }
            Ok(n) => {
                debug!(bytes = n, "dropping unterminated output fragment");
                break;
            }
            Err(err) => {
                warn!("reading captured output: {err}");
                break;
            }
        }
    }
}

/// Run `op` and collect everything it writes to its output port.
///
/// Returns whatever was collected even when the body fails.
#[tracing::instrument(level = "debug", skip_all, fields(frame = fm.name()))]
pub async fn capture_output(fm: &Frame, op: &Op) -> (Vec<Value>, Result<(), Exception>) {
    let config = fm.config();
    let (tx, rx) = mpsc::channel(config.capture_buffer_size.max(1));
    let (writer, reader) = pipe_stream(config.pipe_buffer_size);

    let mut sub = fm.fork("[output capture]");
    sub.set_port(PORT_OUTPUT, Port::capture(tx, writer));

    let buffer: Buffer = Arc::new(Mutex::new(Vec::new()));
    let values = tokio::spawn(drain_values(rx, buffer.clone()));
    let lines = tokio::spawn(drain_lines(reader, buffer.clone()));

    let result = op.exec(&sub).await;
    // Closes both streams so the drains see end-of-input.
    drop(sub);

    if let Err(err) = values.await {
        warn!("value drain failed: {err}");
    }
    if let Err(err) = lines.await {
        warn!("line drain failed: {err}");
    }

    let captured = std::mem::take(&mut *buffer.lock().unwrap_or_else(|e| e.into_inner()));
    debug!(count = captured.len(), ok = result.is_ok(), "output captured");
    (captured, result)
}

/// Run `op` and turn its outcome into a value: `$ok` or the exception.
#[tracing::instrument(level = "debug", skip_all, fields(frame = fm.name()))]
pub async fn capture_exception(fm: &Frame, op: &Op) -> Value {
    match op.exec(fm).await {
        Ok(()) => Value::Ok,
        Err(exc) => {
            debug!(error = %exc, "exception captured");
            Value::Exception(Arc::new(exc))
        }
    }
}
