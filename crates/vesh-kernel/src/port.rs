//! I/O ports.
//!
//! A frame has numbered ports (0 = input, 1 = output, 2 = errors). Each
//! port may carry a typed value stream, a byte stream, or both. Ports are
//! cheap to clone; a stream closes when the last clone of its port goes
//! away.

use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::error::ErrorKind;
use crate::pipe_stream::PipeWriter;
use crate::value::Value;

/// Where a port's bytes go.
#[derive(Debug, Clone)]
pub enum ByteSink {
    Pipe(Arc<PipeWriter>),
    Stdout,
    Stderr,
}

impl ByteSink {
    async fn write_all(&self, data: &[u8]) -> Result<(), ErrorKind> {
        match self {
            ByteSink::Pipe(pipe) => pipe.write_all(data).await?,
            ByteSink::Stdout => {
                let mut out = tokio::io::stdout();
                out.write_all(data).await?;
                out.flush().await?;
            }
            ByteSink::Stderr => {
                let mut err = tokio::io::stderr();
                err.write_all(data).await?;
                err.flush().await?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Port {
    pub values: Option<mpsc::Sender<Value>>,
    pub bytes: Option<ByteSink>,
}

impl Port {
    /// A port that discards everything.
    pub fn null() -> Self {
        Self::default()
    }

    /// A port feeding an output capture.
    pub fn capture(values: mpsc::Sender<Value>, bytes: PipeWriter) -> Self {
        Self {
            values: Some(values),
            bytes: Some(ByteSink::Pipe(Arc::new(bytes))),
        }
    }

    pub fn stdout() -> Self {
        Self {
            values: None,
            bytes: Some(ByteSink::Stdout),
        }
    }

    pub fn stderr() -> Self {
        Self {
            values: None,
            bytes: Some(ByteSink::Stderr),
        }
    }

    /// Emit a value. Without a value stream the value is written to the
    /// byte stream as a line; without either it is dropped.
    pub async fn put(&self, value: Value) -> Result<(), ErrorKind> {
        if let Some(tx) = &self.values {
            return tx.send(value).await.map_err(|_| ErrorKind::PortClosed);
        }
        if let Some(bytes) = &self.bytes {
            return bytes.write_all(format!("▶ {value}\n").as_bytes()).await;
        }
        Ok(())
    }

    /// Write bytes; dropped when the port has no byte stream.
    pub async fn write(&self, data: &[u8]) -> Result<(), ErrorKind> {
        match &self.bytes {
            Some(bytes) => bytes.write_all(data).await,
            None => Ok(()),
        }
    }
}
