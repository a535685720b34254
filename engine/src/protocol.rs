//! Line-oriented protocol primitives over an engine subprocess's stdio.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, ChildStdout};

use crate::EngineError;

/// Owns an engine's standard streams and speaks the line protocol on them.
///
/// The owning lifecycle controller is the only component that reads or
/// writes these streams; the protocol is stateful and non-reentrant.
pub struct ProtocolDriver {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl ProtocolDriver {
    pub fn new(stdin: ChildStdin, stdout: ChildStdout) -> Self {
        Self {
            stdin,
            stdout: BufReader::new(stdout),
        }
    }

    /// Write one command line and flush it to the engine.
    pub async fn send_command(&mut self, command: &str) -> Result<(), EngineError> {
        tracing::trace!(command, "uci >>");
        self.stdin
            .write_all(command.as_bytes())
            .await
            .map_err(EngineError::WriteFailed)?;
        self.stdin
            .write_all(b"\n")
            .await
            .map_err(EngineError::WriteFailed)?;
        self.stdin.flush().await.map_err(EngineError::WriteFailed)?;
        Ok(())
    }

    /// Read one trimmed line; `None` once the engine closes its output.
    pub async fn read_line(&mut self) -> Result<Option<String>, EngineError> {
        let mut line = String::new();
        match self.stdout.read_line(&mut line).await {
            Ok(0) => Ok(None),
            Ok(_) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    tracing::trace!(response = trimmed, "uci <<");
                }
                Ok(Some(trimmed.to_string()))
            }
            Err(_) => Err(EngineError::StreamClosed),
        }
    }

    /// Collect lines until one starts with `sentinel`; the sentinel line is
    /// included in the returned collection.
    pub async fn wait_for(
        &mut self,
        sentinel: &str,
        deadline: Duration,
    ) -> Result<Vec<String>, EngineError> {
        self.collect_until(sentinel, |_| true, deadline).await
    }

    /// Like [`ProtocolDriver::wait_for`], but retains only lines accepted
    /// by `capture` plus the terminal line. Long searches emit far more
    /// chatter than progress, so discarding early bounds memory.
    pub async fn read_until_terminal<F>(
        &mut self,
        terminal: &str,
        capture: F,
        deadline: Duration,
    ) -> Result<Vec<String>, EngineError>
    where
        F: Fn(&str) -> bool,
    {
        self.collect_until(terminal, capture, deadline).await
    }

    async fn collect_until<F>(
        &mut self,
        sentinel: &str,
        capture: F,
        deadline: Duration,
    ) -> Result<Vec<String>, EngineError>
    where
        F: Fn(&str) -> bool,
    {
        let collect = async {
            let mut lines = Vec::new();
            loop {
                match self.read_line().await? {
                    Some(line) => {
                        if line.starts_with(sentinel) {
                            lines.push(line);
                            return Ok(lines);
                        }
                        if !line.is_empty() && capture(&line) {
                            lines.push(line);
                        }
                    }
                    None => return Err(EngineError::StreamClosed),
                }
            }
        };
        tokio::time::timeout(deadline, collect)
            .await
            .map_err(|_| EngineError::ProtocolTimeout {
                sentinel: sentinel.to_string(),
                waited_ms: deadline.as_millis() as u64,
            })?
    }
}
