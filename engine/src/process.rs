//! Lifecycle control for one engine subprocess.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};

use crate::protocol::ProtocolDriver;
use crate::EngineError;

/// How long `stop()` waits for a graceful exit before killing the process.
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Protocol-visible lifecycle of one engine process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    NotStarted,
    Starting,
    Ready,
    Analyzing,
    Stopping,
    Stopped,
    /// The process died underneath us; a fresh `start()` is required.
    Crashed,
}

/// Owns one engine subprocess and its streams, and drives it through the
/// lifecycle state machine. Nothing else mutates the state or touches the
/// streams.
pub struct EngineProcess {
    label: String,
    child: Option<Child>,
    driver: Option<ProtocolDriver>,
    state: EngineState,
}

impl EngineProcess {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            child: None,
            driver: None,
            state: EngineState::NotStarted,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: EngineState) {
        self.state = state;
    }

    /// Spawn the engine and run the UCI handshake: `uci` → `uciok`, one
    /// `setoption` per configured option, then `isready` → `readyok`.
    ///
    /// An already-running process is stopped first. On any handshake
    /// failure the child is killed and the handle cleared.
    pub async fn start(
        &mut self,
        executable: &Path,
        options: &[(String, String)],
        handshake_deadline: Duration,
    ) -> Result<(), EngineError> {
        if self.child.is_some() {
            tracing::warn!(engine = %self.label, "already running, restarting");
            self.stop().await;
        }
        self.state = EngineState::Starting;
        tracing::info!(engine = %self.label, path = %executable.display(), "starting engine");

        let mut child = Command::new(executable)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                self.state = EngineState::NotStarted;
                EngineError::StartupFailed(format!("failed to spawn {}: {e}", executable.display()))
            })?;

        let stdio = child.stdin.take().zip(child.stdout.take());
        let Some((stdin, stdout)) = stdio else {
            let _ = child.kill().await;
            self.state = EngineState::NotStarted;
            return Err(EngineError::StartupFailed(
                "engine stdio was not piped".to_string(),
            ));
        };
        let mut driver = ProtocolDriver::new(stdin, stdout);

        match handshake(&mut driver, options, handshake_deadline).await {
            Ok(()) => {
                self.child = Some(child);
                self.driver = Some(driver);
                self.state = EngineState::Ready;
                tracing::info!(engine = %self.label, "engine ready");
                Ok(())
            }
            Err(e) => {
                let _ = child.kill().await;
                self.state = EngineState::NotStarted;
                Err(EngineError::StartupFailed(format!("handshake failed: {e}")))
            }
        }
    }

    /// Graceful `quit`, bounded grace wait, forced kill on timeout. Never
    /// fails; always ends in `Stopped` with handles cleared. Calling it
    /// again afterwards is a no-op.
    pub async fn stop(&mut self) {
        self.stop_with_grace(STOP_GRACE).await;
    }

    pub async fn stop_with_grace(&mut self, grace: Duration) {
        let Some(mut child) = self.child.take() else {
            self.driver = None;
            self.state = EngineState::Stopped;
            return;
        };
        self.state = EngineState::Stopping;
        tracing::info!(engine = %self.label, "stopping engine");

        if let Some(driver) = self.driver.as_mut() {
            if let Err(e) = driver.send_command("quit").await {
                tracing::debug!(engine = %self.label, error = %e, "quit not delivered");
            }
        }

        match tokio::time::timeout(grace, child.wait()).await {
            Ok(Ok(status)) => {
                tracing::debug!(engine = %self.label, %status, "engine exited")
            }
            Ok(Err(e)) => tracing::warn!(engine = %self.label, error = %e, "wait failed"),
            Err(_) => {
                tracing::warn!(engine = %self.label, "quit timed out, killing process");
                let _ = child.kill().await;
            }
        }

        self.driver = None;
        self.state = EngineState::Stopped;
    }

    /// Liveness of the OS process, independent of protocol readiness.
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    pub fn driver(&mut self) -> Result<&mut ProtocolDriver, EngineError> {
        self.driver.as_mut().ok_or(EngineError::NotRunning)
    }

    /// `isready` → `readyok` round trip, used for health probes and
    /// post-reset synchronization.
    pub async fn probe_ready(&mut self, deadline: Duration) -> Result<(), EngineError> {
        let driver = self.driver()?;
        driver.send_command("isready").await?;
        driver.wait_for("readyok", deadline).await?;
        Ok(())
    }

    /// `ucinewgame` plus a readiness probe, clearing search state carried
    /// over from earlier positions.
    pub async fn reset_game(&mut self, deadline: Duration) -> Result<(), EngineError> {
        self.driver()?.send_command("ucinewgame").await?;
        self.probe_ready(deadline).await
    }

    /// Dispatch one search and collect its protocol lines up to the
    /// terminal `bestmove` line, keeping only `info` progress lines.
    pub async fn search(
        &mut self,
        fen: &str,
        go_command: &str,
        deadline: Duration,
    ) -> Result<Vec<String>, EngineError> {
        let driver = self.driver()?;
        driver.send_command(&format!("position fen {fen}")).await?;
        driver.send_command(go_command).await?;
        driver
            .read_until_terminal("bestmove", |line| line.starts_with("info"), deadline)
            .await
    }
}

async fn handshake(
    driver: &mut ProtocolDriver,
    options: &[(String, String)],
    deadline: Duration,
) -> Result<(), EngineError> {
    driver.send_command("uci").await?;
    driver.wait_for("uciok", deadline).await?;
    for (name, value) in options {
        driver
            .send_command(&format!("setoption name {name} value {value}"))
            .await?;
    }
    driver.send_command("isready").await?;
    driver.wait_for("readyok", deadline).await?;
    Ok(())
}
