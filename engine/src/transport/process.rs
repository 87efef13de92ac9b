use super::{ChannelEvent, LineSink, SinkSlot, SubscriptionToken, Transport, TransportError};
use crate::uci::UciCommand;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::task::JoinHandle;

/// Environment variable naming the engine binary to run.
pub const ENGINE_PATH_ENV: &str = "KNIGHTLINE_ENGINE_PATH";

/// How long a process gets to honour `quit` before it is killed.
const QUIT_GRACE: Duration = Duration::from_secs(1);

/// Transport over a child process's stdin and stdout.
pub struct ProcessTransport {
    path: Option<PathBuf>,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    reader: Option<JoinHandle<()>>,
    sink: SinkSlot,
}

impl ProcessTransport {
    /// Create a transport for the engine at `path`, or for whatever
    /// [`find_engine_path`] discovers at launch time when `path` is `None`.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            child: None,
            stdin: None,
            reader: None,
            sink: SinkSlot::default(),
        }
    }

    fn resolve_path(&self) -> Result<PathBuf, TransportError> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => find_engine_path().ok_or(TransportError::EngineNotFound),
        }
    }

    fn spawn_reader(&self, stdout: ChildStdout) -> JoinHandle<()> {
        let sink = self.sink.clone();
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        tracing::warn!("Engine stdout EOF - engine closed");
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim_end();
                        if trimmed.is_empty() {
                            continue;
                        }
                        tracing::trace!("UCI << {}", trimmed);
                        if !sink.deliver(ChannelEvent::Line(trimmed.to_string())).await {
                            tracing::trace!("No subscriber, dropping engine line");
                        }
                    }
                    Err(e) => {
                        tracing::error!("Error reading from engine stdout: {}", e);
                        break;
                    }
                }
            }

            sink.deliver(ChannelEvent::Closed).await;
            tracing::info!("Output reader task exiting");
        })
    }
}

impl Default for ProcessTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl Transport for ProcessTransport {
    #[tracing::instrument(level = "info", skip(self))]
    async fn launch(&mut self) -> Result<(), TransportError> {
        if self.is_running() {
            tracing::debug!("Engine process already running, not spawning another");
            return Ok(());
        }

        let path = self.resolve_path()?;
        tracing::info!("Spawning engine at {:?}", path);

        let mut process = tokio::process::Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!("Failed to spawn engine: {}", e);
                TransportError::Spawn(e)
            })?;

        let stdin = process.stdin.take().ok_or(TransportError::MissingPipe("stdin"))?;
        let stdout = process
            .stdout
            .take()
            .ok_or(TransportError::MissingPipe("stdout"))?;

        self.reader = Some(self.spawn_reader(stdout));
        self.stdin = Some(stdin);
        self.child = Some(process);
        tracing::info!("Engine process spawned");
        Ok(())
    }

    fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    async fn send(&mut self, line: &str) -> Result<(), TransportError> {
        if !self.is_running() {
            return Err(TransportError::NotRunning);
        }
        let stdin = self.stdin.as_mut().ok_or(TransportError::NotRunning)?;

        tracing::trace!("UCI >> {}", line);
        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');
        stdin.write_all(&bytes).await.map_err(|e| {
            tracing::error!("Failed to write to engine stdin: {}", e);
            TransportError::Write(e)
        })?;
        stdin.flush().await.map_err(TransportError::Write)
    }

    fn subscribe(&mut self, sink: LineSink) -> Result<SubscriptionToken, TransportError> {
        self.sink.install(sink)
    }

    fn unsubscribe(&mut self, token: SubscriptionToken) {
        if !self.sink.revoke(token) {
            tracing::debug!("Ignoring stale subscription token {:?}", token);
        }
    }

    #[tracing::instrument(level = "info", skip(self))]
    async fn terminate(&mut self) -> Result<(), TransportError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        if let Some(mut stdin) = self.stdin.take() {
            let quit = format!("{}\n", UciCommand::Quit);
            let _ = stdin.write_all(quit.as_bytes()).await;
            let _ = stdin.flush().await;
        }

        match tokio::time::timeout(QUIT_GRACE, child.wait()).await {
            Ok(Ok(status)) => tracing::info!("Engine exited with {}", status),
            Ok(Err(e)) => tracing::warn!("Failed to wait for engine: {}", e),
            Err(_) => {
                tracing::warn!("Engine ignored quit, killing it");
                if let Err(e) = child.kill().await {
                    tracing::error!("Failed to kill engine: {}", e);
                }
            }
        }

        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        Ok(())
    }
}

/// Find an engine executable.
///
/// Priority:
/// 1. `KNIGHTLINE_ENGINE_PATH` env variable if set
/// 2. Common Stockfish install locations
/// 3. `stockfish` anywhere on `PATH`
pub fn find_engine_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(ENGINE_PATH_ENV) {
        return Some(PathBuf::from(path));
    }

    let paths = [
        "/usr/local/bin/stockfish",
        "/usr/bin/stockfish",
        "/opt/homebrew/bin/stockfish",
        "/usr/games/stockfish",
    ];
    if let Some(found) = paths.iter().map(Path::new).find(|p| p.is_file()) {
        return Some(found.to_path_buf());
    }

    let search_path = std::env::var_os("PATH")?;
    std::env::split_paths(&search_path)
        .map(|dir| dir.join("stockfish"))
        .find(|candidate| candidate.is_file())
}
