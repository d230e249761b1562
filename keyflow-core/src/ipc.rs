use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::{
    fs,
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use xdg::BaseDirectories;

use crate::errors::{Error, Result};

/// Requests a CLI invocation can make of a running daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Control {
    Enable,
    Disable,
    Reload,
    Stats,
    Kill,
}

pub struct Pipe {
    pipe_file: PathBuf,
    rx: mpsc::UnboundedReceiver<Control>,
}

impl Drop for Pipe {
    fn drop(&mut self) {
        use std::os::unix::fs::OpenOptionsExt;
        self.rx.close();

        // Open fifo for write to unblock pending open for read operation that prevents tokio runtime
        // from shutting down.
        let _ = std::fs::OpenOptions::new()
            .write(true)
            .custom_flags(nix::fcntl::OFlag::O_NONBLOCK.bits())
            .open(self.pipe_file.clone());
    }
}

impl Pipe {
    /// Create and listen to the named pipe.
    /// # Errors
    ///
    /// Will error if unable to `mkfifo`, likely a filesystem issue
    /// such as inadequate permissions.
    pub async fn new(pipe_file: PathBuf) -> Result<Self> {
        let _ = fs::remove_file(pipe_file.as_path()).await;
        nix::unistd::mkfifo(&pipe_file, nix::sys::stat::Mode::S_IRWXU)?;

        let path = pipe_file.clone();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while !tx.is_closed() {
                read_from_pipe(&path, &tx).await;
            }
            fs::remove_file(path).await.ok();
        });

        Ok(Self { pipe_file, rx })
    }

    pub fn pipe_name() -> PathBuf {
        let display = std::env::var("DISPLAY")
            .ok()
            .and_then(|d| d.rsplit_once(':').map(|(_, r)| r.to_owned()))
            .unwrap_or_else(|| "0".to_string());

        PathBuf::from(format!("control-{}.pipe", display))
    }

    /// Location of the pipe in the xdg runtime directory.
    ///
    /// # Errors
    ///
    /// Fails when there is no runtime directory or it cannot be created.
    pub fn runtime_file() -> Result<PathBuf> {
        let base = BaseDirectories::with_prefix(crate::KEYFLOW_DIR_NAME);
        Ok(base.place_runtime_file(Self::pipe_name())?)
    }

    pub async fn get_next_control(&mut self) -> Option<Control> {
        self.rx.recv().await
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.pipe_file
    }
}

/// Writes one request to the pipe of a running daemon.
///
/// # Errors
///
/// Fails without blocking when no daemon is listening on `pipe_file`.
pub fn send(pipe_file: &Path, control: Control) -> Error {
    use std::os::unix::fs::OpenOptionsExt;
    let mut pipe = std::fs::OpenOptions::new()
        .write(true)
        .custom_flags(nix::fcntl::OFlag::O_NONBLOCK.bits())
        .open(pipe_file)?;
    writeln!(pipe, "{}", ron::to_string(&control)?)?;
    Ok(())
}

async fn read_from_pipe(pipe_file: &Path, tx: &mpsc::UnboundedSender<Control>) {
    if let Ok(file) = fs::File::open(pipe_file).await {
        let mut lines = BufReader::new(file).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            match ron::from_str::<Control>(line.trim()) {
                Ok(control) => {
                    if let Err(err) = tx.send(control) {
                        tracing::error!("{}", err);
                    }
                }
                Err(err) => tracing::warn!("Ignoring control message {:?}: {}", line, err),
            }
        }
    }
}
