//! Progress indicator for network calls
//!
//! Drawn on stderr and only when stderr is a terminal, so piped output stays clean.

use is_terminal::IsTerminal;
use std::io::{self, Write};
use std::time::Duration;
use tokio::sync::oneshot;

const FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const FRAME_INTERVAL: Duration = Duration::from_millis(80);

/// Animates until dropped
pub struct Spinner {
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    pub fn start(message: impl Into<String>) -> Self {
        if !io::stderr().is_terminal() {
            return Self {
                stop_tx: None,
                handle: None,
            };
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(Self::animate(message.into(), stop_rx));
        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    fn stop(&mut self) {
        let was_running = self.handle.is_some();
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        if was_running {
            clear_line();
        }
    }

    async fn animate(message: String, mut stop_rx: oneshot::Receiver<()>) {
        let mut stderr = io::stderr();
        for frame in FRAMES.iter().cycle() {
            let _ = write!(stderr, "\r{} {}", frame, message);
            let _ = stderr.flush();

            tokio::select! {
                _ = tokio::time::sleep(FRAME_INTERVAL) => {}
                _ = &mut stop_rx => break,
            }
        }
        clear_line();
    }
}

fn clear_line() {
    let mut stderr = io::stderr();
    let _ = write!(stderr, "\r\x1b[K");
    let _ = stderr.flush();
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Runs `future` with a spinner showing `message`
pub async fn with_spinner<F, T>(message: impl Into<String>, future: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let _spinner = Spinner::start(message);
    future.await
}
