//! Incremental disclosure of appended story text.
//!
//! One character lands every tick until the payload is exhausted. The task
//! is cooperative: it checks its cancellation token before every unit, so a
//! REPLACE arriving mid-reveal stops the pen without rolling back what was
//! already revealed.

use super::state::SessionState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const INITIAL_DELAY: Duration = Duration::from_millis(20);
const TICK: Duration = Duration::from_millis(5);

pub struct RevealScheduler {
    state: Arc<Mutex<SessionState>>,
    initial_delay: Duration,
    tick: Duration,
    task: Option<JoinHandle<()>>,
    token: CancellationToken,
}

impl RevealScheduler {
    pub fn new(state: Arc<Mutex<SessionState>>) -> Self {
        Self::with_pacing(state, INITIAL_DELAY, TICK)
    }

    pub fn with_pacing(
        state: Arc<Mutex<SessionState>>,
        initial_delay: Duration,
        tick: Duration,
    ) -> Self {
        Self {
            state,
            initial_delay,
            tick,
            task: None,
            token: CancellationToken::new(),
        }
    }

    /// Begins revealing `text` appended to the canonical story. Any reveal
    /// still running is cancelled first — only one may be active.
    pub async fn start(&mut self, text: String) {
        self.cancel().await;

        let token = CancellationToken::new();
        self.token = token.clone();

        let state = Arc::clone(&self.state);
        let initial_delay = self.initial_delay;
        let tick = self.tick;

        self.task = Some(tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => return,
                () = tokio::time::sleep(initial_delay) => {}
            }
            for ch in text.chars() {
                // Cancellation is observed before each unit, not just at start.
                if token.is_cancelled() {
                    return;
                }
                state.lock().await.reveal_char(ch);
                tokio::select! {
                    () = token.cancelled() => return,
                    () = tokio::time::sleep(tick) => {}
                }
            }
        }));
    }

    /// Stops an active reveal mid-sequence without rolling back revealed
    /// characters. Safe to call when nothing is running.
    pub async fn cancel(&mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Waits for the active reveal to run to completion.
    pub async fn wait_idle(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}
