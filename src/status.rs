//! Non-blocking status boundary. The orchestrator publishes a snapshot of
//! the pipeline state at every transition; pollers read the latest one
//! without ever blocking the run.

use tokio::sync::watch;

use crate::domain::phase::PipelineState;

#[derive(Debug, Clone)]
pub struct StatusHandle {
    rx: watch::Receiver<PipelineState>,
}

impl StatusHandle {
    pub(crate) fn new(rx: watch::Receiver<PipelineState>) -> Self {
        StatusHandle { rx }
    }

    /// Latest published state.
    pub fn snapshot(&self) -> PipelineState {
        self.rx.borrow().clone()
    }

    /// Wait until the orchestrator publishes a new state. Returns the
    /// fresh snapshot, or `None` once the run is gone.
    pub async fn changed(&mut self) -> Option<PipelineState> {
        match self.rx.changed().await {
            Ok(()) => Some(self.rx.borrow_and_update().clone()),
            Err(_) => None,
        }
    }
}
