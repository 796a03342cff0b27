use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bridge::WindowBackend;

use super::loop_worker::{tracking_loop, TrackerContext};

/// Owns the lifecycle of the polling loop task.
pub struct TrackerController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl TrackerController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start<W: WindowBackend + 'static>(&mut self, ctx: TrackerContext<W>) -> Result<()> {
        if self.handle.is_some() {
            bail!("tracking already active");
        }

        info!("starting window tracking loop");
        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        let handle = tokio::spawn(tracking_loop(ctx, token_clone));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("tracking loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Default for TrackerController {
    fn default() -> Self {
        Self::new()
    }
}
