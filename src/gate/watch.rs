//! Read-only projection of the gate state.

use tokio::sync::watch;

use super::{GateState, NavigationMode};
use crate::error::GateError;
use crate::Result;

/// Observer of a running gate.
///
/// Cloning is cheap; every clone tracks changes independently.
#[derive(Debug, Clone)]
pub struct NavigationWatch {
    rx: watch::Receiver<GateState>,
}

impl NavigationWatch {
    pub(crate) fn new(rx: watch::Receiver<GateState>) -> Self {
        Self { rx }
    }

    /// Latest gate state.
    pub fn state(&self) -> GateState {
        self.rx.borrow().clone()
    }

    /// Latest gate state, marked as seen so [`NavigationWatch::changed`]
    /// waits for the next one.
    pub fn latest(&mut self) -> GateState {
        self.rx.borrow_and_update().clone()
    }

    /// Latest navigation mode.
    pub fn mode(&self) -> NavigationMode {
        self.rx.borrow().navigation()
    }

    /// Wait until the state changes and return the new value.
    ///
    /// Fails with [`GateError::GateStopped`] once the gate is torn down.
    pub async fn changed(&mut self) -> Result<GateState> {
        self.rx.changed().await.map_err(|_| GateError::GateStopped)?;
        Ok(self.rx.borrow_and_update().clone())
    }

    /// Wait until the state satisfies `predicate`, checking the current
    /// value first.
    pub async fn wait_for<F>(&mut self, predicate: F) -> Result<GateState>
    where
        F: FnMut(&GateState) -> bool,
    {
        let state = self
            .rx
            .wait_for(predicate)
            .await
            .map_err(|_| GateError::GateStopped)?;
        Ok(state.clone())
    }

    /// Wait for a specific navigation mode.
    pub async fn wait_for_mode(&mut self, mode: NavigationMode) -> Result<GateState> {
        self.wait_for(|state| state.navigation() == mode).await
    }
}
