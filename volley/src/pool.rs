use crate::client::{HttpClient, ReqwestClient};
use crate::error::EngineError;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};
use volley_core::TransportMode;

/// Fixed set of client handles given out in round-robin order.
///
/// The cursor lock is only held to read and advance the index; handles are cloned out and used
/// without any locking.
#[derive(Debug)]
pub struct ClientPool<C> {
    pub(crate) clients: Vec<C>,
    next: Mutex<usize>,
}

impl<C: HttpClient> ClientPool<C> {
    pub fn new(clients: Vec<C>) -> Result<Self, EngineError> {
        if clients.is_empty() {
            return Err(EngineError::EmptyPool);
        }

        Ok(Self {
            clients,
            next: Mutex::new(0),
        })
    }

    /// Next handle in round-robin order along with the index it was taken from.
    pub fn acquire(&self) -> (C, usize) {
        let index = {
            // The cursor is a plain index which is always valid, so a poisoned lock is safe to
            // keep using.
            let mut next = self.next.lock().unwrap_or_else(PoisonError::into_inner);
            let index = *next;
            *next = (index + 1) % self.clients.len();
            index
        };

        (self.clients[index].clone(), index)
    }
}

impl ClientPool<ReqwestClient> {
    pub fn build(
        size: usize,
        mode: TransportMode,
        timeout: Option<Duration>,
    ) -> Result<Self, EngineError> {
        if size == 0 {
            return Err(EngineError::EmptyPool);
        }

        let clients = (0..size)
            .map(|_| ReqwestClient::new(mode, timeout))
            .collect::<Result<Vec<_>, _>>()?;

        info!(num_clients = clients.len(), transport = %mode, "Built client pool");
        Self::new(clients)
    }
}
