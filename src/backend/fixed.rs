//! In-memory backend serving a fixed response.
//!
//! Used by tests and as a stand-in upstream authority. Clones share state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::backend::BackendError;
use crate::model::ConfigBlock;
use crate::protocol::ConfigResponse;

#[derive(Clone)]
pub struct FixedBackend {
    response: Arc<ArcSwap<ConfigResponse>>,
    closed: Arc<AtomicBool>,
}

impl FixedBackend {
    pub fn new(response: ConfigResponse) -> Self {
        Self {
            response: Arc::new(ArcSwap::from_pointee(response)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_block(block: &ConfigBlock, suggested_wait_time_seconds: i32) -> Self {
        Self::new(ConfigResponse::from_block(block, suggested_wait_time_seconds))
    }

    /// Replace the served response.
    pub fn set_response(&self, response: ConfigResponse) {
        self.response.store(Arc::new(response));
    }

    pub fn set_block(&self, block: &ConfigBlock, suggested_wait_time_seconds: i32) {
        self.set_response(ConfigResponse::from_block(block, suggested_wait_time_seconds));
    }

    pub fn suggested_wait_time(&self) -> i32 {
        self.response.load().suggested_wait_time_seconds
    }

    pub fn fingerprint(&self) -> Result<Vec<u8>, BackendError> {
        self.check_open()?;
        Ok(self.response.load().fingerprint.clone())
    }

    pub fn build_config_response(&self) -> Result<ConfigResponse, BackendError> {
        self.check_open()?;
        Ok(ConfigResponse::clone(&self.response.load()))
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn check_open(&self) -> Result<(), BackendError> {
        if self.closed.load(Ordering::Acquire) {
            Err(BackendError::Closed)
        } else {
            Ok(())
        }
    }
}
