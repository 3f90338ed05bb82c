//! Blocking entry points for hosts that do not run an async runtime.
//!
//! Each call drives the async operation to completion on a lightweight
//! current-thread runtime. Calling from inside a runtime fails with
//! [`CoreError::BlockingInAsyncContext`] instead of deadlocking the caller.

use crate::error::{CoreError, Result};
use crate::PushService;
use core_push::{PushMessage, RegisterOutcome, UnregisterReceipt};
use std::future::Future;
use tokio::runtime::{Builder, Handle};

#[derive(Debug, Clone)]
pub struct BlockingPushService {
    service: PushService,
}

impl BlockingPushService {
    pub(crate) fn new(service: PushService) -> Self {
        Self { service }
    }

    pub fn register(&self, token: &str) -> Result<RegisterOutcome> {
        block_on(self.service.register(token))?
    }

    pub fn register_with_tags(&self, raw_tags: &str) -> Result<RegisterOutcome> {
        block_on(self.service.register_with_tags(raw_tags))?
    }

    pub fn register_current_device(&self) -> Result<RegisterOutcome> {
        block_on(self.service.register_current_device())?
    }

    pub fn register_if_needed(&self, token: &str) -> Result<RegisterOutcome> {
        block_on(self.service.register_if_needed(token))?
    }

    pub fn unregister(&self) -> Result<UnregisterReceipt> {
        block_on(self.service.unregister())?
    }

    pub fn send_push(&self, message: &PushMessage) -> Result<PushMessage> {
        block_on(self.service.send_push(message))?
    }
}

/// Runs the provided future to completion on a fresh current-thread runtime.
pub(crate) fn block_on<F>(future: F) -> Result<F::Output>
where
    F: Future,
{
    if Handle::try_current().is_ok() {
        return Err(CoreError::BlockingInAsyncContext);
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CoreError::InitializationFailed(format!("failed to build runtime: {e}")))?;

    Ok(runtime.block_on(future))
}
