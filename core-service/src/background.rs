//! Background-scheduled operations.
//!
//! `spawn_*` methods schedule an operation on the ambient tokio runtime and
//! return a [`BackgroundTask`] handle right away. `spawn_*_with` variants
//! additionally hand the result to a callback when the operation finishes.
//!
//! Each task runs under a child of the service's shutdown token, so
//! [`BackgroundTask::cancel`] stops that task's registration retry loop
//! without affecting other work. Unregister and send are single requests and
//! always run to completion once started.

use crate::error::{CoreError, Result};
use crate::PushService;
use core_push::{CancellationToken, PushMessage, RegisterOutcome, UnregisterReceipt};
use std::future::Future;
use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::debug;

/// Handle to an operation running in the background.
#[derive(Debug)]
pub struct BackgroundTask<T> {
    receiver: oneshot::Receiver<Result<T>>,
    cancel: CancellationToken,
}

impl<T> BackgroundTask<T> {
    /// Wait for the result.
    pub async fn wait(self) -> Result<T> {
        self.receiver.await.map_err(|_| dropped())?
    }

    /// Block the current thread until the result is available.
    ///
    /// Fails with [`CoreError::BlockingInAsyncContext`] inside a runtime.
    pub fn wait_blocking(self) -> Result<T> {
        if Handle::try_current().is_ok() {
            return Err(CoreError::BlockingInAsyncContext);
        }
        self.receiver.blocking_recv().map_err(|_| dropped())?
    }

    /// The result if the task has finished, `None` while it is still running.
    pub fn try_result(&mut self) -> Option<Result<T>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(dropped())),
        }
    }

    /// Ask the task to stop at its next cancellation point.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

fn dropped() -> CoreError {
    CoreError::TaskFailed("task ended without producing a result".to_string())
}

impl PushService {
    pub fn spawn_register(&self, token: impl Into<String>) -> Result<BackgroundTask<RegisterOutcome>> {
        let token = token.into();
        self.spawn_task(move |service, cancel| async move {
            service
                .registration
                .register(&token, &cancel)
                .await
                .map_err(CoreError::from)
        })
    }

    pub fn spawn_register_with<C>(
        &self,
        token: impl Into<String>,
        callback: C,
    ) -> Result<BackgroundTask<()>>
    where
        C: FnOnce(Result<RegisterOutcome>) + Send + 'static,
    {
        let token = token.into();
        self.spawn_with_callback(
            move |service, cancel| async move {
                service
                    .registration
                    .register(&token, &cancel)
                    .await
                    .map_err(CoreError::from)
            },
            callback,
        )
    }

    pub fn spawn_register_with_tags(
        &self,
        raw_tags: impl Into<String>,
    ) -> Result<BackgroundTask<RegisterOutcome>> {
        let raw_tags = raw_tags.into();
        self.spawn_task(move |service, cancel| async move {
            service
                .registration
                .register_with_tags(&raw_tags, &cancel)
                .await
                .map_err(CoreError::from)
        })
    }

    pub fn spawn_register_with_tags_with<C>(
        &self,
        raw_tags: impl Into<String>,
        callback: C,
    ) -> Result<BackgroundTask<()>>
    where
        C: FnOnce(Result<RegisterOutcome>) + Send + 'static,
    {
        let raw_tags = raw_tags.into();
        self.spawn_with_callback(
            move |service, cancel| async move {
                service
                    .registration
                    .register_with_tags(&raw_tags, &cancel)
                    .await
                    .map_err(CoreError::from)
            },
            callback,
        )
    }

    pub fn spawn_register_current_device(&self) -> Result<BackgroundTask<RegisterOutcome>> {
        self.spawn_task(|service, cancel| async move {
            service
                .registration
                .register_current_device(&cancel)
                .await
                .map_err(CoreError::from)
        })
    }

    pub fn spawn_register_current_device_with<C>(&self, callback: C) -> Result<BackgroundTask<()>>
    where
        C: FnOnce(Result<RegisterOutcome>) + Send + 'static,
    {
        self.spawn_with_callback(
            |service, cancel| async move {
                service
                    .registration
                    .register_current_device(&cancel)
                    .await
                    .map_err(CoreError::from)
            },
            callback,
        )
    }

    pub fn spawn_unregister(&self) -> Result<BackgroundTask<UnregisterReceipt>> {
        self.spawn_task(|service, _| async move { service.unregister().await })
    }

    pub fn spawn_unregister_with<C>(&self, callback: C) -> Result<BackgroundTask<()>>
    where
        C: FnOnce(Result<UnregisterReceipt>) + Send + 'static,
    {
        self.spawn_with_callback(
            |service, _| async move { service.unregister().await },
            callback,
        )
    }

    pub fn spawn_send_push(&self, message: PushMessage) -> Result<BackgroundTask<PushMessage>> {
        self.spawn_task(move |service, _| async move { service.send_push(&message).await })
    }

    pub fn spawn_send_push_with<C>(
        &self,
        message: PushMessage,
        callback: C,
    ) -> Result<BackgroundTask<()>>
    where
        C: FnOnce(Result<PushMessage>) + Send + 'static,
    {
        self.spawn_with_callback(
            move |service, _| async move { service.send_push(&message).await },
            callback,
        )
    }

    fn spawn_task<T, F, Fut>(&self, make: F) -> Result<BackgroundTask<T>>
    where
        T: Send + 'static,
        F: FnOnce(PushService, CancellationToken) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let handle = Handle::try_current().map_err(|_| CoreError::NoRuntime)?;
        let cancel = self.shutdown.child_token();
        let (sender, receiver) = oneshot::channel();
        let future = make(self.clone(), cancel.clone());

        handle.spawn(async move {
            if sender.send(future.await).is_err() {
                debug!("Background task result dropped; handle no longer held");
            }
        });

        Ok(BackgroundTask { receiver, cancel })
    }

    fn spawn_with_callback<T, F, Fut, C>(&self, make: F, callback: C) -> Result<BackgroundTask<()>>
    where
        T: Send + 'static,
        F: FnOnce(PushService, CancellationToken) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
        C: FnOnce(Result<T>) + Send + 'static,
    {
        self.spawn_task(move |service, cancel| {
            let future = make(service, cancel);
            async move {
                callback(future.await);
                Ok(())
            }
        })
    }
}
