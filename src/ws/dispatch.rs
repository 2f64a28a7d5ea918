//! Event dispatch: hands frames to the application handler.
//!
//! Concurrent mode spawns one task per frame into a `JoinSet` so the reader
//! never waits on a handler; a semaphore acquired inside each task bounds how
//! many handlers run at once. Sequential mode awaits the handler inline.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::ws::{Handler, HandlerResult, ServerMessage};

pub(crate) struct Dispatcher {
    handler: Handler,
    concurrent: bool,
    tasks: JoinSet<HandlerResult>,
    permits: Arc<Semaphore>,
}

impl Dispatcher {
    pub(crate) fn new(handler: Handler, concurrent: bool, max_in_flight: usize) -> Self {
        Self {
            handler,
            concurrent,
            tasks: JoinSet::new(),
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    pub(crate) async fn dispatch(&mut self, msg: ServerMessage) {
        let handler = self.handler.clone();
        if self.concurrent {
            let permits = self.permits.clone();
            self.tasks.spawn(async move {
                let _permit = permits.acquire_owned().await?;
                invoke(handler, msg).await
            });
        } else {
            report(invoke(handler, msg).await);
        }
    }

    /// Collect finished tasks, logging failures. Returns how many finished.
    pub(crate) fn harvest(&mut self) -> usize {
        let mut finished = 0;
        while let Some(joined) = self.tasks.try_join_next() {
            finished += 1;
            match joined {
                Ok(result) => report(result),
                Err(e) if e.is_panic() => tracing::error!("Event handler panicked"),
                Err(_) => {}
            }
        }
        finished
    }

    /// Tasks spawned and not yet harvested.
    pub(crate) fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Drop every outstanding task without waiting for it.
    pub(crate) fn abandon(&mut self) {
        let pending = self.in_flight();
        if pending > 0 {
            tracing::debug!("Dropping {} in-flight handler task(s)", pending);
        }
        self.tasks.abort_all();
        self.tasks.detach_all();
    }
}

async fn invoke(handler: Handler, msg: ServerMessage) -> HandlerResult {
    match handler {
        Handler::Async(f) => AssertUnwindSafe(async move { f(msg).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err("event handler panicked".into())),
        Handler::Blocking(f) => match tokio::task::spawn_blocking(move || f(msg)).await {
            Ok(result) => result,
            Err(e) => Err(e.into()),
        },
    }
}

fn report(result: HandlerResult) {
    if let Err(e) = result {
        tracing::warn!("Event handler failed: {}", e);
    }
}
