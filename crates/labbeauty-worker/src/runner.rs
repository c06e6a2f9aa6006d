use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

/// Runner for fire-and-forget and awaitable background tasks.
///
/// Cloning is cheap; clones share the same set of tracked tasks.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

/// Awaitable outcome of a background task.
///
/// `None` means the task panicked or was cancelled. Any number of clones may wait
/// on the same task.
pub struct TaskHandle<T: Clone> {
    name: &'static str,
    outcome: Shared<BoxFuture<'static, Option<T>>>,
}

impl<T: Clone> Clone for TaskHandle<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            outcome: self.outcome.clone(),
        }
    }
}

impl<T> TaskHandle<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Wait for the task to finish.
    pub async fn wait(&self) -> Option<T> {
        self.outcome.clone().await
    }

    /// The outcome if the task has finished and someone already observed it.
    pub fn peek(&self) -> Option<Option<T>> {
        self.outcome.peek().cloned()
    }
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            tracker: TaskTracker::new(),
        }
    }

    /// Run `fut` in the background. A panic inside it is caught and logged; it never
    /// reaches the caller or other tasks.
    pub fn spawn<T, F>(&self, name: &'static str, fut: F) -> TaskHandle<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        let span = tracing::debug_span!("background_task", task = name);
        let join = self.tracker.spawn(
            async move {
                match AssertUnwindSafe(fut).catch_unwind().await {
                    Ok(value) => Some(value),
                    Err(payload) => {
                        tracing::error!(
                            task = name,
                            panic = %panic_message(payload.as_ref()),
                            "Background task panicked"
                        );
                        None
                    }
                }
            }
            .instrument(span),
        );

        let outcome = async move {
            match join.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(task = name, error = %e, "Background task was cancelled");
                    None
                }
            }
        }
        .boxed()
        .shared();

        TaskHandle { name, outcome }
    }

    /// Run `f` once `prerequisite` has finished, handing it the prerequisite's outcome.
    pub fn spawn_after<P, T, F, Fut>(
        &self,
        name: &'static str,
        prerequisite: &TaskHandle<P>,
        f: F,
    ) -> TaskHandle<T>
    where
        P: Clone + Send + Sync + 'static,
        T: Clone + Send + Sync + 'static,
        F: FnOnce(Option<P>) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let prerequisite = prerequisite.clone();
        self.spawn(name, async move {
            let outcome = prerequisite.wait().await;
            f(outcome).await
        })
    }

    /// Number of tasks still running.
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Wait for in-flight tasks, giving up after `deadline`. Returns whether
    /// everything finished. Tasks spawned while draining are waited for too.
    pub async fn drain(&self, deadline: Duration) -> bool {
        self.tracker.close();

        let pending = self.tracker.len();
        if pending > 0 {
            tracing::info!(
                pending,
                deadline_secs = deadline.as_secs_f64(),
                "Draining background tasks"
            );
        }

        match tokio::time::timeout(deadline, self.tracker.wait()).await {
            Ok(()) => {
                tracing::info!("Background tasks drained");
                true
            }
            Err(_) => {
                tracing::warn!(
                    remaining = self.tracker.len(),
                    "Background tasks still running at shutdown deadline"
                );
                false
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
