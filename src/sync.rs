//! Background jobs and the reload-after-mutation discipline shared by panels.
//!
//! A panel action never patches its cached resource by hand. It returns a
//! [`Job`] that runs the collaborator call and, when the call succeeds,
//! refetches the whole resource through the panel's [`Refresh`] impl. The UI
//! task later applies the resulting event, replacing the cache wholesale.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::api::{ApiResult, SettingsApi};

/// The collaborator as shared by panels and their jobs.
pub type SharedApi = Arc<dyn SettingsApi>;

/// A collaborator round-trip that resolves to a panel event.
pub type Job<E> = BoxFuture<'static, E>;

/// Whether a panel's cache holds collaborator data yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Not mounted yet.
    Idle,
    Loading,
    Ready,
    /// The initial fetch failed and built-in defaults are shown.
    Fallback,
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Idle | LoadState::Loading)
    }

    /// State after a failed fetch: data that was loaded once stays `Ready`.
    pub fn after_failure(self) -> Self {
        match self {
            LoadState::Ready => LoadState::Ready,
            _ => LoadState::Fallback,
        }
    }
}

/// A panel whose cache can be replaced from the collaborator in one step.
pub trait Refresh {
    type Snapshot: Send + 'static;

    /// Fetches everything the panel caches. Failures are carried inside the
    /// snapshot so `replace` can decide what to keep.
    fn fetch(api: SharedApi) -> BoxFuture<'static, Self::Snapshot>;

    /// Replaces the cache wholesale.
    fn replace(&mut self, snapshot: Self::Snapshot);
}

/// Runs `mutation`, and only if it succeeds, refetches the panel's resource.
pub async fn mutate_then_refresh<P, T, F>(api: SharedApi, mutation: F) -> ApiResult<(T, P::Snapshot)>
where
    P: Refresh,
    F: Future<Output = ApiResult<T>>,
{
    let value = mutation.await?;
    let snapshot = P::fetch(api).await;
    Ok((value, snapshot))
}

/// Ids with an action in flight. Only the matching control is disabled.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    ids: BTreeSet<String>,
}

impl InFlight {
    /// Marks `id` busy. Returns `false` if it already was.
    pub fn begin(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    pub fn finish(&mut self, id: &str) {
        self.ids.remove(id);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Spawns jobs on the tokio runtime and hands their events back to the UI
/// task through an unbounded channel.
pub struct JobRunner<E> {
    events_tx: UnboundedSender<E>,
    events_rx: UnboundedReceiver<E>,
    pending: usize,
}

impl<E: Send + 'static> JobRunner<E> {
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            events_tx,
            events_rx,
            pending: 0,
        }
    }

    pub fn spawn(&mut self, job: Job<E>) {
        self.pending += 1;
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(job.await);
        });
    }

    /// Non-blocking; used from the UI tick.
    pub fn try_next(&mut self) -> Option<E> {
        let event = self.events_rx.try_recv().ok()?;
        self.pending = self.pending.saturating_sub(1);
        Some(event)
    }

    /// Waits for the next event, or returns `None` when nothing is in flight.
    pub async fn next(&mut self) -> Option<E> {
        if self.pending == 0 {
            return None;
        }
        let event = self.events_rx.recv().await?;
        self.pending -= 1;
        Some(event)
    }

    pub fn pending(&self) -> usize {
        self.pending
    }
}

impl<E: Send + 'static> Default for JobRunner<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::FutureExt;

    #[test]
    fn in_flight_tracks_ids_independently() {
        let mut busy = InFlight::default();
        assert!(busy.begin("twitter"));
        assert!(!busy.begin("twitter"));
        assert!(busy.begin("youtube"));
        busy.finish("twitter");
        assert!(!busy.contains("twitter"));
        assert!(busy.contains("youtube"));
    }

    #[tokio::test]
    async fn runner_delivers_every_spawned_event() {
        let mut runner: JobRunner<u32> = JobRunner::new();
        runner.spawn(async { 1 }.boxed());
        runner.spawn(async { 2 }.boxed());
        assert_eq!(runner.pending(), 2);

        let mut seen = vec![runner.next().await.unwrap(), runner.next().await.unwrap()];
        seen.sort();
        assert_eq!(seen, vec![1, 2]);
        assert_eq!(runner.pending(), 0);
        assert!(runner.next().await.is_none());
    }
}
