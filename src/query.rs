//! Async fetch handle for views.
//!
//! A `Query<T>` owns a fetcher closure, spawns it on `fetch()`, and picks up
//! the result on `poll()` from the UI tick. Views render from `state()`:
//!
//! ```ignore
//! let backend = backend.clone();
//! let mut query = Query::new(move || {
//!     let backend = backend.clone();
//!     async move { backend.list_equipment().await.map_err(|e| e.to_string()) }
//! });
//! query.fetch();
//!
//! // on tick
//! query.poll();
//! ```
//!
//! While a refetch is in flight the last successful value stays readable via
//! `data()`, so lists don't blank out on refresh.

use std::future::Future;
use std::pin::Pin;
use tokio::sync::oneshot;
use tracing::warn;

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Query is currently fetching data
  Loading,
  /// Query completed successfully
  Success(T),
  /// Query failed with an error
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;

type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

pub struct Query<T> {
  state: QueryState<T>,
  /// Last successful value, kept across refetches and errors
  last: Option<T>,
  fetcher: FetcherFn<T>,
  pending: Option<oneshot::Receiver<Result<T, String>>>,
}

impl<T: Clone + Send + 'static> Query<T> {
  /// Create a query from a closure returning a fresh future per fetch.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      last: None,
      fetcher: Box::new(move || Box::pin(fetcher())),
      pending: None,
    }
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  /// Latest successful value, even while a refetch is loading.
  pub fn data(&self) -> Option<&T> {
    match &self.state {
      QueryState::Success(data) => Some(data),
      _ => self.last.as_ref(),
    }
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  /// Start fetching unless a fetch is already in flight.
  pub fn fetch(&mut self) {
    if self.pending.is_some() {
      return;
    }
    self.start_fetch();
  }

  /// Start a new fetch, abandoning any in-flight one.
  pub fn refetch(&mut self) {
    self.pending = None;
    self.start_fetch();
  }

  /// Apply a finished fetch. Returns `true` if the state changed.
  pub fn poll(&mut self) -> bool {
    let Some(receiver) = self.pending.as_mut() else {
      return false;
    };

    let result = match receiver.try_recv() {
      Ok(result) => result,
      Err(oneshot::error::TryRecvError::Empty) => return false,
      Err(oneshot::error::TryRecvError::Closed) => Err("Query was cancelled".to_string()),
    };
    self.pending = None;

    match result {
      Ok(data) => {
        self.last = Some(data.clone());
        self.state = QueryState::Success(data);
      }
      Err(error) => {
        warn!(%error, "query failed");
        self.state = QueryState::Error(error);
      }
    }
    true
  }

  fn start_fetch(&mut self) {
    let (tx, rx) = oneshot::channel();
    self.pending = Some(rx);
    if let QueryState::Success(data) = std::mem::replace(&mut self.state, QueryState::Loading) {
      self.last = Some(data);
    }

    let future = (self.fetcher)();
    tokio::spawn(async move {
      // Receiver is gone if the query was refetched or dropped
      let _ = tx.send(future.await);
    });
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("pending", &self.pending.is_some())
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;
  use std::time::Duration;

  #[tokio::test]
  async fn test_query_success() {
    let mut query = Query::new(|| async { Ok::<_, String>(vec![1, 2, 3]) });
    assert!(matches!(query.state(), QueryState::Idle));

    query.fetch();
    assert!(query.is_loading());

    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(query.poll());
    assert_eq!(query.data(), Some(&vec![1, 2, 3]));
    assert!(!query.poll());
  }

  #[tokio::test]
  async fn test_query_error() {
    let mut query: Query<i32> = Query::new(|| async { Err("backend down".to_string()) });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(query.poll());
    assert!(query.is_error());
    assert!(matches!(query.state(), QueryState::Error(e) if e == "backend down"));
  }

  #[tokio::test]
  async fn test_data_survives_refetch() {
    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();
    let mut query = Query::new(move || {
      let counter = counter_clone.clone();
      async move {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        if n > 0 {
          tokio::time::sleep(Duration::from_millis(50)).await;
        }
        Ok::<_, String>(n)
      }
    });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();
    assert_eq!(query.data(), Some(&0));

    query.refetch();
    assert!(query.is_loading());
    assert_eq!(query.data(), Some(&0));

    tokio::time::sleep(Duration::from_millis(100)).await;
    query.poll();
    assert_eq!(query.data(), Some(&1));
  }

  #[tokio::test]
  async fn test_fetch_while_loading_is_noop() {
    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();
    let mut query = Query::new(move || {
      counter_clone.fetch_add(1, Ordering::SeqCst);
      async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok::<_, String>(42)
      }
    });

    query.fetch();
    query.fetch();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }
}
