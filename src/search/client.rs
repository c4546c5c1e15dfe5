//! Search orchestration: create, start and poll until finished

use super::api::SearchApi;
use super::models::SearchRequest;
use super::state::SearchState;
use crate::config::ClientSettings;
use crate::error::{MarError, Result};
use crate::metrics::ClientMetrics;
use crate::query::{Condition, Projection};
use crate::results::ResultsContext;
use crate::transport::Transport;
use crate::{DEFAULT_POLL_INTERVAL, DEFAULT_TOPIC, MIN_POLL_INTERVAL};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Client for the Active Response search API
///
/// The client shares its transport with every [`ResultsContext`] it returns.
/// Independent searches may run concurrently through one client.
pub struct MarClient {
    api: SearchApi,
    /// Wait between status checks
    poll_interval: Duration,
    /// Upper bound on the time spent polling
    max_wait: Option<Duration>,
    /// Upper bound on the number of status checks
    max_polls: Option<u32>,
}

impl MarClient {
    /// Create a client on the default search topic
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            api: SearchApi::new(transport, DEFAULT_TOPIC, Arc::new(ClientMetrics::new())),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: None,
            max_polls: None,
        }
    }

    /// Create a client from settings
    pub fn from_settings(transport: Arc<dyn Transport>, settings: &ClientSettings) -> Result<Self> {
        let mut client = Self::new(transport).with_topic(&settings.topic);
        client.set_poll_interval(Duration::from_secs(settings.poll_interval_secs))?;
        client.max_wait = settings.max_wait_secs.map(Duration::from_secs);
        if let Some(max_polls) = settings.max_polls {
            client = client.with_max_polls(max_polls);
        }
        Ok(client)
    }

    /// Send requests to a different topic
    pub fn with_topic(mut self, topic: &str) -> Self {
        self.api = self.api.with_topic(topic);
        self
    }

    /// Fail with [`MarError::Timeout`] rather than wait past `max_wait` for completion
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Fail with [`MarError::Timeout`] after `max_polls` unfinished status checks
    ///
    /// A search is always checked at least once, so `0` removes the bound.
    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = (max_polls > 0).then_some(max_polls);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Set the wait between status checks
    ///
    /// Intervals below [`MIN_POLL_INTERVAL`] are rejected and leave the current value unchanged.
    pub fn set_poll_interval(&mut self, interval: Duration) -> Result<()> {
        if interval < MIN_POLL_INTERVAL {
            return Err(MarError::InvalidPollInterval {
                requested: interval,
                minimum: MIN_POLL_INTERVAL,
            });
        }
        self.poll_interval = interval;
        Ok(())
    }

    pub fn topic(&self) -> &str {
        self.api.topic()
    }

    pub fn metrics(&self) -> &ClientMetrics {
        self.api.metrics()
    }

    /// Run a search and wait until the service reports it finished
    pub async fn search(
        &self,
        projections: Vec<Projection>,
        condition: Option<Condition>,
    ) -> Result<ResultsContext> {
        let request = SearchRequest::new(projections, condition);
        self.search_with_cancellation(&request, &CancellationToken::new())
            .await
    }

    /// Run a search that stops with [`MarError::Cancelled`] once `cancel` fires
    ///
    /// Cancellation interrupts both the wait between status checks and any
    /// request in flight.
    pub async fn search_with_cancellation(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<ResultsContext> {
        self.api.metrics().inc_search_started();

        let mut state = match cancellable(cancel, self.api.create(request)).await {
            Ok(search_id) => {
                info!("Created search {}", search_id);
                SearchState::Created { search_id }
            }
            Err(e) => SearchState::Failed(e),
        };

        loop {
            state = match state {
                SearchState::Finished(ctx) => {
                    self.api.metrics().inc_search_finished();
                    info!(
                        "Search {} finished with {} results from {} hosts",
                        ctx.search_id(),
                        ctx.result_count(),
                        ctx.host_count()
                    );
                    return Ok(ctx);
                }
                SearchState::Failed(e) => return Err(e),
                current => {
                    let search_id = current.search_id().map(str::to_string);
                    let next = self.advance(current, cancel).await;
                    debug!(
                        "Search {} -> {}",
                        search_id.as_deref().unwrap_or("?"),
                        next.name()
                    );
                    next
                }
            };
        }
    }

    /// Perform the remote work of one non-terminal state
    async fn advance(&self, state: SearchState, cancel: &CancellationToken) -> SearchState {
        match state {
            SearchState::Created { search_id } => {
                match cancellable(cancel, self.api.start(&search_id)).await {
                    Ok(()) => SearchState::Started { search_id },
                    Err(e) => SearchState::Failed(e),
                }
            }
            SearchState::Started { search_id } => SearchState::Polling {
                search_id,
                polls: 0,
                deadline: self.max_wait.map(|wait| Instant::now() + wait),
            },
            SearchState::Polling {
                search_id,
                polls,
                deadline,
            } => self.poll(search_id, polls, deadline, cancel).await,
            terminal => terminal,
        }
    }

    async fn poll(
        &self,
        search_id: String,
        polls: u32,
        deadline: Option<Instant>,
        cancel: &CancellationToken,
    ) -> SearchState {
        let status = match cancellable(cancel, self.api.status(&search_id)).await {
            Ok(status) => status,
            Err(e) => return SearchState::Failed(e),
        };
        let polls = polls + 1;

        if status.is_finished() {
            return SearchState::Finished(ResultsContext::new(self.api.clone(), search_id, &status));
        }

        let over_polls = self.max_polls.map_or(false, |max| polls >= max);
        let over_wait = deadline.map_or(false, |d| Instant::now() + self.poll_interval > d);
        if over_polls || over_wait {
            return SearchState::Failed(MarError::Timeout { search_id, polls });
        }

        debug!(
            "Search {} is {}, checking again in {:?}",
            search_id,
            status.status.as_deref().unwrap_or("pending"),
            self.poll_interval
        );
        let interval = self.poll_interval;
        let wait = async move {
            sleep(interval).await;
            Ok::<(), MarError>(())
        };
        match cancellable(cancel, wait).await {
            Ok(()) => SearchState::Polling {
                search_id,
                polls,
                deadline,
            },
            Err(e) => SearchState::Failed(e),
        }
    }
}

/// Resolve `fut`, or fail with [`MarError::Cancelled`] as soon as `cancel` fires
async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(MarError::Cancelled),
        result = fut => result,
    }
}
