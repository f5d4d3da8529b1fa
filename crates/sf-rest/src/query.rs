//! Paginated SOQL execution with progress and cancellation.
//!
//! [`QueryEngine::stream`] yields one [`QueryEvent::Progress`] per page and
//! ends with exactly one [`QueryEvent::Completed`]. Cancellation is checked
//! before each continuation and also abandons a `SELECT *` describe or a
//! page fetch in flight.

use std::sync::Arc;

use async_stream::try_stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, ErrorKind, Result};
use crate::executor::RequestExecutor;
use crate::expand::expand_select_star;
use crate::registry::QueryRegistry;

/// Progress after a page has been fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryProgress {
    /// Records accumulated so far.
    pub fetched: u64,
    /// Server-reported total.
    pub total_size: u64,
    /// 1-based page counter.
    pub page: u32,
    /// No continuation remains.
    pub done: bool,
}

/// Records of a finished query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRecords {
    pub total_size: u64,
    /// False when a continuation page failed and `records` is partial.
    pub done: bool,
    pub records: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_error: Option<String>,
}

/// How a query ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    Completed(QueryRecords),
    #[serde(rename_all = "camelCase")]
    Aborted {
        aborted: bool,
        total_size: u64,
        fetched_count: u64,
    },
}

impl QueryOutcome {
    fn aborted(last: Option<&QueryProgress>) -> Self {
        QueryOutcome::Aborted {
            aborted: true,
            total_size: last.map_or(0, |p| p.total_size),
            fetched_count: last.map_or(0, |p| p.fetched),
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, QueryOutcome::Aborted { .. })
    }

    /// The records, unless the query was aborted.
    pub fn records(&self) -> Option<&QueryRecords> {
        match self {
            QueryOutcome::Completed(records) => Some(records),
            QueryOutcome::Aborted { .. } => None,
        }
    }
}

/// An event of a running query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryEvent {
    Progress(QueryProgress),
    Completed(QueryOutcome),
}

/// Runs SOQL queries with `SELECT *` expansion and transparent paging.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    executor: Arc<RequestExecutor>,
    registry: QueryRegistry,
}

impl QueryEngine {
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self {
            executor,
            registry: QueryRegistry::default(),
        }
    }

    pub fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }

    /// Run `soql` as the tracked query `query_id`.
    ///
    /// The query is registered when the stream is first polled and
    /// unregistered when it ends or is dropped. Ids must be unique among
    /// running queries; reusing a live id cancels the earlier query.
    pub fn stream(
        &self,
        query_id: impl Into<String>,
        soql: impl Into<String>,
    ) -> BoxStream<'static, Result<QueryEvent>> {
        let executor = self.executor.clone();
        let registry = self.registry.clone();
        let query_id = query_id.into();
        let soql = soql.into();

        Box::pin(try_stream! {
            let tracked = registry.register(&query_id);
            let token = tracked.token().clone();

            let expanded = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                soql = expand_select_star(&executor, &soql) => Some(soql),
            };
            let Some(soql) = expanded else {
                info!(query_id = %query_id, "Query aborted during SELECT * expansion");
                yield QueryEvent::Completed(QueryOutcome::aborted(None));
                return;
            };
            debug!(query_id = %query_id, "Running query");

            let first = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                result = executor.query(&soql) => Some(result),
            };
            let Some(first) = first else {
                info!(query_id = %query_id, "Query aborted before first page");
                yield QueryEvent::Completed(QueryOutcome::aborted(None));
                return;
            };
            let first = first?;

            let total_size = first.total_size;
            let mut next = first.next_records_url;
            let mut records = first.records;
            let mut page: u32 = 1;
            let mut page_error = None;

            let progress = QueryProgress {
                fetched: records.len() as u64,
                total_size,
                page,
                done: next.is_none(),
            };
            tracked.record(&progress);
            let mut last = progress.clone();
            yield QueryEvent::Progress(progress);

            while let Some(url) = next.take() {
                if token.is_cancelled() {
                    info!(query_id = %query_id, page, "Query aborted between pages");
                    yield QueryEvent::Completed(QueryOutcome::aborted(Some(&last)));
                    return;
                }

                let fetched = tokio::select! {
                    biased;
                    _ = token.cancelled() => None,
                    result = executor.query_more(&url) => Some(result),
                };
                let Some(fetched) = fetched else {
                    info!(query_id = %query_id, page, "Query aborted during page fetch");
                    yield QueryEvent::Completed(QueryOutcome::aborted(Some(&last)));
                    return;
                };

                match fetched {
                    Ok(more) => {
                        next = more.next_records_url;
                        records.extend(more.records);
                        page += 1;

                        let progress = QueryProgress {
                            fetched: records.len() as u64,
                            total_size,
                            page,
                            done: next.is_none(),
                        };
                        tracked.record(&progress);
                        last = progress.clone();
                        yield QueryEvent::Progress(progress);
                    }
                    Err(e) => {
                        warn!(query_id = %query_id, page = page + 1, error = %e, "Page fetch failed, returning partial results");
                        page_error = Some(e.to_string());
                        break;
                    }
                }
            }

            let done = page_error.is_none();
            yield QueryEvent::Completed(QueryOutcome::Completed(QueryRecords {
                total_size,
                done,
                records,
                page_error,
            }));
        })
    }

    /// Run a query under a generated id and return its outcome.
    #[instrument(skip(self))]
    pub async fn execute_soql(&self, soql: &str) -> Result<QueryOutcome> {
        let query_id = uuid::Uuid::new_v4().to_string();
        self.execute_tracked(&query_id, soql, None).await
    }

    /// Run a tracked query, forwarding progress to `progress` if given.
    ///
    /// A closed progress receiver does not stop the query.
    #[instrument(skip(self, progress))]
    pub async fn execute_tracked(
        &self,
        query_id: &str,
        soql: &str,
        progress: Option<mpsc::UnboundedSender<QueryProgress>>,
    ) -> Result<QueryOutcome> {
        let mut events = self.stream(query_id, soql);
        while let Some(event) = events.next().await {
            match event? {
                QueryEvent::Progress(p) => {
                    if let Some(tx) = &progress {
                        let _ = tx.send(p);
                    }
                }
                QueryEvent::Completed(outcome) => return Ok(outcome),
            }
        }
        Err(Error::new(ErrorKind::Client {
            status: None,
            message: format!("query {query_id} ended without a result"),
        }))
    }

    /// Cancel a tracked query. False if no query with that id is running.
    pub fn abort(&self, query_id: &str) -> bool {
        let aborted = self.registry.abort(query_id);
        if aborted {
            info!(query_id, "Query abort requested");
        }
        aborted
    }

    /// Last progress of a tracked query.
    pub fn progress(&self, query_id: &str) -> Option<QueryProgress> {
        self.registry.snapshot(query_id)
    }

    /// Ids of the running queries.
    pub fn running(&self) -> Vec<String> {
        self.registry.tracked_ids()
    }

    /// Cancel every running query.
    pub fn abort_all(&self) {
        self.registry.abort_all();
    }
}
