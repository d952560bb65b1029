//! Execution logs: queries and live streams
//!
//! Live logs arrive over Server-Sent Events from
//! `GET /api/logs/stream/{workflowId}`. Two ways to consume them:
//!
//! - [`LogClient::subscribe`] returns a [`LogSubscription`], a `Stream` of
//!   `Result<ExecutionLog>` items for async callers.
//! - [`LogClient::stream`] runs a callback for every log record on a
//!   background task and hands back a [`LogStreamHandle`] that must be
//!   closed explicitly.
//!
//! Delivery is best effort in arrival order. There are no sequence numbers,
//! no gap detection and no reconnect: when the transport ends, the stream
//! ends.
//!
//! Only events named `message` (the default when no `event:` field is sent)
//! carry log records; other named events such as keep-alive pings are
//! skipped.
//!
//! ## Rust Learning Notes:
//!
//! ### Bounded Channels
//! A reader task owns the HTTP body and pushes decoded events into a bounded
//! `tokio::sync::mpsc` channel. When the consumer falls behind, the reader
//! waits instead of buffering without limit, which in turn lets TCP flow
//! control slow the server down.
//!
//! ### Cancellation
//! `tokio_util::sync::CancellationToken` is shared between the reader task
//! and the handle. `tokio::select!` races every await in the reader against
//! the token so cancelling takes effect immediately. The callback task
//! polls the token before the channel (`biased;`), so records still buffered
//! at cancellation are never handed to the callback.

use std::collections::HashMap;
use std::pin::Pin;
use std::task::{Context, Poll};

use chrono::{DateTime, Utc};
use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures::{Stream, StreamExt};
use reqwest::{Method, Response};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{resource_path, ActiveExecution};
use crate::models::ExecutionLog;
use crate::{Client, OrchestratorError, Result};

/// Decoded events held between the reader task and a slow consumer
pub const STREAM_BUFFER: usize = 256;

/// Event name the backend's log records are sent under
const LOG_EVENT: &str = "message";

/// Client for execution log operations
#[derive(Debug, Clone)]
pub struct LogClient {
    client: Client,
}

impl LogClient {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Logs recorded so far, optionally only those of one workflow
    pub async fn list(&self, workflow_id: Option<&str>) -> Result<Vec<ExecutionLog>> {
        let path = "/api/logs";
        let mut request = self.client.request(Method::GET, path);
        if let Some(id) = workflow_id {
            request = request.query(&[("workflowId", id)]);
        }
        self.client.send_json(request, path).await
    }

    /// Runs the backend currently reports as running, oldest first
    pub async fn active_executions(&self) -> Result<Vec<ActiveExecution>> {
        #[derive(Deserialize)]
        struct RawExecution {
            workflow_id: String,
            status: String,
            #[serde(with = "crate::models::timestamp")]
            start_time: DateTime<Utc>,
            #[serde(default, with = "crate::models::timestamp::option")]
            end_time: Option<DateTime<Utc>>,
        }

        let raw: HashMap<String, RawExecution> = self
            .client
            .get_json("/api/logs/active-executions")
            .await?;

        let mut executions: Vec<ActiveExecution> = raw
            .into_iter()
            .map(|(execution_id, raw)| ActiveExecution {
                execution_id,
                workflow_id: raw.workflow_id,
                status: raw.status,
                start_time: raw.start_time,
                end_time: raw.end_time,
            })
            .collect();
        executions.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| a.execution_id.cmp(&b.execution_id))
        });
        Ok(executions)
    }

    /// Open the live log stream of a workflow
    ///
    /// Fails if the stream cannot be opened. Afterwards each item is a log
    /// record, a [`OrchestratorError::MalformedEvent`] for a payload that did
    /// not decode (the stream continues), or a transport error as the final
    /// item.
    pub async fn subscribe(&self, workflow_id: &str) -> Result<LogSubscription> {
        let path = resource_path("/api/logs/stream", workflow_id);
        let response = self
            .client
            .send(self.client.stream_request(&path), &path)
            .await?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(pump_events(
            response,
            tx,
            cancel.clone(),
            workflow_id.to_string(),
        ));

        info!(workflow_id, "log stream opened");
        Ok(LogSubscription {
            events: ReceiverStream::new(rx),
            cancel,
            task: Some(task),
        })
    }

    /// Deliver every well-formed log record of a workflow to `on_message`
    ///
    /// Malformed events are logged and skipped. The returned handle keeps the
    /// stream open until [`LogStreamHandle::close`] or
    /// [`LogStreamHandle::cancel`] is called, or the backend ends it.
    pub async fn stream<F>(&self, workflow_id: &str, mut on_message: F) -> Result<LogStreamHandle>
    where
        F: FnMut(ExecutionLog) + Send + 'static,
    {
        let mut subscription = self.subscribe(workflow_id).await?;
        let cancel = subscription.cancel.clone();
        let stop = cancel.clone();
        let id = workflow_id.to_string();

        let task = tokio::spawn(async move {
            loop {
                // Records still buffered when the handle is cancelled are dropped
                let item = tokio::select! {
                    biased;
                    _ = stop.cancelled() => break,
                    item = subscription.next() => item,
                };
                match item {
                    Some(Ok(log)) => on_message(log),
                    Some(Err(OrchestratorError::MalformedEvent(reason))) => {
                        warn!(workflow_id = %id, %reason, "skipping malformed log event");
                    }
                    Some(Err(error)) => {
                        warn!(workflow_id = %id, %error, "log stream ended with an error");
                        break;
                    }
                    None => break,
                }
            }
        });

        Ok(LogStreamHandle {
            workflow_id: workflow_id.to_string(),
            cancel,
            task,
        })
    }
}

/// Read the event-stream body, decode events and forward them in order
async fn pump_events(
    response: Response,
    tx: mpsc::Sender<Result<ExecutionLog>>,
    cancel: CancellationToken,
    workflow_id: String,
) {
    let mut events = Box::pin(response.bytes_stream().eventsource());

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(%workflow_id, "log stream cancelled");
                break;
            }
            next = events.next() => next,
        };

        let item = match next {
            Some(Ok(event)) if is_log_event(&event) => decode_event(&event),
            Some(Ok(event)) => {
                debug!(%workflow_id, event = %event.event, "ignoring non-log event");
                continue;
            }
            Some(Err(EventStreamError::Transport(error))) => {
                let error =
                    OrchestratorError::Transport(format!("log stream interrupted: {}", error));
                deliver(&tx, &cancel, Err(error)).await;
                break;
            }
            Some(Err(error)) => Err(OrchestratorError::MalformedEvent(error.to_string())),
            None => break,
        };

        if !deliver(&tx, &cancel, item).await {
            return;
        }
    }

    info!(%workflow_id, "log stream closed");
}

/// Returns `false` once nobody is listening any more
async fn deliver(
    tx: &mpsc::Sender<Result<ExecutionLog>>,
    cancel: &CancellationToken,
    item: Result<ExecutionLog>,
) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        sent = tx.send(item) => sent.is_ok(),
    }
}

fn is_log_event(event: &Event) -> bool {
    event.event.is_empty() || event.event == LOG_EVENT
}

fn decode_event(event: &Event) -> Result<ExecutionLog> {
    serde_json::from_str(&event.data).map_err(|error| {
        let preview: String = event.data.chars().take(120).collect();
        OrchestratorError::MalformedEvent(format!("{} in '{}'", error, preview))
    })
}

/// Live log records of one workflow as an async `Stream`
///
/// Dropping the subscription stops the reader task.
pub struct LogSubscription {
    events: ReceiverStream<Result<ExecutionLog>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl LogSubscription {
    /// Stop reading and wait for the reader task to finish
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(error) = task.await {
                warn!(%error, "log stream reader did not shut down cleanly");
            }
        }
    }
}

impl Stream for LogSubscription {
    type Item = Result<ExecutionLog>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}

impl Drop for LogSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for LogSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSubscription")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Handle to a callback-driven log stream
///
/// The stream is not tied to the handle's lifetime: dropping the handle
/// leaves it running until the backend closes it. Call
/// [`close`](LogStreamHandle::close) to release it.
#[derive(Debug)]
pub struct LogStreamHandle {
    workflow_id: String,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl LogStreamHandle {
    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    /// Request shutdown without waiting for it
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the stream has ended, by cancellation or on its own
    pub fn is_closed(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop delivery and wait until no further callback can run
    pub async fn close(self) {
        self.cancel.cancel();
        if let Err(error) = self.task.await {
            warn!(workflow_id = %self.workflow_id, %error, "log stream task did not shut down cleanly");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str, data: &str) -> Event {
        Event {
            event: name.to_string(),
            data: data.to_string(),
            id: String::new(),
            retry: None,
        }
    }

    #[test]
    fn test_decode_event() {
        let event = event(
            "message",
            r#"{"id":"l1","workflowId":"w1","timestamp":"2024-01-01T00:00:00","level":"info","message":"started"}"#,
        );
        let log = decode_event(&event).unwrap();
        assert_eq!(log.message, "started");
    }

    #[test]
    fn test_decode_malformed_event() {
        let error = decode_event(&event("message", "not json")).unwrap_err();
        assert!(matches!(error, OrchestratorError::MalformedEvent(_)));
        assert!(error.to_string().contains("not json"));
    }

    #[test]
    fn test_only_message_events_carry_logs() {
        assert!(is_log_event(&event("message", "{}")));
        assert!(is_log_event(&event("", "{}")));
        assert!(!is_log_event(&event("ping", "{}")));
    }
}
