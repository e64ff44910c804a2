//! Streaming HTTP client driving [`StreamHandler`] callbacks.
//!
//! One [`EventSource`] owns one long-lived GET request at a time. The
//! response body is decoded incrementally and each frame is dispatched to
//! the handler from a single task, so callbacks are strictly sequential.
//! When the connection drops, the client reports the fault, waits per its
//! [`ReconnectPolicy`], and connects again, resuming from the last observed
//! event id. Only the shutdown signal ends the loop for good.
//!
//! [`StreamHandler`]: wikibridge_core::StreamHandler

use crate::decode::{SseDecoder, SseFrame};
use crate::reconnect::ReconnectPolicy;
use async_stream::stream;
use futures::stream::{Stream, StreamExt};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response, Url};
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use wikibridge_core::{ChangeEvent, StreamError, StreamHandler};

/// Default User-Agent when the builder is given none.
const DEFAULT_USER_AGENT: &str = concat!("wikibridge/", env!("CARGO_PKG_VERSION"));

/// Build the fixed request headers for a stream connection.
///
/// This is the request decoration applied to every request the client
/// makes: an identifying `User-Agent` (the Wikimedia endpoints reject
/// anonymous clients) and the `text/event-stream` accept header.
///
/// # Errors
///
/// Returns [`StreamError::Configuration`] if the user agent is not a valid
/// header value.
pub fn stream_headers(user_agent: &str) -> Result<HeaderMap, StreamError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(user_agent).map_err(|e| {
            StreamError::Configuration(format!("invalid user agent '{user_agent}': {e}"))
        })?,
    );
    Ok(headers)
}

fn decorated_client(user_agent: &str) -> Result<Client, StreamError> {
    Client::builder()
        .default_headers(stream_headers(user_agent)?)
        .build()
        .map_err(|e| StreamError::Configuration(format!("failed to build http client: {e}")))
}

/// How one connection ended.
enum StreamEnd {
    Cancelled,
    Eof,
    Error(StreamError),
}

/// A long-lived SSE connection with client-owned reconnection.
pub struct EventSource {
    client: Client,
    url: Url,
    policy: ReconnectPolicy,
}

impl EventSource {
    /// Create a builder for the given stream URL.
    #[must_use]
    pub fn builder(url: impl Into<String>) -> EventSourceBuilder {
        EventSourceBuilder {
            url: url.into(),
            user_agent: None,
            policy: None,
        }
    }

    /// The stream URL this source connects to.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Spawn the connection loop on its own task.
    ///
    /// The task drives `handler` until `shutdown` flips to `true` (or its
    /// sender is dropped), then exits without reconnecting.
    pub fn spawn<H>(self, handler: H, shutdown: watch::Receiver<bool>) -> JoinHandle<()>
    where
        H: StreamHandler + 'static,
    {
        tokio::spawn(self.drive(handler, shutdown))
    }

    async fn drive<H: StreamHandler>(self, handler: H, mut shutdown: watch::Receiver<bool>) {
        let mut attempt = 0_usize;
        let mut last_event_id: Option<String> = None;
        let mut retry_override: Option<Duration> = None;

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.connect(last_event_id.as_deref()).await {
                Ok(response) => {
                    attempt = 0;
                    tracing::info!(url = %self.url, "Change stream connected");
                    handler.on_open().await;

                    match pump(
                        response,
                        &handler,
                        &mut shutdown,
                        &mut last_event_id,
                        &mut retry_override,
                    )
                    .await
                    {
                        StreamEnd::Cancelled => {
                            tracing::info!("Change stream cancelled");
                            handler.on_closed().await;
                            return;
                        }
                        StreamEnd::Eof => {
                            tracing::info!("Change stream closed by server, will reconnect");
                            handler.on_closed().await;
                        }
                        StreamEnd::Error(error) => {
                            tracing::warn!(error = %error, "Change stream transport error");
                            handler.on_error(&error).await;
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!(error = %error, "Change stream connection failed");
                    handler.on_error(&error).await;
                }
            }

            let delay = retry_override.unwrap_or_else(|| self.policy.delay_for_attempt(attempt));
            attempt += 1;
            tracing::debug!(
                delay_ms = delay.as_millis() as u64,
                attempt,
                "Backing off before reconnect"
            );
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }

    async fn connect(&self, last_event_id: Option<&str>) -> Result<Response, StreamError> {
        let mut request = self.client.get(self.url.clone());
        if let Some(id) = last_event_id {
            request = request.header("Last-Event-ID", id);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StreamError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::Http {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

/// Decode the response body into a stream of SSE frames.
fn frame_stream(
    response: Response,
) -> Pin<Box<dyn Stream<Item = Result<SseFrame, StreamError>> + Send>> {
    let mut body = response.bytes_stream();

    Box::pin(stream! {
        let mut decoder = SseDecoder::new();
        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    for frame in decoder.push(&bytes) {
                        yield Ok(frame);
                    }
                }
                Err(e) => {
                    yield Err(StreamError::Transport(e.to_string()));
                    break;
                }
            }
        }
    })
}

/// Read one connection to its end, dispatching frames to the handler.
async fn pump<H: StreamHandler>(
    response: Response,
    handler: &H,
    shutdown: &mut watch::Receiver<bool>,
    last_event_id: &mut Option<String>,
    retry_override: &mut Option<Duration>,
) -> StreamEnd {
    let mut frames = frame_stream(response);

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return StreamEnd::Cancelled;
                }
            }
            frame = frames.next() => match frame {
                None => return StreamEnd::Eof,
                Some(Err(error)) => return StreamEnd::Error(error),
                Some(Ok(SseFrame::Event { id, data })) => {
                    if id.is_some() {
                        last_event_id.clone_from(&id);
                    }
                    handler.on_message(ChangeEvent { id, payload: data }).await;
                }
                Some(Ok(SseFrame::Comment(text))) => handler.on_comment(&text).await,
                Some(Ok(SseFrame::Retry(delay))) => {
                    tracing::debug!(
                        retry_ms = delay.as_millis() as u64,
                        "Server set reconnection delay"
                    );
                    *retry_override = Some(delay);
                }
            }
        }
    }
}

/// Builder for [`EventSource`].
pub struct EventSourceBuilder {
    url: String,
    user_agent: Option<String>,
    policy: Option<ReconnectPolicy>,
}

impl EventSourceBuilder {
    /// Set the `User-Agent` header sent with every connection.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the reconnection backoff policy.
    #[must_use]
    pub fn reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Build the [`EventSource`].
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Configuration`] if the URL is malformed or
    /// the user agent is not a valid header value. These are the only
    /// fatal faults this crate produces; everything after construction is
    /// retried.
    pub fn build(self) -> Result<EventSource, StreamError> {
        let url = Url::parse(&self.url)
            .map_err(|e| StreamError::Configuration(format!("invalid url '{}': {e}", self.url)))?;
        let client =
            decorated_client(self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))?;

        Ok(EventSource {
            client,
            url,
            policy: self.policy.unwrap_or_default(),
        })
    }
}
