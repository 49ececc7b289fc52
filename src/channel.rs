//! Cross-context request/response protocol.
//!
//! A caller sends `GENERATE_SUGGESTIONS` and gets nothing back on that call;
//! the result arrives later as an independent `SUGGESTIONS_READY` push to the
//! caller's routing handle. Over stdio (`plume serve`) each message is one
//! JSON envelope per line:
//!
//! ```text
//! -> {"tabId": 7, "message": {"type": "GENERATE_SUGGESTIONS", "tweet": {...}, "config": {...}}}
//! <- {"tabId": 7, "message": {"type": "SUGGESTIONS_READY", "suggestions": ["...", "...", "..."]}}
//! ```
//!
//! Responses for the same handle are not ordered against each other: the last
//! one written wins on the caller's side.

use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::ChannelError;
use crate::model::{GenerationConfig, GenerationRequest, RoutingHandle, SuggestionResult, TweetInput};
use crate::orchestrator::SuggestionOrchestrator;

const GENERATE_SUGGESTIONS: &str = "GENERATE_SUGGESTIONS";

/// One inbound line. The body stays raw until [`InboundEnvelope::decode`] so
/// a request with an unreadable body can still be answered on `tab_id`.
#[derive(Debug, Deserialize)]
pub struct InboundEnvelope {
    #[serde(rename = "tabId", default)]
    pub tab_id: Option<RoutingHandle>,
    pub message: Value,
}

impl InboundEnvelope {
    pub fn message_type(&self) -> Option<&str> {
        self.message.get("type").and_then(Value::as_str)
    }

    pub fn decode(&self) -> Result<InboundMessage, serde_json::Error> {
        InboundMessage::deserialize(&self.message)
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    #[serde(rename = "GENERATE_SUGGESTIONS")]
    GenerateSuggestions {
        #[serde(default)]
        tweet: TweetInput,
        #[serde(default)]
        config: GenerationConfig,
    },
    /// The caller behind `tabId` is gone; later responses to it are dropped.
    #[serde(rename = "TAB_CLOSED")]
    TabClosed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    #[serde(rename = "SUGGESTIONS_READY")]
    SuggestionsReady { suggestions: SuggestionResult },
}

#[derive(Serialize)]
struct OutboundEnvelope<'a> {
    #[serde(rename = "tabId")]
    tab_id: &'a RoutingHandle,
    message: &'a OutboundMessage,
}

/// Push side of the channel.
#[async_trait]
pub trait ResponseSink: Send + Sync {
    /// Delivers `message` to `to`. A handle that no longer exists is an
    /// error the caller is expected to log and ignore.
    async fn send(&self, to: &RoutingHandle, message: OutboundMessage) -> Result<(), ChannelError>;
}

fn lock<T>(mutex: &StdMutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Writes newline-delimited JSON envelopes to `W`, tracking which routing
/// handles are still connected.
///
/// A handle stays open from its first request until `TAB_CLOSED`. Callers
/// that never send `TAB_CLOSED` keep their entry for the life of the sink.
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
    open: StdMutex<HashSet<RoutingHandle>>,
}

impl<W> JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            open: StdMutex::new(HashSet::new()),
        }
    }

    pub fn open(&self, handle: RoutingHandle) {
        lock(&self.open).insert(handle);
    }

    pub fn close(&self, handle: &RoutingHandle) {
        lock(&self.open).remove(handle);
    }

    pub fn is_open(&self, handle: &RoutingHandle) -> bool {
        lock(&self.open).contains(handle)
    }

    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W> ResponseSink for JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&self, to: &RoutingHandle, message: OutboundMessage) -> Result<(), ChannelError> {
        if !self.is_open(to) {
            return Err(ChannelError::UnknownHandle(to.to_string()));
        }

        let mut line = serde_json::to_vec(&OutboundEnvelope {
            tab_id: to,
            message: &message,
        })?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }
}

/// Collects responses in memory. Handles marked disconnected reject sends.
#[derive(Debug, Default)]
pub struct MemorySink {
    sent: StdMutex<Vec<(RoutingHandle, OutboundMessage)>>,
    disconnected: StdMutex<HashSet<RoutingHandle>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disconnect(&self, handle: RoutingHandle) {
        lock(&self.disconnected).insert(handle);
    }

    pub fn sent(&self) -> Vec<(RoutingHandle, OutboundMessage)> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl ResponseSink for MemorySink {
    async fn send(&self, to: &RoutingHandle, message: OutboundMessage) -> Result<(), ChannelError> {
        if lock(&self.disconnected).contains(to) {
            return Err(ChannelError::UnknownHandle(to.to_string()));
        }
        lock(&self.sent).push((to.clone(), message));
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ServeSummary {
    pub requests: usize,
    pub ignored: usize,
}

/// Reads envelopes from `input` until EOF, running each generation request
/// on its own task, then waits for all of them to finish.
///
/// `orchestrator` must deliver through `sink` for `TAB_CLOSED` to take effect.
pub async fn serve<R, W>(
    input: R,
    sink: Arc<JsonLinesSink<W>>,
    orchestrator: Arc<SuggestionOrchestrator>,
) -> Result<ServeSummary, ChannelError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut lines = BufReader::new(input).lines();
    let mut tasks = JoinSet::new();
    let mut summary = ServeSummary::default();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let envelope: InboundEnvelope = match serde_json::from_str(&line) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(error = %err, "ignoring malformed channel message");
                summary.ignored += 1;
                continue;
            }
        };

        let message = match envelope.decode() {
            Ok(message) => message,
            Err(err) if envelope.message_type() == Some(GENERATE_SUGGESTIONS) => {
                warn!(error = %err, "unreadable generation request");
                match envelope.tab_id {
                    Some(handle) => {
                        sink.open(handle.clone());
                        reply_empty(&*sink, &handle).await;
                        summary.requests += 1;
                    }
                    None => summary.ignored += 1,
                }
                continue;
            }
            Err(err) => {
                warn!(error = %err, "ignoring malformed channel message");
                summary.ignored += 1;
                continue;
            }
        };
        let tab_id = envelope.tab_id;

        match message {
            InboundMessage::GenerateSuggestions { tweet, config } => {
                if let Some(handle) = &tab_id {
                    sink.open(handle.clone());
                }
                let request = GenerationRequest {
                    tweet,
                    config,
                    reply_to: tab_id,
                };
                let orchestrator = Arc::clone(&orchestrator);
                tasks.spawn(async move {
                    orchestrator.handle(request).await;
                });
                summary.requests += 1;
            }
            InboundMessage::TabClosed => match tab_id {
                Some(handle) => {
                    debug!(%handle, "routing handle closed");
                    sink.close(&handle);
                }
                None => summary.ignored += 1,
            },
            InboundMessage::Unknown => {
                debug!("ignoring unknown message type");
                summary.ignored += 1;
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            error!(error = %err, "suggestion task panicked");
        }
    }

    info!(requests = summary.requests, ignored = summary.ignored, "channel input closed");
    Ok(summary)
}

async fn reply_empty(sink: &dyn ResponseSink, to: &RoutingHandle) {
    let message = OutboundMessage::SuggestionsReady {
        suggestions: SuggestionResult::empty(),
    };
    if let Err(err) = sink.send(to, message).await {
        warn!(handle = %to, error = %err, "failed to deliver suggestions");
    }
}
