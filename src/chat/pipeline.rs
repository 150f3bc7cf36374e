//! Chat pipeline for hosting a chat backend on a worker thread
//!
//! The UI thread never blocks on the network: it sends a command and polls
//! the event channel once per frame.

use crate::chat::client::ChatBackend;
use crate::{Result, VoiceChatError};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use tokio::runtime::Runtime;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Commands that can be sent to the chat pipeline
#[derive(Debug, Clone)]
pub enum ChatCommand {
    /// Send a user message to the chatbot
    Send {
        /// The user's message
        message: String,
        /// Unique request ID for tracking
        request_id: Uuid,
    },

    /// Shutdown the pipeline
    Shutdown,
}

/// Events emitted by the chat pipeline
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// The chatbot replied
    Reply {
        /// Request ID this reply belongs to
        request_id: Uuid,
        /// Reply text
        text: String,
    },

    /// The request failed
    Error {
        /// Request ID this error belongs to
        request_id: Uuid,
        /// What went wrong
        error: VoiceChatError,
    },

    /// Pipeline has shut down
    Shutdown,
}

/// Aborts the request the worker is waiting on so shutdown is not held up
#[derive(Clone, Default)]
pub struct ChatCancel {
    notify: Arc<Notify>,
}

impl ChatCancel {
    pub fn cancel(&self) {
        self.notify.notify_one();
    }

    async fn cancelled(&self) {
        self.notify.notified().await;
    }
}

/// Chat pipeline with channel-based communication
pub struct ChatPipeline {
    backend: Arc<dyn ChatBackend>,
    cancel: ChatCancel,

    command_tx: Sender<ChatCommand>,
    command_rx: Receiver<ChatCommand>,

    event_tx: Sender<ChatEvent>,
    event_rx: Receiver<ChatEvent>,
}

impl ChatPipeline {
    /// Create a new chat pipeline around a backend
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        let (command_tx, command_rx) = bounded(16);
        let (event_tx, event_rx) = bounded(16);

        Self {
            backend,
            cancel: ChatCancel::default(),
            command_tx,
            command_rx,
            event_tx,
            event_rx,
        }
    }

    /// Get a sender for commands
    pub fn command_sender(&self) -> Sender<ChatCommand> {
        self.command_tx.clone()
    }

    /// Get a receiver for events
    pub fn event_receiver(&self) -> Receiver<ChatEvent> {
        self.event_rx.clone()
    }

    /// Get a handle that aborts the in-flight request
    pub fn canceller(&self) -> ChatCancel {
        self.cancel.clone()
    }

    /// Start the pipeline worker thread
    ///
    /// Requests are handled one at a time, in the order they were sent.
    pub fn start_worker(self) -> Result<thread::JoinHandle<()>> {
        let backend = self.backend;
        let cancel = self.cancel;
        let command_rx = self.command_rx;
        let event_tx = self.event_tx;

        // Fail here rather than inside the thread so the caller sees it
        let runtime = Runtime::new().map_err(|e| {
            VoiceChatError::ChannelError(format!("Runtime creation failed: {}", e))
        })?;

        let handle = thread::Builder::new()
            .name("chat-pipeline".to_string())
            .spawn(move || {
                info!("Chat pipeline worker started");

                loop {
                    match command_rx.recv() {
                        Ok(ChatCommand::Send { message, request_id }) => {
                            debug!("Processing chat request {}", request_id);

                            let outcome = runtime.block_on(async {
                                tokio::select! {
                                    result = backend.send(&message) => Some(result),
                                    _ = cancel.cancelled() => None,
                                }
                            });

                            let event = match outcome {
                                Some(Ok(text)) => ChatEvent::Reply { request_id, text },
                                Some(Err(error)) => {
                                    warn!("Chat request {} failed: {}", request_id, error);
                                    ChatEvent::Error { request_id, error }
                                }
                                None => {
                                    info!("Chat request {} cancelled, shutting down", request_id);
                                    let _ = event_tx.try_send(ChatEvent::Shutdown);
                                    break;
                                }
                            };

                            if let Err(e) = event_tx.send(event) {
                                error!("Failed to send chat event: {}", e);
                                break;
                            }
                        }
                        Ok(ChatCommand::Shutdown) => {
                            info!("Chat pipeline worker shutting down");
                            let _ = event_tx.try_send(ChatEvent::Shutdown);
                            break;
                        }
                        Err(e) => {
                            debug!("Chat command channel closed: {}", e);
                            break;
                        }
                    }
                }

                info!("Chat pipeline worker stopped");
            })
            .map_err(|e| VoiceChatError::ChannelError(format!("Failed to spawn worker: {}", e)))?;

        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    struct EchoBackend;

    #[async_trait]
    impl ChatBackend for EchoBackend {
        async fn send(&self, message: &str) -> Result<String> {
            if message == "fail" {
                Err(VoiceChatError::HttpStatus {
                    status: 500,
                    body: String::new(),
                })
            } else {
                Ok(format!("echo: {}", message))
            }
        }
    }

    fn recv(rx: &Receiver<ChatEvent>) -> ChatEvent {
        rx.recv_timeout(Duration::from_secs(5)).expect("no chat event")
    }

    #[test]
    fn test_reply_and_error_events_in_order() {
        let pipeline = ChatPipeline::new(Arc::new(EchoBackend));
        let tx = pipeline.command_sender();
        let rx = pipeline.event_receiver();
        let handle = pipeline.start_worker().unwrap();

        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        tx.send(ChatCommand::Send {
            message: "hello".into(),
            request_id: first,
        })
        .unwrap();
        tx.send(ChatCommand::Send {
            message: "fail".into(),
            request_id: second,
        })
        .unwrap();

        match recv(&rx) {
            ChatEvent::Reply { request_id, text } => {
                assert_eq!(request_id, first);
                assert_eq!(text, "echo: hello");
            }
            other => panic!("unexpected event {:?}", other),
        }

        match recv(&rx) {
            ChatEvent::Error { request_id, error } => {
                assert_eq!(request_id, second);
                assert!(error.is_chat_error());
            }
            other => panic!("unexpected event {:?}", other),
        }

        tx.send(ChatCommand::Shutdown).unwrap();
        assert!(matches!(recv(&rx), ChatEvent::Shutdown));
        handle.join().unwrap();
    }

    struct SilentBackend;

    #[async_trait]
    impl ChatBackend for SilentBackend {
        async fn send(&self, _message: &str) -> Result<String> {
            std::future::pending().await
        }
    }

    #[test]
    fn test_cancel_releases_worker_blocked_on_request() {
        let pipeline = ChatPipeline::new(Arc::new(SilentBackend));
        let tx = pipeline.command_sender();
        let rx = pipeline.event_receiver();
        let cancel = pipeline.canceller();
        let handle = pipeline.start_worker().unwrap();

        tx.send(ChatCommand::Send {
            message: "anyone there?".into(),
            request_id: Uuid::new_v4(),
        })
        .unwrap();
        tx.send(ChatCommand::Shutdown).unwrap();
        cancel.cancel();

        assert!(matches!(recv(&rx), ChatEvent::Shutdown));
        handle.join().unwrap();
    }

    #[test]
    fn test_worker_exits_when_senders_dropped() {
        let pipeline = ChatPipeline::new(Arc::new(EchoBackend));
        let handle = pipeline.start_worker().unwrap();
        handle.join().unwrap();
    }
}
