//! Orchestrator for the chat and read-aloud workers
//!
//! Builds both pipelines, starts their threads and hands the view a handle
//! holding every channel it needs.

use crate::chat::{ChatBackend, ChatCancel, ChatCommand, ChatEvent, ChatPipeline, ChatbaseClient};
use crate::config::{AppConfig, SpeechConfig};
use crate::speech::{create_backend, SpeechCommand, SpeechEvent, SpeechOutput, SpeechPipeline};
use crate::ui::AppState;
use crate::Result;
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info};

/// Channels the view uses to reach the workers
#[derive(Clone)]
pub struct OrchestratorHandle {
    chat_command_tx: Sender<ChatCommand>,
    chat_event_rx: Receiver<ChatEvent>,
    chat_cancel: ChatCancel,
    speech_command_tx: Sender<SpeechCommand>,
    speech_event_rx: Receiver<SpeechEvent>,
    speech_output: SpeechOutput,
}

impl OrchestratorHandle {
    pub fn chat_command_sender(&self) -> Sender<ChatCommand> {
        self.chat_command_tx.clone()
    }

    pub fn chat_event_receiver(&self) -> Receiver<ChatEvent> {
        self.chat_event_rx.clone()
    }

    pub fn speech_output(&self) -> SpeechOutput {
        self.speech_output.clone()
    }

    pub fn speech_event_receiver(&self) -> Receiver<SpeechEvent> {
        self.speech_event_rx.clone()
    }

    /// Attach `state` to the chat and read-aloud workers
    pub fn connect(&self, state: AppState) -> AppState {
        state
            .with_chat(self.chat_command_sender(), self.chat_event_receiver())
            .with_speaker(Box::new(self.speech_output()))
            .with_speech_events(self.speech_event_receiver())
    }

    /// Ask both workers to stop; workers that already exited are skipped.
    /// A chat request still waiting on the endpoint is abandoned.
    pub fn shutdown(&self) {
        if self.chat_command_tx.try_send(ChatCommand::Shutdown).is_err() {
            debug!("Chat pipeline already stopped or busy");
        }
        self.chat_cancel.cancel();
        if self.speech_command_tx.send(SpeechCommand::Shutdown).is_err() {
            debug!("Speech output already stopped");
        }
    }
}

pub struct Orchestrator {
    chat_pipeline: Option<ChatPipeline>,
    speech_pipeline: Option<SpeechPipeline>,
    speech_config: SpeechConfig,
}

impl Orchestrator {
    /// Create an orchestrator around any chat backend
    pub fn new(backend: Arc<dyn ChatBackend>, speech_config: SpeechConfig) -> (Self, OrchestratorHandle) {
        let chat_pipeline = ChatPipeline::new(backend);
        let speech_pipeline = SpeechPipeline::new(speech_config.queue_size);

        let handle = OrchestratorHandle {
            chat_command_tx: chat_pipeline.command_sender(),
            chat_event_rx: chat_pipeline.event_receiver(),
            chat_cancel: chat_pipeline.canceller(),
            speech_command_tx: speech_pipeline.command_sender(),
            speech_event_rx: speech_pipeline.event_receiver(),
            speech_output: speech_pipeline.output(),
        };

        let orchestrator = Self {
            chat_pipeline: Some(chat_pipeline),
            speech_pipeline: Some(speech_pipeline),
            speech_config,
        };

        (orchestrator, handle)
    }

    /// Create an orchestrator talking to the configured chatbot endpoint
    pub fn from_config(config: &AppConfig) -> Result<(Self, OrchestratorHandle)> {
        let client = ChatbaseClient::new(config.chat.clone())?;
        Ok(Self::new(Arc::new(client), config.speech.clone()))
    }

    /// Start the chat and read-aloud workers
    ///
    /// This consumes the orchestrator and returns join handles for the worker threads.
    pub fn start(mut self) -> Result<Vec<JoinHandle<()>>> {
        let mut handles = Vec::new();

        if let Some(chat_pipeline) = self.chat_pipeline.take() {
            handles.push(chat_pipeline.start_worker()?);
            info!("Chat pipeline started");
        }

        if let Some(speech_pipeline) = self.speech_pipeline.take() {
            let speech_config = self.speech_config.clone();
            handles.push(speech_pipeline.start_worker(move || create_backend(&speech_config))?);
            info!("Speech output started");
        }

        Ok(handles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use uuid::Uuid;

    struct UpperBackend;

    #[async_trait]
    impl ChatBackend for UpperBackend {
        async fn send(&self, message: &str) -> Result<String> {
            Ok(message.to_uppercase())
        }
    }

    fn quiet_speech() -> SpeechConfig {
        SpeechConfig {
            voice_command: Some(vec!["true".into()]),
            ..Default::default()
        }
    }

    #[test]
    fn test_handle_reaches_chat_worker() {
        let (orchestrator, handle) = Orchestrator::new(Arc::new(UpperBackend), quiet_speech());
        let workers = orchestrator.start().unwrap();
        assert_eq!(workers.len(), 2);

        let request_id = Uuid::new_v4();
        handle
            .chat_command_sender()
            .send(ChatCommand::Send {
                message: "ping".into(),
                request_id,
            })
            .unwrap();

        match handle.chat_event_receiver().recv_timeout(Duration::from_secs(5)) {
            Ok(ChatEvent::Reply { request_id: id, text }) => {
                assert_eq!(id, request_id);
                assert_eq!(text, "PING");
            }
            other => panic!("unexpected event: {:?}", other),
        }

        handle.shutdown();
        for worker in workers {
            worker.join().unwrap();
        }
    }

    struct HangingBackend;

    #[async_trait]
    impl ChatBackend for HangingBackend {
        async fn send(&self, _message: &str) -> Result<String> {
            std::future::pending().await
        }
    }

    #[test]
    fn test_shutdown_does_not_wait_for_unanswered_request() {
        let (orchestrator, handle) = Orchestrator::new(Arc::new(HangingBackend), quiet_speech());
        let workers = orchestrator.start().unwrap();

        handle
            .chat_command_sender()
            .send(ChatCommand::Send {
                message: "hello".into(),
                request_id: Uuid::new_v4(),
            })
            .unwrap();
        std::thread::sleep(Duration::from_millis(50));
        handle.shutdown();

        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        std::thread::spawn(move || {
            for worker in workers {
                worker.join().unwrap();
            }
            let _ = done_tx.send(());
        });
        assert!(done_rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_from_config() {
        let config = AppConfig::default();
        assert!(Orchestrator::from_config(&config).is_ok());
    }
}
