//! Async host wrapper around a `CaptureSession`.
//!
//! Interaction, navigation and network updates each have their own sender on
//! the handle, but every sender feeds the same queue. The actor task applies
//! messages strictly in the order they were enqueued. Control requests (start,
//! stop, status, snapshot) share that queue and get a oneshot reply, so a
//! snapshot reflects everything sent before it.

use crate::entries::TimelineEntry;
use crate::error::CaptureError;
use crate::protocol::{
    InteractionEvent, NavigationEvent, Notification, StartRequest, TransactionCompleted,
    TransactionFailed, TransactionHeaders, TransactionStart,
};
use crate::session::{CaptureSession, FinishedRecording, RecordingStatus};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

const CHANNEL_CAPACITY: usize = 100;

#[derive(Debug, Error)]
pub enum ActorError {
    #[error("Session actor is no longer running")]
    Closed,
    #[error(transparent)]
    Capture(#[from] CaptureError),
}

/// Lifecycle updates from the network layer.
#[derive(Debug, Clone)]
pub enum NetworkUpdate {
    Started(TransactionStart),
    Headers(TransactionHeaders),
    Completed(TransactionCompleted),
    Failed(TransactionFailed),
}

enum Message {
    Interaction(InteractionEvent),
    Navigation(NavigationEvent),
    Network(NetworkUpdate),
    Control(Control),
}

enum Control {
    Start(StartRequest, oneshot::Sender<Result<(), CaptureError>>),
    Stop(oneshot::Sender<Result<FinishedRecording, CaptureError>>),
    Status(oneshot::Sender<RecordingStatus>),
    Snapshot(oneshot::Sender<Vec<TimelineEntry>>),
}

#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Message>,
}

impl SessionHandle {
    pub async fn start(&self, request: StartRequest) -> Result<(), ActorError> {
        let result = self
            .request(|reply| Control::Start(request, reply))
            .await?;
        Ok(result?)
    }

    pub async fn stop(&self) -> Result<FinishedRecording, ActorError> {
        let result = self.request(Control::Stop).await?;
        Ok(result?)
    }

    pub async fn status(&self) -> Result<RecordingStatus, ActorError> {
        self.request(Control::Status).await
    }

    pub async fn snapshot(&self) -> Result<Vec<TimelineEntry>, ActorError> {
        self.request(Control::Snapshot).await
    }

    pub async fn interaction(&self, event: InteractionEvent) -> Result<(), ActorError> {
        self.send(Message::Interaction(event)).await
    }

    pub async fn navigation(&self, event: NavigationEvent) -> Result<(), ActorError> {
        self.send(Message::Navigation(event)).await
    }

    pub async fn network(&self, update: NetworkUpdate) -> Result<(), ActorError> {
        self.send(Message::Network(update)).await
    }

    /// Route a decoded notification to its sender. `Stop` waits for and
    /// returns the finished recording.
    pub async fn dispatch(
        &self,
        notification: Notification,
    ) -> Result<Option<FinishedRecording>, ActorError> {
        match notification {
            Notification::Start(request) => self.start(request).await.map(|_| None),
            Notification::Stop => self.stop().await.map(Some),
            Notification::Interaction(event) => self.interaction(event).await.map(|_| None),
            Notification::Navigation(event) => self.navigation(event).await.map(|_| None),
            Notification::RequestStarted(start) => self
                .network(NetworkUpdate::Started(start))
                .await
                .map(|_| None),
            Notification::RequestHeaders(update) => self
                .network(NetworkUpdate::Headers(update))
                .await
                .map(|_| None),
            Notification::RequestCompleted(completed) => self
                .network(NetworkUpdate::Completed(completed))
                .await
                .map(|_| None),
            Notification::RequestFailed(failed) => self
                .network(NetworkUpdate::Failed(failed))
                .await
                .map(|_| None),
        }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Control,
    ) -> Result<T, ActorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Message::Control(build(reply_tx))).await?;
        reply_rx.await.map_err(|_| ActorError::Closed)
    }

    async fn send(&self, message: Message) -> Result<(), ActorError> {
        self.tx.send(message).await.map_err(|_| ActorError::Closed)
    }
}

pub struct SessionActor {
    session: CaptureSession,
    rx: mpsc::Receiver<Message>,
}

impl SessionActor {
    /// Move `session` into a background task. The task ends when every
    /// handle has been dropped and hands the session back.
    pub fn spawn(session: CaptureSession) -> (SessionHandle, JoinHandle<CaptureSession>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let actor = SessionActor { session, rx };
        let task = tokio::spawn(actor.run());
        (SessionHandle { tx }, task)
    }

    async fn run(mut self) -> CaptureSession {
        debug!("Session actor started");
        while let Some(message) = self.rx.recv().await {
            match message {
                Message::Interaction(event) => {
                    let _ = self.session.record_interaction(event);
                }
                Message::Navigation(event) => {
                    let _ = self.session.record_navigation(event);
                }
                Message::Network(update) => self.apply_network(update),
                Message::Control(control) => self.apply_control(control),
            }
        }
        info!("Session actor stopped");
        self.session
    }

    fn apply_network(&mut self, update: NetworkUpdate) {
        let outcome = match update {
            NetworkUpdate::Started(start) => {
                self.session.request_started(start);
                return;
            }
            NetworkUpdate::Headers(headers) => {
                self.session.request_headers(headers);
                return;
            }
            NetworkUpdate::Completed(completed) => self.session.request_completed(completed),
            NetworkUpdate::Failed(failed) => self.session.request_failed(failed),
        };
        if let Err(e) = outcome {
            debug!("Ignoring network update: {}", e);
        }
    }

    // A dropped reply receiver only means the caller stopped waiting.
    fn apply_control(&mut self, control: Control) {
        match control {
            Control::Start(request, reply) => {
                let _ = reply.send(self.session.start(request));
            }
            Control::Stop(reply) => {
                let _ = reply.send(self.session.stop());
            }
            Control::Status(reply) => {
                let _ = reply.send(self.session.status());
            }
            Control::Snapshot(reply) => {
                let _ = reply.send(self.session.snapshot().to_vec());
            }
        }
    }
}
