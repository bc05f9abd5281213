//! Control channel.
//!
//! Translates [`Command`]s into manager calls. A spawned worker drains an
//! mpsc queue and handles every message in its own task, so overlapping
//! requests complete in whatever order their store operations finish.

mod message;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::extensions::{ExtensionManager, InstallError};
use crate::themes::{Category, ThemeManager};

pub use message::{Command, Reply, UploadFile};

/// Default depth of the worker queue.
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Control channel is closed")]
pub struct ChannelClosed;

/// Dispatches control messages to the extension and theme managers.
#[derive(Clone)]
pub struct ControlChannel {
    extensions: Arc<ExtensionManager>,
    themes: ThemeManager,
}

impl ControlChannel {
    pub fn new(extensions: Arc<ExtensionManager>, themes: ThemeManager) -> Self {
        Self { extensions, themes }
    }

    /// Handle one command. `None` means the command gets no reply.
    pub async fn dispatch(&self, command: Command) -> Option<Reply> {
        match command {
            Command::InstallExtension { file } => {
                let reply = match self.extensions.install_bundle_bytes(&file).await {
                    Ok(report) => Reply::InstallComplete {
                        success: true,
                        id: Some(report.id),
                        reason: None,
                    },
                    Err(e) => {
                        tracing::error!("Extension install failed: {}", e);
                        Reply::InstallComplete {
                            success: false,
                            id: install_error_id(&e),
                            reason: Some(e.to_string()),
                        }
                    }
                };
                Some(reply)
            }
            Command::RemoveExtension { extension_id } => {
                let reply = match self.extensions.try_remove(&extension_id).await {
                    Ok(_) => Reply::RemoveComplete {
                        success: true,
                        extension_id,
                        reason: None,
                    },
                    Err(e) => {
                        tracing::error!("Extension remove failed: {}", e);
                        Reply::RemoveComplete {
                            success: false,
                            extension_id,
                            reason: Some(e.to_string()),
                        }
                    }
                };
                Some(reply)
            }
            Command::ListExtensions => Some(Reply::ListExtensions {
                files: self.extensions.installed().await,
            }),
            Command::Upload { category, file } => {
                let category = known_category(&category)?;
                let success = self.themes.upload(category, &file.name, &file.data).await;
                Some(Reply::Upload { category, success })
            }
            Command::Remove { category, filename } => {
                let category = known_category(&category)?;
                let success = self.themes.remove_file(category, &filename).await;
                Some(Reply::Remove { category, success })
            }
            Command::List { category } => {
                let category = known_category(&category)?;
                let files = self.themes.list(category).await;
                Some(Reply::List { category, files })
            }
            Command::Unknown => {
                tracing::warn!("Ignoring control message of unknown type");
                None
            }
        }
    }

    /// Start a worker that serves requests sent through the returned handle.
    ///
    /// The worker stops once every handle has been dropped.
    pub fn spawn(self, queue_depth: usize) -> (ChannelHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<Envelope>(queue_depth.max(1));

        let worker = tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let channel = self.clone();
                tokio::spawn(async move {
                    let reply = channel.dispatch(envelope.command).await;
                    // The requester may have gone away; the work is done regardless.
                    let _ = envelope.reply.send(reply);
                });
            }
            tracing::debug!("Control channel worker stopped");
        });

        (ChannelHandle { tx }, worker)
    }
}

fn known_category(name: &str) -> Option<Category> {
    match name.parse::<Category>() {
        Ok(category) => Some(category),
        Err(e) => {
            tracing::warn!("{}", e);
            None
        }
    }
}

fn install_error_id(error: &InstallError) -> Option<String> {
    match error {
        InstallError::Bundle(_) => None,
        InstallError::Prepare { id, .. } | InstallError::PartialWrite { id, .. } => {
            Some(id.clone())
        }
    }
}

struct Envelope {
    command: Command,
    reply: oneshot::Sender<Option<Reply>>,
}

/// Sending side of a spawned [`ControlChannel`].
#[derive(Clone)]
pub struct ChannelHandle {
    tx: mpsc::Sender<Envelope>,
}

impl ChannelHandle {
    /// Send a command and wait for its reply.
    pub async fn request(&self, command: Command) -> Result<Option<Reply>, ChannelClosed> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Envelope { command, reply })
            .await
            .map_err(|_| ChannelClosed)?;
        response.await.map_err(|_| ChannelClosed)
    }
}
