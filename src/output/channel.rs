//! Channel-backed sink and the JSON-lines writer draining it
//!
//! The crawler pushes records onto an unbounded channel and moves on. A
//! separate task owns the output stream, serializes each record as one line of
//! JSON, and logs any record it fails to write.

use crate::output::traits::{Institution, InstitutionSink};
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// [`InstitutionSink`] handing records to a writer task
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: UnboundedSender<Institution>,
}

impl ChannelSink {
    /// Creates a sink and the receiving end for [`spawn_writer`]
    pub fn channel() -> (Self, UnboundedReceiver<Institution>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl InstitutionSink for ChannelSink {
    fn send(&self, institution: Institution) {
        if let Err(e) = self.sender.send(institution) {
            tracing::error!("Failed to send: {} (writer has stopped)", e.0);
        }
    }
}

/// Opens the output stream: the given file, or stdout when no path is set
pub async fn open_output(
    path: Option<&Path>,
) -> std::io::Result<Box<dyn AsyncWrite + Unpin + Send>> {
    match path {
        Some(path) => {
            let file = tokio::fs::File::create(path).await?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(tokio::io::stdout())),
    }
}

/// Spawns the task writing received institutions as JSON lines
///
/// The task ends once every [`ChannelSink`] clone has been dropped and the
/// channel is drained. It resolves to the number of records written.
pub fn spawn_writer<W>(mut receiver: UnboundedReceiver<Institution>, mut writer: W) -> JoinHandle<usize>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut written = 0;

        while let Some(institution) = receiver.recv().await {
            match write_record(&mut writer, &institution).await {
                Ok(()) => {
                    tracing::debug!("Sent: {}", institution);
                    written += 1;
                }
                Err(e) => {
                    tracing::error!("Failed to send: {}: {}", institution, e);
                }
            }
        }

        if let Err(e) = writer.flush().await {
            tracing::error!("Failed to flush institution output: {}", e);
        }

        written
    })
}

async fn write_record<W>(writer: &mut W, institution: &Institution) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(institution)?;
    line.push(b'\n');
    writer.write_all(&line).await
}
