//! JSON-lines protocol between the presentation layer and the sync service.
//!
//! Each incoming line is an [`Envelope`]. Invoke channels answer with a
//! reply carrying the envelope's id; send channels answer nothing. Deletion
//! events are pushed to the writer as they happen.

use crate::domain::{Note, NoteId};
use crate::links::{LinkOpener, open_external_link};
use crate::sync::{SyncEvent, SyncHandle};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, error, info, trace, warn};

pub const NOTE_DELETED: &str = "note-deleted";

/// The channels the presentation layer may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    LoadNotes,
    SaveNotes,
    SaveNote,
    SaveNoteSync,
    DeleteNote,
    OpenExternalLink,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::LoadNotes => "load-notes",
            Channel::SaveNotes => "save-notes",
            Channel::SaveNote => "save-note",
            Channel::SaveNoteSync => "save-note-sync",
            Channel::DeleteNote => "delete-note",
            Channel::OpenExternalLink => "open-external-link",
        }
    }

    /// Whether the channel expects a reply.
    pub fn is_invoke(self) -> bool {
        matches!(self, Channel::LoadNotes | Channel::SaveNoteSync)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChannel(pub String);

impl fmt::Display for UnknownChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown channel: {}", self.0)
    }
}

impl std::error::Error for UnknownChannel {}

impl FromStr for Channel {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "load-notes" => Ok(Channel::LoadNotes),
            "save-notes" => Ok(Channel::SaveNotes),
            "save-note" => Ok(Channel::SaveNote),
            "save-note-sync" => Ok(Channel::SaveNoteSync),
            "delete-note" => Ok(Channel::DeleteNote),
            "open-external-link" => Ok(Channel::OpenExternalLink),
            other => Err(UnknownChannel(other.to_string())),
        }
    }
}

/// One incoming message.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub id: Option<u64>,
    pub channel: String,
    #[serde(default)]
    pub payload: Value,
}

/// One outgoing message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Outgoing {
    Reply {
        id: u64,
        ok: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Event {
        channel: String,
        payload: Value,
    },
}

impl Outgoing {
    pub fn ok(id: u64, value: Value) -> Self {
        Outgoing::Reply {
            id,
            ok: true,
            value: Some(value),
            error: None,
        }
    }

    pub fn err(id: u64, error: impl fmt::Display) -> Self {
        Outgoing::Reply {
            id,
            ok: false,
            value: None,
            error: Some(error.to_string()),
        }
    }

    pub fn from_event(event: &SyncEvent) -> Self {
        match event {
            SyncEvent::NoteDeleted(id) => Outgoing::Event {
                channel: NOTE_DELETED.to_string(),
                payload: Value::String(id.to_string()),
            },
        }
    }
}

/// Routes envelopes to the sync service and the link opener.
pub struct Dispatcher<O> {
    sync: SyncHandle,
    opener: O,
}

impl<O: LinkOpener> Dispatcher<O> {
    pub fn new(sync: SyncHandle, opener: O) -> Self {
        Self { sync, opener }
    }

    pub fn sync(&self) -> &SyncHandle {
        &self.sync
    }

    /// Parses and handles one line. Returns the reply to write, if any.
    pub async fn dispatch_line(&self, line: &str) -> Option<Outgoing> {
        match serde_json::from_str::<Envelope>(line) {
            Ok(envelope) => self.dispatch(envelope).await,
            Err(e) => {
                warn!(error = %e, "ignoring malformed message");
                None
            }
        }
    }

    pub async fn dispatch(&self, envelope: Envelope) -> Option<Outgoing> {
        let Envelope {
            id,
            channel,
            payload,
        } = envelope;

        let channel = match channel.parse::<Channel>() {
            Ok(channel) => channel,
            Err(e) => {
                warn!(error = %e, "rejecting message");
                return id.map(|id| Outgoing::err(id, e));
            }
        };
        trace!(%channel, ?id, "dispatching");

        if channel.is_invoke() {
            let Some(id) = id else {
                warn!(%channel, "ignoring invoke without an id");
                return None;
            };
            return Some(self.invoke(channel, id, payload).await);
        }

        self.send(channel, payload);
        None
    }

    async fn invoke(&self, channel: Channel, id: u64, payload: Value) -> Outgoing {
        match channel {
            Channel::LoadNotes => match self.sync.load_notes().await {
                Ok(notes) => match serde_json::to_value(notes) {
                    Ok(value) => Outgoing::ok(id, value),
                    Err(e) => Outgoing::err(id, e),
                },
                Err(e) => Outgoing::err(id, e),
            },
            Channel::SaveNoteSync => {
                let note = match serde_json::from_value::<Note>(payload) {
                    Ok(note) => note,
                    Err(e) => {
                        warn!(error = %e, "malformed note in save-note-sync");
                        return Outgoing::err(id, e);
                    }
                };
                match self.sync.save_note_sync(note).await {
                    Ok(()) => Outgoing::ok(id, Value::Bool(true)),
                    Err(e) => Outgoing::err(id, e),
                }
            }
            other => Outgoing::err(id, format!("{other} does not take replies")),
        }
    }

    fn send(&self, channel: Channel, payload: Value) {
        match channel {
            Channel::SaveNotes => {
                let Value::Array(entries) = payload else {
                    warn!("save-notes payload is not an array");
                    return;
                };
                let notes: Vec<Note> = entries
                    .into_iter()
                    .filter_map(|entry| match serde_json::from_value::<Note>(entry) {
                        Ok(note) => Some(note),
                        Err(e) => {
                            warn!(error = %e, "skipping malformed note in save-notes");
                            None
                        }
                    })
                    .collect();
                self.sync.save_notes(notes);
            }
            Channel::SaveNote => match serde_json::from_value::<Note>(payload) {
                Ok(note) => self.sync.save_note(note),
                Err(e) => warn!(error = %e, "malformed note in save-note"),
            },
            Channel::DeleteNote => match note_id(&payload) {
                Some(id) => self.sync.delete_note(id),
                None => warn!(payload = %payload, "delete-note needs a note id"),
            },
            Channel::OpenExternalLink => match payload.as_str() {
                Some(url) => {
                    open_external_link(&self.opener, url);
                }
                None => warn!(payload = %payload, "open-external-link needs a URL string"),
            },
            Channel::LoadNotes | Channel::SaveNoteSync => {
                debug!(%channel, "invoke channel reached send path");
            }
        }
    }
}

fn note_id(payload: &Value) -> Option<NoteId> {
    payload.as_str()?.parse().ok()
}

/// Serves the protocol until `reader` reaches end of input.
///
/// Replies and deletion events are written one JSON object per line. Lines
/// that are not UTF-8 are logged and skipped. At end of input the sync
/// service is shut down with a final flush and any events it produced on the
/// way are written before returning.
pub async fn serve<O, R, W>(
    dispatcher: &Dispatcher<O>,
    reader: R,
    mut writer: W,
) -> std::io::Result<()>
where
    O: LinkOpener,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut events = dispatcher.sync().subscribe();
    let mut lines = reader.split(b'\n');
    info!("serving notes over JSON lines");

    loop {
        tokio::select! {
            line = lines.next_segment() => {
                let Some(line) = line? else {
                    break;
                };
                let line = match String::from_utf8(line) {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(error = %e, "skipping line that is not UTF-8");
                        continue;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                if let Some(reply) = dispatcher.dispatch_line(&line).await {
                    write_message(&mut writer, &reply).await?;
                }
            }
            event = events.recv() => match event {
                Ok(event) => write_message(&mut writer, &Outgoing::from_event(&event)).await?,
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event subscriber lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    debug!("input closed, shutting down");
    if let Err(e) = dispatcher.sync().shutdown().await {
        error!(error = %e, "final flush failed");
    }
    drain_events(&mut events, &mut writer).await?;
    writer.flush().await
}

/// Writes every event still buffered in `events`, stepping over lag gaps.
async fn drain_events<W>(
    events: &mut broadcast::Receiver<SyncEvent>,
    writer: &mut W,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        match events.try_recv() {
            Ok(event) => write_message(writer, &Outgoing::from_event(&event)).await?,
            Err(TryRecvError::Lagged(skipped)) => warn!(skipped, "event subscriber lagged"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => return Ok(()),
        }
    }
}

async fn write_message<W>(writer: &mut W, message: &Outgoing) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}
