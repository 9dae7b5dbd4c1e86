//! Typed request/reply model layered on the wire codec.
//!
//! Requests put the command name in the first token and positional
//! parameters after it. Push/commit batches interleave entry fields with
//! content tokens. Replies lead with `ok` or `err`; an error reply carries a
//! stable code token plus a human-readable detail.

use crate::error::{Error, ProtocolError, Result};
use crate::manifest::{EntryStatus, FileEntry, Manifest};
use crate::store::ContentHash;
use crate::wire::Frame;
use bytes::Bytes;

pub const CMD_CREATE_PROJECT: &str = "create_project";
pub const CMD_PUSH: &str = "push";
pub const CMD_COMMIT: &str = "commit";
pub const CMD_CHECKOUT: &str = "checkout";
pub const CMD_GET_CURRENT_VERSION: &str = "get_current_version";
pub const CMD_ROLLBACK: &str = "rollback";

const REPLY_OK: &str = "ok";
const REPLY_ERR: &str = "err";

/// One file in a push/commit batch: the manifest entry plus the bytes to
/// store, when the entry carries any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEntry {
    pub entry: FileEntry,
    pub content: Option<Bytes>,
}

impl PushEntry {
    pub fn new(entry: FileEntry, content: Option<Bytes>) -> Self {
        Self { entry, content }
    }

    /// Whether a content token follows this entry on the wire. Deleted
    /// entries have nothing to ship, and empty files cannot (the grammar
    /// has no zero-length token): receivers recognize them by the empty
    /// digest.
    pub fn carries_content(entry: &FileEntry) -> bool {
        entry.status != EntryStatus::Deleted && entry.hash != ContentHash::empty()
    }
}

/// A decoded client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    CreateProject { project: String },
    Push { project: String, batch: Vec<PushEntry> },
    Commit { project: String, batch: Vec<PushEntry> },
    Checkout { project: String },
    GetCurrentVersion { project: String },
    Rollback { project: String },
}

impl Request {
    pub fn command(&self) -> &'static str {
        match self {
            Request::CreateProject { .. } => CMD_CREATE_PROJECT,
            Request::Push { .. } => CMD_PUSH,
            Request::Commit { .. } => CMD_COMMIT,
            Request::Checkout { .. } => CMD_CHECKOUT,
            Request::GetCurrentVersion { .. } => CMD_GET_CURRENT_VERSION,
            Request::Rollback { .. } => CMD_ROLLBACK,
        }
    }

    pub fn project(&self) -> &str {
        match self {
            Request::CreateProject { project }
            | Request::Push { project, .. }
            | Request::Commit { project, .. }
            | Request::Checkout { project }
            | Request::GetCurrentVersion { project }
            | Request::Rollback { project } => project,
        }
    }

    pub fn to_frame(&self) -> Frame {
        match self {
            Request::Push { project, batch } => batch_frame(CMD_PUSH, project, batch),
            Request::Commit { project, batch } => batch_frame(CMD_COMMIT, project, batch),
            Request::CreateProject { project }
            | Request::Checkout { project }
            | Request::GetCurrentVersion { project }
            | Request::Rollback { project } => Frame::new(
                self.command(),
                vec![Bytes::from(project.clone().into_bytes())],
            ),
        }
    }

    pub fn from_frame(frame: &Frame) -> Result<Self> {
        match frame.command.as_str() {
            CMD_CREATE_PROJECT => Ok(Request::CreateProject {
                project: single_project_param(frame, CMD_CREATE_PROJECT)?,
            }),
            CMD_CHECKOUT => Ok(Request::Checkout {
                project: single_project_param(frame, CMD_CHECKOUT)?,
            }),
            CMD_GET_CURRENT_VERSION => Ok(Request::GetCurrentVersion {
                project: single_project_param(frame, CMD_GET_CURRENT_VERSION)?,
            }),
            CMD_ROLLBACK => Ok(Request::Rollback {
                project: single_project_param(frame, CMD_ROLLBACK)?,
            }),
            CMD_PUSH => {
                let (project, batch) = parse_batch(frame, CMD_PUSH)?;
                Ok(Request::Push { project, batch })
            }
            CMD_COMMIT => {
                let (project, batch) = parse_batch(frame, CMD_COMMIT)?;
                Ok(Request::Commit { project, batch })
            }
            other => Err(ProtocolError::UnknownCommand(other.to_string()).into()),
        }
    }
}

fn batch_frame(command: &'static str, project: &str, batch: &[PushEntry]) -> Frame {
    let mut params = Vec::with_capacity(2 + batch.len() * 2);
    params.push(Bytes::from(project.to_string().into_bytes()));
    params.push(Bytes::from(batch.len().to_string().into_bytes()));
    for push_entry in batch {
        params.push(Bytes::from(push_entry.entry.to_field().into_bytes()));
        if PushEntry::carries_content(&push_entry.entry) {
            // A missing content here surfaces as a zero-length token error
            // at encode time.
            params.push(push_entry.content.clone().unwrap_or_default());
        }
    }
    Frame::new(command, params)
}

fn single_project_param(frame: &Frame, command: &'static str) -> Result<String> {
    if frame.params.len() != 1 {
        return Err(ProtocolError::Arity {
            command,
            expected: 1,
            got: frame.params.len(),
        }
        .into());
    }
    project_param(&frame.params[0])
}

fn project_param(token: &Bytes) -> Result<String> {
    String::from_utf8(token.to_vec()).map_err(|_| {
        ProtocolError::InvalidProjectName(String::from_utf8_lossy(token).into_owned()).into()
    })
}

fn parse_batch(frame: &Frame, command: &'static str) -> Result<(String, Vec<PushEntry>)> {
    if frame.params.len() < 2 {
        return Err(ProtocolError::Arity {
            command,
            expected: 2,
            got: frame.params.len(),
        }
        .into());
    }
    let project = project_param(&frame.params[0])?;
    let count_text = String::from_utf8_lossy(&frame.params[1]).into_owned();
    let count: usize = count_text
        .parse()
        .map_err(|_| ProtocolError::BadCount(count_text.clone()))?;

    let mut batch = Vec::with_capacity(count);
    let mut idx = 2usize;
    for _ in 0..count {
        let field_token = frame.params.get(idx).ok_or(ProtocolError::Arity {
            command,
            expected: idx + 1,
            got: frame.params.len(),
        })?;
        idx += 1;
        let field = std::str::from_utf8(field_token)
            .map_err(|_| ProtocolError::BadEntry("entry field is not valid UTF-8".into()))?;
        let entry = FileEntry::parse_field(field)
            .map_err(|e| ProtocolError::BadEntry(e.to_string()))?;
        let content = if PushEntry::carries_content(&entry) {
            let token = frame.params.get(idx).ok_or(ProtocolError::Arity {
                command,
                expected: idx + 1,
                got: frame.params.len(),
            })?;
            idx += 1;
            Some(token.clone())
        } else {
            None
        };
        batch.push(PushEntry { entry, content });
    }
    if idx != frame.params.len() {
        return Err(ProtocolError::Arity {
            command,
            expected: idx,
            got: frame.params.len(),
        }
        .into());
    }
    Ok((project, batch))
}

/// A server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// New (or current) manifest version.
    Version(u64),
    /// Full manifest snapshot plus tracked file contents, in manifest order
    /// (one token per entry that carries content on the wire).
    Snapshot {
        manifest: Manifest,
        contents: Vec<Bytes>,
    },
    /// Error code plus human-readable detail.
    Error { code: String, message: String },
}

impl Reply {
    pub fn from_error(err: &Error) -> Self {
        Reply::Error {
            code: err.code().to_string(),
            message: err.detail(),
        }
    }

    pub fn to_frame(&self) -> Frame {
        match self {
            Reply::Version(version) => Frame::new(
                REPLY_OK,
                vec![Bytes::from(version.to_string().into_bytes())],
            ),
            Reply::Snapshot { manifest, contents } => {
                let mut params = Vec::with_capacity(1 + contents.len());
                params.push(Bytes::from(manifest.to_text().into_bytes()));
                params.extend(contents.iter().cloned());
                Frame::new(REPLY_OK, params)
            }
            Reply::Error { code, message } => {
                let message = if message.is_empty() { code } else { message };
                Frame::new(
                    REPLY_ERR,
                    vec![
                        Bytes::from(code.clone().into_bytes()),
                        Bytes::from(message.clone().into_bytes()),
                    ],
                )
            }
        }
    }
}

/// Surface an error reply as an `Err`, or confirm an `ok` reply.
fn check_reply(frame: &Frame) -> Result<()> {
    match frame.command.as_str() {
        REPLY_OK => Ok(()),
        REPLY_ERR => {
            if frame.params.len() != 2 {
                return Err(ProtocolError::BadReply(format!(
                    "error reply with {} parameters",
                    frame.params.len()
                ))
                .into());
            }
            let code = String::from_utf8_lossy(&frame.params[0]);
            let message = String::from_utf8_lossy(&frame.params[1]);
            Err(Error::from_wire(&code, &message))
        }
        other => Err(ProtocolError::BadReply(format!("unknown reply {other:?}")).into()),
    }
}

/// Decode the reply to a version-returning command.
pub fn decode_version_reply(frame: &Frame) -> Result<u64> {
    check_reply(frame)?;
    if frame.params.len() != 1 {
        return Err(ProtocolError::BadReply(format!(
            "version reply with {} parameters",
            frame.params.len()
        ))
        .into());
    }
    let text = String::from_utf8_lossy(&frame.params[0]).into_owned();
    text.parse()
        .map_err(|_| ProtocolError::BadReply(format!("bad version {text:?}")).into())
}

/// Decode a checkout reply, verifying every content token against its
/// entry's digest.
pub fn decode_snapshot_reply(frame: &Frame) -> Result<(Manifest, Vec<Bytes>)> {
    check_reply(frame)?;
    if frame.params.is_empty() {
        return Err(ProtocolError::BadReply("snapshot reply with no manifest".into()).into());
    }
    let text = std::str::from_utf8(&frame.params[0])
        .map_err(|_| ProtocolError::BadReply("manifest payload is not valid UTF-8".into()))?;
    let manifest = Manifest::parse(text)?;

    let with_content: Vec<&FileEntry> = manifest
        .entries()
        .iter()
        .filter(|e| PushEntry::carries_content(e))
        .collect();
    let contents = &frame.params[1..];
    if contents.len() != with_content.len() {
        return Err(ProtocolError::BadReply(format!(
            "expected {} content tokens, got {}",
            with_content.len(),
            contents.len()
        ))
        .into());
    }
    for (entry, content) in with_content.iter().zip(contents) {
        if ContentHash::from_data(content) != entry.hash {
            return Err(ProtocolError::HashMismatch(entry.path.clone()).into());
        }
    }
    Ok((manifest, contents.to_vec()))
}
