/// File hierarchy data model
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Identity of a file record
pub type FileId = Uuid;

/// Identity of a record owner
pub type UserId = Uuid;

/// The three valid record kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Folder,
    File,
    Image,
}

impl FileKind {
    /// Parse a client-supplied kind string; `None` for anything outside
    /// the three valid kinds.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "folder" => Some(FileKind::Folder),
            "file" => Some(FileKind::File),
            "image" => Some(FileKind::Image),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Folder => "folder",
            FileKind::File => "file",
            FileKind::Image => "image",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific part of a record. Only non-folder variants carry a
/// blob location, so a folder with a blob is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileBody {
    Folder,
    File { local_path: PathBuf },
    Image { local_path: PathBuf },
}

impl FileBody {
    pub fn kind(&self) -> FileKind {
        match self {
            FileBody::Folder => FileKind::Folder,
            FileBody::File { .. } => FileKind::File,
            FileBody::Image { .. } => FileKind::Image,
        }
    }

    pub fn local_path(&self) -> Option<&Path> {
        match self {
            FileBody::Folder => None,
            FileBody::File { local_path } | FileBody::Image { local_path } => Some(local_path),
        }
    }

    /// Rebuild a body from its persisted columns. A non-folder row
    /// without a blob location is corrupt.
    pub fn from_columns(kind: &str, local_path: Option<String>) -> Result<Self> {
        match (FileKind::parse(kind), local_path) {
            (Some(FileKind::Folder), None) => Ok(FileBody::Folder),
            (Some(FileKind::File), Some(p)) => Ok(FileBody::File {
                local_path: PathBuf::from(p),
            }),
            (Some(FileKind::Image), Some(p)) => Ok(FileBody::Image {
                local_path: PathBuf::from(p),
            }),
            (Some(k), p) => Err(Error::Internal(format!(
                "Corrupt file row: kind {} with local_path {:?}",
                k, p
            ))),
            (None, _) => Err(Error::Internal(format!("Corrupt file row: kind {}", kind))),
        }
    }
}

/// A persisted file hierarchy record
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub id: FileId,
    pub owner_id: UserId,
    pub name: String,
    /// `None` means the record sits at the root of the owner's tree
    pub parent_id: Option<FileId>,
    pub is_public: bool,
    pub body: FileBody,
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn kind(&self) -> FileKind {
        self.body.kind()
    }

    pub fn local_path(&self) -> Option<&Path> {
        self.body.local_path()
    }

    /// Client-facing projection. The blob location is a server-side
    /// path; include it only for callers allowed to see it.
    pub fn to_view(&self, include_local_path: bool) -> FileView {
        FileView {
            id: self.id.to_string(),
            owner_id: self.owner_id.to_string(),
            name: self.name.clone(),
            kind: self.kind(),
            parent_id: self.parent_id.map(|p| p.to_string()),
            is_public: self.is_public,
            local_path: if include_local_path {
                self.local_path().map(|p| p.to_string_lossy().into_owned())
            } else {
                None
            },
        }
    }
}

/// Metadata read contract: `{id, ownerId, name, type, parentId,
/// isPublic}` plus `localPath` only when explicitly requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileView {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub parent_id: Option<String>,
    pub is_public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
}
