//! Artifact types: the catalog record, the candidate handed in by the
//! boundary layer, and the identifier.

use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::sqlite::{SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef};
use sqlx::{Decode, Encode, FromRow, Sqlite, Type};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::blob_store::BlobPath;
use crate::error::{UploadError, ValidationError};

/// Artifact identifier, stored as TEXT in SQLite.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, Eq, PartialEq, Hash)]
#[serde(transparent)]
pub struct ArtifactId(Uuid);

impl ArtifactId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ArtifactId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ArtifactId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ArtifactId> for Uuid {
    fn from(val: ArtifactId) -> Self {
        val.0
    }
}

/// Parsing is the boundary's job; a bad string is an `InvalidId`.
impl FromStr for ArtifactId {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| UploadError::InvalidId(s.to_string()))
    }
}

impl std::fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Decode<'_, Sqlite> for ArtifactId {
    fn decode(value: SqliteValueRef<'_>) -> Result<Self, BoxDynError> {
        let s = <String as Decode<Sqlite>>::decode(value)?;
        Ok(Self(Uuid::parse_str(&s)?))
    }
}

impl Encode<'_, Sqlite> for ArtifactId {
    fn encode_by_ref(
        &self,
        args: &mut Vec<SqliteArgumentValue<'_>>,
    ) -> Result<IsNull, BoxDynError> {
        args.push(SqliteArgumentValue::Text(self.0.to_string().into()));
        Ok(IsNull::No)
    }
}

impl Type<Sqlite> for ArtifactId {
    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty)
    }

    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }
}

/// A cataloged artifact. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ArtifactRecord {
    pub id: ArtifactId,
    #[sqlx(rename = "filename")]
    pub name: String,
    #[sqlx(rename = "filesize")]
    pub size: i64,
    #[sqlx(rename = "filetype")]
    #[serde(rename = "type")]
    pub file_type: String,
    #[sqlx(rename = "createdAt")]
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ArtifactRecord {
    /// Where this record's blob lives.
    pub fn blob_path(&self) -> BlobPath {
        BlobPath::derive(&self.name, &self.file_type)
    }

    /// `name.type`, the original filename.
    pub fn filename(&self) -> String {
        format!("{}.{}", self.name, self.file_type)
    }
}

/// The metadata the validator looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactMeta {
    pub name: String,
    pub size: u64,
    pub file_type: String,
}

impl ArtifactMeta {
    pub fn new(name: impl Into<String>, size: u64, file_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            file_type: file_type.into(),
        }
    }

    pub fn blob_path(&self) -> BlobPath {
        BlobPath::derive(&self.name, &self.file_type)
    }
}

/// A complete candidate artifact: metadata plus the whole byte buffer.
#[derive(Debug, Clone)]
pub struct NewArtifact {
    pub meta: ArtifactMeta,
    pub data: Bytes,
}

impl NewArtifact {
    /// Size is always taken from the buffer.
    pub fn new(name: impl Into<String>, file_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            meta: ArtifactMeta::new(name, data.len() as u64, file_type),
            data,
        }
    }

    /// Split an uploaded filename into name and extension.
    ///
    /// Directory components are dropped, the split happens at the last
    /// dot and the extension is lowercased.
    pub fn from_filename(filename: &str, data: Bytes) -> Result<Self, ValidationError> {
        let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
        match base.rsplit_once('.') {
            Some((name, ext)) if !name.is_empty() && !ext.is_empty() => {
                Ok(Self::new(name, ext.to_ascii_lowercase(), data))
            }
            _ => Err(ValidationError::MissingExtension(filename.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let id = ArtifactId::new();
        let parsed: ArtifactId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);

        let err = "not-a-uuid".parse::<ArtifactId>().unwrap_err();
        assert!(matches!(err, UploadError::InvalidId(s) if s == "not-a-uuid"));
    }

    #[test]
    fn test_from_filename_splits_last_dot() {
        let artifact = NewArtifact::from_filename("report.PDF", Bytes::from_static(b"%PDF")).unwrap();
        assert_eq!(artifact.meta.name, "report");
        assert_eq!(artifact.meta.file_type, "pdf");
        assert_eq!(artifact.meta.size, 4);

        let artifact = NewArtifact::from_filename("scan.2024.png", Bytes::from_static(b"x")).unwrap();
        assert_eq!(artifact.meta.name, "scan.2024");
        assert_eq!(artifact.meta.file_type, "png");
    }

    #[test]
    fn test_from_filename_strips_directories() {
        let artifact =
            NewArtifact::from_filename("../../etc/photo.jpg", Bytes::from_static(b"x")).unwrap();
        assert_eq!(artifact.meta.name, "photo");

        let artifact =
            NewArtifact::from_filename("C:\\Users\\me\\photo.gif", Bytes::from_static(b"x")).unwrap();
        assert_eq!(artifact.meta.name, "photo");
    }

    #[test]
    fn test_from_filename_requires_extension() {
        for bad in ["README", ".pdf", "report.", ""] {
            let err = NewArtifact::from_filename(bad, Bytes::from_static(b"x")).unwrap_err();
            assert_eq!(err, ValidationError::MissingExtension(bad.to_string()));
        }
    }
}
