//! Student-scoped document photo storage.
//!
//! The service is bound to one student's record directory at construction and
//! validates eagerly: the students root and the student directory must already
//! exist, and paths are canonicalised so no operation can escape them. Photos
//! are stored content-addressed under `documents/sha256/` with a two-level
//! shard derived from the hash, with a JSON metadata sidecar beside each blob.

use crate::{FilesError, DOCUMENTS_FOLDER_NAME};
use chrono::{DateTime, Utc};
use preflight_types::{NonEmptyText, Sha256Hash, StudentId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Which certification document a stored photo shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    PilotCertificate,
    MedicalCertificate,
}

impl DocumentKind {
    /// Convert to the wire/CLI string form.
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::PilotCertificate => "pilot_certificate",
            DocumentKind::MedicalCertificate => "medical_certificate",
        }
    }

    /// Parse from the wire/CLI string form.
    pub fn parse(s: &str) -> Result<Self, FilesError> {
        match s {
            "pilot_certificate" => Ok(DocumentKind::PilotCertificate),
            "medical_certificate" => Ok(DocumentKind::MedicalCertificate),
            other => Err(FilesError::UnknownDocumentKind(other.to_owned())),
        }
    }
}

/// Metadata for a stored document photo.
///
/// Serialized as a JSON sidecar beside the binary file. Contains no checklist
/// or name data, only storage facts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// Hashing algorithm used (always "sha256" for the current implementation)
    pub hash_algorithm: NonEmptyText,

    /// Hexadecimal digest of the file content
    pub hash: Sha256Hash,

    /// Which certification document the photo shows
    pub kind: DocumentKind,

    /// Path relative to the student's record directory
    pub relative_path: NonEmptyText,

    /// Size of the file in bytes
    pub size_bytes: u64,

    /// Detected media type (MIME), best-effort; `None` if undetected
    pub media_type: Option<NonEmptyText>,

    /// Original filename from the capture
    pub original_filename: NonEmptyText,

    /// UTC timestamp when the file was stored
    pub stored_at: DateTime<Utc>,
}

/// Service for managing one student's captured document photos.
///
/// - Student-scoped: each instance is bound to one student record
/// - Immutable: files are never modified after creation
/// - Content-addressed: files are identified by their SHA-256 hash
/// - Defensive: paths are canonicalised at construction
#[derive(Debug)]
pub struct DocumentsService {
    students_dir: PathBuf,
    student_id: StudentId,
}

impl DocumentsService {
    /// Creates a service bound to one student's record directory.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if the students directory or the student's record
    /// directory does not exist, or canonicalisation fails.
    pub fn new(students_dir: &Path, student_id: StudentId) -> Result<Self, FilesError> {
        if !students_dir.is_dir() {
            return Err(FilesError::InvalidStudentsDirectory(format!(
                "not a directory: {}",
                students_dir.display()
            )));
        }

        let students_dir = students_dir.canonicalize().map_err(|e| {
            FilesError::InvalidStudentsDirectory(format!(
                "cannot canonicalize {}: {}",
                students_dir.display(),
                e
            ))
        })?;

        let student_root = student_id.sharded_dir(&students_dir);
        if !student_root.is_dir() {
            return Err(FilesError::StudentNotFound(format!(
                "student directory does not exist: {}",
                student_root.display()
            )));
        }

        Ok(Self {
            students_dir,
            student_id,
        })
    }

    /// Stores photo bytes in content-addressed storage.
    ///
    /// Computes the SHA-256 hash, writes the blob and its metadata sidecar
    /// under the sharded path, and returns the metadata. Duplicate content is
    /// rejected (immutability).
    pub fn add_bytes(
        &self,
        bytes: &[u8],
        original_filename: &str,
        kind: DocumentKind,
    ) -> Result<DocumentMetadata, FilesError> {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let hash_array: [u8; 32] = hasher.finalize().into();
        let hash = Sha256Hash::from_bytes(&hash_array);

        let storage_path = self.compute_storage_path(hash.as_str());
        if storage_path.exists() {
            return Err(FilesError::DocumentAlreadyExists(hash.to_string()));
        }

        if let Some(parent) = storage_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&storage_path, bytes)?;

        let original_filename = NonEmptyText::new(if original_filename.trim().is_empty() {
            "unknown"
        } else {
            original_filename
        })
        .expect("filename fallback is non-empty");

        let media_type = infer::get(bytes)
            .map(|k| NonEmptyText::new(k.mime_type()).expect("mime type is non-empty"));

        let metadata = DocumentMetadata {
            hash_algorithm: NonEmptyText::new("sha256").expect("sha256 is non-empty"),
            hash,
            kind,
            relative_path: self.compute_relative_path_text(&hash_array),
            size_bytes: bytes.len() as u64,
            media_type,
            original_filename,
            stored_at: Utc::now(),
        };

        let sidecar = storage_path.with_extension("json");
        let json = serde_json::to_string_pretty(&metadata)?;
        fs::write(sidecar, json)?;

        Ok(metadata)
    }

    /// Stores a photo read from the filesystem. See [`Self::add_bytes`].
    pub fn add(&self, source_path: &Path, kind: DocumentKind) -> Result<DocumentMetadata, FilesError> {
        let bytes = fs::read(source_path).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read source file {}: {}", source_path.display(), e),
            ))
        })?;
        let filename = source_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        self.add_bytes(&bytes, filename, kind)
    }

    /// Reads stored photo bytes by content hash.
    pub fn read(&self, hash: &Sha256Hash) -> Result<Vec<u8>, FilesError> {
        let storage_path = self.compute_storage_path(hash.as_str());
        if !storage_path.exists() {
            return Err(FilesError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("document not found for hash: {}", hash),
            )));
        }
        Ok(fs::read(&storage_path)?)
    }

    /// Lists metadata for every stored document, in no particular order.
    ///
    /// Unparseable sidecars are skipped; the blob remains on disk.
    pub fn list(&self) -> Result<Vec<DocumentMetadata>, FilesError> {
        let sha_dir = self.documents_dir().join("sha256");
        let mut documents = Vec::new();
        if !sha_dir.is_dir() {
            return Ok(documents);
        }

        for s1 in fs::read_dir(&sha_dir)?.flatten() {
            if !s1.path().is_dir() {
                continue;
            }
            for s2 in fs::read_dir(s1.path())?.flatten() {
                if !s2.path().is_dir() {
                    continue;
                }
                for entry in fs::read_dir(s2.path())?.flatten() {
                    let path = entry.path();
                    if path.extension().and_then(|e| e.to_str()) != Some("json") {
                        continue;
                    }
                    match fs::read_to_string(&path)
                        .map_err(FilesError::from)
                        .and_then(|c| Ok(serde_json::from_str::<DocumentMetadata>(&c)?))
                    {
                        Ok(metadata) => documents.push(metadata),
                        Err(_) => continue,
                    }
                }
            }
        }
        Ok(documents)
    }

    fn student_root(&self) -> PathBuf {
        self.student_id.sharded_dir(&self.students_dir)
    }

    fn documents_dir(&self) -> PathBuf {
        self.student_root().join(DOCUMENTS_FOLDER_NAME)
    }

    /// `<student_root>/documents/sha256/<h1>/<h2>/<hash>`
    fn compute_storage_path(&self, hash_hex: &str) -> PathBuf {
        let shard1 = &hash_hex[0..2];
        let shard2 = &hash_hex[2..4];
        self.documents_dir()
            .join("sha256")
            .join(shard1)
            .join(shard2)
            .join(hash_hex)
    }

    fn compute_relative_path_text(&self, hash_bytes: &[u8; 32]) -> NonEmptyText {
        let hash_hex = hex::encode(hash_bytes);
        let shard1 = &hash_hex[0..2];
        let shard2 = &hash_hex[2..4];
        NonEmptyText::new(format!(
            "{}/sha256/{}/{}/{}",
            DOCUMENTS_FOLDER_NAME, shard1, shard2, hash_hex
        ))
        .expect("computed path is non-empty")
    }
}
