use crate::core::regression::forest::RandomForest;
use crate::core::regression::scaler::StandardScaler;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Artifact encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("Expected a '{expected}' artifact, found '{found}'")]
    KindMismatch { expected: &'static str, found: String },

    #[error("Unsupported '{kind}' artifact format version {found} (expected {expected})")]
    VersionMismatch {
        kind: &'static str,
        expected: u32,
        found: u32,
    },

    #[error(
        "Timed out waiting for the bootstrap lock '{}'; remove it if no other process is training",
        .path.display()
    )]
    LockTimeout { path: PathBuf },
}

impl ArtifactError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactHeader {
    kind: String,
    format_version: u32,
}

/// A value that can be persisted as a self-describing binary artifact.
///
/// Implementors only name their kind and format version; encoding and the header check are
/// shared.
pub trait Artifact: Serialize + DeserializeOwned {
    /// Stable identifier written into the artifact header.
    const KIND: &'static str;

    /// Bumped whenever the serialized layout of the implementor changes.
    const FORMAT_VERSION: u32;

    /// Reads an artifact from a reader, validating its header.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::KindMismatch`] or [`ArtifactError::VersionMismatch`] if the
    /// header does not describe this type, or [`ArtifactError::Encoding`] if decoding fails.
    fn read_from(reader: &mut impl Read) -> Result<Self, ArtifactError> {
        let header: ArtifactHeader = bincode::deserialize_from(&mut *reader)?;
        if header.kind != Self::KIND {
            return Err(ArtifactError::KindMismatch {
                expected: Self::KIND,
                found: header.kind,
            });
        }
        if header.format_version != Self::FORMAT_VERSION {
            return Err(ArtifactError::VersionMismatch {
                kind: Self::KIND,
                expected: Self::FORMAT_VERSION,
                found: header.format_version,
            });
        }
        Ok(bincode::deserialize_from(reader)?)
    }

    fn write_to(&self, writer: &mut impl Write) -> Result<(), ArtifactError> {
        let header = ArtifactHeader {
            kind: Self::KIND.to_string(),
            format_version: Self::FORMAT_VERSION,
        };
        bincode::serialize_into(&mut *writer, &header)?;
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ArtifactError::io(path, e))?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes the artifact next to `path` and renames it into place, so readers never observe
    /// a partially written file.
    fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), ArtifactError> {
        let path = path.as_ref();
        let tmp = path.with_extension("tmp");
        {
            let file = File::create(&tmp).map_err(|e| ArtifactError::io(&tmp, e))?;
            let mut writer = BufWriter::new(file);
            self.write_to(&mut writer)?;
            writer.flush().map_err(|e| ArtifactError::io(&tmp, e))?;
        }
        fs::rename(&tmp, path).map_err(|e| ArtifactError::io(path, e))
    }
}

impl Artifact for StandardScaler {
    const KIND: &'static str = "standard-scaler";
    const FORMAT_VERSION: u32 = 1;
}

impl Artifact for RandomForest {
    const KIND: &'static str = "random-forest-regressor";
    const FORMAT_VERSION: u32 = 1;
}
