//! Large filler-file generation
//!
//! Writes a zero-filled payload of whole GiB blocks to a temporary file next
//! to the target, packages it as a gzip tarball and removes the payload.

use crate::models::{GeneratedArtifact, GeneratedFileSpec};
use crate::util::units::{self, GIB};
use crate::{LustreBenchError, Result, TEMP_FILE_PREFIX};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::{error, info, warn, Span};

/// Remove a file, treating an already-absent path as success
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Generates zero-filled archives
#[derive(Debug, Clone)]
pub struct LargeFileGenerator {
    /// Bytes per size unit; 1 GiB outside tests
    unit_bytes: u64,
    compression: Compression,
    span: Span,
}

impl LargeFileGenerator {
    pub fn new(compression_level: u32, span: Span) -> Self {
        Self {
            unit_bytes: GIB,
            compression: Compression::new(compression_level.min(9)),
            span,
        }
    }

    /// Use a smaller size unit (and write block) than 1 GiB
    pub fn with_unit_bytes(mut self, unit_bytes: u64) -> Self {
        self.unit_bytes = unit_bytes.max(1);
        self
    }

    pub fn unit_bytes(&self) -> u64 {
        self.unit_bytes
    }

    /// Generate `spec.size_gb` units of zeros and archive them at `spec.path`.
    ///
    /// On failure the temporary payload and any partial archive are removed
    /// and the error is returned after being logged.
    pub fn generate(&self, spec: &GeneratedFileSpec) -> Result<GeneratedArtifact> {
        let _enter = self.span.enter();

        if spec.size_gb == 0 {
            return Err(LustreBenchError::ConfigError(format!(
                "File size must be at least 1 GB: {}",
                spec.path.display()
            )));
        }

        let start = Instant::now();
        let result = self.write_payload(spec).and_then(|payload| {
            let archived = self.archive(spec, &payload);
            let removed = payload.close().map_err(|e| {
                resource_error("remove temporary payload", &spec.path, e)
            });
            archived.and_then(|artifact| removed.map(|_| artifact))
        });

        match result {
            Ok(artifact) => {
                info!(
                    path = %artifact.path.display(),
                    size = %format!("{:.2} GB", artifact.archive_gb()),
                    elapsed = %units::format_duration(start.elapsed()),
                    "file generated"
                );
                Ok(artifact)
            }
            Err(err) => {
                error!(path = %spec.path.display(), error = %err, "file generation failed");
                Err(err)
            }
        }
    }

    /// Phase 1: the temporary zero payload, verified to its full size
    fn write_payload(&self, spec: &GeneratedFileSpec) -> Result<NamedTempFile> {
        let dir = target_dir(&spec.path);
        let mut payload = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .suffix(".dat")
            .tempfile_in(dir)
            .map_err(|e| resource_error("create temporary payload", &spec.path, e))?;

        let block = vec![0u8; self.unit_bytes as usize];
        for written in 0..spec.size_gb {
            payload.as_file_mut().write_all(&block).map_err(|e| {
                resource_error(
                    &format!("write block {} of {}", written + 1, spec.size_gb),
                    payload.path(),
                    e,
                )
            })?;
        }
        payload
            .as_file_mut()
            .flush()
            .and_then(|_| payload.as_file().sync_all())
            .map_err(|e| resource_error("flush temporary payload", payload.path(), e))?;

        let expected = spec.payload_bytes(self.unit_bytes);
        let actual = payload
            .as_file()
            .metadata()
            .map_err(|e| resource_error("stat temporary payload", payload.path(), e))?
            .len();
        if actual != expected {
            return Err(LustreBenchError::Resource(format!(
                "short write to {}: {} of {} bytes",
                payload.path().display(),
                actual,
                expected
            )));
        }

        Ok(payload)
    }

    /// Phase 2: gzip tarball with a single `.dat` entry
    fn archive(&self, spec: &GeneratedFileSpec, payload: &NamedTempFile) -> Result<GeneratedArtifact> {
        let entry_name = spec.entry_name();
        let archive_bytes = match self.write_archive(spec, payload, &entry_name) {
            Ok(bytes) => bytes,
            Err((phase, e)) => {
                discard_partial(&spec.path);
                return Err(resource_error(phase, &spec.path, e));
            }
        };

        Ok(GeneratedArtifact {
            path: spec.path.clone(),
            size_gb: spec.size_gb,
            payload_bytes: spec.payload_bytes(self.unit_bytes),
            archive_bytes,
            entry_name,
        })
    }

    /// Archive size on disk, or the failing phase
    fn write_archive(
        &self,
        spec: &GeneratedFileSpec,
        payload: &NamedTempFile,
        entry_name: &str,
    ) -> std::result::Result<u64, (&'static str, io::Error)> {
        let written = (|| -> io::Result<()> {
            let file = File::create(&spec.path)?;
            let mut builder = tar::Builder::new(GzEncoder::new(file, self.compression));
            builder.append_path_with_name(payload.path(), entry_name)?;
            let file = builder.into_inner()?.finish()?;
            file.sync_all()
        })();
        written.map_err(|e| ("write archive", e))?;

        fs::metadata(&spec.path)
            .map(|meta| meta.len())
            .map_err(|e| ("verify archive", e))
    }
}

/// Remove a partially written archive, logging when that fails too
fn discard_partial(path: &Path) {
    if let Err(e) = remove_if_exists(path) {
        warn!(path = %path.display(), error = %e, "failed to remove partial archive");
    }
}

fn target_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn resource_error(phase: &str, path: &Path, err: io::Error) -> LustreBenchError {
    LustreBenchError::Resource(format!("{} ({}): {}", phase, path.display(), err))
}
