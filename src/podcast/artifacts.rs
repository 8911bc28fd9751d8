//! Podcast artifacts on disk: the `{name}.txt` script and `{name}.mp3` audio
//! pair under one output directory, plus their entries in the provider
//! podcast indexes.
//!
//! # Naming
//!
//! The base name is `{prefix}{timestamp}`. The script file is created with
//! create-new semantics, so two jobs finishing in the same second cannot
//! overwrite each other: the later one claims `{prefix}{timestamp}_1`, then
//! `_2`, and so on.
//!
//! # Consistency
//!
//! Audio is written to `{name}.mp3.part` and renamed into place, so lookups
//! never serve a partial file. The index entry is added only after both files
//! exist. A failure in between leaves the files on disk without an index
//! entry; nothing is rolled back.

use crate::error::PodcastError;
use crate::models::Provider;
use crate::store::RankedStore;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

/// Extensions a client may request.
pub const ALLOWED_EXTENSIONS: [&str; 2] = ["txt", "mp3"];

const MAX_NAME_ATTEMPTS: u32 = 100;

/// Reject names that are empty or could escape the output directory.
pub fn validate_base_name(name: &str) -> Result<(), PodcastError> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0'])
        || name.contains("..");
    if invalid {
        return Err(PodcastError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Owner of the podcast output directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a script and its audio, returning the base name claimed.
    #[instrument(level = "info", skip(self, script, audio), fields(script_bytes = script.len(), audio_bytes = audio.len()))]
    pub async fn write(
        &self,
        prefix: &str,
        timestamp: i64,
        script: &str,
        audio: &[u8],
    ) -> Result<String, PodcastError> {
        validate_base_name(prefix)?;
        fs::create_dir_all(&self.dir).await?;

        let name = self.claim_script_file(prefix, timestamp, script).await?;

        let part = self.dir.join(format!("{name}.mp3.part"));
        fs::write(&part, audio).await?;
        fs::rename(&part, self.dir.join(format!("{name}.mp3"))).await?;

        info!(%name, "Wrote podcast artifacts");
        Ok(name)
    }

    async fn claim_script_file(
        &self,
        prefix: &str,
        timestamp: i64,
        script: &str,
    ) -> Result<String, PodcastError> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("{prefix}{timestamp}")
            } else {
                format!("{prefix}{timestamp}_{attempt}")
            };
            let path = self.dir.join(format!("{name}.txt"));
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(%name, "Name taken; trying next suffix");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            file.write_all(script.as_bytes()).await?;
            file.flush().await?;
            return Ok(name);
        }
        Err(PodcastError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free name for {prefix}{timestamp}"),
        )))
    }

    /// Add a finished artifact to the provider's podcast index.
    pub async fn record<S: RankedStore>(
        &self,
        store: &S,
        provider: Provider,
        name: &str,
        timestamp: i64,
    ) -> Result<(), PodcastError> {
        store
            .add(provider.podcasts_key(), name, timestamp as f64)
            .await?;
        info!(%provider, %name, "Recorded podcast in index");
        Ok(())
    }

    /// Resolve a requested `{name}.txt` / `{name}.mp3` to an existing path.
    ///
    /// # Errors
    ///
    /// - [`PodcastError::InvalidName`] for any other extension or an unsafe name
    /// - [`PodcastError::NotFound`] when the file does not exist
    pub async fn lookup(&self, filename: &str) -> Result<PathBuf, PodcastError> {
        let (stem, extension) = filename
            .rsplit_once('.')
            .ok_or_else(|| PodcastError::InvalidName(filename.to_string()))?;
        if !ALLOWED_EXTENSIONS.contains(&extension) {
            return Err(PodcastError::InvalidName(filename.to_string()));
        }
        validate_base_name(stem)?;

        let path = self.dir.join(filename);
        if !fs::try_exists(&path).await? {
            return Err(PodcastError::NotFound(filename.to_string()));
        }
        Ok(path)
    }

    /// Remove both files of `name` and its entry in every provider index.
    ///
    /// Missing files and missing index entries are not errors, so deleting
    /// twice leaves the same state as deleting once.
    #[instrument(level = "info", skip(self, store))]
    pub async fn delete<S: RankedStore>(&self, store: &S, name: &str) -> Result<(), PodcastError> {
        validate_base_name(name)?;

        for extension in ALLOWED_EXTENSIONS {
            let path = self.dir.join(format!("{name}.{extension}"));
            match fs::remove_file(&path).await {
                Ok(()) => debug!(path = %path.display(), "Removed file"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        for provider in Provider::ALL {
            store.remove(provider.podcasts_key(), name).await?;
        }
        info!("Deleted podcast");
        Ok(())
    }
}
