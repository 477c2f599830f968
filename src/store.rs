//! Versioned artifact store.
//!
//! Layout inside the store directory:
//!
//! ```text
//! model-<version>.bin   one immutable artifact per version
//! latest                pointer file holding the current version number
//! ```
//!
//! Publishing writes the artifact to a temporary file, renames it into
//! place, and only then swaps the pointer (also via rename), so a reader
//! following the pointer always observes a fully written artifact. Writers
//! serialize on an internal mutex; readers never lock.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{error, info};

use crate::error::{Error, Result};
use crate::model::ModelArtifact;
use crate::network::SequenceClassifier;
use crate::vocab::Vocabulary;

const LATEST_POINTER: &str = "latest";

pub struct ArtifactStore {
    dir: PathBuf,
    publish_lock: Mutex<()>,
}

impl ArtifactStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            publish_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a newly trained classifier + vocabulary as the next version.
    ///
    /// Versions are unix-seconds based and strictly increasing; a publish
    /// landing within the same second as the previous one bumps past it.
    /// The pointer swap is the final step, so a failure anywhere earlier
    /// leaves the previously committed version authoritative.
    pub fn publish(&self, classifier: SequenceClassifier, vocabulary: Vocabulary) -> Result<u64> {
        let guard = self.publish_lock.lock();
        let _guard = match guard {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut version = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        if let Some(prev) = self.latest_version()? {
            if version <= prev {
                version = prev + 1;
            }
        }

        let artifact = ModelArtifact::new(classifier, vocabulary, version);
        let final_path = self.model_path(version);
        let tmp_path = final_path.with_extension("bin.tmp");

        if let Err(e) = self.write_artifact(&artifact, &tmp_path, &final_path, version) {
            error!(version, error = %e, "artifact publish failed; previous version remains live");
            fs::remove_file(&tmp_path).ok();
            return Err(e);
        }

        info!(
            version,
            labels = artifact.vocabulary.len(),
            "published model artifact"
        );
        Ok(version)
    }

    fn write_artifact(
        &self,
        artifact: &ModelArtifact,
        tmp_path: &Path,
        final_path: &Path,
        version: u64,
    ) -> Result<()> {
        artifact.save(tmp_path)?;
        fs::rename(tmp_path, final_path)?;

        let pointer_tmp = self.dir.join(format!("{}.tmp", LATEST_POINTER));
        fs::write(&pointer_tmp, version.to_string())?;
        fs::rename(&pointer_tmp, self.dir.join(LATEST_POINTER))?;
        Ok(())
    }

    /// The currently committed version, if any artifact has been published.
    pub fn latest_version(&self) -> Result<Option<u64>> {
        let pointer = self.dir.join(LATEST_POINTER);
        let contents = match fs::read_to_string(&pointer) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let version = contents.trim().parse::<u64>().map_err(|_| {
            Error::InvalidModel(format!("corrupt version pointer: {:?}", contents.trim()))
        })?;
        Ok(Some(version))
    }

    /// Load a specific committed version.
    pub fn load(&self, version: u64) -> Result<ModelArtifact> {
        ModelArtifact::load(self.model_path(version))
    }

    /// Load the latest committed artifact, or `None` when nothing has been
    /// published yet.
    pub fn load_latest(&self) -> Result<Option<ModelArtifact>> {
        match self.latest_version()? {
            Some(version) => self.load(version).map(Some),
            None => Ok(None),
        }
    }

    /// All committed versions, ascending. Superseded versions remain
    /// addressable until garbage-collected externally.
    pub fn versions(&self) -> Result<Vec<u64>> {
        let mut versions = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(rest) = name.strip_prefix("model-") {
                if let Some(number) = rest.strip_suffix(".bin") {
                    if let Ok(version) = number.parse() {
                        versions.push(version);
                    }
                }
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }

    fn model_path(&self, version: u64) -> PathBuf {
        self.dir.join(format!("model-{}.bin", version))
    }
}
