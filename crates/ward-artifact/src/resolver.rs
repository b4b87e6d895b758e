//! Launcher materialization and application archive selection.

use crate::archive::{inspect_archive, ArtifactInfo};
use crate::catalog::VersionCatalog;
use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, error, info};
use ward_common::{ArtifactError, ArtifactResult};

pub const LAUNCHER_FILE_NAME: &str = "wrapper.jar";

/// Accepted in application archive names whatever the environment type.
pub const FALLBACK_TOKEN: &str = "application";

const ARCHIVE_EXTENSION: &str = ".jar";

/// Where the bundled launcher comes from.
#[derive(Debug, Clone)]
pub enum LauncherSource {
    /// Compiled into the binary, e.g. with `include_bytes!`.
    Embedded(&'static [u8]),
    /// Shipped as a file next to the binary.
    File(PathBuf),
}

impl LauncherSource {
    /// `<directory of the running executable>/wrapper.jar`.
    pub fn beside_executable() -> io::Result<Self> {
        let exe = std::env::current_exe()?;
        let dir = exe.parent().unwrap_or_else(|| Path::new("."));
        Ok(Self::File(dir.join(LAUNCHER_FILE_NAME)))
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Embedded(_) => LAUNCHER_FILE_NAME.to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }

    fn is_available(&self) -> bool {
        match self {
            Self::Embedded(bytes) => !bytes.is_empty(),
            Self::File(path) => path.is_file(),
        }
    }

    fn copy_to(&self, target: &mut File) -> io::Result<()> {
        match self {
            Self::Embedded(bytes) => target.write_all(bytes),
            Self::File(path) => io::copy(&mut File::open(path)?, target).map(|_| ()),
        }
    }
}

/// Locates launcher and application archives for JVM services on one node.
pub struct ArtifactResolver {
    launcher: LauncherSource,
    cache_directory: PathBuf,
    catalog: Arc<dyn VersionCatalog>,
}

impl ArtifactResolver {
    pub fn new(
        launcher: LauncherSource,
        cache_directory: impl Into<PathBuf>,
        catalog: Arc<dyn VersionCatalog>,
    ) -> Self {
        Self {
            launcher,
            cache_directory: cache_directory.into(),
            catalog,
        }
    }

    /// The node-wide cached copy of the launcher.
    pub fn launcher_cache_path(&self) -> PathBuf {
        self.cache_directory.join(LAUNCHER_FILE_NAME)
    }

    /// Copy the bundled launcher into the cache unless it is already there.
    ///
    /// An existing cache file is reused untouched. A failed copy is logged and
    /// the cache path is still returned; reading it reports the failure.
    pub fn materialize_wrapper(&self) -> ArtifactResult<PathBuf> {
        let cache_path = self.launcher_cache_path();
        if cache_path.exists() {
            return Ok(cache_path);
        }

        if !self.launcher.is_available() {
            return Err(ArtifactError::resource_missing(self.launcher.describe()));
        }

        match self.write_cache(&cache_path) {
            Ok(()) => info!(cache = %cache_path.display(), "Launcher materialized"),
            Err(e) => error!(
                cache = %cache_path.display(),
                error = %e,
                "Unable to copy launcher into the cache"
            ),
        }

        Ok(cache_path)
    }

    /// Stage the launcher next to `cache_path`, then rename it into place so
    /// readers never observe a partial file.
    fn write_cache(&self, cache_path: &Path) -> io::Result<()> {
        fs::create_dir_all(&self.cache_directory)?;
        let mut staged = NamedTempFile::new_in(&self.cache_directory)?;
        self.launcher.copy_to(staged.as_file_mut())?;
        staged.as_file_mut().sync_all()?;
        staged.persist(cache_path).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn resolve_wrapper(&self) -> ArtifactResult<ArtifactInfo> {
        let path = self.materialize_wrapper()?;
        inspect_archive(&path)
    }

    /// Tokens an application archive name must contain for `environment_type`.
    pub fn environment_tokens(&self, environment_type: &str) -> Vec<String> {
        let mut tokens = self.catalog.environment_names_of_type(environment_type);
        tokens.push(FALLBACK_TOKEN.to_string());
        tokens
    }

    /// Pick the application archive for `environment_type` in `directory`.
    pub fn find_application(&self, environment_type: &str, directory: &Path) -> ArtifactResult<PathBuf> {
        let tokens = self.environment_tokens(environment_type);

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ArtifactError::not_found(environment_type, directory));
            }
            Err(e) => return Err(ArtifactError::io(directory, e)),
        };

        let mut candidates = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ArtifactError::io(directory, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(ARCHIVE_EXTENSION)
                && tokens.iter().any(|token| name.contains(token.as_str()))
                && entry.path().is_file()
            {
                candidates.push(name);
            }
        }
        candidates.sort();

        let selected = candidates
            .into_iter()
            .reduce(|best, candidate| match compare_candidates(&candidate, &best) {
                Ordering::Less => candidate,
                _ => best,
            })
            .ok_or_else(|| ArtifactError::not_found(environment_type, directory))?;

        debug!(
            environment = %environment_type,
            directory = %directory.display(),
            archive = %selected,
            "Application archive selected"
        );
        Ok(directory.join(selected))
    }

    pub fn resolve_application(
        &self,
        environment_type: &str,
        directory: &Path,
    ) -> ArtifactResult<ArtifactInfo> {
        let path = self.find_application(environment_type, directory)?;
        inspect_archive(&path)
    }
}

/// Numeric tie-break between two candidate file names.
///
/// Names starting with a run of digits that parses as a 32-bit integer compare
/// by that number; if either side has none the result is `Equal`. Not
/// transitive over mixed numeric and non-numeric names.
pub fn compare_candidates(a: &str, b: &str) -> Ordering {
    match (leading_number(a), leading_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => Ordering::Equal,
    }
}

fn leading_number(name: &str) -> Option<i32> {
    let len = name.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 {
        return None;
    }
    name[..len].parse().ok()
}
