//! Scoped archive access and archive introspection.

use crate::manifest::{Manifest, MANIFEST_ENTRY};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use ward_common::{ArtifactError, ArtifactResult};
use zip::result::ZipError;
use zip::ZipArchive;

/// Marker entry whose presence enables library preloading in the launcher.
pub const PRELOAD_MARKER_ENTRY: &str = "META-INF/versions.list";

/// A resolved archive and what its manifest declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactInfo {
    pub absolute_path: PathBuf,
    pub manifest_attributes: BTreeMap<String, String>,
    pub preload: bool,
    main_class: String,
    agent_class: Option<String>,
}

impl ArtifactInfo {
    /// Build from an already parsed manifest; `Main-Class` is required.
    pub fn from_manifest(
        absolute_path: PathBuf,
        manifest: Manifest,
        preload: bool,
    ) -> ArtifactResult<Self> {
        let main_class = manifest
            .main_class()
            .ok_or_else(|| ArtifactError::manifest_invalid(&absolute_path, "Main-Class is not declared"))?
            .to_string();
        let agent_class = manifest.agent_class().map(str::to_string);

        Ok(Self {
            absolute_path,
            manifest_attributes: manifest.into_attributes(),
            preload,
            main_class,
            agent_class,
        })
    }

    pub fn main_class(&self) -> &str {
        &self.main_class
    }

    /// Agent entry point, if the manifest declares one.
    pub fn agent_class(&self) -> Option<&str> {
        self.agent_class.as_deref()
    }

    pub fn file_name(&self) -> String {
        self.absolute_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Open the archive at `path`, run `f` against it and close it again.
///
/// The archive handle never outlives the call, whatever `f` returns.
pub fn with_archive<T, F>(path: &Path, f: F) -> ArtifactResult<T>
where
    F: FnOnce(&mut ZipArchive<File>) -> ArtifactResult<T>,
{
    let file = File::open(path).map_err(|e| ArtifactError::archive_io(path, e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| ArtifactError::archive_io(path, e))?;
    f(&mut archive)
}

/// Read a whole entry, `None` when the archive has no entry of that name.
pub fn read_entry(
    archive: &mut ZipArchive<File>,
    path: &Path,
    name: &str,
) -> ArtifactResult<Option<Vec<u8>>> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(ArtifactError::archive_io(path, e)),
    };

    let mut buffer = Vec::new();
    entry
        .read_to_end(&mut buffer)
        .map_err(|e| ArtifactError::archive_io(path, e))?;
    Ok(Some(buffer))
}

pub fn contains_entry(archive: &ZipArchive<File>, name: &str) -> bool {
    archive.file_names().any(|entry| entry == name)
}

/// Read manifest, entry points and preload marker of the archive at `path`.
///
/// Fails with `ManifestInvalid` when there is no manifest or it declares no
/// `Main-Class`.
pub fn inspect_archive(path: &Path) -> ArtifactResult<ArtifactInfo> {
    let absolute_path = std::path::absolute(path).map_err(|e| ArtifactError::io(path, e))?;

    let (manifest, preload) = with_archive(&absolute_path, |archive| {
        let bytes = read_entry(archive, &absolute_path, MANIFEST_ENTRY)?.ok_or_else(|| {
            ArtifactError::manifest_invalid(&absolute_path, "no META-INF/MANIFEST.MF entry")
        })?;
        Ok((Manifest::parse(&bytes), contains_entry(archive, PRELOAD_MARKER_ENTRY)))
    })?;

    let info = ArtifactInfo::from_manifest(absolute_path, manifest, preload)?;
    debug!(
        archive = %info.absolute_path.display(),
        main_class = %info.main_class,
        agent_class = ?info.agent_class,
        preload,
        "Archive inspected"
    );
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{manifest, write_archive};

    #[test]
    fn test_inspect_application() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.jar");
        write_archive(
            &path,
            &[
                (
                    MANIFEST_ENTRY,
                    "Main-Class: io.papermc.Main\nLauncher-Agent-Class: io.papermc.Agent\n",
                ),
                (PRELOAD_MARKER_ENTRY, "abc\tlibs/x.jar\n"),
            ],
        );

        let info = inspect_archive(&path).unwrap();
        assert!(info.absolute_path.is_absolute());
        assert_eq!(info.main_class(), "io.papermc.Main");
        assert_eq!(info.agent_class(), Some("io.papermc.Agent"));
        assert!(info.preload);
        assert_eq!(info.file_name(), "paper.jar");
        assert_eq!(
            info.manifest_attributes.get("Main-Class").map(String::as_str),
            Some("io.papermc.Main")
        );
    }

    #[test]
    fn test_missing_manifest_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.jar");
        write_archive(&path, &[("readme.txt", "nothing here")]);

        let err = inspect_archive(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::ManifestInvalid { .. }));
    }

    #[test]
    fn test_missing_main_class_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.jar");
        write_archive(&path, &[(MANIFEST_ENTRY, "Manifest-Version: 1.0\n")]);

        let err = inspect_archive(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::ManifestInvalid { .. }));
        assert!(err.to_string().contains("Main-Class"));
    }

    #[test]
    fn test_no_preload_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.jar");
        write_archive(&path, &[(MANIFEST_ENTRY, &manifest("a.Main"))]);

        let info = inspect_archive(&path).unwrap();
        assert!(!info.preload);
        assert_eq!(info.agent_class(), None);
    }

    #[test]
    fn test_unreadable_archive_is_archive_io() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.jar");
        assert!(matches!(
            inspect_archive(&missing).unwrap_err(),
            ArtifactError::ArchiveIo { .. }
        ));

        let garbage = dir.path().join("garbage.jar");
        std::fs::write(&garbage, b"not a zip").unwrap();
        assert!(matches!(
            inspect_archive(&garbage).unwrap_err(),
            ArtifactError::ArchiveIo { .. }
        ));
    }
}
