//! Launcher classpath assembly from the embedded package list.
//!
//! The launcher archive carries `wrapper.cnl`, one dependency per line:
//!
//! ```text
//! include <repository> <group> <name> <version> <file-version> [<checksum> [<classifier>]]
//! ```
//!
//! Each dependency lives below the node library root at
//! `<group as path>/<name>/<version>/<name>-<file-version>[-<classifier>].jar`.

use crate::archive::{read_entry, with_archive};
use std::path::{Path, PathBuf};
use tracing::debug;
use ward_common::{ArtifactError, ArtifactResult};

pub const PACKAGE_LIST_ENTRY: &str = "wrapper.cnl";

const INCLUDE_PREFIX: &str = "include ";
const MIN_FIELDS: usize = 6;
const CLASSIFIER_FIELDS: usize = 8;

/// Platform path-list separator.
#[cfg(windows)]
pub const CLASSPATH_SEPARATOR: char = ';';
#[cfg(not(windows))]
pub const CLASSPATH_SEPARATOR: char = ':';

/// One `include` line of a package list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryCoordinate {
    pub repository: String,
    pub group: String,
    pub name: String,
    pub version: String,
    pub file_version: String,
    pub checksum: Option<String>,
    pub classifier: Option<String>,
}

impl LibraryCoordinate {
    /// Parse one line; `None` for anything that is not a complete include.
    pub fn parse_line(line: &str) -> Option<Self> {
        if !line.starts_with(INCLUDE_PREFIX) {
            return None;
        }

        let mut fields: Vec<&str> = line.split(' ').collect();
        while fields.last().is_some_and(|f| f.is_empty()) {
            fields.pop();
        }
        if fields.len() < MIN_FIELDS {
            return None;
        }

        Some(Self {
            repository: fields[1].to_string(),
            group: fields[2].to_string(),
            name: fields[3].to_string(),
            version: fields[4].to_string(),
            file_version: fields[5].to_string(),
            checksum: fields.get(6).map(|s| s.to_string()),
            classifier: if fields.len() == CLASSIFIER_FIELDS {
                Some(fields[7].to_string())
            } else {
                None
            },
        })
    }

    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!("{}-{}-{}.jar", self.name, self.file_version, classifier),
            None => format!("{}-{}.jar", self.name, self.file_version),
        }
    }

    /// Location relative to the library root.
    pub fn relative_path(&self) -> PathBuf {
        let mut path: PathBuf = self.group.split('.').collect();
        path.push(&self.name);
        path.push(&self.version);
        path.push(self.file_name());
        path
    }
}

/// Parsed package list, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageList {
    pub coordinates: Vec<LibraryCoordinate>,
}

impl PackageList {
    /// Parse a package list; lines that do not qualify are skipped.
    pub fn parse(text: &str) -> Self {
        let coordinates = text
            .lines()
            .filter_map(|line| LibraryCoordinate::parse_line(line.trim_end_matches('\r')))
            .collect();
        Self { coordinates }
    }

    /// Absolute library paths, each followed by the path-list separator.
    pub fn classpath_fragment(&self, library_root: &Path) -> ArtifactResult<String> {
        let mut fragment = String::new();
        for coordinate in &self.coordinates {
            let relative = library_root.join(coordinate.relative_path());
            let path = std::path::absolute(&relative).map_err(|e| ArtifactError::io(&relative, e))?;
            fragment.push_str(&path.to_string_lossy());
            fragment.push(CLASSPATH_SEPARATOR);
        }
        Ok(fragment)
    }
}

/// Build the library part of the launcher classpath from `wrapper_path`.
///
/// A launcher without a package list yields an empty fragment.
pub fn build_classpath(wrapper_path: &Path, library_root: &Path) -> ArtifactResult<String> {
    let contents = with_archive(wrapper_path, |archive| {
        read_entry(archive, wrapper_path, PACKAGE_LIST_ENTRY)
    })?;

    let Some(bytes) = contents else {
        debug!(launcher = %wrapper_path.display(), "Launcher has no package list");
        return Ok(String::new());
    };

    let packages = PackageList::parse(&String::from_utf8_lossy(&bytes));
    debug!(
        launcher = %wrapper_path.display(),
        libraries = packages.coordinates.len(),
        "Package list parsed"
    );
    packages.classpath_fragment(library_root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MANIFEST_ENTRY;
    use crate::testing::{manifest, write_archive};

    #[test]
    fn test_relative_path() {
        let coordinate = LibraryCoordinate::parse_line(
            "include maven com.google.code.gson gson 2.10.1 2.10.1 abcdef",
        )
        .unwrap();
        assert_eq!(
            coordinate.relative_path(),
            ["com", "google", "code", "gson", "gson", "2.10.1", "gson-2.10.1.jar"]
                .iter()
                .collect::<PathBuf>()
        );
        assert_eq!(coordinate.checksum.as_deref(), Some("abcdef"));
        assert_eq!(coordinate.classifier, None);
    }

    #[test]
    fn test_file_version_and_classifier() {
        let coordinate = LibraryCoordinate::parse_line(
            "include snapshots io.netty netty-transport 4.1-SNAPSHOT 4.1-20240101.1 ff linux-x86_64",
        )
        .unwrap();
        assert_eq!(
            coordinate.file_name(),
            "netty-transport-4.1-20240101.1-linux-x86_64.jar"
        );
        assert_eq!(
            coordinate.relative_path(),
            ["io", "netty", "netty-transport", "4.1-SNAPSHOT", "netty-transport-4.1-20240101.1-linux-x86_64.jar"]
                .iter()
                .collect::<PathBuf>()
        );
    }

    #[test]
    fn test_seven_fields_have_no_classifier() {
        let coordinate =
            LibraryCoordinate::parse_line("include maven org.slf4j slf4j-api 2.0 2.0 sum").unwrap();
        assert_eq!(coordinate.file_name(), "slf4j-api-2.0.jar");
    }

    #[test]
    fn test_extra_fields_drop_the_classifier() {
        let coordinate = LibraryCoordinate::parse_line(
            "include maven io.netty netty-transport 4.1 4.1 ff linux-x86_64 extra",
        )
        .unwrap();
        assert_eq!(coordinate.classifier, None);
        assert_eq!(coordinate.file_name(), "netty-transport-4.1.jar");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let list = PackageList::parse(
            "# comment\n\
             include maven org.a a 1 1\n\
             include maven org.b b 2\n\
             repo maven https://repo1.maven.org\n\
             include maven org.c c 3 3 \r\n\
             included maven org.d d 4 4\n",
        );
        let names: Vec<_> = list.coordinates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_trailing_empty_fields_do_not_count() {
        assert!(LibraryCoordinate::parse_line("include maven org.b b 2   ").is_none());
    }

    #[test]
    fn test_classpath_fragment() {
        let list = PackageList::parse("include maven org.a a 1 1\ninclude maven org.b b 2 2\n");
        let root = Path::new("/opt/ward/launcher/libs");
        let fragment = list.classpath_fragment(root).unwrap();

        let expected_a = root.join(list.coordinates[0].relative_path());
        let expected_b = root.join(list.coordinates[1].relative_path());
        assert_eq!(
            fragment,
            format!(
                "{}{sep}{}{sep}",
                expected_a.display(),
                expected_b.display(),
                sep = CLASSPATH_SEPARATOR
            )
        );
    }

    #[test]
    fn test_build_classpath_from_archive() {
        let dir = tempfile::tempdir().unwrap();
        let wrapper = dir.path().join("wrapper.jar");
        write_archive(
            &wrapper,
            &[
                (MANIFEST_ENTRY, &manifest("eu.ward.Wrapper")),
                (PACKAGE_LIST_ENTRY, "include maven org.a a 1 1\nbroken line\n"),
            ],
        );

        let libs = dir.path().join("libs");
        let classpath = build_classpath(&wrapper, &libs).unwrap();
        let expected = libs.join("org").join("a").join("a").join("1").join("a-1.jar");
        assert_eq!(classpath, format!("{}{}", expected.display(), CLASSPATH_SEPARATOR));
    }

    #[test]
    fn test_missing_package_list_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let wrapper = dir.path().join("wrapper.jar");
        write_archive(&wrapper, &[(MANIFEST_ENTRY, &manifest("eu.ward.Wrapper"))]);

        assert_eq!(build_classpath(&wrapper, dir.path()).unwrap(), "");
    }
}
