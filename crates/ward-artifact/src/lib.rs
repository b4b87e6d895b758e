//! # Ward Artifact
//!
//! Locates the archives a JVM service is started from and derives what is
//! needed to launch it:
//! - the bundled launcher, materialized once into the node cache
//! - the application archive matching a service environment
//! - manifest attributes (entry points, agent class, preload marker)
//! - the launcher classpath from its embedded package list

pub mod archive;
pub mod catalog;
pub mod classpath;
pub mod manifest;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

pub use archive::{inspect_archive, with_archive, ArtifactInfo};
pub use catalog::{ServiceEnvironment, StaticVersionCatalog, VersionCatalog};
pub use classpath::{build_classpath, LibraryCoordinate, PackageList, CLASSPATH_SEPARATOR};
pub use manifest::Manifest;
pub use resolver::{compare_candidates, ArtifactResolver, LauncherSource};
