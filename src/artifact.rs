//! Locating build outputs on disk.
//!
//! A `build` leaves `{AssemblyName}.app` in the project's output directory.
//! An `archive` leaves a bundle under Xcode's archive directory, named like
//! `MobileiOS 5-12-16 3.45 PM.xcarchive`; the most recent one wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::error::{PlanError, Result};
use crate::resolver::{Resolution, Strategy};

/// Archive root relative to the user's home directory.
pub const ARCHIVES_DIR: &str = "Library/Developer/Xcode/Archives";

const ARCHIVE_EXT: &str = ".xcarchive";
const ARCHIVE_DATE_FORMAT: &str = "%m-%d-%y %l.%M %p";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OutputKind {
    Archive,
    App,
}

/// Output kind → resolved path, `None` when nothing was found.
pub type OutputTable = BTreeMap<OutputKind, Option<PathBuf>>;

/// Read the timestamp from an archive bundle name.
///
/// The timestamp is the last three whitespace separated tokens of the name
/// (`month-day-year hour.minute AM/PM`).
pub fn archive_timestamp(file_name: &str) -> Option<NaiveDateTime> {
    let stem = file_name.strip_suffix(ARCHIVE_EXT).unwrap_or(file_name);
    let tokens: Vec<&str> = stem.split_whitespace().collect();
    let [.., date, time, meridiem] = tokens.as_slice() else {
        return None;
    };
    let text = format!("{} {time} {meridiem}", date.trim_end_matches(','));
    NaiveDateTime::parse_from_str(&text, ARCHIVE_DATE_FORMAT).ok()
}

#[derive(Debug, Clone, Default)]
pub struct ArtifactLocator {
    archive_root: Option<PathBuf>,
}

impl ArtifactLocator {
    pub fn new(archive_root: Option<PathBuf>) -> Self {
        Self { archive_root }
    }

    pub fn archive_root(&self) -> Option<&Path> {
        self.archive_root.as_deref()
    }

    /// `{output_dir}/{assembly}.app`, with symlinks resolved.
    pub fn app_path(&self, assembly: &str, output_dir: &Path) -> Option<PathBuf> {
        let candidate = output_dir.join(format!("{assembly}.app"));
        let resolved = candidate.canonicalize().ok()?;
        resolved.exists().then_some(resolved)
    }

    /// The most recent `{assembly}*.xcarchive` under the archive root.
    ///
    /// Entries are visited in file-name order; on equal timestamps the
    /// first one visited is kept.
    pub fn latest_archive(&self, assembly: &str) -> Result<Option<PathBuf>> {
        let root = self.archive_root.as_deref().ok_or(PlanError::ArchiveRootUnset)?;
        if !root.exists() {
            return Err(PlanError::MissingArchiveRoot(root.to_path_buf()));
        }

        let mut latest: Option<(NaiveDateTime, PathBuf)> = None;
        let mut walker = walkdir::WalkDir::new(root).sort_by_file_name().into_iter();

        while let Some(entry) = walker.next() {
            let Ok(entry) = entry else { continue };
            let name = entry.file_name().to_string_lossy();
            if !name.ends_with(ARCHIVE_EXT) {
                continue;
            }
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            if !name.starts_with(assembly) {
                continue;
            }

            let Some(date) = archive_timestamp(&name) else {
                tracing::debug!("no timestamp in archive name {name}");
                continue;
            };
            tracing::debug!("archive candidate {} ({date})", entry.path().display());

            if latest.as_ref().is_none_or(|(best, _)| date > *best) {
                latest = Some((date, entry.path().to_path_buf()));
            }
        }

        Ok(latest.map(|(_, path)| path))
    }

    /// The artifacts a resolved build is expected to produce.
    pub fn outputs(&self, resolution: &Resolution<'_>) -> Result<OutputTable> {
        let project = resolution.project;
        let assembly = project.assembly_name.as_deref().unwrap_or(&project.name);
        let mut table = OutputTable::new();

        match resolution.strategy {
            Strategy::Archive => {
                table.insert(OutputKind::Archive, self.latest_archive(assembly)?);
            }
            Strategy::Build => {
                let output_dir = project
                    .properties(resolution.local_configuration)
                    .and_then(|props| props.output_path.as_deref())
                    .map(|rel| project.directory().join(rel))
                    .unwrap_or_else(|| project.directory().to_path_buf());
                table.insert(OutputKind::App, self.app_path(assembly, &output_dir));
            }
        }

        Ok(table)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
