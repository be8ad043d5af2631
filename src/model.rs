//! In-memory graph of a solution, its projects and their configurations.
//!
//! Everything here is plain data produced by [`crate::sln`] and
//! [`crate::csproj`]; the only behaviour is lookup.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

// ═══════════════════════════════════════════════════════════════════════════════
//  ConfigKey
// ═══════════════════════════════════════════════════════════════════════════════

/// A `Config|Platform` pair such as `Release|iPhone`.
///
/// The platform has all whitespace removed on construction, so the
/// solution's `Any CPU` and a project's `AnyCPU` name the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigKey {
    configuration: String,
    platform: String,
}

impl ConfigKey {
    pub fn new(configuration: &str, platform: &str) -> Self {
        Self {
            configuration: configuration.to_string(),
            platform: platform.chars().filter(|c| !c.is_whitespace()).collect(),
        }
    }

    /// Parse the `Config|Platform` form.
    pub fn parse(s: &str) -> Option<Self> {
        let (configuration, platform) = s.split_once('|')?;
        Some(Self::new(configuration, platform))
    }

    pub fn configuration(&self) -> &str {
        &self.configuration
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.configuration, self.platform)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Project
// ═══════════════════════════════════════════════════════════════════════════════

/// Platform SDK a project references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiKind {
    Ios,
    Android,
    UiTest,
    #[default]
    Unknown,
}

impl fmt::Display for ApiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ApiKind::Ios => "ios",
            ApiKind::Android => "android",
            ApiKind::UiTest => "uitest",
            ApiKind::Unknown => "unknown",
        })
    }
}

/// Build properties of one project-local configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigProperties {
    /// `<OutputPath>`, relative to the project directory.
    pub output_path: Option<PathBuf>,
    /// `<MtouchArch>` split on commas.
    pub mtouch_architectures: Vec<String>,
    /// An `<IpaPackageName>` element is present.
    pub ipa_package: bool,
    /// `<BuildIpa>true</BuildIpa>`.
    pub build_ipa: bool,
}

/// A project referenced by the solution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    /// Lowercased `<OutputType>`, e.g. `exe` or `library`.
    pub output_type: Option<String>,
    pub assembly_name: Option<String>,
    pub api_kind: ApiKind,
    /// Solution-level key → project-local key.
    pub mappings: BTreeMap<ConfigKey, ConfigKey>,
    /// Project-local key → properties.
    pub configs: BTreeMap<ConfigKey, ConfigProperties>,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn is_executable(&self) -> bool {
        self.output_type.as_deref() == Some("exe")
    }

    /// Directory holding the project descriptor.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// The project-local configuration a solution configuration maps to.
    pub fn local_configuration(&self, key: &ConfigKey) -> Option<&ConfigKey> {
        self.mappings.get(key)
    }

    pub fn properties(&self, local: &ConfigKey) -> Option<&ConfigProperties> {
        self.configs.get(local)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Solution
// ═══════════════════════════════════════════════════════════════════════════════

/// A project reference dropped because its target is not an existing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedReference {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Solution {
    pub path: PathBuf,
    /// Directory the project paths are relative to.
    pub base_dir: PathBuf,
    /// Type id of the first project reference.
    pub id: Option<String>,
    pub declared_configurations: Vec<ConfigKey>,
    pub projects: Vec<Project>,
    pub skipped: Vec<SkippedReference>,
}

impl Solution {
    pub fn project_by_id(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn project_by_name(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    /// Executable projects of the given kind, in declared order.
    pub fn executable_projects(&self, api: ApiKind) -> impl Iterator<Item = &Project> {
        self.projects
            .iter()
            .filter(move |p| p.api_kind == api && p.is_executable())
    }

    pub fn declares(&self, key: &ConfigKey) -> bool {
        self.declared_configurations.contains(key)
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-- analyze: {}", self.path.display())?;
        writeln!(f)?;
        let configs: Vec<String> = self
            .declared_configurations
            .iter()
            .map(ToString::to_string)
            .collect();
        writeln!(f, "configurations: {}", configs.join(", "))?;
        for project in &self.projects {
            writeln!(
                f,
                "project {} {} ({}, {}, {})",
                project.name,
                project.id,
                project.api_kind,
                project.output_type.as_deref().unwrap_or("-"),
                project.assembly_name.as_deref().unwrap_or("-"),
            )?;
            writeln!(f, "  path: {}", project.path.display())?;
            for (from, to) in &project.mappings {
                writeln!(f, "  {from} -> {to}")?;
            }
            for (key, props) in &project.configs {
                writeln!(
                    f,
                    "  [{key}] output={} arch={} ipa_package={} build_ipa={}",
                    props
                        .output_path
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                    props.mtouch_architectures.join(","),
                    props.ipa_package,
                    props.build_ipa,
                )?;
            }
        }
        for skipped in &self.skipped {
            writeln!(f, "skipped {}: {}", skipped.name, skipped.path.display())?;
        }
        Ok(())
    }
}
