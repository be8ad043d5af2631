//! Solution (`.sln`) parser.
//!
//! A solution is line oriented:
//!
//! ```text
//! Project("{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}") = "App.iOS", "App.iOS\App.iOS.csproj", "{6B2F...}"
//! EndProject
//! Global
//!     GlobalSection(SolutionConfigurationPlatforms) = preSolution
//!         Release|iPhone = Release|iPhone
//!     EndGlobalSection
//!     GlobalSection(ProjectConfigurationPlatforms) = postSolution
//!         {6B2F...}.Release|iPhone.ActiveCfg = Release|iPhone
//!     EndGlobalSection
//! EndGlobal
//! ```
//!
//! Parsing happens in two passes. [`SolutionDocument::parse`] runs a line
//! state machine over the text and collects raw references, declared
//! configurations, and mapping entries. [`parse_solution`] then resolves
//! project paths against the filesystem and attaches mappings by project id,
//! so the order of sections in the file does not matter.

use std::path::{Path, PathBuf};

use chumsky::prelude::*;

use crate::error::{PlanError, Result};
use crate::model::{ConfigKey, Project, SkippedReference, Solution};

type LineErr<'a> = extra::Err<Simple<'a, char>>;

// ═══════════════════════════════════════════════════════════════════════════════
//  Raw document
// ═══════════════════════════════════════════════════════════════════════════════

/// A `Project(...) = ...` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectReference {
    pub type_id: String,
    pub name: String,
    /// Relative path exactly as written, with `\` separators.
    pub path: String,
    pub id: String,
}

/// One line of the `ProjectConfigurationPlatforms` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub project_id: String,
    pub solution: ConfigKey,
    pub project: ConfigKey,
}

/// Everything the text pass extracts from a solution file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolutionDocument {
    pub references: Vec<ProjectReference>,
    pub configurations: Vec<ConfigKey>,
    pub mappings: Vec<MappingEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Outside,
    SolutionConfigurations,
    ProjectConfigurations,
    Other,
}

impl Section {
    fn from_name(name: &str) -> Self {
        let name = name.trim();
        if name.eq_ignore_ascii_case("SolutionConfigurationPlatforms") {
            Section::SolutionConfigurations
        } else if name.eq_ignore_ascii_case("ProjectConfigurationPlatforms") {
            Section::ProjectConfigurations
        } else {
            Section::Other
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Line grammars
// ═══════════════════════════════════════════════════════════════════════════════

/// Case-insensitive alphabetic keyword.
fn keyword<'a>(kw: &'static str) -> impl Parser<'a, &'a str, &'a str, LineErr<'a>> + Clone {
    any()
        .filter(|c: &char| c.is_ascii_alphabetic())
        .repeated()
        .at_least(1)
        .to_slice()
        .filter(move |s: &&str| s.eq_ignore_ascii_case(kw))
}

fn quoted<'a>() -> impl Parser<'a, &'a str, &'a str, LineErr<'a>> + Clone {
    just('"')
        .ignore_then(none_of('"').repeated().to_slice())
        .then_ignore(just('"'))
}

/// `Project("{type}") = "Name", "Path", "{id}"`
fn project_reference_parser<'a>() -> impl Parser<'a, &'a str, ProjectReference, LineErr<'a>> {
    keyword("Project")
        .ignore_then(quoted().padded().delimited_by(just('(').padded(), just(')').padded()))
        .then_ignore(just('=').padded())
        .then(quoted())
        .then_ignore(just(',').padded())
        .then(quoted())
        .then_ignore(just(',').padded())
        .then(quoted())
        .then_ignore(any().repeated())
        .map(|(((type_id, name), path), id)| ProjectReference {
            type_id: type_id.to_string(),
            name: name.to_string(),
            path: path.to_string(),
            id: id.to_string(),
        })
}

/// `GlobalSection(Name) = preSolution`
fn section_start_parser<'a>() -> impl Parser<'a, &'a str, Section, LineErr<'a>> {
    keyword("GlobalSection")
        .ignore_then(
            none_of(')')
                .repeated()
                .to_slice()
                .delimited_by(just('(').padded(), just(')')),
        )
        .then_ignore(any().repeated())
        .map(Section::from_name)
}

fn section_end_parser<'a>() -> impl Parser<'a, &'a str, (), LineErr<'a>> {
    keyword("EndGlobalSection").ignore_then(any().repeated()).ignored()
}

/// `Config|Platform = Config|Platform`
fn solution_configuration_parser<'a>() -> impl Parser<'a, &'a str, ConfigKey, LineErr<'a>> {
    let config = none_of('|').repeated().to_slice();
    let platform = none_of('|').and_is(just(" =").not()).repeated().to_slice();

    config
        .then_ignore(just('|'))
        .then(platform)
        .then_ignore(just(" ="))
        .then_ignore(any().repeated())
        .map(|(config, platform)| ConfigKey::new(config, platform))
}

/// `{id}.Config|Platform.ActiveCfg = Mapped|Platform`
fn mapping_parser<'a>() -> impl Parser<'a, &'a str, MappingEntry, LineErr<'a>> {
    let guid = just('{')
        .then(none_of('}').repeated())
        .then(just('}'))
        .to_slice();
    let token = any()
        .filter(|c: &char| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .repeated()
        .to_slice();
    let key = token.then_ignore(just('|')).then(token);

    guid.then_ignore(just('.'))
        .then(key)
        .then_ignore(any().and_is(just(" = ").not()).repeated())
        .then_ignore(just(" = "))
        .then(key)
        .then_ignore(any().repeated())
        .map(
            |((id, (config, platform)), (mapped_config, mapped_platform)): (
                (&str, (&str, &str)),
                (&str, &str),
            )| MappingEntry {
                project_id: id.to_string(),
                solution: ConfigKey::new(config, platform),
                project: ConfigKey::new(mapped_config, mapped_platform),
            },
        )
}

impl SolutionDocument {
    /// Run the text pass over a solution's contents. Lines that match none of
    /// the grammars are skipped.
    pub fn parse(source: &str) -> Self {
        let reference = project_reference_parser();
        let section_start = section_start_parser();
        let section_end = section_end_parser();
        let solution_configuration = solution_configuration_parser();
        let mapping = mapping_parser();

        let mut doc = Self::default();
        let mut section = Section::Outside;

        for line in source.lines().map(str::trim) {
            if let Ok(r) = reference.parse(line).into_result() {
                doc.references.push(r);
                continue;
            }
            if section_end.parse(line).into_result().is_ok() {
                tracing::debug!("leaving section {section:?}");
                section = Section::Outside;
                continue;
            }
            if let Ok(next) = section_start.parse(line).into_result() {
                tracing::debug!("entering section {next:?}");
                section = next;
                continue;
            }

            match section {
                Section::SolutionConfigurations => {
                    if let Ok(key) = solution_configuration.parse(line).into_result() {
                        if !doc.configurations.contains(&key) {
                            doc.configurations.push(key);
                        }
                    }
                }
                Section::ProjectConfigurations => {
                    if let Ok(entry) = mapping.parse(line).into_result() {
                        doc.mappings.push(entry);
                    }
                }
                Section::Outside | Section::Other => {}
            }
        }

        doc
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Resolution
// ═══════════════════════════════════════════════════════════════════════════════

/// Join a `\`-separated relative path onto `base`.
pub(crate) fn join_windows_path(base: &Path, relative: &str) -> PathBuf {
    relative
        .split(['\\', '/'])
        .filter(|part| !part.is_empty())
        .fold(base.to_path_buf(), |acc, part| acc.join(part))
}

impl SolutionDocument {
    /// Resolve the raw document against the filesystem.
    ///
    /// References whose target is not an existing file are recorded in
    /// [`Solution::skipped`]. Mapping entries attach to projects by id.
    pub fn into_solution(self, path: &Path) -> Solution {
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut solution = Solution {
            path: path.to_path_buf(),
            id: self.references.first().map(|r| r.type_id.clone()),
            declared_configurations: self.configurations,
            base_dir,
            ..Default::default()
        };

        for reference in self.references {
            let project_path = join_windows_path(&solution.base_dir, &reference.path);
            if !project_path.is_file() {
                tracing::warn!(
                    "Skipping {}: directory or not found on file system",
                    project_path.display()
                );
                solution.skipped.push(SkippedReference {
                    name: reference.name,
                    path: project_path,
                });
                continue;
            }
            if solution.project_by_id(&reference.id).is_some() {
                tracing::debug!("duplicate project reference {} ignored", reference.id);
                continue;
            }
            solution
                .projects
                .push(Project::new(reference.id, reference.name, project_path));
        }

        for entry in self.mappings {
            match solution.projects.iter_mut().find(|p| p.id == entry.project_id) {
                Some(project) => {
                    project.mappings.insert(entry.solution, entry.project);
                }
                None => tracing::debug!(
                    "mapping {} for unknown project {} dropped",
                    entry.solution,
                    entry.project_id
                ),
            }
        }

        solution
    }
}

/// Read and parse a solution file. Projects are listed but not yet parsed.
pub fn parse_solution(path: impl AsRef<Path>) -> Result<Solution> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| PlanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(SolutionDocument::parse(&source).into_solution(path))
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
