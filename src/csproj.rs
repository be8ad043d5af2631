//! Project descriptor (`.csproj`) parser.
//!
//! Only the handful of elements needed to plan a build are read; everything
//! else in the file is ignored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::condition;
use crate::error::{PlanError, Result};
use crate::model::{ApiKind, ConfigKey, ConfigProperties, Project};
use crate::sln::join_windows_path;

/// The fields of a `.csproj` that matter for build planning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDescriptor {
    pub project_guid: Option<String>,
    /// Lowercased.
    pub output_type: Option<String>,
    pub assembly_name: Option<String>,
    pub api_kind: ApiKind,
    pub configs: BTreeMap<ConfigKey, ConfigProperties>,
}

impl ProjectDescriptor {
    /// Parse a `.csproj` from its XML source.
    pub fn parse(source: &str) -> std::result::Result<Self, roxmltree::Error> {
        let doc = roxmltree::Document::parse(source)?;
        let mut descriptor = Self::default();

        for group in doc
            .root_element()
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "PropertyGroup")
        {
            descriptor.read_property_group(&group);
        }

        // Last matching reference wins.
        for node in doc.descendants().filter(|n| n.is_element()) {
            if let Some(kind) = node.attribute("Include").and_then(sdk_kind) {
                descriptor.api_kind = kind;
            }
        }

        Ok(descriptor)
    }

    /// Load a `.csproj` from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| PlanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source).map_err(|source| PlanError::Xml {
            path: path.to_path_buf(),
            source,
        })
    }

    fn read_property_group(&mut self, group: &roxmltree::Node) {
        let scope = group.attribute("Condition").and_then(condition::scope_of);
        if let Some(key) = &scope {
            tracing::debug!("property group scope {key}");
        }

        for child in group.children().filter(|n| n.is_element()) {
            let text = child.text().unwrap_or("").trim();
            match child.tag_name().name() {
                "ProjectGuid" => self.project_guid = Some(text.to_string()),
                "OutputType" => self.output_type = Some(text.to_lowercase()),
                "AssemblyName" => self.assembly_name = Some(text.to_string()),
                tag => {
                    if let Some(key) = &scope {
                        let props = self.configs.entry(key.clone()).or_default();
                        set_config_property(tag, text, props);
                    }
                }
            }
        }

        if let Some(key) = scope {
            self.configs.entry(key).or_default();
        }
    }
}

fn set_config_property(tag: &str, text: &str, props: &mut ConfigProperties) {
    match tag {
        "OutputPath" => props.output_path = Some(normalize_output_path(text)),
        "MtouchArch" => {
            props.mtouch_architectures = text
                .split(',')
                .map(str::trim)
                .filter(|arch| !arch.is_empty())
                .map(String::from)
                .collect();
        }
        "IpaPackageName" => props.ipa_package = true,
        "BuildIpa" => {
            if text.eq_ignore_ascii_case("true") {
                props.build_ipa = true;
            }
        }
        _ => {}
    }
}

/// `bin\iPhone\Release\` → `bin/iPhone/Release`.
fn normalize_output_path(text: &str) -> PathBuf {
    join_windows_path(Path::new(""), text)
}

fn sdk_kind(include: &str) -> Option<ApiKind> {
    if include.eq_ignore_ascii_case("Xamarin.iOS") {
        Some(ApiKind::Ios)
    } else if include.eq_ignore_ascii_case("Mono.Android") {
        Some(ApiKind::Android)
    } else if include.eq_ignore_ascii_case("Xamarin.UITest") {
        Some(ApiKind::UiTest)
    } else {
        None
    }
}

/// Parse the descriptor behind `project.path` and fill the project in place.
///
/// The descriptor's `<ProjectGuid>` must match the id the solution gave the
/// project.
pub fn parse_project(project: &mut Project) -> Result<()> {
    let descriptor = ProjectDescriptor::from_file(&project.path)?;
    project.apply(descriptor)
}

impl Project {
    pub(crate) fn apply(&mut self, descriptor: ProjectDescriptor) -> Result<()> {
        if let Some(guid) = &descriptor.project_guid {
            if *guid != self.id {
                return Err(PlanError::ProjectIdMismatch {
                    path: self.path.clone(),
                    expected: self.id.clone(),
                    found: guid.clone(),
                });
            }
        }

        self.output_type = descriptor.output_type;
        self.assembly_name = descriptor.assembly_name;
        self.api_kind = descriptor.api_kind;
        self.configs = descriptor.configs;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
