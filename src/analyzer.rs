use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::artifact::{ARCHIVES_DIR, ArtifactLocator, OutputTable};
use crate::csproj::{self, ProjectDescriptor};
use crate::error::{PlanError, Result};
use crate::model::{Project, Solution};
use crate::resolver::{CommandResolver, DEFAULT_TOOL_PATH, Invocation, Resolution};
use crate::sln;

/// Environment variable overriding the build tool location.
pub const TOOL_PATH_VAR: &str = "MDTOOL_PATH";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputKind {
    Solution,
    Project,
}

impl InputKind {
    fn of(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("sln") => Ok(InputKind::Solution),
            Some("csproj") => Ok(InputKind::Project),
            _ => Err(PlanError::UnsupportedInput(path.to_path_buf())),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Analyzer – top-level handle
// ═══════════════════════════════════════════════════════════════════════════════

/// A fully parsed solution together with the resolver and locator used to
/// plan builds against it.
#[derive(Debug, Clone)]
pub struct Analyzer {
    solution: Solution,
    resolver: CommandResolver,
    locator: ArtifactLocator,
}

impl Analyzer {
    /// Analyse a `.sln` or `.csproj`, configured from the process environment.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        AnalyzerBuilder::new().system_env().from_file(path)
    }

    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    pub fn resolver(&self) -> &CommandResolver {
        &self.resolver
    }

    pub fn locator(&self) -> &ArtifactLocator {
        &self.locator
    }

    /// Resolve the iOS application build, if the solution has one.
    pub fn resolve(&self, configuration: &str, platform: &str) -> Result<Option<Resolution<'_>>> {
        self.resolver.resolve(&self.solution, configuration, platform)
    }

    /// The invocation to hand to the process runner, falling back to a
    /// whole-solution build.
    pub fn build_command(&self, configuration: &str, platform: &str) -> Result<Invocation> {
        self.resolver.plan(&self.solution, configuration, platform)
    }

    /// Where the resolved build's artifacts are expected. Empty when there
    /// is no iOS application to resolve.
    pub fn output_table(&self, configuration: &str, platform: &str) -> Result<OutputTable> {
        match self.resolve(configuration, platform)? {
            Some(resolution) => self.locator.outputs(&resolution),
            None => Ok(OutputTable::new()),
        }
    }
}

impl fmt::Display for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.solution, f)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  AnalyzerBuilder
// ═══════════════════════════════════════════════════════════════════════════════

/// Builder for an [`Analyzer`] with explicit configuration.
///
/// The tool path comes from [`tool_path`](Self::tool_path), else
/// `MDTOOL_PATH` in the environment map, else [`DEFAULT_TOOL_PATH`]. The
/// archive root comes from [`archive_root`](Self::archive_root), else
/// `$HOME/Library/Developer/Xcode/Archives`.
///
/// # Example
/// ```no_run
/// use slnplan_rs::AnalyzerBuilder;
///
/// let analyzer = AnalyzerBuilder::new()
///     .system_env()
///     .tool_path("/usr/local/bin/mdtool")
///     .from_file("Mobile.sln")
///     .unwrap();
/// println!("{}", analyzer.build_command("Release", "iPhone").unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AnalyzerBuilder {
    env: HashMap<String, String>,
    tool_path: Option<String>,
    archive_root: Option<PathBuf>,
}

impl AnalyzerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a variable map into the environment. Later calls override
    /// earlier values.
    pub fn env(mut self, vars: HashMap<String, String>) -> Self {
        self.env.extend(vars);
        self
    }

    pub fn env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Pull all current process environment variables into the map.
    pub fn system_env(mut self) -> Self {
        self.env.extend(std::env::vars());
        self
    }

    pub fn tool_path(mut self, path: impl Into<String>) -> Self {
        self.tool_path = Some(path.into());
        self
    }

    pub fn archive_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.archive_root = Some(path.into());
        self
    }

    fn build_resolver(&self) -> CommandResolver {
        let tool_path = self
            .tool_path
            .clone()
            .or_else(|| self.env.get(TOOL_PATH_VAR).cloned())
            .unwrap_or_else(|| DEFAULT_TOOL_PATH.to_string());
        CommandResolver::new(tool_path)
    }

    fn build_locator(&self) -> ArtifactLocator {
        let root = self
            .archive_root
            .clone()
            .or_else(|| self.env.get("HOME").map(|home| Path::new(home).join(ARCHIVES_DIR)));
        ArtifactLocator::new(root)
    }

    /// Parse a `.sln` (and every project it references) or a single
    /// `.csproj`.
    pub fn from_file(self, path: impl AsRef<Path>) -> Result<Analyzer> {
        let path = path.as_ref();
        let solution = match InputKind::of(path)? {
            InputKind::Solution => analyze_solution(path)?,
            InputKind::Project => analyze_project(path)?,
        };

        Ok(Analyzer {
            solution,
            resolver: self.build_resolver(),
            locator: self.build_locator(),
        })
    }
}

fn analyze_solution(path: &Path) -> Result<Solution> {
    let mut solution = sln::parse_solution(path)?;
    for project in &mut solution.projects {
        csproj::parse_project(project)?;
    }
    Ok(solution)
}

/// A standalone project behaves like a solution containing only itself,
/// with every configuration mapped onto itself.
fn analyze_project(path: &Path) -> Result<Solution> {
    let descriptor = ProjectDescriptor::from_file(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut project = Project::new(descriptor.project_guid.clone().unwrap_or_default(), name, path);
    project.apply(descriptor)?;
    project.mappings = project
        .configs
        .keys()
        .map(|key| (key.clone(), key.clone()))
        .collect::<BTreeMap<_, _>>();

    Ok(Solution {
        path: path.to_path_buf(),
        base_dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
        id: None,
        declared_configurations: project.configs.keys().cloned().collect(),
        projects: vec![project],
        skipped: Vec::new(),
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
