//! Build command resolution.
//!
//! Given a parsed [`Solution`] and a `(configuration, platform)` pair, pick
//! the iOS application to build and decide between an incremental `build`
//! and a device `archive`.

use std::fmt;

use crate::error::{PlanError, Result};
use crate::model::{ApiKind, ConfigKey, Project, Solution};

/// Default location of the Xamarin Studio command line tool.
pub const DEFAULT_TOOL_PATH: &str = "/Applications/Xamarin Studio.app/Contents/MacOS/mdtool";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Simulator or mixed-architecture build producing a `.app`.
    Build,
    /// Device-only build producing an `.xcarchive`.
    Archive,
}

impl Strategy {
    /// Archive when every architecture targets a device (`arm*`).
    pub fn for_architectures(archs: &[String]) -> Self {
        if archs
            .iter()
            .all(|arch| arch.to_ascii_lowercase().starts_with("arm"))
        {
            Strategy::Archive
        } else {
            Strategy::Build
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Build => "build",
            Strategy::Archive => "archive",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One invocation of the external build tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// A [`std::process::Command`] ready to be spawned by the caller.
    pub fn command(&self) -> std::process::Command {
        let mut command = std::process::Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

fn shell_quote(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@%".contains(c))
    {
        arg.to_string()
    } else {
        format!("\"{}\"", arg.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

/// The outcome of resolving a configuration against a solution.
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    pub project: &'a Project,
    /// The project-local configuration the solution configuration maps to.
    pub local_configuration: &'a ConfigKey,
    pub strategy: Strategy,
    pub invocation: Invocation,
}

#[derive(Debug, Clone)]
pub struct CommandResolver {
    tool_path: String,
}

impl Default for CommandResolver {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_PATH)
    }
}

impl CommandResolver {
    pub fn new(tool_path: impl Into<String>) -> Self {
        Self { tool_path: tool_path.into() }
    }

    pub fn tool_path(&self) -> &str {
        &self.tool_path
    }

    /// Resolve the build of the first iOS executable project.
    ///
    /// Returns `Ok(None)` when the solution has no such project; callers fall
    /// back to [`solution_invocation`](Self::solution_invocation).
    pub fn resolve<'a>(
        &self,
        solution: &'a Solution,
        configuration: &str,
        platform: &str,
    ) -> Result<Option<Resolution<'a>>> {
        let key = ConfigKey::new(configuration, platform);

        let Some(project) = solution.executable_projects(ApiKind::Ios).next() else {
            tracing::debug!("no iOS application project for {key}");
            return Ok(None);
        };

        let local = project
            .local_configuration(&key)
            .ok_or_else(|| PlanError::MissingMapping {
                configuration: format!("{configuration}|{platform}"),
                project: project.name.clone(),
            })?;
        let props = project
            .properties(local)
            .ok_or_else(|| PlanError::MissingProjectConfiguration {
                configuration: local.to_string(),
                project: project.name.clone(),
            })?;

        let strategy = Strategy::for_architectures(&props.mtouch_architectures);
        tracing::debug!(
            "{} {key} -> {local} [{}]: {strategy}",
            project.name,
            props.mtouch_architectures.join(",")
        );

        let invocation = Invocation {
            program: self.tool_path.clone(),
            args: vec![
                strategy.as_str().to_string(),
                format!("-c:{configuration}|{platform}"),
                solution.path.display().to_string(),
                format!("-p:{}", project.name),
            ],
        };

        Ok(Some(Resolution {
            project,
            local_configuration: local,
            strategy,
            invocation,
        }))
    }

    /// Build the whole solution for a configuration.
    pub fn solution_invocation(
        &self,
        solution: &Solution,
        configuration: &str,
        platform: &str,
    ) -> Invocation {
        Invocation {
            program: self.tool_path.clone(),
            args: vec![
                Strategy::Build.as_str().to_string(),
                format!("-c:{configuration}|{platform}"),
                solution.path.display().to_string(),
            ],
        }
    }

    /// The invocation to run: the resolved project, or the whole solution
    /// when no iOS application exists.
    pub fn plan(&self, solution: &Solution, configuration: &str, platform: &str) -> Result<Invocation> {
        match self.resolve(solution, configuration, platform)? {
            Some(resolution) => Ok(resolution.invocation),
            None => Ok(self.solution_invocation(solution, configuration, platform)),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
