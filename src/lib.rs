pub mod analyzer;
pub mod artifact;
pub mod condition;
pub mod csproj;
pub mod error;
pub mod model;
pub mod resolver;
pub mod sln;

pub use analyzer::{Analyzer, AnalyzerBuilder};
pub use artifact::{ArtifactLocator, OutputKind, OutputTable};
pub use error::{PlanError, Result};
pub use model::{ApiKind, ConfigKey, ConfigProperties, Project, Solution};
pub use resolver::{CommandResolver, Invocation, Resolution, Strategy};
