//! Post-flush dependency installation through a package manager.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use stratum_core::{
    application::{
        ApplicationError,
        ports::{CommandInvocation, CommandRunner, DependencyInstaller},
    },
    error::StratumResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Npm,
    Pnpm,
    Yarn,
    Bun,
}

impl PackageManager {
    pub const ALL: [Self; 4] = [Self::Npm, Self::Pnpm, Self::Yarn, Self::Bun];

    pub fn program(self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Pnpm => "pnpm",
            Self::Yarn => "yarn",
            Self::Bun => "bun",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

impl FromStr for PackageManager {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|pm| pm.program().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown package manager '{s}' (expected npm, pnpm, yarn or bun)")
            })
    }
}

/// Runs `<manager> install` at the project root.
#[derive(Clone)]
pub struct PackageManagerInstaller {
    manager: PackageManager,
    runner: Arc<dyn CommandRunner>,
}

impl PackageManagerInstaller {
    pub fn new(manager: PackageManager, runner: Arc<dyn CommandRunner>) -> Self {
        Self { manager, runner }
    }

    pub fn manager(&self) -> PackageManager {
        self.manager
    }
}

impl fmt::Debug for PackageManagerInstaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageManagerInstaller")
            .field("manager", &self.manager)
            .finish()
    }
}

impl DependencyInstaller for PackageManagerInstaller {
    #[instrument(skip_all, fields(manager = %self.manager, root = %project_root.display()))]
    fn install(&self, project_root: &Path) -> StratumResult<()> {
        let invocation = CommandInvocation::new(self.manager.program())
            .args(["install"])
            .current_dir(project_root);

        let output = self
            .runner
            .run(&invocation)
            .map_err(|e| ApplicationError::InstallFailed {
                reason: e.to_string(),
            })?;

        if !output.success() {
            let detail = output.stderr.lines().last().unwrap_or_default().trim();
            return Err(ApplicationError::InstallFailed {
                reason: match output.exit_code {
                    Some(code) => format!(
                        "`{}` exited with status {code}: {detail}",
                        invocation.display()
                    ),
                    None => format!("`{}` was terminated: {detail}", invocation.display()),
                },
            }
            .into());
        }

        info!("dependencies installed");
        Ok(())
    }
}
