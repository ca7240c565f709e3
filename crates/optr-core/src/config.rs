use crate::paths;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the worktree registry.
///
/// Always constructed explicitly and passed in — there is no process-wide
/// default repository root.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Path to the main repository checkout.
    pub repo_root: PathBuf,

    /// State document name, relative to `repo_root`.
    pub state_file: String,

    /// Upper bound on every external git invocation.
    pub git_timeout: Duration,
}

impl RegistryConfig {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            state_file: paths::STATE_FILE.to_string(),
            git_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_state_file(mut self, name: impl Into<String>) -> Self {
        self.state_file = name.into();
        self
    }

    pub fn state_path(&self) -> PathBuf {
        self.repo_root.join(&self.state_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_path_joins_root_and_name() {
        let config = RegistryConfig::new("/repo");
        assert_eq!(config.state_path(), PathBuf::from("/repo/.optr-worktrees.json"));

        let config = RegistryConfig::new("/repo").with_state_file("custom.json");
        assert_eq!(config.state_path(), PathBuf::from("/repo/custom.json"));
    }
}
