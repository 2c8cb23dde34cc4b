use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::branch::{BranchName, TrackedBranch};
use crate::error::{AppError, AppResult};

/// Repository name to the branches tracked in it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryState {
    pub repos: BTreeMap<String, BTreeMap<BranchName, TrackedBranch>>,
}

impl RepositoryState {
    pub fn branch(&self, repo: &str, branch: &BranchName) -> Option<&TrackedBranch> {
        self.repos.get(repo).and_then(|branches| branches.get(branch))
    }

    pub fn branch_mut(&mut self, repo: &str, branch: &BranchName) -> Option<&mut TrackedBranch> {
        self.repos
            .get_mut(repo)
            .and_then(|branches| branches.get_mut(branch))
    }

    /// Every (repository, branch) pair in enumeration order.
    pub fn tracked(&self) -> Vec<(String, BranchName)> {
        self.repos
            .iter()
            .flat_map(|(repo, branches)| {
                branches
                    .keys()
                    .map(move |branch| (repo.clone(), branch.clone()))
            })
            .collect()
    }

    pub fn branch_count(&self) -> usize {
        self.repos.values().map(BTreeMap::len).sum()
    }
}

/// The YAML file holding watermarks and link templates.
#[derive(Debug, Clone)]
pub struct StateStore {
    file_path: PathBuf,
}

impl StateStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn load(&self) -> AppResult<RepositoryState> {
        let contents = fs::read_to_string(&self.file_path).map_err(|err| {
            AppError::State(format!(
                "unable to read {}: {err}",
                self.file_path.display()
            ))
        })?;
        if contents.trim().is_empty() {
            return Ok(RepositoryState::default());
        }
        serde_yaml::from_str::<RepositoryState>(&contents).map_err(|err| {
            AppError::State(format!("invalid {}: {err}", self.file_path.display()))
        })
    }

    /// Replaces the file by writing a sibling and renaming it into place.
    pub fn save(&self, state: &RepositoryState) -> AppResult<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_yaml::to_string(state)
            .map_err(|err| AppError::State(format!("failed to serialize state: {err}")))?;

        let mut tmp_name = self.file_path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        fs::write(&tmp_path, data)?;
        fs::rename(&tmp_path, &self.file_path)?;
        Ok(())
    }
}
