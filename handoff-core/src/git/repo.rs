//! Locating the repository that holds the work item

use std::path::{Path, PathBuf};

use git2::Repository;

use crate::{Error, Result};

/// Repository whose working tree contains the planning directory
pub struct GitRepo {
    repo: Repository,
    workdir: PathBuf,
}

impl std::fmt::Debug for GitRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepo")
            .field("workdir", &self.workdir)
            .finish_non_exhaustive()
    }
}

impl GitRepo {
    /// Find the repository containing `path`, walking up parent directories
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let start = path.as_ref();
        let repo = Repository::discover(start).map_err(|e| match e.code() {
            git2::ErrorCode::NotFound => Error::Git(format!(
                "{} is not inside a git repository; branches cannot be created",
                start.display()
            )),
            _ => Error::Git(e.message().to_string()),
        })?;

        let workdir = match repo.workdir() {
            Some(dir) => dir.to_path_buf(),
            None => return Err(Error::Git("repository has no working tree".to_string())),
        };
        Ok(Self { repo, workdir })
    }

    /// Top of the working tree
    pub fn root(&self) -> &Path {
        &self.workdir
    }

    /// Branch HEAD points at; None when detached or before the first commit
    pub fn current_branch(&self) -> Result<Option<String>> {
        match self.repo.head() {
            Ok(head) if head.is_branch() => Ok(head.shorthand().map(str::to_owned)),
            Ok(_) => Ok(None),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => Ok(None),
            Err(e) => Err(Error::Git(format!("cannot read HEAD: {}", e))),
        }
    }

    pub(super) fn inner(&self) -> &Repository {
        &self.repo
    }
}
