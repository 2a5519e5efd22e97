//! # Git-Hosted Repositories
//!
//! Everything needed to treat a git remote as a [`RemoteRepository`]:
//!
//! - **`GitClient`**: runs git with an argument vector and returns stdout.
//!   [`GitCmd`] is the real implementation and shells out to the system
//!   `git`, which picks up SSH keys, credential helpers and `~/.gitconfig`
//!   from the inherited environment.
//!
//! - **`WorkTree`**: a client bound to one working directory. Every command
//!   is prefixed with `-C <dir>` (or `--work-tree`/`--git-dir` when a separate
//!   git dir is given).
//!
//! - **`GitRepo`**: a remote repository described by a free-form URL. Where
//!   the repository ends and the sub-path inside it begins cannot be read off
//!   the URL, so [`GitRepo::detect`] probes the remote with `ls-remote` on
//!   successively longer prefixes until one answers.
//!
//! Syncing is self-healing: an existing working tree is pulled and
//! verified, and if anything about it is wrong the directory is deleted and
//! cloned again from scratch.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::defaults::DEFAULT_GIT_PROGRAM;
use crate::error::{Error, Result};
use crate::repository::{PersistentHandle, RemoteRepository, Repo, Repository};

/// Type tag for [`GitRepo`] handles
pub const GIT_REPO_TYPE: &str = "git";

/// Prefixes tried, in order, for URLs that carry no protocol
const BARE_URL_PROTOCOLS: [&str; 3] = ["http", "https", "file"];

/// Trait for running git commands - allows mocking in tests
pub trait GitClient: Send + Sync {
    /// Run git with `args`, returning its stdout.
    ///
    /// A non-zero exit is reported as [`Error::GitCommand`] carrying the
    /// captured stdout and stderr.
    fn exec(&self, args: &[&str]) -> Result<String>;
}

/// [`GitClient`] backed by the git executable
#[derive(Debug, Clone)]
pub struct GitCmd {
    program: PathBuf,
}

impl GitCmd {
    /// Client running `program`, either a path or a bare name looked up in
    /// `PATH`.
    pub fn new(program: impl Into<PathBuf>) -> Result<Self> {
        let program = program.into();
        if program.as_os_str().is_empty() {
            return Err(Error::InvalidConfig {
                message: "git program is required".to_string(),
            });
        }
        Ok(Self { program })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for GitCmd {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_GIT_PROGRAM),
        }
    }
}

impl GitClient for GitCmd {
    fn exec(&self, args: &[&str]) -> Result<String> {
        let command = args.join(" ");
        debug!("Running {} {}", self.program.display(), command);

        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| Error::GitCommand {
                command: command.clone(),
                message: e.to_string(),
                stdout: String::new(),
                stderr: String::new(),
            })?;

        if !output.status.success() {
            return Err(Error::GitCommand {
                command,
                message: output.status.to_string(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn path_arg(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| Error::InvalidConfig {
        message: format!("path is not valid UTF-8: {}", path.display()),
    })
}

/// A git client bound to one working tree
pub struct WorkTree<'a> {
    client: &'a dyn GitClient,
    work_dir: PathBuf,
    git_dir: Option<PathBuf>,
}

impl<'a> WorkTree<'a> {
    pub fn new(client: &'a dyn GitClient, work_dir: impl Into<PathBuf>) -> Result<Self> {
        let work_dir = work_dir.into();
        if work_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig {
                message: "work dir is required".to_string(),
            });
        }
        Ok(Self {
            client,
            work_dir,
            git_dir: None,
        })
    }

    /// Keep the repository metadata in `git_dir` instead of `<work_dir>/.git`.
    pub fn with_git_dir(mut self, git_dir: impl Into<PathBuf>) -> Self {
        self.git_dir = Some(git_dir.into());
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Hash of the commit checked out in the working tree.
    ///
    /// Fails when the directory is missing or is not a working tree, which
    /// makes this double as a validity probe.
    pub fn latest_commit(&self) -> Result<String> {
        let out = self.exec(&["log", "-1", "--format=%H"])?;
        Ok(out.trim().to_string())
    }

    /// Fetch from the remote and merge into the working tree.
    pub fn pull(&self) -> Result<()> {
        self.exec(&["pull"])?;
        Ok(())
    }

    /// Pull, then confirm the tree is still readable by fetching the latest
    /// commit.
    pub fn pull_and_verify(&self) -> Result<String> {
        self.pull()?;
        self.latest_commit()
    }

    /// Clone `remote` into the work dir.
    ///
    /// The work dir does not exist yet, so the command goes straight to the
    /// underlying client without the `-C` prefix. Missing parent directories
    /// are created first.
    pub fn clone_from(&self, remote: &str) -> Result<()> {
        if let Some(parent) = self.work_dir.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        self.client
            .exec(&["clone", remote, path_arg(&self.work_dir)?])?;
        Ok(())
    }
}

impl GitClient for WorkTree<'_> {
    fn exec(&self, args: &[&str]) -> Result<String> {
        let work_tree_flag;
        let git_dir_flag;
        let mut argv: Vec<&str> = Vec::with_capacity(args.len() + 2);
        match &self.git_dir {
            Some(git_dir) => {
                work_tree_flag = format!("--work-tree={}", path_arg(&self.work_dir)?);
                git_dir_flag = format!("--git-dir={}", path_arg(git_dir)?);
                argv.push(&work_tree_flag);
                argv.push(&git_dir_flag);
            }
            None => {
                argv.push("-C");
                argv.push(path_arg(&self.work_dir)?);
            }
        }
        argv.extend_from_slice(args);
        self.client.exec(&argv)
    }
}

impl fmt::Debug for WorkTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkTree")
            .field("work_dir", &self.work_dir)
            .field("git_dir", &self.git_dir)
            .finish_non_exhaustive()
    }
}

fn default_client() -> Arc<dyn GitClient> {
    Arc::new(GitCmd::default())
}

/// A remote git repository
///
/// Everything except `url` is derived from it by [`GitRepo::detect`]:
/// `remote` is the protocol-specific prefix plus `repo_name`, and
/// `remote + path` reproduces the URL (with the probed prefix added when
/// the URL had none).
#[derive(Clone, Serialize, Deserialize)]
pub struct GitRepo {
    /// Full URL as given by the user
    pub url: String,
    /// Protocol used to talk to the remote (`ssh`, `https`, `file`, ...)
    pub protocol: String,
    /// Repository portion of the URL
    #[serde(rename = "name")]
    pub repo_name: String,
    /// URL of the repository itself, suitable for `git clone`
    pub remote: String,
    /// Sub-path inside the repository, empty or starting with `/`
    pub path: String,

    #[serde(skip, default = "default_client")]
    client: Arc<dyn GitClient>,
}

impl GitRepo {
    /// Work out protocol, repository and sub-path of `url` by probing the
    /// remote through `client`.
    pub fn detect(url: impl Into<String>, client: Arc<dyn GitClient>) -> Result<Self> {
        let mut repo = Self {
            url: url.into(),
            protocol: String::new(),
            repo_name: String::new(),
            remote: String::new(),
            path: String::new(),
            client,
        };
        repo.redetect()?;
        Ok(repo)
    }

    /// Re-run detection against the current client, refreshing every
    /// derived field.
    ///
    /// On failure the derived fields are left empty.
    pub fn redetect(&mut self) -> Result<()> {
        self.protocol.clear();
        self.repo_name.clear();
        self.remote.clear();
        self.path.clear();
        if self.url.is_empty() {
            return Err(Error::InvalidConfig {
                message: "git url is required".to_string(),
            });
        }

        let url = self.url.clone();
        let slash = url.find('/');
        let colon = url.find(':');
        let at = url.find('@');

        // user@host:repo/path
        if let (Some(at), Some(colon)) = (at, colon) {
            if at > 0 && at < colon && slash.map_or(true, |slash| colon < slash) {
                return self.detect_prefixed("ssh", &url[..=colon], &url[colon + 1..]);
            }
        }

        // protocol://host/repo/path
        if let (Some(colon), Some(slash)) = (colon, slash) {
            if colon > 0 && colon < slash && url[colon + 1..].starts_with("//") {
                return self.detect_prefixed(&url[..colon], &url[..colon + 3], &url[colon + 3..]);
            }
        }

        // ./path, ../path, /path
        if url.starts_with("./") || url.starts_with("../") || url.starts_with('/') {
            return self.detect_prefixed("file", "file://", &url);
        }

        // host/repo/path
        for protocol in BARE_URL_PROTOCOLS {
            let prefix = format!("{}://", protocol);
            if self.detect_prefixed(protocol, &prefix, &url).is_ok() {
                return Ok(());
            }
        }
        Err(Error::InvalidGitUrl { url })
    }

    fn detect_prefixed(&mut self, protocol: &str, prefix: &str, path: &str) -> Result<()> {
        let (repo_name, rest) = probe_remote(self.client.as_ref(), prefix, path).ok_or_else(|| {
            Error::InvalidGitUrl {
                url: self.url.clone(),
            }
        })?;
        self.protocol = protocol.to_string();
        self.remote = format!("{}{}", prefix, repo_name);
        self.repo_name = repo_name;
        self.path = rest;
        info!(
            "Detected git repository {} (sub-path {:?}) for {}",
            self.remote, self.path, self.url
        );
        Ok(())
    }

    pub fn client(&self) -> &Arc<dyn GitClient> {
        &self.client
    }

    /// Rebind the repository to another client.
    pub fn with_client(mut self, client: Arc<dyn GitClient>) -> Self {
        self.client = client;
        self
    }
}

/// Find the shortest leading part of `path` that `prefix` turns into a
/// reachable remote.
///
/// `path` is consumed one `/`-separated component at a time; separators are
/// carried into the candidate without probing on their own. Returns the
/// accepted repository part and the unconsumed remainder.
fn probe_remote(client: &dyn GitClient, prefix: &str, path: &str) -> Option<(String, String)> {
    let mut base = String::new();
    let mut rest = path;
    while !rest.is_empty() {
        match rest.find('/') {
            Some(0) => {
                base.push('/');
                rest = &rest[1..];
                continue;
            }
            Some(pos) => {
                base.push_str(&rest[..pos]);
                rest = &rest[pos..];
            }
            None => {
                base.push_str(rest);
                rest = "";
            }
        }
        let candidate = format!("{}{}", prefix, base);
        debug!("Probing git remote {}", candidate);
        if client.exec(&["ls-remote", &candidate]).is_ok() {
            return Some((base, rest.to_string()));
        }
    }
    None
}

/// Remove whatever occupies `target`, directory or not.
fn remove_path_if_exists(target: &Path) -> Result<()> {
    let removed = match fs::symlink_metadata(target) {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(target),
        Ok(_) => fs::remove_file(target),
        Err(e) => Err(e),
    };
    match removed {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

impl Repository for GitRepo {
    fn base_path(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }

    fn persist(&self) -> Result<PersistentHandle> {
        Ok(PersistentHandle::new(
            GIT_REPO_TYPE,
            serde_json::to_string(self)?,
        ))
    }
}

impl RemoteRepository for GitRepo {
    fn sync(&self, dir: &Path) -> Result<()> {
        if self.remote.is_empty() {
            return Err(Error::InvalidConfig {
                message: format!("git remote is not detected for {}", self.url),
            });
        }
        let tree = WorkTree::new(self.client.as_ref(), dir)?;

        match tree.latest_commit().and_then(|_| tree.pull_and_verify()) {
            Ok(commit) => {
                info!("Updated {} to {}", dir.display(), commit);
                Ok(())
            }
            Err(err) => {
                warn!(
                    "Working tree {} is not usable, cloning {} again: {}",
                    dir.display(),
                    self.remote,
                    err
                );
                remove_path_if_exists(dir)?;
                tree.clone_from(&self.remote)?;
                info!("Cloned {} into {}", self.remote, dir.display());
                Ok(())
            }
        }
    }
}

impl PartialEq for GitRepo {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
            && self.protocol == other.protocol
            && self.repo_name == other.repo_name
            && self.remote == other.remote
            && self.path == other.path
    }
}

impl fmt::Debug for GitRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitRepo")
            .field("url", &self.url)
            .field("protocol", &self.protocol)
            .field("repo_name", &self.repo_name)
            .field("remote", &self.remote)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Factory restoring a [`GitRepo`] from its handle, bound to `client`
pub fn git_repo_factory(handle: &PersistentHandle, client: Arc<dyn GitClient>) -> Result<Option<Repo>> {
    if handle.kind != GIT_REPO_TYPE {
        return Ok(None);
    }
    let repo: GitRepo = serde_json::from_str(&handle.opaque)?;
    Ok(Some(Repo::Git(repo.with_client(client))))
}
