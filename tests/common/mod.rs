//! Shared test utilities for integration tests.
//!
//! This module provides fixtures and fake git clients used across the
//! integration test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_file("docs/index.md", "# Docs");
//!     // ... test code
//! }
//! ```

use assert_fs::prelude::*;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use repo_cache::git::GitClient;
use repo_cache::Result;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{accept_all, should_skip_git_tests, SourceRepo, TestFixture};
}

/// Check if tests needing a real git binary should be skipped.
///
/// Set `SKIP_GIT_TESTS=1` to skip them even when the `integration-tests`
/// feature is enabled.
#[allow(dead_code)]
pub fn should_skip_git_tests() -> bool {
    env::var("SKIP_GIT_TESTS").is_ok()
}

/// Git client whose every command succeeds with empty output.
///
/// Detection accepts the first probed prefix, which is enough for tests that
/// only exercise cache bookkeeping.
struct AcceptAll;

impl GitClient for AcceptAll {
    fn exec(&self, _args: &[&str]) -> Result<String> {
        Ok(String::new())
    }
}

#[allow(dead_code)]
pub fn accept_all() -> Arc<dyn GitClient> {
    Arc::new(AcceptAll)
}

/// A temporary directory populated with files for walking.
#[allow(dead_code)]
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a file with the given path and content, creating parents.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Add an empty directory.
    pub fn with_dir(self, path: &str) -> Self {
        self.temp_dir
            .child(path)
            .create_dir_all()
            .expect("Failed to create directory");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A real git repository used as the remote in sync tests.
#[allow(dead_code)]
pub struct SourceRepo {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl SourceRepo {
    /// Initialize a repository with one commit containing `files`.
    pub fn init(files: &[(&str, &str)]) -> Self {
        let repo = Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        };
        repo.git(&["init", "--quiet"]);
        repo.commit(files, "initial");
        repo
    }

    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    /// Write `files` and commit them.
    pub fn commit(&self, files: &[(&str, &str)], message: &str) {
        for (path, content) in files {
            self.temp_dir
                .child(path)
                .write_str(content)
                .expect("Failed to write file");
        }
        self.git(&["add", "--all"]);
        self.git(&[
            "-c",
            "user.name=Test",
            "-c",
            "user.email=test@example.com",
            "commit",
            "--quiet",
            "-m",
            message,
        ]);
    }

    /// Hash of the current HEAD commit.
    pub fn head(&self) -> String {
        self.git(&["rev-parse", "HEAD"]).trim().to_string()
    }

    fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .arg("-C")
            .arg(self.temp_dir.path())
            .args(args)
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }
}
