//! Shared fixtures for integration tests.
//!
//! Every fixture creates real git repositories in a temporary directory.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use pegboard::core::config::{WorkspaceConfig, WorkspaceFile};
use pegboard::manager::mock::MockPackageManager;
use pegboard::workspace::Workspace;

/// Run a git command in the given directory, returning trimmed stdout.
pub fn run_git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

/// Initialize a repository on branch `main` with a local identity.
pub fn init_repo(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    run_git(dir, &["init", "--quiet"]);
    run_git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    run_git(dir, &["config", "user.email", "test@example.com"]);
    run_git(dir, &["config", "user.name", "Test User"]);
    run_git(dir, &["config", "commit.gpgsign", "false"]);
}

/// A single repository with an initial commit.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        init_repo(dir.path());
        fs::write(dir.path().join("README.md"), "# Test Repo\n").unwrap();
        run_git(dir.path(), &["add", "README.md"]);
        run_git(dir.path(), &["commit", "--quiet", "-m", "Initial commit"]);
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write and commit a file, returning the new HEAD.
    pub fn commit_file(&self, path: &str, content: &str, message: &str) -> String {
        commit_file(self.path(), path, content, message)
    }

    pub fn head(&self) -> String {
        run_git(self.path(), &["rev-parse", "HEAD"])
    }
}

/// Write and commit a file in `dir`, returning the new HEAD.
pub fn commit_file(dir: &Path, path: &str, content: &str, message: &str) -> String {
    fs::write(dir.join(path), content).unwrap();
    run_git(dir, &["add", path]);
    run_git(dir, &["commit", "--quiet", "-m", message]);
    run_git(dir, &["rev-parse", "HEAD"])
}

/// Workspace `app -> lib -> base`, all downloaded.
///
/// Each package's declaration names the locked reference of its direct
/// dependency. The lock file lives untracked in `app`.
pub struct TestWorkspace {
    pub root: TempDir,
    pub manager: MockPackageManager,
    /// Locked reference strings by package name
    pub locked: Vec<(String, String)>,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self::with_app_declaration(|lib_ref, _base_ref| format!("requires = \"{lib_ref}\"\n"))
    }

    /// Build the workspace with a custom declaration for `app`, given the
    /// locked references of `lib` and `base`.
    pub fn with_app_declaration(app: impl Fn(&str, &str) -> String) -> Self {
        let root = TempDir::new().expect("failed to create temp dir");
        let mut locked = Vec::new();

        let base_dir = root.path().join("base");
        init_repo(&base_dir);
        commit_file(&base_dir, "conanfile.py", "class Base:\n    pass\n", "Add base");
        let base_ref = locked_reference(&base_dir, "base", "1.0");

        let lib_dir = root.path().join("lib");
        init_repo(&lib_dir);
        commit_file(
            &lib_dir,
            "conanfile.py",
            &format!("requires = \"{base_ref}\"\n"),
            "Add lib",
        );
        let lib_ref = locked_reference(&lib_dir, "lib", "2.0");

        let app_dir = root.path().join("app");
        init_repo(&app_dir);
        commit_file(&app_dir, "conanfile.py", &app(&lib_ref, &base_ref), "Add app");
        let app_ref = locked_reference(&app_dir, "app", "3.1");

        let lock = serde_json::json!({
            "graph_lock": {
                "nodes": {
                    "0": { "pref": app_ref, "requires": ["1"] },
                    "1": { "pref": lib_ref, "requires": ["2"] },
                    "2": { "pref": base_ref }
                }
            }
        });
        fs::write(
            app_dir.join("conan.lock"),
            serde_json::to_string_pretty(&lock).unwrap(),
        )
        .unwrap();

        locked.push(("base".to_string(), base_ref));
        locked.push(("lib".to_string(), lib_ref));
        locked.push(("app".to_string(), app_ref));

        let manager = MockPackageManager::new(root.path().join("editable_packages.json"));
        Self {
            root,
            manager,
            locked,
        }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn dir(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    pub fn config(&self) -> WorkspaceConfig {
        WorkspaceConfig::resolve(
            self.path(),
            WorkspaceFile::default(),
            Some("app"),
            self.manager.registry_path().to_path_buf(),
        )
        .unwrap()
    }

    /// Open the workspace on a clone of the shared mock.
    pub fn open(&self) -> Workspace<MockPackageManager> {
        Workspace::open(self.config(), self.manager.clone()).unwrap()
    }

    /// Open the workspace and make every package editable.
    pub fn open_editable(&self) -> Workspace<MockPackageManager> {
        let workspace = self.open();
        workspace.edit(&[], false).unwrap();
        self.manager.clear_operations();
        workspace
    }

    pub fn locked(&self, name: &str) -> &str {
        self.locked
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r.as_str())
            .unwrap()
    }

    pub fn head(&self, name: &str) -> String {
        run_git(&self.dir(name), &["rev-parse", "HEAD"])
    }

    pub fn declaration(&self, name: &str) -> String {
        fs::read_to_string(self.dir(name).join("conanfile.py")).unwrap()
    }

    pub fn last_message(&self, name: &str) -> String {
        run_git(&self.dir(name), &["log", "-1", "--format=%s"])
    }
}

/// `name/version.<sequence>.<HEAD>@acme/stable` for the checkout in `dir`.
pub fn locked_reference(dir: &Path, name: &str, version: &str) -> String {
    let head = run_git(dir, &["rev-parse", "HEAD"]);
    let sequence = run_git(dir, &["rev-list", "--count", "--first-parent", "HEAD"]);
    format!("{name}/{version}.{sequence}.{head}@acme/stable")
}
