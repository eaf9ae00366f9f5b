//! Integration tests for workspace operations and pegging.
//!
//! The workspace is `app -> lib -> base`, each package a real git
//! repository. The package manager is the in-crate mock, which keeps a
//! real editable table on disk.

mod common;

use std::fs;

use common::{commit_file, run_git, TestWorkspace};
use pegboard::core::lockfile::LockFileError;
use pegboard::manager::mock::{FailOn, ManagerOperation};
use pegboard::workspace::peg::DEFAULT_COMMIT_MESSAGE;
use pegboard::workspace::{Workspace, WorkspaceError};

#[test]
fn open_builds_graph_from_lock_file() {
    let ws = TestWorkspace::new();
    let workspace = ws.open();

    assert_eq!(workspace.topological_order().unwrap(), vec!["app", "lib", "base"]);
    assert_eq!(workspace.reverse_order().unwrap(), vec!["base", "lib", "app"]);
    assert_eq!(
        workspace.package("lib").unwrap().locked_reference().to_string(),
        ws.locked("lib")
    );
    assert!(matches!(
        workspace.package("zlib"),
        Err(WorkspaceError::MissingPackage(_))
    ));
}

#[test]
fn open_reports_malformed_lock_file_reference() {
    let ws = TestWorkspace::new();
    fs::write(
        ws.dir("app").join("conan.lock"),
        r#"{"graph_lock": {"nodes": {"0": {"pref": "app/not-a-reference"}}}}"#,
    )
    .unwrap();

    let err = Workspace::open(ws.config(), ws.manager.clone()).err().unwrap();

    assert!(matches!(
        err,
        WorkspaceError::LockFile(LockFileError::Reference { .. })
    ));
}

#[test]
fn edit_registers_locked_references() {
    let ws = TestWorkspace::new();
    let workspace = ws.open();
    assert!(workspace.editables().unwrap().is_empty());

    workspace.edit(&[], false).unwrap();

    let editables = workspace.editables().unwrap();
    assert_eq!(editables.len(), 3);
    assert_eq!(editables["lib"].package_reference.to_string(), ws.locked("lib"));
    assert_eq!(editables["lib"].path, ws.dir("lib"));
    assert!(workspace.package("base").unwrap().is_editable().unwrap());
}

#[test]
fn edit_is_idempotent() {
    let ws = TestWorkspace::new();
    let workspace = ws.open_editable();

    workspace.edit(&[], false).unwrap();

    assert!(ws.manager.operations().is_empty());
}

#[test]
fn edit_actual_uses_checkout_revision() {
    let ws = TestWorkspace::new();
    let workspace = ws.open_editable();
    let head = commit_file(&ws.dir("base"), "new.txt", "n", "Advance base");

    workspace.edit(&["base".to_string()], true).unwrap();

    let editable = workspace.package("base").unwrap().editable().unwrap().unwrap();
    assert_eq!(editable.package_reference.revision(), head);
    assert_eq!(editable.package_reference.sequence_in_branch(), 2);
    assert_eq!(ws.manager.registered().len(), 3);
}

#[test]
fn edit_rejects_missing_checkout() {
    let ws = TestWorkspace::new();
    fs::remove_dir_all(ws.dir("lib")).unwrap();
    let workspace = ws.open();

    let err = workspace.edit(&["lib".to_string()], false).unwrap_err();
    assert!(matches!(err, WorkspaceError::NotDownloaded(name) if name == "lib"));

    // Without names, only downloaded packages are edited
    workspace.edit(&[], false).unwrap();
    let editables = workspace.editables().unwrap();
    assert!(editables.contains_key("base"));
    assert!(!editables.contains_key("lib"));
}

#[test]
fn close_disables_selected_editables() {
    let ws = TestWorkspace::new();
    let workspace = ws.open_editable();

    let closed = workspace.close(&["lib".to_string()]).unwrap();
    assert_eq!(closed, vec!["lib"]);
    assert!(!workspace.package("lib").unwrap().is_editable().unwrap());
    assert!(workspace.package("base").unwrap().is_editable().unwrap());

    let closed = workspace.close(&[]).unwrap();
    assert_eq!(closed, vec!["app", "base"]);
    assert!(workspace.editables().unwrap().is_empty());
}

#[test]
fn stale_registry_entries_are_ignored() {
    let ws = TestWorkspace::new();
    let table = serde_json::json!({
        "base/9.9.1.abc123@acme/stable": { "path": "/elsewhere/base", "layout": null },
        "zlib/1.2.13@": { "path": "/elsewhere/zlib", "layout": null }
    });
    fs::write(ws.manager.registry_path(), table.to_string()).unwrap();

    let workspace = ws.open();
    assert!(workspace.editables().unwrap().is_empty());
}

#[test]
fn status_reports_consistency() {
    let ws = TestWorkspace::new();
    let workspace = ws.open_editable();
    fs::write(ws.dir("lib").join("conanfile.py"), "changed\n").unwrap();

    let statuses = workspace.status().unwrap();
    let names: Vec<&str> = statuses.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["app", "lib", "base"]);

    let lib = &statuses[1];
    let checkout = lib.checkout.as_ref().unwrap();
    assert!(checkout.dirty);
    assert!(checkout.contains_locked);
    assert_eq!(checkout.branch.as_deref(), Some("main"));
    assert!(statuses.iter().all(|s| s.is_consistent()));

    // Status runs nothing
    assert!(ws.manager.operations().is_empty());
}

#[test]
fn peg_propagates_dependency_commit() {
    let ws = TestWorkspace::new();
    let mut workspace = ws.open_editable();
    let lib_before = ws.head("lib");
    let app_before = ws.head("app");
    let base_head = commit_file(&ws.dir("base"), "base.cpp", "int x;\n", "Work on base");

    let report = workspace.peg(None).unwrap();

    assert_eq!(report.names().collect::<Vec<_>>(), vec!["base", "lib", "app"]);

    // base was already committed; only its registration moves
    let base = report.get("base").unwrap();
    assert!(!base.committed);
    assert_eq!(base.reference.revision(), base_head);
    assert_eq!(base.reference.sequence_in_branch(), 2);
    assert_eq!(base.rewritten, vec!["lib"]);

    // lib now names base's new triple and is committed for it
    assert!(ws.declaration("lib").contains(&base.reference.to_string()));
    let lib = report.get("lib").unwrap();
    assert!(lib.committed);
    assert_ne!(ws.head("lib"), lib_before);
    assert_eq!(lib.reference.revision(), ws.head("lib"));
    assert_eq!(ws.last_message("lib"), DEFAULT_COMMIT_MESSAGE);
    assert_eq!(lib.rewritten, vec!["app"]);

    // app never named base; it follows lib
    let app_declaration = ws.declaration("app");
    assert!(!app_declaration.contains("base/"));
    assert!(app_declaration.contains(&lib.reference.to_string()));
    assert_ne!(ws.head("app"), app_before);

    // One install per package, dependencies first
    assert_eq!(
        ws.manager.installs(),
        vec![ws.dir("base"), ws.dir("lib"), ws.dir("app")]
    );
    assert!(report.packages.iter().all(|p| p.installed));

    // The registry follows the new revisions
    let editables = workspace.editables().unwrap();
    assert_eq!(editables["base"].package_reference, base.reference);
    assert_eq!(editables["lib"].package_reference, lib.reference);
    assert_eq!(ws.manager.registered().len(), 3);
    assert!(!ws.manager.registered().contains_key(ws.locked("base")));
}

#[test]
fn peg_rewrites_transitive_mentions() {
    let ws = TestWorkspace::with_app_declaration(|lib_ref, base_ref| {
        format!("requires = \"{lib_ref}\"\nbuild_requires = \"{base_ref}\"\n")
    });
    let mut workspace = ws.open_editable();
    commit_file(&ws.dir("base"), "base.cpp", "int x;\n", "Work on base");

    let report = workspace.peg(None).unwrap();

    let base = report.get("base").unwrap();
    assert_eq!(base.rewritten, vec!["app", "lib"]);
    assert!(ws.declaration("app").contains(&base.reference.to_string()));
    assert!(!ws.declaration("app").contains(ws.locked("base")));
}

#[test]
fn peg_is_idempotent() {
    let ws = TestWorkspace::new();
    let mut workspace = ws.open_editable();
    commit_file(&ws.dir("base"), "base.cpp", "int x;\n", "Work on base");
    workspace.peg(None).unwrap();

    let heads: Vec<String> = ["base", "lib", "app"].iter().map(|n| ws.head(n)).collect();
    let declarations: Vec<String> = ["base", "lib", "app"]
        .iter()
        .map(|n| ws.declaration(n))
        .collect();
    ws.manager.clear_operations();

    let report = workspace.peg(None).unwrap();

    assert_eq!(report.committed().count(), 0);
    assert!(report.packages.iter().all(|p| p.rewritten.is_empty()));
    let heads_after: Vec<String> = ["base", "lib", "app"].iter().map(|n| ws.head(n)).collect();
    let declarations_after: Vec<String> = ["base", "lib", "app"]
        .iter()
        .map(|n| ws.declaration(n))
        .collect();
    assert_eq!(heads, heads_after);
    assert_eq!(declarations, declarations_after);

    // Registrations are untouched; only installs run
    assert!(ws
        .manager
        .operations()
        .iter()
        .all(|op| matches!(op, ManagerOperation::Install(_))));
}

#[test]
fn peg_preflight_reports_every_dirty_package() {
    let ws = TestWorkspace::new();
    let mut workspace = ws.open_editable();
    fs::write(ws.dir("base").join("conanfile.py"), "dirty\n").unwrap();
    fs::write(ws.dir("app").join("conanfile.py"), "dirty\n").unwrap();
    let heads: Vec<String> = ["base", "lib", "app"].iter().map(|n| ws.head(n)).collect();

    let err = workspace.peg(None).unwrap_err();

    match err {
        WorkspaceError::DirtyWorkspace { packages } => {
            assert_eq!(packages, vec!["base", "app"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    let heads_after: Vec<String> = ["base", "lib", "app"].iter().map(|n| ws.head(n)).collect();
    assert_eq!(heads, heads_after);
    assert!(ws.manager.operations().is_empty());
}

#[test]
fn peg_with_message_commits_dirty_packages() {
    let ws = TestWorkspace::new();
    let mut workspace = ws.open_editable();
    fs::write(ws.dir("base").join("conanfile.py"), "class Base2:\n    pass\n").unwrap();

    let report = workspace.peg(Some("Rework base")).unwrap();

    assert!(report.get("base").unwrap().committed);
    assert_eq!(ws.last_message("base"), "Rework base");
    assert_eq!(ws.last_message("lib"), "Rework base");
    assert_eq!(
        run_git(&ws.dir("base"), &["status", "--porcelain", "--untracked-files=no"]),
        ""
    );
}

#[test]
fn peg_rejects_checkout_without_locked_revision() {
    let ws = TestWorkspace::new();
    let mut workspace = ws.open_editable();
    let lib = ws.dir("lib");
    run_git(&lib, &["checkout", "--quiet", "--orphan", "rewrite"]);
    run_git(&lib, &["commit", "--quiet", "-m", "Rewritten history"]);
    fs::write(ws.dir("app").join("conanfile.py"), "dirty\n").unwrap();

    let err = workspace.peg(None).unwrap_err();

    // One error names every violation
    match &err {
        WorkspaceError::InvalidRevision { packages, dirty } => {
            assert_eq!(packages, &vec!["lib"]);
            assert_eq!(dirty, &vec!["app"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("uncommitted changes in app"));
    assert!(ws.manager.operations().is_empty());
}

#[test]
fn peg_with_message_reports_only_revision_problems() {
    let ws = TestWorkspace::new();
    let mut workspace = ws.open_editable();
    let lib = ws.dir("lib");
    run_git(&lib, &["checkout", "--quiet", "--orphan", "rewrite"]);
    run_git(&lib, &["commit", "--quiet", "-m", "Rewritten history"]);
    fs::write(ws.dir("app").join("conanfile.py"), "dirty\n").unwrap();

    let err = workspace.peg(Some("Bump")).unwrap_err();

    match err {
        WorkspaceError::InvalidRevision { packages, dirty } => {
            assert_eq!(packages, vec!["lib"]);
            assert!(dirty.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_ne!(
        run_git(&ws.dir("app"), &["status", "--porcelain", "--untracked-files=no"]),
        ""
    );
    assert!(ws.manager.operations().is_empty());
}

#[test]
fn peg_skips_packages_that_are_not_editable() {
    let ws = TestWorkspace::new();
    let mut workspace = ws.open_editable();
    workspace.close(&["lib".to_string()]).unwrap();
    ws.manager.clear_operations();
    let lib_declaration = ws.declaration("lib");
    commit_file(&ws.dir("base"), "base.cpp", "int x;\n", "Work on base");

    let report = workspace.peg(None).unwrap();

    assert_eq!(report.names().collect::<Vec<_>>(), vec!["base", "app"]);
    assert_eq!(ws.declaration("lib"), lib_declaration);
    assert!(report.get("base").unwrap().rewritten.is_empty());
    assert_eq!(ws.manager.installs(), vec![ws.dir("base"), ws.dir("app")]);
}

#[test]
fn peg_failure_leaves_earlier_work_in_place() {
    let ws = TestWorkspace::new();
    let mut workspace = ws.open_editable();
    fs::write(ws.dir("base").join("conanfile.py"), "class Base2:\n    pass\n").unwrap();
    let base_before = ws.head("base");
    ws.manager.fail_on(FailOn::Install);

    let err = workspace.peg(Some("Rework base")).unwrap_err();

    assert!(matches!(err, WorkspaceError::PackageManager(_)));
    assert_ne!(ws.head("base"), base_before);
    assert_eq!(ws.manager.installs().len(), 1);
}

#[test]
fn download_clones_and_edits() {
    let ws = TestWorkspace::new();
    let remotes = tempfile::TempDir::new().unwrap();
    run_git(
        remotes.path(),
        &["clone", "--quiet", "--bare", &ws.dir("base").to_string_lossy(), "base.git"],
    );
    // Move base ahead on the remote so the checkout must be explicit
    let upstream = ws.dir("base");
    commit_file(&upstream, "later.txt", "l", "Later");
    run_git(&upstream, &["push", "--quiet", &remotes.path().join("base.git").to_string_lossy(), "main"]);
    fs::remove_dir_all(ws.dir("base")).unwrap();

    let file = pegboard::core::config::WorkspaceFile {
        git_prefix: Some(format!("{}/", remotes.path().display())),
        git_suffix: Some(".git".to_string()),
        ..Default::default()
    };
    let config = pegboard::core::config::WorkspaceConfig::resolve(
        ws.path(),
        file,
        Some("app"),
        ws.manager.registry_path().to_path_buf(),
    )
    .unwrap();
    let workspace = pegboard::workspace::Workspace::open(config, ws.manager.clone()).unwrap();

    assert!(workspace.download("base").unwrap());

    let locked = workspace.package("base").unwrap().locked_reference().clone();
    assert_eq!(ws.head("base"), locked.revision());
    assert!(workspace.package("base").unwrap().is_editable().unwrap());
    assert!(!workspace.download("base").unwrap());
}
