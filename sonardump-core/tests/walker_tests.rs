// Tests for the component tree walker

mod common;

use common::{FakeClient, dir, file};
use sonardump_client::{Qualifier, TreeNode};
use sonardump_core::CrawlOptions;
use sonardump_core::walker::TreeWalker;
use std::sync::Arc;
use tempfile::TempDir;

fn walker_for(client: FakeClient, root: &std::path::Path) -> TreeWalker {
    TreeWalker::new(Arc::new(client), root, &CrawlOptions::default())
}

fn count_dirs(root: &std::path::Path) -> usize {
    std::fs::read_dir(root)
        .unwrap()
        .filter(|e| e.as_ref().unwrap().file_type().unwrap().is_dir())
        .count()
}

// ============================================================================
// Classification
// ============================================================================

#[tokio::test]
async fn test_directory_with_two_files() {
    let temp = TempDir::new().unwrap();
    let client = FakeClient::new().with_children(
        "p:src",
        vec![file("p:src/a.rs", "a.rs"), file("p:src/b.rs", "b.rs")],
    );

    let walker = walker_for(client, temp.path());
    let report = walker
        .walk(temp.path(), vec![dir("p:src", "src", "src")])
        .await;

    assert_eq!(report.tasks.len(), 2);
    assert_eq!(report.directories, vec![temp.path().join("src")]);
    assert_eq!(count_dirs(temp.path()), 1);
    assert!(temp.path().join("src").is_dir());
    assert!(report.tasks.iter().all(|t| t.local_dir == temp.path().join("src")));
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn test_unrecognized_qualifier_is_skipped() {
    let temp = TempDir::new().unwrap();
    let walker = walker_for(FakeClient::new(), temp.path());

    let node = TreeNode::new("p:lib", "lib", "lib", Qualifier::Other("LIB".to_string()));
    let report = walker.walk(temp.path(), vec![node]).await;

    assert!(report.tasks.is_empty());
    assert_eq!(report.unrecognized.len(), 1);
    assert!(report.unrecognized[0].contains("LIB"));
    assert!(report.errors.is_empty());
    assert_eq!(count_dirs(temp.path()), 0);
}

#[tokio::test]
async fn test_branch_and_test_file_qualifiers() {
    let temp = TempDir::new().unwrap();
    let client = FakeClient::new().with_children(
        "p:feature",
        vec![TreeNode::new("p:feature/t.rs", "t.rs", "", Qualifier::TestFile)],
    );
    let walker = walker_for(client, temp.path());

    let branch = TreeNode::new("p:feature", "feature", "", Qualifier::Branch);
    let report = walker.walk(temp.path(), vec![branch]).await;

    assert_eq!(report.tasks.len(), 1);
    assert_eq!(report.tasks[0].destination(), temp.path().join("feature").join("t.rs"));
}

// ============================================================================
// Recursion and paths
// ============================================================================

#[tokio::test]
async fn test_nested_containers_resolve_below_project_root() {
    let temp = TempDir::new().unwrap();
    let client = FakeClient::new()
        .with_children("p:src", vec![dir("p:src/main", "main", "src/main")])
        .with_children("p:src/main", vec![file("p:src/main/lib.rs", "lib.rs")]);
    let walker = walker_for(client, temp.path());

    let report = walker
        .walk(temp.path(), vec![dir("p:src", "src", "src")])
        .await;

    assert_eq!(
        report.directories,
        vec![temp.path().join("src"), temp.path().join("src").join("main")]
    );
    assert_eq!(
        report.tasks[0].destination(),
        temp.path().join("src").join("main").join("lib.rs")
    );
}

#[tokio::test]
async fn test_module_paths_resolve_below_their_branch() {
    let temp = TempDir::new().unwrap();
    let client = FakeClient::new()
        .with_children("p:a", vec![dir("p:a:src", "src", "src")])
        .with_children("p:b", vec![dir("p:b:src", "src", "src")])
        .with_children("p:a:src", vec![file("p:a:src/Main.java", "Main.java")])
        .with_children("p:b:src", vec![file("p:b:src/Main.java", "Main.java")]);
    let walker = walker_for(client, temp.path());

    let report = walker
        .walk(
            temp.path(),
            vec![
                TreeNode::new("p:a", "a", "a", Qualifier::Branch),
                TreeNode::new("p:b", "b", "b", Qualifier::Branch),
            ],
        )
        .await;

    let destinations: Vec<_> = report.tasks.iter().map(|t| t.destination()).collect();
    assert_eq!(
        destinations,
        vec![
            temp.path().join("a").join("src").join("Main.java"),
            temp.path().join("b").join("src").join("Main.java"),
        ]
    );
    assert_ne!(destinations[0], destinations[1]);
}

#[tokio::test]
async fn test_hostile_paths_stay_inside_root() {
    let temp = TempDir::new().unwrap();
    let client = FakeClient::new()
        .with_children("p:evil", vec![file("p:evil/x", "../../x:y")]);
    let walker = walker_for(client, temp.path());

    let report = walker
        .walk(temp.path(), vec![dir("p:evil", "evil", "../../etc:d")])
        .await;

    let expected_dir = temp.path().join("etc_d");
    assert_eq!(report.directories, vec![expected_dir.clone()]);
    assert_eq!(report.tasks[0].destination(), expected_dir.join("x_y"));
}

#[tokio::test]
async fn test_children_are_paginated() {
    let temp = TempDir::new().unwrap();
    let children: Vec<_> = (0..7)
        .map(|i| file(&format!("p:src/{}", i), &format!("{}.txt", i)))
        .collect();
    let client = Arc::new(FakeClient::new().with_children("p:src", children));
    let options = CrawlOptions {
        page_size: 3,
        ..CrawlOptions::default()
    };
    let walker = TreeWalker::new(client.clone(), temp.path(), &options);

    let report = walker
        .walk(temp.path(), vec![dir("p:src", "src", "src")])
        .await;

    assert_eq!(report.tasks.len(), 7);
    let listings: Vec<_> = client
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("tree:"))
        .collect();
    assert_eq!(listings, vec!["tree:p:src:1", "tree:p:src:2", "tree:p:src:3"]);
}

// ============================================================================
// Partial failure
// ============================================================================

#[tokio::test]
async fn test_listing_failure_skips_only_that_subtree() {
    let temp = TempDir::new().unwrap();
    let client = FakeClient::new()
        .with_failing_listing("p:broken")
        .with_children("p:ok", vec![file("p:ok/f", "f")]);
    let walker = walker_for(client, temp.path());

    let report = walker
        .walk(
            temp.path(),
            vec![
                dir("p:broken", "broken", "broken"),
                dir("p:ok", "ok", "ok"),
                file("p:top", "top"),
            ],
        )
        .await;

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("p:broken"));
    assert_eq!(report.tasks.len(), 2);
}

#[tokio::test]
async fn test_directory_creation_failure_skips_subtree() {
    let temp = TempDir::new().unwrap();
    // A plain file where the directory should go
    std::fs::write(temp.path().join("blocked"), b"").unwrap();

    let client = FakeClient::new()
        .with_children("p:blocked", vec![file("p:blocked/f", "f")]);
    let walker = walker_for(client, temp.path());

    let report = walker
        .walk(temp.path(), vec![dir("p:blocked", "blocked", "blocked")])
        .await;

    assert!(report.tasks.is_empty());
    assert_eq!(report.errors.len(), 1);
    assert!(report.directories.is_empty());
}
