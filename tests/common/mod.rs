#![allow(dead_code)]

use std::path::Path;

use git2::{Oid, Repository, Signature};
use tempfile::TempDir;

/// Commit an empty tree change on HEAD with a fixed identity
pub fn commit(repo: &Repository, message: &str) -> Oid {
    let sig = Signature::now("Test User", "test@example.com").expect("signature");
    let tree_id = {
        let mut index = repo.index().expect("index");
        index.write_tree().expect("write tree")
    };
    let tree = repo.find_tree(tree_id).expect("tree");
    let parents = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().expect("head commit")],
        Err(_) => Vec::new(),
    };
    let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
        .expect("commit")
}

/// A working repository with one commit
pub fn repo_with_commit() -> (TempDir, Repository) {
    let dir = TempDir::new().expect("create temp dir");
    let repo = Repository::init(dir.path()).expect("init repository");
    commit(&repo, "Initial commit");
    (dir, repo)
}

/// A bare repository registered as `origin` of `repo`
pub fn add_bare_origin(repo: &Repository) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    Repository::init_bare(dir.path()).expect("init bare repository");
    repo.remote("origin", path_str(dir.path()))
        .expect("add origin");
    dir
}

pub fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

pub fn remote_tag_commit(bare: &Path, tag: &str) -> Option<Oid> {
    let repo = Repository::open_bare(bare).ok()?;
    let reference = repo.find_reference(&format!("refs/tags/{}", tag)).ok()?;
    reference.peel_to_commit().ok().map(|c| c.id())
}
