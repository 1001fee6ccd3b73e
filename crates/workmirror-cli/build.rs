//! Stamps the binary with `<crate version> (<commit>)`.
//!
//! Packagers building outside a checkout can set `WORKMIRROR_BUILD_COMMIT`.

use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
    println!("cargo:rerun-if-env-changed=WORKMIRROR_BUILD_COMMIT");

    let commit = std::env::var("WORKMIRROR_BUILD_COMMIT")
        .ok()
        .filter(|c| !c.trim().is_empty())
        .or_else(head_commit);

    let version = match commit {
        Some(commit) => format!("{} ({})", env!("CARGO_PKG_VERSION"), commit.trim()),
        None => env!("CARGO_PKG_VERSION").to_string(),
    };
    println!("cargo:rustc-env=WORKMIRROR_VERSION={}", version);
}

/// Short hash of HEAD, suffixed `-dirty` when the tree has local edits.
fn head_commit() -> Option<String> {
    let hash = git(&["rev-parse", "--short=10", "HEAD"])?;
    let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
        .is_some();

    Some(if dirty { format!("{}-dirty", hash) } else { hash })
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
