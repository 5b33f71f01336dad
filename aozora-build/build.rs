//! Embeds the tool's own revision for the startup log line

use std::path::Path;
use std::process::Command;

/// Trimmed stdout of a successful git invocation
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    Some(text.trim().to_string())
}

fn revision() -> String {
    let Some(commit) = git(&["rev-parse", "--short=8", "HEAD"]) else {
        return "unknown".to_string();
    };
    match git(&["status", "--porcelain", "--untracked-files=no"]) {
        Some(changes) if !changes.is_empty() => format!("{}-dirty", commit),
        _ => commit,
    }
}

fn main() {
    let built_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=AOZORA_BUILD_REVISION={}", revision());
    println!("cargo:rustc-env=AOZORA_BUILD_TIME={}", built_at);
    println!("cargo:rustc-env=AOZORA_BUILD_PROFILE={}", profile);

    // Re-run when HEAD moves; without a checkout Cargo falls back to re-running on every build
    let head = Path::new("../.git/HEAD");
    if head.exists() {
        println!("cargo:rerun-if-changed={}", head.display());
        println!("cargo:rerun-if-changed=build.rs");
    }
}
