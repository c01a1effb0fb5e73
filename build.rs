use std::process::Command;

const SHA_VAR: &str = "ARRANGO_GIT_SHA";

/// Short revision from the environment, or from git when building a checkout
fn revision() -> Option<String> {
    let from_env = std::env::var(SHA_VAR)
        .ok()
        .map(|sha| sha.trim().to_string())
        .filter(|sha| !sha.is_empty());
    if from_env.is_some() {
        return from_env;
    }

    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())?;
    let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!sha.is_empty()).then_some(sha)
}

fn main() {
    println!("cargo:rerun-if-env-changed={}", SHA_VAR);
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");

    if let Some(sha) = revision() {
        println!("cargo:rustc-env={}={}", SHA_VAR, sha);
    }
}
