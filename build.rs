use std::process::Command;

// Embeds `git describe` output as PLANWORK_VERSION, falling back to the crate version
// when building outside a checkout (e.g. from a packaged tarball).
fn main() {
    let version = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_start_matches('v').to_string())
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").into());

    println!("cargo:rustc-env=PLANWORK_VERSION={version}");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
