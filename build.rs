use std::env;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

/// Packagers building from a tarball can set this instead of relying on git.
const SHA_OVERRIDE: &str = "PLUME_BUILD_GIT_SHA";

fn git_stdout(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    println!("cargo:rerun-if-env-changed={SHA_OVERRIDE}");

    let git_sha = env::var(SHA_OVERRIDE)
        .ok()
        .filter(|sha| !sha.trim().is_empty())
        .or_else(|| git_stdout(&["rev-parse", "--short", "HEAD"]))
        .unwrap_or_else(|| "unknown".to_string());

    let build_ts = env::var("SOURCE_DATE_EPOCH").unwrap_or_else(|_| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default()
            .to_string()
    });

    println!("cargo:rustc-env=PLUME_GIT_SHA={git_sha}");
    println!("cargo:rustc-env=PLUME_BUILD_TS={build_ts}");
}
