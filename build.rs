//! Stamps the lamco-input-replay banner (`BUILD_DATE`, `BUILD_TIME`, `GIT_HASH`)

use std::process::Command;

fn stamp(key: &str, program: &str, args: &[&str], fallback: &str) {
    let value = Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback.to_string());
    println!("cargo:rustc-env={}={}", key, value);
}

fn main() {
    stamp("BUILD_DATE", "date", &["+%Y-%m-%d"], "unknown");
    stamp("BUILD_TIME", "date", &["+%H:%M:%S"], "");
    stamp("GIT_HASH", "git", &["rev-parse", "--short", "HEAD"], "unknown");

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=build.rs");
}
