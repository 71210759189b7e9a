use std::env;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    let commit = git_short_sha().unwrap_or_else(|| "unknown".to_string());

    let built = env::var("SOURCE_DATE_EPOCH").unwrap_or_else(|_| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            .to_string()
    });

    // Cargo exposes enabled features to build scripts as CARGO_FEATURE_*.
    let backend = if env::var_os("CARGO_FEATURE_LOCAL_INFERENCE").is_some() {
        "candle"
    } else {
        "none"
    };

    println!("cargo:rustc-env=APIKIT_GIT_SHA={commit}");
    println!("cargo:rustc-env=APIKIT_BUILD_TS={built}");
    println!("cargo:rustc-env=APIKIT_BACKEND={backend}");
}

fn git_short_sha() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let sha = String::from_utf8(output.stdout).ok()?;
    let sha = sha.trim();
    (!sha.is_empty()).then(|| sha.to_string())
}
