use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    let cargo_version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());

    // A VERSION file at the repo root, maintained by the release tooling, wins over Cargo.toml.
    let version_path = env::var("CARGO_MANIFEST_DIR")
        .ok()
        .map(PathBuf::from)
        .and_then(|dir| dir.parent().and_then(|p| p.parent()).map(|root| root.join("VERSION")));

    let file_version = version_path.as_ref().and_then(|path| {
        println!("cargo:rerun-if-changed={}", path.display());
        fs::read_to_string(path).ok()
    });

    let version = file_version
        .map(|v| v.trim().to_string())
        .filter(|v| v.chars().next().is_some_and(|c| c.is_ascii_digit()))
        .unwrap_or(cargo_version);

    println!("cargo:rustc-env=CIRCLEGEN_VERSION={version}");
}
