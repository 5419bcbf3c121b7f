//! Build script that exports the resolved HTTP client version.

fn main() {
    println!("cargo:rerun-if-changed=Cargo.lock");

    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let lock_path = std::path::Path::new(&manifest_dir).join("Cargo.lock");

    let version = std::fs::read_to_string(lock_path)
        .ok()
        .and_then(|lock| locked_version(&lock, "reqwest"))
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=HTTP_CLIENT_VERSION={}", version);
}

/// Find the `version` line following `name = "<package>"` in a lockfile.
fn locked_version(lock: &str, package: &str) -> Option<String> {
    let name_line = format!("name = \"{}\"", package);
    let mut lines = lock.lines().map(str::trim);

    while let Some(line) = lines.next() {
        if line != name_line {
            continue;
        }
        let version = lines.next()?.strip_prefix("version = \"")?.strip_suffix('"')?;
        return Some(version.to_string());
    }

    None
}
