use std::env;
use std::fs;
use std::path::Path;

/// Render README.md into `OUT_DIR` as the crate-level rustdoc.
///
/// Links written for GitHub (`src/sink.rs`) are rewritten to the module
/// names rustdoc resolves (`sink`).
fn main() {
    println!("cargo:rerun-if-changed=README.md");

    let crate_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let readme = fs::read_to_string(Path::new(&crate_dir).join("README.md")).unwrap_or_default();
    let rustdoc = readme.replace("](src/", "](").replace(".rs)", ")");

    let out_dir = env::var("OUT_DIR").expect("cargo sets OUT_DIR for build scripts");
    fs::write(Path::new(&out_dir).join("README_GENERATED.md"), rustdoc)
        .expect("OUT_DIR is writable");
}
