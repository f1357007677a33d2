use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const MANIFEST_NAME: &str = "bundle-server-launcher.properties";

/// Bakes the launcher manifest into the binary.
///
/// A missing manifest is not a build error: the generated constant is `None`
/// and the launcher reports a corrupt bundle at runtime.
fn embed_manifest(out_dir: &Path) {
    println!("cargo:rerun-if-env-changed=BUNDLE_LAUNCHER_MANIFEST");

    let source = env::var_os("BUNDLE_LAUNCHER_MANIFEST")
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new("resources").join(MANIFEST_NAME));
    println!("cargo:rerun-if-changed={}", source.display());

    let generated = match fs::read_to_string(&source) {
        Ok(contents) => {
            let copy = out_dir.join(MANIFEST_NAME);
            if let Err(error) = fs::write(&copy, contents) {
                panic!("failed to copy launcher manifest into OUT_DIR: {error}");
            }
            format!(
                "pub const EMBEDDED_MANIFEST: Option<&str> = Some(include_str!({:?}));\n",
                copy.display().to_string()
            )
        }
        Err(_) => "pub const EMBEDDED_MANIFEST: Option<&str> = None;\n".to_string(),
    };

    if let Err(error) = fs::write(out_dir.join("embedded_manifest.rs"), generated) {
        panic!("failed to write embedded manifest module: {error}");
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let Some(out_dir) = env::var_os("OUT_DIR") else {
        panic!("OUT_DIR is not set");
    };
    embed_manifest(Path::new(&out_dir));
}
