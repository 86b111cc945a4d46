//! Retrieves information about the version of the crate from Git and the build
//! environment. This information is then written to a file in the output
//! directory and can be accessed at runtime by the shell.

use std::path::Path;
use std::{env, fs};

fn generate_file(filename: &str, contents: &str) {
    let out_dir = env::var_os("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join(filename);
    fs::write(dest_path, contents).unwrap();
}

/// Records whether hardware PEXT is compiled in: the attack table lookups fall
/// back to a software implementation otherwise.
fn generate_build_info() {
    // cfg!() would describe the host compiling this script, not the target.
    let bmi2 = env::var("CARGO_CFG_TARGET_FEATURE")
        .map(|features| features.split(',').any(|feature| feature == "bmi2"))
        .unwrap_or(false);
    let features = format!("{}bmi2", if bmi2 { "+" } else { "-" });
    generate_file("features", &features);
}

fn main() -> shadow_rs::SdResult<()> {
    generate_build_info();
    let _ = shadow_rs::ShadowBuilder::builder().build()?;
    Ok(())
}
