// build.rs
//
// Stamps the binary with its build date, shown by `lyclock --version` and
// logged at startup.

use chrono::Utc;
use std::{env, fs, path::PathBuf};

fn main() {
    let out_dir = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let stamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    fs::write(
        out_dir.join("build_info.rs"),
        format!("pub const BUILD_DATE: &str = \"{stamp}\";\n"),
    )
    .expect("write build_info.rs");

    println!("cargo:rerun-if-changed=build.rs");
}
