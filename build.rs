//! Build script to track include_str! dependencies.
//! This ensures cargo rebuilds when the embedded front-end changes.

fn main() {
    println!("cargo:rerun-if-changed=resources/dashboard.html");
}
