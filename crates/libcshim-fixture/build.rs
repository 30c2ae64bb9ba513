use libcshim_harness::link_args::{LinkFlavor, link_args};

fn main() {
    // The shim comes in through the `libcshim-abi` rlib, so no archive path.
    for arg in link_args(LinkFlavor::Cc, None) {
        println!("cargo:rustc-link-arg-bin=shim-launcher={arg}");
    }
    println!("cargo:rerun-if-changed=build.rs");
}
