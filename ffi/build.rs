use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");

    let (Ok(crate_dir), Ok(out_dir)) = (env::var("CARGO_MANIFEST_DIR"), env::var("OUT_DIR")) else {
        return;
    };
    let header = PathBuf::from(out_dir).join("miaujuda.h");

    match cbindgen::Builder::new()
        .with_crate(crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("MIAUJUDA_H")
        .with_cpp_compat(true)
        .with_documentation(true)
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(&header);
        }
        // A header failure must not break the library build itself.
        Err(e) => println!("cargo:warning=cbindgen could not generate miaujuda.h: {e}"),
    }
}
