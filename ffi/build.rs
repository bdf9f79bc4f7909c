use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src");

    let crate_dir = env::var("CARGO_MANIFEST_DIR").map(PathBuf::from).unwrap_or_default();
    let include_dir = crate_dir.join("include");
    if let Err(e) = std::fs::create_dir_all(&include_dir) {
        println!("cargo:warning=could not create {}: {e}", include_dir.display());
        return;
    }
    let header = include_dir.join("deepviz.h");

    let generated = cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("DEEPVIZ_H")
        .with_documentation(true)
        .generate();

    match generated {
        Ok(bindings) => {
            bindings.write_to_file(header);
        }
        Err(e) => println!("cargo:warning=could not generate deepviz.h: {e}"),
    }
}
