//! Generates the binding sets for the bundled native contracts.
//!
//! `int_vector_bindings.rs` backs the `IntVector` container and names the
//! runtime as `crate`; `arith_bindings.rs` is included by the integration
//! tests, which see the runtime as `::tether_runtime`.
use std::env;
use std::path::PathBuf;
use tether_build::BindingsBuilder;

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR"));
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR"));
    let native = manifest_dir.join("native");

    generate(
        BindingsBuilder::new(out_dir.join("int_vector_bindings.rs"))
            .source(native.join("int_vector.hpp"))
            .runtime_path("crate")
            .struct_name("IntVectorBindings"),
    );

    generate(
        BindingsBuilder::new(out_dir.join("arith_bindings.rs"))
            .source(native.join("fixtures").join("add.h"))
            .source(native.join("fixtures").join("sub.h"))
            .runtime_path("::tether_runtime")
            .struct_name("Arithmetic"),
    );
}

fn generate(builder: BindingsBuilder) {
    for path in builder.source_paths() {
        println!("cargo:rerun-if-changed={}", path.display());
    }

    let report = builder
        .generate()
        .unwrap_or_else(|e| panic!("generating {}: {}", builder.output().display(), e));
    for diagnostic in &report.diagnostics {
        println!("cargo:warning={}", diagnostic);
    }
}
