fn main() {
    println!("cargo:rerun-if-changed=proto/grid.proto");
    tonic_prost_build::configure()
        .compile_protos(&["proto/grid.proto"], &["proto/"])
        .expect("Failed to compile proto/grid.proto");
}
