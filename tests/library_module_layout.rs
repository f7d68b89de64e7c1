use std::fs;
use std::path::Path;

#[test]
fn lib_root_exports_only_panel_modules() {
    let lib_rs = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/lib.rs");
    let source = fs::read_to_string(&lib_rs).expect("read src/lib.rs");

    for module in ["app", "config", "server", "shared"] {
        assert!(
            source.contains(&format!("pub mod {module};")),
            "src/lib.rs must export `{module}`"
        );
    }
    assert!(
        !source.contains("pub mod run_store;"),
        "run store must stay behind the server module"
    );
}
