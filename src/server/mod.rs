pub mod antfarm_cli;
#[cfg(not(target_arch = "wasm32"))]
pub mod routes;
pub mod run_store;
