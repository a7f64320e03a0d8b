#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    // RUST_LOG controls verbosity, e.g. RUST_LOG=croquis_editor=debug
    env_logger::init();

    // File dialogs and library writes are spawned onto this runtime
    croquis_editor::run_app()
}

#[cfg(target_arch = "wasm32")]
fn main() {}
