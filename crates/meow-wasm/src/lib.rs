//! WebAssembly bindings for the Meowcoin block header library.
//!
//! This crate provides JavaScript-accessible APIs for:
//! - Decoding headers from hex, raw block data or plain objects
//! - Computing header ids with host-provided hash back ends
//! - Timestamp, difficulty and proof-of-work checks

use wasm_bindgen::prelude::*;

pub mod hashers;
pub mod header;
pub mod state;

// Re-export main types for JS access
pub use header::{Decoder, Header};

/// Initialize the WASM module with better panic messages.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
