//! Hash back ends supplied by the JavaScript host.
//!
//! The host installs `globalThis.meowHashes` with:
//! - `x16r(bytes: Uint8Array): Uint8Array`
//! - `x16rv2(bytes: Uint8Array): Uint8Array`
//! - `kawpowLightVerify(headerHash, mixHash, nonce, boundary): string`
//!
//! Any of them may be absent; calling a missing one surfaces as a back-end
//! error for that algorithm.

use meow_core::{BackendError, HashBackends, HeaderHasher, KawpowVerifier};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = meowHashes, js_name = x16r, catch)]
    fn host_x16r(data: &[u8]) -> Result<Vec<u8>, JsValue>;

    #[wasm_bindgen(js_namespace = meowHashes, js_name = x16rv2, catch)]
    fn host_x16rv2(data: &[u8]) -> Result<Vec<u8>, JsValue>;

    #[wasm_bindgen(js_namespace = meowHashes, js_name = kawpowLightVerify, catch)]
    fn host_kawpow_light_verify(
        header_hash: &str,
        mix_hash: &str,
        nonce: &str,
        boundary: &str,
    ) -> Result<String, JsValue>;
}

/// X16R from the host.
pub struct HostX16r;

/// X16Rv2 from the host.
pub struct HostX16rv2;

/// KawPoW light verifier from the host.
pub struct HostKawpow;

impl HeaderHasher for HostX16r {
    fn digest(&self, data: &[u8]) -> Result<[u8; 32], BackendError> {
        to_digest(host_x16r(data))
    }
}

impl HeaderHasher for HostX16rv2 {
    fn digest(&self, data: &[u8]) -> Result<[u8; 32], BackendError> {
        to_digest(host_x16rv2(data))
    }
}

impl KawpowVerifier for HostKawpow {
    fn light_verify(
        &self,
        header_hash: &str,
        mix_hash: &str,
        nonce: &str,
        boundary: &str,
    ) -> Result<String, BackendError> {
        host_kawpow_light_verify(header_hash, mix_hash, nonce, boundary).map_err(js_error)
    }
}

/// Table with all three host back ends.
pub fn host_backends() -> HashBackends {
    HashBackends::new()
        .with_x16r(HostX16r)
        .with_x16rv2(HostX16rv2)
        .with_kawpow(HostKawpow)
}

fn to_digest(result: Result<Vec<u8>, JsValue>) -> Result<[u8; 32], BackendError> {
    let bytes = result.map_err(js_error)?;
    <[u8; 32]>::try_from(bytes.as_slice())
        .map_err(|_| BackendError::new(format!("host digest is {} bytes, expected 32", bytes.len())))
}

fn js_error(value: JsValue) -> BackendError {
    BackendError::new(
        value
            .as_string()
            .unwrap_or_else(|| format!("{:?}", value)),
    )
}
