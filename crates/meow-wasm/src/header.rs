//! JavaScript-facing block header API.

use std::sync::Arc;

use meow_core::{BlockHeader, ChainContext, HeaderError, HeaderFields, KawpowCheck, Network};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::hashers::host_backends;
use crate::state::ValidationReport;

/// Decodes headers for one network with the host's hash back ends.
#[wasm_bindgen]
pub struct Decoder {
    context: Arc<ChainContext>,
}

#[wasm_bindgen]
impl Decoder {
    /// Create a decoder.
    ///
    /// # Arguments
    /// * `network` - "mainnet" or "testnet"
    /// * `kawpow_check` - "unresolved" (default) or "verifierHash"
    #[wasm_bindgen(constructor)]
    pub fn new(network: &str, kawpow_check: Option<String>) -> Result<Decoder, JsValue> {
        let net = Network::from_str(network)
            .ok_or_else(|| JsValue::from_str("Invalid network"))?;

        let check = match kawpow_check.as_deref() {
            None | Some("unresolved") => KawpowCheck::Unresolved,
            Some("verifierHash") => KawpowCheck::VerifierHash,
            Some(other) => {
                return Err(JsValue::from_str(&format!("Invalid KawPoW check: {}", other)))
            }
        };

        let context = ChainContext::new(net)
            .with_hashers(host_backends())
            .with_kawpow_check(check)
            .shared();

        Ok(Decoder { context })
    }

    /// Parse a header from hex-encoded header bytes.
    #[wasm_bindgen(js_name = fromHex)]
    pub fn from_hex(&self, hex: &str) -> Result<Header, JsValue> {
        BlockHeader::from_hex(hex, &self.context)
            .map(Header::from)
            .map_err(to_js_error)
    }

    /// Parse the header out of hex-encoded full-block data.
    #[wasm_bindgen(js_name = fromRawBlock)]
    pub fn from_raw_block(&self, hex: &str) -> Result<Header, JsValue> {
        let bytes = hex::decode(hex.trim())
            .map_err(|_| JsValue::from_str("Invalid block hex"))?;
        BlockHeader::from_full_block_bytes(&bytes, &self.context)
            .map(Header::from)
            .map_err(to_js_error)
    }

    /// Build a header from a plain object (`prevHash`, `merkleRoot`, ...).
    #[wasm_bindgen(js_name = fromObject)]
    pub fn from_object(&self, obj: JsValue) -> Result<Header, JsValue> {
        let fields: HeaderFields = serde_wasm_bindgen::from_value(obj)
            .map_err(|e| JsValue::from_str(&format!("Invalid header object: {}", e)))?;
        BlockHeader::from_fields(&fields, &self.context)
            .map(Header::from)
            .map_err(to_js_error)
    }

    /// Consensus parameters in use (genesis bits and activation times).
    #[wasm_bindgen]
    pub fn params(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.context.params)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {:?}", e)))
    }
}

/// A decoded block header.
#[wasm_bindgen]
pub struct Header {
    inner: BlockHeader,
}

impl From<BlockHeader> for Header {
    fn from(inner: BlockHeader) -> Self {
        Header { inner }
    }
}

#[wasm_bindgen]
impl Header {
    /// The header identifier (display hex).
    #[wasm_bindgen]
    pub fn id(&self) -> Result<String, JsValue> {
        self.inner.id().map(str::to_string).map_err(to_js_error)
    }

    #[wasm_bindgen(getter)]
    pub fn version(&self) -> i32 {
        self.inner.version()
    }

    #[wasm_bindgen(getter)]
    pub fn time(&self) -> u32 {
        self.inner.time()
    }

    #[wasm_bindgen(getter)]
    pub fn bits(&self) -> u32 {
        self.inner.bits()
    }

    /// Block height (KawPoW headers only).
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> Option<u32> {
        self.inner.height()
    }

    /// Proof-of-work algorithm for this header.
    #[wasm_bindgen(getter)]
    pub fn algorithm(&self) -> String {
        self.inner.epoch().name().to_string()
    }

    /// Serialize to hex.
    #[wasm_bindgen(js_name = toHex)]
    pub fn to_hex(&self) -> String {
        self.inner.to_hex()
    }

    /// Plain object form, including the hash. `nonce` is a `BigInt`.
    #[wasm_bindgen(js_name = toObject)]
    pub fn to_object(&self) -> Result<JsValue, JsValue> {
        let fields = self.inner.to_fields().map_err(to_js_error)?;
        to_js_with_bigints(&fields)
    }

    /// Difficulty relative to the genesis block.
    #[wasm_bindgen]
    pub fn difficulty(&self) -> Result<f64, JsValue> {
        self.inner.difficulty().map_err(to_js_error)
    }

    /// Whether the timestamp is at most two hours ahead of the host clock.
    #[wasm_bindgen(js_name = validTimestamp)]
    pub fn valid_timestamp(&self) -> bool {
        self.inner.valid_timestamp(host_now())
    }

    /// Whether the proof of work meets the target.
    #[wasm_bindgen(js_name = validProofOfWork)]
    pub fn valid_proof_of_work(&self) -> Result<bool, JsValue> {
        self.inner.valid_proof_of_work().map_err(to_js_error)
    }

    /// Run all checks and return a summary object.
    #[wasm_bindgen]
    pub fn report(&self) -> Result<JsValue, JsValue> {
        ValidationReport::build(&self.inner, host_now()).to_js()
    }

    /// Short description for the console.
    #[wasm_bindgen]
    pub fn inspect(&self) -> String {
        match self.inner.id() {
            Ok(id) => format!("<BlockHeader {}>", id),
            Err(_) => format!("<BlockHeader time={}>", self.inner.time()),
        }
    }
}

/// Current host time in Unix seconds.
fn host_now() -> u32 {
    (js_sys::Date::now() / 1000.0) as u32
}

/// KawPoW nonces use all 64 bits, past `Number.MAX_SAFE_INTEGER`.
fn to_js_with_bigints<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let serializer =
        serde_wasm_bindgen::Serializer::new().serialize_large_number_types_as_bigints(true);
    value
        .serialize(&serializer)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {:?}", e)))
}

fn to_js_error(e: HeaderError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use js_sys::{Function, Object, Reflect, JSON};
    use wasm_bindgen_test::*;

    const LEGACY_HEX: &str = concat!(
        "01000000",
        "0000000000000000000000000000000000000000000000000000000000000000",
        "0000000000000000000000000000000000000000000000000000000000000000",
        "002f6859ffff001d00000000",
    );

    // Same fields, timestamp 1580000000 (X16Rv2 on mainnet)
    const X16RV2_HEX: &str = concat!(
        "01000000",
        "0000000000000000000000000000000000000000000000000000000000000000",
        "0000000000000000000000000000000000000000000000000000000000000000",
        "00e32c5effff001d00000000",
    );

    // Timestamp 1600000000, height 1000000, nonce u64::MAX
    const KAWPOW_HEX: &str = concat!(
        "00000030",
        "0000000000000000000000000000000000000000000000000000000000000000",
        "0000000000000000000000000000000000000000000000000000000000000000",
        "00105e5fffff001d",
        "40420f00",
        "ffffffffffffffff",
        "5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a",
    );

    /// Install `globalThis.meowHashes`: every digest is 0xa1 repeated and
    /// the KawPoW verifier always returns the zero hash.
    fn install_hashes(with_x16rv2: bool) {
        let hashes = Object::new();
        let digest = Function::new_with_args("data", "return new Uint8Array(32).fill(0xa1);");
        let verify = Function::new_with_args(
            "headerHash, mixHash, nonce, boundary",
            "return '00'.repeat(32);",
        );

        Reflect::set(&hashes, &"x16r".into(), &digest).unwrap();
        if with_x16rv2 {
            Reflect::set(&hashes, &"x16rv2".into(), &digest).unwrap();
        }
        Reflect::set(&hashes, &"kawpowLightVerify".into(), &verify).unwrap();
        Reflect::set(&js_sys::global(), &"meowHashes".into(), &hashes).unwrap();
    }

    #[wasm_bindgen_test]
    fn decodes_and_reencodes_hex() {
        let decoder = Decoder::new("mainnet", None).unwrap();
        let header = decoder.from_hex(LEGACY_HEX).unwrap();

        assert_eq!(header.version(), 1);
        assert_eq!(header.bits(), 0x1d00ffff);
        assert_eq!(header.height(), None);
        assert_eq!(header.algorithm(), "X16R");
        assert_eq!(header.to_hex(), LEGACY_HEX);
        assert_eq!(header.difficulty().unwrap(), 1.0);
    }

    #[wasm_bindgen_test]
    fn raw_block_skips_prefix() {
        let decoder = Decoder::new("testnet", Some("verifierHash".to_string())).unwrap();
        let raw = format!("ffffffffffffffff{}00", LEGACY_HEX);
        let header = decoder.from_raw_block(&raw).unwrap();

        assert_eq!(header.to_hex(), LEGACY_HEX);
    }

    #[wasm_bindgen_test]
    fn rejects_short_input() {
        let decoder = Decoder::new("mainnet", None).unwrap();
        assert!(decoder.from_hex(&LEGACY_HEX[..158]).is_err());
        assert!(Decoder::new("mainnet", Some("lenient".to_string())).is_err());
    }

    #[wasm_bindgen_test]
    fn legacy_object_round_trip() {
        install_hashes(true);
        let decoder = Decoder::new("mainnet", None).unwrap();
        let header = decoder.from_hex(LEGACY_HEX).unwrap();

        assert_eq!(header.id().unwrap(), "a1".repeat(32));
        assert!(!header.valid_proof_of_work().unwrap());

        let obj = header.to_object().unwrap();
        let prev_hash = Reflect::get(&obj, &"prevHash".into()).unwrap();
        assert_eq!(prev_hash.as_string().unwrap(), "00".repeat(32));

        let rebuilt = decoder.from_object(obj).unwrap();
        assert_eq!(rebuilt.to_hex(), LEGACY_HEX);
    }

    #[wasm_bindgen_test]
    fn kawpow_object_keeps_full_nonce() {
        install_hashes(true);
        let decoder = Decoder::new("mainnet", Some("verifierHash".to_string())).unwrap();
        let header = decoder.from_hex(KAWPOW_HEX).unwrap();

        assert_eq!(header.algorithm(), "KawPoW");
        assert_eq!(header.height(), Some(1_000_000));
        assert_eq!(header.id().unwrap(), "00".repeat(32));
        assert!(header.valid_proof_of_work().unwrap());

        let obj = header.to_object().unwrap();
        let nonce = Reflect::get(&obj, &"nonce".into()).unwrap();
        assert!(nonce.is_bigint());
        assert_eq!(u64::try_from(nonce).unwrap(), u64::MAX);

        let rebuilt = decoder.from_object(obj).unwrap();
        assert_eq!(rebuilt.to_hex(), KAWPOW_HEX);
    }

    #[wasm_bindgen_test]
    fn object_with_number_nonce_and_snake_case_mix_hash() {
        install_hashes(true);
        let decoder = Decoder::new("mainnet", None).unwrap();
        let obj = JSON::parse(&format!(
            concat!(
                "{{\"version\":805306368,\"prevHash\":\"{zero}\",\"merkleRoot\":\"{zero}\",",
                "\"time\":1600000000,\"bits\":486604799,\"height\":1000000,",
                "\"nonce\":42,\"mix_hash\":\"{mix}\"}}"
            ),
            zero = "00".repeat(32),
            mix = "5a".repeat(32),
        ))
        .unwrap();

        let header = decoder.from_object(obj).unwrap();
        assert_eq!(header.height(), Some(1_000_000));
        assert!(header
            .to_hex()
            .ends_with(&format!("2a00000000000000{}", "5a".repeat(32))));
    }

    #[wasm_bindgen_test]
    fn report_lists_missing_backend() {
        install_hashes(false);
        let decoder = Decoder::new("mainnet", None).unwrap();
        let header = decoder.from_hex(X16RV2_HEX).unwrap();

        assert_eq!(header.algorithm(), "X16Rv2");
        assert!(header.id().is_err());

        let report: ValidationReport =
            serde_wasm_bindgen::from_value(header.report().unwrap()).unwrap();
        assert_eq!(report.algorithm, "X16Rv2");
        assert_eq!(report.size, 80);
        assert_eq!(report.id, None);
        assert_eq!(report.valid_proof_of_work, None);
        assert_eq!(report.difficulty, Some(1.0));
        assert!(!report.errors.is_empty());
    }
}
