use std::sync::Arc;

use hex_literal::hex;
use meow_core::network::{KAWPOW_HEADER_SIZE, LEGACY_HEADER_SIZE, START_OF_HEADER};
use meow_core::{
    BlockHeader, ChainContext, Epoch, HashBackends, HeaderError, KawpowCheck, Network, PowFields,
};
use proptest::prelude::*;

/// Stand-in for the chained hashes: SHA256d with an algorithm tag so the
/// two epochs produce different ids for the same bytes.
fn tagged(tag: u8) -> impl Fn(&[u8]) -> [u8; 32] + Send + Sync {
    move |data: &[u8]| {
        let mut input = vec![tag];
        input.extend_from_slice(data);
        meow_core::double_sha256(&input)
    }
}

fn context(network: Network) -> Arc<ChainContext> {
    let hashers = HashBackends::new()
        .with_x16r(tagged(1))
        .with_x16rv2(tagged(2));
    ChainContext::new(network).with_hashers(hashers).shared()
}

const LEGACY_HEADER: [u8; 80] = hex!(
    "00000020"
    "0f0e0d0c0b0a09080706050403020100000000000000000000000000000000ff"
    "5555555555555555555555555555555555555555555555555555555555555555"
    "00a0825d" "ffff001e" "78563412"
);

#[test]
fn decode_hash_and_validate_legacy_header() {
    let ctx = context(Network::Mainnet);
    let header = BlockHeader::from_bytes(&LEGACY_HEADER, &ctx).unwrap();

    assert_eq!(header.version(), 0x20000000);
    assert_eq!(header.time(), 0x5d82a000);
    assert_eq!(header.epoch(), Epoch::X16r);
    assert_eq!(header.nonce(), 0x12345678);
    assert_eq!(header.height(), None);

    let fields = header.to_fields().unwrap();
    assert_eq!(
        fields.prev_hash,
        "ff000000000000000000000000000000000102030405060708090a0b0c0d0e0f"
    );
    assert_eq!(fields.hash.as_deref(), Some(header.id().unwrap()));

    // 0x1e00ffff is 256 times easier than genesis
    assert_eq!(header.difficulty_string().unwrap(), "0.00390625");
    assert!(header.valid_timestamp(header.time()));
    assert!(header.valid_proof_of_work().is_ok());
}

#[test]
fn same_bytes_hash_differently_across_x16rv2_activation() {
    let ctx = context(Network::Mainnet);
    let activation = ctx.params.x16rv2_activation;
    let make = |time| {
        BlockHeader::new(
            &ctx,
            1,
            [0; 32],
            [0; 32],
            time,
            0x1d00ffff,
            PowFields::Legacy { nonce: 0 },
        )
        .unwrap()
    };

    let before = make(activation - 1);
    let after = make(activation);
    assert_eq!(before.to_bytes().len(), after.to_bytes().len());
    assert_ne!(before.id().unwrap(), after.id().unwrap());
}

#[test]
fn full_block_prefix_is_skipped() {
    let ctx = context(Network::Mainnet);
    let mut raw_block = vec![0xff; START_OF_HEADER];
    raw_block.extend_from_slice(&LEGACY_HEADER);
    raw_block.push(0x00);

    let from_block = BlockHeader::from_full_block_bytes(&raw_block, &ctx).unwrap();
    let direct = BlockHeader::from_bytes(&LEGACY_HEADER, &ctx).unwrap();
    assert_eq!(from_block, direct);
    assert_eq!(from_block.id().unwrap(), direct.id().unwrap());
}

#[test]
fn one_byte_short_never_yields_a_header() {
    let ctx = context(Network::Mainnet);
    let err = BlockHeader::from_bytes(&LEGACY_HEADER[..LEGACY_HEADER_SIZE - 1], &ctx).unwrap_err();
    assert!(matches!(err, HeaderError::Decode(_)));
}

#[test]
fn network_decides_the_layout() {
    // Between the testnet and mainnet KawPoW activations
    let time: u32 = 1_586_000_000;
    let header = BlockHeader::new(
        &context(Network::Testnet),
        0x30000000,
        [1; 32],
        [2; 32],
        time,
        0x1d00ffff,
        PowFields::KawPow {
            height: 10,
            nonce: 11,
            mix_hash: [3; 32],
        },
    )
    .unwrap();
    let bytes = header.to_bytes();
    assert_eq!(bytes.len(), KAWPOW_HEADER_SIZE);

    // Mainnet reads the same prefix as a legacy header
    let as_mainnet = BlockHeader::from_bytes(&bytes, &context(Network::Mainnet)).unwrap();
    assert_eq!(as_mainnet.epoch(), Epoch::X16rv2);
    assert_eq!(as_mainnet.to_bytes().len(), LEGACY_HEADER_SIZE);
}

#[test]
fn kawpow_without_rule_is_flagged() {
    let ctx = ChainContext::new(Network::Mainnet).shared();
    let header = BlockHeader::new(
        &ctx,
        0x30000000,
        [0; 32],
        [0; 32],
        ctx.params.kawpow_activation,
        0x1d00ffff,
        PowFields::KawPow {
            height: 1,
            nonce: 1,
            mix_hash: [0; 32],
        },
    )
    .unwrap();

    assert_eq!(header.valid_proof_of_work(), Err(HeaderError::UnresolvedKawpowCheck));

    let permissive = ChainContext::new(Network::Mainnet)
        .with_kawpow_check(KawpowCheck::custom(|_| Ok(true)))
        .shared();
    let header = BlockHeader::from_bytes(&header.to_bytes(), &permissive).unwrap();
    assert_eq!(header.valid_proof_of_work(), Ok(true));
}

fn arb_header(ctx: Arc<ChainContext>) -> impl Strategy<Value = BlockHeader> {
    let kawpow_activation = ctx.params.kawpow_activation;
    (
        any::<i32>(),
        any::<[u8; 32]>(),
        any::<[u8; 32]>(),
        any::<u32>(),
        any::<u32>(),
        any::<u32>(),
        any::<u64>(),
        any::<[u8; 32]>(),
    )
        .prop_map(
            move |(version, prev_hash, merkle_root, time, bits, height, nonce, mix_hash)| {
                let pow = if time >= kawpow_activation {
                    PowFields::KawPow {
                        height,
                        nonce,
                        mix_hash,
                    }
                } else {
                    PowFields::Legacy {
                        nonce: nonce as u32,
                    }
                };
                BlockHeader::new(&ctx, version, prev_hash, merkle_root, time, bits, pow).unwrap()
            },
        )
}

proptest! {
    #[test]
    fn decode_inverts_encode(header in arb_header(context(Network::Mainnet))) {
        let ctx = Arc::clone(header.context());
        let bytes = header.to_bytes();
        prop_assert_eq!(bytes.len(), header.size());

        let decoded = BlockHeader::from_bytes(&bytes, &ctx).unwrap();
        prop_assert_eq!(decoded.to_bytes(), bytes);
        prop_assert_eq!(decoded, header);
    }
}
