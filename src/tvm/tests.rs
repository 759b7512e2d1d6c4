//! Integration tests across the TVM modules

use crate::tvm::*;
use num_bigint::BigUint;
use std::sync::Arc;

/// Helper function to create a cell with specific data
fn create_test_cell(data: Vec<u8>, bit_len: usize) -> Arc<Cell> {
    Arc::new(Cell::with_data(data, bit_len).unwrap())
}

/// Test basic cell operations
#[test]
fn test_cell_operations() {
    let cell = create_test_cell(vec![0xFF, 0x00], 16);
    assert_eq!(cell.bit_len(), 16);
    assert_eq!(cell.data(), &[0xFF, 0x00]);
    assert_eq!(cell.hash(), cell.hash());
}

/// Test builder integration
#[test]
fn test_builder_and_slice_integration() {
    let addr = Address::new(0, [1u8; 32]);
    let mut builder = Builder::new();
    builder.store_address(Some(&addr)).unwrap();
    builder.store_u32(42).unwrap();
    builder.store_bool(true).unwrap();
    builder.store_coins(123_456_789).unwrap();
    builder.store_string("Hello").unwrap();

    let mut slice = builder.to_slice().unwrap();
    assert_eq!(slice.load_address().unwrap(), Some(addr));
    assert_eq!(slice.load_u32().unwrap(), 42);
    assert!(slice.load_bit().unwrap());
    assert_eq!(slice.load_coins().unwrap(), 123_456_789);
    assert_eq!(slice.load_bytes(5).unwrap(), b"Hello");
    assert!(slice.is_empty());
}

/// Test BoC serialization/deserialization roundtrip
#[test]
fn test_boc_roundtrip() {
    let mut builder = Builder::new();
    builder.store_u64(0xDEADBEEFCAFEBABE).unwrap();
    builder.store_uint(0b101, 3).unwrap();

    let original = builder.build().unwrap();
    let boc = serialize_boc(&original, false).unwrap();
    let deserialized = deserialize_boc(&boc).unwrap();

    assert_eq!(original.hash(), deserialized.hash());
    assert_eq!(deserialized.bit_len(), 67);
}

/// Test BoC with references keeps their order
#[test]
fn test_boc_with_references() {
    let mut ref_builder_1 = Builder::new();
    let mut ref_builder_2 = Builder::new();
    ref_builder_1.store_u32(111).unwrap();
    ref_builder_2.store_u32(222).unwrap();
    let ref_cell_1 = ref_builder_1.build().unwrap();
    let ref_cell_2 = ref_builder_2.build().unwrap();

    let mut root_builder = Builder::new();
    root_builder.store_u32(999).unwrap();
    root_builder.store_ref(ref_cell_1.clone()).unwrap();
    root_builder.store_ref(ref_cell_2.clone()).unwrap();
    let root = root_builder.build().unwrap();

    let deserialized = deserialize_boc(&serialize_boc(&root, false).unwrap()).unwrap();

    assert_eq!(deserialized.reference_count(), 2);
    assert_eq!(deserialized.reference(0).unwrap().hash(), ref_cell_1.hash());
    assert_eq!(deserialized.reference(1).unwrap().hash(), ref_cell_2.hash());
    assert_eq!(root.hash(), deserialized.hash());
}

/// Test a deeper tree
#[test]
fn test_boc_deep_tree() {
    let long = "z".repeat(1000);
    let mut builder = Builder::new();
    builder.store_u32(1).unwrap();
    builder.store_ref(encode_snake_string(&long).unwrap()).unwrap();
    builder.store_ref(encode_offchain_content("ipfs://root").unwrap()).unwrap();
    let root = builder.build().unwrap();

    let decoded = base64_to_boc(&boc_to_base64(&root, true).unwrap()).unwrap();
    assert_eq!(decoded.hash(), root.hash());
    assert_eq!(decoded.depth(), root.depth());
    assert_eq!(
        decode_snake_string(decoded.reference(0).unwrap()).unwrap(),
        long
    );
}

/// Test address and builder integration
#[test]
fn test_address_builder_integration() {
    let mut addr = Address::new(-1, [0x12; 32]);
    addr.set_test_only(true);
    addr.set_bounceable(false);

    let mut builder = Builder::new();
    builder.store_address(Some(&addr)).unwrap();
    let cell = builder.build().unwrap();
    assert_eq!(cell.bit_len(), 267);

    // Friendly flags are not part of the stored form
    let mut builder2 = Builder::new();
    builder2.store_address(Some(&Address::new(-1, [0x12; 32]))).unwrap();
    let cell2 = builder2.build().unwrap();

    assert_eq!(cell.hash(), cell2.hash());
}

/// Unsigned values round-trip below 2^bits and overflow at 2^bits
#[test]
fn test_biguint_width_boundaries() {
    for bits in [1usize, 8, 64, 65, 128, 200, 256] {
        let limit = BigUint::from(1u8) << bits;
        let max = &limit - BigUint::from(1u8);

        let mut builder = Builder::new();
        builder.store_biguint(&max, bits).unwrap();
        let mut slice = builder.to_slice().unwrap();
        assert_eq!(slice.load_biguint(bits).unwrap(), max);

        let mut builder = Builder::new();
        assert!(matches!(
            builder.store_biguint(&limit, bits),
            Err(EncodingError::Overflow(_))
        ));
    }
}

/// Test hash consistency across construction paths
#[test]
fn test_hash_consistency() {
    let cell1 = create_test_cell(vec![0x11, 0x22, 0x33], 24);

    let mut builder = CellBuilder::new();
    builder.store_byte(0x11).unwrap();
    builder.store_byte(0x22).unwrap();
    builder.store_byte(0x33).unwrap();
    let cell2 = builder.build().unwrap();

    let mut h_builder = Builder::new();
    h_builder.store_bytes(&[0x11, 0x22, 0x33]).unwrap();
    let cell3 = h_builder.build().unwrap();

    assert_eq!(cell1.hash(), cell2.hash());
    assert_eq!(cell2.hash(), cell3.hash());
}

/// Test edge cases and error conditions
#[test]
fn test_edge_cases() {
    let max_data = vec![0xFF; MAX_CELL_BITS.div_ceil(8)];
    let max_cell = Cell::with_data(max_data.clone(), MAX_CELL_BITS).unwrap();
    assert_eq!(max_cell.bit_len(), MAX_CELL_BITS);
    assert!(Cell::with_data(vec![0xFF; 129], MAX_CELL_BITS + 1).is_err());

    let mut builder = Builder::new();
    builder.store_bit(true).unwrap();
    let mut slice = Slice::new(builder.build().unwrap());
    assert_eq!(slice.remaining_bits(), 1);
    assert!(slice.load_bit().unwrap());
    assert!(slice.is_empty());

    let refs: Vec<Arc<Cell>> = (0..=MAX_CELL_REFS as u8)
        .map(|i| create_test_cell(vec![i], 8))
        .collect();
    assert!(Cell::with_references(vec![], 0, refs).is_err());
}

/// Test BoC with different CRC options
#[test]
fn test_boc_crc_options() {
    let mut builder = Builder::new();
    builder.store_u64(0xDEADBEEFCAFEBABE).unwrap();
    let cell = builder.build().unwrap();

    let boc_no_crc = serialize_boc(&cell, false).unwrap();
    let boc_with_crc = serialize_boc(&cell, true).unwrap();
    assert_eq!(boc_with_crc.len(), boc_no_crc.len() + 4);

    assert_eq!(deserialize_boc(&boc_no_crc).unwrap().hash(), cell.hash());
    assert_eq!(deserialize_boc(&boc_with_crc).unwrap().hash(), cell.hash());

    let mut corrupted = boc_with_crc.clone();
    let idx = corrupted.len() - 6;
    corrupted[idx] ^= 0x01;
    assert!(matches!(
        deserialize_boc(&corrupted),
        Err(EncodingError::InvalidBoc(_))
    ));
}

/// Test hex/base64 BoC conversion
#[test]
fn test_boc_conversions() {
    let mut builder = Builder::new();
    builder.store_u32(0xDEADBEEF).unwrap();
    let cell = builder.build().unwrap();

    let hex = boc_to_hex(&cell, false).unwrap();
    assert_eq!(hex_to_boc(&hex).unwrap().hash(), cell.hash());

    let b64 = boc_to_base64(&cell, false).unwrap();
    assert_eq!(base64_to_boc(&b64).unwrap().hash(), cell.hash());
}

/// State init hashes feed address derivation through the BoC path too
#[test]
fn test_state_init_survives_boc() {
    let code = encode_snake_string("opaque code").unwrap();
    let data = encode_offchain_content("https://example.com/meta.json").unwrap();
    let state_init = StateInit::new(code, data);
    let cell = state_init.to_cell().unwrap();

    let decoded = deserialize_boc(&serialize_boc(&cell, true).unwrap()).unwrap();
    let parsed = StateInit::from_cell(&decoded).unwrap();
    assert_eq!(parsed.address(0).unwrap(), state_init.address(0).unwrap());
}
