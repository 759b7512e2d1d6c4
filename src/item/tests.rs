//! Item protocol tests, driven through the collection's deploy message

use crate::giver::{GiverContract, GiverStorage, MineParams, RoyaltyParams, find_solution};
use crate::item::messages::{
    self, EditItemContentParams, TransferEditorshipParams, TransferParams,
};
use crate::item::*;
use crate::protocol::{Contract, ExitCode, MessageContext, OutboundMessage};
use crate::tvm::{Address, Builder, Slice, decode_snake_bytes, encode_snake_string};
use num_bigint::BigUint;
use std::sync::Arc;

const NOW: u32 = 1_700_000_000;

fn collection_owner() -> Address {
    Address::new(0, [0x0C; 32])
}

fn holder() -> Address {
    Address::new(0, [0x40; 32])
}

fn buyer() -> Address {
    Address::new(0, [0xB0; 32])
}

fn stranger() -> Address {
    Address::new(0, [0x5A; 32])
}

fn ctx(sender: Address) -> MessageContext {
    MessageContext::new(NOW, sender, 100_000_000)
}

/// Mints one item and returns the collection with the emitted deploy message
fn minted() -> (GiverContract, OutboundMessage) {
    let storage = GiverStorage::builder(
        collection_owner(),
        encode_snake_string("nft item code").unwrap(),
    )
    .next_item_index(777)
    .common_content("common_content")
    .royalty_params(RoyaltyParams::new(100, 200, collection_owner()))
    .complexity_bounds(240, 255)
    .pow_complexity(BigUint::from(1u8) << 252usize)
    .build()
    .unwrap();
    let mut giver =
        GiverContract::deploy(encode_snake_string("nft giver code").unwrap(), storage, 0)
            .unwrap();

    let template = MineParams {
        expire: NOW + 60,
        mint_to: holder(),
        data1: BigUint::from(0u8),
        seed: 0,
        data2: None,
    };
    let complexity = giver.mining_data().pow_complexity.clone();
    let solution = find_solution(&template, &complexity, 10_000)
        .unwrap()
        .unwrap();
    let outcome = giver.receive_internal(&ctx(stranger()), &solution.body);
    assert!(outcome.is_success());

    let deploy = outcome.out_messages[0].clone();
    (giver, deploy)
}

fn initialized_item() -> ItemContract {
    let (giver, deploy) = minted();
    let mut item = ItemContract::deploy(deploy.state_init.clone().unwrap(), 0).unwrap();
    let outcome = item.receive_internal(&ctx(giver.address()), &deploy.body);
    assert!(outcome.is_success());
    item
}

/// An initialized item with an editor, built directly from storage
fn editable_item(editor: Address) -> ItemContract {
    let (giver, deploy) = minted();
    let mut item = ItemContract::deploy(deploy.state_init.clone().unwrap(), 0).unwrap();

    let mut builder = Builder::new();
    builder.store_address(Some(&holder())).unwrap();
    builder.store_ref(encode_snake_string("1").unwrap()).unwrap();
    builder.store_address(Some(&editor)).unwrap();
    let body = builder.build().unwrap();

    assert!(item.receive_internal(&ctx(giver.address()), &body).is_success());
    item
}

#[test]
fn test_deploy_lands_on_collection_address() {
    let (giver, deploy) = minted();
    let item = ItemContract::deploy(deploy.state_init.clone().unwrap(), 0).unwrap();

    assert_eq!(item.address(), deploy.destination);
    assert_eq!(item.address(), giver.nft_address_by_index(777).unwrap());

    let data = item.nft_data();
    assert!(!data.initialized);
    assert_eq!(data.index, 777);
    assert_eq!(data.collection_address, giver.address());
    assert_eq!(data.owner_address, None);
}

#[test]
fn test_initialized_by_collection() {
    let item = initialized_item();
    let data = item.nft_data();

    assert!(data.initialized);
    assert_eq!(data.owner_address, Some(holder()));
    assert!(decode_snake_bytes(&data.content.unwrap()).unwrap().is_empty());
    assert_eq!(item.editor(), None);
}

#[test]
fn test_uninitialized_rejects_strangers() {
    let (_, deploy) = minted();
    let mut item = ItemContract::deploy(deploy.state_init.clone().unwrap(), 0).unwrap();

    let outcome = item.receive_internal(&ctx(stranger()), &deploy.body);
    assert_eq!(outcome.exit_code, ExitCode::NotInitialized);
    assert!(!item.nft_data().initialized);
}

#[test]
fn test_transfer_by_owner() {
    let mut item = initialized_item();
    let body = messages::transfer(&TransferParams {
        query_id: Some(11),
        new_owner: buyer(),
        response_to: Some(holder()),
        forward_amount: Some(1_000),
    })
    .unwrap();

    let outcome = item.receive_internal(&ctx(holder()), &body);
    assert!(outcome.is_success());
    assert_eq!(item.nft_data().owner_address, Some(buyer()));

    assert_eq!(outcome.out_messages.len(), 2);
    let notification = &outcome.out_messages[0];
    assert_eq!(notification.destination, buyer());
    assert_eq!(notification.amount, 1_000);
    let mut slice = Slice::new(notification.body.clone());
    assert_eq!(slice.load_u32().unwrap(), messages::OP_OWNERSHIP_ASSIGNED);
    assert_eq!(slice.load_u64().unwrap(), 11);
    assert_eq!(slice.load_std_address().unwrap(), holder());

    let excesses = &outcome.out_messages[1];
    assert_eq!(excesses.destination, holder());
    assert_eq!(excesses.amount, 100_000_000 - 1_000);
    let mut slice = Slice::new(excesses.body.clone());
    assert_eq!(slice.load_u32().unwrap(), messages::OP_EXCESSES);
}

#[test]
fn test_transfer_without_notifications() {
    let mut item = initialized_item();
    let body = messages::transfer(&TransferParams {
        query_id: None,
        new_owner: buyer(),
        response_to: None,
        forward_amount: None,
    })
    .unwrap();

    let outcome = item.receive_internal(&ctx(holder()), &body);
    assert!(outcome.is_success());
    assert!(outcome.out_messages.is_empty());
}

#[test]
fn test_transfer_by_stranger() {
    let mut item = initialized_item();
    let before = item.storage().clone();
    let body = messages::transfer(&TransferParams {
        query_id: None,
        new_owner: stranger(),
        response_to: None,
        forward_amount: None,
    })
    .unwrap();

    let outcome = item.receive_internal(&ctx(stranger()), &body);
    assert_eq!(outcome.exit_code, ExitCode::NotOwner);
    assert_eq!(item.storage(), &before);
}

#[test]
fn test_get_static_data() {
    let mut item = initialized_item();
    let collection = item.nft_data().collection_address;
    let outcome = item.receive_internal(
        &ctx(stranger()),
        &messages::get_static_data(Some(5)).unwrap(),
    );

    assert!(outcome.is_success());
    let reply = &outcome.out_messages[0];
    assert_eq!(reply.destination, stranger());
    let mut slice = Slice::new(reply.body.clone());
    assert_eq!(slice.load_u32().unwrap(), messages::OP_REPORT_STATIC_DATA);
    assert_eq!(slice.load_u64().unwrap(), 5);
    assert_eq!(slice.load_biguint(256).unwrap(), BigUint::from(777u32));
    assert_eq!(slice.load_std_address().unwrap(), collection);
}

#[test]
fn test_edit_content_requires_editor() {
    let edit = messages::edit_content(&EditItemContentParams {
        query_id: None,
        content: "https://example.com/new.json".to_string(),
        royalty_params: RoyaltyParams::new(1, 10, holder()),
    })
    .unwrap();

    let mut item = initialized_item();
    let outcome = item.receive_internal(&ctx(holder()), &edit);
    assert_eq!(outcome.exit_code, ExitCode::NotEditor);

    let editor = Address::new(0, [0xED; 32]);
    let mut item = editable_item(editor);
    assert!(item.receive_internal(&ctx(editor), &edit).is_success());
    assert_eq!(
        crate::tvm::decode_offchain_content(&item.nft_data().content.unwrap()).unwrap(),
        "https://example.com/new.json"
    );
}

#[test]
fn test_transfer_editorship() {
    let editor = Address::new(0, [0xED; 32]);
    let body = messages::transfer_editorship(&TransferEditorshipParams {
        query_id: Some(2),
        new_editor: buyer(),
        response_to: None,
        forward_amount: Some(10),
    })
    .unwrap();

    let mut item = editable_item(editor);
    let outcome = item.receive_internal(&ctx(holder()), &body);
    assert_eq!(outcome.exit_code, ExitCode::NotEditor);
    assert_eq!(item.editor(), Some(editor));

    let outcome = item.receive_internal(&ctx(editor), &body);
    assert!(outcome.is_success());
    assert_eq!(item.editor(), Some(buyer()));
    let mut slice = Slice::new(outcome.out_messages[0].body.clone());
    assert_eq!(slice.load_u32().unwrap(), messages::OP_EDITORSHIP_ASSIGNED);
}

#[test]
fn test_external_messages_rejected() {
    let mut item = initialized_item();
    let outcome = item.receive_external(&Arc::new(crate::tvm::Cell::new()));
    assert!(!outcome.is_success());
}

#[test]
fn test_data_cell_round_trip() {
    let item = editable_item(Address::new(0, [0xED; 32]));
    let parsed = ItemStorage::from_cell(&item.data_cell().unwrap()).unwrap();
    assert_eq!(&parsed, item.storage());
}
