//! End-to-end: encode descriptors, compile them into a store, link, and
//! register extensions.

use hpb_arena::{Arena, ArenaConfig};
use hpb_core::{FieldType, Platform};
use hpb_mini::{
    field_modifier, message_modifier, ExtensionRegistry, FieldMode, LayoutStore, MiniTable,
    MiniTableEnum, MiniTableError, MiniTableExtension, MiniTableSub, MtDataEncoder,
};

fn encode(f: impl FnOnce(&mut MtDataEncoder<'_>) -> Result<(), MiniTableError>) -> Vec<u8> {
    let mut buf = Vec::new();
    f(&mut MtDataEncoder::new(&mut buf)).unwrap();
    buf
}

/// `message Node { optional int32 id = 1; repeated Node children = 2;
/// map<string, Node> index = 3; optional Color color = 4;
/// oneof payload { string text = 5; bytes blob = 6; } }`
fn node_descriptor() -> Vec<u8> {
    encode(|e| {
        e.start_message(message_modifier::VALIDATE_UTF8 | message_modifier::IS_EXTENDABLE);
        e.put_field(FieldType::Int32, 1, 0)?;
        e.put_field(FieldType::Message, 2, field_modifier::IS_REPEATED)?;
        e.put_field(FieldType::Message, 3, field_modifier::IS_REPEATED)?;
        e.put_field(FieldType::Enum, 4, field_modifier::IS_CLOSED_ENUM)?;
        e.put_field(FieldType::String, 5, 0)?;
        e.put_field(FieldType::Bytes, 6, 0)?;
        e.start_oneof();
        e.put_oneof_field(5);
        e.put_oneof_field(6);
        Ok(())
    })
}

#[test]
fn recursive_message_links_through_store() {
    let arena = Arena::new();
    let mut store = LayoutStore::new(Platform::Bits64);

    let node = store.add_message(MiniTable::build(&node_descriptor(), Platform::Bits64, &arena).unwrap());
    let entry_data = encode(|e| e.encode_map(FieldType::String, FieldType::Message, 0, 0));
    let entry = store.add_message(MiniTable::build(&entry_data, Platform::Bits64, &arena).unwrap());
    let color_data = encode(|e| {
        e.start_enum();
        e.put_enum_value(0)?;
        e.put_enum_value(1)?;
        e.put_enum_value(2)?;
        e.end_enum();
        Ok(())
    });
    let color = store.add_enum(MiniTableEnum::build(&color_data, &arena).unwrap());

    store.link(entry, &[node], &[]).unwrap();
    store.link(node, &[node, entry], &[color]).unwrap();

    let t = store.message(node).unwrap();
    assert_eq!(t.field_count(), 6);
    assert_eq!(t.dense_below(), 6);
    let children = t.find_field_by_number(2).unwrap();
    let index = t.find_field_by_number(3).unwrap();
    assert_eq!(children.mode(), FieldMode::Array);
    assert_eq!(index.mode(), FieldMode::Map);
    assert_eq!(t.sub_message(children), Some(node));
    assert_eq!(t.sub_message(index), Some(entry));
    let color_field = t.find_field_by_number(4).unwrap();
    assert_eq!(t.sub_enum(color_field), Some(color));
    assert!(store.enum_table(color).unwrap().check_value(2));
    assert!(!store.enum_table(color).unwrap().check_value(3));

    let text = t.find_field_by_number(5).unwrap();
    let blob = t.find_field_by_number(6).unwrap();
    assert_eq!(text.offset(), blob.offset());
    assert_eq!(text.oneof_case_offset(), blob.oneof_case_offset());
    assert_eq!(text.descriptor_type(), FieldType::String);
    assert_eq!(t.size() % 8, 0);
}

#[test]
fn layouts_differ_by_platform() {
    let data = node_descriptor();
    let arena = Arena::new();
    let small = MiniTable::build(&data, Platform::Bits32, &arena).unwrap();
    let large = MiniTable::build(&data, Platform::Bits64, &arena).unwrap();
    assert!(small.size() < large.size());
    assert_eq!(small.field_count(), large.field_count());
}

#[test]
fn registry_rejects_duplicate_batch_atomically() {
    let arena = Arena::new();
    let mut store = LayoutStore::new(Platform::Bits64);
    let node_table = MiniTable::build(&node_descriptor(), Platform::Bits64, &arena).unwrap();
    let node = store.add_message(node_table.clone());

    let mut ids = Vec::new();
    for number in [100, 101, 100] {
        let data = encode(|e| e.encode_extension(FieldType::Int64, number, 0));
        let ext = MiniTableExtension::build(&data, node, &node_table, MiniTableSub::Message(None), Platform::Bits64)
            .unwrap();
        ids.push(store.add_extension(ext));
    }

    let mut registry = ExtensionRegistry::with_capacity(8, &ArenaConfig::default()).unwrap();
    let err = registry.add_from_store(&store, &ids).unwrap_err();
    assert!(matches!(err, MiniTableError::DuplicateExtension { number: 100, .. }));
    assert!(registry.is_empty());

    registry.add_from_store(&store, &ids[..2]).unwrap();
    assert_eq!(registry.lookup(node, 101), Some(ids[1]));
}

#[test]
fn rollback_discards_partial_build() {
    let arena = Arena::new();
    let mut store = LayoutStore::new(Platform::Bits64);
    store.add_message(MiniTable::empty());
    let mark = store.mark();
    store.add_message(MiniTable::build(&node_descriptor(), Platform::Bits64, &arena).unwrap());
    store.add_enum(MiniTableEnum::build(b"!)", &arena).unwrap());
    store.truncate(mark);
    assert_eq!(store.message_count(), 1);
    assert_eq!(store.enum_count(), 0);
}

#[test]
fn arena_limit_fails_build() {
    let arena = Arena::with_config(&ArenaConfig::with_limit(16));
    let err = MiniTable::build(&node_descriptor(), Platform::Bits64, &arena).unwrap_err();
    assert!(matches!(err, MiniTableError::Arena(_)));
}
