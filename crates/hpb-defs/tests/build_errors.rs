//! Every rejected file leaves the pool exactly as it was.

use hpb_arena::ArenaConfig;
use hpb_core::FieldType;
use hpb_defs::{DefError, DefPool, PoolConfig};
use hpb_descriptor::{EnumReservedRange, FileDescriptorProto, ReservedRange};
use hpb_test_utils::fixtures::{shop, wide};
use hpb_test_utils::*;

/// Load `proto` into a pool that already holds `shop.proto`, expect it to
/// fail, and check nothing of it stuck.
fn reject(proto: FileDescriptorProto) -> DefError {
    let mut pool = DefPool::new().unwrap();
    pool.add_file(&shop()).unwrap();
    let before = pool.layouts().message_count();
    let names: Vec<String> = proto
        .message_type
        .iter()
        .map(|m| format!("{}.{}", proto.package(), m.name()))
        .collect();
    let symbols: Vec<_> = names.iter().map(|n| pool.find_symbol(n)).collect();

    let err = pool.add_file(&proto).unwrap_err();

    assert_eq!(pool.file_count(), 1);
    assert_eq!(pool.find_file_by_name(proto.name()), None);
    assert_eq!(pool.layouts().message_count(), before);
    let after: Vec<_> = names.iter().map(|n| pool.find_symbol(n)).collect();
    assert_eq!(after, symbols);
    // The same name loads cleanly once fixed.
    pool.add_file(&file(proto.name(), proto.package())).unwrap();
    err
}

fn one_message(fields: Vec<hpb_descriptor::FieldDescriptorProto>) -> FileDescriptorProto {
    let mut f = file("bad.proto", "bad");
    f.message_type.push(message("Ok", vec![scalar("x", 1, FieldType::Int32)]));
    f.message_type.push(message("M", fields));
    f
}

#[test]
fn duplicate_file() {
    let mut pool = DefPool::new().unwrap();
    pool.add_file(&shop()).unwrap();
    let err = pool.add_file(&file("shop.proto", "other")).unwrap_err();
    assert_eq!(
        err,
        DefError::DuplicateFile {
            name: "shop.proto".into()
        }
    );
    assert_eq!(pool.file_count(), 1);
}

#[test]
fn duplicate_symbol_across_files() {
    let mut f = file("dup.proto", "shop");
    f.message_type.push(message("Fresh", Vec::new()));
    f.message_type.push(message("Item", Vec::new()));
    let err = reject(f);
    assert_eq!(
        err,
        DefError::DuplicateSymbol {
            name: "shop.Item".into()
        }
    );
}

#[test]
fn missing_file_name() {
    let mut pool = DefPool::new().unwrap();
    let err = pool.add_file(&FileDescriptorProto::default()).unwrap_err();
    assert_eq!(err, DefError::MissingName { kind: "file" });
}

#[test]
fn file_name_with_nul() {
    let mut pool = DefPool::new().unwrap();
    let err = pool.add_file(&file("a\0b.proto", "")).unwrap_err();
    assert_eq!(err, DefError::FileNameNul);
}

#[test]
fn bad_package_and_names() {
    let mut pool = DefPool::new().unwrap();
    let err = pool.add_file(&file("p.proto", "a..b")).unwrap_err();
    assert!(matches!(err, DefError::InvalidName { .. }));

    let mut f = file("n.proto", "n");
    f.message_type.push(message("1abc", Vec::new()));
    let err = pool.add_file(&f).unwrap_err();
    assert_eq!(
        err,
        DefError::InvalidName {
            name: "1abc".into()
        }
    );
    assert_eq!(pool.file_count(), 0);
}

#[test]
fn unknown_syntax() {
    let mut f = file("s.proto", "s");
    f.syntax = Some("proto4".into());
    assert_eq!(
        reject(f),
        DefError::InvalidSyntax {
            value: "proto4".into()
        }
    );
}

#[test]
fn missing_dependency() {
    let mut f = file("d.proto", "d");
    f.dependency.push("nowhere.proto".into());
    assert_eq!(
        reject(f),
        DefError::MissingDependency {
            name: "nowhere.proto".into()
        }
    );
}

#[test]
fn public_dependency_out_of_range() {
    let mut f = file("d.proto", "d");
    f.dependency.push("shop.proto".into());
    f.public_dependency.push(1);
    assert_eq!(
        reject(f),
        DefError::DependencyIndex {
            kind: "public_dep",
            index: 1
        }
    );
}

#[test]
fn duplicate_field_number() {
    let err = reject(one_message(vec![
        scalar("a", 1, FieldType::Int32),
        scalar("b", 1, FieldType::Int32),
    ]));
    assert_eq!(err, DefError::DuplicateFieldNumber { number: 1 });
}

#[test]
fn duplicate_field_name() {
    let err = reject(one_message(vec![
        scalar("a", 1, FieldType::Int32),
        scalar("a", 2, FieldType::Int32),
    ]));
    assert_eq!(err, DefError::DuplicateFieldName { name: "a".into() });
}

#[test]
fn json_name_collision() {
    let err = reject(one_message(vec![
        scalar("fooBar", 1, FieldType::Int32),
        scalar("foo_bar", 2, FieldType::Int32),
    ]));
    assert_eq!(
        err,
        DefError::DuplicateJsonName {
            name: "fooBar".into()
        }
    );
}

#[test]
fn field_number_bounds() {
    let err = reject(one_message(vec![scalar("z", 0, FieldType::Int32)]));
    assert_eq!(
        err,
        DefError::FieldNumber {
            field: "bad.M.z".into(),
            number: 0
        }
    );
    let err = reject(one_message(vec![scalar("big", 1 << 29, FieldType::Int32)]));
    assert!(matches!(err, DefError::FieldNumber { number, .. } if number == 1 << 29));
}

#[test]
fn field_type_checks() {
    let mut bad_type = scalar("t", 1, FieldType::Int32);
    bad_type.r#type = Some(19);
    assert_eq!(
        reject(one_message(vec![bad_type])),
        DefError::InvalidFieldType {
            field: "bad.M.t".into(),
            value: 19
        }
    );

    let mut no_type = scalar("t", 1, FieldType::Int32);
    no_type.r#type = None;
    assert!(matches!(
        reject(one_message(vec![no_type])),
        DefError::InvalidFieldType { value: 0, .. }
    ));

    assert_eq!(
        reject(one_message(vec![scalar("m", 1, FieldType::Message)])),
        DefError::MissingTypeName {
            field: "bad.M.m".into(),
            field_type: FieldType::Message
        }
    );
    assert_eq!(
        reject(one_message(vec![typed("i", 1, FieldType::Int32, "X")])),
        DefError::UnexpectedTypeName {
            field: "bad.M.i".into(),
            field_type: FieldType::Int32
        }
    );

    let mut bad_label = scalar("l", 1, FieldType::Int32);
    bad_label.label = Some(4);
    assert!(matches!(
        reject(one_message(vec![bad_label])),
        DefError::InvalidLabel { value: 4, .. }
    ));
}

#[test]
fn unresolved_and_mismatched_types() {
    assert_eq!(
        reject(one_message(vec![typed("x", 2, FieldType::Message, ".nope.X")])),
        DefError::UnresolvedName {
            name: ".nope.X".into()
        }
    );
    assert_eq!(
        reject(one_message(vec![typed("c", 2, FieldType::Message, ".shop.Color")])),
        DefError::TypeMismatch {
            name: ".shop.Color".into(),
            expected: "message"
        }
    );
    assert_eq!(
        reject(one_message(vec![typed("e", 2, FieldType::Enum, ".shop.Item")])),
        DefError::TypeMismatch {
            name: ".shop.Item".into(),
            expected: "enum"
        }
    );
}

#[test]
fn proto3_rules() {
    let mut f = proto3_file("p3.proto", "p3");
    f.message_type
        .push(message("R", vec![required(scalar("r", 1, FieldType::Int32))]));
    assert_eq!(
        reject(f),
        DefError::Proto3Required {
            field: "p3.R.r".into()
        }
    );

    let mut f = proto3_file("p3.proto", "p3");
    f.enum_type.push(enum_type("E", &[("ONE", 1)]));
    assert_eq!(
        reject(f),
        DefError::Proto3EnumZero {
            name: "p3.E".into()
        }
    );

    let mut f = proto3_file("p3.proto", "p3");
    f.message_type.push(message(
        "D",
        vec![with_default(scalar("d", 1, FieldType::Int32), "5")],
    ));
    assert_eq!(
        reject(f),
        DefError::Proto3Default {
            field: "p3.D.d".into()
        }
    );

    let mut f = proto3_file("p3.proto", "p3");
    let mut opt = scalar("o", 1, FieldType::Int32);
    opt.proto3_optional = Some(true);
    f.message_type.push(message("O", vec![opt]));
    assert_eq!(
        reject(f),
        DefError::Proto3OptionalOutsideOneof {
            field: "p3.O.o".into()
        }
    );
}

#[test]
fn empty_enum() {
    let mut f = file("e.proto", "e");
    f.enum_type.push(enum_type("Nothing", &[]));
    assert_eq!(
        reject(f),
        DefError::EmptyEnum {
            name: "e.Nothing".into()
        }
    );
}

#[test]
fn enum_reserved_range_inverted() {
    let mut f = file("e.proto", "e");
    let mut e = enum_type("E", &[("A", 1)]);
    e.reserved_range.push(EnumReservedRange {
        start: Some(5),
        end: Some(4),
    });
    f.enum_type.push(e);
    assert_eq!(
        reject(f),
        DefError::EnumReservedRange {
            start: 5,
            end: 4,
            name: "e.E".into()
        }
    );
}

#[test]
fn oneof_rules() {
    let mut m = message(
        "M",
        vec![in_oneof(repeated(scalar("r", 1, FieldType::Int32)), 0)],
    );
    m.oneof_decl.push(oneof("o"));
    let mut f = file("o.proto", "o");
    f.message_type.push(m);
    assert_eq!(
        reject(f),
        DefError::OneofLabel {
            field: "o.M.r".into()
        }
    );

    let mut f = file("o.proto", "o");
    f.message_type
        .push(message("M", vec![in_oneof(scalar("x", 1, FieldType::Int32), 3)]));
    assert_eq!(
        reject(f),
        DefError::OneofIndex {
            field: "o.M.x".into(),
            index: 3
        }
    );

    let mut m = message("M", Vec::new());
    m.oneof_decl.push(oneof("o"));
    m.oneof_decl.push(oneof("o"));
    let mut f = file("o.proto", "o");
    f.message_type.push(m);
    assert_eq!(
        reject(f),
        DefError::DuplicateOneofName {
            name: "o.M.o".into()
        }
    );
}

#[test]
fn synthetic_oneof_rules() {
    let mut m = message(
        "M",
        vec![
            proto3_optional(scalar("a", 1, FieldType::Int32), 0),
            proto3_optional(scalar("b", 2, FieldType::Int32), 0),
        ],
    );
    m.oneof_decl.push(oneof("_a"));
    let mut f = proto3_file("s.proto", "s");
    f.message_type.push(m);
    assert!(matches!(
        reject(f),
        DefError::SyntheticOneofSize { count: 2, .. }
    ));

    let mut m = message(
        "M",
        vec![
            proto3_optional(scalar("a", 1, FieldType::Int32), 0),
            in_oneof(scalar("b", 2, FieldType::Int32), 1),
        ],
    );
    m.oneof_decl.push(oneof("_a"));
    m.oneof_decl.push(oneof("real"));
    let mut f = proto3_file("s.proto", "s");
    f.message_type.push(m);
    assert!(matches!(
        reject(f),
        DefError::SyntheticOneofOrder { .. }
    ));
}

#[test]
fn message_ranges() {
    let mut m = message("M", Vec::new());
    m.extension_range.push(extension_range(0, 5));
    let mut f = file("r.proto", "r");
    f.message_type.push(m);
    assert_eq!(
        reject(f),
        DefError::ExtensionRange {
            start: 0,
            end: 5,
            message: "r.M".into()
        }
    );

    let mut m = message("M", Vec::new());
    m.reserved_range.push(ReservedRange {
        start: Some(10),
        end: Some((1 << 29) + 1),
    });
    let mut f = file("r.proto", "r");
    f.message_type.push(m);
    assert!(matches!(reject(f), DefError::ReservedRange { start: 10, .. }));
}

#[test]
fn message_set_and_map_entry_shapes() {
    let mut ms = message_set("Set");
    ms.field.push(scalar("x", 1, FieldType::Int32));
    let mut f = file("m.proto", "m");
    f.message_type.push(ms);
    assert_eq!(
        reject(f),
        DefError::MessageSetFields {
            message: "m.Set".into()
        }
    );

    let mut entry = map_entry("E", FieldType::String, scalar("v", 2, FieldType::Int32));
    entry.field.push(scalar("extra", 3, FieldType::Int32));
    let mut f = file("m.proto", "m");
    f.message_type.push(entry);
    assert_eq!(
        reject(f),
        DefError::MapEntryFields {
            message: "m.E".into(),
            count: 3
        }
    );
}

#[test]
fn extension_rules() {
    let mut f = file("x.proto", "x");
    f.extension
        .push(extension("far", 500, FieldType::Int32, ".shop.Item"));
    assert_eq!(
        reject(f),
        DefError::ExtensionNumber {
            number: 500,
            field: "x.far".into(),
            message: "shop.Item".into()
        }
    );

    let mut f = file("x.proto", "x");
    let mut ext = extension("lost", 100, FieldType::Int32, "");
    ext.extendee = None;
    f.extension.push(ext);
    assert_eq!(
        reject(f),
        DefError::MissingExtendee {
            field: "x.lost".into()
        }
    );

    let mut f = file("x.proto", "x");
    f.extension
        .push(in_oneof(extension("one", 100, FieldType::Int32, ".shop.Item"), 0));
    assert_eq!(
        reject(f),
        DefError::ExtensionInOneof {
            field: "x.one".into()
        }
    );

    let mut f = file("x.proto", "x");
    f.extension
        .push(extension("enum_target", 100, FieldType::Int32, ".shop.Color"));
    assert_eq!(
        reject(f),
        DefError::TypeMismatch {
            name: ".shop.Color".into(),
            expected: "message"
        }
    );
}

#[test]
fn duplicate_extension_number_in_registry_survives() {
    let mut pool = DefPool::new().unwrap();
    pool.add_file(&shop()).unwrap();
    let mut first = file("x1.proto", "x1");
    first
        .extension
        .push(extension("w", 150, FieldType::Int32, ".shop.Item"));
    pool.add_file(&first).unwrap();

    let mut second = file("x2.proto", "x2");
    second
        .extension
        .push(extension("w", 150, FieldType::Int32, ".shop.Item"));
    let err = pool.add_file(&second).unwrap_err();
    assert!(matches!(err, DefError::Layout { .. }), "{err:?}");

    let item = pool.find_message_by_name("shop.Item").unwrap();
    assert_eq!(
        pool.find_extension_by_number(item, 150),
        pool.find_extension_by_name("x1.w")
    );
    assert_eq!(pool.find_extension_by_name("x2.w"), None);
    assert_eq!(pool.get_all_extensions(item).len(), 1);
}

#[test]
fn default_rules() {
    let m = one_message(vec![with_default(
        typed("sub", 2, FieldType::Message, ".shop.Item"),
        "x",
    )]);
    assert_eq!(
        reject(m),
        DefError::MessageDefault {
            field: "bad.M.sub".into()
        }
    );

    assert_eq!(
        reject(one_message(vec![with_default(
            scalar("n", 2, FieldType::Int32),
            "abc"
        )])),
        DefError::InvalidDefault {
            value: "abc".into(),
            field: "bad.M.n".into(),
            field_type: FieldType::Int32
        }
    );

    let long = "1".repeat(64);
    assert_eq!(
        reject(one_message(vec![with_default(
            scalar("n", 2, FieldType::Int64),
            &long
        )])),
        DefError::DefaultTooLong { value: long }
    );

    assert!(matches!(
        reject(one_message(vec![with_default(
            typed("c", 2, FieldType::Enum, ".shop.Color"),
            "PURPLE"
        )])),
        DefError::InvalidDefault { field_type: FieldType::Enum, .. }
    ));
}

#[test]
fn precompiled_layout_count_mismatch() {
    let mut source = DefPool::new().unwrap();
    let id = source.add_file(&shop()).unwrap();
    let mut layout = source.file(id).mini_table_file(&source);
    layout.msgs.pop();

    let mut pool = DefPool::new().unwrap();
    let err = pool.add_file_with_layout(&shop(), &layout).unwrap_err();
    assert_eq!(
        err,
        DefError::LayoutCount {
            kind: "Message",
            expected: 3,
            found: 2
        }
    );
    assert_eq!(pool.file_count(), 0);
    assert!(pool.find_message_by_name("shop.Item").is_none());
}

#[test]
fn pool_creation_over_budget() {
    let config = PoolConfig {
        arena: ArenaConfig::with_limit(8),
        ..PoolConfig::default()
    };
    assert!(matches!(
        DefPool::with_config(config),
        Err(DefError::OutOfMemory(_))
    ));
}

#[test]
fn build_over_budget_rolls_back() {
    let config = PoolConfig {
        arena: ArenaConfig::with_limit(64 * 1024),
        ..PoolConfig::default()
    };
    let mut pool = DefPool::with_config(config).unwrap();
    pool.add_file(&wide("small.proto", "small", 2)).unwrap();
    let messages = pool.layouts().message_count();

    let err = pool.add_file(&wide("big.proto", "big", 2000)).unwrap_err();
    assert!(matches!(err, DefError::OutOfMemory(_)), "{err:?}");
    assert_eq!(pool.file_count(), 1);
    assert_eq!(pool.layouts().message_count(), messages);
    assert!(pool.find_message_by_name("small.M0").is_some());
    assert!(pool.find_message_by_name("big.M0").is_none());

    // Within budget again, the pool still accepts files.
    pool.add_file(&wide("next.proto", "next", 2)).unwrap();
    assert_eq!(pool.file_count(), 2);
}
