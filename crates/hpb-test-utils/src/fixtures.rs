//! Canned schemas.
//!
//! - [`shop`] is a proto2 file touching most features: nested types,
//!   enums with defaults, maps, oneofs, extension ranges, a service.
//! - [`shop_ext`] extends `shop.Item` from a second file.
//! - [`settings`] is proto3 with implicit presence and `optional` fields.
//! - [`chain`] is three files, each importing the previous one.
//! - [`wide`] generates a file with many messages for budget tests.

use hpb_core::FieldType;
use hpb_descriptor::{DescriptorProto, FileDescriptorProto};

use crate::*;

/// `shop.proto`, package `shop`.
///
/// ```text
/// enum Color { RED = 1; GREEN = 2; BLUE = 3; }
/// message Item {
///   required int64 id = 1;
///   optional string name = 2 [default = "unnamed"];
///   optional Color color = 3 [default = BLUE];
///   repeated Item children = 4;
///   map<string, int32> counts = 5;
///   oneof price { int64 cents = 6; string quote = 7; }
///   optional Kind kind = 8;
///   enum Kind { BOOK = 0; TOOL = 1; }
///   message Tag { optional string label = 1; }
///   repeated Tag tags = 9;
///   extensions 100 to 199;
/// }
/// service Store { rpc Get(Item) returns (Item); }
/// ```
pub fn shop() -> FileDescriptorProto {
    let mut item = message(
        "Item",
        vec![
            required(scalar("id", 1, FieldType::Int64)),
            with_default(scalar("name", 2, FieldType::String), "unnamed"),
            with_default(typed("color", 3, FieldType::Enum, ".shop.Color"), "BLUE"),
            repeated(typed("children", 4, FieldType::Message, ".shop.Item")),
            repeated(typed("counts", 5, FieldType::Message, ".shop.Item.CountsEntry")),
            in_oneof(scalar("cents", 6, FieldType::Int64), 0),
            in_oneof(scalar("quote", 7, FieldType::String), 0),
            typed("kind", 8, FieldType::Enum, "Kind"),
            repeated(typed("tags", 9, FieldType::Message, "Tag")),
        ],
    );
    item.oneof_decl.push(oneof("price"));
    item.enum_type
        .push(enum_type("Kind", &[("BOOK", 0), ("TOOL", 1)]));
    item.nested_type.push(map_entry(
        "CountsEntry",
        FieldType::String,
        scalar("value", 2, FieldType::Int32),
    ));
    item.nested_type.push(message(
        "Tag",
        vec![scalar("label", 1, FieldType::String)],
    ));
    item.extension_range.push(extension_range(100, 200));

    let mut f = file("shop.proto", "shop");
    f.enum_type
        .push(enum_type("Color", &[("RED", 1), ("GREEN", 2), ("BLUE", 3)]));
    f.message_type.push(item);
    f.service
        .push(service("Store", &[("Get", ".shop.Item", ".shop.Item")]));
    f
}

/// `shop_ext.proto`, package `shop.ext`, importing [`shop`].
///
/// ```text
/// extend shop.Item { optional int32 weight = 100; }
/// message Promo {
///   extend shop.Item { optional Promo promo = 101; }
///   optional string code = 1;
/// }
/// ```
pub fn shop_ext() -> FileDescriptorProto {
    let mut promo = message("Promo", vec![scalar("code", 1, FieldType::String)]);
    promo.extension.push(typed(
        "promo",
        101,
        FieldType::Message,
        ".shop.ext.Promo",
    ));
    promo.extension[0].extendee = Some(".shop.Item".into());

    let mut f = file("shop_ext.proto", "shop.ext");
    f.dependency.push("shop.proto".into());
    f.extension
        .push(extension("weight", 100, FieldType::Int32, ".shop.Item"));
    f.message_type.push(promo);
    f
}

/// `settings.proto`, proto3, package `cfg`.
///
/// ```text
/// enum Mode { MODE_UNSPECIFIED = 0; FAST = 1; }
/// message Settings {
///   int32 level = 1;
///   optional string owner = 2;
///   repeated int32 ports = 3;
///   Mode mode = 4;
/// }
/// ```
pub fn settings() -> FileDescriptorProto {
    let mut s = message(
        "Settings",
        vec![
            scalar("level", 1, FieldType::Int32),
            proto3_optional(scalar("owner", 2, FieldType::String), 0),
            repeated(scalar("ports", 3, FieldType::Int32)),
            typed("mode", 4, FieldType::Enum, ".cfg.Mode"),
        ],
    );
    s.oneof_decl.push(oneof("_owner"));

    let mut f = proto3_file("settings.proto", "cfg");
    f.enum_type
        .push(enum_type("Mode", &[("MODE_UNSPECIFIED", 0), ("FAST", 1)]));
    f.message_type.push(s);
    f
}

/// `a.proto` ← `b.proto` ← `c.proto`, returned in dependency order. Each
/// declares one message holding a field of the previous file's message.
pub fn chain() -> Vec<FileDescriptorProto> {
    let mut a = file("a.proto", "chain");
    a.message_type
        .push(message("A", vec![scalar("x", 1, FieldType::Int32)]));

    let mut b = file("b.proto", "chain");
    b.dependency.push("a.proto".into());
    b.message_type.push(message(
        "B",
        vec![typed("a", 1, FieldType::Message, "A")],
    ));

    let mut c = file("c.proto", "chain");
    c.dependency.push("b.proto".into());
    c.message_type.push(message(
        "C",
        vec![typed("b", 1, FieldType::Message, "B")],
    ));
    vec![a, b, c]
}

/// A file with `count` top-level messages `M0..` in `package`, each with a
/// few scalar fields.
pub fn wide(name: &str, package: &str, count: usize) -> FileDescriptorProto {
    let mut f = file(name, package);
    f.message_type = (0..count).map(wide_message).collect();
    f
}

fn wide_message(i: usize) -> DescriptorProto {
    message(
        &format!("M{i}"),
        vec![
            scalar("a", 1, FieldType::Int32),
            scalar("b", 2, FieldType::String),
            repeated(scalar("c", 3, FieldType::Double)),
        ],
    )
}
