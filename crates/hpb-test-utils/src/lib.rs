//! Descriptor builders and fixture files for hpb development.
//!
//! The free functions build `descriptor.proto` messages with only the
//! fields a test cares about set; everything else stays `None` or empty,
//! the way `protoc` leaves unset fields. Canned multi-file schemas live in
//! [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use hpb_core::{FieldType, Label};
use hpb_descriptor::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, ExtensionRange,
    FieldDescriptorProto, FieldOptions, FileDescriptorProto, FileDescriptorSet, MessageOptions,
    MethodDescriptorProto, OneofDescriptorProto, Options, ServiceDescriptorProto,
};

/// A proto2 file.
pub fn file(name: &str, package: &str) -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(name.into()),
        package: (!package.is_empty()).then(|| package.into()),
        syntax: Some("proto2".into()),
        ..Default::default()
    }
}

/// A proto3 file.
pub fn proto3_file(name: &str, package: &str) -> FileDescriptorProto {
    FileDescriptorProto {
        syntax: Some("proto3".into()),
        ..file(name, package)
    }
}

/// Wrap files in a set, in the given order.
pub fn file_set(files: Vec<FileDescriptorProto>) -> FileDescriptorSet {
    FileDescriptorSet { file: files }
}

pub fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.into()),
        field: fields,
        ..Default::default()
    }
}

/// An optional scalar field.
pub fn scalar(name: &str, number: i32, ty: FieldType) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.into()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        ..Default::default()
    }
}

/// An optional message, group or enum field referring to `type_name`.
pub fn typed(name: &str, number: i32, ty: FieldType, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.into()),
        ..scalar(name, number, ty)
    }
}

/// A field whose type is left for resolution to decide, as some
/// generators emit.
pub fn untyped(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        r#type: None,
        ..typed(name, number, FieldType::Message, type_name)
    }
}

pub fn repeated(f: FieldDescriptorProto) -> FieldDescriptorProto {
    FieldDescriptorProto {
        label: Some(Label::Repeated as i32),
        ..f
    }
}

pub fn required(f: FieldDescriptorProto) -> FieldDescriptorProto {
    FieldDescriptorProto {
        label: Some(Label::Required as i32),
        ..f
    }
}

pub fn with_default(f: FieldDescriptorProto, default: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        default_value: Some(default.into()),
        ..f
    }
}

/// Set `[packed = ...]` explicitly.
pub fn packed(f: FieldDescriptorProto, packed: bool) -> FieldDescriptorProto {
    FieldDescriptorProto {
        options: Some(Options::from_message(FieldOptions {
            packed: Some(packed),
            ..Default::default()
        })),
        ..f
    }
}

/// Put `f` into the oneof at `index`.
pub fn in_oneof(f: FieldDescriptorProto, index: i32) -> FieldDescriptorProto {
    FieldDescriptorProto {
        oneof_index: Some(index),
        ..f
    }
}

/// A proto3 `optional` field: member of the synthetic oneof at `index`.
pub fn proto3_optional(f: FieldDescriptorProto, index: i32) -> FieldDescriptorProto {
    FieldDescriptorProto {
        proto3_optional: Some(true),
        ..in_oneof(f, index)
    }
}

pub fn oneof(name: &str) -> OneofDescriptorProto {
    OneofDescriptorProto {
        name: Some(name.into()),
        options: None,
    }
}

/// An extension of `extendee`.
pub fn extension(name: &str, number: i32, ty: FieldType, extendee: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        extendee: Some(extendee.into()),
        ..scalar(name, number, ty)
    }
}

pub fn extension_range(start: i32, end: i32) -> ExtensionRange {
    ExtensionRange {
        start: Some(start),
        end: Some(end),
        options: None,
    }
}

pub fn enum_type(name: &str, values: &[(&str, i32)]) -> EnumDescriptorProto {
    EnumDescriptorProto {
        name: Some(name.into()),
        value: values
            .iter()
            .map(|&(n, v)| EnumValueDescriptorProto {
                name: Some(n.into()),
                number: Some(v),
                options: None,
            })
            .collect(),
        ..Default::default()
    }
}

/// The synthetic entry message behind `map<key, value>`.
pub fn map_entry(name: &str, key: FieldType, value: FieldDescriptorProto) -> DescriptorProto {
    let value = FieldDescriptorProto {
        name: Some("value".into()),
        number: Some(2),
        ..value
    };
    DescriptorProto {
        options: Some(Options::from_message(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        })),
        ..message(name, vec![scalar("key", 1, key), value])
    }
}

/// A message using the message-set wire format, open to every extension
/// number.
pub fn message_set(name: &str) -> DescriptorProto {
    DescriptorProto {
        extension_range: vec![extension_range(4, i32::MAX)],
        options: Some(Options::from_message(MessageOptions {
            message_set_wire_format: Some(true),
            ..Default::default()
        })),
        ..message(name, Vec::new())
    }
}

/// A service; each method is `(name, input, output)`.
pub fn service(name: &str, methods: &[(&str, &str, &str)]) -> ServiceDescriptorProto {
    ServiceDescriptorProto {
        name: Some(name.into()),
        method: methods
            .iter()
            .map(|&(n, input, output)| MethodDescriptorProto {
                name: Some(n.into()),
                input_type: Some(input.into()),
                output_type: Some(output.into()),
                ..Default::default()
            })
            .collect(),
        options: None,
    }
}
