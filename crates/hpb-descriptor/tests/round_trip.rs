//! Whole-file encode/decode through the public API.

use hpb_descriptor::{
    DescriptorProto, EnumDescriptorProto, EnumOptions, EnumReservedRange,
    EnumValueDescriptorProto, ExtensionRange, FieldDescriptorProto, FieldOptions,
    FileDescriptorProto, FileDescriptorSet, Message, MethodDescriptorProto,
    OneofDescriptorProto, Options, ServiceDescriptorProto,
};

fn field(name: &str, number: i32, label: i32, ty: i32) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.into()),
        number: Some(number),
        label: Some(label),
        r#type: Some(ty),
        ..Default::default()
    }
}

fn service_file() -> FileDescriptorProto {
    let mut packed = field("ids", 4, 3, 5);
    packed.options = Some(Options::from_message(FieldOptions {
        packed: Some(true),
        ..Default::default()
    }));
    let mut choice = field("text", 5, 1, 9);
    choice.oneof_index = Some(0);
    let mut ext = field("tag", 100, 1, 9);
    ext.extendee = Some(".demo.Request".into());

    FileDescriptorProto {
        name: Some("demo/service.proto".into()),
        package: Some("demo".into()),
        message_type: vec![
            DescriptorProto {
                name: Some("Request".into()),
                field: vec![field("id", 1, 1, 3), packed, choice],
                oneof_decl: vec![OneofDescriptorProto {
                    name: Some("body".into()),
                    options: None,
                }],
                extension_range: vec![ExtensionRange {
                    start: Some(100),
                    end: Some(200),
                    options: None,
                }],
                ..Default::default()
            },
            DescriptorProto {
                name: Some("Reply".into()),
                ..Default::default()
            },
        ],
        enum_type: vec![EnumDescriptorProto {
            name: Some("Status".into()),
            value: vec![
                EnumValueDescriptorProto {
                    name: Some("OK".into()),
                    number: Some(0),
                    options: None,
                },
                EnumValueDescriptorProto {
                    name: Some("SUCCESS".into()),
                    number: Some(0),
                    options: None,
                },
            ],
            options: Some(Options::from_message(EnumOptions {
                allow_alias: Some(true),
                deprecated: None,
            })),
            reserved_range: vec![EnumReservedRange {
                start: Some(5),
                end: Some(9),
            }],
            reserved_name: vec!["OLD".into()],
        }],
        service: vec![ServiceDescriptorProto {
            name: Some("Api".into()),
            method: vec![MethodDescriptorProto {
                name: Some("Call".into()),
                input_type: Some(".demo.Request".into()),
                output_type: Some(".demo.Reply".into()),
                options: None,
                client_streaming: None,
                server_streaming: Some(true),
            }],
            options: None,
        }],
        extension: vec![ext],
        syntax: Some("proto2".into()),
        ..Default::default()
    }
}

#[test]
fn service_file_survives_round_trip() {
    let file = service_file();
    let back = FileDescriptorProto::decode(&file.encode_to_vec()).unwrap();
    assert_eq!(back, file);
    assert_eq!(back.service[0].method[0].server_streaming, Some(true));
    assert_eq!(back.extension[0].extendee.as_deref(), Some(".demo.Request"));
    let enum_opts = back.enum_type[0].options.as_ref().unwrap().get().unwrap();
    assert_eq!(enum_opts.allow_alias, Some(true));
}

#[test]
fn encoding_is_stable() {
    let once = service_file().encode_to_vec();
    let twice = FileDescriptorProto::decode(&once).unwrap().encode_to_vec();
    assert_eq!(once, twice);
}

#[test]
fn truncated_input_fails() {
    let bytes = service_file().encode_to_vec();
    for cut in [1, 5, bytes.len() - 1] {
        assert!(FileDescriptorProto::decode(&bytes[..cut]).is_err(), "cut at {cut}");
    }
}

#[test]
fn set_preserves_file_order() {
    let set = FileDescriptorSet {
        file: vec![
            FileDescriptorProto {
                name: Some("b.proto".into()),
                ..Default::default()
            },
            service_file(),
        ],
    };
    let back = FileDescriptorSet::decode(&set.encode_to_vec()).unwrap();
    let names: Vec<_> = back.file.iter().map(|f| f.name()).collect();
    assert_eq!(names, ["b.proto", "demo/service.proto"]);
}
