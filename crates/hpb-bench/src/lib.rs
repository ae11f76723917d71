//! Benchmark profiles for the hpb schema runtime.
//!
//! Provides seeded, reproducible inputs:
//!
//! - [`reference_schema`]: one proto2 file with 100 cross-linked messages
//! - [`stress_schema`]: the same shape at 2000 messages
//! - [`random_schema`]: the generator behind both
//! - [`symbol_keys`]: dotted names for table benchmarks

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use hpb_core::{FieldType, Label};
use hpb_descriptor::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto,
};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

const PACKAGE: &str = "bench";

const SCALARS: [FieldType; 13] = [
    FieldType::Double,
    FieldType::Float,
    FieldType::Int64,
    FieldType::UInt64,
    FieldType::Int32,
    FieldType::Fixed64,
    FieldType::Fixed32,
    FieldType::Bool,
    FieldType::String,
    FieldType::Bytes,
    FieldType::UInt32,
    FieldType::SInt32,
    FieldType::SInt64,
];

/// `bench.proto` with 100 messages.
pub fn reference_schema(seed: u64) -> FileDescriptorProto {
    random_schema(seed, 100)
}

/// `bench.proto` with 2000 messages.
pub fn stress_schema(seed: u64) -> FileDescriptorProto {
    random_schema(seed, 2000)
}

/// A proto2 file in package `bench` holding the enum `Level` and messages
/// `M0..M{count}`.
///
/// Each message has 1 to 16 fields with increasing, gapped numbers. About
/// one field in eight is an enum field, one in eight refers to an earlier
/// message (or itself), and one in four is repeated. Equal seeds give
/// equal files.
pub fn random_schema(seed: u64, count: usize) -> FileDescriptorProto {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let messages = (0..count).map(|i| random_message(&mut rng, i)).collect();
    FileDescriptorProto {
        name: Some("bench.proto".into()),
        package: Some(PACKAGE.into()),
        message_type: messages,
        enum_type: vec![level_enum()],
        ..Default::default()
    }
}

fn random_message(rng: &mut ChaCha8Rng, index: usize) -> DescriptorProto {
    let field_count = 1 + rng.next_u32() % 16;
    let mut number = 0;
    let field = (0..field_count)
        .map(|f| {
            number += 1 + (rng.next_u32() % 40) as i32;
            let (ty, type_name) = match rng.next_u32() % 8 {
                0 => (FieldType::Enum, Some(format!(".{PACKAGE}.Level"))),
                1 => {
                    let target = rng.next_u32() as usize % (index + 1);
                    (FieldType::Message, Some(format!(".{PACKAGE}.M{target}")))
                }
                _ => (SCALARS[rng.next_u32() as usize % SCALARS.len()], None),
            };
            let label = if rng.next_u32() % 4 == 0 {
                Label::Repeated
            } else {
                Label::Optional
            };
            FieldDescriptorProto {
                name: Some(format!("f{f}")),
                number: Some(number),
                label: Some(label as i32),
                r#type: Some(ty as i32),
                type_name,
                ..Default::default()
            }
        })
        .collect();
    DescriptorProto {
        name: Some(format!("M{index}")),
        field,
        ..Default::default()
    }
}

fn level_enum() -> EnumDescriptorProto {
    EnumDescriptorProto {
        name: Some("Level".into()),
        value: ["LOW", "MID", "HIGH"]
            .iter()
            .zip(0..)
            .map(|(name, number)| EnumValueDescriptorProto {
                name: Some((*name).into()),
                number: Some(number),
                options: None,
            })
            .collect(),
        ..Default::default()
    }
}

/// `count` distinct dotted names shaped like fully qualified symbols, in
/// random order.
pub fn symbol_keys(seed: u64, count: usize) -> Vec<Vec<u8>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut keys: Vec<Vec<u8>> = (0..count)
        .map(|i| format!("pkg{}.Message{i}.field_{}", i % 17, rng.next_u32() % 1000).into_bytes())
        .collect();
    for i in (1..keys.len()).rev() {
        let j = rng.next_u64() as usize % (i + 1);
        keys.swap(i, j);
    }
    keys
}
