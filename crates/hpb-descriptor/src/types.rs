//! `google/protobuf/descriptor.proto` as plain structs.
//!
//! Scalar fields that proto2 tracks presence for are `Option`s. Label and
//! type fields stay raw `i32` so the def layer can report out-of-range
//! values instead of losing them here.

use crate::options::{
    EnumOptions, EnumValueOptions, ExtensionRangeOptions, FieldOptions, FileOptions,
    MessageOptions, MethodOptions, OneofOptions, Options, ServiceOptions,
};

/// A set of files, as produced by `protoc --descriptor_set_out`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FileDescriptorSet {
    /// `file` (1).
    pub file: Vec<FileDescriptorProto>,
}

/// One `.proto` file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FileDescriptorProto {
    /// `name` (1).
    pub name: Option<String>,
    /// `package` (2).
    pub package: Option<String>,
    /// `dependency` (3).
    pub dependency: Vec<String>,
    /// `public_dependency` (10): indices into `dependency`.
    pub public_dependency: Vec<i32>,
    /// `weak_dependency` (11): indices into `dependency`.
    pub weak_dependency: Vec<i32>,
    /// `message_type` (4).
    pub message_type: Vec<DescriptorProto>,
    /// `enum_type` (5).
    pub enum_type: Vec<EnumDescriptorProto>,
    /// `service` (6).
    pub service: Vec<ServiceDescriptorProto>,
    /// `extension` (7).
    pub extension: Vec<FieldDescriptorProto>,
    /// `options` (8).
    pub options: Option<Options<FileOptions>>,
    /// `syntax` (12).
    pub syntax: Option<String>,
    /// `edition` (14).
    pub edition: Option<i32>,
}

/// A message type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DescriptorProto {
    /// `name` (1).
    pub name: Option<String>,
    /// `field` (2).
    pub field: Vec<FieldDescriptorProto>,
    /// `extension` (6).
    pub extension: Vec<FieldDescriptorProto>,
    /// `nested_type` (3).
    pub nested_type: Vec<DescriptorProto>,
    /// `enum_type` (4).
    pub enum_type: Vec<EnumDescriptorProto>,
    /// `extension_range` (5).
    pub extension_range: Vec<ExtensionRange>,
    /// `oneof_decl` (8).
    pub oneof_decl: Vec<OneofDescriptorProto>,
    /// `options` (7).
    pub options: Option<Options<MessageOptions>>,
    /// `reserved_range` (9).
    pub reserved_range: Vec<ReservedRange>,
    /// `reserved_name` (10).
    pub reserved_name: Vec<String>,
}

/// `DescriptorProto.ExtensionRange`. `end` is exclusive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtensionRange {
    /// `start` (1).
    pub start: Option<i32>,
    /// `end` (2).
    pub end: Option<i32>,
    /// `options` (3).
    pub options: Option<Options<ExtensionRangeOptions>>,
}

/// `DescriptorProto.ReservedRange`. `end` is exclusive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReservedRange {
    /// `start` (1).
    pub start: Option<i32>,
    /// `end` (2).
    pub end: Option<i32>,
}

/// A field or extension.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldDescriptorProto {
    /// `name` (1).
    pub name: Option<String>,
    /// `number` (3).
    pub number: Option<i32>,
    /// `label` (4).
    pub label: Option<i32>,
    /// `type` (5).
    pub r#type: Option<i32>,
    /// `type_name` (6).
    pub type_name: Option<String>,
    /// `extendee` (2).
    pub extendee: Option<String>,
    /// `default_value` (7).
    pub default_value: Option<String>,
    /// `oneof_index` (9).
    pub oneof_index: Option<i32>,
    /// `json_name` (10).
    pub json_name: Option<String>,
    /// `options` (8).
    pub options: Option<Options<FieldOptions>>,
    /// `proto3_optional` (17).
    pub proto3_optional: Option<bool>,
}

/// A oneof declaration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OneofDescriptorProto {
    /// `name` (1).
    pub name: Option<String>,
    /// `options` (2).
    pub options: Option<Options<OneofOptions>>,
}

/// An enum type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnumDescriptorProto {
    /// `name` (1).
    pub name: Option<String>,
    /// `value` (2).
    pub value: Vec<EnumValueDescriptorProto>,
    /// `options` (3).
    pub options: Option<Options<EnumOptions>>,
    /// `reserved_range` (4).
    pub reserved_range: Vec<EnumReservedRange>,
    /// `reserved_name` (5).
    pub reserved_name: Vec<String>,
}

/// `EnumDescriptorProto.EnumReservedRange`. `end` is inclusive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnumReservedRange {
    /// `start` (1).
    pub start: Option<i32>,
    /// `end` (2).
    pub end: Option<i32>,
}

/// One enum value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnumValueDescriptorProto {
    /// `name` (1).
    pub name: Option<String>,
    /// `number` (2).
    pub number: Option<i32>,
    /// `options` (3).
    pub options: Option<Options<EnumValueOptions>>,
}

/// A service.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServiceDescriptorProto {
    /// `name` (1).
    pub name: Option<String>,
    /// `method` (2).
    pub method: Vec<MethodDescriptorProto>,
    /// `options` (3).
    pub options: Option<Options<ServiceOptions>>,
}

/// One service method.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MethodDescriptorProto {
    /// `name` (1).
    pub name: Option<String>,
    /// `input_type` (2).
    pub input_type: Option<String>,
    /// `output_type` (3).
    pub output_type: Option<String>,
    /// `options` (4).
    pub options: Option<Options<MethodOptions>>,
    /// `client_streaming` (5).
    pub client_streaming: Option<bool>,
    /// `server_streaming` (6).
    pub server_streaming: Option<bool>,
}

impl FileDescriptorProto {
    /// `name`, or `""`.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// `package`, or `""`.
    pub fn package(&self) -> &str {
        self.package.as_deref().unwrap_or("")
    }
}

impl DescriptorProto {
    /// `name`, or `""`.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

impl FieldDescriptorProto {
    /// `name`, or `""`.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

impl EnumDescriptorProto {
    /// `name`, or `""`.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}
