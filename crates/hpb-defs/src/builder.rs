//! Turns one `FileDescriptorProto` into defs.
//!
//! A build runs in five phases over a single file:
//!
//! 1. create every def, interning full names into the pool's symbol table
//!    and building each message's member tables;
//! 2. check per-message structure (oneofs, ranges) as each message closes;
//! 3. resolve type names, extendees and defaults;
//! 4. compile layouts, or adopt precompiled ones;
//! 5. link sub-tables and register extension layouts.
//!
//! Phases 1 and 2 interleave: a message is checked as soon as its own
//! members exist, before its nested types are created. Any error aborts the
//! build; [`DefPool`] then rolls the pool back to its state before the
//! call.

use std::mem;

use hpb_arena::Arena;
use hpb_core::{CType, FieldType, Label, MessageValue, Syntax};
use hpb_descriptor::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    ServiceDescriptorProto,
};
use hpb_mini::{
    MiniTable, MiniTableEnum, MiniTableEnumId, MiniTableExtension, MiniTableExtensionId,
    MiniTableFile, MiniTableId, MiniTableSub,
};
use hpb_table::{IntTable, StrTable};
use tracing::trace;

use crate::default::{parse_default, DefaultError};
use crate::enum_def::{value_key, EnumDef, EnumReservedRange, EnumValueDef};
use crate::error::DefError;
use crate::field::{FieldDef, SubDef};
use crate::file::FileDef;
use crate::id::{EnumId, EnumValueId, FieldId, FileId, MessageId, MethodId, OneofId, ServiceId, PENDING};
use crate::message::{ExtensionRange, MessageDef, ReservedRange, MAX_FIELD_NUMBER};
use crate::names;
use crate::oneof::OneofDef;
use crate::pool::{DefPool, PoolMark};
use crate::service::{MethodDef, ServiceDef};
use crate::symbol::{DefRef, Member};
use crate::well_known::WellKnownType;

/// Exclusive upper bound of ranges in ordinary messages, `2^29`.
const RANGE_LIMIT: i32 = MAX_FIELD_NUMBER as i32 + 1;

pub(crate) struct Builder<'p, 'a> {
    pool: &'p mut DefPool,
    arena: &'a Arena,
    layout: Option<&'a MiniTableFile>,
    mark: PoolMark,
    file: FileId,
    syntax: Syntax,
    first_msg_layout: u32,
    first_enum_layout: u32,
    next_msg_layout: u32,
    next_enum_layout: u32,
    next_ext_layout: u32,
}

impl<'p, 'a> Builder<'p, 'a> {
    pub(crate) fn new(
        pool: &'p mut DefPool,
        arena: &'a Arena,
        layout: Option<&'a MiniTableFile>,
    ) -> Self {
        let mark = pool.mark();
        let msgs = pool.layouts.message_count() as u32;
        let enums = pool.layouts.enum_count() as u32;
        Self {
            first_msg_layout: msgs,
            first_enum_layout: enums,
            next_msg_layout: msgs,
            next_enum_layout: enums,
            next_ext_layout: pool.layouts.extension_count() as u32,
            file: FileId(mark.files as u32),
            pool,
            arena,
            layout,
            mark,
            syntax: Syntax::Proto2,
        }
    }

    pub(crate) fn build(mut self, proto: &FileDescriptorProto) -> Result<FileId, DefError> {
        let name = self.check_file(proto)?;
        trace!(file = %name, "create");
        self.create_file_defs(proto)?;

        trace!(file = %name, "resolve");
        let messages = self.pool.files[self.file.index()].messages.clone();
        for (&m, mp) in messages.iter().zip(&proto.message_type) {
            self.resolve_message(m, mp)?;
        }
        let exts = self.pool.files[self.file.index()].extensions.clone();
        for (&f, fp) in exts.iter().zip(&proto.extension) {
            self.resolve_field(f, fp)?;
        }
        self.resolve_methods(proto)?;

        trace!(file = %name, "layout");
        self.assign_layout_indices();
        let mut scratch = mem::take(&mut self.pool.scratch);
        let linked = self.build_layouts(&mut scratch).and_then(|()| {
            trace!(file = %name, "link");
            self.link_messages()?;
            self.build_extensions(&mut scratch)
        });
        scratch.clear();
        self.pool.scratch = scratch;
        linked?;
        self.finish(&name)?;
        Ok(self.file)
    }

    // ── Phase 1: files, symbols, member tables ─────────────────────

    /// Validate the file header and push an empty [`FileDef`]. Returns
    /// the file name.
    fn check_file(&mut self, proto: &FileDescriptorProto) -> Result<String, DefError> {
        let name = proto
            .name
            .as_deref()
            .ok_or(DefError::MissingName { kind: "file" })?;
        if name.contains('\0') {
            return Err(DefError::FileNameNul);
        }
        if self.pool.find_file_by_name(name).is_some() {
            return Err(DefError::DuplicateFile {
                name: name.to_owned(),
            });
        }
        let package = proto.package.as_deref().unwrap_or("");
        if !package.is_empty() {
            names::check_full_ident(package)?;
        }
        self.syntax =
            Syntax::parse(proto.syntax.as_deref()).map_err(|_| DefError::InvalidSyntax {
                value: proto.syntax.clone().unwrap_or_default(),
            })?;

        let deps = proto
            .dependency
            .iter()
            .map(|d| {
                self.pool
                    .find_file_by_name(d)
                    .ok_or_else(|| DefError::MissingDependency { name: d.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let pick = |kind: &'static str, indices: &[i32]| {
            indices
                .iter()
                .map(|&i| {
                    usize::try_from(i)
                        .ok()
                        .and_then(|i| deps.get(i).copied())
                        .ok_or(DefError::DependencyIndex { kind, index: i })
                })
                .collect::<Result<Vec<_>, _>>()
        };
        let public_deps = pick("public_dep", &proto.public_dependency)?;
        let weak_deps = pick("weak_dep", &proto.weak_dependency)?;

        if let Some(layout) = self.layout {
            let ext_count = proto.extension.len() + nested_extension_count(&proto.message_type);
            let msg_count = message_count(&proto.message_type);
            let enum_count = if self.syntax == Syntax::Proto2 {
                proto.enum_type.len() + nested_enum_count(&proto.message_type)
            } else {
                0
            };
            for (kind, found, expected) in [
                ("Extension", layout.exts.len(), ext_count),
                ("Message", layout.msgs.len(), msg_count),
                ("Enum", layout.enums.len(), enum_count),
            ] {
                if found != expected {
                    return Err(DefError::LayoutCount {
                        kind,
                        expected,
                        found,
                    });
                }
            }
        }

        let edition = proto.edition;
        self.pool.files.push(FileDef {
            name: name.to_owned(),
            package: package.to_owned(),
            syntax: self.syntax,
            edition,
            deps,
            public_deps,
            weak_deps,
            messages: Vec::new(),
            enums: Vec::new(),
            extensions: Vec::new(),
            services: Vec::new(),
            options: proto.options.clone(),
            layout_msgs: 0..0,
            layout_enums: 0..0,
            layout_exts: 0..0,
        });
        Ok(name.to_owned())
    }

    fn file_mut(&mut self) -> &mut FileDef {
        &mut self.pool.files[self.file.index()]
    }

    fn package(&self) -> String {
        self.pool.files[self.file.index()].package.clone()
    }

    fn create_file_defs(&mut self, proto: &FileDescriptorProto) -> Result<(), DefError> {
        let package = self.package();
        for ep in &proto.enum_type {
            let id = self.create_enum(ep, &package, None)?;
            self.file_mut().enums.push(id);
        }
        for (i, fp) in proto.extension.iter().enumerate() {
            let id = self.create_field(fp, &package, None, true, i)?;
            self.file_mut().extensions.push(id);
        }
        for mp in &proto.message_type {
            let id = self.create_message(mp, &package, None)?;
            self.file_mut().messages.push(id);
        }
        for (i, sp) in proto.service.iter().enumerate() {
            let id = self.create_service(sp, &package, i)?;
            self.file_mut().services.push(id);
        }
        Ok(())
    }

    fn add_symbol(&mut self, name: &str, r: DefRef) -> Result<(), DefError> {
        if self.pool.symbols.lookup(name.as_bytes()).is_some() {
            return Err(DefError::DuplicateSymbol {
                name: name.to_owned(),
            });
        }
        self.pool
            .symbols
            .insert(name.as_bytes(), r.pack(), self.arena)?;
        trace!(symbol = name, kind = r.kind(), "symbol added");
        Ok(())
    }

    fn create_enum(
        &mut self,
        proto: &EnumDescriptorProto,
        prefix: &str,
        containing: Option<MessageId>,
    ) -> Result<EnumId, DefError> {
        let arena = self.arena;
        let short = proto
            .name
            .as_deref()
            .ok_or(DefError::MissingName { kind: "enum" })?;
        names::check_ident(short)?;
        let full_name = names::join(prefix, short);
        let id = EnumId(self.pool.enums.len() as u32);
        self.add_symbol(&full_name, DefRef::Enum(id))?;

        if self.syntax == Syntax::Proto3
            && proto.value.first().is_some_and(|v| v.number.unwrap_or(0) != 0)
        {
            return Err(DefError::Proto3EnumZero { name: full_name });
        }
        if proto.value.is_empty() {
            return Err(DefError::EmptyEnum { name: full_name });
        }

        let mut ntoi = StrTable::new(proto.value.len(), arena)?;
        let mut iton = IntTable::new(arena)?;
        let mut values = Vec::with_capacity(proto.value.len());
        for (i, vp) in proto.value.iter().enumerate() {
            let vshort = vp
                .name
                .as_deref()
                .ok_or(DefError::MissingName { kind: "enum value" })?;
            names::check_ident(vshort)?;
            // Values are siblings of their enum, not children.
            let vfull = names::join(prefix, vshort);
            let vid = EnumValueId(self.pool.enum_values.len() as u32);
            self.add_symbol(&vfull, DefRef::EnumValue(vid))?;
            let number = vp.number.unwrap_or(0);
            ntoi.insert(vshort.as_bytes(), u64::from(vid.0), arena)?;
            if iton.lookup(value_key(number)).is_none() {
                iton.insert(value_key(number), u64::from(vid.0), arena)?;
            }
            self.pool.enum_values.push(EnumValueDef {
                full_name: vfull,
                number,
                parent: id,
                index: i as u32,
                options: vp.options.clone(),
            });
            values.push(vid);
        }
        iton.compact(arena)?;

        let mut reserved_ranges = Vec::with_capacity(proto.reserved_range.len());
        for r in &proto.reserved_range {
            let (start, end) = (r.start.unwrap_or(0), r.end.unwrap_or(0));
            if end < start {
                return Err(DefError::EnumReservedRange {
                    start,
                    end,
                    name: full_name,
                });
            }
            reserved_ranges.push(EnumReservedRange { start, end });
        }

        let is_closed = self.syntax == Syntax::Proto2;
        let layout = if is_closed {
            let id = MiniTableEnumId(self.next_enum_layout);
            self.next_enum_layout += 1;
            Some(id)
        } else {
            None
        };
        let default = proto.value[0].number.unwrap_or(0);
        trace!(name = %full_name, values = values.len(), closed = is_closed, "enum created");
        self.pool.enums.push(EnumDef {
            full_name,
            file: self.file,
            containing_type: containing,
            values,
            ntoi,
            iton,
            default,
            is_closed,
            reserved_ranges,
            reserved_names: proto.reserved_name.clone(),
            layout,
            options: proto.options.clone(),
        });
        Ok(id)
    }

    fn create_message(
        &mut self,
        proto: &DescriptorProto,
        prefix: &str,
        containing: Option<MessageId>,
    ) -> Result<MessageId, DefError> {
        let arena = self.arena;
        let short = proto
            .name
            .as_deref()
            .ok_or(DefError::MissingName { kind: "message" })?;
        names::check_ident(short)?;
        let full_name = names::join(prefix, short);
        let id = MessageId(self.pool.messages.len() as u32);
        self.add_symbol(&full_name, DefRef::Message(id))?;

        let opts = proto.options.as_ref().map(|o| o.get()).transpose()?;
        let is_map_entry = opts.and_then(|o| o.map_entry).unwrap_or(false);
        let is_message_set = opts.and_then(|o| o.message_set_wire_format).unwrap_or(false);

        let layout = MiniTableId(self.next_msg_layout);
        self.next_msg_layout += 1;
        self.pool.messages.push(MessageDef {
            well_known_type: WellKnownType::from_full_name(&full_name),
            full_name: full_name.clone(),
            file: self.file,
            containing_type: containing,
            fields: Vec::with_capacity(proto.field.len()),
            oneofs: Vec::with_capacity(proto.oneof_decl.len()),
            real_oneof_count: 0,
            nested_messages: Vec::new(),
            nested_enums: Vec::new(),
            nested_extensions: Vec::new(),
            extension_ranges: Vec::new(),
            reserved_ranges: Vec::new(),
            reserved_names: proto.reserved_name.clone(),
            itof: IntTable::new(arena)?,
            ntof: StrTable::new(2 * proto.field.len() + proto.oneof_decl.len(), arena)?,
            is_map_entry,
            is_message_set,
            in_message_set: false,
            layout,
            options: proto.options.clone(),
        });

        for (i, op) in proto.oneof_decl.iter().enumerate() {
            let oshort = op
                .name
                .as_deref()
                .ok_or(DefError::MissingName { kind: "oneof" })?;
            names::check_ident(oshort)?;
            let ofull = names::join(&full_name, oshort);
            let oid = OneofId(self.pool.oneofs.len() as u32);
            let members = proto
                .field
                .iter()
                .filter(|f| f.oneof_index == Some(i as i32))
                .count();
            let m = &mut self.pool.messages[id.index()];
            if m.ntof.lookup(oshort.as_bytes()).is_some() {
                return Err(DefError::DuplicateOneofName { name: ofull });
            }
            m.ntof
                .insert(oshort.as_bytes(), Member::Oneof(oid).pack(), arena)?;
            m.oneofs.push(oid);
            self.pool.oneofs.push(OneofDef {
                full_name: ofull,
                containing_type: id,
                index: i as u32,
                fields: Vec::with_capacity(members),
                synthetic: false,
                itof: IntTable::new(arena)?,
                ntof: StrTable::new(members, arena)?,
                options: op.options.clone(),
            });
        }

        for (i, fp) in proto.field.iter().enumerate() {
            let fid = self.create_field(fp, &full_name, Some(id), false, i)?;
            self.pool.messages[id.index()].fields.push(fid);
        }

        self.check_message(id, proto)?;

        for ep in &proto.enum_type {
            let eid = self.create_enum(ep, &full_name, Some(id))?;
            self.pool.messages[id.index()].nested_enums.push(eid);
        }
        for (i, xp) in proto.extension.iter().enumerate() {
            let fid = self.create_field(xp, &full_name, Some(id), true, i)?;
            self.pool.messages[id.index()].nested_extensions.push(fid);
        }
        for np in &proto.nested_type {
            let nid = self.create_message(np, &full_name, Some(id))?;
            self.pool.messages[id.index()].nested_messages.push(nid);
        }
        Ok(id)
    }

    fn create_field(
        &mut self,
        proto: &FieldDescriptorProto,
        prefix: &str,
        msg: Option<MessageId>,
        is_extension: bool,
        index: usize,
    ) -> Result<FieldId, DefError> {
        let arena = self.arena;
        let short = proto
            .name
            .as_deref()
            .ok_or(DefError::MissingName { kind: "field" })?;
        names::check_ident(short)?;
        let full_name = names::join(prefix, short);
        let id = FieldId(self.pool.fields.len() as u32);
        let has_json_name = proto.json_name.is_some();
        let json_name = proto
            .json_name
            .clone()
            .unwrap_or_else(|| names::json_name(short));

        let declared = match proto.r#type {
            Some(raw) => {
                let t = FieldType::from_i32(raw).ok_or_else(|| DefError::InvalidFieldType {
                    field: full_name.clone(),
                    value: raw,
                })?;
                let needs_name = matches!(t, FieldType::Message | FieldType::Group | FieldType::Enum);
                match (needs_name, proto.type_name.is_some()) {
                    (true, false) => {
                        return Err(DefError::MissingTypeName {
                            field: full_name,
                            field_type: t,
                        })
                    }
                    (false, true) => {
                        return Err(DefError::UnexpectedTypeName {
                            field: full_name,
                            field_type: t,
                        })
                    }
                    _ => Some(t),
                }
            }
            None if proto.type_name.is_some() => None,
            None => {
                return Err(DefError::InvalidFieldType {
                    field: full_name,
                    value: 0,
                })
            }
        };

        let label = match proto.label {
            None => Label::Optional,
            Some(raw) => Label::from_i32(raw).ok_or_else(|| DefError::InvalidLabel {
                field: full_name.clone(),
                value: raw,
            })?,
        };
        if label == Label::Required && self.syntax == Syntax::Proto3 {
            return Err(DefError::Proto3Required { field: full_name });
        }

        let number_raw = proto.number.unwrap_or(0);
        let mut oneof = None;
        if let Some(oneof_index) = proto.oneof_index {
            if is_extension {
                return Err(DefError::ExtensionInOneof { field: full_name });
            }
            if label != Label::Optional {
                return Err(DefError::OneofLabel { field: full_name });
            }
            let oid = msg
                .and_then(|m| {
                    let m = &self.pool.messages[m.index()];
                    usize::try_from(oneof_index)
                        .ok()
                        .and_then(|i| m.oneofs.get(i).copied())
                })
                .ok_or_else(|| DefError::OneofIndex {
                    field: full_name.clone(),
                    index: oneof_index,
                })?;
            let o = &mut self.pool.oneofs[oid.index()];
            let key = u64::from(number_raw as u32);
            if o.ntof.lookup(short.as_bytes()).is_some() || o.itof.lookup(key).is_some() {
                return Err(DefError::DuplicateOneofField {
                    oneof: o.full_name.clone(),
                    field: short.to_owned(),
                });
            }
            o.ntof.insert(short.as_bytes(), u64::from(id.0), arena)?;
            o.itof.insert(key, u64::from(id.0), arena)?;
            o.fields.push(id);
            oneof = Some(oid);
        }

        let packed_option = proto
            .options
            .as_ref()
            .map(|o| o.get())
            .transpose()?
            .and_then(|o| o.packed);
        let is_packed = packed_option.unwrap_or_else(|| {
            declared.is_some_and(|t| t.is_packable())
                && label == Label::Repeated
                && self.syntax == Syntax::Proto3
        });
        let has_presence = self.presence(label, declared, oneof.is_some());
        let proto3_optional = proto.proto3_optional.unwrap_or(false);

        let mut layout_ext = None;
        let mut layout_index = index as u32;
        if is_extension {
            self.add_symbol(&full_name, DefRef::Extension(id))?;
            layout_ext = Some(MiniTableExtensionId(self.next_ext_layout));
            layout_index = self.next_ext_layout - self.mark.ext_layouts as u32;
            self.next_ext_layout += 1;
        } else {
            if proto3_optional && oneof.is_none() {
                return Err(DefError::Proto3OptionalOutsideOneof { field: full_name });
            }
            // Unreachable for `None`: only extensions are created without a message.
            if let Some(m) = msg {
                self.insert_field(m, id, short, &json_name, number_raw, &full_name)?;
            }
        }
        if let (Some(oid), true) = (oneof, proto3_optional) {
            self.pool.oneofs[oid.index()].synthetic = true;
        }

        let field_type = declared.unwrap_or(FieldType::Message);
        self.pool.fields.push(FieldDef {
            default: MessageValue::zero(field_type.ctype()),
            full_name,
            json_name,
            has_json_name,
            number: number_raw as u32,
            index: index as u32,
            layout_index,
            label,
            field_type,
            file: self.file,
            is_extension,
            is_packed,
            has_presence,
            proto3_optional,
            containing_type: if is_extension {
                MessageId(PENDING)
            } else {
                msg.unwrap_or(MessageId(PENDING))
            },
            extension_scope: if is_extension { msg } else { None },
            oneof,
            sub: None,
            closed_enum: false,
            is_map: false,
            has_default: false,
            layout_ext,
            options: proto.options.clone(),
        });
        Ok(id)
    }

    fn presence(&self, label: Label, declared: Option<FieldType>, in_oneof: bool) -> bool {
        label != Label::Repeated
            && (matches!(declared, Some(FieldType::Message | FieldType::Group))
                || in_oneof
                || self.syntax == Syntax::Proto2)
    }

    fn insert_field(
        &mut self,
        msg: MessageId,
        id: FieldId,
        short: &str,
        json_name: &str,
        number: i32,
        full_name: &str,
    ) -> Result<(), DefError> {
        let arena = self.arena;
        let number = u32::try_from(number)
            .ok()
            .filter(|n| (1..=MAX_FIELD_NUMBER).contains(n))
            .ok_or_else(|| DefError::FieldNumber {
                field: full_name.to_owned(),
                number,
            })?;
        let m = &mut self.pool.messages[msg.index()];
        if m.ntof.lookup(short.as_bytes()).is_some() {
            return Err(DefError::DuplicateFieldName {
                name: short.to_owned(),
            });
        }
        m.ntof
            .insert(short.as_bytes(), Member::Field(id).pack(), arena)?;
        if short != json_name {
            if m.ntof.lookup(json_name.as_bytes()).is_some() {
                return Err(DefError::DuplicateJsonName {
                    name: json_name.to_owned(),
                });
            }
            m.ntof
                .insert(json_name.as_bytes(), Member::JsonName(id).pack(), arena)?;
        }
        if m.itof.lookup(u64::from(number)).is_some() {
            return Err(DefError::DuplicateFieldNumber { number });
        }
        m.itof.insert(u64::from(number), u64::from(id.0), arena)?;
        Ok(())
    }

    // ── Phase 2: per-message structure ─────────────────────────────

    fn check_message(&mut self, id: MessageId, proto: &DescriptorProto) -> Result<(), DefError> {
        let arena = self.arena;
        let pool = &mut *self.pool;
        let m = &mut pool.messages[id.index()];

        if m.is_message_set && !m.fields.is_empty() {
            return Err(DefError::MessageSetFields {
                message: m.full_name.clone(),
            });
        }
        if m.is_map_entry && m.fields.len() != 2 {
            return Err(DefError::MapEntryFields {
                message: m.full_name.clone(),
                count: m.fields.len(),
            });
        }

        let ext_limit = if m.is_message_set { i32::MAX } else { RANGE_LIMIT };
        for r in &proto.extension_range {
            let (start, end) = (r.start.unwrap_or(0), r.end.unwrap_or(0));
            if start < 1 || end <= start || end > ext_limit {
                return Err(DefError::ExtensionRange {
                    start,
                    end,
                    message: m.full_name.clone(),
                });
            }
            m.extension_ranges.push(ExtensionRange {
                start,
                end,
                options: r.options.clone(),
            });
        }
        for r in &proto.reserved_range {
            let (start, end) = (r.start.unwrap_or(0), r.end.unwrap_or(0));
            if start < 1 || end <= start || end > RANGE_LIMIT {
                return Err(DefError::ReservedRange {
                    start,
                    end,
                    message: m.full_name.clone(),
                });
            }
            m.reserved_ranges.push(ReservedRange { start, end });
        }

        let mut synthetic_seen = false;
        let mut real = 0;
        for &oid in &m.oneofs {
            let o = &mut pool.oneofs[oid.index()];
            if o.synthetic {
                if o.fields.len() != 1 {
                    return Err(DefError::SyntheticOneofSize {
                        oneof: o.full_name.clone(),
                        count: o.fields.len(),
                    });
                }
                synthetic_seen = true;
            } else if synthetic_seen {
                return Err(DefError::SyntheticOneofOrder {
                    oneof: o.full_name.clone(),
                });
            } else {
                real += 1;
            }
            o.itof.compact(arena)?;
        }
        m.real_oneof_count = real;
        m.itof.compact(arena)?;
        Ok(())
    }

    fn create_service(
        &mut self,
        proto: &ServiceDescriptorProto,
        package: &str,
        index: usize,
    ) -> Result<ServiceId, DefError> {
        let short = proto
            .name
            .as_deref()
            .ok_or(DefError::MissingName { kind: "service" })?;
        names::check_ident(short)?;
        let full_name = names::join(package, short);
        let id = ServiceId(self.pool.services.len() as u32);
        self.add_symbol(&full_name, DefRef::Service(id))?;

        let mut methods = Vec::with_capacity(proto.method.len());
        for (i, mp) in proto.method.iter().enumerate() {
            let mshort = mp
                .name
                .as_deref()
                .ok_or(DefError::MissingName { kind: "method" })?;
            names::check_ident(mshort)?;
            let mid = MethodId(self.pool.methods.len() as u32);
            self.pool.methods.push(MethodDef {
                full_name: names::join(&full_name, mshort),
                service: id,
                index: i as u32,
                input_type: MessageId(PENDING),
                output_type: MessageId(PENDING),
                client_streaming: mp.client_streaming.unwrap_or(false),
                server_streaming: mp.server_streaming.unwrap_or(false),
                options: mp.options.clone(),
            });
            methods.push(mid);
        }
        self.pool.services.push(ServiceDef {
            full_name,
            file: self.file,
            index: index as u32,
            methods,
            options: proto.options.clone(),
        });
        Ok(id)
    }

    // ── Phase 3: resolution ────────────────────────────────────────

    fn resolve_name(&self, base: &str, sym: &str) -> Result<DefRef, DefError> {
        names::scope_candidates(base, sym)
            .iter()
            .find_map(|c| self.pool.find_symbol(c))
            .ok_or_else(|| DefError::UnresolvedName {
                name: sym.to_owned(),
            })
    }

    fn resolve_message_name(&self, base: &str, sym: &str) -> Result<MessageId, DefError> {
        match self.resolve_name(base, sym)? {
            DefRef::Message(m) => Ok(m),
            _ => Err(DefError::TypeMismatch {
                name: sym.to_owned(),
                expected: "message",
            }),
        }
    }

    fn resolve_message(&mut self, id: MessageId, proto: &DescriptorProto) -> Result<(), DefError> {
        let m = &self.pool.messages[id.index()];
        let (fields, exts, nested) = (
            m.fields.clone(),
            m.nested_extensions.clone(),
            m.nested_messages.clone(),
        );
        for (&f, fp) in fields.iter().zip(&proto.field) {
            self.resolve_field(f, fp)?;
        }
        for (&x, xp) in exts.iter().zip(&proto.extension) {
            self.resolve_field(x, xp)?;
            let ext = &self.pool.fields[x.index()];
            let canonical = ext.field_type == FieldType::Message
                && ext.label == Label::Optional
                && ext.message_sub_def() == Some(id)
                && self.pool.messages[ext.containing_type.index()].is_message_set;
            if canonical {
                self.pool.messages[id.index()].in_message_set = true;
            }
        }
        for (&n, np) in nested.iter().zip(&proto.nested_type) {
            self.resolve_message(n, np)?;
        }
        Ok(())
    }

    fn resolve_field(&mut self, id: FieldId, proto: &FieldDescriptorProto) -> Result<(), DefError> {
        let full_name = self.pool.fields[id.index()].full_name.clone();
        let scope = names::parent_scope(&full_name);

        if let Some(type_name) = proto.type_name.as_deref() {
            let found = self.resolve_name(scope, type_name)?;
            let packed_unset = proto
                .options
                .as_ref()
                .map(|o| o.get())
                .transpose()?
                .and_then(|o| o.packed)
                .is_none();
            let syntax = self.syntax;
            let f = &mut self.pool.fields[id.index()];
            let mismatch = |expected| DefError::TypeMismatch {
                name: type_name.to_owned(),
                expected,
            };
            match (proto.r#type.is_some(), f.field_type, found) {
                (false, _, DefRef::Enum(e)) => {
                    f.field_type = FieldType::Enum;
                    f.sub = Some(SubDef::Enum(e));
                    if packed_unset {
                        f.is_packed = f.label == Label::Repeated && syntax == Syntax::Proto3;
                    }
                }
                (false, _, DefRef::Message(m)) => {
                    f.field_type = FieldType::Message;
                    f.sub = Some(SubDef::Message(m));
                    f.has_presence = f.label != Label::Repeated;
                }
                (false, _, _) => return Err(mismatch("message or enum")),
                (true, FieldType::Enum, DefRef::Enum(e)) => f.sub = Some(SubDef::Enum(e)),
                (true, FieldType::Enum, _) => return Err(mismatch("enum")),
                (true, _, DefRef::Message(m)) => f.sub = Some(SubDef::Message(m)),
                (true, _, _) => return Err(mismatch("message")),
            }
        }

        let (closed_enum, is_map) = {
            let f = &self.pool.fields[id.index()];
            match f.sub {
                Some(SubDef::Enum(e)) => (self.pool.enums[e.index()].is_closed, false),
                Some(SubDef::Message(m)) => (
                    false,
                    f.label == Label::Repeated && self.pool.messages[m.index()].is_map_entry,
                ),
                None => (false, false),
            }
        };
        let f = &mut self.pool.fields[id.index()];
        f.closed_enum = closed_enum;
        f.is_map = is_map;

        self.resolve_default(id, proto)?;

        if self.pool.fields[id.index()].is_extension {
            let extendee = proto
                .extendee
                .as_deref()
                .ok_or_else(|| DefError::MissingExtendee {
                    field: full_name.clone(),
                })?;
            let m = self.resolve_message_name(scope, extendee)?;
            let msg = &self.pool.messages[m.index()];
            let f = &self.pool.fields[id.index()];
            if !msg.is_valid_extension_number(i64::from(f.number)) {
                return Err(DefError::ExtensionNumber {
                    number: f.number,
                    field: full_name,
                    message: msg.full_name.clone(),
                });
            }
            self.pool.fields[id.index()].containing_type = m;
        }
        Ok(())
    }

    fn resolve_default(&mut self, id: FieldId, proto: &FieldDescriptorProto) -> Result<(), DefError> {
        let f = &self.pool.fields[id.index()];
        let enum_sub = f.enum_sub_def().map(|e| &self.pool.enums[e.index()]);
        let value = match proto.default_value.as_deref() {
            Some(text) => {
                if self.syntax == Syntax::Proto3 {
                    return Err(DefError::Proto3Default {
                        field: f.full_name.clone(),
                    });
                }
                if f.is_sub_message() {
                    return Err(DefError::MessageDefault {
                        field: f.full_name.clone(),
                    });
                }
                let invalid = || DefError::InvalidDefault {
                    value: text.to_owned(),
                    field: f.full_name.clone(),
                    field_type: f.field_type,
                };
                match (f.ctype(), enum_sub) {
                    (CType::Enum, Some(e)) => {
                        let v = e.find_value_by_name(text).ok_or_else(invalid)?;
                        MessageValue::Int32(self.pool.enum_values[v.index()].number)
                    }
                    (ctype, _) => parse_default(ctype, text).map_err(|e| match e {
                        DefaultError::TooLong => DefError::DefaultTooLong {
                            value: text.to_owned(),
                        },
                        DefaultError::Invalid => invalid(),
                    })?,
                }
            }
            None => match enum_sub {
                Some(e) => MessageValue::Int32(e.default_value()),
                None => MessageValue::zero(f.ctype()),
            },
        };
        let f = &mut self.pool.fields[id.index()];
        f.has_default = proto.default_value.is_some();
        f.default = value;
        Ok(())
    }

    fn resolve_methods(&mut self, proto: &FileDescriptorProto) -> Result<(), DefError> {
        let services = self.pool.files[self.file.index()].services.clone();
        for (&s, sp) in services.iter().zip(&proto.service) {
            let methods = self.pool.services[s.index()].methods.clone();
            for (&m, mp) in methods.iter().zip(&sp.method) {
                let base = self.pool.methods[m.index()].full_name.clone();
                let input = self.resolve_message_name(&base, mp.input_type.as_deref().unwrap_or(""))?;
                let output =
                    self.resolve_message_name(&base, mp.output_type.as_deref().unwrap_or(""))?;
                let method = &mut self.pool.methods[m.index()];
                method.input_type = input;
                method.output_type = output;
            }
        }
        Ok(())
    }

    // ── Phase 4: layouts ───────────────────────────────────────────

    /// Point every regular field at its slot in the number-sorted layout.
    fn assign_layout_indices(&mut self) {
        for i in self.mark.messages..self.pool.messages.len() {
            let sorted = self.pool.messages[i].sorted_fields(self.pool);
            for (slot, f) in sorted.into_iter().enumerate() {
                self.pool.fields[f.index()].layout_index = slot as u32;
            }
        }
    }

    fn build_layouts(&mut self, scratch: &mut Vec<u8>) -> Result<(), DefError> {
        if let Some(layout) = self.layout {
            for table in &layout.enums {
                self.pool.layouts.add_enum(table.clone());
            }
            for table in &layout.msgs {
                self.pool.layouts.add_message(table.clone());
            }
            debug_assert_eq!(self.pool.layouts.message_count() as u32, self.next_msg_layout);
            debug_assert_eq!(self.pool.layouts.enum_count() as u32, self.next_enum_layout);
            return Ok(());
        }

        let platform = self.pool.layouts.platform();
        for i in self.mark.enums..self.pool.enums.len() {
            let e = &self.pool.enums[i];
            if !e.is_closed {
                continue;
            }
            scratch.clear();
            e.mini_descriptor_encode(self.pool, scratch)?;
            let table = MiniTableEnum::build(scratch, self.arena)
                .map_err(|err| DefError::layout(&e.full_name, err))?;
            let got = self.pool.layouts.add_enum(table);
            debug_assert_eq!(Some(got), self.pool.enums[i].layout);
        }
        for i in self.mark.messages..self.pool.messages.len() {
            let m = &self.pool.messages[i];
            scratch.clear();
            m.mini_descriptor_encode(self.pool, scratch)?;
            let table = MiniTable::build(scratch, platform, self.arena)
                .map_err(|err| DefError::layout(&m.full_name, err))?;
            let got = self.pool.layouts.add_message(table);
            debug_assert_eq!(got, self.pool.messages[i].layout);
        }
        Ok(())
    }

    // ── Phase 5: linking and registration ──────────────────────────

    fn link_messages(&mut self) -> Result<(), DefError> {
        let pool = &mut *self.pool;
        for m in &pool.messages[self.mark.messages..] {
            for &f in &m.fields {
                let f = &pool.fields[f.index()];
                let slot = f.layout_index as usize;
                let linked = match f.sub {
                    Some(SubDef::Message(sub)) => {
                        let sub = pool.messages[sub.index()].layout;
                        pool.layouts.set_sub_message(m.layout, slot, sub)
                    }
                    Some(SubDef::Enum(sub)) if f.closed_enum => {
                        match pool.enums[sub.index()].layout {
                            Some(sub) => pool.layouts.set_sub_enum(m.layout, slot, sub),
                            None => Ok(()),
                        }
                    }
                    _ => Ok(()),
                };
                linked.map_err(|err| DefError::layout(&m.full_name, err))?;
            }
        }
        Ok(())
    }

    fn extension_sub(&self, f: &FieldDef) -> MiniTableSub {
        match f.sub {
            Some(SubDef::Message(m)) => MiniTableSub::Message(Some(self.pool.messages[m.index()].layout)),
            Some(SubDef::Enum(e)) if f.closed_enum => {
                MiniTableSub::Enum(self.pool.enums[e.index()].layout)
            }
            _ => MiniTableSub::Message(None),
        }
    }

    fn build_extensions(&mut self, scratch: &mut Vec<u8>) -> Result<(), DefError> {
        let arena = self.arena;
        let platform = self.pool.layouts.platform();
        let mut imported = self.layout.map(|l| l.exts.iter());
        for i in self.mark.fields..self.pool.fields.len() {
            let f = &self.pool.fields[i];
            if !f.is_extension {
                continue;
            }
            let extendee = self.pool.messages[f.containing_type.index()].layout;
            let sub = self.extension_sub(f);
            let got = match imported.as_mut().and_then(Iterator::next) {
                Some(ext) => {
                    debug_assert_eq!(ext.number(), f.number);
                    let id = self.pool.layouts.add_extension(ext.clone());
                    self.pool.layouts.set_extension_links(id, extendee, sub);
                    id
                }
                None => {
                    scratch.clear();
                    f.mini_descriptor_encode(scratch)?;
                    let table = self
                        .pool
                        .layouts
                        .message(extendee)
                        .ok_or_else(|| DefError::UnresolvedName {
                            name: f.full_name.clone(),
                        })?;
                    let ext = MiniTableExtension::build(scratch, extendee, table, sub, platform)
                        .map_err(|err| DefError::layout(&f.full_name, err))?;
                    self.pool.layouts.add_extension(ext)
                }
            };
            debug_assert_eq!(Some(got), self.pool.fields[i].layout_ext);
            self.pool
                .extensions_by_layout
                .insert(u64::from(got.0), i as u64, arena)?;
        }
        Ok(())
    }

    fn finish(&mut self, name: &str) -> Result<(), DefError> {
        let arena = self.arena;
        let pool = &mut *self.pool;
        let ids: Vec<MiniTableExtensionId> = (self.mark.ext_layouts..pool.layouts.extension_count())
            .map(|i| MiniTableExtensionId(i as u32))
            .collect();
        pool.registry
            .add_from_store(&pool.layouts, &ids)
            .map_err(|err| DefError::layout(name, err))?;

        let file = &mut pool.files[self.file.index()];
        file.layout_msgs = self.first_msg_layout..self.next_msg_layout;
        file.layout_enums = self.first_enum_layout..self.next_enum_layout;
        file.layout_exts = self.mark.ext_layouts as u32..self.next_ext_layout;
        pool.files_by_name
            .insert(name.as_bytes(), u64::from(self.file.0), arena)?;
        Ok(())
    }
}

fn message_count(msgs: &[DescriptorProto]) -> usize {
    msgs.iter().map(|m| 1 + message_count(&m.nested_type)).sum()
}

fn nested_enum_count(msgs: &[DescriptorProto]) -> usize {
    msgs.iter()
        .map(|m| m.enum_type.len() + nested_enum_count(&m.nested_type))
        .sum()
}

fn nested_extension_count(msgs: &[DescriptorProto]) -> usize {
    msgs.iter()
        .map(|m| m.extension.len() + nested_extension_count(&m.nested_type))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hpb_test_utils::fixtures::{settings, shop};
    use hpb_test_utils::*;

    #[test]
    fn nested_counts() {
        let f = shop();
        assert_eq!(message_count(&f.message_type), 3);
        assert_eq!(nested_enum_count(&f.message_type), 1);
        assert_eq!(nested_extension_count(&f.message_type), 0);
    }

    #[test]
    fn closed_enums_get_layout_ids_in_creation_order() {
        let mut pool = DefPool::new().unwrap();
        pool.add_file(&shop()).unwrap();
        let ids: Vec<_> = pool.enums.iter().map(|e| e.layout).collect();
        assert_eq!(
            ids,
            [Some(MiniTableEnumId(0)), Some(MiniTableEnumId(1))]
        );
        pool.add_file(&settings()).unwrap();
        assert_eq!(pool.enums[2].layout, None);
    }

    #[test]
    fn layout_index_is_sorted_position() {
        let mut f = file("o.proto", "o");
        f.message_type.push(message(
            "M",
            vec![
                scalar("c", 30, FieldType::Int32),
                scalar("a", 10, FieldType::Int32),
                scalar("b", 20, FieldType::Int32),
            ],
        ));
        let mut pool = DefPool::new().unwrap();
        pool.add_file(&f).unwrap();
        let slots: Vec<u32> = pool.fields.iter().map(|f| f.layout_index).collect();
        assert_eq!(slots, [2, 0, 1]);
        let indices: Vec<u32> = pool.fields.iter().map(|f| f.index).collect();
        assert_eq!(indices, [0, 1, 2]);
    }

    #[test]
    fn extension_layout_index_counts_per_file() {
        let mut pool = DefPool::new().unwrap();
        pool.add_file(&shop()).unwrap();
        let mut f = file("x.proto", "x");
        f.dependency.push("shop.proto".into());
        f.extension
            .push(extension("a", 100, FieldType::Int32, ".shop.Item"));
        f.extension
            .push(extension("b", 101, FieldType::Int32, ".shop.Item"));
        pool.add_file(&f).unwrap();
        let exts: Vec<(u32, Option<MiniTableExtensionId>)> = pool
            .fields
            .iter()
            .filter(|f| f.is_extension)
            .map(|f| (f.layout_index, f.layout_ext))
            .collect();
        assert_eq!(
            exts,
            [
                (0, Some(MiniTableExtensionId(0))),
                (1, Some(MiniTableExtensionId(1)))
            ]
        );
    }

    #[test]
    fn scratch_buffer_is_returned_after_failure() {
        let mut pool = DefPool::new().unwrap();
        let cap = pool.scratch.capacity();
        let mut f = file("bad.proto", "bad");
        f.message_type
            .push(message("M", vec![typed("x", 1, FieldType::Message, "Nope")]));
        pool.add_file(&f).unwrap_err();
        pool.add_file(&shop()).unwrap();
        assert!(pool.scratch.is_empty());
        assert!(pool.scratch.capacity() >= cap);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::collection::btree_set;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn any_distinct_numbers_load(numbers in btree_set(1u32..=MAX_FIELD_NUMBER, 1..24)) {
                let fields = numbers
                    .iter()
                    .enumerate()
                    .map(|(i, &n)| scalar(&format!("f{i}"), n as i32, FieldType::Int64))
                    .collect();
                let mut f = file("p.proto", "p");
                f.message_type.push(message("M", fields));
                let mut pool = DefPool::new().unwrap();
                pool.add_file(&f).unwrap();

                let m = &pool.messages[0];
                for &n in &numbers {
                    let id = m.find_field_by_number(n).unwrap();
                    prop_assert_eq!(pool.fields[id.index()].number, n);
                    let slot = pool.fields[id.index()].mini_table_field(&pool).unwrap();
                    prop_assert_eq!(slot.number(), n);
                }
            }

            #[test]
            fn failed_loads_leave_no_symbols(count in 1usize..12, dup in 0usize..12) {
                let dup = dup % count;
                let mut fields: Vec<_> = (0..count)
                    .map(|i| scalar(&format!("f{i}"), i as i32 + 1, FieldType::Int32))
                    .collect();
                fields.push(scalar("again", dup as i32 + 1, FieldType::Int32));
                let mut f = file("d.proto", "d");
                f.message_type.push(message("Before", Vec::new()));
                f.message_type.push(message("M", fields));

                let mut pool = DefPool::new().unwrap();
                let err = pool.add_file(&f).unwrap_err();
                prop_assert_eq!(err, DefError::DuplicateFieldNumber { number: dup as u32 + 1 });
                prop_assert_eq!(pool.symbols.count(), 0);
                prop_assert!(pool.messages.is_empty());
            }
        }
    }
}
