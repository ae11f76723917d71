//! Services and methods.

use hpb_descriptor::{MethodOptions, Options, ServiceOptions};

use crate::id::{FileId, MessageId, MethodId, ServiceId};
use crate::names;
use crate::pool::DefPool;

/// A service.
#[derive(Debug)]
pub struct ServiceDef {
    pub(crate) full_name: String,
    pub(crate) file: FileId,
    pub(crate) index: u32,
    pub(crate) methods: Vec<MethodId>,
    pub(crate) options: Option<Options<ServiceOptions>>,
}

impl ServiceDef {
    /// Short name.
    pub fn name(&self) -> &str {
        names::short_name(&self.full_name)
    }

    /// Fully qualified name.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Position in the file.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The defining file.
    pub fn file(&self) -> FileId {
        self.file
    }

    /// Methods in declaration order.
    pub fn methods(&self) -> &[MethodId] {
        &self.methods
    }

    /// Look a method up by short name.
    pub fn find_method_by_name(&self, pool: &DefPool, name: &str) -> Option<MethodId> {
        self.methods
            .iter()
            .copied()
            .find(|&m| pool.method(m).name() == name)
    }

    /// `ServiceOptions`, if the descriptor carried any.
    pub fn options(&self) -> Option<&Options<ServiceOptions>> {
        self.options.as_ref()
    }
}

/// One RPC method.
#[derive(Debug)]
pub struct MethodDef {
    pub(crate) full_name: String,
    pub(crate) service: ServiceId,
    pub(crate) index: u32,
    pub(crate) input_type: MessageId,
    pub(crate) output_type: MessageId,
    pub(crate) client_streaming: bool,
    pub(crate) server_streaming: bool,
    pub(crate) options: Option<Options<MethodOptions>>,
}

impl MethodDef {
    /// Short name.
    pub fn name(&self) -> &str {
        names::short_name(&self.full_name)
    }

    /// Fully qualified name, `service.method`.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Position in the service.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The owning service.
    pub fn service(&self) -> ServiceId {
        self.service
    }

    /// Request message.
    pub fn input_type(&self) -> MessageId {
        self.input_type
    }

    /// Response message.
    pub fn output_type(&self) -> MessageId {
        self.output_type
    }

    /// Whether the client streams requests.
    pub fn client_streaming(&self) -> bool {
        self.client_streaming
    }

    /// Whether the server streams responses.
    pub fn server_streaming(&self) -> bool {
        self.server_streaming
    }

    /// `MethodOptions`, if the descriptor carried any.
    pub fn options(&self) -> Option<&Options<MethodOptions>> {
        self.options.as_ref()
    }
}
