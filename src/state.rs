//! Transferable container state: the handle another execution context
//! adopts to observe the same container without copying.

use std::fmt;
use std::sync::Arc;

use crate::error::OrtakError;
use crate::region::Region;

/// Which container a region pair encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// A shareable hash map.
    Map,
    /// A shareable dense array.
    Array,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::Map => f.write_str("map"),
            ContainerKind::Array => f.write_str("array"),
        }
    }
}

/// The `{index, data, kind}` triple describing a live container.
///
/// Cloning or sending the state shares the regions; it never copies
/// their bytes. Adoption validates the kind tag.
#[derive(Debug, Clone)]
pub struct TransferableState {
    /// The index region (header + bucket or slot table).
    pub index: Arc<Region>,
    /// The data region (variable-length entry records).
    pub data: Arc<Region>,
    /// The container kind the regions encode.
    pub kind: ContainerKind,
}

impl TransferableState {
    /// Unpacks the region pair, failing with [`OrtakError::KindMismatch`]
    /// when the envelope describes a different container kind.
    pub fn expect(self, kind: ContainerKind) -> Result<(Arc<Region>, Arc<Region>), OrtakError> {
        if self.kind != kind {
            return Err(OrtakError::KindMismatch {
                expected: kind,
                found: self.kind,
            });
        }
        Ok((self.index, self.data))
    }
}
