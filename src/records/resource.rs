//! Record resource descriptors
//!
//! A deployment serves exactly one resource. The descriptor fixes the names
//! that show up on the wire: resource type, collection key, identity field,
//! and the route prefix.

use serde::{Deserialize, Serialize};

/// Name of the server-managed record version field
pub const VERSION_FIELD: &str = "version";

/// Resources this service knows how to serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Finance,
    K12,
}

impl ResourceKind {
    pub fn descriptor(&self) -> RecordResource {
        match self {
            ResourceKind::Finance => RecordResource {
                kind: *self,
                name: "finance",
                plural: "finances",
                id_field: "financeID",
                base_path: "/api/v1/finances",
            },
            ResourceKind::K12 => RecordResource {
                kind: *self,
                name: "k12",
                plural: "k12s",
                id_field: "k12ID",
                base_path: "/api/v1/k12",
            },
        }
    }
}

/// Wire-level names of a record resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordResource {
    pub kind: ResourceKind,
    /// `resourceType` of a single record
    pub name: &'static str,
    /// `resourceType` of a collection
    pub plural: &'static str,
    /// Primary identity field
    pub id_field: &'static str,
    /// Route prefix of the record API
    pub base_path: &'static str,
}

impl RecordResource {
    /// True for the fields promoted out of the `data` block
    pub fn is_identity_field(&self, name: &str) -> bool {
        name == self.id_field || name == VERSION_FIELD
    }

    /// Self link of a single record
    pub fn record_href(&self, id: &str) -> String {
        format!("{}/{}", self.base_path, id)
    }
}
