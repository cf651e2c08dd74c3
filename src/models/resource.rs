//! Resource model.
//!
//! Resources are the stations that perform activities. A station handles
//! one activity at a time.

use serde::{Deserialize, Serialize};

/// A resource that can be assigned to activities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique resource identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Number of units available simultaneously (default: 1). Scheduling
    /// rejects anything but 1.
    pub capacity: i32,
}

impl Resource {
    /// Creates a unary resource.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            capacity: 1,
        }
    }

    /// Sets the resource name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the capacity.
    pub fn with_capacity(mut self, capacity: i32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Whether exactly one activity runs at a time.
    pub fn is_unary(&self) -> bool {
        self.capacity == 1
    }
}
