//! System identity model
//!
//! A [`System`] is a named, ordered list of [`Member`]s. Insertion order is
//! preserved until [`System::sort`] is called explicitly; decoding never
//! reorders members.

mod member;

pub use member::Member;

use serde::{Deserialize, Serialize};

use crate::errors::{SysdfError, SysdfResult};

/// Owned system with its members
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct System {
    /// Name of the system (may be empty)
    name: String,
    /// Members in insertion order
    members: Vec<Member>,
}

impl System {
    /// Create an empty system
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Create a system from an existing member list, keeping its order
    pub fn with_members(name: impl Into<String>, members: Vec<Member>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Append a member to the end of the list
    pub fn append_member(&mut self, member: Member) {
        self.members.push(member);
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the member at `index`.
    ///
    /// # Errors
    ///
    /// Returns `SYSDF_OUT_OF_RANGE` if `index >= member_count()`.
    pub fn member(&self, index: usize) -> SysdfResult<&Member> {
        self.members
            .get(index)
            .ok_or_else(|| SysdfError::out_of_range(index, self.members.len()))
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Stable sort of members by name.
    ///
    /// Names compare by byte value, not by locale. Members with equal names
    /// keep their relative order.
    pub fn sort(&mut self) {
        self.members.sort_by(|a, b| a.name().cmp(b.name()));
    }
}
