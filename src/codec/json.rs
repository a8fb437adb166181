//! JSON body
//!
//! Layout: `{"name": "...", "members": [{"name": "...", "pronouns": "..."}]}`
//!
//! `pronouns` is optional on decode and defaults to the empty string. Unknown
//! keys are ignored so that newer writers can add fields.

use super::Limits;
use crate::errors::{SysdfError, SysdfResult};
use crate::system::System;

pub(super) fn encode(system: &System) -> SysdfResult<Vec<u8>> {
    serde_json::to_vec(system).map_err(|e| {
        SysdfError::malformed_body("Failed to encode JSON body").with_details(e.to_string())
    })
}

pub(super) fn decode(body: &[u8], limits: &Limits) -> SysdfResult<System> {
    let system: System = serde_json::from_slice(body).map_err(|e| {
        SysdfError::malformed_body("Invalid JSON body").with_details(e.to_string())
    })?;

    check_limits(&system, limits)?;
    Ok(system)
}

fn check_limits(system: &System, limits: &Limits) -> SysdfResult<()> {
    if system.member_count() > limits.max_members as usize {
        return Err(SysdfError::malformed_body("Member count exceeds limit").with_details(
            format!("count {}, limit {}", system.member_count(), limits.max_members),
        ));
    }

    let max = limits.max_string_len as usize;
    let too_long = std::iter::once(system.name())
        .chain(
            system
                .members()
                .iter()
                .flat_map(|m| [m.name(), m.pronouns()]),
        )
        .find(|s| s.len() > max);

    if let Some(value) = too_long {
        return Err(SysdfError::malformed_body("String field exceeds length limit")
            .with_details(format!("length {}, limit {}", value.len(), max)));
    }

    Ok(())
}
