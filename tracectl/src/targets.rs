// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Link-time registry of the tracing targets declared by every linked crate

use crate::LevelFilter;
use linkme::distributed_slice;

/// A tracing target, as declared with [`trace_target!`](crate::trace_target).
pub struct STarget {
    pub(crate) target: &'static str,
    pub(crate) name: &'static str,
    pub(crate) level: LevelFilter,
    pub(crate) tags: &'static [&'static str],
}
impl STarget {
    #[must_use]
    pub const fn new(
        target: &'static str,
        name: &'static str,
        level: LevelFilter,
        tags: &'static [&'static str],
    ) -> Self {
        Self {
            target,
            name,
            level,
            tags,
        }
    }
    #[must_use]
    pub fn target(&self) -> &'static str {
        self.target
    }
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[distributed_slice]
pub static TRACING_TARGETS: [STarget];

#[macro_export]
/// Declare a tracing target for the calling module, with a name, a default level and tags.
/// The target is the module path, so it covers every event emitted from the module and its
/// submodules.
macro_rules! trace_target {
    // The output lives in an anonymous const scope so that the macro can be invoked in
    // several modules without clashing static names.
    ($name:expr, $level:expr, $tags:expr) => {
        const _: () = {
            use linkme::distributed_slice;
            use $crate::LevelFilter;
            use $crate::targets::{STarget, TRACING_TARGETS};

            #[distributed_slice(TRACING_TARGETS)]
            static TRACE_TGT: STarget = STarget::new(module_path!(), $name, $level, $tags);
        };
    };
}
