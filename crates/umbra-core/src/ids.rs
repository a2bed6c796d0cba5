//! Plain identifiers used by the relation tables.
//!
//! Ids never own what they name. Looking one up in its table is the liveness
//! check: a removed object simply stops resolving.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            /// Returns the raw index.
            #[must_use]
            pub fn index(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Identifies a scene.
    SceneId,
    "scene"
);
define_id!(
    /// Identifies a node within the world.
    NodeId,
    "node"
);
define_id!(
    /// Identifies a drawable component (static model, billboard set...).
    DrawableId,
    "drawable"
);
define_id!(
    /// Identifies a viewport.
    ViewportId,
    "viewport"
);
define_id!(
    /// Identifies a GPU texture owned by a render device.
    TextureId,
    "texture"
);

/// Monotonic id source shared by a table.
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    /// Creates an allocator starting at 1 (0 is never handed out).
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Returns the next raw id.
    pub fn next_raw(&mut self) -> u32 {
        if self.next == 0 {
            self.next = 1;
        }
        let id = self.next;
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_skips_zero() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.next_raw(), 1);
        assert_eq!(ids.next_raw(), 2);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(NodeId(7).to_string(), "node#7");
        assert_eq!(TextureId(3).to_string(), "texture#3");
    }
}
