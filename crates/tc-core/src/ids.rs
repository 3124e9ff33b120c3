//! Strongly typed wrappers around engine-issued entity names.
//!
//! The external simulation engine names every entity with an opaque string
//! (traffic lights, lanes, edges, vehicles, routes).  Wrapping each kind in
//! its own newtype keeps them from being confused at call sites: a `LaneId`
//! cannot be passed where an `EdgeId` is expected.  All IDs are `Ord + Hash`
//! so they can be used as map keys and sorted collection elements without
//! ceremony.

use std::fmt;

/// Generate a typed ID wrapper around an engine-issued name.
macro_rules! named_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub String);

        impl $name {
            /// Wrap an engine-issued name.
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            /// Borrow the raw name for engine calls.
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self(name.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self(name)
            }
        }
    };
}

named_id! {
    /// A controllable intersection — a traffic-light system id.
    pub struct TlsId;
}

named_id! {
    /// A lane id, as listed by the engine for a traffic light.
    pub struct LaneId;
}

named_id! {
    /// A directed road-segment (edge) id.
    pub struct EdgeId;
}

named_id! {
    /// A vehicle id.  Synthesized ids embed the step counter for uniqueness.
    pub struct VehicleId;
}

named_id! {
    /// A route id known to the running scenario.
    pub struct RouteId;
}
