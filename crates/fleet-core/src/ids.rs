//! Strongly typed identifier wrappers for fleet entities.
//!
//! All ids are `Copy + Ord + Hash` so they can be used as map keys without
//! ceremony.  `Display` renders the canonical wire form (`truck_007`,
//! `load_012`, …) and `FromStr` accepts that form plus the short aliases
//! external advisors tend to emit (`v7`, `l12`).  Serde round-trips through
//! the string form so JSON surfaces show readable ids, not raw integers.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Generate a typed ID wrapper around `u32` with a prefixed display form.
macro_rules! entity_id {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident, prefix = $prefix:literal, width = $width:literal,
        aliases = [$($alias:literal),*];
    ) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        $vis struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{:0w$}"), self.0, w = $width)
            }
        }

        impl FromStr for $name {
            type Err = crate::FleetError;

            /// Accepts the canonical `prefix_NNN` form and any registered
            /// short alias (`v7`-style), case-insensitively.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lower = s.trim().to_ascii_lowercase();
                let digits = lower
                    .strip_prefix($prefix)
                    $(.or_else(|| lower.strip_prefix($alias)))*
                    .ok_or_else(|| crate::FleetError::Malformed(
                        format!(concat!("not a ", stringify!($name), ": {:?}"), s),
                    ))?;
                digits
                    .parse::<u32>()
                    .map($name)
                    .map_err(|_| crate::FleetError::Malformed(
                        format!(concat!("not a ", stringify!($name), ": {:?}"), s),
                    ))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
                ser.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
                let s = String::deserialize(de)?;
                s.parse().map_err(D::Error::custom)
            }
        }
    };
}

entity_id! {
    /// A truck in the fleet.  Wire form `truck_007`.
    pub struct VehicleId, prefix = "truck_", width = 3, aliases = ["vehicle_", "v"];
}

entity_id! {
    /// The driver assigned to a vehicle.  Wire form `driver_007`.
    pub struct DriverId, prefix = "driver_", width = 3, aliases = ["d"];
}

entity_id! {
    /// A freight load posted for transport.  Wire form `load_012`.
    pub struct LoadId, prefix = "load_", width = 3, aliases = ["l"];
}

entity_id! {
    /// A dispatched trip linking one vehicle to one load.  Wire form `trip_0042`.
    pub struct TripId, prefix = "trip_", width = 4, aliases = ["t"];
}
