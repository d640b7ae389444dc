//! Proptest strategies.
//!
//! These strategies generate random but reproducible inputs for
//! property-based testing of resolution.

use proptest::prelude::*;
use warsim_core::factions::FactionId;
use warsim_core::hex::{HexCoord, Terrain};
use warsim_core::math::{pct, Fixed};
use warsim_core::turn::Weather;

/// A run seed.
pub fn arb_seed() -> impl Strategy<Value = u64> {
    any::<u64>()
}

/// Either faction.
pub fn arb_faction() -> impl Strategy<Value = FactionId> {
    prop_oneof![Just(FactionId::Blue), Just(FactionId::Red)]
}

/// Any weather.
pub fn arb_weather() -> impl Strategy<Value = Weather> {
    prop_oneof![
        Just(Weather::Clear),
        Just(Weather::Cloudy),
        Just(Weather::Rain),
        Just(Weather::Storm),
        Just(Weather::Fog),
        Just(Weather::Sandstorm),
    ]
}

/// Any terrain class.
pub fn arb_terrain() -> impl Strategy<Value = Terrain> {
    proptest::sample::select(Terrain::ALL.to_vec())
}

/// A cell on a `width` x `height` map.
pub fn arb_cell(width: u32, height: u32) -> impl Strategy<Value = HexCoord> {
    (0..width as i32, 0..height as i32).prop_map(|(q, r)| HexCoord::new(q, r))
}

/// Combat power between 0.05 and 400, in hundredths.
pub fn arb_power() -> impl Strategy<Value = Fixed> {
    (5i64..40_000).prop_map(pct)
}

/// Unit strength between 1 and 200.
pub fn arb_strength() -> impl Strategy<Value = u32> {
    1u32..=200
}

/// Two combat powers, the second at least the first.
pub fn arb_ordered_powers() -> impl Strategy<Value = (Fixed, Fixed)> {
    (arb_power(), 0i64..20_000).prop_map(|(low, extra)| (low, low + pct(extra)))
}
