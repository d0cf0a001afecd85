#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Point-of-interest category catalog.
//!
//! Defines the fixed set of category keys a user can search for nearby,
//! how they are presented (display name, emoji, display group), and how
//! each one maps onto `OpenStreetMap` tags for the Overpass provider.
//!
//! Display groups exist purely for presentation. A selection of categories
//! is a flat set of [`CategoryKey`]s with no notion of group.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A searchable point-of-interest category.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CategoryKey {
    // ── Health ───────────────────────────────────────────
    GeneralHospital,
    GovtHospital,
    Veterinary,
    Pharmacy,

    // ── Education ───────────────────────────────────────
    School,
    College,
    University,

    // ── Government ──────────────────────────────────────
    Police,
    FireStation,
    DistrictCollectorate,

    // ── Commercial ──────────────────────────────────────
    Mall,
    Bank,
    Fuel,
    Supermarket,
    OldAgeHome,
    Apartment,

    // ── Transport & public venues ───────────────────────
    BusStation,
    Metro,
    Railway,
    Airport,
    Theatre,
    CommunityHall,
    Stadium,
    EventGround,

    // ── Emergency ───────────────────────────────────────
    EmergencyOperations,
}

/// An `OpenStreetMap` tag predicate identifying elements of a category.
///
/// `key=value` must match; when `refine` is set, that second tag must
/// match as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OsmFilter {
    /// Primary tag key (e.g. `"amenity"`).
    pub key: &'static str,
    /// Primary tag value (e.g. `"hospital"`).
    pub value: &'static str,
    /// Optional second tag narrowing the primary one.
    pub refine: Option<(&'static str, &'static str)>,
}

impl OsmFilter {
    const fn tag(key: &'static str, value: &'static str) -> Self {
        Self {
            key,
            value,
            refine: None,
        }
    }

    const fn refined(
        key: &'static str,
        value: &'static str,
        refine_key: &'static str,
        refine_value: &'static str,
    ) -> Self {
        Self {
            key,
            value,
            refine: Some((refine_key, refine_value)),
        }
    }

    /// Returns `true` if the element tags satisfy this filter.
    #[must_use]
    pub fn matches<'a>(&self, get: impl Fn(&str) -> Option<&'a str>) -> bool {
        if get(self.key) != Some(self.value) {
            return false;
        }
        self.refine.is_none_or(|(k, v)| get(k) == Some(v))
    }
}

impl CategoryKey {
    /// Human-readable name shown in tags and result rows.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::GeneralHospital => "General Hospitals",
            Self::GovtHospital => "Govt Hospitals",
            Self::Veterinary => "Veterinary Clinics",
            Self::Pharmacy => "Pharmacy",
            Self::School => "Schools",
            Self::College => "Colleges",
            Self::University => "Universities",
            Self::Police => "Police Stations",
            Self::FireStation => "Fire Stations",
            Self::DistrictCollectorate => "District Collectorate",
            Self::Mall => "Shopping Malls",
            Self::Bank => "Banks / ATMs",
            Self::Fuel => "Fuel Stations",
            Self::Supermarket => "Supermarkets",
            Self::OldAgeHome => "Old Age Homes",
            Self::Apartment => "Apartments",
            Self::BusStation => "Bus Stops / Terminals",
            Self::Metro => "Metro Stations",
            Self::Railway => "Railway Stations",
            Self::Airport => "Airports",
            Self::Theatre => "Theatres",
            Self::CommunityHall => "Community Halls",
            Self::Stadium => "Stadiums",
            Self::EventGround => "Event Grounds",
            Self::EmergencyOperations => "Emergency Operations Center",
        }
    }

    /// Emoji shown next to the display name.
    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::GeneralHospital | Self::GovtHospital => "🏥",
            Self::Veterinary => "🐾",
            Self::Pharmacy => "💊",
            Self::School => "🏫",
            Self::College => "🎓",
            Self::University | Self::DistrictCollectorate | Self::CommunityHall => "🏛",
            Self::Police => "🚓",
            Self::FireStation => "🚒",
            Self::Mall => "🏬",
            Self::Bank => "🏦",
            Self::Fuel => "⛽",
            Self::Supermarket => "🛒",
            Self::OldAgeHome => "👵",
            Self::Apartment => "🏢",
            Self::BusStation => "🚌",
            Self::Metro => "🚇",
            Self::Railway => "🚉",
            Self::Airport => "✈️",
            Self::Theatre => "🎭",
            Self::Stadium => "🏟",
            Self::EventGround => "📅",
            Self::EmergencyOperations => "🆘",
        }
    }

    /// Short group tag attached to each search result.
    ///
    /// This is coarser than [`CategoryGroup`]: it tags a result, it does not
    /// decide where the category is displayed in the picker.
    #[must_use]
    pub const fn group_tag(self) -> &'static str {
        match self {
            Self::GeneralHospital | Self::GovtHospital | Self::Veterinary | Self::Pharmacy => {
                "health"
            }
            Self::School | Self::College | Self::University => "education",
            Self::Police | Self::FireStation | Self::DistrictCollectorate => "government",
            Self::Mall
            | Self::Bank
            | Self::Fuel
            | Self::Supermarket
            | Self::OldAgeHome
            | Self::Apartment => "commercial",
            Self::BusStation
            | Self::Metro
            | Self::Railway
            | Self::Airport
            | Self::Theatre
            | Self::CommunityHall
            | Self::Stadium
            | Self::EventGround => "transport",
            Self::EmergencyOperations => "emergency",
        }
    }

    /// Display group this category is listed under.
    #[must_use]
    pub const fn group(self) -> CategoryGroup {
        match self {
            Self::GeneralHospital | Self::GovtHospital | Self::Veterinary | Self::Pharmacy => {
                CategoryGroup::HealthEmergency
            }
            Self::School | Self::College | Self::University => CategoryGroup::Education,
            Self::Police | Self::FireStation | Self::DistrictCollectorate => {
                CategoryGroup::GovernmentCivic
            }
            Self::Mall
            | Self::Bank
            | Self::Fuel
            | Self::Supermarket
            | Self::OldAgeHome
            | Self::Apartment => CategoryGroup::CommercialResidential,
            Self::BusStation
            | Self::Metro
            | Self::Railway
            | Self::Airport
            | Self::Theatre
            | Self::CommunityHall
            | Self::Stadium
            | Self::EventGround => CategoryGroup::TransportPublic,
            Self::EmergencyOperations => CategoryGroup::DisasterCrisis,
        }
    }

    /// `OpenStreetMap` tag filters whose union defines this category.
    #[must_use]
    pub const fn osm_filters(self) -> &'static [OsmFilter] {
        match self {
            Self::GeneralHospital => const { &[OsmFilter::tag("amenity", "hospital")] },
            Self::GovtHospital => const { &[
                OsmFilter::refined("amenity", "hospital", "operator:type", "government"),
                OsmFilter::refined("amenity", "hospital", "operator:type", "public"),
            ] },
            Self::Veterinary => const { &[OsmFilter::tag("amenity", "veterinary")] },
            Self::Pharmacy => const { &[OsmFilter::tag("amenity", "pharmacy")] },
            Self::School => const { &[OsmFilter::tag("amenity", "school")] },
            Self::College => const { &[OsmFilter::tag("amenity", "college")] },
            Self::University => const { &[OsmFilter::tag("amenity", "university")] },
            Self::Police => const { &[OsmFilter::tag("amenity", "police")] },
            Self::FireStation => const { &[OsmFilter::tag("amenity", "fire_station")] },
            Self::DistrictCollectorate => const { &[OsmFilter::refined(
                "office",
                "government",
                "government",
                "administrative",
            )] },
            Self::Mall => const { &[OsmFilter::tag("shop", "mall")] },
            Self::Bank => const { &[
                OsmFilter::tag("amenity", "bank"),
                OsmFilter::tag("amenity", "atm"),
            ] },
            Self::Fuel => const { &[OsmFilter::tag("amenity", "fuel")] },
            Self::Supermarket => const { &[OsmFilter::tag("shop", "supermarket")] },
            Self::OldAgeHome => const { &[OsmFilter::refined(
                "amenity",
                "social_facility",
                "social_facility",
                "nursing_home",
            )] },
            Self::Apartment => const { &[OsmFilter::tag("building", "apartments")] },
            Self::BusStation => const { &[
                OsmFilter::tag("amenity", "bus_station"),
                OsmFilter::tag("highway", "bus_stop"),
            ] },
            Self::Metro => const { &[OsmFilter::refined("railway", "station", "station", "subway")] },
            Self::Railway => const { &[OsmFilter::tag("railway", "station")] },
            Self::Airport => const { &[OsmFilter::tag("aeroway", "aerodrome")] },
            Self::Theatre => const { &[OsmFilter::tag("amenity", "theatre")] },
            Self::CommunityHall => const { &[OsmFilter::tag("amenity", "community_centre")] },
            Self::Stadium => const { &[OsmFilter::tag("leisure", "stadium")] },
            Self::EventGround => const { &[OsmFilter::tag("amenity", "events_venue")] },
            Self::EmergencyOperations => const { &[OsmFilter::tag("emergency", "control_centre")] },
        }
    }

    /// Returns `true` if an element with the given tags belongs to this
    /// category.
    #[must_use]
    pub fn matches_tags<'a>(self, get: impl Fn(&str) -> Option<&'a str> + Copy) -> bool {
        self.osm_filters().iter().any(|f| f.matches(get))
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::GeneralHospital,
            Self::GovtHospital,
            Self::Veterinary,
            Self::Pharmacy,
            Self::School,
            Self::College,
            Self::University,
            Self::Police,
            Self::FireStation,
            Self::DistrictCollectorate,
            Self::Mall,
            Self::Bank,
            Self::Fuel,
            Self::Supermarket,
            Self::OldAgeHome,
            Self::Apartment,
            Self::BusStation,
            Self::Metro,
            Self::Railway,
            Self::Airport,
            Self::Theatre,
            Self::CommunityHall,
            Self::Stadium,
            Self::EventGround,
            Self::EmergencyOperations,
        ]
    }
}

/// Display groups in the category picker.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CategoryGroup {
    HealthEmergency,
    Education,
    GovernmentCivic,
    CommercialResidential,
    TransportPublic,
    DisasterCrisis,
}

impl CategoryGroup {
    /// Heading shown above the group in the picker.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::HealthEmergency => "Health & Emergency",
            Self::Education => "Education",
            Self::GovernmentCivic => "Government & Civic",
            Self::CommercialResidential => "Commercial & Residential",
            Self::TransportPublic => "Transport & Public",
            Self::DisasterCrisis => "Disaster & Crisis",
        }
    }

    /// Categories listed under this group, in display order.
    #[must_use]
    pub fn categories(self) -> Vec<CategoryKey> {
        CategoryKey::all()
            .iter()
            .copied()
            .filter(|c| c.group() == self)
            .collect()
    }

    /// Returns all groups in display order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::HealthEmergency,
            Self::Education,
            Self::GovernmentCivic,
            Self::CommercialResidential,
            Self::TransportPublic,
            Self::DisasterCrisis,
        ]
    }
}
