//! Tag-based feature classification.
//!
//! Rules are checked in a fixed order and the first rule that matches
//! decides the outcome:
//!
//! 1. `highway` in {primary, secondary, unclassified, residential,
//!    pedestrian}; any other highway is dropped. `unclassified` renders as
//!    residential.
//! 2. `man_made=bridge` renders as a residential route.
//! 3. any `natural` renders as water.
//! 4. `railway=rail` renders as transit.
//! 5. `leisure` in {park, garden, playground} renders as park; any other
//!    leisure is dropped.
//! 6. any `amenity` renders as a building.
//!
//! Everything else is dropped.
use std::fmt;

use serde::Deserialize;

use crate::feature::Tags;

/// Rendering category. Declaration order is the default draw order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Water,
    RoutePedestrian,
    RouteResidential,
    RouteSecondary,
    RoutePrimary,
    RouteTransit,
    Park,
    Building,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Water,
        Category::RoutePedestrian,
        Category::RouteResidential,
        Category::RouteSecondary,
        Category::RoutePrimary,
        Category::RouteTransit,
        Category::Park,
        Category::Building,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Water => "water",
            Category::RoutePedestrian => "route_pedestrian",
            Category::RouteResidential => "route_residential",
            Category::RouteSecondary => "route_secondary",
            Category::RoutePrimary => "route_primary",
            Category::RouteTransit => "route_transit",
            Category::Park => "park",
            Category::Building => "building",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a feature by its tags. `None` means the feature is not
/// rendered.
pub fn classify(tags: Option<&Tags>) -> Option<Category> {
    let tags = tags?;

    if let Some(highway) = tags.get("highway") {
        return match highway {
            "primary" => Some(Category::RoutePrimary),
            "secondary" => Some(Category::RouteSecondary),
            "residential" | "unclassified" => Some(Category::RouteResidential),
            "pedestrian" => Some(Category::RoutePedestrian),
            _ => None,
        };
    }

    if tags.get("man_made") == Some("bridge") {
        return Some(Category::RouteResidential);
    }

    if tags.contains("natural") {
        return Some(Category::Water);
    }

    if tags.get("railway") == Some("rail") {
        return Some(Category::RouteTransit);
    }

    if let Some(leisure) = tags.get("leisure") {
        return match leisure {
            "park" | "garden" | "playground" => Some(Category::Park),
            _ => None,
        };
    }

    if tags.contains("amenity") {
        return Some(Category::Building);
    }

    None
}
