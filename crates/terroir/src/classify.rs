//! Category lookups used as grouping keys.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Climate classification of a GI region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClimateZone {
    CoolDamp,
    CoolDry,
    CoolVeryDry,
    MildDamp,
    MildDry,
    MildVeryDry,
    WarmDamp,
    WarmDry,
    WarmVeryDry,
    HotDamp,
    HotDry,
    HotVeryDry,
    Unknown,
}

impl ClimateZone {
    pub fn label(&self) -> &'static str {
        match self {
            ClimateZone::CoolDamp => "Cool Damp",
            ClimateZone::CoolDry => "Cool Dry",
            ClimateZone::CoolVeryDry => "Cool Very Dry",
            ClimateZone::MildDamp => "Mild Damp",
            ClimateZone::MildDry => "Mild Dry",
            ClimateZone::MildVeryDry => "Mild Very Dry",
            ClimateZone::WarmDamp => "Warm Damp",
            ClimateZone::WarmDry => "Warm Dry",
            ClimateZone::WarmVeryDry => "Warm Very Dry",
            ClimateZone::HotDamp => "Hot Damp",
            ClimateZone::HotDry => "Hot Dry",
            ClimateZone::HotVeryDry => "Hot Very Dry",
            ClimateZone::Unknown => "Unknown Climate",
        }
    }
}

impl fmt::Display for ClimateZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const CLIMATE_REGIONS: &[(ClimateZone, &[&str])] = &[
    (
        ClimateZone::CoolDamp,
        &[
            "Macedon Ranges",
            "Mornington Peninsula",
            "Orange",
            "Canberra District",
            "Yarra Valley",
            "Beechworth",
            "Upper Goulburn",
            "Strathbogie Ranges",
            "Southern Fleurieu",
            "Adelaide Hills",
        ],
    ),
    (
        ClimateZone::CoolDry,
        &[
            "Mount Gambier",
            "Henty",
            "Grampians",
            "Kangaroo Island",
            "Sunbury",
            "Wrattonbully",
            "Coonawarra",
            "Robe",
            "Mount Benson",
        ],
    ),
    (ClimateZone::CoolVeryDry, &["Geelong", "Pyrenees"]),
    (ClimateZone::MildDamp, &["Alpine Valleys", "Pemberton", "Tumbarumba"]),
    (
        ClimateZone::MildDry,
        &[
            "Blackwood Valley",
            "Eden Valley",
            "Manjimup",
            "Granite Belt",
            "Currency Creek",
            "Padthaway",
            "Heathcote",
        ],
    ),
    (ClimateZone::MildVeryDry, &["Great Southern", "McLaren Vale", "Bendigo"]),
    (
        ClimateZone::WarmDamp,
        &[
            "Geographe",
            "New England Australia",
            "Shoalhaven Coast",
            "Southern Highlands",
            "Margaret River",
        ],
    ),
    (
        ClimateZone::WarmDry,
        &["Peel", "Gundagai", "Glenrowan", "Pericoota", "Clare Valley", "Mudgee"],
    ),
    (
        ClimateZone::WarmVeryDry,
        &["Rutherglen", "Goulburn Valley", "Langhorne Creek", "Barossa Valley"],
    ),
    (ClimateZone::HotDamp, &["Hunter Valley", "Hastings River"]),
    (
        ClimateZone::HotDry,
        &["Perth Hills", "Swan District", "Southern Flinders Ranges"],
    ),
    (
        ClimateZone::HotVeryDry,
        &[
            "South Burnett",
            "Cowra",
            "Riverina",
            "Adelaide Plains",
            "Riverland",
            "Swan Hill",
            "Murray Darling",
        ],
    ),
];

static CLIMATE_BY_REGION: Lazy<HashMap<&'static str, ClimateZone>> = Lazy::new(|| {
    CLIMATE_REGIONS
        .iter()
        .flat_map(|(zone, regions)| regions.iter().map(move |r| (*r, *zone)))
        .collect()
});

/// Climate zone of a GI region name. Unmapped or missing regions are unknown.
pub fn climate(region: Option<&str>) -> ClimateZone {
    region
        .and_then(|r| CLIMATE_BY_REGION.get(r.trim()).copied())
        .unwrap_or(ClimateZone::Unknown)
}

/// Winery size class by tonnes crushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WinerySize {
    Small,
    Medium,
    Large,
    Unknown,
}

impl WinerySize {
    pub fn label(&self) -> &'static str {
        match self {
            WinerySize::Small => "Small",
            WinerySize::Medium => "Medium",
            WinerySize::Large => "Large",
            WinerySize::Unknown => "Unknown Size",
        }
    }

    /// Parse a label produced by [`WinerySize::label`].
    pub fn from_label(label: &str) -> Self {
        match label {
            "Small" => WinerySize::Small,
            "Medium" => WinerySize::Medium,
            "Large" => WinerySize::Large,
            _ => WinerySize::Unknown,
        }
    }
}

impl fmt::Display for WinerySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Size class from tonnes crushed.
pub fn winery_size(tonnes: Option<f64>) -> WinerySize {
    match tonnes {
        Some(t) if t.is_finite() && t < 500.0 => WinerySize::Small,
        Some(t) if t.is_finite() && t < 10_000.0 => WinerySize::Medium,
        Some(t) if t.is_finite() => WinerySize::Large,
        _ => WinerySize::Unknown,
    }
}

/// Vineyard size band (1-5) from total vineyard hectares.
pub fn vineyard_band(hectares: Option<f64>) -> Option<u8> {
    let ha = hectares.filter(|h| h.is_finite())?;
    let band = if ha < 10.0 {
        1
    } else if ha < 25.0 {
        2
    } else if ha < 50.0 {
        3
    } else if ha < 100.0 {
        4
    } else {
        5
    };
    Some(band)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_climate_lookup() {
        assert_eq!(climate(Some("Yarra Valley")), ClimateZone::CoolDamp);
        assert_eq!(climate(Some("Riverland")), ClimateZone::HotVeryDry);
        assert_eq!(climate(Some("Swan District")), ClimateZone::HotDry);
        assert_eq!(climate(Some("Southern Flinders Ranges")), ClimateZone::HotDry);
        assert_eq!(climate(Some("Atlantis")), ClimateZone::Unknown);
        assert_eq!(climate(None), ClimateZone::Unknown);
    }

    #[test]
    fn test_every_region_maps_once() {
        let total: usize = CLIMATE_REGIONS.iter().map(|(_, r)| r.len()).sum();
        assert_eq!(CLIMATE_BY_REGION.len(), total);
    }

    #[test]
    fn test_winery_size() {
        assert_eq!(winery_size(Some(10.0)), WinerySize::Small);
        assert_eq!(winery_size(Some(500.0)), WinerySize::Medium);
        assert_eq!(winery_size(Some(9_999.9)), WinerySize::Medium);
        assert_eq!(winery_size(Some(10_000.0)), WinerySize::Large);
        assert_eq!(winery_size(None), WinerySize::Unknown);
        assert_eq!(WinerySize::from_label(WinerySize::Large.label()), WinerySize::Large);
    }

    #[test]
    fn test_vineyard_band() {
        assert_eq!(vineyard_band(Some(9.9)), Some(1));
        assert_eq!(vineyard_band(Some(10.0)), Some(2));
        assert_eq!(vineyard_band(Some(49.0)), Some(3));
        assert_eq!(vineyard_band(Some(99.0)), Some(4));
        assert_eq!(vineyard_band(Some(250.0)), Some(5));
        assert_eq!(vineyard_band(None), None);
    }
}
