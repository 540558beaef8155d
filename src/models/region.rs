//! Static display metadata for countries and regions.

use serde::Serialize;

/// Flag glyph and colour tag for a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegionStyle {
    pub flag: &'static str,
    pub color: &'static str,
}

/// Style used for names missing from the table.
pub const UNKNOWN_REGION: RegionStyle = RegionStyle {
    flag: "🏳️",
    color: "default",
};

const REGIONS: &[(&str, RegionStyle)] = &[
    ("germany", RegionStyle { flag: "🇩🇪", color: "gold" }),
    ("united states", RegionStyle { flag: "🇺🇸", color: "blue" }),
    ("usa", RegionStyle { flag: "🇺🇸", color: "blue" }),
    ("united kingdom", RegionStyle { flag: "🇬🇧", color: "geekblue" }),
    ("uk", RegionStyle { flag: "🇬🇧", color: "geekblue" }),
    ("canada", RegionStyle { flag: "🇨🇦", color: "red" }),
    ("australia", RegionStyle { flag: "🇦🇺", color: "cyan" }),
    ("france", RegionStyle { flag: "🇫🇷", color: "blue" }),
    ("italy", RegionStyle { flag: "🇮🇹", color: "green" }),
    ("spain", RegionStyle { flag: "🇪🇸", color: "volcano" }),
    ("netherlands", RegionStyle { flag: "🇳🇱", color: "orange" }),
    ("portugal", RegionStyle { flag: "🇵🇹", color: "green" }),
    ("austria", RegionStyle { flag: "🇦🇹", color: "red" }),
    ("belgium", RegionStyle { flag: "🇧🇪", color: "gold" }),
    ("switzerland", RegionStyle { flag: "🇨🇭", color: "red" }),
    ("greece", RegionStyle { flag: "🇬🇷", color: "blue" }),
    ("poland", RegionStyle { flag: "🇵🇱", color: "magenta" }),
    ("czech republic", RegionStyle { flag: "🇨🇿", color: "blue" }),
    ("hungary", RegionStyle { flag: "🇭🇺", color: "green" }),
    ("sweden", RegionStyle { flag: "🇸🇪", color: "gold" }),
    ("norway", RegionStyle { flag: "🇳🇴", color: "red" }),
    ("denmark", RegionStyle { flag: "🇩🇰", color: "red" }),
    ("finland", RegionStyle { flag: "🇫🇮", color: "blue" }),
    ("ireland", RegionStyle { flag: "🇮🇪", color: "green" }),
    ("malta", RegionStyle { flag: "🇲🇹", color: "red" }),
    ("new zealand", RegionStyle { flag: "🇳🇿", color: "cyan" }),
    ("japan", RegionStyle { flag: "🇯🇵", color: "red" }),
];

/// Resolve display metadata by name. Total: unknown names get [`UNKNOWN_REGION`].
pub fn lookup(name: &str) -> RegionStyle {
    let key = name.trim().to_lowercase();
    REGIONS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, style)| *style)
        .unwrap_or(UNKNOWN_REGION)
}
