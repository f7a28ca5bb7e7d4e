use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn from_hex(hex: u32) -> Self {
        Self::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// The ten-colour categorical palette from d3.
pub const CATEGORY10: [Rgb; 10] = [
    Rgb::from_hex(0x1f77b4),
    Rgb::from_hex(0xff7f0e),
    Rgb::from_hex(0x2ca02c),
    Rgb::from_hex(0xd62728),
    Rgb::from_hex(0x9467bd),
    Rgb::from_hex(0x8c564b),
    Rgb::from_hex(0xe377c2),
    Rgb::from_hex(0x7f7f7f),
    Rgb::from_hex(0xbcbd22),
    Rgb::from_hex(0x17becf),
];

pub const UNKNOWN: Rgb = Rgb::new(0xcc, 0xcc, 0xcc);

/// Ordinal region → colour mapping, fixed once per dataset.
#[derive(Debug, Clone, Default)]
pub struct ColorAssigner {
    by_region: HashMap<String, Rgb>,
}

impl ColorAssigner {
    /// Colours are handed out in the order given and wrap after ten.
    pub fn new<I, S>(regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut by_region = HashMap::new();
        for region in regions {
            let next = CATEGORY10[by_region.len() % CATEGORY10.len()];
            by_region.entry(region.into()).or_insert(next);
        }
        Self { by_region }
    }

    pub fn color(&self, region: &str) -> Rgb {
        self.by_region.get(region).copied().unwrap_or(UNKNOWN)
    }
}
