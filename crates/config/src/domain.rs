//! Rental domain data — the structured knowledge the system prompt is
//! rendered from. Immutable after load.
//!
//! Defaults carry 2024 averages for the four major Dutch expat cities.

use serde::{Deserialize, Serialize};

/// A min–max range in whole euros per month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: u32,
    pub max: u32,
}

impl PriceRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// Rental price averages for one city.
///
/// Kept as an ordered list rather than a map so price rows render in the
/// configured city order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityPrices {
    pub city: String,
    pub one_bed: PriceRange,
    pub two_bed: PriceRange,
}

/// Static domain data substituted into the system prompt template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainData {
    /// Major expat cities, in presentation order
    #[serde(default = "default_cities")]
    pub cities: Vec<String>,

    /// Price table, one entry per city
    #[serde(default = "default_prices")]
    pub prices: Vec<CityPrices>,

    /// Monthly utilities range in euros
    #[serde(default = "default_utilities")]
    pub utilities: PriceRange,

    /// Documents required to rent
    #[serde(default = "default_documents")]
    pub documents: Vec<String>,

    /// Common scam warning lines
    #[serde(default = "default_scam_warnings")]
    pub scam_warnings: Vec<String>,
}

impl Default for DomainData {
    fn default() -> Self {
        Self {
            cities: default_cities(),
            prices: default_prices(),
            utilities: default_utilities(),
            documents: default_documents(),
            scam_warnings: default_scam_warnings(),
        }
    }
}

impl DomainData {
    /// Check internal consistency: every listed city needs a price entry.
    pub fn validate(&self) -> Result<(), String> {
        if self.cities.is_empty() {
            return Err("domain.cities must not be empty".into());
        }
        for city in &self.cities {
            if !self.prices.iter().any(|p| &p.city == city) {
                return Err(format!("domain.prices is missing an entry for '{city}'"));
            }
        }
        if self.utilities.min > self.utilities.max {
            return Err("domain.utilities range is inverted".into());
        }
        Ok(())
    }
}

fn default_cities() -> Vec<String> {
    ["Amsterdam", "Utrecht", "Rotterdam", "The Hague"]
        .map(String::from)
        .to_vec()
}

fn default_prices() -> Vec<CityPrices> {
    vec![
        CityPrices {
            city: "Amsterdam".into(),
            one_bed: PriceRange::new(1500, 1900),
            two_bed: PriceRange::new(2000, 2600),
        },
        CityPrices {
            city: "Utrecht".into(),
            one_bed: PriceRange::new(1200, 1500),
            two_bed: PriceRange::new(1600, 2000),
        },
        CityPrices {
            city: "Rotterdam".into(),
            one_bed: PriceRange::new(1000, 1300),
            two_bed: PriceRange::new(1400, 1800),
        },
        CityPrices {
            city: "The Hague".into(),
            one_bed: PriceRange::new(1100, 1400),
            two_bed: PriceRange::new(1500, 1900),
        },
    ]
}

fn default_utilities() -> PriceRange {
    PriceRange::new(120, 180)
}

fn default_documents() -> Vec<String> {
    [
        "Valid passport or ID",
        "BSN (Burgerservicenummer) from municipality registration",
        "Proof of income with 3 recent payslips or employment contract",
        "Dutch bank account from ING ABN AMRO or Rabobank",
        "Residence permit if non-EU",
        "Proof of rental insurance sometimes required",
        "References from previous landlord optional but helpful",
    ]
    .map(String::from)
    .to_vec()
}

fn default_scam_warnings() -> Vec<String> {
    [
        "Never pay deposit before viewing property in person",
        "Avoid landlords who claim to be abroad and cannot show property",
        "Be suspicious of prices far below market rate",
        "Never wire money via Western Union or untraceable methods",
        "Verify landlord identity and property ownership",
        "Use official platforms like Funda Pararius Kamernet",
        "Watch for urgent pressure to pay immediately",
    ]
    .map(String::from)
    .to_vec()
}
