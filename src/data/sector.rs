//! GICS-style sector classification for the equity universe.
//!
//! Pair candidates are only formed within a sector; symbols that are not
//! in the classification table never pair.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sector {
    ConsumerStaples, // KO, PEP, PG, CL
    Financials,      // JPM, BAC, V, MA, GS
    Energy,          // XOM, CVX, COP
    Technology,      // MSFT, ORCL, INTC, AMD
    Healthcare,      // JNJ, PFE, MRK, UNH
    Retail,          // WMT, TGT, COST, HD
    Industrials,     // CAT, BA, GE
    Airlines,        // DAL, UAL, AAL, LUV
    Telecom,         // T, VZ
    Automotive,      // F, GM, TSLA
    Unknown,
}

lazy_static! {
    static ref TICKER_SECTORS: HashMap<&'static str, Sector> = {
        let mut m = HashMap::new();

        // Consumer Staples
        m.insert("KO", Sector::ConsumerStaples);
        m.insert("PEP", Sector::ConsumerStaples);
        m.insert("PG", Sector::ConsumerStaples);
        m.insert("CL", Sector::ConsumerStaples);
        m.insert("KHC", Sector::ConsumerStaples);
        m.insert("GIS", Sector::ConsumerStaples);
        m.insert("MO", Sector::ConsumerStaples);
        m.insert("PM", Sector::ConsumerStaples);
        m.insert("KMB", Sector::ConsumerStaples);

        // Financials - Banks
        m.insert("JPM", Sector::Financials);
        m.insert("BAC", Sector::Financials);
        m.insert("WFC", Sector::Financials);
        m.insert("C", Sector::Financials);
        m.insert("GS", Sector::Financials);
        m.insert("MS", Sector::Financials);
        // Financials - Payment Networks
        m.insert("V", Sector::Financials);
        m.insert("MA", Sector::Financials);
        m.insert("AXP", Sector::Financials);
        m.insert("PYPL", Sector::Financials);

        // Energy
        m.insert("XOM", Sector::Energy);
        m.insert("CVX", Sector::Energy);
        m.insert("COP", Sector::Energy);
        m.insert("OXY", Sector::Energy);
        m.insert("EOG", Sector::Energy);
        m.insert("SLB", Sector::Energy);
        m.insert("HAL", Sector::Energy);

        // Technology
        m.insert("MSFT", Sector::Technology);
        m.insert("ORCL", Sector::Technology);
        m.insert("CRM", Sector::Technology);
        m.insert("IBM", Sector::Technology);
        m.insert("INTC", Sector::Technology);
        m.insert("AMD", Sector::Technology);
        m.insert("NVDA", Sector::Technology);
        m.insert("AVGO", Sector::Technology);
        m.insert("QCOM", Sector::Technology);
        m.insert("TXN", Sector::Technology);
        m.insert("AAPL", Sector::Technology);
        m.insert("GOOGL", Sector::Technology);
        m.insert("META", Sector::Technology);

        // Healthcare
        m.insert("JNJ", Sector::Healthcare);
        m.insert("PFE", Sector::Healthcare);
        m.insert("MRK", Sector::Healthcare);
        m.insert("ABBV", Sector::Healthcare);
        m.insert("UNH", Sector::Healthcare);
        m.insert("LLY", Sector::Healthcare);
        m.insert("BMY", Sector::Healthcare);
        m.insert("AMGN", Sector::Healthcare);

        // Retail
        m.insert("WMT", Sector::Retail);
        m.insert("TGT", Sector::Retail);
        m.insert("COST", Sector::Retail);
        m.insert("HD", Sector::Retail);
        m.insert("LOW", Sector::Retail);
        m.insert("AMZN", Sector::Retail);
        m.insert("EBAY", Sector::Retail);

        // Industrials
        m.insert("CAT", Sector::Industrials);
        m.insert("BA", Sector::Industrials);
        m.insert("GE", Sector::Industrials);
        m.insert("HON", Sector::Industrials);
        m.insert("UPS", Sector::Industrials);
        m.insert("FDX", Sector::Industrials);
        m.insert("MMM", Sector::Industrials);

        // Airlines
        m.insert("DAL", Sector::Airlines);
        m.insert("UAL", Sector::Airlines);
        m.insert("AAL", Sector::Airlines);
        m.insert("LUV", Sector::Airlines);
        m.insert("JBLU", Sector::Airlines);

        // Telecom
        m.insert("T", Sector::Telecom);
        m.insert("VZ", Sector::Telecom);
        m.insert("TMUS", Sector::Telecom);

        // Automotive
        m.insert("F", Sector::Automotive);
        m.insert("GM", Sector::Automotive);
        m.insert("TSLA", Sector::Automotive);
        m.insert("RIVN", Sector::Automotive);

        m
    };
}

pub fn sector_of(symbol: &str) -> Sector {
    match TICKER_SECTORS.get(symbol) {
        Some(sector) => *sector,
        None => {
            debug!(
                symbol = %symbol,
                "Unknown sector mapping - symbol not in classification table"
            );
            Sector::Unknown
        }
    }
}

/// Check if two symbols belong to the same sector.
///
/// Unknown sectors never match, including against each other.
pub fn same_sector(a: &str, b: &str) -> bool {
    let sector_a = sector_of(a);
    let sector_b = sector_of(b);

    if sector_a == Sector::Unknown || sector_b == Sector::Unknown {
        return false;
    }

    sector_a == sector_b
}
