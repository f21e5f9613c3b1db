pub mod bands;
pub mod calculator;

use equip_finance_core::rate_bands::{DefaultRateBands, RateBandSource, StaticBands};

use crate::input;

/// Band source for a run: bands from a file when one is given, the built-in
/// tier table otherwise.
pub(crate) fn band_source(
    path: Option<&str>,
) -> Result<Box<dyn RateBandSource>, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(Box::new(StaticBands(input::file::read_bands(p)?))),
        None => Ok(Box::new(DefaultRateBands)),
    }
}
