use serde::{Deserialize, Serialize};
use std::fmt;

/// Operational classification of a station at one instant.
///
/// Declaration order is the test priority under the variable policy:
/// when several bands would match, the earliest one wins.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Good,
    OverPressure,
    UnderPressure,
    OutOfService,
}

impl Band {
    /// All bands in priority order.
    pub const ALL: [Band; 4] = [
        Band::Good,
        Band::OverPressure,
        Band::UnderPressure,
        Band::OutOfService,
    ];

    /// Display label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            Band::Good => "Good operation",
            Band::OverPressure => "Over-pressure",
            Band::UnderPressure => "Low pressure",
            Band::OutOfService => "Out of service",
        }
    }

    /// Fixed display color for maps and charts.
    pub fn color(&self) -> &'static str {
        match self {
            Band::Good => "#009d5f",
            Band::OverPressure => "#f4d03f",
            Band::UnderPressure => "#e74c3c",
            Band::OutOfService => "#8e44ad",
        }
    }

    /// Stable machine name, matching the serde representation.
    pub fn key(&self) -> &'static str {
        match self {
            Band::Good => "good",
            Band::OverPressure => "over_pressure",
            Band::UnderPressure => "under_pressure",
            Band::OutOfService => "out_of_service",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::Band;

    #[test]
    fn test_priority_order() {
        let mut bands = vec![Band::OutOfService, Band::Good, Band::UnderPressure, Band::OverPressure];
        bands.sort();
        assert_eq!(bands, Band::ALL.to_vec());
    }

    #[test]
    fn test_palette() {
        assert_eq!(Band::Good.color(), "#009d5f");
        assert_eq!(Band::OverPressure.color(), "#f4d03f");
        assert_eq!(Band::UnderPressure.color(), "#e74c3c");
        assert_eq!(Band::OutOfService.color(), "#8e44ad");
    }
}
