use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// Only these road classes enter the vulnerability graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HighwayClass {
    Motorway,
    MotorwayLink,
    Trunk,
    TrunkLink,
    Primary,
    PrimaryLink,
    Secondary,
    SecondaryLink,
    Tertiary,
    TertiaryLink,
}

/// Major highway classes used by the default allow-list.
pub const MAJOR: [HighwayClass; 10] = [
    HighwayClass::Motorway,
    HighwayClass::MotorwayLink,
    HighwayClass::Trunk,
    HighwayClass::TrunkLink,
    HighwayClass::Primary,
    HighwayClass::PrimaryLink,
    HighwayClass::Secondary,
    HighwayClass::SecondaryLink,
    HighwayClass::Tertiary,
    HighwayClass::TertiaryLink,
];

impl HighwayClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            HighwayClass::Motorway => "motorway",
            HighwayClass::MotorwayLink => "motorway_link",
            HighwayClass::Trunk => "trunk",
            HighwayClass::TrunkLink => "trunk_link",
            HighwayClass::Primary => "primary",
            HighwayClass::PrimaryLink => "primary_link",
            HighwayClass::Secondary => "secondary",
            HighwayClass::SecondaryLink => "secondary_link",
            HighwayClass::Tertiary => "tertiary",
            HighwayClass::TertiaryLink => "tertiary_link",
        }
    }
}

impl fmt::Display for HighwayClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HighwayClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "motorway" => Ok(HighwayClass::Motorway),
            "motorway_link" => Ok(HighwayClass::MotorwayLink),
            "trunk" => Ok(HighwayClass::Trunk),
            "trunk_link" => Ok(HighwayClass::TrunkLink),
            "primary" => Ok(HighwayClass::Primary),
            "primary_link" => Ok(HighwayClass::PrimaryLink),
            "secondary" => Ok(HighwayClass::Secondary),
            "secondary_link" => Ok(HighwayClass::SecondaryLink),
            "tertiary" => Ok(HighwayClass::Tertiary),
            "tertiary_link" => Ok(HighwayClass::TertiaryLink),
            _ => Err(format!("Failed to parse highway class '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for class in MAJOR {
            assert_eq!(class.as_str().parse::<HighwayClass>().unwrap(), class);
        }
    }

    #[test]
    fn rejects_minor_classes() {
        assert!("residential".parse::<HighwayClass>().is_err());
        assert!("service".parse::<HighwayClass>().is_err());
    }
}
