use core::fmt;
use std::str::FromStr;

use anyhow::bail;
use clap::ValueEnum;
use serde_with::{DeserializeFromStr, SerializeDisplay};

/// A retailer integration. Each one knows a single API shape.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    DeserializeFromStr,
    SerializeDisplay,
    ValueEnum,
)]
pub enum Source {
    #[value(name = "dan_murphys")]
    DanMurphys,
    #[value(name = "bws")]
    Bws,
    #[value(name = "liquorland")]
    Liquorland,
    #[value(name = "first_choice")]
    FirstChoice,
    #[value(name = "coles")]
    Coles,
    #[value(name = "woolworths")]
    Woolworths,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.slug())
    }
}

impl FromStr for Source {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "dan_murphys" => Self::DanMurphys,
            "bws" => Self::Bws,
            "liquorland" => Self::Liquorland,
            "first_choice" => Self::FirstChoice,
            "coles" => Self::Coles,
            "woolworths" => Self::Woolworths,
            _ => bail!(
                "Unknown source: {s:?} (expected one of {})",
                Self::all()
                    .iter()
                    .map(|x| x.slug())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        })
    }
}

impl Source {
    pub fn all() -> Vec<Self> {
        vec![
            Self::DanMurphys,
            Self::Bws,
            Self::Liquorland,
            Self::FirstChoice,
            Self::Coles,
            Self::Woolworths,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::DanMurphys => "Dan Murphy's",
            Self::Bws => "BWS",
            Self::Liquorland => "Liquorland",
            Self::FirstChoice => "First Choice Liquor",
            Self::Coles => "Coles",
            Self::Woolworths => "Woolworths",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Self::DanMurphys => "dan_murphys",
            Self::Bws => "bws",
            Self::Liquorland => "liquorland",
            Self::FirstChoice => "first_choice",
            Self::Coles => "coles",
            Self::Woolworths => "woolworths",
        }
    }
}
