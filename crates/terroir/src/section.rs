//! Survey sections.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A sheet of the annual survey. Each section has its own metrics and checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Vineyard,
    Winery,
}

impl Section {
    pub fn label(&self) -> &'static str {
        match self {
            Section::Vineyard => "vineyard",
            Section::Winery => "winery",
        }
    }

    /// Default report file stem for this section.
    pub fn report_stem(&self) -> String {
        format!("problems_{}", self.label())
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vineyard" => Ok(Section::Vineyard),
            "winery" => Ok(Section::Winery),
            _ => Err(format!("Unknown section: {}. Use vineyard or winery.", s)),
        }
    }
}
