use std::fmt;
use std::str::FromStr;

/// The three plants the detection model knows about.
///
/// Wire casing differs per endpoint: predict takes the lowercase slug,
/// save and planting take the uppercase code, and the UI shows the
/// capitalized label. Parsing is case-insensitive because plant names
/// arrive from user input and routing parameters in whatever casing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlantKind {
    Tomat,
    Cabai,
    Selada,
}

impl PlantKind {
    pub const ALL: [PlantKind; 3] = [PlantKind::Tomat, PlantKind::Cabai, PlantKind::Selada];

    /// Lowercase wire form used by the predict endpoint.
    pub fn slug(&self) -> &'static str {
        match self {
            PlantKind::Tomat => "tomat",
            PlantKind::Cabai => "cabai",
            PlantKind::Selada => "selada",
        }
    }

    /// Uppercase wire form used by the save and planting endpoints.
    pub fn code(&self) -> &'static str {
        match self {
            PlantKind::Tomat => "TOMAT",
            PlantKind::Cabai => "CABAI",
            PlantKind::Selada => "SELADA",
        }
    }

    /// Display casing.
    pub fn label(&self) -> &'static str {
        match self {
            PlantKind::Tomat => "Tomat",
            PlantKind::Cabai => "Cabai",
            PlantKind::Selada => "Selada",
        }
    }
}

impl FromStr for PlantKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tomat" => Ok(PlantKind::Tomat),
            "cabai" => Ok(PlantKind::Cabai),
            "selada" => Ok(PlantKind::Selada),
            other => Err(format!(
                "Unknown plant type '{}'. Valid options: tomat, cabai, selada",
                other
            )),
        }
    }
}

impl fmt::Display for PlantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
