use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field} value: '{value}'")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Sex {
    Male => "male",
    Female => "female",
    Any => "any",
});

str_enum!(Locale {
    Ru => "ru",
    En => "en",
    Fr => "fr",
});

str_enum!(Status {
    Normal => "normal",
    Warning => "warning",
    Critical => "critical",
});

str_enum!(AbnormalFlag {
    Normal => "normal",
    Low => "low",
    High => "high",
    CriticalLow => "critical_low",
    CriticalHigh => "critical_high",
});

str_enum!(UnresolvedReason {
    NoMatch => "no_match",
    AmbiguousMatch => "ambiguous_match",
    UnitConversionFailed => "unit_conversion_failed",
});

str_enum!(Provenance {
    Template => "template",
    Fallback => "fallback",
});

str_enum!(Disposition {
    Accepted => "accepted",
    NeedsReview => "needs_review",
    Rejected => "rejected",
});

impl AbnormalFlag {
    /// Collapse the directional flag into the three-tier status.
    pub fn status(&self) -> Status {
        match self {
            Self::Normal => Status::Normal,
            Self::Low | Self::High => Status::Warning,
            Self::CriticalLow | Self::CriticalHigh => Status::Critical,
        }
    }
}

impl UnresolvedReason {
    /// Unknown analytes are rejected outright; everything else goes to a reviewer.
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::NoMatch => Disposition::Rejected,
            Self::AmbiguousMatch | Self::UnitConversionFailed => Disposition::NeedsReview,
        }
    }
}
