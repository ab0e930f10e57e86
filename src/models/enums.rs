use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form is also the serde wire value.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
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

str_enum!(MedicationStatus {
    Active => "active",
    Discontinued => "discontinued",
});

str_enum!(TestType {
    Instant15Panel => "15-panel-instant",
    Lab11Panel => "11-panel-lab",
});

str_enum!(ScreeningStatus {
    Pending => "pending",
    Collected => "collected",
    Screened => "screened",
    ConfirmationPending => "confirmation-pending",
    Complete => "complete",
});

str_enum!(ConfirmationVerdict {
    ConfirmedPositive => "confirmed-positive",
    ConfirmedNegative => "confirmed-negative",
    Inconclusive => "inconclusive",
});

str_enum!(ConfirmationDecision {
    RequestConfirmation => "request-confirmation",
    AcceptAsIs => "accept-as-is",
});

str_enum!(ScreenResult {
    Negative => "negative",
    ExpectedPositive => "expected-positive",
    UnexpectedPositive => "unexpected-positive",
    UnexpectedNegativeCritical => "unexpected-negative-critical",
    UnexpectedNegativeWarning => "unexpected-negative-warning",
    MixedUnexpected => "mixed-unexpected",
});

str_enum!(Disposition {
    Pass => "pass",
    Fail => "fail",
});

str_enum!(TimeSlot {
    Morning => "morning",
    LateMorning => "late-morning",
    Afternoon => "afternoon",
});

str_enum!(RecipientKind {
    Client => "client",
    Referral => "referral",
});

/// How loudly a missing expected substance is flagged.
/// Ordered so that `Critical` wins when several medications expect the same substance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegativeSeverity {
    Warning,
    Critical,
}

impl NegativeSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}
