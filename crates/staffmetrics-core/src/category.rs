//! Finite category vocabularies.
//!
//! Records store these values as text, so the enums are the canonical
//! spelling used by the generator and by documentation, not a storage type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

macro_rules! category {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str() == value)
                    .ok_or_else(|| Error::UnknownCategory {
                        kind: $kind,
                        value: value.to_string(),
                    })
            }
        }
    };
}

category! {
    /// Organisational departments.
    Department, "department" {
        Engineering => "Engineering",
        Marketing => "Marketing",
        Sales => "Sales",
        Hr => "HR",
        Finance => "Finance",
        Product => "Product",
        Operations => "Operations",
    }
}

category! {
    /// Seniority ladder.
    Position, "position" {
        Intern => "Intern",
        Junior => "Junior",
        MidLevel => "Mid-Level",
        Senior => "Senior",
        Lead => "Lead",
        Manager => "Manager",
        Director => "Director",
        Vp => "VP",
        CLevel => "C-Level",
    }
}

category! {
    Gender, "gender" {
        Male => "Male",
        Female => "Female",
        NonBinary => "Non-Binary",
    }
}

category! {
    /// Daily attendance outcome.
    AttendanceStatus, "attendance status" {
        Present => "Present",
        Absent => "Absent",
        Late => "Late",
        Remote => "Remote",
        HalfDay => "Half-Day",
        SickLeave => "Sick-Leave",
        Pto => "PTO",
    }
}

impl AttendanceStatus {
    /// Whether a stored status string means the employee did not work.
    pub fn is_absent(status: &str) -> bool {
        status == AttendanceStatus::Absent.as_str()
    }
}
