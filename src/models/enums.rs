use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form is also the serde representation.
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

str_enum!(AppointmentKind {
    Consultation => "consultation",
    FollowUp => "follow-up",
    Procedure => "procedure",
    Emergency => "emergency",
});

impl AppointmentKind {
    pub const ALL: [AppointmentKind; 4] = [
        Self::Consultation,
        Self::FollowUp,
        Self::Procedure,
        Self::Emergency,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Consultation => "Consultation",
            Self::FollowUp => "Follow-up",
            Self::Procedure => "Procedure",
            Self::Emergency => "Emergency",
        }
    }

    /// Expected visit length, used for the calendar event end.
    pub fn duration_minutes(&self) -> i64 {
        match self {
            Self::Consultation => 30,
            Self::FollowUp => 20,
            Self::Procedure => 60,
            Self::Emergency => 15,
        }
    }
}

impl Default for AppointmentKind {
    fn default() -> Self {
        Self::Consultation
    }
}

str_enum!(SlotPeriod {
    Morning => "morning",
    Midday => "midday",
    Afternoon => "afternoon",
    Evening => "evening",
});

impl SlotPeriod {
    /// Bucket an hour of day: morning <10, midday <14, afternoon <17.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            h if h < 10 => Self::Morning,
            h if h < 14 => Self::Midday,
            h if h < 17 => Self::Afternoon,
            _ => Self::Evening,
        }
    }
}

str_enum!(BookingStatus {
    Confirmed => "confirmed",
});

str_enum!(ServiceCategory {
    Emergency => "emergency",
    Surgical => "surgical",
    Diagnostic => "diagnostic",
    Specialty => "specialty",
});

impl ServiceCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Emergency => "Emergency Care",
            Self::Surgical => "Surgical Services",
            Self::Diagnostic => "Diagnostic",
            Self::Specialty => "Specialty Care",
        }
    }
}

str_enum!(StepStatus {
    Completed => "completed",
    Active => "active",
    Upcoming => "upcoming",
});

str_enum!(NotificationKind {
    Success => "success",
    Error => "error",
    Info => "info",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn appointment_kind_round_trips_through_str() {
        for kind in AppointmentKind::ALL {
            assert_eq!(AppointmentKind::from_str(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn appointment_kind_durations() {
        assert_eq!(AppointmentKind::Consultation.duration_minutes(), 30);
        assert_eq!(AppointmentKind::FollowUp.duration_minutes(), 20);
        assert_eq!(AppointmentKind::Procedure.duration_minutes(), 60);
        assert_eq!(AppointmentKind::Emergency.duration_minutes(), 15);
    }

    #[test]
    fn unknown_kind_is_invalid_enum() {
        let err = AppointmentKind::from_str("surgery").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
    }

    #[test]
    fn serde_uses_string_form() {
        let json = serde_json::to_string(&AppointmentKind::FollowUp).unwrap();
        assert_eq!(json, "\"follow-up\"");
        let back: AppointmentKind = serde_json::from_str("\"procedure\"").unwrap();
        assert_eq!(back, AppointmentKind::Procedure);
    }

    #[test]
    fn period_buckets() {
        assert_eq!(SlotPeriod::from_hour(8), SlotPeriod::Morning);
        assert_eq!(SlotPeriod::from_hour(9), SlotPeriod::Morning);
        assert_eq!(SlotPeriod::from_hour(10), SlotPeriod::Midday);
        assert_eq!(SlotPeriod::from_hour(13), SlotPeriod::Midday);
        assert_eq!(SlotPeriod::from_hour(14), SlotPeriod::Afternoon);
        assert_eq!(SlotPeriod::from_hour(16), SlotPeriod::Afternoon);
        assert_eq!(SlotPeriod::from_hour(17), SlotPeriod::Evening);
    }

    #[test]
    fn default_kind_is_consultation() {
        assert_eq!(AppointmentKind::default(), AppointmentKind::Consultation);
    }
}
