use serde::{Deserialize, Serialize};
use sqlx::Type;
use std::fmt;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Type)]
        #[sqlx(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn into_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(ProfessionalId, "Unique identifier for a professional");
define_id!(ServiceId, "Unique identifier for a service");
define_id!(
    ProfessionalServiceId,
    "Unique identifier for a professional/service assignment"
);
define_id!(WorkScheduleId, "Unique identifier for a weekly work schedule row");
define_id!(BreakId, "Unique identifier for a recurring break");
define_id!(ScheduleExceptionId, "Unique identifier for a one-off schedule exception");
define_id!(SlotBlockId, "Unique identifier for a manually declared busy block");
define_id!(ServiceTimeRuleId, "Unique identifier for an allowed-start-time rule");
define_id!(SlotId, "Unique identifier for a slot");
define_id!(ReservationId, "Unique identifier for a reservation");
define_id!(ClientId, "Unique identifier for a client");
define_id!(VehicleId, "Unique identifier for a vehicle");
define_id!(AddressId, "Unique identifier for an address");
define_id!(CommuneId, "Unique identifier for a commune");
define_id!(AdminAuditId, "Unique identifier for an admin audit entry");
define_id!(UserId, "Unique identifier for a linked user identity");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_creation() {
        let id1 = ProfessionalId::new();
        let id2 = ProfessionalId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = ProfessionalId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), &uuid);
    }

    #[test]
    fn test_id_display() {
        let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let id = ReservationId::from_uuid(uuid);
        assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn test_id_parse() {
        let id: ServiceId = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
        assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
    }
}
