//! Typed record identifiers.
//!
//! Every record kind gets its own identifier type so that, for example, a client id can never be
//! passed where an appointment id is expected. All of them wrap a v4 [`Uuid`] and serialise as
//! the plain hyphenated UUID string.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
            utoipa::ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Allocates a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn uuid(&self) -> Uuid {
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

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

typed_id!(
    /// Identity of a scheduled visit.
    AppointmentId
);
typed_id!(
    /// Identity of a client (service user).
    ClientId
);
typed_id!(
    /// Identity of a staff member.
    StaffId
);
typed_id!(SeizureId);
typed_id!(IncidentId);
typed_id!(MedicationId);
typed_id!(BodyMapId);
typed_id!(LocationLogId);
typed_id!(InvoiceGroupId);
typed_id!(
    /// Identity of a free-text visit note.
    NoteId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hyphenated_uuid() {
        let id: AppointmentId = "7f4c2e9d-4b0a-4f3a-9a2c-0e9a6b5d1c88"
            .parse()
            .expect("valid uuid");
        assert_eq!(id.to_string(), "7f4c2e9d-4b0a-4f3a-9a2c-0e9a6b5d1c88");
    }

    #[test]
    fn rejects_garbage() {
        assert!("not-a-uuid".parse::<ClientId>().is_err());
    }

    #[test]
    fn serialises_transparently() {
        let id = StaffId::from_uuid(Uuid::nil());
        let json = serde_json::to_string(&id).expect("serialise");
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }
}
