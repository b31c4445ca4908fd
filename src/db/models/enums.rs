//! Closed vocabularies shared by request payloads (serde) and storage (TEXT columns).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident, $label:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Convert from string (case-insensitive)
            pub fn parse(s: &str) -> Option<Self> {
                match s.to_lowercase().as_str() {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Convert to the stored string
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl TryFrom<&str> for $name {
            type Error = String;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::parse(value).ok_or_else(|| format!("Invalid {}: {}", $label, value))
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::try_from(value.as_str())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum!(
    /// Marketplace role chosen during onboarding. An unset role is `None` on the user.
    Role, "role" {
        Creator => "creator",
        Sponsor => "sponsor",
        Both => "both",
    }
);

text_enum!(
    /// Creator availability. Only `available` creators are listed in the directory.
    CreatorStatus, "creator status" {
        Available => "available",
        Unavailable => "unavailable",
        Hidden => "hidden",
    }
);

text_enum!(
    /// Sponsor visibility. Only `active` sponsors are listed in the directory.
    SponsorStatus, "sponsor status" {
        Active => "active",
        Inactive => "inactive",
        Hidden => "hidden",
    }
);

text_enum!(
    /// How sponsors should reach a creator.
    ContactMethod, "contact method" {
        Twitter => "twitter",
        Email => "email",
        Other => "other",
    }
);

impl Role {
    pub fn is_creator(self) -> bool {
        matches!(self, Role::Creator | Role::Both)
    }

    pub fn is_sponsor(self) -> bool {
        matches!(self, Role::Sponsor | Role::Both)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Role::parse("BOTH"), Some(Role::Both));
        assert_eq!(CreatorStatus::parse("Hidden"), Some(CreatorStatus::Hidden));
        assert_eq!(SponsorStatus::parse("paused"), None);
    }

    #[test]
    fn try_from_reports_the_vocabulary() {
        let err = ContactMethod::try_from("fax").unwrap_err();
        assert_eq!(err, "Invalid contact method: fax");
    }

    #[test]
    fn serde_matches_stored_text() {
        assert_eq!(serde_json::to_string(&Role::Creator).unwrap(), "\"creator\"");
        let status: SponsorStatus = serde_json::from_str("\"inactive\"").unwrap();
        assert_eq!(status.as_str(), "inactive");
        assert!(serde_json::from_str::<Role>("\"unset\"").is_err());
    }

    #[test]
    fn role_capabilities() {
        assert!(Role::Both.is_creator() && Role::Both.is_sponsor());
        assert!(Role::Creator.is_creator() && !Role::Creator.is_sponsor());
        assert!(!Role::Sponsor.is_creator() && Role::Sponsor.is_sponsor());
    }
}
