//! The user record and its closed enumerated attributes.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DomainError;

/// Identifier of a user record, assigned by the store at insertion.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

macro_rules! closed_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            /// Wire/storage representation (snake_case).
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($str => Ok(Self::$variant),)+
                    other => Err(DomainError::validation(format!(
                        concat!("invalid ", stringify!($name), ": {}"),
                        other
                    ))),
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_enum! {
    /// User gender.
    Gender {
        Male => "male",
        Female => "female",
        Other => "other",
    }
}

closed_enum! {
    /// Hogwarts house of a user.
    House {
        Gryffindor => "gryffindor",
        Ravenclaw => "ravenclaw",
        Slytherin => "slytherin",
        Hufflepuff => "hufflepuff",
    }
}

closed_enum! {
    /// Blood status of a user.
    BloodStatus {
        PureBlood => "pure_blood",
        MuggleBorn => "muggle_born",
        HalfBlood => "half_blood",
        Squib => "squib",
    }
}

/// A stored user record.
///
/// A record is **live** iff `deleted_at` is unset; deletion is a tombstone
/// timestamp, never a physical removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
    pub gender: Gender,
    pub house: House,
    pub blood_status: BloodStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Payload for creating a user.
///
/// Required fields have no serde defaults, so a missing `name` (or an
/// out-of-enum `house`) fails deserialization before any store interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub age: Option<i32>,
    pub gender: Gender,
    pub house: House,
    pub blood_status: BloodStatus,
}

/// A partial update: only fields explicitly present in the request.
///
/// For `age` (the one nullable attribute) the outer `Option` is presence and
/// the inner `Option` is the value, so `{"age": null}` (set to null) stays
/// distinguishable from omitting `age` (leave unchanged). For the required
/// fields a JSON null is not a legal value and counts as "not provided".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub age: Option<Option<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house: Option<House>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_status: Option<BloodStatus>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    // Field present: capture the inner value, null included.
    Deserialize::deserialize(deserializer).map(Some)
}

impl UserPatch {
    /// Merge this patch onto `user`, leaving absent fields untouched.
    ///
    /// Reapplying the same patch yields the same field values, which is what
    /// lets the worker tolerate at-least-once delivery.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(age) = self.age {
            user.age = age;
        }
        if let Some(gender) = self.gender {
            user.gender = gender;
        }
        if let Some(house) = self.house {
            user.house = house;
        }
        if let Some(blood_status) = self.blood_status {
            user.blood_status = blood_status;
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
