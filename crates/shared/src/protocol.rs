use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{BulkAction, NominationId, Party, StatusKey, UserId};

/// Calendar dates travel either as `YYYY-MM-DD` or as a full ISO-8601
/// timestamp; only the leading date part is meaningful to the client.
pub mod calendar_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d";

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        let date_part = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(date_part, FORMAT).ok()
    }

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid calendar date '{raw}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "UserRefWire")]
pub struct UserRef {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UserRefWire {
    Populated {
        #[serde(rename = "_id")]
        id: UserId,
        #[serde(default)]
        name: Option<String>,
    },
    Bare(UserId),
}

impl From<UserRefWire> for UserRef {
    fn from(value: UserRefWire) -> Self {
        match value {
            UserRefWire::Populated { id, name } => Self { id, name },
            UserRefWire::Bare(id) => Self { id, name: None },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nomination {
    #[serde(rename = "_id")]
    pub id: NominationId,
    pub contract_name: String,
    #[serde(default)]
    pub buyer: String,
    #[serde(default)]
    pub seller: String,
    #[serde(rename = "arrival_period", with = "calendar_date")]
    pub arrival_date: NaiveDate,
    #[serde(with = "calendar_date")]
    pub nomination_date: NaiveDate,
    #[serde(default)]
    pub nomination_type: String,
    #[serde(default)]
    pub nomination_keyword: String,
    #[serde(default)]
    pub for_seller_or_buyer: Party,
    #[serde(default)]
    pub sent: bool,
    #[serde(default)]
    pub received: bool,
    #[serde(rename = "user_id", default, skip_serializing_if = "Option::is_none")]
    pub assigned_user: Option<UserRef>,
}

impl Nomination {
    /// Text for the status column. `sent` wins when both flags are set.
    pub fn status_text(&self) -> &'static str {
        if self.sent {
            "Sent"
        } else if self.received {
            "Received"
        } else {
            ""
        }
    }

    pub fn assignee_name(&self) -> &str {
        self.assigned_user
            .as_ref()
            .and_then(|user| user.name.as_deref())
            .unwrap_or("")
    }
}

/// Body of `POST /nominations` and `PUT /nominations/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NominationInput {
    pub contract_name: String,
    pub buyer: String,
    pub seller: String,
    #[serde(with = "calendar_date")]
    pub arrival_period: NaiveDate,
    #[serde(with = "calendar_date")]
    pub nomination_date: NaiveDate,
    pub nomination_type: String,
    pub nomination_keyword: String,
    pub for_seller_or_buyer: Party,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListNominationsQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusKey>,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NominationPage {
    #[serde(default)]
    pub nominations: Vec<Nomination>,
    #[serde(default)]
    pub total: u64,
}

/// Per-bucket counts from `/nominations/stats/summary`. Buckets the backend
/// omits count as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NominationStats(pub BTreeMap<String, u64>);

impl NominationStats {
    pub fn count(&self, key: StatusKey) -> u64 {
        self.0.get(key.as_str()).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignRequest {
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUpdateRequest {
    pub ids: Vec<NominationId>,
    pub action: BulkAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentResponse {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInput {
    pub name: String,
    pub password: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}
