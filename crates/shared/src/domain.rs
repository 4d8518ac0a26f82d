use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(NominationId);
id_newtype!(UserId);

/// Dashboard buckets reported by `/nominations/stats/summary` and accepted as
/// the `status` list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKey {
    All,
    ThisMonth,
    ThisWeek,
    OnToday,
    SentReceived,
    Overdue,
}

impl StatusKey {
    /// Display order of the dashboard cards.
    pub const ALL: [StatusKey; 6] = [
        StatusKey::All,
        StatusKey::ThisMonth,
        StatusKey::ThisWeek,
        StatusKey::OnToday,
        StatusKey::SentReceived,
        StatusKey::Overdue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatusKey::All => "all",
            StatusKey::ThisMonth => "this_month",
            StatusKey::ThisWeek => "this_week",
            StatusKey::OnToday => "on_today",
            StatusKey::SentReceived => "sent_received",
            StatusKey::Overdue => "overdue",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusKey::All => "All",
            StatusKey::ThisMonth => "THIS MONTH",
            StatusKey::ThisWeek => "THIS WEEK",
            StatusKey::OnToday => "TODAY",
            StatusKey::SentReceived => "SENT/RECEIVED",
            StatusKey::Overdue => "OVERDUE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the contract a nomination is issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    #[default]
    Seller,
    Buyer,
}

impl Party {
    pub fn as_str(self) -> &'static str {
        match self {
            Party::Seller => "seller",
            Party::Buyer => "buyer",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "seller" => Some(Party::Seller),
            "buyer" => Some(Party::Buyer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    Sent,
    Received,
    Delete,
}

impl BulkAction {
    pub fn as_str(self) -> &'static str {
        match self {
            BulkAction::Sent => "sent",
            BulkAction::Received => "received",
            BulkAction::Delete => "delete",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sent" => Some(BulkAction::Sent),
            "received" => Some(BulkAction::Received),
            "delete" => Some(BulkAction::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_keys_parse_their_wire_names() {
        assert_eq!(StatusKey::parse(" this_week "), Some(StatusKey::ThisWeek));
        assert_eq!(StatusKey::parse("ON_TODAY"), Some(StatusKey::OnToday));
        assert_eq!(StatusKey::parse("later"), None);
        for key in StatusKey::ALL {
            assert_eq!(StatusKey::parse(key.as_str()), Some(key));
        }
    }

    #[test]
    fn party_and_action_parsing_ignores_case() {
        assert_eq!(Party::parse("Buyer"), Some(Party::Buyer));
        assert_eq!(Party::parse("broker"), None);
        assert_eq!(BulkAction::parse("DELETE"), Some(BulkAction::Delete));
        assert_eq!(BulkAction::parse("archive"), None);
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = NominationId::from("n1");
        assert_eq!(serde_json::to_string(&id).expect("encode"), "\"n1\"");
    }
}
