use chrono::{Datelike, Duration, NaiveDate};
use shared::{domain::StatusKey, protocol::Nomination};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowCategory {
    Resolved,
    DueToday,
    DueThisWeek,
    DueThisMonth,
    Overdue,
    Upcoming,
}

impl RowCategory {
    pub fn label(self) -> &'static str {
        match self {
            RowCategory::Resolved => "resolved",
            RowCategory::DueToday => "today",
            RowCategory::DueThisWeek => "this week",
            RowCategory::DueThisMonth => "this month",
            RowCategory::Overdue => "overdue",
            RowCategory::Upcoming => "upcoming",
        }
    }

    /// Dashboard bucket the row is counted under; upcoming rows only appear
    /// under "all".
    pub fn status_key(self) -> Option<StatusKey> {
        match self {
            RowCategory::Resolved => Some(StatusKey::SentReceived),
            RowCategory::DueToday => Some(StatusKey::OnToday),
            RowCategory::DueThisWeek => Some(StatusKey::ThisWeek),
            RowCategory::DueThisMonth => Some(StatusKey::ThisMonth),
            RowCategory::Overdue => Some(StatusKey::Overdue),
            RowCategory::Upcoming => None,
        }
    }
}

/// Urgency of a row as of `now`. Rules are checked in order and the first match
/// wins, so a resolved nomination is never reported as due.
pub fn classify(item: &Nomination, now: NaiveDate) -> RowCategory {
    if item.sent || item.received {
        return RowCategory::Resolved;
    }

    let date = item.nomination_date;
    if date == now {
        RowCategory::DueToday
    } else if date > now && week_start(date) == week_start(now) {
        RowCategory::DueThisWeek
    } else if date > now && date.year() == now.year() && date.month() == now.month() {
        RowCategory::DueThisMonth
    } else if date < now {
        RowCategory::Overdue
    } else {
        RowCategory::Upcoming
    }
}

// Weeks start on Sunday.
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}
