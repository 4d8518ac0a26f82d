//! Plain-text rendering for terminal output.

use std::fmt::Write as _;

use chrono::NaiveDate;
use client_core::{classify, FilterCriteria, ListRow, NominationListing};
use shared::{
    domain::StatusKey,
    protocol::{Nomination, NominationStats, User},
};

const COLUMNS: [&str; 11] = [
    "", "ID", "CONTRACT", "BUYER", "SELLER", "ARRIVAL", "NOM. DATE", "TYPE", "FOR", "ASSIGNEE",
    "STATUS",
];

pub fn nomination_table(
    rows: &[ListRow],
    listing: &NominationListing,
    criteria: &FilterCriteria,
) -> String {
    let cells: Vec<[String; 11]> = rows
        .iter()
        .map(|row| {
            let item = &row.nomination;
            [
                if row.selected { "*" } else { "" }.to_string(),
                item.id.to_string(),
                item.contract_name.clone(),
                item.buyer.clone(),
                item.seller.clone(),
                item.arrival_date.to_string(),
                item.nomination_date.to_string(),
                item.nomination_type.clone(),
                item.for_seller_or_buyer.as_str().to_string(),
                item.assignee_name().to_string(),
                status_cell(item.status_text(), row.category.label()),
            ]
        })
        .collect();

    let mut out = table(&COLUMNS, &cells);
    if rows.is_empty() {
        out.push_str("No nominations found.\n");
    }
    let _ = writeln!(
        out,
        "Page {} of {} ({} nominations)",
        criteria.page,
        criteria.total_pages(listing.page.total),
        listing.page.total
    );
    out
}

fn status_cell(status: &str, urgency: &str) -> String {
    if status.is_empty() {
        urgency.to_string()
    } else {
        status.to_string()
    }
}

pub fn stats_summary(stats: &NominationStats) -> String {
    StatusKey::ALL
        .iter()
        .map(|key| format!("{}: {}", key.label(), stats.count(*key)))
        .collect::<Vec<_>>()
        .join("  |  ")
}

pub fn nomination_detail(item: &Nomination, today: NaiveDate) -> String {
    let assignee = match item.assignee_name() {
        "" => "-",
        name => name,
    };
    let status = match item.status_text() {
        "" => "pending",
        text => text,
    };
    let fields = [
        ("ID", item.id.to_string()),
        ("Contract", item.contract_name.clone()),
        ("Buyer", item.buyer.clone()),
        ("Seller", item.seller.clone()),
        ("Arrival period", item.arrival_date.to_string()),
        ("Nomination date", item.nomination_date.to_string()),
        ("Type", item.nomination_type.clone()),
        ("Keyword", item.nomination_keyword.clone()),
        ("For", item.for_seller_or_buyer.as_str().to_string()),
        ("Assigned to", assignee.to_string()),
        ("Status", status.to_string()),
        ("Urgency", classify(item, today).label().to_string()),
    ];

    let mut out = String::new();
    for (label, value) in fields {
        let _ = writeln!(out, "{label:<16} {value}");
    }
    out
}

pub fn user_table(users: &[User]) -> String {
    let cells: Vec<[String; 3]> = users
        .iter()
        .map(|user| {
            [
                user.id.to_string(),
                user.name.clone(),
                if user.is_admin { "admin" } else { "user" }.to_string(),
            ]
        })
        .collect();
    table(&["ID", "NAME", "ROLE"], &cells)
}

fn table<const N: usize>(header: &[&str; N], rows: &[[String; N]]) -> String {
    let mut widths = header.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, header.iter().copied(), &widths);
    for row in rows {
        push_line(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line = cells
        .zip(widths.iter().copied())
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}
