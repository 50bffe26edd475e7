// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Report building and rendering.
//!
//! A report has one section for the requesting user and one per configured
//! office. A section whose storage reads fail is marked unavailable and
//! rendered as "no data"; the rest of the report is unaffected.

use chrono::NaiveDate;
use futures_util::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::config::Config;
use crate::db::{RepStore, StoreError};
use crate::models::rollup::KindTotals;
use crate::models::stats::per_office_participation;
use crate::models::{rollup_by_date, EntityStats, ExerciseKinds, Office, RepWindow, Rollup};
use crate::services::notices::escape;

/// Key of the requesting user's entry in the JSON feed.
pub const USER_KEY: &str = "user";

/// Aggregated data for one user or office.
#[derive(Debug, Clone)]
pub struct ReportSection {
    pub name: String,
    pub display_name: String,
    /// Roster headcount (1 for a user)
    pub person_count: u64,
    /// Users who have assigned themselves to the office
    pub registered: Option<u64>,
    pub rollup: Rollup,
    pub stats: EntityStats,
    /// False if storage failed while building this section
    pub available: bool,
}

impl ReportSection {
    fn unavailable(name: &str, display_name: &str, person_count: u64) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            person_count,
            registered: None,
            rollup: Rollup::default(),
            stats: EntityStats::for_requesting_user(0),
            available: false,
        }
    }
}

/// Full report for one requester.
#[derive(Debug, Clone)]
pub struct Report {
    pub email: String,
    pub office: Option<String>,
    pub user: ReportSection,
    pub offices: Vec<ReportSection>,
    /// Reporting window as of `today`
    pub window: RepWindow,
    pub today: NaiveDate,
}

/// One entry of the JSON feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedEntry {
    pub display_name: String,
    pub person_count: u64,
    pub totals: KindTotals,
    pub total: u64,
    pub records: Rollup,
}

impl From<&ReportSection> for FeedEntry {
    fn from(section: &ReportSection) -> Self {
        Self {
            display_name: section.display_name.clone(),
            person_count: section.person_count,
            totals: section.rollup.totals_by_kind(),
            total: section.rollup.grand_total(),
            records: section.rollup.clone(),
        }
    }
}

/// Days of the reporting window elapsed as of `today`, at least 1.
pub fn days_elapsed(window: RepWindow, today: NaiveDate) -> u64 {
    let last = today.min(window.end);
    let days = (last - window.start).num_days() + 1;
    u64::try_from(days).unwrap_or(0).max(1)
}

/// Builds reports from the store.
pub struct ReportService<'a> {
    config: &'a Config,
    store: &'a dyn RepStore,
}

impl<'a> ReportService<'a> {
    pub fn new(config: &'a Config, store: &'a dyn RepStore) -> Self {
        Self { config, store }
    }

    /// Build the report for `email` as of `today`.
    pub async fn build(&self, email: &str, today: NaiveDate) -> Report {
        let (user, office) = match self.user_section(email, today).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(email, error = %e, "Failed to load user records for report");
                (ReportSection::unavailable(USER_KEY, email, 1), None)
            }
        };

        Report {
            email: email.to_string(),
            office,
            user,
            offices: self.office_sections(today).await,
            window: self.config.report_window(today),
            today,
        }
    }

    /// One section per configured office, in roster order.
    pub async fn office_sections(&self, today: NaiveDate) -> Vec<ReportSection> {
        let sections = self
            .config
            .offices
            .iter()
            .map(|office| self.office_section(office, today));

        join_all(sections)
            .await
            .into_iter()
            .zip(&self.config.offices)
            .map(|(result, office)| {
                result.unwrap_or_else(|e| {
                    tracing::warn!(office = %office.name, error = %e, "Failed to load office records for report");
                    ReportSection::unavailable(&office.name, &office.display_name, office.headcount)
                })
            })
            .collect()
    }

    async fn user_section(
        &self,
        email: &str,
        today: NaiveDate,
    ) -> Result<(ReportSection, Option<String>), StoreError> {
        let (records, office) = match self.store.find_user_by_email(email).await? {
            Some(user_id) => {
                let window = Some(self.config.report_window(today));
                let records = self.store.fetch_records_by_user(&user_id, window).await?;
                let office = self.store.user_office(&user_id).await?;
                (records, office)
            }
            None => (Vec::new(), None),
        };

        let rollup = rollup_by_date(&records, today);
        let section = ReportSection {
            name: USER_KEY.to_string(),
            display_name: email.to_string(),
            person_count: 1,
            registered: None,
            stats: EntityStats::for_requesting_user(rollup.grand_total()),
            rollup,
            available: true,
        };
        Ok((section, office))
    }

    async fn office_section(
        &self,
        office: &Office,
        today: NaiveDate,
    ) -> Result<ReportSection, StoreError> {
        let window = self.config.report_window(today);
        let records = self
            .store
            .fetch_records_by_office(&office.name, Some(window))
            .await?;
        let registered = self.store.count_users_in_office(&office.name).await?;

        let rollup = rollup_by_date(&records, today);
        let counts = per_office_participation(&records, office);
        let days = u32::try_from(days_elapsed(window, today)).unwrap_or(u32::MAX);

        Ok(ReportSection {
            name: office.name.clone(),
            display_name: office.display_name.clone(),
            person_count: office.headcount,
            registered: Some(registered),
            stats: EntityStats::for_office(rollup.grand_total(), counts, days),
            rollup,
            available: true,
        })
    }
}

/// Stats of every office section that loaded, keyed by office name.
pub fn office_stats(sections: &[ReportSection]) -> BTreeMap<String, EntityStats> {
    sections
        .iter()
        .filter(|s| s.available)
        .map(|s| (s.name.clone(), s.stats))
        .collect()
}

/// JSON feed: one entry per office plus the requesting user.
pub fn feed(report: &Report) -> BTreeMap<String, FeedEntry> {
    let mut entries: BTreeMap<String, FeedEntry> = report
        .offices
        .iter()
        .map(|s| (s.name.clone(), FeedEntry::from(s)))
        .collect();
    entries.insert(USER_KEY.to_string(), FeedEntry::from(&report.user));
    entries
}

const PAGE_STYLE: &str = "body{font-family:sans-serif;margin:2em}\
table{border-collapse:collapse;margin-bottom:1em}\
th,td{border:1px solid #ccc;padding:4px 8px;text-align:right}\
th:first-child,td:first-child{text-align:left}\
.no-data{color:#888}";

/// Render the report as an HTML page.
///
/// Tables are dense: every day of the window up to today gets a row, with
/// zeros for kinds that had no reps.
pub fn render_html(report: &Report, config: &Config) -> String {
    let kinds = &config.ingest.kinds;
    let RepWindow { start, end } = report.window;
    let seed_to = report.today.min(end);

    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>CountMyReps</title>\
         <style>{}</style></head><body><h1>CountMyReps</h1>",
        PAGE_STYLE
    );

    let office = report
        .office
        .as_deref()
        .map(|o| format!(" ({})", escape(o)))
        .unwrap_or_default();
    let _ = write!(
        html,
        "<p>Stats for {}{} from {} through {}</p>",
        escape(&report.email),
        office,
        start,
        end
    );

    let sections = std::iter::once(&report.user).chain(&report.offices);
    for section in sections {
        let mut rollup = section.rollup.clone();
        if section.available && start <= seed_to {
            rollup.seed_calendar(start, seed_to, kinds);
        }
        render_section(&mut html, section, &rollup, kinds);
    }

    html.push_str("</body></html>");
    html
}

fn render_section(html: &mut String, section: &ReportSection, rollup: &Rollup, kinds: &ExerciseKinds) {
    let _ = write!(html, "<h2>{}</h2>", escape(&section.display_name));

    if !section.available {
        html.push_str("<p class=\"no-data\">No data</p>");
        return;
    }

    html.push_str("<table><thead><tr><th>Date</th>");
    for kind in kinds.iter() {
        let _ = write!(html, "<th>{}</th>", escape(kind));
    }
    html.push_str("</tr></thead><tbody>");

    for (key, totals) in rollup.iter() {
        let _ = write!(html, "<tr><td>{}</td>", escape(key));
        for kind in kinds.iter() {
            let _ = write!(html, "<td>{}</td>", totals.get(kind).copied().unwrap_or(0));
        }
        html.push_str("</tr>");
    }

    let totals = rollup.totals_by_kind();
    html.push_str("</tbody><tfoot><tr><th>Total</th>");
    for kind in kinds.iter() {
        let _ = write!(html, "<th>{}</th>", totals.get(kind).copied().unwrap_or(0));
    }
    html.push_str("</tr></tfoot></table>");

    let stats = &section.stats;
    let _ = write!(
        html,
        "<ul class=\"stats\">\
         <li>Grand total: {}</li>\
         <li>Reps per person: {}</li>\
         <li>Reps per participating person: {}</li>\
         <li>Reps per person per day: {}</li>\
         <li>Percent participating: {}</li>",
        stats.grand_total,
        stats.reps_per_person,
        stats.reps_per_person_participating,
        stats.reps_per_person_per_day,
        stats.percent_participating
    );
    if let Some(registered) = section.registered {
        let _ = write!(html, "<li>Signed up: {}</li>", registered);
    }
    html.push_str("</ul>");
}
