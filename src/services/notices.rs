//! Bodies of the emails sent back to submitters.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::config::Config;
use crate::models::stats::lead_office;
use crate::models::EntityStats;
use crate::services::notify::Notice;
use crate::services::validator::RejectReason;
use crate::time_utils::format_utc_rfc3339;

/// What the sender should hear about their rejected submission.
fn reason_message(reason: RejectReason, config: &Config, recipient: &str, subject: &str) -> String {
    match reason {
        RejectReason::WrongAddress => format!(
            "CountMyReps only accepts emails to {}, you sent to \"{}\"",
            escape(&config.ingest.address),
            escape(recipient)
        ),
        RejectReason::NonNumericValue => format!(
            "CountMyReps was unable to parse your subject. Please provide {} comma separated numbers where the numbers represent {} respectively. You provided \"{}\"",
            config.ingest.kinds.len(),
            escape(&config.ingest.kinds.iter().collect::<Vec<_>>().join(", ")),
            escape(subject)
        ),
    }
}

fn office_list(config: &Config) -> String {
    config
        .offices
        .iter()
        .map(|o| escape(&o.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rejection notice addressed to the sender with the operator copied.
///
/// Without a usable sender the operator becomes the only recipient.
pub fn rejection_notice(
    config: &Config,
    sender: &str,
    recipient: &str,
    subject: &str,
    reason: RejectReason,
    at: DateTime<Utc>,
) -> Notice {
    let html = format!(
        "<h3>Uh oh!</h3>\
         <p>There was an error with your CountMyReps Submission.<br /><br />\
         Make sure that you addressed your email to {address}<br />\
         Make sure that your subject line was {count} comma separated numbers<br />\
         If you were trying to set your office location, make sure you choose one from:<br />\
         {offices}<br />(This should be sent in its own email).</p>\
         <p>Details from received message:<br />\
         Addressed to: {recipient}<br />\
         Subject: {subject}<br />\
         Time: {time}<br />\
         Error: {error}<br /></p>",
        address = escape(&config.ingest.address),
        count = config.ingest.kinds.len(),
        offices = office_list(config),
        recipient = escape(recipient),
        subject = escape(subject),
        time = format_utc_rfc3339(at),
        error = reason_message(reason, config, recipient, subject),
    );

    let sender = sender.trim();
    let operator = config.operator_email.clone();
    let (to, cc) = if sender.is_empty() || sender.eq_ignore_ascii_case(&operator) {
        (operator, Vec::new())
    } else {
        (sender.to_string(), vec![operator])
    };

    Notice {
        to,
        cc,
        subject: format!("Error with your submission ({})", reason),
        html,
    }
}

/// Notice for a valid submission that could not be stored.
pub fn unexpected_error_notice(sender: &str, detail: &str) -> Notice {
    Notice {
        to: sender.to_string(),
        cc: Vec::new(),
        subject: "Error with your submission".to_string(),
        html: format!(
            "<h3>Uh oh!</h3><p>CountMyReps experienced an unexpected error, please try again later. Error: {}</p>",
            escape(detail)
        ),
    }
}

/// Office comparison sentence for the success email.
pub fn office_comparison(user_office: &str, stats: &BTreeMap<String, EntityStats>) -> String {
    let Some(mine) = stats.get(user_office) else {
        return String::new();
    };
    let lead = lead_office(stats).unwrap_or(user_office);

    if lead == user_office {
        return format!(
            "Your office is leading with {} reps per person per day and {}% participating!",
            mine.reps_per_person_per_day, mine.percent_participating
        );
    }

    match stats.get(lead) {
        Some(leader) => format!(
            "Your office has {} reps per person per day and {}% participating. With a little effort, you can catch up to the {} office who are doing {} reps per person per day, with {}% participating.",
            mine.reps_per_person_per_day,
            mine.percent_participating,
            escape(lead),
            leader.reps_per_person_per_day,
            leader.percent_participating
        ),
        None => String::new(),
    }
}

/// Inputs for the success email.
pub struct SuccessSummary<'a> {
    pub sender: &'a str,
    pub office: Option<&'a str>,
    /// Sender's total over the reporting window
    pub total: u64,
    pub average_per_day: u64,
    pub office_stats: &'a BTreeMap<String, EntityStats>,
}

/// "Keep it up!" notice after a valid submission.
pub fn success_notice(config: &Config, summary: &SuccessSummary<'_>) -> Notice {
    let (office_msg, for_the_team) = match summary.office {
        Some(office) => (
            office_comparison(office, summary.office_stats),
            format!(" for the {} team", escape(office)),
        ),
        None => (
            format!(
                "You've not linked your reps to an office. Send an email to {} with your office in the subject line. Valid office choices are: <br />{}",
                escape(&config.ingest.address),
                office_list(config)
            ),
            String::new(),
        ),
    };

    let office_totals = summary
        .office_stats
        .iter()
        .map(|(name, s)| format!("{}: {}", escape(name), s.grand_total))
        .collect::<Vec<_>>()
        .join(", ");

    Notice {
        to: summary.sender.to_string(),
        cc: Vec::new(),
        subject: "Success!".to_string(),
        html: format!(
            "<h3>Keep it up!</h3>\
             <p>You've logged a total of {}{}, an average of {} per day.</p>\
             <p>{}</p>\
             <p>The office totals are: {}</p>",
            summary.total, for_the_team, summary.average_per_day, office_msg, office_totals
        ),
    }
}

/// Minimal HTML escaping for text interpolated into notices and pages.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
