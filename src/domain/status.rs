//! Read-model status for listing views.
//!
//! Derived on every query because "today" is an input; never stored on the record.

use crate::domain::Subscription;
use chrono::NaiveDate;
use serde::Serialize;
use strum::Display;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Display)]
pub enum StatusLabel {
    Trial,
    Free,
    Paid,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Urgency {
    High,
    Normal,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusInfo {
    pub label: StatusLabel,
    pub urgency: Urgency,
    pub days_remaining_text: Option<String>,
}

const TRIAL_URGENT_DAYS: i64 = 3;

pub fn derive_status(record: &Subscription, as_of: NaiveDate) -> StatusInfo {
    if let Some(trial_end) = record.trial_end_date.filter(|end| *end >= as_of) {
        let days = (trial_end - as_of).num_days();
        let text = match days {
            d if d < 0 => "Ended".to_string(),
            0 => "Ends today".to_string(),
            d => format!("Ends in {}", pluralize_days(d)),
        };
        return StatusInfo {
            label: StatusLabel::Trial,
            urgency: if days <= TRIAL_URGENT_DAYS {
                Urgency::High
            } else {
                Urgency::Normal
            },
            days_remaining_text: Some(text),
        };
    }

    if record.price == 0.0 {
        return StatusInfo {
            label: StatusLabel::Free,
            urgency: Urgency::Normal,
            days_remaining_text: None,
        };
    }

    let days_remaining_text = record
        .next_billing_date
        .filter(|next| *next >= as_of)
        .map(|next| match (next - as_of).num_days() {
            d if d < 0 => "Past due".to_string(),
            0 => "Due today".to_string(),
            d => format!("In {}", pluralize_days(d)),
        });

    StatusInfo {
        label: StatusLabel::Paid,
        urgency: Urgency::Normal,
        days_remaining_text,
    }
}

fn pluralize_days(days: i64) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{} days", days)
    }
}

impl StatusInfo {
    /// Trial rows show the trial end, everything else the next payment.
    pub fn display_date(&self, record: &Subscription) -> Option<NaiveDate> {
        match self.label {
            StatusLabel::Trial => record.trial_end_date,
            _ => record.next_billing_date,
        }
    }
}
