//! Recency, frequency and monetary scoring over a customer's orders.
//!
//! Scores run from 1 (worst) to 5 (best). [`Segment::from_scores`] applies the
//! rule list used when writing `rfm` onto profiles, and
//! [`Segment::from_recency_and_value`] the recency by average frequency and
//! monetary grid.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, Result};
use crate::profile::CustomerOrder;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Score for the number of days since the last order.
pub fn recency_score(days_since_last_order: i64) -> u8 {
    match days_since_last_order {
        ..=7 => 5,
        8..=30 => 4,
        31..=90 => 3,
        91..=180 => 2,
        _ => 1,
    }
}

/// Score for the number of orders placed.
pub fn frequency_score(total_orders: usize) -> u8 {
    match total_orders {
        10.. => 5,
        5..=9 => 4,
        3..=4 => 3,
        2 => 2,
        _ => 1,
    }
}

/// Score for the total spent.
pub fn monetary_score(total_amount: f64) -> u8 {
    if total_amount >= 10_000.0 {
        5
    } else if total_amount >= 5_000.0 {
        4
    } else if total_amount >= 2_000.0 {
        3
    } else if total_amount >= 1_000.0 {
        2
    } else {
        1
    }
}

/// Customer segment derived from RFM scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    #[serde(rename = "Champions")]
    Champions,
    #[serde(rename = "Loyal Customers")]
    LoyalCustomers,
    #[serde(rename = "Potential Loyalists")]
    PotentialLoyalists,
    #[serde(rename = "Promising")]
    Promising,
    #[serde(rename = "New Customers")]
    NewCustomers,
    #[serde(rename = "Need Attention")]
    NeedAttention,
    #[serde(rename = "About to Sleep")]
    AboutToSleep,
    #[serde(rename = "Can't Lose")]
    CantLose,
    #[serde(rename = "At Risk")]
    AtRisk,
    #[serde(rename = "Hibernating")]
    Hibernating,
    #[serde(rename = "Lost")]
    Lost,
    #[serde(rename = "Regular Customer")]
    Regular,
    #[serde(rename = "Unclassified")]
    Unclassified,
}

impl Segment {
    /// Ordered rule list over the three scores; the first matching rule wins.
    pub fn from_scores(r: u8, f: u8, m: u8) -> Self {
        if r >= 4 && f >= 4 && m >= 4 {
            Segment::Champions
        } else if r >= 3 && f >= 4 {
            Segment::LoyalCustomers
        } else if r >= 4 && (2..=3).contains(&f) {
            Segment::PotentialLoyalists
        } else if r >= 4 && f <= 2 && m <= 2 {
            Segment::Promising
        } else if r == 5 && f == 1 {
            Segment::NewCustomers
        } else if r == 3 && (2..=3).contains(&f) {
            Segment::NeedAttention
        } else if (2..=3).contains(&r) && f >= 2 {
            Segment::AboutToSleep
        } else if r <= 2 && f >= 4 && m >= 4 {
            Segment::CantLose
        } else if r <= 2 && f >= 3 {
            Segment::AtRisk
        } else if r <= 2 && f <= 2 {
            Segment::Hibernating
        } else {
            Segment::Regular
        }
    }

    /// Grid over recency and the mean of the frequency and monetary scores.
    pub fn from_recency_and_value(r: u8, f: u8, m: u8) -> Self {
        let fm = f64::from(f + m) / 2.0;
        if fm <= 0.0 {
            return Segment::Unclassified;
        }
        match r {
            1 if fm < 2.0 => Segment::Lost,
            1 if fm < 4.0 => Segment::AtRisk,
            1 => Segment::CantLose,
            2 if fm < 1.0 => Segment::Lost,
            2 if fm < 2.0 => Segment::Hibernating,
            2 => Segment::AtRisk,
            3 if fm < 2.0 => Segment::AboutToSleep,
            3 if fm < 3.0 => Segment::NeedAttention,
            3 => Segment::LoyalCustomers,
            4 if fm < 1.0 => Segment::Promising,
            4 if fm < 3.0 => Segment::PotentialLoyalists,
            4 => Segment::LoyalCustomers,
            5 if fm < 1.0 => Segment::NewCustomers,
            5 if fm < 3.0 => Segment::PotentialLoyalists,
            5 if fm < 4.0 => Segment::LoyalCustomers,
            5 => Segment::Champions,
            _ => Segment::Unclassified,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Segment::Champions => "Champions",
            Segment::LoyalCustomers => "Loyal Customers",
            Segment::PotentialLoyalists => "Potential Loyalists",
            Segment::Promising => "Promising",
            Segment::NewCustomers => "New Customers",
            Segment::NeedAttention => "Need Attention",
            Segment::AboutToSleep => "About to Sleep",
            Segment::CantLose => "Can't Lose",
            Segment::AtRisk => "At Risk",
            Segment::Hibernating => "Hibernating",
            Segment::Lost => "Lost",
            Segment::Regular => "Regular Customer",
            Segment::Unclassified => "Unclassified",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The `rfm` block written onto a customer profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfmSummary {
    pub latest_order_date: String,
    pub total_amount: f64,
    pub total_orders: usize,
    pub r_score: u8,
    pub f_score: u8,
    pub m_score: u8,
    pub segment: Segment,
    pub snapshot_date: String,
}

impl RfmSummary {
    /// Scores `orders` as of `snapshot`.
    ///
    /// Orders whose date cannot be read still count towards frequency but
    /// not towards recency or spend. Returns `None` when no order has a
    /// readable date.
    pub fn from_orders(orders: &[CustomerOrder], snapshot: NaiveDate) -> Option<Self> {
        let dated: Vec<(NaiveDateTime, f64)> = orders
            .iter()
            .filter_map(|order| {
                let date = order.order_date.as_deref().and_then(parse_order_date)?;
                Some((date, order.grand_total.unwrap_or(0.0)))
            })
            .collect();

        let latest = dated.iter().map(|(date, _)| *date).max()?;
        let total_amount: f64 = dated.iter().map(|(_, amount)| amount).sum();
        let total_orders = orders.len();
        let days_since_last = (snapshot - latest.date()).num_days();

        let r_score = recency_score(days_since_last);
        let f_score = frequency_score(total_orders);
        let m_score = monetary_score(total_amount);

        Some(Self {
            latest_order_date: latest.format(DATETIME_FORMAT).to_string(),
            total_amount: (total_amount * 100.0).round() / 100.0,
            total_orders,
            r_score,
            f_score,
            m_score,
            segment: Segment::from_scores(r_score, f_score, m_score),
            snapshot_date: snapshot.format(DATE_FORMAT).to_string(),
        })
    }
}

/// Parses a `YYYY-MM-DD` snapshot date, defaulting to today (UTC).
pub fn snapshot_date(raw: Option<&str>) -> Result<NaiveDate> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map_err(|e| ProjectionError::InvalidDate(format!("{raw:?}: {e}"))),
        None => Ok(Utc::now().date_naive()),
    }
}

/// Reads `YYYY-MM-DD HH:MM:SS`, RFC 3339, ISO without offset, or a bare date.
fn parse_order_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.naive_utc()))
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
