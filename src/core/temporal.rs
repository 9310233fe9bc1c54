//! Date-scoped projections of entity collections.
//!
//! Everything here is a pure function of its inputs. Views are recomputed from
//! collection snapshots whenever the data or the reference date changes.

use chrono::{Datelike, NaiveDate};

/// A record that belongs to one calendar day.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    /// The calendar month containing the date.
    Month(NaiveDate),
    /// Exactly the date.
    Day(NaiveDate),
    /// The month plus the last day of the month before it.
    MonthWithPriorMonthEnd(NaiveDate),
    /// The calendar year containing the date.
    Year(NaiveDate),
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            Self::Month(reference) => same_month(date, reference),
            Self::Day(reference) => date == reference,
            Self::MonthWithPriorMonthEnd(reference) => {
                same_month(date, reference) || Some(date) == last_day_of_prior_month(reference)
            }
            Self::Year(reference) => date.year() == reference.year(),
        }
    }

    /// Records inside the range, in collection order.
    ///
    /// For `MonthWithPriorMonthEnd` the prior month's last-day records come first.
    pub fn select<T: Dated + Clone>(&self, records: &[T]) -> Vec<T> {
        match *self {
            Self::MonthWithPriorMonthEnd(reference) => {
                month_with_prior_month_end(records, reference)
            }
            _ => records.iter().filter(|r| self.contains(r.date())).cloned().collect(),
        }
    }
}

fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_day_of_prior_month(date: NaiveDate) -> Option<NaiveDate> {
    first_day_of_month(date).pred_opt()
}

pub fn in_month<T: Dated + Clone>(records: &[T], reference: NaiveDate) -> Vec<T> {
    DateRange::Month(reference).select(records)
}

pub fn on_day<T: Dated + Clone>(records: &[T], day: NaiveDate) -> Vec<T> {
    DateRange::Day(day).select(records)
}

pub fn in_year<T: Dated + Clone>(records: &[T], reference: NaiveDate) -> Vec<T> {
    DateRange::Year(reference).select(records)
}

pub fn month_with_prior_month_end<T: Dated + Clone>(records: &[T], reference: NaiveDate) -> Vec<T> {
    let bridge = last_day_of_prior_month(reference);
    let mut out: Vec<T> = records
        .iter()
        .filter(|r| Some(r.date()) == bridge)
        .cloned()
        .collect();
    out.extend(records.iter().filter(|r| same_month(r.date(), reference)).cloned());
    out
}

/// The record dated `day` and the one dated the day before, if either exists.
pub fn today_and_yesterday<T: Dated + Clone>(records: &[T], day: NaiveDate) -> (Option<T>, Option<T>) {
    let today = records.iter().find(|r| r.date() == day).cloned();
    if today.is_none() {
        return (None, None);
    }
    let yesterday = day
        .pred_opt()
        .and_then(|y| records.iter().find(|r| r.date() == y).cloned());
    (today, yesterday)
}

/// Newest first; ties keep collection order.
pub fn sorted_by_date_desc<T: Dated + Clone>(records: &[T]) -> Vec<T> {
    let mut out = records.to_vec();
    out.sort_by(|a, b| b.date().cmp(&a.date()));
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Any,
    All,
}

/// Keep records whose text (as picked by `field`) contains any or all of `words`.
pub fn search<T, F>(records: &[T], words: &[&str], mode: MatchMode, field: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> &str,
{
    records
        .iter()
        .filter(|r| {
            let text = field(r);
            match mode {
                MatchMode::Any => words.iter().any(|w| text.contains(w)),
                MatchMode::All => words.iter().all(|w| text.contains(w)),
            }
        })
        .cloned()
        .collect()
}
