use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use super::Entity;
use super::temporal::Dated;
use crate::sync::wire;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Symptoms {
    #[serde(with = "wire::flag", default)]
    pub headache: bool,
    #[serde(with = "wire::flag", default)]
    pub stomach: bool,
    #[serde(with = "wire::flag", default)]
    pub period: bool,
    #[serde(with = "wire::flag", default)]
    pub sleepless: bool,
    #[serde(with = "wire::flag", default)]
    pub cold: bool,
    #[serde(with = "wire::flag", default)]
    pub nausea: bool,
    #[serde(with = "wire::flag", default)]
    pub hayfever: bool,
    #[serde(with = "wire::flag", default)]
    pub depression: bool,
    #[serde(with = "wire::flag", default)]
    pub tired: bool,
    #[serde(with = "wire::flag", default)]
    pub other: bool,
}

impl Symptoms {
    /// Wire names paired with their values, in the store's column order.
    pub fn fields(&self) -> [(&'static str, bool); 10] {
        [
            ("headache", self.headache),
            ("stomach", self.stomach),
            ("period", self.period),
            ("sleepless", self.sleepless),
            ("cold", self.cold),
            ("nausea", self.nausea),
            ("hayfever", self.hayfever),
            ("depression", self.depression),
            ("tired", self.tired),
            ("other", self.other),
        ]
    }

    pub fn any(&self) -> bool {
        self.fields().iter().any(|(_, on)| *on)
    }
}

/// One day's health log. Wake and bed times at midnight mean "not recorded".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    #[serde(with = "wire::int")]
    pub id: i64,
    #[serde(with = "wire::date")]
    pub date: NaiveDate,
    #[serde(with = "wire::datetime")]
    pub up_time: NaiveDateTime,
    #[serde(with = "wire::datetime")]
    pub bed_time: NaiveDateTime,
    #[serde(with = "wire::text", default)]
    pub body: String,
    #[serde(flatten)]
    pub symptoms: Symptoms,
    #[serde(with = "wire::text", default)]
    pub memo: String,
}

impl Entity for Health {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Dated for Health {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Health {
    /// Body weight in kg, if one was recorded.
    pub fn weight(&self) -> Option<f64> {
        self.body.trim().parse::<f64>().ok().filter(|w| *w != 0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthDraft {
    pub date: NaiveDate,
    pub up_time: NaiveDateTime,
    pub bed_time: NaiveDateTime,
    pub body: String,
    pub symptoms: Symptoms,
    pub memo: String,
}

impl HealthDraft {
    /// An empty log for `date` with both times unrecorded.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            up_time: date.and_time(NaiveTime::MIN),
            bed_time: date.and_time(NaiveTime::MIN),
            body: String::new(),
            symptoms: Symptoms::default(),
            memo: String::new(),
        }
    }

    pub fn confirmed(&self, id: i64) -> Health {
        Health {
            id,
            date: self.date,
            up_time: self.up_time,
            bed_time: self.bed_time,
            body: self.body.clone(),
            symptoms: self.symptoms,
            memo: self.memo.clone(),
        }
    }
}

/// Sleep from the previous night's bedtime to the morning's wake time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepRecord {
    pub date: NaiveDate,
    pub duration: TimeDelta,
}

impl SleepRecord {
    /// Hours, rounded to two decimals.
    pub fn hours(&self) -> f64 {
        (self.duration.num_milliseconds() as f64 / 3_600_000.0 * 100.0).round() / 100.0
    }
}

fn is_unrecorded(t: NaiveDateTime) -> bool {
    t.time() == NaiveTime::MIN
}

/// Sleep per morning, for mornings whose previous day is also logged.
///
/// Pass a month filtered together with the last day of the prior month so the
/// first morning of the month has its previous night.
pub fn sleep_records(logs: &[Health]) -> Vec<SleepRecord> {
    let mut sorted: Vec<&Health> = logs.iter().collect();
    sorted.sort_by_key(|h| h.date);
    sorted
        .windows(2)
        .filter_map(|pair| {
            let (night, morning) = (pair[0], pair[1]);
            if morning.date.pred_opt() != Some(night.date) {
                return None;
            }
            if is_unrecorded(night.bed_time) || is_unrecorded(morning.up_time) {
                return None;
            }
            Some(SleepRecord {
                date: morning.date,
                duration: morning.up_time - night.bed_time,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SleepAverage {
    pub hours: i64,
    pub minutes: i64,
    pub millis: i64,
}

pub fn average_sleep(records: &[SleepRecord]) -> SleepAverage {
    if records.is_empty() {
        return SleepAverage::default();
    }
    let total: i64 = records.iter().map(|r| r.duration.num_milliseconds()).sum();
    let avg = total / records.len() as i64;
    SleepAverage {
        hours: avg / 3_600_000,
        minutes: ((avg % 3_600_000) as f64 / 60_000.0).round() as i64,
        millis: avg,
    }
}

/// Mean of recorded weights, one decimal; 0.0 when none are recorded.
pub fn average_body_weight(logs: &[Health]) -> f64 {
    let weights: Vec<f64> = logs.iter().filter_map(Health::weight).collect();
    if weights.is_empty() {
        return 0.0;
    }
    let avg = weights.iter().sum::<f64>() / weights.len() as f64;
    (avg * 10.0).round() / 10.0
}
