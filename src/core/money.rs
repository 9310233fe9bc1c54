use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Entity;
use super::temporal::Dated;
use crate::sync::wire;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoneyKind {
    #[serde(rename = "収入")]
    Income,
    #[serde(rename = "支出")]
    Expense,
}

impl MoneyKind {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Income => "収入",
            Self::Expense => "支出",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MoneyCategory {
    #[serde(rename = "給与")]
    Salary,
    #[serde(rename = "副収入")]
    SideIncome,
    #[serde(rename = "食費")]
    Food,
    #[serde(rename = "日用品")]
    Household,
    #[serde(rename = "住宅費")]
    Housing,
    #[serde(rename = "お菓子")]
    Snacks,
    #[serde(rename = "交通費")]
    Transport,
    #[serde(rename = "交際費")]
    Social,
    #[serde(rename = "娯楽")]
    Entertainment,
    #[serde(rename = "美容")]
    Beauty,
    #[serde(rename = "月契約")]
    Subscription,
    #[serde(rename = "保険")]
    Insurance,
    #[serde(rename = "医療")]
    Medical,
    #[serde(rename = "その他")]
    Other,
}

const INCOME_CATEGORIES: &[MoneyCategory] = &[
    MoneyCategory::Salary,
    MoneyCategory::SideIncome,
    MoneyCategory::Other,
];

const EXPENSE_CATEGORIES: &[MoneyCategory] = &[
    MoneyCategory::Food,
    MoneyCategory::Household,
    MoneyCategory::Housing,
    MoneyCategory::Snacks,
    MoneyCategory::Transport,
    MoneyCategory::Social,
    MoneyCategory::Entertainment,
    MoneyCategory::Beauty,
    MoneyCategory::Subscription,
    MoneyCategory::Insurance,
    MoneyCategory::Medical,
    MoneyCategory::Other,
];

impl MoneyCategory {
    /// Categories offered for entries of `kind`.
    pub fn for_kind(kind: MoneyKind) -> &'static [MoneyCategory] {
        match kind {
            MoneyKind::Income => INCOME_CATEGORIES,
            MoneyKind::Expense => EXPENSE_CATEGORIES,
        }
    }

    pub fn belongs_to(&self, kind: MoneyKind) -> bool {
        Self::for_kind(kind).contains(self)
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Salary => "給与",
            Self::SideIncome => "副収入",
            Self::Food => "食費",
            Self::Household => "日用品",
            Self::Housing => "住宅費",
            Self::Snacks => "お菓子",
            Self::Transport => "交通費",
            Self::Social => "交際費",
            Self::Entertainment => "娯楽",
            Self::Beauty => "美容",
            Self::Subscription => "月契約",
            Self::Insurance => "保険",
            Self::Medical => "医療",
            Self::Other => "その他",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    #[serde(with = "wire::int")]
    pub id: i64,
    #[serde(with = "wire::date")]
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: MoneyKind,
    pub category: MoneyCategory,
    #[serde(with = "wire::int")]
    pub amount: i64,
    #[serde(with = "wire::text", default)]
    pub content: String,
}

impl Entity for Money {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Dated for Money {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoneyDraft {
    pub date: NaiveDate,
    pub kind: MoneyKind,
    pub category: MoneyCategory,
    pub amount: i64,
    pub content: String,
}

impl MoneyDraft {
    pub fn confirmed(&self, id: i64) -> Money {
        Money {
            id,
            date: self.date,
            kind: self.kind,
            category: self.category,
            amount: self.amount,
            content: self.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Balance {
    pub income: i64,
    pub expense: i64,
    pub balance: i64,
}

impl Balance {
    fn add(&mut self, entry: &Money) {
        match entry.kind {
            MoneyKind::Income => self.income += entry.amount,
            MoneyKind::Expense => self.expense += entry.amount,
        }
        self.balance = self.income - self.expense;
    }
}

pub fn balance(entries: &[Money]) -> Balance {
    let mut total = Balance::default();
    for entry in entries {
        total.add(entry);
    }
    total
}

pub fn daily_balances(entries: &[Money]) -> BTreeMap<NaiveDate, Balance> {
    let mut days: BTreeMap<NaiveDate, Balance> = BTreeMap::new();
    for entry in entries {
        days.entry(entry.date).or_default().add(entry);
    }
    days
}

/// Totals per category for one side of the ledger, largest first.
pub fn category_totals(entries: &[Money], kind: MoneyKind) -> Vec<(MoneyCategory, i64)> {
    let mut totals: BTreeMap<MoneyCategory, i64> = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.kind == kind) {
        *totals.entry(entry.category).or_default() += entry.amount;
    }
    let mut out: Vec<_> = totals.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    out
}
