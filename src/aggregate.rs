//! Read-only statistics over bills: the period summary and the per-month chart.
//!
//! Both computations are pure functions over `Entry` values. The store narrows the read down by
//! date where it can; bucketing and summing happen here in a single pass, on every call.

use crate::model::{Amount, EntryType};
use crate::Result;
use anyhow::Context;
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// The part of a bill that the aggregates look at.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Entry {
    pub r#type: EntryType,
    pub amount: Amount,
    pub date: DateTime<Utc>,
}

/// A half-open interval of time, `[start, end)`, with both ends at midnight UTC.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: start.and_time(NaiveTime::MIN).and_utc(),
            end: end.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    /// The calendar month containing `day`.
    pub fn month_of(day: NaiveDate) -> Result<Self> {
        let first = day
            .with_day(1)
            .with_context(|| format!("No first day of the month for {day}"))?;
        let next = first
            .checked_add_months(Months::new(1))
            .with_context(|| format!("No month after {first}"))?;
        Ok(Self::new(first, next))
    }

    /// The week containing `day`, running from Sunday through Saturday.
    pub fn week_of(day: NaiveDate) -> Result<Self> {
        let since_sunday = u64::from(day.weekday().num_days_from_sunday());
        let sunday = day
            .checked_sub_days(Days::new(since_sunday))
            .with_context(|| format!("No Sunday before {day}"))?;
        let next = sunday
            .checked_add_days(Days::new(7))
            .with_context(|| format!("No week after {sunday}"))?;
        Ok(Self::new(sunday, next))
    }

    /// January 1st of `year` up to January 1st of the following year.
    pub fn year(year: i32) -> Result<Self> {
        let first = NaiveDate::from_ymd_opt(year, 1, 1)
            .with_context(|| format!("Year {year} is out of range"))?;
        let next = year
            .checked_add(1)
            .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
            .with_context(|| format!("Year {year} is out of range"))?;
        Ok(Self::new(first, next))
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, date: &DateTime<Utc>) -> bool {
        self.start <= *date && *date < self.end
    }
}

/// Sums for one entry type.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct Totals {
    pub month: Amount,
    pub week: Amount,
    pub total: Amount,
}

/// Month, week and all-time sums for income and expense.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct Summary {
    pub income: Totals,
    pub expense: Totals,
}

impl Summary {
    fn totals_mut(&mut self, t: EntryType) -> &mut Totals {
        match t {
            EntryType::Income => &mut self.income,
            EntryType::Expense => &mut self.expense,
        }
    }
}

/// Computes the summary as seen on `today`.
pub fn summarize<'a, I>(entries: I, today: NaiveDate) -> Result<Summary>
where
    I: IntoIterator<Item = &'a Entry>,
{
    let month = DateRange::month_of(today)?;
    let week = DateRange::week_of(today)?;

    let mut summary = Summary::default();
    for entry in entries {
        let totals = summary.totals_mut(entry.r#type);
        add(&mut totals.total, entry.amount)?;
        if month.contains(&entry.date) {
            add(&mut totals.month, entry.amount)?;
        }
        if week.contains(&entry.date) {
            add(&mut totals.week, entry.amount)?;
        }
    }
    Ok(summary)
}

fn add(sum: &mut Amount, amount: Amount) -> Result<()> {
    *sum = sum
        .checked_add(amount)
        .with_context(|| format!("Adding {amount} to {sum} overflows"))?;
    Ok(())
}

/// The total for one month. `month` is 0-indexed: January is 0 and December is 11.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct MonthAmount {
    pub month: u32,
    pub amount: Amount,
}

/// Per-month totals for one year. Months without any bills are absent rather than zero.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Chart {
    pub year: i64,
    pub expense: Vec<MonthAmount>,
    pub income: Vec<MonthAmount>,
}

impl Chart {
    /// A chart with no buckets, e.g. for a year no bill can be dated in.
    pub fn empty(year: i64) -> Self {
        Self {
            year,
            expense: Vec::new(),
            income: Vec::new(),
        }
    }
}

/// Groups the entries dated within `year` by the calendar month of their date.
pub fn monthly_chart<'a, I>(entries: I, year: i32) -> Result<Chart>
where
    I: IntoIterator<Item = &'a Entry>,
{
    let mut income = BTreeMap::new();
    let mut expense = BTreeMap::new();
    for entry in entries.into_iter().filter(|e| e.date.year() == year) {
        let buckets = match entry.r#type {
            EntryType::Income => &mut income,
            EntryType::Expense => &mut expense,
        };
        add(
            buckets.entry(entry.date.month0()).or_insert(Amount::ZERO),
            entry.amount,
        )?;
    }
    Ok(Chart {
        year: year.into(),
        expense: to_series(expense),
        income: to_series(income),
    })
}

fn to_series(buckets: BTreeMap<u32, Amount>) -> Vec<MonthAmount> {
    buckets
        .into_iter()
        .map(|(month, amount)| MonthAmount { month, amount })
        .collect()
}
