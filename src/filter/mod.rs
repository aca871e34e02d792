//! Predicate filtering over the in-order traversal
//!
//! Filtering never touches tree nodes: every criterion is evaluated by
//! walking [`SearchTree::in_order`] and keeping the matching records, so
//! results always come out in ascending key order.

use std::fmt;

use ahash::AHashMap;
use serde::Serialize;

use crate::avl::{Rebalance, SearchTree};
use crate::record::{Record, mean};

/// Year of the first measurement column in the standard dataset
pub const DEFAULT_FIRST_YEAR: i32 = 1961;

/// Which records to keep
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Criterion {
    /// Key strictly above the mean of all keys
    AboveMean,
    /// Key strictly below the mean of all keys
    BelowMean,
    /// Key greater than or equal to a value
    AtLeast(f64),
    /// Measurement in the given year strictly above that year's average
    YearAboveYearMean(i32),
    /// Measurement in the given year strictly below the mean of all keys
    YearBelowGlobalMean(i32),
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::AboveMean => write!(f, "FM > mean FM"),
            Criterion::BelowMean => write!(f, "FM < mean FM"),
            Criterion::AtLeast(value) => write!(f, "FM >= {value}"),
            Criterion::YearAboveYearMean(year) => write!(f, "temp({year}) > mean temp({year})"),
            Criterion::YearBelowGlobalMean(year) => write!(f, "temp({year}) < mean FM"),
        }
    }
}

/// Records matching a criterion, with the threshold they were compared to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection<'a> {
    pub criterion: Criterion,
    pub threshold: f64,
    pub records: Vec<&'a Record>,
}

impl Selection<'_> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Per-year averages across all records, memoised
///
/// The cache describes one tree state; call [`YearlyAverages::invalidate`]
/// after any insert, removal or reload.
#[derive(Debug, Clone)]
pub struct YearlyAverages {
    first_year: i32,
    cache: AHashMap<i32, f64>,
}

impl YearlyAverages {
    pub fn new(first_year: i32) -> Self {
        Self {
            first_year,
            cache: AHashMap::new(),
        }
    }

    pub fn first_year(&self) -> i32 {
        self.first_year
    }

    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    /// Average measurement for `year` over the records that report it
    ///
    /// 0.0 when no record has a value for that year.
    pub fn average<B: Rebalance>(&mut self, tree: &SearchTree<B>, year: i32) -> f64 {
        let first_year = self.first_year;
        *self.cache.entry(year).or_insert_with(|| {
            let values: Vec<f64> = tree
                .in_order()
                .filter_map(|r| r.measurement_for_year(first_year, year))
                .collect();
            mean(&values)
        })
    }
}

impl Default for YearlyAverages {
    fn default() -> Self {
        Self::new(DEFAULT_FIRST_YEAR)
    }
}

/// Keep the records of `tree` that satisfy `criterion`
pub fn select<'a, B: Rebalance>(
    tree: &'a SearchTree<B>,
    criterion: Criterion,
    averages: &mut YearlyAverages,
) -> Selection<'a> {
    let global_mean = tree.mean_key().unwrap_or(0.0);
    let first_year = averages.first_year();

    let (threshold, records): (f64, Vec<&Record>) = match criterion {
        Criterion::AboveMean => (
            global_mean,
            tree.in_order().filter(|r| r.key() > global_mean).collect(),
        ),
        Criterion::BelowMean => (
            global_mean,
            tree.in_order().filter(|r| r.key() < global_mean).collect(),
        ),
        Criterion::AtLeast(value) => (
            value,
            tree.in_order().filter(|r| r.key() >= value).collect(),
        ),
        Criterion::YearAboveYearMean(year) => {
            let year_mean = averages.average(tree, year);
            let records = tree
                .in_order()
                .filter(|r| {
                    r.measurement_for_year(first_year, year)
                        .is_some_and(|v| v > year_mean)
                })
                .collect();
            (year_mean, records)
        }
        Criterion::YearBelowGlobalMean(year) => {
            let records = tree
                .in_order()
                .filter(|r| {
                    r.measurement_for_year(first_year, year)
                        .is_some_and(|v| v < global_mean)
                })
                .collect();
            (global_mean, records)
        }
    };

    Selection {
        criterion,
        threshold,
        records,
    }
}
