//! Family grouping, example selection and daily/hourly time series.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use cpelog_core::models::{
    daily_bucket, hourly_bucket, ExampleEntry, FamilySeries, FamilySummary, LogRecord,
    TimeSeriesPoint,
};
use cpelog_core::normalizer::normalize;

// ── FamilyGroup ───────────────────────────────────────────────────────────────

/// All records that normalised to the same family, in ingestion order.
#[derive(Debug, Clone)]
pub struct FamilyGroup<'a> {
    pub family: String,
    pub records: Vec<&'a LogRecord>,
}

impl FamilyGroup<'_> {
    /// The `n` earliest records; equal timestamps keep ingestion order.
    pub fn earliest(&self, n: usize) -> Vec<&LogRecord> {
        let mut sorted = self.records.clone();
        sorted.sort_by_key(|r| r.timestamp);
        sorted.truncate(n);
        sorted
    }
}

// ── FamilyReport ──────────────────────────────────────────────────────────────

/// Everything derived from one batch of records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FamilyReport {
    /// Families by count descending; ties keep first-seen order.
    pub summaries: Vec<FamilySummary>,
    /// Earliest records per family, families in first-seen order.
    pub examples: Vec<ExampleEntry>,
    /// Overall per-day counts, ascending by bucket.
    pub daily: Vec<TimeSeriesPoint>,
    /// Overall per-hour counts, ascending by bucket.
    pub hourly: Vec<TimeSeriesPoint>,
    /// Per-family daily series, families in summary order.
    pub family_daily: Vec<FamilySeries>,
    /// Per-family hourly series, families in summary order.
    pub family_hourly: Vec<FamilySeries>,
}

impl FamilyReport {
    /// Sum of all family counts.
    pub fn total_records(&self) -> usize {
        self.summaries.iter().map(|s| s.count).sum()
    }
}

// ── FamilyAggregator ──────────────────────────────────────────────────────────

/// Stateless helper that groups records by family and time bucket.
pub struct FamilyAggregator;

impl FamilyAggregator {
    /// Group `records` by normalised message, groups in first-seen order.
    pub fn group(records: &[LogRecord]) -> Vec<FamilyGroup<'_>> {
        let mut groups: Vec<FamilyGroup<'_>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for record in records {
            let family = normalize(&record.message);
            match index.get(&family) {
                Some(&i) => groups[i].records.push(record),
                None => {
                    index.insert(family.clone(), groups.len());
                    groups.push(FamilyGroup {
                        family,
                        records: vec![record],
                    });
                }
            }
        }

        groups
    }

    /// Build summaries, examples and all four time series.
    ///
    /// `examples_per_family` below one is treated as one.
    pub fn aggregate(records: &[LogRecord], examples_per_family: usize) -> FamilyReport {
        let groups = Self::group(records);
        let per_family = examples_per_family.max(1);

        let examples = groups
            .iter()
            .flat_map(|g| {
                g.earliest(per_family).into_iter().map(|r| ExampleEntry {
                    family: g.family.clone(),
                    timestamp: r.timestamp,
                    source_file: r.source_file.clone(),
                    message: r.message.clone(),
                })
            })
            .collect();

        // Stable sort keeps first-seen order among equal counts.
        let mut ranked: Vec<&FamilyGroup<'_>> = groups.iter().collect();
        ranked.sort_by(|a, b| b.records.len().cmp(&a.records.len()));

        let summaries = ranked
            .iter()
            .map(|g| FamilySummary {
                family: g.family.clone(),
                count: g.records.len(),
            })
            .collect();

        let all: Vec<&LogRecord> = records.iter().collect();
        let family_series = |key_fn: fn(NaiveDateTime) -> String| -> Vec<FamilySeries> {
            ranked
                .iter()
                .map(|g| FamilySeries {
                    family: g.family.clone(),
                    points: Self::count_by_period(&g.records, key_fn),
                })
                .collect()
        };

        FamilyReport {
            summaries,
            examples,
            daily: Self::count_by_period(&all, daily_bucket),
            hourly: Self::count_by_period(&all, hourly_bucket),
            family_daily: family_series(daily_bucket),
            family_hourly: family_series(hourly_bucket),
        }
    }

    // ── Private ───────────────────────────────────────────────────────────────

    /// Count records per bucket; `key_fn` maps a timestamp to its bucket key.
    ///
    /// Only buckets with at least one record appear.
    fn count_by_period(
        records: &[&LogRecord],
        key_fn: impl Fn(NaiveDateTime) -> String,
    ) -> Vec<TimeSeriesPoint> {
        // BTreeMap keeps bucket keys sorted.
        let mut map: BTreeMap<String, usize> = BTreeMap::new();
        for record in records {
            *map.entry(key_fn(record.timestamp)).or_default() += 1;
        }
        map.into_iter()
            .map(|(bucket_key, count)| TimeSeriesPoint { bucket_key, count })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
