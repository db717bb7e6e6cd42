// Per-site dataset: shortage, filtering and summaries for the site tables

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::derive_shortage;

/// One hospital row of the upstream dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    /// Empty when the source cell was blank
    pub state: String,
    /// Confirmed adult COVID ICU patients, 7-day average. `None` when blank.
    pub observed_demand: Option<f64>,
    /// `None` when blank
    pub icu_allocated: Option<f64>,
    pub urban_status: Option<String>,
}

impl SiteRecord {
    /// Undefined unless both figures are present.
    pub fn shortage(&self) -> Option<f64> {
        Some(derive_shortage(self.observed_demand?, self.icu_allocated?))
    }

    pub fn is_complete(&self) -> bool {
        self.observed_demand.is_some() && self.icu_allocated.is_some()
    }
}

/// Parsed dataset plus whether the optional urban status column was present
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteDataset {
    pub records: Vec<SiteRecord>,
    pub has_urban_status: bool,
}

/// Row selection. An empty list selects every value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteFilter {
    pub states: Vec<String>,
    pub urban_statuses: Vec<String>,
}

impl SiteFilter {
    /// Rows with a blank state never match.
    pub fn matches(&self, record: &SiteRecord) -> bool {
        if record.state.is_empty() {
            return false;
        }
        if !self.states.is_empty() && !self.states.iter().any(|s| s == &record.state) {
            return false;
        }
        if self.urban_statuses.is_empty() {
            return true;
        }
        match &record.urban_status {
            Some(status) => self.urban_statuses.iter().any(|u| u == status),
            None => false,
        }
    }
}

/// Headline totals shown above the site table. Blank figures are left out of
/// the sum they belong to, but the row's other figures still count.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SiteSummary {
    pub sites: usize,
    /// Rows missing demand or allocation
    pub incomplete_sites: usize,
    pub total_demand: f64,
    pub total_allocated: f64,
    pub total_shortage: f64,
}

/// Demand and allocation summed per urban status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrbanStatusSummary {
    pub urban_status: String,
    pub demand: f64,
    pub allocated: f64,
    /// `demand − allocated` over the group; negative when over-allocated
    pub net_shortage: f64,
}

impl SiteDataset {
    pub fn new(records: Vec<SiteRecord>, has_urban_status: bool) -> Self {
        Self {
            records,
            has_urban_status,
        }
    }

    /// Distinct non-blank states in first-seen order
    pub fn states(&self) -> Vec<&str> {
        let mut states: Vec<&str> = Vec::new();
        for record in &self.records {
            if !record.state.is_empty() && !states.contains(&record.state.as_str()) {
                states.push(&record.state);
            }
        }
        states
    }

    /// Distinct urban statuses in first-seen order
    pub fn urban_statuses(&self) -> Vec<&str> {
        let mut statuses: Vec<&str> = Vec::new();
        for status in self.records.iter().filter_map(|r| r.urban_status.as_deref()) {
            if !statuses.contains(&status) {
                statuses.push(status);
            }
        }
        statuses
    }

    /// Keeps matching rows. The urban filter is ignored when the dataset
    /// has no urban status column.
    pub fn filter(&self, filter: &SiteFilter) -> SiteDataset {
        let effective = if self.has_urban_status {
            filter.clone()
        } else {
            SiteFilter {
                states: filter.states.clone(),
                urban_statuses: Vec::new(),
            }
        };

        SiteDataset {
            records: self
                .records
                .iter()
                .filter(|r| effective.matches(r))
                .cloned()
                .collect(),
            has_urban_status: self.has_urban_status,
        }
    }

    pub fn summary(&self) -> SiteSummary {
        self.records
            .iter()
            .fold(SiteSummary::default(), |mut acc, record| {
                acc.sites += 1;
                if !record.is_complete() {
                    acc.incomplete_sites += 1;
                }
                acc.total_demand += record.observed_demand.unwrap_or(0.0);
                acc.total_allocated += record.icu_allocated.unwrap_or(0.0);
                acc.total_shortage += record.shortage().unwrap_or(0.0);
                acc
            })
    }

    /// Totals per urban status, sorted by status. Empty when the column is
    /// missing.
    pub fn by_urban_status(&self) -> Vec<UrbanStatusSummary> {
        if !self.has_urban_status {
            return Vec::new();
        }

        let mut groups: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
        for record in &self.records {
            if let Some(status) = record.urban_status.as_deref() {
                let entry = groups.entry(status).or_insert((0.0, 0.0));
                entry.0 += record.observed_demand.unwrap_or(0.0);
                entry.1 += record.icu_allocated.unwrap_or(0.0);
            }
        }

        groups
            .into_iter()
            .map(|(status, (demand, allocated))| UrbanStatusSummary {
                urban_status: status.to_string(),
                demand,
                allocated,
                net_shortage: demand - allocated,
            })
            .collect()
    }

    /// Rows ordered by shortage, largest first, rows without a shortage
    /// last. Ties keep input order.
    pub fn sorted_by_shortage(&self) -> Vec<&SiteRecord> {
        let mut rows: Vec<&SiteRecord> = self.records.iter().collect();
        rows.sort_by(|a, b| match (a.shortage(), b.shortage()) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;

    fn site(state: &str, demand: f64, allocated: f64, urban: Option<&str>) -> SiteRecord {
        SiteRecord {
            state: state.to_string(),
            observed_demand: Some(demand),
            icu_allocated: Some(allocated),
            urban_status: urban.map(str::to_string),
        }
    }

    fn dataset() -> SiteDataset {
        SiteDataset::new(
            vec![
                site("TX", 12.0, 8.0, Some("Urban")),
                site("TX", 3.0, 5.0, Some("Rural")),
                site("CA", 20.0, 10.0, Some("Urban")),
                site("", 4.0, 0.0, Some("Rural")),
            ],
            true,
        )
    }

    #[test]
    fn summary_clips_each_shortage() {
        let summary = dataset().summary();

        assert_eq!(summary.sites, 4);
        assert_float_eq!(summary.total_demand, 39.0, abs <= 1e-12);
        assert_float_eq!(summary.total_allocated, 23.0, abs <= 1e-12);
        // 4 + 0 + 10 + 4; the over-allocated TX row contributes nothing
        assert_float_eq!(summary.total_shortage, 18.0, abs <= 1e-12);
    }

    #[test]
    fn default_filter_drops_blank_states_only() {
        let filtered = dataset().filter(&SiteFilter::default());
        assert_eq!(filtered.records.len(), 3);

        let data = dataset();
        assert_eq!(data.states(), ["TX", "CA"]);
        assert_eq!(data.urban_statuses(), ["Urban", "Rural"]);
    }

    #[test]
    fn filter_by_state_and_urban_status() {
        let filter = SiteFilter {
            states: vec!["TX".into()],
            urban_statuses: vec!["Rural".into()],
        };
        let filtered = dataset().filter(&filter);

        assert_eq!(filtered.records.len(), 1);
        assert_eq!(filtered.records[0].icu_allocated, Some(5.0));
    }

    #[test]
    fn urban_filter_ignored_without_column() {
        let mut data = dataset();
        data.has_urban_status = false;
        let filter = SiteFilter {
            states: Vec::new(),
            urban_statuses: vec!["Nowhere".into()],
        };

        assert_eq!(data.filter(&filter).records.len(), 3);
        assert!(data.by_urban_status().is_empty());
    }

    #[test]
    fn urban_groups_keep_signed_net_shortage() {
        let groups = dataset().by_urban_status();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].urban_status, "Rural");
        assert_float_eq!(groups[0].net_shortage, 2.0, abs <= 1e-12);
        assert_eq!(groups[1].urban_status, "Urban");
        assert_float_eq!(groups[1].net_shortage, 14.0, abs <= 1e-12);
    }

    #[test]
    fn rows_sort_by_descending_shortage() {
        let data = dataset();
        let sorted = data.sorted_by_shortage();
        let states: Vec<&str> = sorted.iter().map(|r| r.state.as_str()).collect();
        assert_eq!(states, ["CA", "TX", "", "TX"]);
    }

    #[test]
    fn blank_demand_keeps_allocation_in_totals() {
        let mut data = dataset();
        data.records.push(SiteRecord {
            state: "NY".to_string(),
            observed_demand: None,
            icu_allocated: Some(6.0),
            urban_status: Some("Urban".to_string()),
        });
        let summary = data.summary();

        assert_eq!(summary.sites, 5);
        assert_eq!(summary.incomplete_sites, 1);
        assert_float_eq!(summary.total_demand, 39.0, abs <= 1e-12);
        assert_float_eq!(summary.total_allocated, 29.0, abs <= 1e-12);
        assert_float_eq!(summary.total_shortage, 18.0, abs <= 1e-12);

        let urban = &data.by_urban_status()[1];
        assert_float_eq!(urban.allocated, 24.0, abs <= 1e-12);

        let sorted = data.sorted_by_shortage();
        assert_eq!(sorted.last().map(|r| r.state.as_str()), Some("NY"));
        assert_eq!(sorted.last().and_then(|r| r.shortage()), None);
    }
}
