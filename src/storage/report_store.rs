use std::collections::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub temperature: i64,
    pub condition: String,
    pub timestamp: i64,
}

/// New values for the latest report of a city. `timestamp` is accepted on the
/// wire but never applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherReportUpdate {
    pub temperature: i64,
    pub condition: String,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Default)]
pub struct ReportStore {
    // keyed by city id -> reports in insertion order, never empty
    reports: HashMap<String, Vec<WeatherReport>>,
}

/// Index of the report with the highest timestamp. On ties the earliest
/// inserted report wins.
fn latest_index(reports: &[WeatherReport]) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (idx, report) in reports.iter().enumerate() {
        match best {
            Some((_, ts)) if report.timestamp <= ts => {}
            _ => best = Some((idx, report.timestamp)),
        }
    }
    best.map(|(idx, _)| idx)
}

impl ReportStore {
    pub fn new() -> Self {
        Self {
            reports: HashMap::new(),
        }
    }

    pub fn add_report(&mut self, city_id: &str, report: WeatherReport) {
        self.reports.entry(city_id.to_string()).or_default().push(report);
    }

    pub fn all_reports(&self, city_id: &str) -> Result<&[WeatherReport], StoreError> {
        self.reports
            .get(city_id)
            .map(Vec::as_slice)
            .ok_or_else(|| StoreError::CityNotFound(city_id.to_string()))
    }

    pub fn latest_report(&self, city_id: &str) -> Result<&WeatherReport, StoreError> {
        let reports = self.all_reports(city_id)?;
        latest_index(reports)
            .map(|idx| &reports[idx])
            .ok_or_else(|| StoreError::CityNotFound(city_id.to_string()))
    }

    /// Latest report of every stored city.
    pub fn summary(&self) -> HashMap<String, WeatherReport> {
        self.reports
            .iter()
            .filter_map(|(city, reports)| {
                latest_index(reports).map(|idx| (city.clone(), reports[idx].clone()))
            })
            .collect()
    }

    /// Overwrite temperature and condition of the latest report in place.
    pub fn update_latest_report(
        &mut self,
        city_id: &str,
        update: &WeatherReportUpdate,
    ) -> Result<(), StoreError> {
        let reports = self
            .reports
            .get_mut(city_id)
            .ok_or_else(|| StoreError::CityNotFound(city_id.to_string()))?;
        let idx = latest_index(reports)
            .ok_or_else(|| StoreError::CityNotFound(city_id.to_string()))?;
        let latest = &mut reports[idx];
        latest.temperature = update.temperature;
        latest.condition = update.condition.clone();
        Ok(())
    }

    pub fn delete_reports(&mut self, city_id: &str) -> Result<(), StoreError> {
        self.reports
            .remove(city_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::CityNotFound(city_id.to_string()))
    }

    pub fn reports(&self) -> &HashMap<String, Vec<WeatherReport>> {
        &self.reports
    }

    pub fn city_count(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}
