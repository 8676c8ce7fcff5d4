use chrono::{Days, NaiveDate};

use crate::domain::{
    measurement::{MeasurementRecord, STINK_TYPE},
    window::Horizon,
};

/// One row of the forward-looking forecast list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayOutlook {
    pub date: NaiveDate,
    pub flagged: bool,
}

/// Read-only lookups over one fetched batch of records.
///
/// Every query is a linear scan in the order the service returned the
/// records. When several records share a type and day, the first one wins;
/// the service does not promise a stable order, so callers that need a
/// specific reading must sort the batch before building the index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordIndex {
    records: Vec<MeasurementRecord>,
}

impl RecordIndex {
    pub fn new(records: Vec<MeasurementRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[MeasurementRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn value_on(&self, kind: &str, date: NaiveDate) -> Option<f64> {
        self.records
            .iter()
            .find(|record| record.kind == kind && record.day() == date)
            .map(|record| record.value)
    }

    pub fn is_flagged(&self, date: NaiveDate, flag_type: &str) -> bool {
        self.records
            .iter()
            .any(|record| record.kind == flag_type && record.day() == date && record.value > 0.0)
    }

    pub fn is_stinky(&self, date: NaiveDate) -> bool {
        self.is_flagged(date, STINK_TYPE)
    }

    /// Today plus the following days, `horizon` rows in total.
    pub fn outlook(&self, today: NaiveDate, horizon: Horizon) -> Vec<DayOutlook> {
        (0..u64::from(horizon.days()))
            .filter_map(|offset| today.checked_add_days(Days::new(offset)))
            .map(|date| DayOutlook {
                date,
                flagged: self.is_stinky(date),
            })
            .collect()
    }

    /// Positions of readings that carry coordinates, for map markers.
    pub fn positions(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.records.iter().filter_map(MeasurementRecord::position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").expect("valid time fixture")
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).expect("valid date fixture")
    }

    fn index() -> RecordIndex {
        RecordIndex::new(vec![
            MeasurementRecord::new("temperature", at("2024-06-01T09:00"), 18.5),
            MeasurementRecord::new("temperature", at("2024-06-01T15:00"), 23.0),
            MeasurementRecord::new("stink", at("2024-06-01T22:00"), 0.0),
            MeasurementRecord::new("stink", at("2024-06-02T03:00"), 0.0),
            MeasurementRecord::new("stink", at("2024-06-02T04:00"), 2.0).at(54.4, 18.6),
            MeasurementRecord::new("pm25", at("2024-06-03T12:00"), 9.0).at(54.5, 18.7),
        ])
    }

    #[test]
    fn value_on_returns_first_match_in_sequence_order() {
        assert_eq!(index().value_on("temperature", day(1)), Some(18.5));
    }

    #[test]
    fn value_on_is_absent_without_type_and_day_match() {
        let index = index();
        assert_eq!(index.value_on("temperature", day(2)), None);
        assert_eq!(index.value_on("o3", day(1)), None);
        assert_eq!(RecordIndex::default().value_on("pm25", day(3)), None);
    }

    #[test]
    fn flag_requires_positive_value_on_that_day() {
        let index = index();
        assert!(!index.is_stinky(day(1)));
        assert!(index.is_stinky(day(2)));
        assert!(!index.is_stinky(day(3)));
        assert!(!RecordIndex::default().is_stinky(day(2)));
    }

    #[test]
    fn custom_flag_type_is_honoured() {
        assert!(index().is_flagged(day(3), "pm25"));
        assert!(!index().is_flagged(day(2), "pm25"));
    }

    #[test]
    fn outlook_covers_horizon_days_starting_today() {
        let outlook = index().outlook(day(1), Horizon::clamped(3));
        assert_eq!(
            outlook,
            vec![
                DayOutlook {
                    date: day(1),
                    flagged: false
                },
                DayOutlook {
                    date: day(2),
                    flagged: true
                },
                DayOutlook {
                    date: day(3),
                    flagged: false
                },
            ]
        );
        assert!(index().outlook(day(1), Horizon::clamped(0)).is_empty());
    }

    #[test]
    fn positions_skip_records_without_coordinates() {
        let positions = index().positions().collect::<Vec<_>>();
        assert_eq!(positions, vec![(54.4, 18.6), (54.5, 18.7)]);
    }
}
