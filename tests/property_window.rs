use airsense::domain::{
    location::{Coordinate, SavedLocation},
    window::{Horizon, QueryTarget, build_request},
};
use chrono::{Days, NaiveDate};
use proptest::prelude::*;

fn saved(latitude: f64, longitude: f64) -> SavedLocation {
    SavedLocation {
        id: "7".to_string(),
        name: "sampler".to_string(),
        description: String::new(),
        coordinate: Some(Coordinate::new(latitude, longitude)),
    }
}

fn base_day(offset: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|day| day.checked_add_days(Days::new(offset)))
        .expect("valid day")
}

proptest! {
    #[test]
    fn point_window_spans_exactly_the_horizon(
        horizon in 0i64..=5,
        offset in 0u64..3650,
    ) {
        let today = base_day(offset);
        let request = build_request(
            &QueryTarget::Point("7".to_string()),
            vec!["stink".to_string()],
            Horizon::clamped(horizon),
            &[saved(54.5, 18.6)],
            today,
        )
        .expect("point request");

        prop_assert_eq!(request.range.from, today);
        prop_assert_eq!(request.range.span_days(), horizon);
    }

    #[test]
    fn point_box_strictly_contains_its_location(
        latitude in -89.0f64..89.0,
        longitude in -179.0f64..179.0,
    ) {
        prop_assume!(latitude != 0.0 && longitude != 0.0);
        let coordinate = Coordinate::new(latitude, longitude);
        let request = build_request(
            &QueryTarget::Point("7".to_string()),
            Vec::new(),
            Horizon::clamped(3),
            &[saved(latitude, longitude)],
            base_day(0),
        )
        .expect("point request");

        prop_assert!(request.bbox.contains(coordinate));
        prop_assert!((request.bbox.lat_span() - 0.2).abs() < 1e-9);
        prop_assert!((request.bbox.lng_span() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn horizon_always_lands_in_range(days in any::<i64>()) {
        prop_assert!(Horizon::clamped(days).days() <= Horizon::MAX);
    }
}
