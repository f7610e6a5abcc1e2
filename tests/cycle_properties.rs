use chrono::{DateTime, Duration, TimeZone, Utc};
use linear_terminal_clock::geo::{Coordinates, Cycle, SolarCalculator};
use linear_terminal_clock::render::Bar;
use proptest::prelude::*;

/// Instants between 2000 and 2040
fn instant_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (946_684_800i64..2_208_988_800i64).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

fn solar_for(lat: f64, lon: f64) -> SolarCalculator {
    SolarCalculator::new(Coordinates::new(lat, lon).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn cycle_contains_its_instant(
        lat in -90.0f64..=90.0,
        lon in -180.0f64..180.0,
        instant in instant_strategy(),
    ) {
        let mut solar = solar_for(lat, lon);
        let cycle = Cycle::spanning(instant, &mut solar).unwrap();

        prop_assert!(cycle.start <= instant);
        prop_assert!(instant < cycle.end);
        prop_assert!(cycle.contains(instant));
        prop_assert!(cycle.duration() > Duration::zero());
    }

    #[test]
    fn sunset_falls_inside_the_cycle(
        lat in -80.0f64..80.0,
        lon in -180.0f64..180.0,
        instant in instant_strategy(),
    ) {
        let mut solar = solar_for(lat, lon);
        let cycle = Cycle::spanning(instant, &mut solar).unwrap();

        if let Some(sunset) = cycle.sunset {
            prop_assert!(cycle.start < sunset, "{cycle:?}");
            prop_assert!(sunset < cycle.end, "{cycle:?}");
        }
    }

    #[test]
    fn consecutive_cycles_touch(
        lat in -60.0f64..60.0,
        lon in -180.0f64..180.0,
        instant in instant_strategy(),
    ) {
        let mut solar = solar_for(lat, lon);
        let cycle = Cycle::spanning(instant, &mut solar).unwrap();
        let next = Cycle::spanning(cycle.end, &mut solar).unwrap();

        prop_assert_eq!(next.start, cycle.end);
    }

    #[test]
    fn bar_offsets_are_monotonic_and_in_range(
        lat in -60.0f64..60.0,
        lon in -180.0f64..180.0,
        instant in instant_strategy(),
        length in 10usize..300,
        a in 0.0f64..1.0,
        b in 0.0f64..1.0,
    ) {
        let mut solar = solar_for(lat, lon);
        let cycle = Cycle::spanning(instant, &mut solar).unwrap();
        let bar = Bar::new(cycle, length).unwrap();

        let span = (cycle.end - cycle.start).num_seconds();
        let at = |fraction: f64| cycle.start + Duration::seconds((span as f64 * fraction) as i64);
        let (early, late) = if a <= b { (at(a), at(b)) } else { (at(b), at(a)) };

        let early_offset = bar.offset_of(early).unwrap();
        let late_offset = bar.offset_of(late).unwrap();
        prop_assert!(early_offset <= late_offset);
        prop_assert!(late_offset < length);
        prop_assert_eq!(bar.offset_of(cycle.start).unwrap(), 0);
        prop_assert_eq!(bar.offset_of(cycle.end).unwrap(), length);
    }
}
