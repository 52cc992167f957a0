// Benchmark for the day layout
// Measures layout_day on busy days of staggered, overlapping entries

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::UTC;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use timegrid::models::entry::Entry;
use timegrid::models::settings::LayoutConfig;
use timegrid::services::layout::layout_day;
use timegrid::services::store::DayFragment;

/// `count` entries of 45 to 105 minutes, starting every 20 minutes.
fn busy_day(count: usize) -> Vec<DayFragment> {
    let day = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
    let midnight = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let start = (i as i64 * 20) % 1380;
            let length = 45 + (i as i64 * 7) % 60;
            let entry = Entry::new(
                i as i64,
                midnight + Duration::minutes(start),
                midnight + Duration::minutes((start + length).min(1440)),
            )
            .unwrap();
            DayFragment::clip(&entry, day, UTC).unwrap()
        })
        .collect()
}

fn bench_layout_day(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_day");
    let config = LayoutConfig::default();

    for count in [8, 32, 128].iter() {
        let fragments = busy_day(*count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &fragments, |b, fragments| {
            b.iter(|| layout_day(black_box(fragments), black_box(&config)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_layout_day);
criterion_main!(benches);
