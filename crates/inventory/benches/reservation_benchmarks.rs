use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::{NaiveDate, TimeZone, Utc};
use planora_core::{EventId, ItemId, UserId};
use planora_inventory::{Condition, InventoryItem, ItemDraft};

fn bench_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

fn item_with_reservations(total: u32, reservations: usize) -> InventoryItem {
    let mut item = InventoryItem::create(
        ItemId::new(),
        ItemDraft {
            name: "Stage riser".to_string(),
            description: None,
            category: "Staging".to_string(),
            condition: Condition::Used,
            variations: "2x1m".to_string(),
            images: vec![],
            is_external: false,
            price: 4_000,
            total_quantity: total,
        },
        UserId::new(),
        bench_time(),
    )
    .expect("valid draft");

    // Spread reservations of quantity 1 over a year of dates so per-date sums
    // stay within capacity.
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    for i in 0..reservations {
        let date = base + chrono::Days::new((i % 365) as u64);
        let r = item
            .admit(EventId::new(), date, 1, bench_time())
            .expect("capacity available");
        item.reservations.push(r);
    }
    item
}

fn bench_availability(c: &mut Criterion) {
    let mut group = c.benchmark_group("availability");
    for reservations in [10usize, 100, 1_000] {
        let item = item_with_reservations(1_000, reservations);
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

        group.throughput(Throughput::Elements(reservations as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(reservations),
            &item,
            |b, item| b.iter(|| black_box(item.available_on(black_box(date)))),
        );
    }
    group.finish();
}

fn bench_admission(c: &mut Criterion) {
    let mut group = c.benchmark_group("admission");
    for reservations in [10usize, 100, 1_000] {
        let item = item_with_reservations(1_000, reservations);
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(reservations),
            &item,
            |b, item| {
                b.iter(|| {
                    black_box(item.admit(EventId::new(), black_box(date), 1, bench_time())).ok()
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_availability, bench_admission);
criterion_main!(benches);
