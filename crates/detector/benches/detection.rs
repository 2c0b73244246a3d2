use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_decimal::Decimal;

use arb_core::{Instrument, PairScan, Quote, QuoteBook, Ticker};
use arb_detector::CrossVenueStrategy;

fn book(venues: usize) -> QuoteBook {
    let instrument = Instrument::new("BTC", "USDT");
    let mut book = QuoteBook::new(instrument.clone());

    for i in 0..venues {
        // Spread venues 0.3% apart so some pairs clear the threshold
        let bid = Decimal::new(100_000 + (i as i64) * 300, 3);
        let ask = bid + Decimal::new(10, 3);
        let quote = Quote::from_ticker(format!("venue-{i}"), instrument.clone(), Ticker::new(bid, ask, bid), Utc::now())
            .expect("valid quote");
        book.insert(quote);
    }

    book
}

fn bench_find_opportunities(c: &mut Criterion) {
    let mut group = c.benchmark_group("cross_venue");

    for venues in [3usize, 10, 50] {
        let book = book(venues);
        for (label, pair_scan) in [("forward", PairScan::ForwardOnly), ("bidirectional", PairScan::Bidirectional)] {
            let strategy = CrossVenueStrategy::new(Decimal::new(5, 1), pair_scan);
            group.bench_with_input(BenchmarkId::new(label, venues), &book, |b, book| {
                b.iter(|| strategy.find_opportunities(black_box(book), Utc::now()))
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_find_opportunities);
criterion_main!(benches);
