use criterion::{black_box, criterion_group, criterion_main, Criterion};
use matchbook::{OrderBook, Side};

fn bench_submit_and_match(c: &mut Criterion) {
    c.bench_function("submit_and_match", |b| {
        b.iter(|| {
            let mut book = OrderBook::new();
            let mut s: u64 = 0xDEAD_BEEF_CAFE_BABE; // fixed seed, deterministic
            for i in 0..1024i64 {
                // simple LCG step
                s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
                let side = if s & 1 == 0 { Side::Buy } else { Side::Sell };
                let price = 95 + (s >> 8) as i64 % 10;
                let qty = 1 + ((s >> 16) % 8) as u32;
                let outcome =
                    black_box(book.add_limit_order(side, price, qty, i).expect("valid order"));
                black_box(outcome.order_id);
            }
            book.open_order_count()
        })
    });
}

fn bench_cancel_storm(c: &mut Criterion) {
    c.bench_function("cancel_storm", |b| {
        b.iter(|| {
            let mut book = OrderBook::new();
            let mut ids = Vec::with_capacity(512);
            for i in 0..512i64 {
                let outcome = book.add_limit_order(Side::Buy, 90 + (i % 10), 5, i).expect("valid");
                ids.push(outcome.order_id);
            }
            for id in &ids {
                black_box(book.cancel_order(*id));
            }
            book.open_order_count()
        })
    });
}

criterion_group!(benches, bench_submit_and_match, bench_cancel_storm);
criterion_main!(benches);
