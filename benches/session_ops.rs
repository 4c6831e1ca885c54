use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use request_session::{
    InMemoryBackingStore, RequestMeta, SessionDriver, SessionStore, SessionValue,
};
use serde_json::json;

fn inmemory_benches(c: &mut Criterion) {
    let store = SessionStore::new(InMemoryBackingStore::new());
    let req =
        RequestMeta::new("10.0.0.5").with_header("X-Forwarded-For", "203.0.113.7, 10.0.0.5");

    c.bench_function("inmemory_set", |b| {
        let mut counter = 0u64;
        b.iter(|| {
            counter = counter.wrapping_add(1);
            let key = format!("key-{}", counter % 16);
            store
                .set(&req, &key, SessionValue::from("value"))
                .expect("set");
        });
    });

    c.bench_function("inmemory_set_structured", |b| {
        let prefs = SessionValue::structured(&json!({"theme": "dark", "page_size": 25}))
            .expect("structured");
        b.iter(|| {
            store.set(&req, "prefs", prefs.clone()).expect("set");
        });
    });

    c.bench_function("inmemory_get_flash_miss", |b| {
        store
            .set(&req, "user_id", SessionValue::from("42"))
            .expect("set for get");
        b.iter(|| {
            black_box(store.get(&req, "user_id").expect("get"));
        });
    });

    c.bench_function("inmemory_all", |b| {
        store
            .flash(&req, "msg", SessionValue::from("saved"))
            .expect("flash for all");
        b.iter(|| {
            black_box(store.all(&req).expect("all"));
        });
    });
}

criterion_group!(session_ops, inmemory_benches);
criterion_main!(session_ops);
