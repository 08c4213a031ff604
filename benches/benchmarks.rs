use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jsonwalk::json::parser::{parse, ParserOptions};
use jsonwalk::json::JVal;
use jsonwalk::namespace::Namespace;
use jsonwalk::walk::{compile, SearchCache, Walk, WalkOutcome};

fn sample_document() -> JVal {
    let mut src = String::from("[");
    for i in 0..2000 {
        if i > 0 {
            src.push(',');
        }
        src.push_str(&format!(r#"{{"id":{i},"tags":["a","b","c"]}}"#));
    }
    src.push(']');
    parse(&src, &ParserOptions::default()).expect("well-formed sample document")
}

fn walk_benchmark(c: &mut Criterion) {
    let root = sample_document();
    c.bench_function("recursive search over 2000 records", |b| {
        b.iter(|| {
            let steps = compile("<b>w+0").expect("valid walk path");
            let mut walk = Walk::new(steps);
            let mut ns = Namespace::new();
            let mut cache = SearchCache::new();
            let mut count = 0;
            loop {
                match walk.next(black_box(&root), &mut ns, &mut cache, 0) {
                    WalkOutcome::Matched(_) => count += 1,
                    WalkOutcome::Done => break,
                }
            }
            black_box(count)
        })
    });
}

criterion_group!(benches, walk_benchmark);
criterion_main!(benches);
