use criterion::{Criterion, criterion_group, criterion_main};
use ecmascript::{Engine, EngineOptions, evaluate_script, parse_program, tokenize};
use std::hint::black_box;

// cargo bench --profile dev

// Initialize logger for benchmark so `RUST_LOG` is honored.
#[ctor::ctor]
fn __init_bench_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).try_init();
}

const FIB: &str = r#"
    function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }
    fib(18);
"#;

const OBJECTS: &str = r#"
    var points = [];
    for (var i = 0; i < 2000; i++) {
        points.push({ x: i, y: i * 2, tag: "p" + i });
    }
    var sum = 0;
    for (var j = 0; j < points.length; j++) {
        sum += points[j].x + points[j].y;
    }
    sum;
"#;

const STRINGS_AND_JSON: &str = r#"
    var parts = [];
    for (var i = 0; i < 500; i++) parts.push("item" + i);
    var text = JSON.stringify({ items: parts, count: parts.length });
    JSON.parse(text).items.join(",").split(",").length;
"#;

fn benchmark_pipeline(c: &mut Criterion) {
    c.bench_function("tokenize_fib", |b| b.iter(|| black_box(tokenize(black_box(FIB)))));

    c.bench_function("parse_objects", |b| b.iter(|| black_box(parse_program(black_box(OBJECTS), false))));

    c.bench_function("evaluate_fib", |b| b.iter(|| black_box(evaluate_script(FIB, None::<&str>))));

    c.bench_function("evaluate_objects", |b| b.iter(|| black_box(evaluate_script(OBJECTS, None::<&str>))));

    c.bench_function("evaluate_strings_json", |b| {
        b.iter(|| black_box(evaluate_script(STRINGS_AND_JSON, None::<&str>)))
    });

    // Same loop without constant folding, to see what the optimizer buys.
    c.bench_function("evaluate_objects_unoptimized", |b| {
        b.iter(|| {
            let mut engine = Engine::with_options(EngineOptions {
                optimize: false,
                ..EngineOptions::default()
            })
            .unwrap();
            black_box(engine.evaluate(OBJECTS))
        })
    });

    // Host function round trips on a persistent engine.
    c.bench_function("host_function_calls", |b| {
        let mut engine = Engine::new().unwrap();
        let _ = engine.set_global_function("double", |args| Ok((args.first().and_then(|a| a.as_number()).unwrap_or(0.0) * 2.0).into()));
        b.iter(|| black_box(engine.evaluate("var t = 0; for (var i = 0; i < 200; i++) t += double(i); t")))
    });
}

criterion_group!(benches, benchmark_pipeline);
criterion_main!(benches);
