use criterion::{Criterion, criterion_group, criterion_main};
use rose_core::parser::scanner::Scanner;
use rose_core::parser::{parse, parse_source, sema};
use rose_core::{Interpreter, run};

/// A script touching most statement and expression forms.
const MIXED_SOURCE: &str = r#"
function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }
let total = 0;
for (let i = 0; i < 10; i++) {
    switch (i % 3) {
        case 0: total += i; break;
        case 1: total -= 1; break;
        default: total *= 2;
    }
}
let point = { x: 1, y: 2, tags: ["a", "b"] };
try { throw point.x; } catch (e) { total += e; }
while (total > 1000) { total = total / 2; }
fib(10) + total + Math.sqrt(16);
"#;

/// A loop-heavy script dominated by arithmetic and scope lookups.
const LOOP_SOURCE: &str = r#"
let sum = 0;
for (let i = 0; i < 2000; i++) {
    sum = sum + i * 2 - (i % 7);
}
sum;
"#;

// ---------------------------------------------------------------------------
// Front end
// ---------------------------------------------------------------------------

fn bench_scanner(c: &mut Criterion) {
    let source = MIXED_SOURCE.repeat(20);
    c.bench_function("scan_mixed_script", |b| {
        b.iter(|| Scanner::tokenize_all(&source, "bench.rose"));
    });
}

fn bench_parser(c: &mut Criterion) {
    let source = MIXED_SOURCE.repeat(20);
    let tokens = Scanner::tokenize_all(&source, "bench.rose").expect("bench source lexes");
    c.bench_function("parse_mixed_script", |b| {
        b.iter(|| parse(tokens.clone()));
    });

    let program = parse_source(&source, "bench.rose").expect("bench source parses");
    c.bench_function("analyze_mixed_script", |b| {
        b.iter(|| sema::analyze(&program));
    });
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

fn bench_evaluator(c: &mut Criterion) {
    let program = parse_source(LOOP_SOURCE, "bench.rose").expect("bench source parses");
    c.bench_function("eval_arithmetic_loop", |b| {
        b.iter(|| Interpreter::new().evaluate(&program));
    });

    c.bench_function("run_mixed_script", |b| {
        b.iter(|| run(MIXED_SOURCE, "bench.rose"));
    });
}

criterion_group!(benches, bench_scanner, bench_parser, bench_evaluator);
criterion_main!(benches);
