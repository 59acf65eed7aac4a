use std::fs;
use std::path::PathBuf;

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use rs_player_stats::html_table::parse_tables;
use rs_player_stats::per_game::{normalize_per_game, parse_per_game_html, select_per_game_table};

fn fixture() -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("player_per_game.html");
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn bench_parse_page(c: &mut Criterion) {
    let html = fixture();
    c.bench_function("per_game_parse_page", |b| {
        b.iter(|| {
            let table = parse_per_game_html("testpl01", "Test Player", black_box(&html)).unwrap();
            black_box(table.len());
        })
    });
}

fn bench_normalize_only(c: &mut Criterion) {
    let html = fixture();
    let tables = parse_tables(&html);
    let table = select_per_game_table(&tables).expect("per game table").clone();
    c.bench_function("per_game_normalize", |b| {
        b.iter(|| {
            let out = normalize_per_game("testpl01", "Test Player", black_box(&table)).unwrap();
            black_box(out.rows.len());
        })
    });
}

criterion_group!(benches, bench_parse_page, bench_normalize_only);
criterion_main!(benches);
