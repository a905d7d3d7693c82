use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_yaml::Value;
use tmuxload::config::{DefaultsTrickler, ShorthandExpander};
use tmuxload::import;
use tmuxload::{ConfigFormat, MemoryMultiplexer, WorkspaceBuilder, WorkspaceLoader};

/// A canonical workspace with `windows` windows of four panes each.
fn workspace_yaml(windows: usize) -> String {
    let mut yaml = String::from(
        "session_name: bench\nstart_directory: /srv/bench\nenvironment:\n  RUST_LOG: debug\nwindows:\n",
    );
    for i in 0..windows {
        yaml.push_str(&format!(
            "  - window_name: w{i}\n    layout: tiled\n    shell_command_before: [source .env]\n    panes:\n      - vim\n      - [cargo watch, cargo test]\n      - blank\n      - shell_command: tail -f log/{i}.log\n        focus: true\n"
        ));
    }
    yaml
}

fn loader() -> WorkspaceLoader<'static> {
    WorkspaceLoader::new()
        .with_base_dir("/srv/bench")
        .with_env_lookup(|_| None)
}

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");

    for windows in [1, 10, 50] {
        let yaml = workspace_yaml(windows);
        group.bench_with_input(BenchmarkId::new("canonical", windows), &yaml, |b, yaml| {
            b.iter(|| loader().load_str(black_box(yaml), ConfigFormat::Yaml));
        });
    }

    group.finish();
}

fn bench_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("stages");
    let raw: Value = serde_yaml::from_str(&workspace_yaml(20)).unwrap();
    let config = loader()
        .load_str(&workspace_yaml(20), ConfigFormat::Yaml)
        .unwrap()
        .config;

    // Benchmark shorthand expansion only
    group.bench_function("shorthand", |b| {
        b.iter(|| ShorthandExpander::expand(black_box(&raw)));
    });

    // Benchmark trickle only
    group.bench_function("trickle", |b| {
        b.iter(|| DefaultsTrickler::trickle(black_box(&config)));
    });

    // Benchmark dialect detection
    group.bench_function("detect", |b| {
        b.iter(|| import::detect(black_box(&raw)));
    });

    group.finish();
}

fn bench_tmuxinator_import(c: &mut Criterion) {
    let mut yaml = String::from("name: bench\nroot: ~/bench\npre_window: nvm use\nwindows:\n");
    for i in 0..20 {
        yaml.push_str(&format!("  - w{i}:\n      layout: main-vertical\n      panes:\n        - vim\n        - guard\n"));
    }
    let raw: Value = serde_yaml::from_str(&yaml).unwrap();

    c.bench_function("import_tmuxinator", |b| {
        b.iter(|| import::tmuxinator::import(black_box(&raw)));
    });
}

fn bench_build(c: &mut Criterion) {
    let config = loader()
        .load_str(&workspace_yaml(10), ConfigFormat::Yaml)
        .unwrap()
        .config;

    c.bench_function("build_memory", |b| {
        b.iter(|| {
            let mut mux = MemoryMultiplexer::new();
            WorkspaceBuilder::new(black_box(&config))
                .with_sleeper(|_| {})
                .build(&mut mux)
        });
    });
}

criterion_group!(
    benches,
    bench_load,
    bench_stages,
    bench_tmuxinator_import,
    bench_build
);
criterion_main!(benches);
