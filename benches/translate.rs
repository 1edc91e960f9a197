//! 命令翻译与帧编解码的基准测试

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use erlrtree::commands::CommandRegistry;
use erlrtree::protocol::RespParser;
use erlrtree::{Command, NodeName, Term};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const POINT_COUNT: usize = 10_000;

/// 生成 `X,Y` 形式的随机经纬度
fn generate_points(count: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let x: f64 = rng.gen_range(-180.0..180.0);
            let y: f64 = rng.gen_range(-90.0..90.0);
            format!("{},{}", x, y)
        })
        .collect()
}

fn bench_translate(c: &mut Criterion) {
    let registry = CommandRegistry::new();
    let target: NodeName = "rtree@127.0.0.1".parse().unwrap();
    let command = Command::Intersects {
        tree_name: "mytree".to_string(),
        points: generate_points(POINT_COUNT, 42),
    };

    c.bench_function("translate_intersects_10k", |b| {
        b.iter(|| {
            let calls = command.to_remote_calls(&registry, &target).unwrap();
            black_box(calls.len())
        })
    });
}

fn bench_reply_frames(c: &mut Criterion) {
    let parser = RespParser::new();
    let term = Term::Tuple(vec![
        Term::atom("ok"),
        Term::List((0..32).map(|i| Term::string(format!("feature-{}", i))).collect()),
    ]);
    let json = term.to_json().unwrap();
    let frame = format!("*2\r\n:7\r\n${}\r\n{}\r\n", json.len(), json);

    c.bench_function("parse_reply_frame", |b| {
        b.iter(|| {
            let (value, used) = parser.parse_frame(black_box(frame.as_bytes())).unwrap().unwrap();
            black_box((value, used))
        })
    });
}

criterion_group!(benches, bench_translate, bench_reply_frames);
criterion_main!(benches);
