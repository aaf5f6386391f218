//! Criterion benchmarks for split planning and full folds.
//! Focus sizes: polygon vertex counts n in {4, 8, 16, 32}.
//! Results land under target/criterion.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use nalgebra::Vector2;
use origami::cfg::FoldCfg;
use origami::face::Face;
use origami::fold::{plan_split, Side};
use origami::geom::rand::{draw_convex_polygon, RadialCfg, ReplayToken, VertexCount};
use origami::ids::{EdgeId, PointId};
use origami::lug::{Crease, FoldCut, FoldRequest};
use origami::PaperStore;

fn marked_polygon(n: usize, seed: u64) -> (Face<2>, PointId, PointId) {
    let cfg = RadialCfg {
        vertex_count: VertexCount::Fixed(n),
        angle_jitter_frac: 0.1,
        radial_jitter: 0.05,
        base_radius: 1.0,
    };
    let poly = draw_convex_polygon(cfg, ReplayToken { seed, index: 0 });
    let m = poly.len();
    let mid = |e: usize| (poly[e] + poly[(e + 1) % m]) * 0.5;
    let mut face = Face::<2>::new(poly.clone()).unwrap();
    let p = face.add_point(mid(0), Some(EdgeId(0)), 0.01).unwrap();
    let q = face.add_point(mid(m / 2), Some(EdgeId(m / 2)), 0.01).unwrap();
    for k in 0..n {
        let t = (k as f64 + 0.5) / n as f64;
        face.add_point(Vector2::new(0.5 * t - 0.25, 0.3 * t - 0.15), None, 0.01)
            .unwrap();
    }
    (face, p, q)
}

fn bench_fold(c: &mut Criterion) {
    let mut group = c.benchmark_group("fold");
    let cfg = FoldCfg::default();
    for &n in &[4usize, 8, 16, 32] {
        group.bench_with_input(BenchmarkId::new("plan_split", n), &n, |b, &n| {
            let (face, p, q) = marked_polygon(n, 41);
            b.iter(|| {
                let plan = plan_split(&face, p, q, &cfg).unwrap();
                plan.apply(&face).unwrap()
            })
        });

        group.bench_with_input(BenchmarkId::new("complete_split_fold", n), &n, |b, &n| {
            b.iter_batched(
                || {
                    let (face, p, q) = marked_polygon(n, 42);
                    let mut store = PaperStore::new();
                    let id = store.add_face(face.vertex_coords()).unwrap();
                    let from = store
                        .add_point(id, face.coords(p).unwrap(), face.points()[&p].edge)
                        .unwrap()
                        .0;
                    let to = store
                        .add_point(id, face.coords(q).unwrap(), face.points()[&q].edge)
                        .unwrap()
                        .0;
                    let req = FoldRequest {
                        crease: Crease::Cut {
                            cuts: vec![FoldCut { face: id, from, to }],
                            stationary: Side::Left,
                        },
                        start: 180.0,
                        end: 0.0,
                    };
                    (store, req)
                },
                |(mut store, req)| {
                    let _report = store.fold(&req).unwrap();
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_fold);
criterion_main!(benches);
