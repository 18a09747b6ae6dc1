use criterion::{Criterion, black_box, criterion_group, criterion_main};
use vk_core::{Execution, Image};
use vk_feature::{CornerConfig, FastConfig, FastCornerDetector, FastDecisionTree, gradient_sobel};

fn build_checker_u8(width: usize, height: usize) -> Image<u8> {
    let data = (0..width * height)
        .map(|i| {
            let cell = (i % width) / 16 + (i / width) / 16;
            if cell.is_multiple_of(2) { 40 } else { 210 }
        })
        .collect();
    Image::from_vec(width, height, data).expect("valid image")
}

fn bench_tree(c: &mut Criterion) {
    c.bench_function("fast_tree_build_min_run_9", |b| {
        b.iter(|| black_box(FastDecisionTree::new(black_box(9)).expect("supported")));
    });
}

fn bench_detector(c: &mut Criterion) {
    let img = build_checker_u8(1280, 1024);
    let view = img.as_view();

    for execution in [Execution::Sequential, Execution::Parallel] {
        let cfg = FastConfig {
            execution,
            ..FastConfig::default()
        };
        let mut det = FastCornerDetector::new(&cfg).expect("valid config");
        c.bench_function(&format!("fast9_1280x1024_{execution:?}"), |b| {
            b.iter(|| {
                det.process(black_box(&view));
                black_box(det.candidates_bright().len() + det.candidates_dark().len());
            });
        });
    }
}

fn bench_harris(c: &mut Criterion) {
    let img = build_checker_u8(640, 480);
    let mut gx = Image::new_fill(0, 0, 0i32);
    let mut gy = Image::new_fill(0, 0, 0i32);
    gradient_sobel(&img.as_view(), &mut gx, &mut gy, Execution::Sequential)
        .expect("extend never fails");
    let cfg = CornerConfig::default();
    let mut out = Image::new_fill(0, 0, 0.0f32);

    c.bench_function("harris_r2_640x480", |b| {
        b.iter(|| {
            cfg.harris(black_box(&gx.as_view()), &gy.as_view(), &mut out)
                .expect("valid kappa");
            black_box(out.data().len());
        });
    });
}

criterion_group!(benches, bench_tree, bench_detector, bench_harris);
criterion_main!(benches);
