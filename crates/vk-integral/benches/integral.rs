use criterion::{Criterion, black_box, criterion_group, criterion_main};
use vk_core::{Execution, Image};
use vk_integral::{IntegralImage, hessian_intensity, hessian_intensity_naive, transform_with};

fn build_checker_u8(width: usize, height: usize) -> Image<u8> {
    let data = (0..width * height)
        .map(|i| {
            let cell = (i % width) / 16 + (i / width) / 16;
            if cell.is_multiple_of(2) { 40 } else { 220 }
        })
        .collect();
    Image::from_vec(width, height, data).expect("valid image")
}

fn bench_transform(c: &mut Criterion) {
    let img = build_checker_u8(1280, 1024);
    let view = img.as_view();
    let mut out = Image::new_fill(0, 0, 0i32);

    for exec in [Execution::Sequential, Execution::Parallel] {
        c.bench_function(&format!("integral_u8_1280x1024_{exec:?}"), |b| {
            b.iter(|| {
                transform_with(black_box(&view), &mut out, exec);
                black_box(out.data().len());
            });
        });
    }
}

fn bench_hessian(c: &mut Criterion) {
    let img = build_checker_u8(640, 480);
    let integral = IntegralImage::from_view(&img.as_view(), Execution::Sequential);
    let view = integral.as_view();
    let mut out = Image::new_fill(0, 0, 0.0f32);

    c.bench_function("hessian9_standard_640x480", |b| {
        b.iter(|| {
            hessian_intensity(black_box(&view), 1, 9, &mut out, Execution::Sequential)
                .expect("valid params");
            black_box(out.data().len());
        });
    });
    c.bench_function("hessian9_naive_640x480", |b| {
        b.iter(|| {
            hessian_intensity_naive(black_box(&view), 1, 9, &mut out).expect("valid params");
            black_box(out.data().len());
        });
    });
}

criterion_group!(benches, bench_transform, bench_hessian);
criterion_main!(benches);
