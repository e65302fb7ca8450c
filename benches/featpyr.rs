use criterion::{criterion_group, criterion_main, Criterion};
use featpyr::{
    harris_pyramid, hessian_pyramid, CachedDerivative, Derivative, DerivativeKernel, Harris,
    HessianBlobKind, ImageDerivative, ImagePyramid, ImageView, PyramidDetectorConfig,
    WindowedStructureTensor,
};
use std::hint::black_box;

fn make_image(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF;
            data.push(value as u8);
        }
    }
    data
}

fn bench_structure_tensor(c: &mut Criterion) {
    let (width, height) = (512, 512);
    let image = make_image(width, height);
    let view = ImageView::from_slice(&image, width, height).unwrap();
    let mut deriv = CachedDerivative::new(DerivativeKernel::Sobel);
    deriv.set_input(view).unwrap();
    for which in Derivative::GRADIENT {
        ImageDerivative::<u8, f32>::ensure(&mut deriv, which).unwrap();
    }
    let dx = ImageDerivative::<u8, f32>::derivative(&deriv, Derivative::X).unwrap();
    let dy = ImageDerivative::<u8, f32>::derivative(&deriv, Derivative::Y).unwrap();

    for radius in [2usize, 6] {
        let mut engine = WindowedStructureTensor::<f32, _>::new(radius, Harris::default());
        c.bench_function(&format!("structure_tensor_r{radius}"), |b| {
            b.iter(|| {
                engine.process(dx, dy).unwrap();
                black_box(engine.intensity().as_slice()[0])
            });
        });
    }
}

fn bench_pyramids(c: &mut Criterion) {
    let (width, height) = (512, 512);
    let image = make_image(width, height);
    let view = ImageView::from_slice(&image, width, height).unwrap();
    let pyramid = ImagePyramid::build(view, 5).unwrap();
    let config = PyramidDetectorConfig {
        feature_radius: 2,
        threshold: 50.0,
        ..PyramidDetectorConfig::default()
    };

    let mut harris = harris_pyramid(&config);
    c.bench_function("harris_pyramid_512", |b| {
        b.iter(|| {
            harris.detect(&pyramid).unwrap();
            black_box(harris.interest_points().len())
        });
    });

    let mut blobs = hessian_pyramid(&config, HessianBlobKind::Determinant);
    c.bench_function("hessian_pyramid_512", |b| {
        b.iter(|| {
            blobs.detect(&pyramid).unwrap();
            black_box(blobs.interest_points().len())
        });
    });

    #[cfg(feature = "rayon")]
    {
        let mut par = harris_pyramid(&config);
        par.derivative_mut().set_parallel(true);
        c.bench_function("harris_pyramid_512_parallel", |b| {
            b.iter(|| {
                par.detect(&pyramid).unwrap();
                black_box(par.interest_points().len())
            });
        });
    }
}

criterion_group!(benches, bench_structure_tensor, bench_pyramids);
criterion_main!(benches);
