use criterion::{criterion_group, criterion_main, Criterion, black_box};

use sward::grass::{
    deform::deform_vertex, BladeMesh, FieldLayout, FrameInputs, GrassConfig, InstanceLayout, ParameterBuffers,
};

use glam::Vec3;

fn layout(grid_size: u32) -> InstanceLayout {
    let field = FieldLayout {
        grid_size,
        ..Default::default()
    };
    InstanceLayout::generate(&field).expect("valid layout")
}

fn bench_param_pass_64(c: &mut Criterion) {
    let layout = layout(64);
    let cfg = GrassConfig::default().sanitized();
    let mut buffers = ParameterBuffers::new(layout.addressing());

    c.bench_function("param_pass_64x64", |b| {
        b.iter(|| buffers.recompute(black_box(&layout), &cfg, black_box(1.25)).expect("matching layout"));
    });
}

fn bench_param_pass_256(c: &mut Criterion) {
    let layout = layout(256);
    let cfg = GrassConfig::default().sanitized();
    let mut buffers = ParameterBuffers::new(layout.addressing());

    c.bench_function("param_pass_256x256", |b| {
        b.iter(|| buffers.recompute(black_box(&layout), &cfg, black_box(1.25)).expect("matching layout"));
    });
}

fn bench_deform_blade(c: &mut Criterion) {
    let layout = layout(8);
    let cfg = GrassConfig::default().sanitized();
    let buffers = ParameterBuffers::compute(&layout, &cfg, 0.5);
    let record = buffers.record(27);
    let base = layout.position(27);
    let mesh = BladeMesh::default();
    let frame = FrameInputs {
        time: 0.5,
        camera_position: Vec3::new(0.0, 1.7, 6.0),
    };

    c.bench_function("deform_blade_vertices", |b| {
        b.iter(|| {
            for vertex in &mesh.vertices {
                black_box(deform_vertex(*vertex, base, black_box(&record), &cfg, &frame));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_param_pass_64,
    bench_param_pass_256,
    bench_deform_blade,
);
criterion_main!(benches);
