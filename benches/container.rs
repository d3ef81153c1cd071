//! Benchmarks for container export and import.
//!
//! Run with: cargo bench --bench container

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use scenedoc::{
    import_from_bytes, to_bytes, CompressionMethod, Document, ImageId, ImageLoadOptions,
    PersistenceConfig, Result, VolumeImage,
};
use std::hint::black_box;
use std::sync::Arc;

struct BenchVolume {
    id: ImageId,
    data: Vec<u8>,
}

impl VolumeImage for BenchVolume {
    fn id(&self) -> ImageId {
        self.id
    }
    fn colormap(&self) -> String {
        "gray".to_string()
    }
    fn opacity(&self) -> f64 {
        1.0
    }
    fn cal_min(&self) -> f64 {
        0.0
    }
    fn cal_max(&self) -> f64 {
        255.0
    }
    fn voxel_count(&self) -> usize {
        self.data.len()
    }
    fn encode_raw_bytes(&self, overlay: Option<&[u8]>) -> Result<Vec<u8>> {
        Ok(overlay.unwrap_or(&self.data).to_vec())
    }
}

/// Document with two cubic volumes of side `dim` and a drawing
fn build_document(dim: usize) -> Document {
    let voxels = dim * dim * dim;
    let mut doc = Document::new();
    for name in ["t1.nii.gz", "overlay.nii"] {
        let volume = BenchVolume {
            id: ImageId::new(),
            data: (0..voxels).map(|i| (i % 251) as u8).collect(),
        };
        doc.add_image(Arc::new(volume), ImageLoadOptions::from_url(name));
    }
    doc.set_drawing(vec![1; voxels])
        .expect("drawing matches the base volume");
    doc
}

fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export");

    for dim in [32, 64] {
        let doc = build_document(dim);
        for method in [CompressionMethod::None, CompressionMethod::Gzip, CompressionMethod::Zstd] {
            let config = PersistenceConfig::default().with_compression(method);
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", method), dim),
                &dim,
                |b, _| b.iter(|| black_box(to_bytes(black_box(&doc), &config))),
            );
        }
    }

    group.finish();
}

fn bench_import(c: &mut Criterion) {
    let mut group = c.benchmark_group("import");

    for dim in [32, 64] {
        let doc = build_document(dim);
        for method in [CompressionMethod::None, CompressionMethod::Zstd] {
            let config = PersistenceConfig::default().with_compression(method);
            let bytes = to_bytes(&doc, &config).expect("document encodes");
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", method), dim),
                &bytes,
                |b, bytes| b.iter(|| black_box(import_from_bytes(black_box(bytes)))),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_export, bench_import);
criterion_main!(benches);
