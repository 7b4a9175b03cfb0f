//! Glyph atlas packing benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ramses_text::{FontInstanceId, GlyphId, GlyphKey, GlyphMetrics, GlyphTextureAtlas, QuadSize};

fn glyph(id: u32, size: u32) -> GlyphMetrics {
    GlyphMetrics {
        key: GlyphKey::new(GlyphId(id), FontInstanceId(0)),
        width: size,
        height: size + id % 5,
        pos_x: 0,
        pos_y: 0,
        advance: size as i32 + 1,
    }
}

fn registered_atlas(glyphs: &[GlyphMetrics]) -> GlyphTextureAtlas {
    let mut atlas = GlyphTextureAtlas::new(QuadSize::new(1024, 1024));
    for g in glyphs {
        atlas.register_glyph(
            g.key,
            QuadSize::new(g.width, g.height),
            vec![128; (g.width * g.height) as usize],
        );
    }
    atlas
}

fn bench_map_unmap(c: &mut Criterion) {
    let mut group = c.benchmark_group("atlas_map_unmap");
    for count in [16u32, 128, 512] {
        let glyphs: Vec<GlyphMetrics> = (0..count).map(|i| glyph(i, 12)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &glyphs, |b, glyphs| {
            let mut atlas = registered_atlas(glyphs);
            b.iter(|| {
                let geometry = atlas
                    .map_glyphs_and_create_geometry(black_box(glyphs))
                    .unwrap();
                atlas.unmap_glyphs_from_page(glyphs, geometry.atlas_page);
            });
        });
    }
    group.finish();
}

fn bench_remap_cached(c: &mut Criterion) {
    let glyphs: Vec<GlyphMetrics> = (0..64).map(|i| glyph(i, 16)).collect();
    let mut atlas = registered_atlas(&glyphs);
    // keep one reference so later calls only build geometry
    let pinned = atlas.map_glyphs_and_create_geometry(&glyphs).unwrap();

    c.bench_function("atlas_remap_cached", |b| {
        b.iter(|| {
            let geometry = atlas
                .map_glyphs_and_create_geometry(black_box(&glyphs))
                .unwrap();
            atlas.unmap_glyphs_from_page(&glyphs, geometry.atlas_page);
        });
    });

    atlas.unmap_glyphs_from_page(&glyphs, pinned.atlas_page);
}

criterion_group!(benches, bench_map_unmap, bench_remap_cached);
criterion_main!(benches);
