use nalgebra::{Matrix4, Vector2};
use std::time::Instant;
use vectile::constants::TILE_EXTENT;
use vectile::prelude::*;

/// Fixed camera looking straight down at a point in projection space
struct OrthoView {
    origin: Vector2<f64>,
    zoom: f64,
}

impl View for OrthoView {
    fn view_projection_matrix(&self) -> Matrix4<f32> {
        let half = (MercatorProjection::tile_size_meters(0) / 2f64.powf(self.zoom)) as f32;
        Matrix4::new_scaling(1.0 / half)
    }
    fn origin(&self) -> Vector2<f64> {
        self.origin
    }
    fn screen_size(&self) -> Vector2<f32> {
        Vector2::new(1280.0, 800.0)
    }
    fn zoom(&self) -> f64 {
        self.zoom
    }
}

/// Counts what would be sent to the GPU
#[derive(Default)]
struct Stats {
    draws: usize,
    triangles: usize,
}

impl RenderContext for Stats {
    fn draw_mesh(&mut self, _style: &str, mesh: &Mesh, _mvp: &Matrix4<f32>) {
        self.draws += 1;
        self.triangles += mesh.triangle_count();
    }
}

/// A block of buildings around a courtyard, plus a road through the middle
fn synthetic_tile(id: TileId) -> TileData {
    let mut buildings = Vec::new();
    for row in 0..4 {
        for col in 0..4 {
            let x = -0.4 + col as f32 * 0.2;
            let y = -0.4 + row as f32 * 0.2;
            let outer = vec![[x, y], [x + 0.15, y], [x + 0.15, y + 0.15], [x, y + 0.15]];
            let courtyard = vec![
                [x + 0.05, y + 0.05],
                [x + 0.05, y + 0.1],
                [x + 0.1, y + 0.1],
                [x + 0.1, y + 0.05],
            ];
            let height = 10.0 + ((id.x + id.y) as f64 + (row * 4 + col) as f64) * 3.0;
            buildings.push(
                Feature::new(FeatureGeometry::Polygon(vec![outer, courtyard]))
                    .with_property("height", height),
            );
        }
    }

    TileData::new(vec![
        Layer::new("buildings", buildings),
        Layer::new(
            "roads",
            vec![Feature::new(FeatureGeometry::Line(vec![
                [-TILE_EXTENT, -0.45],
                [TILE_EXTENT, -0.45],
            ]))],
        ),
        Layer::new("pois", vec![Feature::new(FeatureGeometry::Point([0.0, 0.0]))]),
    ])
}

/// Tiles at `zoom` around the tile containing `center`
fn visible_tiles(center: TileId, radius: i64) -> Vec<TileId> {
    let mut ids = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let x = center.x as i64 + dx;
            let y = center.y as i64 + dy;
            if x >= 0 && y >= 0 {
                let id = TileId::new(center.zoom, x as u32, y as u32);
                if id.is_valid() {
                    ids.push(id);
                }
            }
        }
    }
    ids
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    vectile::init_logger();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => EngineProfile::Balanced.resolve(),
    };
    log::info!("engine config: {}", config.to_json()?);

    let projection: Arc<dyn MapProjection> = Arc::new(MercatorProjection::new());
    let styles: Vec<Arc<dyn Style>> = vec![
        Arc::new(PolygonStyle::new("buildings", "buildings").extruded(12.0)),
        Arc::new(PolylineStyle::new("roads", "roads", 12.0)),
        Arc::new(PointStyle::new("pois", "pois", 20.0)),
    ];

    // Walk from zoom 15 to 16 over one area so parents stand in for children.
    let start = TileId::new(15, 16_384, 10_900);
    let zoomed = start.children().map(|c| c[0]).unwrap_or(start);
    let frames = [(start, 15.0), (zoomed, 16.0)];

    let mut source = MemoryTileSource::new();
    for (center, _) in frames {
        for id in visible_tiles(center, 2) {
            source.insert(id, synthetic_tile(id));
        }
    }
    log::info!("synthetic source holds {} tiles", source.len());

    let worker = TileWorker::new(Arc::new(source), styles, projection.clone(), &config)?;
    let mut tiles = TileSet::new(projection.clone(), config);

    for (center, zoom) in frames {
        let view = OrthoView {
            origin: projection.tile_center(center),
            zoom,
        };
        let visible = visible_tiles(center, 2);
        let started = Instant::now();

        for handle in tiles.update(&visible, &view) {
            worker.enqueue(handle)?;
        }

        // Draw once with whatever proxies are available, then wait for the rest.
        let mut stats = Stats::default();
        tiles.draw(&["buildings", "roads", "pois"], &view, &mut stats);
        log::info!(
            "zoom {}: first frame {} draws from {} tiles",
            zoom,
            stats.draws,
            tiles.render_list().len()
        );

        let mut attached = 0;
        while attached < visible.len() {
            match worker.wait(Duration::from_secs(5)) {
                Some(result) => {
                    if tiles.attach(result) {
                        attached += 1;
                    }
                }
                None => {
                    log::warn!("timed out with {} tiles pending", worker.pending());
                    break;
                }
            }
        }

        tiles.update_drawables(0.016, &view);
        let mut stats = Stats::default();
        tiles.draw(&["buildings", "roads", "pois"], &view, &mut stats);
        log::info!(
            "zoom {}: {} tiles ready in {:?}, {} draws, {} triangles, {} tracked, {} retained",
            zoom,
            attached,
            started.elapsed(),
            stats.draws,
            stats.triangles,
            tiles.len(),
            tiles.retained()
        );
    }

    Ok(())
}
