//! Move a zone through a shared layer and watch the pipeline rebuild lazily.
//!
//! Usage:
//!   cargo run -p polyzone --example moving_zone
//!   cargo run -p polyzone --example moving_zone -- 25
//!
//! Prints, per step, how many query points fall inside and how often each stage
//! rebuilt. Only steps that move the frame or the layer trigger rebuilds.

use nalgebra::Vector2;
use polyzone::prelude::*;

fn main() {
    let steps: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);

    let layer = Layer::shared(Trs2::identity());
    let ring = draw_star_polygon(RadialCfg::default(), ReplayToken { seed: 2025, index: 0 });
    let poly = Polygon::new(ring).with_layer(&layer);
    let mut acc = match Accelerator::from_polygon(poly, 0.02, AccelCfg::default()) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("moving_zone: {e}");
            return;
        }
    };

    let area = Aabb2::from_min_max(Vector2::new(-3.0, -3.0), Vector2::new(3.0, 3.0));
    let queries = PointSampler::new(7).sample_many(&area, 2000);

    for step in 0..steps {
        match step % 3 {
            0 => acc.polygon_mut().frame_mut().translate(Vector2::new(0.1, 0.0)),
            1 => {
                let mut trs = layer.placement();
                trs.scale *= 1.05;
                layer.set_placement(trs);
            }
            _ => {}
        }
        let inside = queries.iter().filter(|&&p| acc.sample(p).is_inside()).count();
        let stats = acc.stats();
        println!(
            "step {step}: inside={inside} cells(in/out/unknown)={}/{}/{} rebuilds(poly/fringe/grid)={}/{}/{}",
            stats.inside,
            stats.outside,
            stats.unknown,
            acc.polygon().rebuilds(),
            acc.fringe().rebuilds(),
            acc.rebuilds()
        );
    }
}
