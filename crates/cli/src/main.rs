use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use polyzone::prelude::*;
use tracing::Level;
use tracing_subscriber::fmt::SubscriberBuilder;

mod scene;

use scene::ZoneDesc;

#[derive(Parser)]
#[command(name = "cli")]
#[command(about = "Point-location queries against polygonal zones")]
struct Cmd {
    /// Log every rebuild (DEBUG level)
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Locate one point: exact side, accelerated sample, nearest boundary point
    Query {
        #[arg(long)]
        zone: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
    },
    /// Compare accelerated samples against the exact test on random points
    Agree {
        #[arg(long)]
        zone: PathBuf,
        #[arg(long, default_value_t = 10_000)]
        points: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Print the cell classification map, top row first
    Grid {
        #[arg(long)]
        zone: PathBuf,
    },
    /// Print a random star-shaped zone description
    Star {
        #[arg(long, default_value_t = 12)]
        vertices: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Print the crate version
    Report,
}

fn main() -> Result<()> {
    let cmd = Cmd::parse();
    let level = if cmd.verbose { Level::DEBUG } else { Level::INFO };
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    match cmd.action {
        Action::Query { zone, x, y } => query(zone, x, y),
        Action::Agree { zone, points, seed } => agree(zone, points, seed),
        Action::Grid { zone } => grid(zone),
        Action::Star { vertices, seed } => star(vertices, seed),
        Action::Report => report(),
    }
}

fn side_str(s: Side) -> &'static str {
    match s {
        Side::Inside => "inside",
        Side::Outside => "outside",
    }
}

fn query(zone: PathBuf, x: f64, y: f64) -> Result<()> {
    tracing::info!(zone = %zone.display(), x, y, "query");
    let mut z = ZoneDesc::load(&zone)?.build()?;
    let p = Vec2::new(x, y);
    let side = z.accel.polygon_mut().side(p);
    let sample = z.accel.sample(p);
    let closest = z.accel.closest_point(p).map(|c| [c.x, c.y]);
    let vertex = z.accel.polygon_mut().closest_vertex_index(p);
    let obj = serde_json::json!({
        "point": [x, y],
        "side": side_str(side),
        "sample": side_str(sample),
        "cell": format!("{:?}", z.accel.classify(p)),
        "closest_point": closest,
        "closest_vertex": vertex,
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}

fn agree(zone: PathBuf, points: usize, seed: u64) -> Result<()> {
    tracing::info!(zone = %zone.display(), points, seed, "agree");
    let mut z = ZoneDesc::load(&zone)?.build()?;
    let area = z.accel.grid().area();
    let pad = 0.25 * area.size().x.max(area.size().y);
    let pts = PointSampler::new(seed).sample_many(&area.expanded(pad), points);
    let mut mismatches = Vec::new();
    let mut inside = 0usize;
    for p in pts {
        let exact = z.accel.polygon_mut().side(p);
        if z.accel.sample(p) != exact {
            mismatches.push([p.x, p.y]);
        }
        inside += usize::from(exact.is_inside());
    }
    let stats = z.accel.stats();
    let obj = serde_json::json!({
        "points": points,
        "inside": inside,
        "mismatches": mismatches.len(),
        "first_mismatches": mismatches.iter().take(5).collect::<Vec<_>>(),
        "cells": { "inside": stats.inside, "outside": stats.outside, "unknown": stats.unknown },
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    if !mismatches.is_empty() {
        bail!("{} of {points} samples disagree with the exact test", mismatches.len());
    }
    Ok(())
}

fn grid(zone: PathBuf) -> Result<()> {
    tracing::info!(zone = %zone.display(), "grid");
    let mut z = ZoneDesc::load(&zone)?.build()?;
    print!("{}", render_grid(z.accel.grid()));
    Ok(())
}

fn render_grid(g: &UniformGrid<CellClass>) -> String {
    let n = g.subdivision();
    let mut out = String::with_capacity(n * (n + 1));
    for y in (0..n).rev() {
        for x in 0..n {
            out.push(match g.get(x, y) {
                Some(CellClass::Inside) => '#',
                Some(CellClass::Outside) => '.',
                Some(CellClass::Unknown) | None => '?',
            });
        }
        out.push('\n');
    }
    out
}

fn star(vertices: usize, seed: u64) -> Result<()> {
    tracing::info!(vertices, seed, "star");
    let cfg = RadialCfg {
        vertex_count: VertexCount::Fixed(vertices),
        ..RadialCfg::default()
    };
    let ring = draw_star_polygon(cfg, ReplayToken { seed, index: 0 });
    println!("{}", serde_json::to_string_pretty(&ZoneDesc::from_vertices(&ring))?);
    Ok(())
}

fn report() -> Result<()> {
    let obj = serde_json::json!({
        "crate": "polyzone",
        "version": polyzone::VERSION,
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}
