//! Fret a 7-string fanned neck and print the fret table.
//!
//! Usage: `cargo run --example fanned --features tracing [scale.scl]`

use fretru::{InstrumentLayout, Scale};

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::DEBUG.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let scale = match std::env::args().nth(1) {
        Some(path) => {
            let source = std::fs::read_to_string(&path)
                .map_err(|e| miette::miette!("failed to read {path}: {e}"))?;
            fretru::scala_scale(&path, &source)?
        }
        None => Scale::twelve_tet(),
    };

    let fretboard = InstrumentLayout::default()
        .with_strings(7)
        .with_nut_width(1.75)
        .with_bridge_width(2.5)
        .with_fanned(25.5, 27.0, 0.4)
        .with_fret_count(24)
        .with_scale(scale)
        .fretboard()?;

    let units = fretboard.instrument.units;
    println!("{}", fretboard.scale().title);
    println!("{:>4}  {:>12}  {:>12}  {:>9}", "fret", "first", "last", "angle");
    let outer = fretboard.frets.len() - 1;
    for (j, (first, last)) in fretboard.frets[0].iter().zip(&fretboard.frets[outer]).enumerate() {
        println!(
            "{j:>4}  {:>9.4} {units}  {:>9.4} {units}  {:>9.3}",
            first.nut_dist, last.nut_dist, first.angle
        );
    }

    let extents = fretboard.extents(true);
    println!(
        "extents: {:.4} x {:.4} {units}",
        extents.width, extents.height
    );
    Ok(())
}
