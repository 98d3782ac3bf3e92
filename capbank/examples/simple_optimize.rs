//! Simple optimization example: find networks for a target capacitance.
//! Run with: cargo run --example simple_optimize [target_farads] [max_count]

use capbank::prelude::*;
use std::sync::Arc;

fn main() -> Result<(), CapBankError> {
    let mut args = std::env::args().skip(1);
    let target: f64 = args.next().and_then(|a| a.parse().ok()).unwrap_or(4.7e-6);
    let max_count: i64 = args.next().and_then(|a| a.parse().ok()).unwrap_or(4);

    let catalog = Arc::new(CatalogStore::builtin()?);
    let service = OptimizationService::new(catalog, ServiceOptions::default())?;

    let request = OptimizeRequest {
        target_cap: target,
        tolerance: 0.1,
        dc_bias: 0.0,
        max_count,
        min_rated_volt: 16.0,
        min_temp: 85.0,
        conn_type: ConnectionType::Any.code(),
        packages: service.packages().to_vec(),
        max_esr: None,
    };

    let result = service.optimize(&request)?;

    println!("Networks for {:.3e} F (±10%, up to {} parts):", target, max_count);
    println!("Evaluated {} networks in {:?}", result.stats.evaluated, result.stats.elapsed);
    println!();

    if result.is_empty() {
        println!("No feasible network.");
        std::process::exit(1);
    }

    for (rank, c) in result.candidates.iter().take(10).enumerate() {
        println!(
            "{:>2}. {:<4} {:>8.3} mm³  {:.3e} F  {:>5.1} V  {}",
            rank + 1,
            c.shape_tag,
            c.volume_mm3,
            c.capacitance,
            c.voltage_rating,
            c.label
        );
    }
    Ok(())
}
