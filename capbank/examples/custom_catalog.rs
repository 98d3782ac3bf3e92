//! Example: using the catalog, enumerator and ranking directly (without OptimizationService).
//! Run with: cargo run --example custom_catalog [path/to/catalog.json]

use capbank::catalog::load_catalog;
use capbank::network::{EquivalentCalculator, NetworkEnumerator, PoolLimits};
use capbank::{CapBankError, CatalogStore, ConstraintValidator, OptimizeRequest, RankingEngine};
use std::path::Path;

fn main() -> Result<(), CapBankError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/small_catalog.json".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example custom_catalog [path/to/catalog.json]");
        std::process::exit(1);
    }

    let catalog = CatalogStore::new(load_catalog(Some(path))?)?;
    let request = OptimizeRequest {
        target_cap: 1e-6,
        tolerance: 0.1,
        dc_bias: 0.0,
        max_count: 4,
        min_rated_volt: 25.0,
        min_temp: 85.0,
        conn_type: 0,
        packages: catalog.packages().to_vec(),
        max_esr: None,
    };

    let constraint = ConstraintValidator::validate(&request, &catalog)?;
    let enumerator = NetworkEnumerator::new(&catalog, &constraint, &PoolLimits::default());
    let candidates = enumerator
        .map(|topology| EquivalentCalculator::compute(&topology, &constraint))
        .collect::<Result<Vec<_>, _>>()?;
    let evaluated = candidates.len();
    let ranked = RankingEngine::rank(candidates, &constraint, 5);

    println!("{} parts in {}; {} networks evaluated", catalog.len(), path.display(), evaluated);
    for c in &ranked {
        println!("  [{}] {:.3} mm³  {}  ({})", c.shape_tag, c.volume_mm3, c.label, c.bom);
    }
    Ok(())
}
