//! Per-stage dump of the system, enabled with `--trace`

use parallel_elim_core::{MatrixStore, Multipliers, StageObserver};

pub struct StageTrace;

impl StageObserver<f64> for StageTrace {
    fn multipliers_ready(&mut self, _store: &MatrixStore<f64>, multipliers: &Multipliers<f64>) {
        println!("\n Stage {} multipliers:", multipliers.stage());
        if multipliers.is_empty() {
            println!("  (no active rows)");
        }
        for (row, m) in multipliers.iter() {
            println!("  row {:>3}: {:>12.6}", row, m);
        }
    }

    fn stage_complete(&mut self, stage: usize, store: &MatrixStore<f64>) {
        println!("\n After stage {}:", stage);
        print!("{}", store);
    }
}
