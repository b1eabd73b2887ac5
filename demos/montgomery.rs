//! Montgomery 2³ example for the doe-engine library.
//!
//! Generates the eight runs of a three-factor two-level design, fills in the
//! measured responses and prints the ANOVA table, the sign-table effects and
//! the residual diagnostics.
//!
//! Run with `RUST_LOG=debug cargo run --example montgomery` to see the
//! engine's logs.

use doe_engine::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("doe-engine - Montgomery 2^3 Example\n");

    // Listed slowest first so that M varies fastest in standard order
    let factors = vec![
        Factor::quantitative(3, "Pressure", "P", &[10.0, 20.0]).with_ordinal(3),
        Factor::quantitative(2, "Cutting depth", "C", &[1.0, 2.0]).with_ordinal(2),
        Factor::quantitative(1, "Machine speed", "M", &[100.0, 150.0]).with_ordinal(1),
    ];
    let mut exp = Experiment::new(1, "Surface roughness");
    exp.factors = factors.clone();
    exp.responses = vec![ResponseVariable::new(1, "Roughness", "um")];
    exp.runs = FullFactorialBuilder::new()
        .factors(&factors)
        .randomize(2024)
        .build()?;
    for (run, y) in exp.runs.iter_mut().zip([10.0, 20.0, 30.0, 40.0, 15.0, 25.0, 35.0, 45.0]) {
        run.response_values.insert(1, y);
    }

    let result = analyze(&exp, &AnalysisConfig::default())?;

    println!("ANOVA (Type II):");
    println!("  {:<36} {:>3} {:>10} {:>10}", "Source", "df", "SS", "MS");
    for row in &result.anova.rows {
        let ms = row.mean_sq.map_or_else(|| "-".to_string(), |m| format!("{m:.3}"));
        println!("  {:<36} {:>3} {:>10.3} {:>10}", row.source, row.df, row.sum_sq, ms);
    }
    println!("  R² = {:.4}", result.anova.r_squared);
    println!();

    println!("Sign table effects:");
    let table = &result.design_matrix;
    for (header, (effect, contribution)) in table
        .headers
        .iter()
        .zip(table.effects.iter().zip(&table.contributions))
    {
        if let (Some(e), Some(c)) = (effect, contribution) {
            println!("  {:<4} effect {:>7.2}   contribution {:>6.2}%", header.symbol, e, c);
        }
    }
    println!();

    println!("Regression: {}", result.regression.equation);
    println!(
        "Durbin-Watson: {:.3} ({})",
        result.residuals.autocorrelation_test.statistic,
        result.residuals.autocorrelation_test.interpretation
    );
    Ok(())
}
