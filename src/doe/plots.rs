//! Plot-ready projections: Pareto of effects, main-effect and interaction
//! plots, residual plots.

use super::prepare::PreparedData;
use super::stats::{mean, sample_std};
use super::types::{
    Effects, InteractionCombination, InteractionData, InteractionPoint, InteractionSeries, Pareto,
    PlotFactor, PlotsData, ResidualAnalysis,
};

/// Rank main effects and interactions by |effect| with cumulative percent.
///
/// Ties keep main effects before interactions, each in factor order.
#[must_use]
pub fn pareto(effects: &Effects) -> Pareto {
    let mut entries: Vec<(String, f64, bool)> = effects
        .main_effects
        .iter()
        .map(|e| (e.symbol.clone(), e.effect.abs(), false))
        .chain(
            effects
                .interactions
                .iter()
                .map(|e| (e.key.clone(), e.effect.abs(), true)),
        )
        .collect();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));

    let total: f64 = entries.iter().map(|e| e.1).sum();
    let mut running = 0.0;
    let cumulative = entries
        .iter()
        .map(|e| {
            running += e.1;
            if total > 0.0 { running / total * 100.0 } else { 0.0 }
        })
        .collect();

    Pareto {
        labels: entries.iter().map(|e| e.0.clone()).collect(),
        values: entries.iter().map(|e| e.1).collect(),
        is_interaction: entries.iter().map(|e| e.2).collect(),
        cumulative,
    }
}

/// Assemble the plots section from effects and residuals.
#[must_use]
pub fn plots_data(effects: &Effects, residuals: &ResidualAnalysis) -> PlotsData {
    PlotsData {
        pareto: pareto(effects),
        main_effects: effects
            .main_effects
            .iter()
            .map(|e| (e.symbol.clone(), e.levels.clone(), e.means.clone()))
            .collect(),
        interactions: effects.interactions.clone(),
        residuals: residuals.residuals.clone(),
        fitted: residuals.fitted_values.clone(),
        standardized: residuals.standardized_residuals.clone(),
    }
}

fn plot_factor(data: &PreparedData, f: usize) -> PlotFactor {
    let factor = &data.factors[f];
    PlotFactor {
        id: factor.id,
        name: factor.name.clone(),
        symbol: factor.symbol.clone(),
        levels: data.design.levels(f),
    }
}

/// Interaction plots for every ordered pair of distinct factors.
#[must_use]
pub fn interaction_data(data: &PreparedData, response: &[Option<f64>]) -> InteractionData {
    let k = data.factors.len();
    let mut combinations = Vec::with_capacity(k * k.saturating_sub(1));

    for x in 0..k {
        for line in (0..k).filter(|&l| l != x) {
            let factor_x = plot_factor(data, x);
            let factor_lines = plot_factor(data, line);

            let series = factor_lines
                .levels
                .iter()
                .map(|line_level| {
                    let points = factor_x
                        .levels
                        .iter()
                        .map(|x_level| {
                            let raw_values: Vec<f64> = response
                                .iter()
                                .enumerate()
                                .filter(|(run, _)| {
                                    data.design.get(*run, x) == Some(x_level)
                                        && data.design.get(*run, line) == Some(line_level)
                                })
                                .filter_map(|(_, y)| *y)
                                .collect();
                            let (y, std) = match raw_values.len() {
                                0 => (None, None),
                                1 => (Some(raw_values[0]), Some(0.0)),
                                _ => (Some(mean(&raw_values)), Some(sample_std(&raw_values))),
                            };
                            InteractionPoint {
                                x: x_level.clone(),
                                y,
                                std,
                                n: raw_values.len(),
                                raw_values,
                            }
                        })
                        .collect();
                    InteractionSeries {
                        name: format!("{} = {}", factor_lines.name, line_level),
                        level: line_level.clone(),
                        points,
                    }
                })
                .collect();

            combinations.push(InteractionCombination {
                factor_x,
                factor_lines,
                series,
            });
        }
    }

    InteractionData {
        combinations,
        default_x: data.factors.first().map(|f| f.symbol.clone()),
        default_lines: data.factors.get(1).map(|f| f.symbol.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doe::prepare::prepare;
    use crate::doe::types::{InteractionEffect, MainEffect};
    use crate::experiment::{Experiment, Factor, Level, ResponseVariable, Run};

    fn main(symbol: &str, effect: f64) -> MainEffect {
        MainEffect {
            factor: symbol.to_lowercase(),
            symbol: symbol.to_string(),
            effect,
            levels: Vec::new(),
            means: Vec::new(),
        }
    }

    fn interaction(key: &str, effect: f64) -> InteractionEffect {
        InteractionEffect {
            key: key.to_string(),
            factors: [String::new(), String::new()],
            effect,
            cell_means: Vec::new(),
        }
    }

    #[test]
    fn test_pareto_order_and_cumulative() {
        let effects = Effects {
            main_effects: vec![main("A", -2.0), main("B", 5.0)],
            interactions: vec![interaction("A:B", 3.0)],
        };
        let p = pareto(&effects);
        assert_eq!(p.labels, vec!["B", "A:B", "A"]);
        assert_eq!(p.values, vec![5.0, 3.0, 2.0]);
        assert_eq!(p.is_interaction, vec![false, true, false]);
        assert_eq!(p.cumulative, vec![50.0, 80.0, 100.0]);
        assert!(p.cumulative.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_pareto_zero_mass() {
        let effects = Effects {
            main_effects: vec![main("A", 0.0), main("B", 0.0)],
            interactions: Vec::new(),
        };
        assert_eq!(pareto(&effects).cumulative, vec![0.0, 0.0]);
    }

    #[test]
    fn test_interaction_plot_points() {
        let mut exp = Experiment::new(1, "Plots");
        exp.factors = vec![
            Factor::quantitative(1, "Speed", "S", &[1.0, 2.0]),
            Factor::categorical(2, "Tool", "T", &["x", "y"]),
        ];
        exp.responses = vec![ResponseVariable::new(1, "Y", "")];
        let rows = [(1.0, "x", 10.0), (2.0, "x", 20.0), (1.0, "y", 30.0), (1.0, "y", 34.0)];
        for (i, &(s, t, y)) in rows.iter().enumerate() {
            let order = i64::try_from(i).unwrap() + 1;
            exp.runs.push(
                Run::new(order, order)
                    .with_factor(1, s)
                    .with_factor(2, t)
                    .with_response(1, y),
            );
        }
        let data = prepare(&exp).unwrap();
        let y = data.response_values("Y").unwrap();
        let plots = interaction_data(&data, &y);

        assert_eq!(plots.combinations.len(), 2);
        assert_eq!(plots.default_x.as_deref(), Some("S"));
        assert_eq!(plots.default_lines.as_deref(), Some("T"));

        let first = &plots.combinations[0];
        assert_eq!(first.factor_x.symbol, "S");
        assert_eq!(first.factor_lines.levels, vec![Level::from("x"), Level::from("y")]);
        let tool_y = &first.series[1];
        assert_eq!(tool_y.name, "Tool = y");

        let low = &tool_y.points[0];
        assert_eq!(low.y, Some(32.0));
        assert_eq!(low.n, 2);
        assert!((low.std.unwrap() - 8.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(low.raw_values, vec![30.0, 34.0]);

        // Speed = 2 with Tool = y was never run
        let empty = &tool_y.points[1];
        assert_eq!((empty.y, empty.std, empty.n), (None, None, 0));
        assert!(empty.raw_values.is_empty());

        let single = &first.series[0].points[1];
        assert_eq!((single.y, single.std), (Some(20.0), Some(0.0)));

        let second = &plots.combinations[1];
        assert_eq!(second.factor_x.symbol, "T");
        assert_eq!(second.series[0].name, "Speed = 1.0");
    }
}
