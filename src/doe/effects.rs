//! Main effects and two-factor interaction effects.
//!
//! The main effect of a factor is the range of its level means; the effect
//! of a factor pair is the range of its cell means. Runs without a response
//! value are ignored per level or cell, so missing data never counts as zero.

use super::prepare::PreparedData;
use super::stats::mean;
use super::types::{Effects, InteractionEffect, MainEffect};
use crate::experiment::Level;

/// Responses observed where `factor` sits at `level`.
fn values_at(
    data: &PreparedData,
    response: &[Option<f64>],
    factor: usize,
    level: &Level,
) -> Vec<f64> {
    response
        .iter()
        .enumerate()
        .filter(|(run, _)| data.design.get(*run, factor) == Some(level))
        .filter_map(|(_, y)| *y)
        .collect()
}

/// Responses observed in the cell `(f1 = l1, f2 = l2)`.
fn values_in_cell(
    data: &PreparedData,
    response: &[Option<f64>],
    (f1, l1): (usize, &Level),
    (f2, l2): (usize, &Level),
) -> Vec<f64> {
    response
        .iter()
        .enumerate()
        .filter(|(run, _)| {
            data.design.get(*run, f1) == Some(l1) && data.design.get(*run, f2) == Some(l2)
        })
        .filter_map(|(_, y)| *y)
        .collect()
}

fn range(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let max = values.clone().fold(f64::NEG_INFINITY, f64::max);
    let min = values.fold(f64::INFINITY, f64::min);
    max - min
}

/// Main effect of one factor, `None` with fewer than two usable levels.
#[must_use]
pub fn main_effect(
    data: &PreparedData,
    response: &[Option<f64>],
    factor: usize,
) -> Option<MainEffect> {
    let levels = data.design.levels(factor);
    if levels.len() < 2 {
        return None;
    }

    let means: Vec<Option<f64>> = levels
        .iter()
        .map(|level| {
            let ys = values_at(data, response, factor, level);
            (!ys.is_empty()).then(|| mean(&ys))
        })
        .collect();

    let valid = means.iter().flatten().copied();
    if valid.clone().count() < 2 {
        return None;
    }

    let f = &data.factors[factor];
    Some(MainEffect {
        factor: f.name.clone(),
        symbol: f.symbol.clone(),
        effect: range(valid),
        levels,
        means,
    })
}

/// Interaction effect of factors `f1` and `f2`, `None` when no cell has data.
#[must_use]
pub fn interaction_effect(
    data: &PreparedData,
    response: &[Option<f64>],
    f1: usize,
    f2: usize,
) -> Option<InteractionEffect> {
    let s1 = &data.factors[f1].symbol;
    let s2 = &data.factors[f2].symbol;

    let mut cell_means = Vec::new();
    for l1 in &data.design.levels(f1) {
        for l2 in &data.design.levels(f2) {
            let ys = values_in_cell(data, response, (f1, l1), (f2, l2));
            if !ys.is_empty() {
                cell_means.push((format!("{s1}={l1},{s2}={l2}"), mean(&ys)));
            }
        }
    }
    if cell_means.is_empty() {
        return None;
    }

    Some(InteractionEffect {
        key: format!("{s1}:{s2}"),
        factors: [s1.clone(), s2.clone()],
        effect: range(cell_means.iter().map(|(_, m)| *m)),
        cell_means,
    })
}

/// Main effects of every factor and interactions of every unordered pair.
#[must_use]
pub fn calculate_effects(data: &PreparedData, response: &[Option<f64>]) -> Effects {
    let k = data.factors.len();
    let main_effects = (0..k)
        .filter_map(|f| main_effect(data, response, f))
        .collect();
    let interactions = (0..k)
        .flat_map(|i| ((i + 1)..k).map(move |j| (i, j)))
        .filter_map(|(i, j)| interaction_effect(data, response, i, j))
        .collect();
    Effects {
        main_effects,
        interactions,
    }
}
