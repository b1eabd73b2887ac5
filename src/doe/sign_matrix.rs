//! Coded sign table (design matrix) with contrast totals.
//!
//! Lays out every included run against the intercept, each factor, every
//! interaction of order 2 up to k, and the response. For a two-level
//! factorial (all factors quantitative with exactly two observed values) the
//! coded row maps each factor's low value to −1 and its high value to +1.
//!
//! # Algorithm
//!
//! ```text
//! total(c)        = Σ coded(c) · y        (response column: Σ y)
//! mean(c)         = total(c) / n
//! effect(c)       = total(c) / (n / 2)    (Yates, factor/interaction columns)
//! q(c)            = effect(c) / 2
//! contribution(c) = n·q(c)² / Σ n·q² · 100
//! ```
//!
//! Unlike the ANOVA and regression models, interactions here go all the way to
//! order k.

use tracing::debug;

use super::prepare::PreparedData;
use super::types::{ColumnKind, SignCell, SignHeader, SignRow, SignTable};
use crate::experiment::{FactorKind, Level};

/// All `r`-element subsets of `0..n`, in lexicographic order.
#[must_use]
pub fn combinations(n: usize, r: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if r == 0 || r > n {
        return out;
    }
    let mut idx: Vec<usize> = (0..r).collect();
    loop {
        out.push(idx.clone());
        // Rightmost position that can still move
        let Some(i) = (0..r).rev().find(|&i| idx[i] != i + n - r) else {
            return out;
        };
        idx[i] += 1;
        for j in (i + 1)..r {
            idx[j] = idx[j - 1] + 1;
        }
    }
}

/// `(low, high)` per factor when every factor is quantitative with exactly
/// two observed values; `None` otherwise.
fn two_level_mapping(data: &PreparedData) -> Option<Vec<(f64, f64)>> {
    data.factors
        .iter()
        .enumerate()
        .map(|(f, factor)| {
            if !factor.is_quantitative() {
                return None;
            }
            let values: Vec<f64> = data.design.levels(f).iter().filter_map(Level::as_f64).collect();
            match values.as_slice() {
                [low, high] => Some((*low, *high)),
                _ => None,
            }
        })
        .collect()
}

fn build_headers(
    data: &PreparedData,
    response_name: &str,
    mapping: Option<&[(f64, f64)]>,
) -> Vec<SignHeader> {
    let blank = |symbol: &str, name: &str, kind| SignHeader {
        symbol: symbol.to_string(),
        name: name.to_string(),
        kind,
        factor_id: None,
        data_type: None,
        level_mapping: None,
        factors: Vec::new(),
        order: None,
    };

    let mut headers = vec![blank("I", "Intercept", ColumnKind::Intercept)];
    for (f, factor) in data.factors.iter().enumerate() {
        headers.push(SignHeader {
            factor_id: Some(factor.id),
            data_type: Some(factor.kind),
            level_mapping: mapping.map(|m| m[f]),
            ..blank(&factor.symbol, &factor.name, ColumnKind::Factor)
        });
    }

    let k = data.factors.len();
    for order in 2..=k {
        for combo in combinations(k, order) {
            let symbols: Vec<String> = combo
                .iter()
                .map(|&i| data.factors[i].symbol.clone())
                .collect();
            let names: Vec<&str> = combo.iter().map(|&i| data.factors[i].name.as_str()).collect();
            headers.push(SignHeader {
                factors: symbols.clone(),
                order: Some(order),
                ..blank(&symbols.concat(), &names.join(" × "), ColumnKind::Interaction)
            });
        }
    }

    headers.push(blank("Y", response_name, ColumnKind::Response));
    headers
}

fn product(cells: &[&SignCell]) -> SignCell {
    cells
        .iter()
        .map(|c| c.as_f64())
        .product::<Option<f64>>()
        .map_or(SignCell::Null, SignCell::Number)
}

/// Build the sign table for one response.
#[must_use]
pub fn build_sign_table(
    data: &PreparedData,
    response: &[Option<f64>],
    response_name: &str,
) -> SignTable {
    let mapping = two_level_mapping(data);
    let is_two_level_factorial = mapping.is_some();
    let k = data.factors.len();
    let interactions: Vec<Vec<usize>> = (2..=k).flat_map(|r| combinations(k, r)).collect();
    let headers = build_headers(data, response_name, mapping.as_deref());

    let mut rows = Vec::with_capacity(data.num_runs());
    for (r, run) in data.runs.iter().enumerate() {
        let mut values = vec![SignCell::Number(1.0)];
        let mut values_coded = vec![SignCell::Number(1.0)];

        for (f, factor) in data.factors.iter().enumerate() {
            let (value, coded) = match (data.design.get(r, f), factor.kind) {
                (None, _) => (SignCell::Null, SignCell::Null),
                (Some(level), FactorKind::Categorical) => {
                    let label = SignCell::Text(level.to_string());
                    (label.clone(), label)
                }
                (Some(level), FactorKind::Quantitative) => match level.as_f64() {
                    Some(v) => {
                        let coded = match &mapping {
                            Some(m) if v == m[f].0 => -1.0,
                            Some(_) => 1.0,
                            None => v,
                        };
                        (SignCell::Number(v), SignCell::Number(coded))
                    }
                    None => (SignCell::Null, SignCell::Null),
                },
            };
            values.push(value);
            values_coded.push(coded);
        }

        for combo in &interactions {
            let members: Vec<&SignCell> = combo.iter().map(|&i| &values[1 + i]).collect();
            let coded_members: Vec<&SignCell> =
                combo.iter().map(|&i| &values_coded[1 + i]).collect();
            let value = product(&members);
            let coded = product(&coded_members);
            values.push(value);
            values_coded.push(coded);
        }

        let y = response.get(r).copied().flatten().map_or(SignCell::Null, SignCell::Number);
        values.push(y.clone());
        values_coded.push(y);

        rows.push(SignRow {
            run_order: run.run_order,
            standard_order: run.standard_order,
            is_center_point: run.is_center_point,
            values,
            values_coded,
        });
    }

    let n_runs = rows.len();
    let n = n_runs as f64;
    let totals: Vec<f64> = headers
        .iter()
        .enumerate()
        .map(|(c, header)| {
            rows.iter()
                .filter_map(|row| {
                    let y = row.values.last().and_then(SignCell::as_f64)?;
                    match header.kind {
                        ColumnKind::Response => Some(y),
                        _ => row.values_coded[c].as_f64().map(|x| x * y),
                    }
                })
                .sum()
        })
        .collect();

    let means = totals
        .iter()
        .map(|t| (n_runs > 0).then(|| t / n))
        .collect();
    let effects: Vec<Option<f64>> = headers
        .iter()
        .zip(&totals)
        .map(|(h, t)| (h.kind.has_effect() && n_runs > 0).then(|| t / (n / 2.0)))
        .collect();

    let squares: Vec<Option<f64>> = effects
        .iter()
        .map(|&e| e.map(|e| n * (e / 2.0).powi(2)))
        .collect();
    let sst: f64 = squares.iter().flatten().sum();
    let contributions = squares
        .iter()
        .map(|&sq| sq.filter(|_| sst > 0.0).map(|sq| sq / sst * 100.0))
        .collect();

    debug!(
        columns = headers.len(),
        runs = n_runs,
        two_level = is_two_level_factorial,
        "built sign table"
    );

    SignTable {
        headers,
        rows,
        totals,
        means,
        effects,
        contributions,
        n_runs,
        is_two_level_factorial,
    }
}
