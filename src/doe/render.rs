//! Rendering of typed analysis results into [`ResultValue`] trees.
//!
//! Key names are the wire contract of the analysis output.

use super::types::{
    AnovaRow, AnovaTable, Coefficient, Effects, FactorInfo, InteractionCombination,
    InteractionData, InteractionEffect, InteractionPoint, Metadata, PlotFactor, PlotsData,
    Regression, ResidualAnalysis, SignCell, SignHeader, SignRow, SignTable, Summary,
};
use crate::value::ResultValue;

/// Conversion of an analysis result into a [`ResultValue`].
pub trait ToValue {
    /// Render `self`.
    fn to_value(&self) -> ResultValue;
}

fn v(x: impl Into<ResultValue>) -> ResultValue {
    x.into()
}

fn levels(levels: &[crate::experiment::Level]) -> ResultValue {
    ResultValue::List(levels.iter().map(ResultValue::from).collect())
}

impl ToValue for FactorInfo {
    fn to_value(&self) -> ResultValue {
        ResultValue::map([
            ("id", v(self.id)),
            ("name", v(self.name.as_str())),
            ("symbol", v(self.symbol.as_str())),
            ("data_type", v(self.kind.as_str())),
        ])
    }
}

impl ToValue for Metadata {
    fn to_value(&self) -> ResultValue {
        ResultValue::map([
            ("experiment_id", v(self.experiment_id)),
            ("experiment_slug", v(self.experiment_slug.as_str())),
            ("experiment_title", v(self.experiment_title.as_str())),
            ("design_type", v(self.design_type.as_str())),
            ("response_variable", v(self.response_variable.as_str())),
            ("num_factors", v(self.num_factors)),
            ("num_runs", v(self.num_runs)),
            (
                "factors",
                ResultValue::List(self.factors.iter().map(ToValue::to_value).collect()),
            ),
        ])
    }
}

impl ToValue for Summary {
    fn to_value(&self) -> ResultValue {
        ResultValue::map([
            ("mean", v(self.mean)),
            ("std", v(self.std)),
            ("min", v(self.min)),
            ("max", v(self.max)),
            ("range", v(self.range)),
            ("cv", v(self.cv)),
        ])
    }
}

impl ToValue for AnovaRow {
    fn to_value(&self) -> ResultValue {
        ResultValue::map([
            ("source", v(self.source.as_str())),
            ("df", v(self.df)),
            ("sum_sq", v(self.sum_sq)),
            ("mean_sq", v(self.mean_sq)),
            ("f_value", v(self.f_value)),
            ("p_value", v(self.p_value)),
            ("is_significant", v(self.is_significant)),
        ])
    }
}

impl ToValue for AnovaTable {
    fn to_value(&self) -> ResultValue {
        ResultValue::map([
            (
                "table",
                ResultValue::List(self.rows.iter().map(ToValue::to_value).collect()),
            ),
            ("model_f_statistic", v(self.model_f_statistic)),
            ("model_p_value", v(self.model_p_value)),
            ("r_squared", v(self.r_squared)),
            ("r_squared_adj", v(self.r_squared_adj)),
        ])
    }
}

impl ToValue for Coefficient {
    fn to_value(&self) -> ResultValue {
        ResultValue::map([
            ("term", v(self.term.as_str())),
            ("coefficient", v(self.coefficient)),
            ("std_error", v(self.std_error)),
            ("t_value", v(self.t_value)),
            ("p_value", v(self.p_value)),
            ("ci_lower", v(self.ci_lower)),
            ("ci_upper", v(self.ci_upper)),
            ("is_significant", v(self.is_significant)),
        ])
    }
}

impl ToValue for Regression {
    fn to_value(&self) -> ResultValue {
        ResultValue::map([
            (
                "coefficients",
                ResultValue::List(self.coefficients.iter().map(ToValue::to_value).collect()),
            ),
            ("equation", v(self.equation.as_str())),
            ("r_squared", v(self.r_squared)),
            ("r_squared_adj", v(self.r_squared_adj)),
            ("rmse", v(self.rmse)),
            ("aic", v(self.aic)),
            ("bic", v(self.bic)),
        ])
    }
}

fn cell_means(effect: &InteractionEffect) -> ResultValue {
    ResultValue::map(
        effect
            .cell_means
            .iter()
            .map(|(label, m)| (label.clone(), v(*m))),
    )
}

fn pair(effect: &InteractionEffect) -> ResultValue {
    ResultValue::list(effect.factors.iter().map(String::as_str))
}

impl ToValue for Effects {
    fn to_value(&self) -> ResultValue {
        let main = self.main_effects.iter().map(|e| {
            (
                e.symbol.clone(),
                ResultValue::map([
                    ("factor", v(e.factor.as_str())),
                    ("symbol", v(e.symbol.as_str())),
                    ("effect", v(e.effect)),
                    ("levels", levels(&e.levels)),
                    ("means", v(e.means.clone())),
                ]),
            )
        });
        let interactions = self.interactions.iter().map(|e| {
            (
                e.key.clone(),
                ResultValue::map([
                    ("factors", pair(e)),
                    ("effect", v(e.effect)),
                    ("cell_means", cell_means(e)),
                ]),
            )
        });
        ResultValue::map([
            ("main_effects", ResultValue::map(main)),
            ("interactions", ResultValue::map(interactions)),
        ])
    }
}

impl ToValue for ResidualAnalysis {
    fn to_value(&self) -> ResultValue {
        let normality = match &self.normality_test {
            Some(t) => ResultValue::map([
                ("test", v("Shapiro-Wilk")),
                ("statistic", v(t.statistic)),
                ("p_value", v(t.p_value)),
                ("is_normal", v(t.is_normal)),
            ]),
            None => ResultValue::map([
                ("test", v("Shapiro-Wilk")),
                ("statistic", ResultValue::Null),
                ("p_value", ResultValue::Null),
                ("is_normal", ResultValue::Null),
            ]),
        };
        ResultValue::map([
            ("residuals", v(self.residuals.clone())),
            ("fitted_values", v(self.fitted_values.clone())),
            ("standardized_residuals", v(self.standardized_residuals.clone())),
            ("normality_test", normality),
            (
                "autocorrelation_test",
                ResultValue::map([
                    ("test", v("Durbin-Watson")),
                    ("statistic", v(self.autocorrelation_test.statistic)),
                    (
                        "interpretation",
                        v(self.autocorrelation_test.interpretation.as_str()),
                    ),
                ]),
            ),
            (
                "residual_stats",
                ResultValue::map([
                    ("mean", v(self.residual_stats.mean)),
                    ("std", v(self.residual_stats.std)),
                    ("min", v(self.residual_stats.min)),
                    ("max", v(self.residual_stats.max)),
                ]),
            ),
        ])
    }
}

impl ToValue for PlotsData {
    fn to_value(&self) -> ResultValue {
        let pareto = ResultValue::map([
            ("labels", ResultValue::list(self.pareto.labels.iter().map(String::as_str))),
            ("values", v(self.pareto.values.clone())),
            ("cumulative", v(self.pareto.cumulative.clone())),
            ("is_interaction", v(self.pareto.is_interaction.clone())),
        ]);
        let main_effects = self.main_effects.iter().map(|(symbol, lv, means)| {
            (
                symbol.clone(),
                ResultValue::map([("levels", levels(lv)), ("means", v(means.clone()))]),
            )
        });
        let interactions = self
            .interactions
            .iter()
            .map(|e| {
                ResultValue::map([
                    ("interaction", v(e.key.as_str())),
                    ("factors", pair(e)),
                    ("cell_means", cell_means(e)),
                ])
            })
            .collect();
        ResultValue::map([
            ("pareto", pareto),
            ("main_effects", ResultValue::map(main_effects)),
            ("interactions", ResultValue::List(interactions)),
            (
                "residuals",
                ResultValue::map([
                    ("residuals", v(self.residuals.clone())),
                    ("fitted", v(self.fitted.clone())),
                    ("standardized", v(self.standardized.clone())),
                ]),
            ),
        ])
    }
}

impl ToValue for PlotFactor {
    fn to_value(&self) -> ResultValue {
        ResultValue::map([
            ("id", v(self.id)),
            ("name", v(self.name.as_str())),
            ("symbol", v(self.symbol.as_str())),
            ("levels", levels(&self.levels)),
        ])
    }
}

impl ToValue for InteractionPoint {
    fn to_value(&self) -> ResultValue {
        ResultValue::map([
            ("x", v(&self.x)),
            ("y", v(self.y)),
            ("std", v(self.std)),
            ("n", v(self.n)),
            ("raw_values", v(self.raw_values.clone())),
        ])
    }
}

impl ToValue for InteractionCombination {
    fn to_value(&self) -> ResultValue {
        let series = self
            .series
            .iter()
            .map(|s| {
                ResultValue::map([
                    ("name", v(s.name.as_str())),
                    ("level", v(&s.level)),
                    (
                        "points",
                        ResultValue::List(s.points.iter().map(ToValue::to_value).collect()),
                    ),
                ])
            })
            .collect();
        ResultValue::map([
            ("factor_x", self.factor_x.to_value()),
            ("factor_lines", self.factor_lines.to_value()),
            ("series", ResultValue::List(series)),
        ])
    }
}

impl ToValue for InteractionData {
    fn to_value(&self) -> ResultValue {
        ResultValue::map([
            (
                "combinations",
                ResultValue::List(self.combinations.iter().map(ToValue::to_value).collect()),
            ),
            ("default_x", v(self.default_x.clone())),
            ("default_lines", v(self.default_lines.clone())),
        ])
    }
}

impl ToValue for SignCell {
    fn to_value(&self) -> ResultValue {
        match self {
            Self::Number(x) => ResultValue::Number(*x),
            Self::Text(s) => ResultValue::Text(s.clone()),
            Self::Null => ResultValue::Null,
        }
    }
}

impl ToValue for SignHeader {
    fn to_value(&self) -> ResultValue {
        let mut entries = vec![
            ("symbol", v(self.symbol.as_str())),
            ("name", v(self.name.as_str())),
            ("type", v(self.kind.as_str())),
        ];
        if let Some(id) = self.factor_id {
            entries.push(("factor_id", v(id)));
        }
        if let Some(kind) = self.data_type {
            entries.push(("data_type", v(kind.as_str())));
        }
        if let Some((low, high)) = self.level_mapping {
            entries.push((
                "level_mapping",
                ResultValue::map([("-1", v(low)), ("1", v(high))]),
            ));
        }
        if let Some(order) = self.order {
            entries.push(("factors", ResultValue::list(self.factors.iter().map(String::as_str))));
            entries.push(("order", v(order)));
        }
        ResultValue::map(entries)
    }
}

fn cells(row: &[SignCell]) -> ResultValue {
    ResultValue::List(row.iter().map(ToValue::to_value).collect())
}

impl ToValue for SignRow {
    fn to_value(&self) -> ResultValue {
        ResultValue::map([
            ("run_order", v(self.run_order)),
            ("standard_order", v(self.standard_order)),
            ("is_center_point", v(self.is_center_point)),
            ("values", cells(&self.values)),
            ("values_coded", cells(&self.values_coded)),
        ])
    }
}

impl ToValue for SignTable {
    fn to_value(&self) -> ResultValue {
        ResultValue::map([
            (
                "headers",
                ResultValue::List(self.headers.iter().map(ToValue::to_value).collect()),
            ),
            (
                "runs",
                ResultValue::List(self.rows.iter().map(ToValue::to_value).collect()),
            ),
            ("totals", v(self.totals.clone())),
            ("means", v(self.means.clone())),
            ("effects", v(self.effects.clone())),
            ("contributions", v(self.contributions.clone())),
            ("n_runs", v(self.n_runs)),
            ("is_two_level_factorial", v(self.is_two_level_factorial)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doe::types::ColumnKind;

    #[test]
    fn test_header_rendering() {
        let header = SignHeader {
            symbol: "A".into(),
            name: "Temperature".into(),
            kind: ColumnKind::Factor,
            factor_id: Some(7),
            data_type: Some(crate::experiment::FactorKind::Quantitative),
            level_mapping: Some((100.0, 200.0)),
            factors: Vec::new(),
            order: None,
        };
        let value = header.to_value();
        assert_eq!(value.get("type").and_then(ResultValue::as_str), Some("factor"));
        assert_eq!(value.get("factor_id").and_then(ResultValue::as_f64), Some(7.0));
        let mapping = value.get("level_mapping").unwrap();
        assert_eq!(mapping.get("-1").and_then(ResultValue::as_f64), Some(100.0));
        assert_eq!(mapping.get("1").and_then(ResultValue::as_f64), Some(200.0));
        assert!(value.get("order").is_none());
    }

    #[test]
    fn test_summary_cv_null() {
        let summary = Summary {
            mean: 0.0,
            std: 1.0,
            min: -1.0,
            max: 1.0,
            range: 2.0,
            cv: None,
        };
        assert!(summary.to_value().get("cv").unwrap().is_null());
    }
}
