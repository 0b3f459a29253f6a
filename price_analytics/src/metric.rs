//! Explicit "no value" results.
//!
//! A statistic that cannot be computed is a [`Metric::Undefined`] carrying the
//! reason, so the presentation layer can say *why* ("not enough data") instead
//! of rendering a NaN.

use market_data::models::bar::Column;
use serde::Serialize;

/// Why a derived value could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Undefined {
    /// The series holds no rows at all.
    EmptySeries,
    /// Fewer usable rows than the computation needs.
    InsufficientData {
        /// Rows the computation needs.
        required: usize,
        /// Rows that were usable.
        available: usize,
    },
    /// Rows exist, but the needed field is missing in every one of them.
    MissingValues {
        /// The column with no values.
        column: Column,
    },
    /// The first close is exactly zero, so a relative change has no meaning.
    ZeroBasePrice,
    /// A column is constant over the usable rows, so its correlation is undefined.
    ZeroVariance {
        /// The constant column.
        column: Column,
    },
    /// The inputs are finite but the result is not representable as a finite float.
    NonFinite,
}

/// The broad error kinds a [`Undefined`] reason falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Not enough rows for the computation.
    InsufficientData,
    /// Enough rows, but values that make the statistic meaningless.
    DegenerateInput,
}

impl Undefined {
    /// Classifies the reason.
    pub fn kind(self) -> IssueKind {
        match self {
            Undefined::EmptySeries | Undefined::InsufficientData { .. } => {
                IssueKind::InsufficientData
            }
            Undefined::MissingValues { .. }
            | Undefined::ZeroBasePrice
            | Undefined::ZeroVariance { .. }
            | Undefined::NonFinite => IssueKind::DegenerateInput,
        }
    }

    /// A short human-readable explanation.
    pub fn describe(self) -> String {
        match self {
            Undefined::EmptySeries => "no data".to_string(),
            Undefined::InsufficientData {
                required,
                available,
            } => format!("not enough data ({available} of {required} rows)"),
            Undefined::MissingValues { column } => format!("no {column} values"),
            Undefined::ZeroBasePrice => "first close is zero".to_string(),
            Undefined::ZeroVariance { column } => format!("{column} does not vary"),
            Undefined::NonFinite => "result out of range".to_string(),
        }
    }
}

/// A computed value or the reason it is absent.
///
/// Serialized as `{"status": "defined", "value": ..}` or
/// `{"status": "undefined", "value": {"reason": ..}}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Metric<T> {
    /// The value was computed.
    Defined(T),
    /// The value could not be computed.
    Undefined(Undefined),
}

impl<T> Metric<T> {
    /// Wraps an optional value, using `reason` when it is `None`.
    pub fn from_option(value: Option<T>, reason: Undefined) -> Self {
        match value {
            Some(v) => Metric::Defined(v),
            None => Metric::Undefined(reason),
        }
    }

    /// The value, if defined.
    pub fn value(&self) -> Option<&T> {
        match self {
            Metric::Defined(v) => Some(v),
            Metric::Undefined(_) => None,
        }
    }

    /// The reason, if undefined.
    pub fn reason(&self) -> Option<Undefined> {
        match self {
            Metric::Defined(_) => None,
            Metric::Undefined(reason) => Some(*reason),
        }
    }

    /// Whether a value is present.
    pub fn is_defined(&self) -> bool {
        matches!(self, Metric::Defined(_))
    }

    /// Transforms a defined value, keeping the reason otherwise.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Metric<U> {
        match self {
            Metric::Defined(v) => Metric::Defined(f(v)),
            Metric::Undefined(reason) => Metric::Undefined(reason),
        }
    }

    /// Chains a computation that may itself be undefined.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Metric<U>) -> Metric<U> {
        match self {
            Metric::Defined(v) => f(v),
            Metric::Undefined(reason) => Metric::Undefined(reason),
        }
    }
}

impl<T: Copy> Metric<T> {
    /// The value by copy, if defined.
    pub fn get(&self) -> Option<T> {
        self.value().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_status_tag() {
        let defined: Metric<f64> = Metric::Defined(1.5);
        assert_eq!(
            serde_json::to_value(defined).unwrap(),
            serde_json::json!({"status": "defined", "value": 1.5})
        );

        let undefined: Metric<f64> = Metric::Undefined(Undefined::InsufficientData {
            required: 2,
            available: 1,
        });
        assert_eq!(
            serde_json::to_value(undefined).unwrap(),
            serde_json::json!({
                "status": "undefined",
                "value": {"reason": "insufficient_data", "required": 2, "available": 1}
            })
        );
    }

    #[test]
    fn reasons_are_classified() {
        assert_eq!(Undefined::EmptySeries.kind(), IssueKind::InsufficientData);
        assert_eq!(Undefined::ZeroBasePrice.kind(), IssueKind::DegenerateInput);
        assert_eq!(Undefined::NonFinite.kind(), IssueKind::DegenerateInput);
        assert_eq!(
            Undefined::ZeroVariance {
                column: Column::Volume
            }
            .kind(),
            IssueKind::DegenerateInput
        );
    }

    #[test]
    fn and_then_short_circuits() {
        let m: Metric<f64> = Metric::Undefined(Undefined::EmptySeries);
        let chained = m.and_then(|v| Metric::Defined(v * 2.0));
        assert_eq!(chained.reason(), Some(Undefined::EmptySeries));

        let m = Metric::Defined(2.0).and_then(|v| Metric::Defined(v * 2.0));
        assert_eq!(m.get(), Some(4.0));
    }

    #[test]
    fn describe_mentions_the_column() {
        let text = Undefined::ZeroVariance {
            column: Column::Volume,
        }
        .describe();
        assert_eq!(text, "volume does not vary");
    }
}
