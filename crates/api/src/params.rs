//! Operand Extraction
//!
//! Pulls the two integer operands of an arithmetic endpoint out of the
//! request's query string. Parameter names are not validated: any two
//! integer-valued parameters are accepted.

use axum::{async_trait, extract::FromRequestParts, extract::Query, http::request::Parts};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::error::ApiError;

/// Errors while extracting operands
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    /// Query string did not carry exactly two parameters
    #[error("expected two integers in the URL, got {count} parameter(s)")]
    InvalidInputCount { count: usize },

    /// A parameter value is not a base-10 integer
    #[error("\"{value}\" is not a valid value for \"{name}\"")]
    InvalidNumber { name: String, value: String },
}

/// Decoded query parameters, one value per name.
///
/// Repeated names keep their first value. Iteration is in ascending name
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut map = BTreeMap::new();
        for (name, value) in pairs {
            map.entry(name).or_insert(value);
        }
        Self(map)
    }
}

/// Parse exactly two integer operands from `params`.
///
/// The first operand comes from the parameter whose name sorts first.
pub fn parse_operands(params: &QueryParams) -> Result<(i64, i64), ParamsError> {
    if params.len() != 2 {
        return Err(ParamsError::InvalidInputCount {
            count: params.len(),
        });
    }

    let mut numbers = params.iter().map(|(name, value)| {
        value
            .parse::<i64>()
            .map_err(|_| ParamsError::InvalidNumber {
                name: name.to_string(),
                value: value.to_string(),
            })
    });

    match (numbers.next(), numbers.next()) {
        (Some(a), Some(b)) => Ok((a?, b?)),
        _ => Err(ParamsError::InvalidInputCount {
            count: params.len(),
        }),
    }
}

/// The two operands of an arithmetic request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operands {
    pub a: i64,
    pub b: i64,
}

#[async_trait]
impl<S> FromRequestParts<S> for Operands
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map_err(|e| ApiError::Query(e.body_text()))?;

        let params: QueryParams = pairs.into_iter().collect();
        let (a, b) = parse_operands(&params)?;
        Ok(Self { a, b })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_two_integers() {
        assert_eq!(parse_operands(&params(&[("a", "4"), ("b", "5")])), Ok((4, 5)));
    }

    #[test]
    fn test_names_are_not_validated() {
        assert_eq!(
            parse_operands(&params(&[("x", "10"), ("y", "20")])),
            Ok((10, 20))
        );
    }

    #[test]
    fn test_operands_follow_name_order() {
        assert_eq!(parse_operands(&params(&[("b", "1"), ("a", "2")])), Ok((2, 1)));
    }

    #[test]
    fn test_signed_values() {
        assert_eq!(
            parse_operands(&params(&[("a", "-3"), ("b", "+7")])),
            Ok((-3, 7))
        );
    }

    #[test]
    fn test_wrong_count() {
        for pairs in [
            vec![],
            vec![("a", "1")],
            vec![("a", "1"), ("b", "2"), ("c", "3")],
        ] {
            let count = pairs.len();
            assert_eq!(
                parse_operands(&params(&pairs)),
                Err(ParamsError::InvalidInputCount { count })
            );
        }
    }

    #[test]
    fn test_repeated_name_counts_once() {
        let p = params(&[("a", "1"), ("a", "2")]);
        assert_eq!(p.len(), 1);
        assert_eq!(p.iter().next(), Some(("a", "1")));
        assert_eq!(
            parse_operands(&p),
            Err(ParamsError::InvalidInputCount { count: 1 })
        );
    }

    #[test]
    fn test_invalid_number_names_value() {
        let err = parse_operands(&params(&[("a", "1"), ("b", "dos")])).unwrap_err();
        assert_eq!(
            err,
            ParamsError::InvalidNumber {
                name: "b".to_string(),
                value: "dos".to_string()
            }
        );
        assert_eq!(err.to_string(), "\"dos\" is not a valid value for \"b\"");
    }

    #[test]
    fn test_empty_and_fractional_values_rejected() {
        assert!(matches!(
            parse_operands(&params(&[("a", ""), ("b", "2")])),
            Err(ParamsError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_operands(&params(&[("a", "1.5"), ("b", "2")])),
            Err(ParamsError::InvalidNumber { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_any_pair_parses(a in any::<i64>(), b in any::<i64>()) {
            let (sa, sb) = (a.to_string(), b.to_string());
            let p = params(&[("first", sa.as_str()), ("second", sb.as_str())]);
            prop_assert_eq!(parse_operands(&p), Ok((a, b)));
        }

        #[test]
        fn prop_insertion_order_is_irrelevant(a in any::<i64>(), b in any::<i64>()) {
            let (a, b) = (a.to_string(), b.to_string());
            let forward = params(&[("k1", a.as_str()), ("k2", b.as_str())]);
            let reverse = params(&[("k2", b.as_str()), ("k1", a.as_str())]);
            prop_assert_eq!(parse_operands(&forward), parse_operands(&reverse));
        }
    }
}
