//! nom parser for distance literals such as `12pt`, `2.5cm` or `-3mm`.
//!
//! A bare number is read as scaled points, so `"65536"` and `"1pt"` are the
//! same length.

use crate::scaled::{SP_PER_PT, ScaledPoint};
use nom::branch::alt;
use nom::bytes::complete::tag_no_case;
use nom::character::complete::{char, digit0, digit1, space0};
use nom::combinator::{map, map_res, opt, recognize};
use nom::sequence::delimited;
use nom::{IResult, Parser};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DistanceError {
    #[error("cannot parse distance '{0}'")]
    Malformed(String),

    #[error("distance '{0}' is out of range")]
    OutOfRange(String),
}

const PT: f64 = SP_PER_PT as f64;
const MM: f64 = PT * 72.0 / 25.4;
const DD: f64 = MM * 0.376065;

fn parse_number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize((
            opt(alt((char('+'), char('-')))),
            alt((
                recognize((digit1, opt((char('.'), digit0)))),
                recognize((char('.'), digit1)),
            )),
        )),
        |s: &str| s.parse::<f64>(),
    )
    .parse(input)
}

/// Scaled points per unit.
fn parse_unit(input: &str) -> IResult<&str, f64> {
    alt((
        map(tag_no_case("sp"), |_| 1.0),
        map(tag_no_case("pt"), |_| PT),
        map(tag_no_case("bp"), |_| PT),
        map(tag_no_case("px"), |_| PT),
        map(tag_no_case("pc"), |_| PT * 12.0),
        map(tag_no_case("in"), |_| PT * 72.0),
        map(tag_no_case("cm"), |_| MM * 10.0),
        map(tag_no_case("mm"), |_| MM),
        map(tag_no_case("dd"), |_| DD),
        map(tag_no_case("cc"), |_| DD * 12.0),
    ))
    .parse(input)
}

fn parse_length(input: &str) -> IResult<&str, f64> {
    let (input, value) = parse_number(input)?;
    let (input, factor) = opt(delimited(space0, parse_unit, space0)).parse(input)?;
    Ok((input, value * factor.unwrap_or(1.0)))
}

/// Parses a distance literal into scaled points.
pub fn parse_distance(text: &str) -> Result<ScaledPoint, DistanceError> {
    let trimmed = text.trim();
    match parse_length(trimmed) {
        Ok(("", sp)) => {
            if !sp.is_finite() || sp.abs() > i64::MAX as f64 {
                return Err(DistanceError::OutOfRange(text.to_string()));
            }
            Ok(ScaledPoint(sp.round() as i64))
        }
        _ => Err(DistanceError::Malformed(text.to_string())),
    }
}

impl std::str::FromStr for ScaledPoint {
    type Err = DistanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_distance(s)
    }
}

/// Accepts a distance literal or a whole number of scaled points.
impl<'de> Deserialize<'de> for ScaledPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Sp(i64),
            Literal(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Sp(sp) => Ok(ScaledPoint(sp)),
            Repr::Literal(text) => parse_distance(&text).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units() {
        assert_eq!(parse_distance("12pt"), Ok(ScaledPoint(12 * 65536)));
        assert_eq!(parse_distance("1in"), Ok(ScaledPoint(72 * 65536)));
        assert_eq!(parse_distance("1pc"), Ok(ScaledPoint(12 * 65536)));
        assert_eq!(parse_distance("2.54cm"), Ok(ScaledPoint(72 * 65536)));
        assert_eq!(parse_distance("25.4mm"), Ok(ScaledPoint(72 * 65536)));
        assert_eq!(parse_distance("100sp"), Ok(ScaledPoint(100)));
    }

    #[test]
    fn test_bare_number_is_scaled_points() {
        assert_eq!(parse_distance("65536"), Ok(ScaledPoint(65536)));
        assert_eq!(parse_distance(" -3 "), Ok(ScaledPoint(-3)));
    }

    #[test]
    fn test_signs_fractions_and_case() {
        assert_eq!(parse_distance("-1.5pt"), Ok(ScaledPoint(-98304)));
        assert_eq!(parse_distance("+.5PT"), Ok(ScaledPoint(32768)));
        assert_eq!(parse_distance("3 pt"), Ok(ScaledPoint(3 * 65536)));
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(parse_distance("pt"), Err(DistanceError::Malformed(_))));
        assert!(matches!(parse_distance("12 furlongs"), Err(DistanceError::Malformed(_))));
        assert!(matches!(parse_distance(""), Err(DistanceError::Malformed(_))));
        assert!("1..2pt".parse::<ScaledPoint>().is_err());
    }
}
