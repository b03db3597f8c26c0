//! Typed parsing of the lines printed by the hub.

use std::str::FromStr;

use crate::errors::{Error, ProtocolError};

fn malformed(operation: &'static str, response: &[String]) -> Error {
    ProtocolError::MalformedResponse {
        operation,
        response: response.join("\n"),
    }
    .into()
}

/// Returns the last printed line.
pub fn last_line<'a>(operation: &'static str, response: &'a [String]) -> Result<&'a str, Error> {
    response
        .last()
        .map(|line| line.trim())
        .ok_or_else(|| malformed(operation, response))
}

/// Parses the first printed line.
pub fn parse_first<T: FromStr>(operation: &'static str, response: &[String]) -> Result<T, Error> {
    response
        .first()
        .and_then(|line| line.trim().parse().ok())
        .ok_or_else(|| malformed(operation, response))
}

/// Parses the last printed line.
pub fn parse_value<T: FromStr>(operation: &'static str, response: &[String]) -> Result<T, Error> {
    last_line(operation, response)?
        .parse()
        .map_err(|_| malformed(operation, response))
}

/// Parses the last printed line as a tuple (or list) of exactly `N` values, e.g. `(12, -3, 981)`.
pub fn parse_tuple<T: FromStr, const N: usize>(
    operation: &'static str,
    response: &[String],
) -> Result<[T; N], Error> {
    let line = last_line(operation, response)?;
    let inner = line
        .strip_prefix('(')
        .and_then(|line| line.strip_suffix(')'))
        .or_else(|| line.strip_prefix('[').and_then(|line| line.strip_suffix(']')))
        .ok_or_else(|| malformed(operation, response))?;

    let values = inner
        .split(',')
        .map(|value| value.trim().parse::<T>())
        .collect::<Result<Vec<T>, _>>()
        .map_err(|_| malformed(operation, response))?;

    values
        .try_into()
        .map_err(|_| malformed(operation, response))
}
