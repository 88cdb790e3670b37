//! Line protocol spoken between a dispatcher and its worker subprocesses.
//!
//! A request is the raw descriptor on one line. The response is either
//! `"<descriptor> <score>"` with the score in `[0, 1]`, or the sentinel
//! [`UNSCORABLE`]. Scores are written with Rust's shortest round-trip float
//! formatting so that a parsed response is bit-identical to the worker's value.

use thiserror::Error;

/// Response line sent for a descriptor the oracle cannot parse.
pub const UNSCORABLE: &str = "None";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Response {
    Score(f64),
    Unscorable,
}

impl Response {
    pub fn score(self) -> f64 {
        match self {
            Response::Score(value) => value,
            Response::Unscorable => 0.0,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    #[error("Response does not echo the request: {line:?}")]
    DescriptorMismatch { line: String },

    #[error("Response score is not a number: {value:?}")]
    MalformedScore { value: String },

    #[error("Response score {0} lies outside [0, 1]")]
    OutOfRange(f64),
}

/// A descriptor can travel over the protocol only if it fits on one line.
pub fn is_sendable(descriptor: &str) -> bool {
    !descriptor.contains(['\n', '\r'])
}

pub fn format_response(descriptor: &str, score: Option<f64>) -> String {
    match score {
        Some(value) => format!("{descriptor} {value}"),
        None => UNSCORABLE.to_string(),
    }
}

pub fn parse_response(descriptor: &str, line: &str) -> Result<Response, ProtocolError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line == UNSCORABLE {
        return Ok(Response::Unscorable);
    }
    let value = line
        .strip_prefix(descriptor)
        .and_then(|rest| rest.strip_prefix(' '))
        .ok_or_else(|| ProtocolError::DescriptorMismatch {
            line: line.to_string(),
        })?;
    let score: f64 = value
        .trim()
        .parse()
        .map_err(|_| ProtocolError::MalformedScore {
            value: value.to_string(),
        })?;
    if !(0.0..=1.0).contains(&score) {
        return Err(ProtocolError::OutOfRange(score));
    }
    Ok(Response::Score(score))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_score_for_matching_descriptor() {
        assert_eq!(
            parse_response("CCO", "CCO 0.25\n"),
            Ok(Response::Score(0.25))
        );
        assert_eq!(parse_response("CCO", "CCO 1"), Ok(Response::Score(1.0)));
    }

    #[test]
    fn sentinel_is_unscorable() {
        assert_eq!(parse_response("xyz", "None\r\n"), Ok(Response::Unscorable));
        assert_eq!(Response::Unscorable.score(), 0.0);
    }

    #[test]
    fn response_for_another_descriptor_is_rejected() {
        assert!(matches!(
            parse_response("CCO", "CCN 0.5"),
            Err(ProtocolError::DescriptorMismatch { .. })
        ));
        assert!(matches!(
            parse_response("CC", "CCO 0.5"),
            Err(ProtocolError::DescriptorMismatch { .. })
        ));
    }

    #[test]
    fn malformed_and_out_of_range_scores_are_rejected() {
        assert!(matches!(
            parse_response("C", "C high"),
            Err(ProtocolError::MalformedScore { .. })
        ));
        assert!(matches!(
            parse_response("C", "C "),
            Err(ProtocolError::MalformedScore { .. })
        ));
        assert_eq!(parse_response("C", "C 1.5"), Err(ProtocolError::OutOfRange(1.5)));
        assert!(parse_response("C", "C NaN").is_err());
    }

    #[test]
    fn formatted_scores_parse_back_bit_identical() {
        let value = 0.1 + 0.2;
        let line = format_response("c1ccccc1", Some(value));
        let parsed = parse_response("c1ccccc1", &line).unwrap().score();
        assert_eq!(parsed.to_bits(), value.to_bits());
        assert_eq!(format_response("c1ccccc1", None), "None");
    }

    #[test]
    fn descriptors_with_line_breaks_are_not_sendable() {
        assert!(is_sendable("CC(=O)O"));
        assert!(is_sendable(""));
        assert!(!is_sendable("CC\nO"));
        assert!(!is_sendable("CC\r"));
    }
}
