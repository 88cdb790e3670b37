use crate::core::oracles::Oracle;
use crate::engine::protocol;
use std::io::{self, BufRead, Write};
use tracing::{debug, info, instrument};

/// Answers one response line per request line until `reader` reaches EOF.
///
/// Each response is flushed immediately since the dispatcher waits on it. Returns
/// the number of requests served.
#[instrument(skip_all, name = "serve_loop", fields(oracle = oracle.name()))]
pub fn run<R, W>(oracle: &dyn Oracle, mut reader: R, mut writer: W) -> io::Result<usize>
where
    R: BufRead,
    W: Write,
{
    info!("Worker ready.");
    let mut served = 0;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let descriptor = line.trim_end_matches('\n').trim_end_matches('\r');
        let score = oracle.try_score(descriptor);
        if score.is_none() {
            debug!(descriptor, "Descriptor could not be parsed.");
        }
        writeln!(writer, "{}", protocol::format_response(descriptor, score))?;
        writer.flush()?;
        served += 1;
    }
    info!(served, "Input closed; worker exiting.");
    Ok(served)
}

/// Runs [`run`] on the process's stdin and stdout.
pub fn run_stdio(oracle: &dyn Oracle) -> io::Result<usize> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run(oracle, stdin.lock(), stdout.lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::oracles::property::LogPOracle;
    use crate::core::oracles::similarity::TanimotoOracle;
    use crate::engine::protocol::{Response, parse_response};
    use std::io::Cursor;

    fn serve(oracle: &dyn Oracle, input: &str) -> (usize, Vec<String>) {
        let mut output = Vec::new();
        let served = run(oracle, Cursor::new(input.as_bytes()), &mut output).unwrap();
        let lines = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        (served, lines)
    }

    #[test]
    fn answers_every_line_in_order() {
        let (served, lines) = serve(&LogPOracle::new(), "CCCC\nC1CC\nCCCCCCCCCCCC\n");
        assert_eq!(served, 3);
        assert_eq!(lines, vec!["CCCC 1", "None", "CCCCCCCCCCCC 0"]);
    }

    #[test]
    fn blank_line_is_answered_as_unscorable() {
        let (served, lines) = serve(&LogPOracle::new(), "\n");
        assert_eq!(served, 1);
        assert_eq!(lines, vec!["None"]);
    }

    #[test]
    fn crlf_and_missing_final_newline_are_handled() {
        let (served, lines) = serve(&LogPOracle::new(), "CCCC\r\nCCCC");
        assert_eq!(served, 2);
        assert_eq!(lines, vec!["CCCC 1", "CCCC 1"]);
    }

    #[test]
    fn served_scores_parse_back_to_in_process_values() {
        let oracle = TanimotoOracle::new(0.7, "Celebrex").unwrap();
        let descriptor = "c1ccccc1S(N)(=O)=O";
        let (_, lines) = serve(&oracle, &format!("{descriptor}\n"));
        let parsed = parse_response(descriptor, &lines[0]).unwrap();
        let expected = oracle.score(descriptor);
        match parsed {
            Response::Score(value) => assert_eq!(value.to_bits(), expected.to_bits()),
            Response::Unscorable => panic!("descriptor should be scorable"),
        }
    }

    #[test]
    fn empty_input_serves_nothing() {
        let (served, lines) = serve(&LogPOracle::new(), "");
        assert_eq!(served, 0);
        assert!(lines.is_empty());
    }
}
