use crate::cli::ScoreArgs;
use crate::config::PartialScoringConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use molreward::engine::config::WorkerCommand;
use molreward::engine::progress::ProgressReporter;
use molreward::workflows::scoring;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScoreSummary {
    count: usize,
    mean: f64,
    nonzero: usize,
}

pub fn run(args: ScoreArgs, show_progress: bool) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialScoringConfig::from_file(path)?,
        None => PartialScoringConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args, WorkerCommand::current_exe()?)?;

    info!("Reading molecules from {:?}", &args.input);
    let descriptors = read_descriptors(&args.input)?;
    info!(molecules = descriptors.len(), "Input loaded.");

    let progress_handler = if show_progress {
        CliProgressHandler::new()
    } else {
        CliProgressHandler::hidden()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let scores = scoring::run(&config, &descriptors, &reporter)?;

    match &args.output {
        Some(path) => {
            write_scores(File::create(path)?, &descriptors, &scores)?;
            info!("Scores written to {:?}", path);
        }
        None => write_scores(io::stdout().lock(), &descriptors, &scores)?,
    }

    let summary = summarize(&scores);
    eprintln!(
        "Scored {} molecule(s) with '{}': mean {:.4}, {} non-zero.",
        summary.count,
        config.oracle.kind(),
        summary.mean,
        summary.nonzero
    );
    Ok(())
}

fn read_descriptors(path: &Path) -> Result<Vec<String>> {
    if path == Path::new("-") {
        parse_descriptors(io::stdin().lock())
    } else {
        let file = File::open(path).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        parse_descriptors(BufReader::new(file))
    }
}

/// One descriptor per line; surrounding whitespace is trimmed and blank lines are skipped.
fn parse_descriptors<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut descriptors = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            descriptors.push(trimmed.to_string());
        }
    }
    Ok(descriptors)
}

fn write_scores<W: Write>(writer: W, descriptors: &[String], scores: &[f64]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["smiles", "score"])?;
    for (descriptor, score) in descriptors.iter().zip(scores) {
        csv_writer.write_record([descriptor.as_str(), score.to_string().as_str()])?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn summarize(scores: &[f64]) -> ScoreSummary {
    let count = scores.len();
    let mean = if count == 0 {
        0.0
    } else {
        scores.iter().sum::<f64>() / count as f64
    };
    ScoreSummary {
        count,
        mean,
        nonzero: scores.iter().filter(|&&s| s != 0.0).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn descriptors_skip_blank_lines_and_trim() {
        let input = "CCO\n\n  c1ccccc1  \r\n\t\nCC(=O)O";
        let descriptors = parse_descriptors(Cursor::new(input)).unwrap();
        assert_eq!(descriptors, vec!["CCO", "c1ccccc1", "CC(=O)O"]);
    }

    #[test]
    fn csv_output_has_header_and_aligned_rows() {
        let mut buffer = Vec::new();
        let descriptors = vec!["CCO".to_string(), "C,C".to_string()];
        write_scores(&mut buffer, &descriptors, &[0.25, 0.0]).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "smiles,score\nCCO,0.25\n\"C,C\",0\n");
    }

    #[test]
    fn summary_counts_nonzero_scores() {
        let summary = summarize(&[0.0, 0.5, 1.0, 0.5]);
        assert_eq!(summary.count, 4);
        assert_eq!(summary.mean, 0.5);
        assert_eq!(summary.nonzero, 3);
        assert_eq!(summarize(&[]).mean, 0.0);
    }

    #[test]
    fn missing_input_file_is_a_parsing_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_descriptors(&dir.path().join("absent.smi"));
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
