use crate::error::Result;
use molreward::core::oracles::reference;
use molreward::engine::config::{OracleConfig, OracleKind};
use std::fmt::Write;

pub fn run() -> Result<()> {
    print!("{}", render());
    Ok(())
}

fn render() -> String {
    let mut out = String::from("Registered oracles:\n");
    for kind in OracleKind::ALL {
        let defaults = OracleConfig::defaults(kind).to_overrides();
        if defaults.is_empty() {
            let _ = writeln!(out, "  {:<16} (no overrides)", kind.name());
            continue;
        }
        let rendered: Vec<String> = defaults
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        let _ = writeln!(out, "  {:<16} {}", kind.name(), rendered.join(" "));
    }

    out.push_str("\nReference structures (query_structure):\n");
    for name in reference::names() {
        let marker = if name == reference::DEFAULT_REFERENCE { " (default)" } else { "" };
        let _ = writeln!(out, "  {name}{marker}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_oracle_with_its_defaults() {
        let text = render();
        assert!(text.contains("tanimoto"));
        assert!(text.contains("k=0.7 query_structure=Celebrex"));
        assert!(text.contains("logp"));
        assert!(text.contains("(no overrides)"));
        assert!(text.contains("clf_path=data/clf.toml"));
    }

    #[test]
    fn marks_the_default_reference() {
        let text = render();
        assert!(text.contains("Celebrex (default)"));
        assert!(text.contains("Zaleplon"));
    }
}
