//! validation of resolved payloads
//!
//! Unit files embedded in `systemd` and `networkd` are checked for well-formedness.
use crate::report::{Entry, Report};
use crate::schema::{Config, SystemdUnit};

pub fn validate(config: &Config) -> Report {
    let mut report = Report::default();

    check_systemd_units(config, &mut report);
    check_networkd_units(config, &mut report);

    tracing::debug!(entries = report.entries.len(), "validated");
    report
}

fn check_systemd_units(config: &Config, report: &mut Report) {
    for unit in &config.systemd.units {
        check_systemd_unit(unit, report);
    }
}

fn check_systemd_unit(unit: &SystemdUnit, report: &mut Report) {
    match parse_unit(&unit.contents) {
        Ok(0) if unit.dropins.is_empty() => report.add(Entry::warning(format!(
            "{} (unit: {:?})",
            UnitError::Empty,
            unit.name
        ))),
        Ok(_) => {}
        Err(err) => report.add(Entry::error(format!("{err} (unit: {:?})", unit.name))),
    }

    for dropin in &unit.dropins {
        if let Err(err) = parse_unit(&dropin.contents).and_then(non_empty) {
            report.add(Entry::error(format!("{err} (drop-in: {:?})", dropin.name)));
        }
    }
}

fn check_networkd_units(config: &Config, report: &mut Report) {
    for unit in &config.networkd.units {
        if let Err(err) = parse_unit(&unit.contents).and_then(non_empty) {
            report.add(Entry::error(format!("{err} (unit: {:?})", unit.name)));
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum UnitError {
    #[error("invalid or empty unit content")]
    Empty,
    #[error("invalid unit content: line {line}: {reason}")]
    Malformed { line: usize, reason: &'static str },
}

fn non_empty(options: usize) -> Result<usize, UnitError> {
    match options {
        0 => Err(UnitError::Empty),
        options => Ok(options),
    }
}

/// Parse unit file contents, returns the number of options
///
/// - blank lines and lines starting with `#` or `;` are ignored
/// - `[Section]` starts a section
/// - `Key=Value` sets an option, only inside a section
/// - a trailing `\` continues the line
pub fn parse_unit(contents: &str) -> Result<usize, UnitError> {
    let mut in_section = false;
    let mut options = 0;
    let mut continuation = false;

    for (index, line) in contents.lines().enumerate() {
        let line_number = index + 1;
        let malformed = |reason| UnitError::Malformed {
            line: line_number,
            reason,
        };

        let line = line.trim();

        if continuation {
            continuation = line.ends_with('\\');
            continue;
        }

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') {
            let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) else {
                return Err(malformed("unterminated section header"));
            };
            if name.is_empty() || name.contains(['[', ']']) {
                return Err(malformed("invalid section name"));
            }

            in_section = true;
            continue;
        }

        if !in_section {
            return Err(malformed("option outside of a section"));
        }

        let Some((key, _value)) = line.split_once('=') else {
            return Err(malformed("expected key=value"));
        };
        if key.trim().is_empty() {
            return Err(malformed("option without a key"));
        }

        options += 1;
        continuation = line.ends_with('\\');
    }

    Ok(options)
}
