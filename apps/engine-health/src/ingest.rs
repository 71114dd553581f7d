//! Reader for whitespace-separated run-to-failure sensor logs.
//!
//! Each line is one cycle of one engine: `engine_id cycle op_setting_1..3
//! sensor_1..21`, no header. Training logs run every engine to failure, so
//! `cycles_to_failure` can be derived from the last observed cycle. Test logs
//! stop early; their remaining life comes from a separate RUL label file.

use crate::error::{IngestError, TableResult};
use crate::table::{Column, TimeSeriesTable, CYCLE, CYCLES_TO_FAILURE, ENGINE_ID};
use std::collections::BTreeMap;
use std::path::Path;

pub const OP_SETTING_COUNT: usize = 3;
pub const SENSOR_COUNT: usize = 21;

pub fn sensor_column(index: usize) -> String {
    format!("sensor_{index}")
}

pub fn column_names() -> Vec<String> {
    let mut names = vec![ENGINE_ID.to_string(), CYCLE.to_string()];
    names.extend((1..=OP_SETTING_COUNT).map(|i| format!("op_setting_{i}")));
    names.extend((1..=SENSOR_COUNT).map(sensor_column));
    names
}

fn read_file(path: &Path) -> Result<String, IngestError> {
    std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_integer(raw: &str, line: usize, column: &str) -> Result<i64, IngestError> {
    if let Ok(value) = raw.parse::<i64>() {
        return Ok(value);
    }
    // Some exports write integer keys as `1.0`. `i64::MAX as f64` rounds up to
    // 2^63, which is already out of range.
    match raw.parse::<f64>() {
        Ok(value)
            if value.fract() == 0.0
                && value >= i64::MIN as f64
                && value < i64::MAX as f64 =>
        {
            Ok(value as i64)
        }
        _ => Err(IngestError::Parse {
            line,
            column: column.to_string(),
            message: format!("expected an integer, got `{raw}`"),
        }),
    }
}

fn parse_reading(raw: &str, line: usize, column: &str) -> Result<f64, IngestError> {
    raw.parse::<f64>().map_err(|err| IngestError::Parse {
        line,
        column: column.to_string(),
        message: format!("{err} (`{raw}`)"),
    })
}

/// Parses a sensor log held in memory. Blank lines are skipped.
pub fn parse_sensor_log(contents: &str) -> Result<TimeSeriesTable, IngestError> {
    let names = column_names();
    let width = names.len();

    let mut engine_ids: Vec<i64> = Vec::new();
    let mut cycles: Vec<i64> = Vec::new();
    let mut readings: Vec<Vec<f64>> = vec![Vec::new(); width - 2];

    for (idx, raw_line) in contents.lines().enumerate() {
        let line = idx + 1;
        let fields: Vec<&str> = raw_line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != width {
            return Err(IngestError::RowWidth {
                line,
                expected: width,
                found: fields.len(),
            });
        }
        engine_ids.push(parse_integer(fields[0], line, &names[0])?);
        cycles.push(parse_integer(fields[1], line, &names[1])?);
        for (offset, raw) in fields[2..].iter().enumerate() {
            readings[offset].push(parse_reading(raw, line, &names[offset + 2])?);
        }
    }

    let mut columns: Vec<(String, Column)> = vec![
        (names[0].clone(), Column::Int(engine_ids)),
        (names[1].clone(), Column::Int(cycles)),
    ];
    for (name, values) in names[2..].iter().zip(readings) {
        columns.push((name.clone(), Column::floats(values)));
    }
    Ok(TimeSeriesTable::from_columns(columns)?)
}

/// Adds `cycles_to_failure = max cycle of the engine - cycle`.
pub fn add_cycles_to_failure(table: &TimeSeriesTable) -> TableResult<TimeSeriesTable> {
    let engine_ids = table.engine_ids()?;
    let cycles = table.cycles()?;

    let mut max_cycle: BTreeMap<i64, i64> = BTreeMap::new();
    for (engine_id, cycle) in engine_ids.iter().zip(cycles) {
        let entry = max_cycle.entry(*engine_id).or_insert(*cycle);
        *entry = (*entry).max(*cycle);
    }

    let ctf = engine_ids
        .iter()
        .zip(cycles)
        .map(|(engine_id, cycle)| max_cycle[engine_id] - cycle)
        .collect();
    table.clone().with_column(CYCLES_TO_FAILURE, Column::Int(ctf))
}

pub fn load_train_data(path: &Path) -> Result<TimeSeriesTable, IngestError> {
    let table = parse_sensor_log(&read_file(path)?)?;
    let table = add_cycles_to_failure(&table)?;
    tracing::info!(
        path = %path.display(),
        rows = table.len(),
        engines = table.engine_count()?,
        "loaded training log"
    );
    Ok(table)
}

/// Loads a test log. No `cycles_to_failure` is derived: failure is not observed.
pub fn load_test_data(path: &Path) -> Result<TimeSeriesTable, IngestError> {
    let table = parse_sensor_log(&read_file(path)?)?;
    tracing::info!(
        path = %path.display(),
        rows = table.len(),
        engines = table.engine_count()?,
        "loaded test log"
    );
    Ok(table)
}

/// One remaining-useful-life value per non-empty line (first field).
pub fn parse_rul_labels(contents: &str) -> Result<Vec<i64>, IngestError> {
    contents
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| line.split_whitespace().next().map(|raw| (idx + 1, raw)))
        .map(|(line, raw)| parse_integer(raw, line, "rul"))
        .collect()
}

pub fn load_rul_labels(path: &Path) -> Result<Vec<i64>, IngestError> {
    parse_rul_labels(&read_file(path)?)
}

/// Derives `cycles_to_failure` for a test log from its RUL labels.
///
/// Labels are matched to engines in ascending `engine_id` order; the row at the
/// engine's last observed cycle gets the label and earlier rows count up from it.
pub fn attach_rul_labels(
    table: &TimeSeriesTable,
    labels: &[i64],
) -> Result<TimeSeriesTable, IngestError> {
    let with_ctf = add_cycles_to_failure(table)?;
    let groups = with_ctf.engine_groups()?;
    if groups.len() != labels.len() {
        return Err(IngestError::RulLabelCount {
            labels: labels.len(),
            engines: groups.len(),
        });
    }

    let elapsed = with_ctf.int_column(CYCLES_TO_FAILURE)?;
    let mut ctf = elapsed.to_vec();
    for (group, rul) in groups.iter().zip(labels) {
        let invalid = || IngestError::InvalidRul {
            engine_id: group.engine_id,
            value: *rul,
        };
        if *rul < 0 {
            return Err(invalid());
        }
        for row in &group.rows {
            ctf[*row] = elapsed[*row].checked_add(*rul).ok_or_else(invalid)?;
        }
    }
    Ok(with_ctf.with_column(CYCLES_TO_FAILURE, Column::Int(ctf))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn log_line(engine: i64, cycle: i64, sensor_base: f64) -> String {
        let mut fields = vec![engine.to_string(), cycle.to_string()];
        fields.extend(["-0.0007", "-0.0004", "100.0"].iter().map(|s| s.to_string()));
        fields.extend((1..=SENSOR_COUNT).map(|i| format!("{:.2}", sensor_base + i as f64)));
        fields.join(" ")
    }

    fn sample_log() -> String {
        [
            log_line(1, 1, 500.0),
            log_line(1, 2, 501.0),
            log_line(1, 3, 502.0),
            String::new(),
            log_line(2, 1, 600.0),
            log_line(2, 2, 601.0),
        ]
        .join("\n")
    }

    #[test]
    fn column_layout_matches_log_format() {
        let names = column_names();
        assert_eq!(names.len(), 26);
        assert_eq!(names[0], "engine_id");
        assert_eq!(names[4], "op_setting_3");
        assert_eq!(names[5], "sensor_1");
        assert_eq!(names[25], "sensor_21");
    }

    #[test]
    fn parse_reads_every_column_and_skips_blank_lines() {
        let table = parse_sensor_log(&sample_log()).unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table.engine_ids().unwrap(), &[1, 1, 1, 2, 2]);
        assert_eq!(table.cycles().unwrap(), &[1, 2, 3, 1, 2]);
        assert_eq!(table.float_column("op_setting_3").unwrap()[0], Some(100.0));
        assert_eq!(table.float_column("sensor_2").unwrap()[3], Some(602.0));
        assert!(!table.has_column(CYCLES_TO_FAILURE));
    }

    #[test]
    fn ragged_rows_are_rejected_with_line_number() {
        let contents = format!("{}\n1 2 3", log_line(1, 1, 0.0));
        let err = parse_sensor_log(&contents).unwrap_err();
        assert!(matches!(
            err,
            IngestError::RowWidth {
                line: 2,
                expected: 26,
                found: 3
            }
        ));
    }

    #[test]
    fn bad_reading_names_the_column() {
        let contents = log_line(1, 1, 0.0).replacen("3.00", "abc", 1);
        let err = parse_sensor_log(&contents).unwrap_err();
        match err {
            IngestError::Parse { line, column, .. } => {
                assert_eq!(line, 1);
                assert_eq!(column, "sensor_3");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn float_formatted_keys_are_accepted() {
        let contents = log_line(1, 1, 0.0).replacen("1 1 ", "1.0 1.0 ", 1);
        let table = parse_sensor_log(&contents).unwrap();
        assert_eq!(table.engine_ids().unwrap(), &[1]);
    }

    #[test]
    fn out_of_range_float_keys_are_rejected() {
        let contents = log_line(1, 1, 0.0).replacen("1 1 ", "1e20 1 ", 1);
        let err = parse_sensor_log(&contents).unwrap_err();
        match err {
            IngestError::Parse { line, column, .. } => {
                assert_eq!(line, 1);
                assert_eq!(column, ENGINE_ID);
            }
            other => panic!("unexpected error: {other}"),
        }

        let contents = log_line(1, 1, 0.0).replacen("1 1 ", "1 -9.3e18 ", 1);
        assert!(matches!(
            parse_sensor_log(&contents),
            Err(IngestError::Parse { .. })
        ));
    }

    #[test]
    fn train_data_derives_cycles_to_failure() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_log().as_bytes()).unwrap();
        let table = load_train_data(file.path()).unwrap();
        assert_eq!(table.int_column(CYCLES_TO_FAILURE).unwrap(), &[2, 1, 0, 1, 0]);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_test_data(Path::new("/nonexistent/train_FD001.txt")).unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
        assert!(err.to_string().contains("train_FD001.txt"));
    }

    #[test]
    fn rul_labels_extend_cycles_to_failure() {
        let table = parse_sensor_log(&sample_log()).unwrap();
        let labels = parse_rul_labels("112 \n98\n\n").unwrap();
        assert_eq!(labels, vec![112, 98]);

        let labelled = attach_rul_labels(&table, &labels).unwrap();
        assert_eq!(
            labelled.int_column(CYCLES_TO_FAILURE).unwrap(),
            &[114, 113, 112, 99, 98]
        );
    }

    #[test]
    fn negative_rul_label_is_rejected() {
        let table = parse_sensor_log(&sample_log()).unwrap();
        let err = attach_rul_labels(&table, &[5, -1]).unwrap_err();
        assert!(matches!(
            err,
            IngestError::InvalidRul {
                engine_id: 2,
                value: -1
            }
        ));
    }

    #[test]
    fn overflowing_rul_label_is_an_error() {
        let table = parse_sensor_log(&sample_log()).unwrap();
        let labels = parse_rul_labels("9223372036854775807\n0").unwrap();
        let err = attach_rul_labels(&table, &labels).unwrap_err();
        assert!(matches!(
            err,
            IngestError::InvalidRul {
                engine_id: 1,
                value: i64::MAX
            }
        ));
    }

    #[test]
    fn rul_label_count_must_match_engines() {
        let table = parse_sensor_log(&sample_log()).unwrap();
        let err = attach_rul_labels(&table, &[10]).unwrap_err();
        assert!(matches!(
            err,
            IngestError::RulLabelCount {
                labels: 1,
                engines: 2
            }
        ));
    }
}
