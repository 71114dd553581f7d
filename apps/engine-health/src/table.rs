use crate::error::{TableError, TableResult};
use std::collections::{BTreeMap, BTreeSet, HashSet};

pub const ENGINE_ID: &str = "engine_id";
pub const CYCLE: &str = "cycle";
pub const CYCLES_TO_FAILURE: &str = "cycles_to_failure";
pub const IS_HEALTHY: &str = "is_healthy";
pub const HEALTH_SCORE: &str = "health_score";
pub const HEALTH_SCORE_ROLL: &str = "health_score_roll";

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int(Vec<i64>),
    Float(Vec<Option<f64>>),
    Bool(Vec<bool>),
}

impl Column {
    /// Float column from raw readings; non-finite readings are stored as absent.
    pub fn floats<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        Column::Float(
            values
                .into_iter()
                .map(|v| if v.is_finite() { Some(v) } else { None })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Int(values) => values.len(),
            Column::Float(values) => values.len(),
            Column::Bool(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Column::Int(_) => "integer",
            Column::Float(_) => "float",
            Column::Bool(_) => "boolean",
        }
    }
}

/// Rows of one engine, ordered by ascending cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineGroup {
    pub engine_id: i64,
    pub rows: Vec<usize>,
}

/// Columnar store of per-(engine, cycle) records.
///
/// `engine_id` and `cycle` are mandatory integer columns and `cycle` is unique
/// within an engine. Row order is whatever ingestion produced; operations that
/// need cycle order go through [`TimeSeriesTable::engine_groups`].
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesTable {
    columns: Vec<(String, Column)>,
    rows: usize,
    normalized: BTreeSet<String>,
}

impl TimeSeriesTable {
    pub fn new(engine_ids: Vec<i64>, cycles: Vec<i64>) -> TableResult<Self> {
        Self::from_columns(vec![
            (ENGINE_ID.to_string(), Column::Int(engine_ids)),
            (CYCLE.to_string(), Column::Int(cycles)),
        ])
    }

    pub fn from_columns(columns: Vec<(String, Column)>) -> TableResult<Self> {
        let rows = columns
            .iter()
            .find(|(name, _)| name == ENGINE_ID)
            .map(|(_, column)| column.len())
            .ok_or_else(|| TableError::MissingColumn(ENGINE_ID.to_string()))?;

        let mut seen = HashSet::new();
        for (name, column) in &columns {
            if column.len() != rows {
                return Err(TableError::LengthMismatch {
                    column: name.clone(),
                    expected: rows,
                    found: column.len(),
                });
            }
            if !seen.insert(name.as_str()) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }

        let table = Self {
            columns,
            rows,
            normalized: BTreeSet::new(),
        };
        table.validate_keys()?;
        Ok(table)
    }

    fn validate_keys(&self) -> TableResult<()> {
        let engine_ids = self.int_column(ENGINE_ID)?;
        let cycles = self.int_column(CYCLE)?;
        let mut seen: HashSet<(i64, i64)> = HashSet::with_capacity(self.rows);
        for (engine_id, cycle) in engine_ids.iter().zip(cycles.iter()) {
            if !seen.insert((*engine_id, *cycle)) {
                return Err(TableError::DuplicateCycle {
                    engine_id: *engine_id,
                    cycle: *cycle,
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(existing, _)| existing == name)
    }

    pub fn column(&self, name: &str) -> TableResult<&Column> {
        self.columns
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, column)| column)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    pub fn int_column(&self, name: &str) -> TableResult<&[i64]> {
        match self.column(name)? {
            Column::Int(values) => Ok(values),
            other => Err(type_error(name, "integer", other)),
        }
    }

    pub fn float_column(&self, name: &str) -> TableResult<&[Option<f64>]> {
        match self.column(name)? {
            Column::Float(values) => Ok(values),
            other => Err(type_error(name, "float", other)),
        }
    }

    pub fn bool_column(&self, name: &str) -> TableResult<&[bool]> {
        match self.column(name)? {
            Column::Bool(values) => Ok(values),
            other => Err(type_error(name, "boolean", other)),
        }
    }

    /// Integer or float column widened to optional floats.
    pub fn numeric_column(&self, name: &str) -> TableResult<Vec<Option<f64>>> {
        match self.column(name)? {
            Column::Int(values) => Ok(values.iter().map(|v| Some(*v as f64)).collect()),
            Column::Float(values) => Ok(values.clone()),
            other => Err(type_error(name, "numeric", other)),
        }
    }

    pub fn engine_ids(&self) -> TableResult<&[i64]> {
        self.int_column(ENGINE_ID)
    }

    pub fn cycles(&self) -> TableResult<&[i64]> {
        self.int_column(CYCLE)
    }

    /// Appends `column`, or replaces an existing column of the same name.
    ///
    /// A replaced column loses its z-score marker: it holds whatever the caller
    /// put there.
    pub fn with_column(mut self, name: &str, column: Column) -> TableResult<Self> {
        if column.len() != self.rows {
            return Err(TableError::LengthMismatch {
                column: name.to_string(),
                expected: self.rows,
                found: column.len(),
            });
        }
        match self.columns.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, slot)) => *slot = column,
            None => self.columns.push((name.to_string(), column)),
        }
        self.normalized.remove(name);
        if name == ENGINE_ID || name == CYCLE {
            self.validate_keys()?;
        }
        Ok(self)
    }

    pub fn is_normalized(&self, name: &str) -> bool {
        self.normalized.contains(name)
    }

    pub(crate) fn mark_normalized(&mut self, name: &str) {
        self.normalized.insert(name.to_string());
    }

    /// Keeps the rows for which `keep(row)` is true, across every column.
    pub fn retain_rows<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(usize) -> bool,
    {
        let selected: Vec<usize> = (0..self.rows).filter(|row| keep(*row)).collect();
        let columns = self
            .columns
            .iter()
            .map(|(name, column)| {
                let column = match column {
                    Column::Int(values) => Column::Int(selected.iter().map(|r| values[*r]).collect()),
                    Column::Float(values) => {
                        Column::Float(selected.iter().map(|r| values[*r]).collect())
                    }
                    Column::Bool(values) => {
                        Column::Bool(selected.iter().map(|r| values[*r]).collect())
                    }
                };
                (name.clone(), column)
            })
            .collect();
        Self {
            columns,
            rows: selected.len(),
            normalized: self.normalized.clone(),
        }
    }

    /// Row indices per engine, engines ascending, rows ascending by cycle.
    pub fn engine_groups(&self) -> TableResult<Vec<EngineGroup>> {
        let engine_ids = self.engine_ids()?;
        let cycles = self.cycles()?;

        let mut by_engine: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (row, engine_id) in engine_ids.iter().enumerate() {
            by_engine.entry(*engine_id).or_default().push(row);
        }

        Ok(by_engine
            .into_iter()
            .map(|(engine_id, mut rows)| {
                rows.sort_by_key(|row| cycles[*row]);
                EngineGroup { engine_id, rows }
            })
            .collect())
    }

    pub fn engine_count(&self) -> TableResult<usize> {
        let engine_ids = self.engine_ids()?;
        Ok(engine_ids.iter().collect::<HashSet<_>>().len())
    }
}

fn type_error(name: &str, expected: &'static str, found: &Column) -> TableError {
    TableError::ColumnType {
        column: name.to_string(),
        expected,
        found: found.type_name(),
    }
}
