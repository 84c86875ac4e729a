use std::fmt;
use std::path::Path;
use std::str::FromStr;

use fib_core::Strategy;
use tokio::fs;

use crate::error::{BenchError, Result};

pub const TIMEOUT: &str = "TIMEOUT";
pub const ERROR: &str = "ERROR";

/// One value in a results table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Seconds(f64),
    Count(u64),
    Timeout,
    Error,
}

impl Cell {
    /// Numeric value, if the data point completed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Seconds(s) => Some(*s),
            Cell::Count(c) => Some(*c as f64),
            Cell::Timeout | Cell::Error => None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, Cell::Timeout | Cell::Error)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Seconds(s) => write!(f, "{s:.6}"),
            Cell::Count(c) => write!(f, "{c}"),
            Cell::Timeout => f.write_str(TIMEOUT),
            Cell::Error => f.write_str(ERROR),
        }
    }
}

impl FromStr for Cell {
    type Err = BenchError;

    fn from_str(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        match raw {
            TIMEOUT => Ok(Cell::Timeout),
            ERROR => Ok(Cell::Error),
            _ => {
                if let Ok(count) = raw.parse::<u64>() {
                    return Ok(Cell::Count(count));
                }
                raw.parse::<f64>()
                    .ok()
                    .filter(|s| s.is_finite() && *s >= 0.0)
                    .map(Cell::Seconds)
                    .ok_or_else(|| BenchError::Table(format!("invalid cell `{raw}`")))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub n: u32,
    pub iterative: Cell,
    pub recursive: Cell,
    pub dp: Cell,
}

impl Row {
    pub fn get(&self, strategy: Strategy) -> Cell {
        match strategy {
            Strategy::Iterative => self.iterative,
            Strategy::Recursive => self.recursive,
            Strategy::Memoized => self.dp,
        }
    }

    pub fn set(&mut self, strategy: Strategy, cell: Cell) {
        match strategy {
            Strategy::Iterative => self.iterative = cell,
            Strategy::Recursive => self.recursive = cell,
            Strategy::Memoized => self.dp = cell,
        }
    }

    pub fn pending(n: u32) -> Self {
        Self {
            n,
            iterative: Cell::Error,
            recursive: Cell::Error,
            dp: Cell::Error,
        }
    }
}

/// `N,Iterative,Recursive,DP` table of timings or operation counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Row>,
}

impl Table {
    pub fn header() -> String {
        let mut header = String::from("N");
        for strategy in Strategy::ALL {
            header.push(',');
            header.push_str(strategy.column());
        }
        header
    }

    pub fn to_csv(&self) -> String {
        let mut out = Self::header();
        out.push('\n');
        for row in &self.rows {
            out.push_str(&format!(
                "{},{},{},{}\n",
                row.n, row.iterative, row.recursive, row.dp
            ));
        }
        out
    }

    pub fn parse_csv(raw: &str) -> Result<Self> {
        let mut lines = raw.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
        match lines.next() {
            Some((_, header)) if header.trim() == Self::header() => {}
            Some((_, header)) => {
                return Err(BenchError::Table(format!("unexpected header `{header}`")))
            }
            None => return Err(BenchError::Table("empty table".into())),
        }

        let mut rows = Vec::new();
        for (idx, line) in lines {
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() != 4 {
                return Err(BenchError::Table(format!(
                    "line {}: expected 4 fields, found {}",
                    idx + 1,
                    fields.len()
                )));
            }
            let n = fields[0].trim().parse::<u32>().map_err(|err| {
                BenchError::Table(format!("line {}: invalid N `{}`: {err}", idx + 1, fields[0]))
            })?;
            let cell = |raw: &str| {
                raw.parse::<Cell>()
                    .map_err(|err| BenchError::Table(format!("line {}: {err}", idx + 1)))
            };
            rows.push(Row {
                n,
                iterative: cell(fields[1])?,
                recursive: cell(fields[2])?,
                dp: cell(fields[3])?,
            });
        }
        Ok(Self { rows })
    }

    /// `(n, value)` pairs for one column, skipping sentinels.
    pub fn series(&self, strategy: Strategy) -> Vec<(u32, f64)> {
        self.rows
            .iter()
            .filter_map(|row| row.get(strategy).as_f64().map(|v| (row.n, v)))
            .collect()
    }

    pub async fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|err| {
                BenchError::Storage(format!("failed creating `{}`: {err}", parent.display()))
            })?;
        }
        fs::write(path, self.to_csv())
            .await
            .map_err(|err| BenchError::Storage(format!("failed writing `{}`: {err}", path.display())))
    }

    pub async fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .await
            .map_err(|err| BenchError::Storage(format!("failed reading `{}`: {err}", path.display())))?;
        Self::parse_csv(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Table {
        Table {
            rows: vec![
                Row {
                    n: 1,
                    iterative: Cell::Seconds(0.000001),
                    recursive: Cell::Seconds(0.000002),
                    dp: Cell::Seconds(0.000003),
                },
                Row {
                    n: 40,
                    iterative: Cell::Seconds(0.000004),
                    recursive: Cell::Timeout,
                    dp: Cell::Error,
                },
            ],
        }
    }

    #[test]
    fn writes_header_and_sentinels() {
        let csv = sample().to_csv();
        assert_eq!(
            csv,
            "N,Iterative,Recursive,DP\n1,0.000001,0.000002,0.000003\n40,0.000004,TIMEOUT,ERROR\n"
        );
    }

    #[test]
    fn integer_cells_parse_as_counts() {
        let table = Table::parse_csv("N,Iterative,Recursive,DP\n5,3,4,5\n").unwrap();
        assert_eq!(table.rows[0].iterative, Cell::Count(3));
        assert_eq!(table.series(Strategy::Memoized), vec![(5, 5.0)]);
    }

    #[test]
    fn series_skips_sentinels() {
        let table = sample();
        assert_eq!(table.series(Strategy::Recursive), vec![(1, 0.000002)]);
        assert!(table.series(Strategy::Memoized).len() == 1);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Table::parse_csv("").is_err());
        assert!(Table::parse_csv("a,b\n").is_err());
        assert!(Table::parse_csv("N,Iterative,Recursive,DP\n1,2,3\n").is_err());
        assert!(Table::parse_csv("N,Iterative,Recursive,DP\n1,2,3,N/A\n").is_err());
        assert!(Table::parse_csv("N,Iterative,Recursive,DP\n1,-0.5,3,4\n").is_err());
    }

    #[tokio::test]
    async fn survives_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("timings_fib_rust.csv");
        let table = sample();
        table.write(&path).await.unwrap();
        let loaded = Table::read(&path).await.unwrap();
        assert_eq!(loaded, table);
    }
}
