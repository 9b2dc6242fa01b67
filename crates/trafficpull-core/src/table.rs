use crate::error::CoreError;

/// A small text table: named columns and rows of string cells.
///
/// Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl NormalizedTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<(), CoreError> {
        if row.len() != self.columns.len() {
            return Err(CoreError::RowWidth {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| r[idx].as_str())
    }

    /// Rename columns by `(from, to)` pairs; unknown names are ignored.
    pub fn rename_columns(&mut self, mapping: &[(&str, &str)]) {
        for column in &mut self.columns {
            if let Some((_, to)) = mapping.iter().find(|(from, _)| column == from) {
                *column = (*to).to_string();
            }
        }
    }

    /// Set `name` to `value` on every row, appending the column if absent.
    pub fn with_constant_column(mut self, name: &str, value: &str) -> Self {
        match self.column_index(name) {
            Some(idx) => {
                for row in &mut self.rows {
                    row[idx] = value.to_string();
                }
            }
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(value.to_string());
                }
            }
        }
        self
    }

    /// Left join on a single key column.
    ///
    /// Every left row is kept. Right columns (minus the key, and minus any
    /// name the left side already has) are appended; a left row with no
    /// match gets `fill` in those cells. A left row matching several right
    /// rows is repeated once per match.
    pub fn left_join(&self, right: &NormalizedTable, on: &str, fill: &str) -> NormalizedTable {
        let left_key = self.column_index(on);
        let right_key = right.column_index(on);
        let carried: Vec<usize> = right
            .columns
            .iter()
            .enumerate()
            .filter(|(i, name)| Some(*i) != right_key && self.column_index(name).is_none())
            .map(|(i, _)| i)
            .collect();

        let mut columns = self.columns.clone();
        columns.extend(carried.iter().map(|&i| right.columns[i].clone()));
        let mut joined = NormalizedTable::new(columns);

        for left_row in &self.rows {
            let key = left_key.map(|i| left_row[i].as_str());
            let matches: Vec<&Vec<String>> = match (key, right_key) {
                (Some(key), Some(rk)) => right.rows.iter().filter(|r| r[rk] == key).collect(),
                _ => Vec::new(),
            };

            if matches.is_empty() {
                let mut row = left_row.clone();
                row.extend(carried.iter().map(|_| fill.to_string()));
                joined.rows.push(row);
            } else {
                for right_row in matches {
                    let mut row = left_row.clone();
                    row.extend(carried.iter().map(|&i| right_row[i].clone()));
                    joined.rows.push(row);
                }
            }
        }
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> NormalizedTable {
        let mut t = NormalizedTable::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            t.push_row(row.iter().map(|c| c.to_string()).collect())
                .expect("row width");
        }
        t
    }

    #[test]
    fn push_row_rejects_wrong_width() {
        let mut t = table(&["a", "b"], &[]);
        assert!(t.push_row(vec!["1".to_string()]).is_err());
        assert!(t.is_empty());
    }

    #[test]
    fn rename_leaves_unknown_columns() {
        let mut t = table(&["ga:users", "ga:sessions", "x"], &[]);
        t.rename_columns(&[("ga:users", "totalUsers"), ("ga:sessions", "totalSessions")]);
        assert_eq!(t.columns(), ["totalUsers", "totalSessions", "x"]);
    }

    #[test]
    fn constant_column_on_empty_table_adds_header_only() {
        let t = table(&["u"], &[]).with_constant_column("month", "2019-01-01");
        assert_eq!(t.columns(), ["u", "month"]);
        assert_eq!(t.row_count(), 0);
    }

    #[test]
    fn left_join_fills_unmatched_right_columns() {
        let left = table(&["u", "month"], &[&["100", "2019-01-01"]]);
        let right = table(&["o", "month"], &[]);
        let joined = left.left_join(&right, "month", "0");
        assert_eq!(joined.columns(), ["u", "month", "o"]);
        assert_eq!(joined.rows(), [vec!["100", "2019-01-01", "0"]]);
    }

    #[test]
    fn left_join_matches_on_key() {
        let left = table(&["u", "month"], &[&["100", "2019-01-01"], &["7", "2019-02-01"]]);
        let right = table(&["month", "o"], &[&["2019-02-01", "3"]]);
        let joined = left.left_join(&right, "month", "0");
        assert_eq!(joined.get(0, "o"), Some("0"));
        assert_eq!(joined.get(1, "o"), Some("3"));
    }

    #[test]
    fn left_join_fans_out_on_duplicate_keys() {
        let left = table(&["u", "month"], &[&["1", "m"]]);
        let right = table(&["o", "month"], &[&["2", "m"], &["3", "m"]]);
        assert_eq!(left.left_join(&right, "month", "0").row_count(), 2);
    }

    #[test]
    fn left_join_without_right_key_fills() {
        let left = table(&["u", "month"], &[&["1", "m"]]);
        let right = table(&[], &[]).with_constant_column("month", "m");
        let joined = left.left_join(&right, "month", "0");
        assert_eq!(joined.columns(), ["u", "month"]);
        assert_eq!(joined.row_count(), 1);
    }
}
