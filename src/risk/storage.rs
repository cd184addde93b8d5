//! Flat CSV risk tables.
//!
//! Each dimension is stored as `<root>/<system>/<system> <label> Risks.csv`
//! with one row per risk:
//!
//! ```text
//! ,Minimum Schedule Impact,Maximum Schedule Impact,Most Likely Schedule Impact
//! Valve leak,0,1,0.5
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use csv::{Reader, StringRecord, Writer};

use crate::error::{IsstError, IsstResult};
use crate::risk::model::{Dimension, DesignSystem, TriangularEstimate};

/// Column headers `[minimum, maximum, most likely]` for a dimension label.
#[must_use]
pub fn impact_columns(label: &str) -> [String; 3] {
    [
        format!("Minimum {label} Impact"),
        format!("Maximum {label} Impact"),
        format!("Most Likely {label} Impact"),
    ]
}

impl DesignSystem {
    /// Directory holding this system's risk tables.
    #[must_use]
    pub fn table_directory(&self, root: &Path) -> PathBuf {
        root.join(self.name())
    }

    /// CSV file for one dimension.
    #[must_use]
    pub fn table_path(&self, root: &Path, dimension: &Dimension) -> PathBuf {
        self.table_directory(root)
            .join(format!("{} {} Risks.csv", self.name(), dimension.label()))
    }

    /// Write every dimension's current estimates under `root`.
    ///
    /// Creates the system directory if needed and overwrites existing
    /// tables. Returns the directory written.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Csv` if a file cannot be written.
    pub fn generate_system_specification(&self, root: &Path) -> IsstResult<PathBuf> {
        let directory = self.table_directory(root);
        std::fs::create_dir_all(&directory)?;

        for dimension in self.dimensions() {
            let path = self.table_path(root, &dimension);
            let mut wtr = Writer::from_path(&path)?;

            let [min_col, max_col, ml_col] = impact_columns(dimension.label());
            wtr.write_record(["", min_col.as_str(), max_col.as_str(), ml_col.as_str()])?;
            for risk in self.risks() {
                let estimate = risk.estimate(&dimension).copied().unwrap_or_default();
                wtr.write_record([
                    risk.name.clone(),
                    estimate.minimum.to_string(),
                    estimate.maximum.to_string(),
                    estimate.most_likely.to_string(),
                ])?;
            }
            wtr.flush()?;
            tracing::debug!(path = %path.display(), risks = self.risks().len(), "wrote risk table");
        }

        tracing::info!(
            system = self.name(),
            directory = %directory.display(),
            "generated risk tables"
        );
        Ok(directory)
    }

    /// Update every risk's estimates from the tables under `root`.
    ///
    /// All tables are read before any risk is modified, so a failed read
    /// leaves the system unchanged. Rows for unknown risks are ignored.
    ///
    /// # Errors
    ///
    /// - `MissingDirectory` / `MissingFile` if a table is absent
    /// - `RiskTable` if a required column is absent or a risk has two rows
    /// - `MissingRisk` if a risk has no row
    /// - `Csv` if a value is not a number
    pub fn read_system_specification(&mut self, root: &Path) -> IsstResult<()> {
        let directory = self.table_directory(root);
        if !directory.is_dir() {
            return Err(IsstError::MissingDirectory { path: directory });
        }

        let mut updates = Vec::new();
        for dimension in self.dimensions() {
            let path = self.table_path(root, &dimension);
            let rows = read_table(&path, dimension.label())?;
            for risk in self.risks() {
                let estimate = rows.get(&risk.name).copied().ok_or_else(|| {
                    IsstError::MissingRisk {
                        risk: risk.name.clone(),
                        path: path.clone(),
                    }
                })?;
                updates.push((dimension.clone(), estimate));
            }
            let unknown = rows
                .keys()
                .filter(|name| !self.risks().iter().any(|r| &&r.name == name))
                .count();
            if unknown > 0 {
                tracing::warn!(path = %path.display(), unknown, "ignoring rows for unknown risks");
            }
        }

        let per_dimension = self.risks().len();
        if per_dimension > 0 {
            for chunk in updates.chunks(per_dimension) {
                for (risk, (dimension, estimate)) in self.risks_mut().iter_mut().zip(chunk) {
                    if let Some(slot) = risk.estimate_mut(dimension) {
                        *slot = *estimate;
                    }
                }
            }
        }

        tracing::info!(system = self.name(), directory = %directory.display(), "read risk tables");
        Ok(())
    }
}

/// Read one table into `risk name -> estimate`.
fn read_table(path: &Path, label: &str) -> IsstResult<HashMap<String, TriangularEstimate>> {
    if !path.is_file() {
        return Err(IsstError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let mut rdr = Reader::from_path(path)?;
    let headers = rdr.headers()?.clone();

    let columns = impact_columns(label);
    let mut indices = [0usize; 3];
    for (slot, column) in indices.iter_mut().zip(&columns) {
        *slot = headers.iter().position(|h| h == column.as_str()).ok_or_else(|| {
            IsstError::risk_table(format!("{} has no column '{column}'", path.display()))
        })?;
    }

    let mut rows = HashMap::new();
    for record in rdr.records() {
        let record = record?;
        let name = record.get(0).unwrap_or_default().to_string();
        let values: StringRecord = indices
            .iter()
            .map(|&i| record.get(i).unwrap_or_default())
            .collect();
        let (minimum, maximum, most_likely): (f64, f64, f64) = values.deserialize(None)?;
        match rows.entry(name) {
            Entry::Occupied(entry) => {
                return Err(IsstError::risk_table(format!(
                    "{} has more than one row for risk '{}'",
                    path.display(),
                    entry.key()
                )));
            }
            Entry::Vacant(entry) => {
                entry.insert(TriangularEstimate {
                    minimum,
                    maximum,
                    most_likely,
                });
            }
        }
    }
    Ok(rows)
}
