//! Loaders for the tabular network inputs.
//!
//! Everything stringly-typed lives here: complex-literal parsing (including
//! decimal commas and `j` suffixes from spreadsheet exports), the CSV table
//! loaders and the JSON network-file format. The solvers and the
//! post-processor only ever see numeric data.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use csv::ReaderBuilder;
use nalgebra::DMatrix;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{PowerFlowError, Result};
use crate::model::{Branch, Bus, BusKind, Network};

/// Parses a spreadsheet-grade complex literal.
///
/// Accepts `a+bi` and `a+bj` forms, decimal commas, stray whitespace and the
/// usual empty-cell spellings (``, `nan`, `None`), which all map to zero.
pub fn parse_complex(raw: &str) -> Result<Complex64> {
    let s: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            ',' => '.',
            'j' | 'J' => 'i',
            c => c,
        })
        .collect();
    if s.is_empty() || s == "nan" || s == "NaN" || s == "None" {
        return Ok(Complex64::new(0.0, 0.0));
    }
    Complex64::from_str(&s).map_err(|_| PowerFlowError::InvalidComplex(raw.to_string()))
}

/// One row of the bus table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusRecord {
    pub bus: usize,
    /// Bus type code: 1 = slack, 0 = PQ, 2 = PV.
    #[serde(rename = "type")]
    pub kind: i64,
    pub vm_pu: f64,
    pub gen_mw: f64,
    pub gen_mvar: f64,
    pub load_mw: f64,
    pub load_mvar: f64,
}

impl TryFrom<BusRecord> for Bus {
    type Error = PowerFlowError;

    fn try_from(rec: BusRecord) -> Result<Bus> {
        Ok(Bus {
            index: rec.bus,
            kind: BusKind::from_code(rec.kind)?,
            vm_pu: rec.vm_pu,
            gen_mw: rec.gen_mw,
            gen_mvar: rec.gen_mvar,
            load_mw: rec.load_mw,
            load_mvar: rec.load_mvar,
        })
    }
}

/// One row of the branch (impedance) table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchRecord {
    pub from: usize,
    pub to: usize,
    pub resistance: f64,
    pub reactance: f64,
}

impl From<BranchRecord> for Branch {
    fn from(rec: BranchRecord) -> Branch {
        Branch {
            from: rec.from,
            to: rec.to,
            resistance: rec.resistance,
            reactance: rec.reactance,
        }
    }
}

/// Reads the admittance matrix from CSV: a leading bus-label column followed
/// by one column of complex literals per bus.
pub fn admittance_from_reader<R: std::io::Read>(rdr: R) -> Result<DMatrix<Complex64>> {
    let mut reader = ReaderBuilder::new().from_reader(rdr);
    let mut cells: Vec<Complex64> = Vec::new();
    let mut rows = 0usize;
    let mut cols = 0usize;
    for record in reader.records() {
        let record = record?;
        let row: Vec<Complex64> = record
            .iter()
            .skip(1) // bus label column
            .map(parse_complex)
            .collect::<Result<_>>()?;
        if rows == 0 {
            cols = row.len();
        }
        rows += 1;
        cells.extend(row);
    }
    Ok(DMatrix::from_row_iterator(rows, cols, cells))
}

/// Reads the admittance matrix from a CSV file.
pub fn admittance_from_csv<P: AsRef<Path>>(path: P) -> Result<DMatrix<Complex64>> {
    admittance_from_reader(fs::File::open(path)?)
}

/// Reads the bus table from CSV.
pub fn buses_from_reader<R: std::io::Read>(rdr: R) -> Result<Vec<Bus>> {
    let mut reader = ReaderBuilder::new().from_reader(rdr);
    reader
        .deserialize()
        .map(|rec| {
            let rec: BusRecord = rec?;
            Bus::try_from(rec)
        })
        .collect()
}

/// Reads the bus table from a CSV file.
pub fn buses_from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Bus>> {
    buses_from_reader(fs::File::open(path)?)
}

/// Reads the branch table from CSV.
pub fn branches_from_reader<R: std::io::Read>(rdr: R) -> Result<Vec<Branch>> {
    let mut reader = ReaderBuilder::new().from_reader(rdr);
    reader
        .deserialize()
        .map(|rec| {
            let rec: BranchRecord = rec?;
            Ok(Branch::from(rec))
        })
        .collect()
}

/// Reads the branch table from a CSV file.
pub fn branches_from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Branch>> {
    branches_from_reader(fs::File::open(path)?)
}

/// JSON network-file format: bus and branch tables plus an optional explicit
/// admittance matrix as rows of complex literals. When the matrix is absent
/// it is assembled from the branch impedances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkFile {
    pub sn_mva: f64,
    pub bus: Vec<BusRecord>,
    pub branch: Vec<BranchRecord>,
    #[serde(default)]
    pub y_bus: Option<Vec<Vec<String>>>,
}

impl TryFrom<NetworkFile> for Network {
    type Error = PowerFlowError;

    fn try_from(file: NetworkFile) -> Result<Network> {
        let buses: Vec<Bus> = file
            .bus
            .into_iter()
            .map(Bus::try_from)
            .collect::<Result<_>>()?;
        let branches: Vec<Branch> = file.branch.into_iter().map(Branch::from).collect();
        match file.y_bus {
            Some(rows) => {
                // Every row must make the matrix square; a jagged row would
                // otherwise misalign everything behind it.
                let n = rows.len();
                for row in &rows {
                    if row.len() != n {
                        return Err(PowerFlowError::ShapeMismatch {
                            rows: n,
                            cols: row.len(),
                            buses: buses.len(),
                        });
                    }
                }
                let cells: Vec<Complex64> = rows
                    .iter()
                    .flatten()
                    .map(|s| parse_complex(s))
                    .collect::<Result<_>>()?;
                let net = Network {
                    s_base_mva: file.sn_mva,
                    y_bus: DMatrix::from_row_iterator(n, n, cells),
                    buses,
                    branches,
                };
                net.validate()?;
                Ok(net)
            }
            None => Network::from_branches(file.sn_mva, buses, branches),
        }
    }
}

/// Parses a JSON network file from a string.
pub fn network_from_json_str(json: &str) -> Result<Network> {
    let file: NetworkFile = serde_json::from_str(json)?;
    Network::try_from(file)
}

/// Loads a JSON network file from disk.
pub fn network_from_json<P: AsRef<Path>>(path: P) -> Result<Network> {
    network_from_json_str(&fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn parse_complex_accepts_spreadsheet_forms() {
        assert_eq!(parse_complex("1.5+0.3i").unwrap(), Complex64::new(1.5, 0.3));
        assert_eq!(parse_complex("1,5+0,3j").unwrap(), Complex64::new(1.5, 0.3));
        assert_eq!(parse_complex(" -10i ").unwrap(), Complex64::new(0.0, -10.0));
        assert_eq!(parse_complex("1.05").unwrap(), Complex64::new(1.05, 0.0));
        assert_eq!(parse_complex("").unwrap(), Complex64::new(0.0, 0.0));
        assert_eq!(parse_complex("nan").unwrap(), Complex64::new(0.0, 0.0));
        assert_eq!(parse_complex("None").unwrap(), Complex64::new(0.0, 0.0));
        assert!(matches!(
            parse_complex("garbage"),
            Err(PowerFlowError::InvalidComplex(_))
        ));
    }

    #[test]
    fn admittance_csv_round_trip() {
        let csv = "bus,1,2\n1,-10i,10i\n2,10i,-10i\n";
        let y = admittance_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(y.nrows(), 2);
        assert_eq!(y[(0, 0)], Complex64::new(0.0, -10.0));
        assert_eq!(y[(0, 1)], Complex64::new(0.0, 10.0));
    }

    #[test]
    fn bus_csv_decodes_types() {
        let csv = "bus,type,vm_pu,gen_mw,gen_mvar,load_mw,load_mvar\n\
                   1,1,1.02,0,0,0,0\n\
                   2,2,1.01,50,0,20,10\n\
                   3,0,1.0,0,0,45,15\n";
        let buses = buses_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(buses.len(), 3);
        assert_eq!(buses[0].kind, BusKind::Slack);
        assert_eq!(buses[1].kind, BusKind::Pv);
        assert_eq!(buses[2].kind, BusKind::Pq);
        assert_abs_diff_eq!(buses[1].gen_mw, 50.0);
    }

    #[test]
    fn bus_csv_rejects_unknown_type_code() {
        let csv = "bus,type,vm_pu,gen_mw,gen_mvar,load_mw,load_mvar\n1,9,1.0,0,0,0,0\n";
        assert!(matches!(
            buses_from_reader(csv.as_bytes()),
            Err(PowerFlowError::UnknownBusType(9))
        ));
    }

    #[test]
    fn branch_csv_loads() {
        let csv = "from,to,resistance,reactance\n1,2,0.02,0.06\n2,3,0.05,0.1\n";
        let branches = branches_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(branches.len(), 2);
        assert_abs_diff_eq!(branches[1].reactance, 0.1);
    }

    #[test]
    fn network_file_with_explicit_y_bus() {
        let net = crate::testcases::case2_lossless();
        assert_eq!(net.n_buses(), 2);
        assert_eq!(net.y_bus[(0, 0)], Complex64::new(0.0, -10.0));
        assert_eq!(net.y_bus[(1, 0)], Complex64::new(0.0, 10.0));
    }

    #[test]
    fn network_file_rejects_jagged_y_bus() {
        let json = r#"{
          "sn_mva": 100.0,
          "bus": [
            { "bus": 1, "type": 1, "vm_pu": 1.0, "gen_mw": 0.0, "gen_mvar": 0.0, "load_mw": 0.0,  "load_mvar": 0.0 },
            { "bus": 2, "type": 0, "vm_pu": 1.0, "gen_mw": 0.0, "gen_mvar": 0.0, "load_mw": 30.0, "load_mvar": 10.0 }
          ],
          "branch": [
            { "from": 1, "to": 2, "resistance": 0.0, "reactance": 0.1 }
          ],
          "y_bus": [
            ["-10i", "10i"],
            ["10i"]
          ]
        }"#;
        assert!(matches!(
            network_from_json_str(json),
            Err(PowerFlowError::ShapeMismatch {
                rows: 2,
                cols: 1,
                buses: 2
            })
        ));
    }

    #[test]
    fn network_file_builds_y_bus_from_branches() {
        let net = crate::testcases::case4();
        assert_eq!(net.n_buses(), 4);
        // 1/(0.02+0.06i) = 5-15i, so the 1-2 mutual admittance is -5+15i.
        assert_abs_diff_eq!(net.y_bus[(0, 1)].re, -5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(net.y_bus[(0, 1)].im, 15.0, epsilon = 1e-12);
    }
}
