//! Console and CSV presentation of solved results.
//!
//! All formatting concerns live here: MW/MVAr scaling back from per-unit,
//! radian-to-degree conversion and fixed decimal precision. The solvers and
//! the post-processor deal in plain numeric aggregates only.

use std::fmt;
use std::io;

use nalgebra::DVector;
use num_complex::Complex64;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::error::Result;
use crate::flow::FlowReport;
use crate::model::Network;

/// A wrapper around a float that limits the number of decimal places when
/// printed.
#[derive(Clone, Copy, PartialEq, PartialOrd)]
struct Fixed {
    value: f64,
    precision: usize,
}

impl Fixed {
    fn new(value: f64, precision: usize) -> Self {
        Fixed { value, precision }
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1$}", self.value, self.precision)
    }
}

impl fmt::Debug for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1$}", self.value, self.precision)
    }
}

/// Table row for bus results.
#[derive(Debug, Tabled)]
#[allow(non_snake_case)]
struct BusResTable {
    Bus: usize,
    Vm_pu: Fixed,
    Va_deg: Fixed,
    P_gen_mw: Fixed,
    Q_gen_mvar: Fixed,
}

/// Table row for branch results.
#[derive(Debug, Tabled)]
#[allow(non_snake_case)]
struct BranchResTable {
    From: usize,
    To: usize,
    P_mw: Fixed,
    Q_mvar: Fixed,
    P_loss_mw: Fixed,
    Q_loss_mvar: Fixed,
}

/// Renders the per-bus result table (markdown style).
pub fn bus_table(net: &Network, v: &DVector<Complex64>, flows: &FlowReport) -> String {
    let rows = net.buses.iter().enumerate().map(|(i, bus)| BusResTable {
        Bus: bus.index,
        Vm_pu: Fixed::new(v[i].norm(), 4),
        Va_deg: Fixed::new(v[i].arg().to_degrees(), 4),
        P_gen_mw: Fixed::new(flows.p_generated[i] * net.s_base_mva, 2),
        Q_gen_mvar: Fixed::new(flows.q_generated[i] * net.s_base_mva, 2),
    });
    Table::new(rows).with(Style::markdown()).to_string()
}

/// Renders the per-branch flow and loss table (markdown style).
pub fn branch_table(net: &Network, flows: &FlowReport) -> String {
    let rows = flows.branches.iter().map(|b| BranchResTable {
        From: b.from,
        To: b.to,
        P_mw: Fixed::new(b.p_flow * net.s_base_mva, 2),
        Q_mvar: Fixed::new(b.q_flow * net.s_base_mva, 2),
        P_loss_mw: Fixed::new(b.p_loss * net.s_base_mva, 2),
        Q_loss_mvar: Fixed::new(b.q_loss * net.s_base_mva, 2),
    });
    Table::new(rows).with(Style::markdown()).to_string()
}

#[derive(Serialize)]
struct BusCsvRecord {
    bus: usize,
    vm_pu: f64,
    va_deg: f64,
    p_gen_mw: f64,
    q_gen_mvar: f64,
}

#[derive(Serialize)]
struct BranchCsvRecord {
    from: usize,
    to: usize,
    p_mw: f64,
    q_mvar: f64,
    p_loss_mw: f64,
    q_loss_mvar: f64,
}

/// Writes the per-bus results as CSV.
pub fn write_bus_csv<W: io::Write>(
    w: W,
    net: &Network,
    v: &DVector<Complex64>,
    flows: &FlowReport,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(w);
    for (i, bus) in net.buses.iter().enumerate() {
        writer.serialize(BusCsvRecord {
            bus: bus.index,
            vm_pu: v[i].norm(),
            va_deg: v[i].arg().to_degrees(),
            p_gen_mw: flows.p_generated[i] * net.s_base_mva,
            q_gen_mvar: flows.q_generated[i] * net.s_base_mva,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the per-branch flows and losses as CSV.
pub fn write_branch_csv<W: io::Write>(w: W, net: &Network, flows: &FlowReport) -> Result<()> {
    let mut writer = csv::Writer::from_writer(w);
    for b in &flows.branches {
        writer.serialize(BranchCsvRecord {
            from: b.from,
            to: b.to,
            p_mw: b.p_flow * net.s_base_mva,
            q_mvar: b.q_flow * net.s_base_mva,
            p_loss_mw: b.p_loss * net.s_base_mva,
            q_loss_mvar: b.q_loss * net.s_base_mva,
        })?;
    }
    writer.flush()?;
    Ok(())
}
