use std::fmt;

use dmc_core::{DmcError, ErrorInfo};
use serde::{Deserialize, Serialize};

use crate::analysis::exact_magnetizations;
use crate::kernel::SimulationParams;

/// Parameters, counters and observables of one completed chain.
///
/// Field order matches the CSV column order, so `csv::Writer::serialize`
/// produces [`SimulationResult::CSV_HEADER`] followed by one record per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Inverse temperature.
    pub beta: f64,
    /// Spin of the leading segment when the chain started.
    pub initial_s0: i32,
    /// Longitudinal field.
    #[serde(rename = "H")]
    pub h: f64,
    /// Transverse field.
    #[serde(rename = "GAMMA")]
    pub gamma: f64,
    /// Transverse magnetization estimate.
    pub measured_sigmax: f64,
    /// Longitudinal magnetization estimate.
    pub measured_sigmaz: f64,
    /// Number of post-thermalization samples.
    #[serde(rename = "N_measures")]
    pub n_measures: u64,
    /// Spin flips attempted.
    #[serde(rename = "N_attempted_flips")]
    pub n_attempted_flips: u64,
    /// Spin flips accepted.
    #[serde(rename = "N_accepted_flips")]
    pub n_accepted_flips: u64,
    /// Segment insertions attempted.
    #[serde(rename = "N_attempted_addsegment")]
    pub n_attempted_addsegment: u64,
    /// Segment insertions accepted.
    #[serde(rename = "N_accepted_addsegment")]
    pub n_accepted_addsegment: u64,
    /// Segment removals attempted.
    #[serde(rename = "N_attempted_removesegment")]
    pub n_attempted_removesegment: u64,
    /// Segment removals accepted.
    #[serde(rename = "N_accepted_removesegment")]
    pub n_accepted_removesegment: u64,
    /// Largest diagram order seen while measuring.
    pub max_diagram_order: u64,
    /// Mean diagram order while measuring, truncated to an integer.
    pub avg_diagram_order: u64,
    /// Wall-clock duration of the Markov chain loop in nanoseconds.
    pub run_time: u64,
    /// Total number of chain steps.
    #[serde(rename = "N_total_steps")]
    pub n_total_steps: u64,
    /// Leading steps excluded from the statistics.
    #[serde(rename = "N_thermalization_steps")]
    pub n_thermalization_steps: u64,
    /// Seed of the update-kind stream.
    pub update_choice_seed: u64,
    /// Seed of the diagram proposal/acceptance stream.
    pub diagram_seed: u64,
}

impl SimulationResult {
    /// Column titles of the CSV report, in record order.
    pub const CSV_HEADER: &'static str = "beta,initial_s0,H,GAMMA,measured_sigmax,\
measured_sigmaz,N_measures,N_attempted_flips,N_accepted_flips,N_attempted_addsegment,\
N_accepted_addsegment,N_attempted_removesegment,N_accepted_removesegment,max_diagram_order,\
avg_diagram_order,run_time,N_total_steps,N_thermalization_steps,update_choice_seed,diagram_seed";

    /// Empty record carrying only the run inputs.
    pub fn from_params(params: &SimulationParams) -> Self {
        Self {
            beta: params.beta,
            initial_s0: params.initial_s0,
            h: params.h,
            gamma: params.gamma,
            measured_sigmax: 0.0,
            measured_sigmaz: 0.0,
            n_measures: 0,
            n_attempted_flips: 0,
            n_accepted_flips: 0,
            n_attempted_addsegment: 0,
            n_accepted_addsegment: 0,
            n_attempted_removesegment: 0,
            n_accepted_removesegment: 0,
            max_diagram_order: 0,
            avg_diagram_order: 0,
            run_time: 0,
            n_total_steps: params.n_total_steps,
            n_thermalization_steps: params.n_thermalization_steps,
            update_choice_seed: params.update_choice_seed,
            diagram_seed: params.diagram_seed,
        }
    }

    /// Renders the record as a single CSV line without trailing newline.
    pub fn to_csv_record(&self) -> Result<String, DmcError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.serialize(self).map_err(csv_error)?;
        let bytes = writer
            .into_inner()
            .map_err(|err| DmcError::Io(ErrorInfo::new("csv-flush", err.to_string())))?;
        let line = String::from_utf8(bytes)
            .map_err(|err| DmcError::Io(ErrorInfo::new("csv-utf8", err.to_string())))?;
        Ok(line.trim_end().to_string())
    }

    /// Fraction of accepted spin flips (0 when none were attempted).
    pub fn flip_acceptance(&self) -> f64 {
        rate(self.n_accepted_flips, self.n_attempted_flips)
    }

    /// Fraction of accepted segment insertions.
    pub fn add_acceptance(&self) -> f64 {
        rate(self.n_accepted_addsegment, self.n_attempted_addsegment)
    }

    /// Fraction of accepted segment removals.
    pub fn remove_acceptance(&self) -> f64 {
        rate(self.n_accepted_removesegment, self.n_attempted_removesegment)
    }
}

pub(crate) fn csv_error(err: csv::Error) -> DmcError {
    DmcError::Io(ErrorInfo::new("csv-write", err.to_string()))
}

fn rate(accepted: u64, attempted: u64) -> f64 {
    if attempted == 0 {
        0.0
    } else {
        accepted as f64 / attempted as f64
    }
}

fn relative_diff_percent(measured: f64, exact: f64) -> f64 {
    (measured - exact) / exact * 100.0
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (mz_exact, mx_exact) = exact_magnetizations(self.beta, self.h, self.gamma);

        writeln!(f, "Results:")?;
        writeln!(f)?;
        writeln!(f, "Parameters:")?;
        writeln!(f, "beta  : {}", self.beta)?;
        writeln!(f, "h     : {}", self.h)?;
        writeln!(f, "gamma : {}", self.gamma)?;
        writeln!(f)?;
        writeln!(f, "Measures:")?;
        writeln!(
            f,
            "sigma_z: {}.  exact mz: {}.  diff: {}%",
            self.measured_sigmaz,
            mz_exact,
            relative_diff_percent(self.measured_sigmaz, mz_exact)
        )?;
        writeln!(
            f,
            "sigma_x: {}.  exact mx: {}.  diff: {}%",
            self.measured_sigmax,
            mx_exact,
            relative_diff_percent(self.measured_sigmax, mx_exact)
        )?;
        writeln!(f)?;
        writeln!(f, "Statistics:")?;
        writeln!(
            f,
            "Accepted add   :  {}/{} = {}%",
            self.n_accepted_addsegment,
            self.n_attempted_addsegment,
            self.add_acceptance() * 100.0
        )?;
        writeln!(
            f,
            "Accepted remove:  {}/{} = {}%",
            self.n_accepted_removesegment,
            self.n_attempted_removesegment,
            self.remove_acceptance() * 100.0
        )?;
        writeln!(
            f,
            "Accepted flips :  {}/{} = {}%",
            self.n_accepted_flips,
            self.n_attempted_flips,
            self.flip_acceptance() * 100.0
        )?;
        writeln!(f, "Max order      :  {}", self.max_diagram_order)?;
        writeln!(f, "Average order  :  {}", self.avg_diagram_order)?;
        writeln!(f)?;
        writeln!(f, "Performance:")?;
        write!(
            f,
            "Run time:  {} seconds ({} ns per step)",
            self.run_time as f64 / 1e9,
            self.run_time.checked_div(self.n_total_steps).unwrap_or(0)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SimulationResult {
        let params = SimulationParams {
            beta: 1.0,
            initial_s0: 1,
            h: -0.5,
            gamma: 0.1,
            n_total_steps: 10,
            n_thermalization_steps: 2,
            update_choice_seed: 1111,
            diagram_seed: 2222,
        };
        let mut result = SimulationResult::from_params(&params);
        result.measured_sigmax = -0.25;
        result.measured_sigmaz = 0.5;
        result.n_measures = 8;
        result.n_attempted_flips = 4;
        result.n_accepted_flips = 1;
        result.run_time = 1000;
        result
    }

    #[test]
    fn csv_record_follows_header_order() {
        let record = sample().to_csv_record().unwrap();
        assert_eq!(
            record,
            "1.0,1,-0.5,0.1,-0.25,0.5,8,4,1,0,0,0,0,0,0,1000,10,2,1111,2222"
        );
        assert_eq!(
            SimulationResult::CSV_HEADER.split(',').count(),
            record.split(',').count()
        );
    }

    #[test]
    fn acceptance_rates_handle_zero_attempts() {
        let result = sample();
        assert_eq!(result.flip_acceptance(), 0.25);
        assert_eq!(result.add_acceptance(), 0.0);
    }

    #[test]
    fn summary_mentions_every_section() {
        let text = sample().to_string();
        for section in ["Parameters:", "Measures:", "Statistics:", "Performance:"] {
            assert!(text.contains(section), "missing {section}");
        }
        assert!(text.contains("(100 ns per step)"));
    }
}
