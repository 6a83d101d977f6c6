// src/output.rs
use crate::mc::stats::{DrawProvenance, EstimatorResult};
use ndarray::ArrayView2;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};

fn provenance_label(provenance: &DrawProvenance) -> String {
    match provenance {
        DrawProvenance::Seeded {
            seed,
            first_stream,
            streams,
        } => format!("seed={} streams={}..{}", seed, first_stream, first_stream + streams),
        DrawProvenance::Sobol { first_index, points } => {
            format!("sobol={}..{}", first_index, first_index + points)
        }
        DrawProvenance::Deterministic => "deterministic".to_string(),
    }
}

/// One row per estimator: estimate, standard error and the error against `reference`
pub fn write_estimates_to_csv(
    filename: &str,
    reference: f64,
    rows: &[(&str, EstimatorResult)],
) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(filename)?);
    writeln!(file, "method,estimate,std_error,abs_error,samples,short_circuit,provenance")?;
    for (name, result) in rows {
        let se = result
            .std_error
            .map(|se| se.to_string())
            .unwrap_or_default();
        writeln!(
            file,
            "{},{},{},{},{},{},{}",
            name,
            result.estimate,
            se,
            (result.estimate - reference).abs(),
            result.samples,
            result.short_circuit,
            provenance_label(&result.provenance)
        )?;
    }
    file.flush()
}

/// Simulated paths in long form, one row per path and time index
pub fn write_paths_to_csv(filename: &str, paths: ArrayView2<'_, f64>) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(filename)?);
    writeln!(file, "path_id,step,value")?;
    for (i, row) in paths.rows().into_iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            writeln!(file, "{},{},{}", i, j, value)?;
        }
    }
    file.flush()
}

pub fn write_summary_to_csv(filename: &str, summary_data: &[(&str, String)]) -> io::Result<()> {
    let mut file = File::create(filename)?;
    for (key, value) in summary_data {
        writeln!(file, "{},{}", key, value)?;
    }
    Ok(())
}

/// Any serializable report as pretty-printed JSON
pub fn write_json_report<T: Serialize>(filename: &str, report: &T) -> io::Result<()> {
    let file = BufWriter::new(File::create(filename)?);
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}
