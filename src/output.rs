//! Flat text output of selected simpoints and their weights.
//!
//! Both files contain one line per cluster in ascending cluster order: the `simpoints` file holds
//! `<interval index> <cluster>` and the `weights` file holds `<weight> <cluster>`.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use crate::simpoint::Simpoint;

/// Name of the file listing the representative interval for each cluster.
pub const SIMPOINTS_FILE: &str = "simpoints";
/// Name of the file listing the weight of each cluster.
pub const WEIGHTS_FILE: &str = "weights";

/// Write `<index> <cluster>` lines for each simpoint.
pub fn write_simpoints(out: &mut impl Write, simpoints: &[Simpoint]) -> io::Result<()> {
    for s in simpoints.iter() {
        writeln!(out, "{} {}", s.index, s.cluster)?;
    }
    Ok(())
}

/// Write `<weight> <cluster>` lines for each simpoint.
pub fn write_weights(out: &mut impl Write, simpoints: &[Simpoint]) -> io::Result<()> {
    for s in simpoints.iter() {
        writeln!(out, "{} {}", format_general(s.weight), s.cluster)?;
    }
    Ok(())
}

/// Write the `simpoints` and `weights` files into `dir`.
pub fn write_files(dir: &Path, simpoints: &[Simpoint]) -> io::Result<()> {
    let mut sorted = simpoints.to_vec();
    sorted.sort_by_key(|s| s.cluster);
    let mut out = BufWriter::new(File::create(dir.join(SIMPOINTS_FILE))?);
    write_simpoints(&mut out, &sorted)?;
    out.flush()?;

    let mut out = BufWriter::new(File::create(dir.join(WEIGHTS_FILE))?);
    write_weights(&mut out, &sorted)?;
    out.flush()?;
    Ok(())
}

/// Format `value` like printf `%g`: six significant digits, trailing zeros removed, and scientific
/// notation for very small or large magnitudes.
pub fn format_general(value: f64) -> String {
    const PRECISION: i32 = 6;
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }

    // Round to the target precision first; this may carry into the next exponent.
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let (mantissa, exponent) = sci.split_once('e').expect("exponent");
    let exponent: i32 = exponent.parse().expect("integer exponent");
    if exponent < -4 || exponent >= PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.abs()
        )
    } else {
        let fixed = format!("{:.*}", (PRECISION - 1 - exponent) as usize, value);
        trim_fraction(&fixed).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
