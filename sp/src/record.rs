use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    num::NonZero,
    path::PathBuf,
};

use clap::Args;
use simpoint::{bbv::BbvRecorder, Error};
use tracing::info;

#[derive(Args)]
pub struct RecordArgs {
    /// Basic block trace with one `<pc> <block size> <instruction count>` line per executed
    /// block. The pc may be decimal or `0x` prefixed hex.
    trace: PathBuf,
    /// Number of instructions in each interval.
    #[arg(short, long, default_value_t = NonZero::new(10_000_000).unwrap())]
    interval: NonZero<u64>,
    /// Output BBV file.
    #[arg(short, long)]
    output: PathBuf,
}

pub fn record(args: RecordArgs) -> io::Result<()> {
    let recorder = record_trace(BufReader::new(File::open(&args.trace)?), args.interval)?;
    let mut out = BufWriter::new(File::create(&args.output)?);
    recorder.write_to(&mut out)?;
    out.flush()?;
    info!(
        "wrote {} intervals to {}",
        recorder.len(),
        args.output.display()
    );
    Ok(())
}

/// Feed every trace record in `reader` to a new recorder. Blank lines and `#` comments are
/// skipped.
fn record_trace(reader: impl BufRead, interval: NonZero<u64>) -> Result<BbvRecorder, Error> {
    let mut recorder = BbvRecorder::new(interval);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (pc, block_size, icount) = parse_trace_line(line).ok_or_else(|| {
            Error::InvalidArgument(format!("malformed trace line {}: {line}", lineno + 1))
        })?;
        recorder.add_sample(pc, block_size);
        recorder.next_sample(icount);
    }
    Ok(recorder)
}

fn parse_trace_line(line: &str) -> Option<(u64, u64, u64)> {
    let mut fields = line.split_whitespace();
    let pc = fields.next()?;
    let pc = match pc.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok()?,
        None => pc.parse().ok()?,
    };
    let block_size = fields.next()?.parse().ok()?;
    let icount = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some((pc, block_size, icount))
}

#[cfg(test)]
mod test {
    use std::num::NonZero;

    use simpoint::bbv::VectorSet;

    use super::{parse_trace_line, record_trace};

    #[test]
    fn parse_lines() {
        assert_eq!(parse_trace_line("0x1000 4 4"), Some((0x1000, 4, 4)));
        assert_eq!(parse_trace_line("4096 4 8"), Some((4096, 4, 8)));
        assert_eq!(parse_trace_line("0x1000 4"), None);
        assert_eq!(parse_trace_line("0x1000 4 8 extra"), None);
        assert_eq!(parse_trace_line("pc 4 8"), None);
    }

    #[test]
    fn trace_to_vectors() {
        let trace = "# pc size icount\n0x100 2 2\n0x200 2 4\n\n0x100 4 8\n0x300 4 12\n";
        let recorder = record_trace(trace.as_bytes(), NonZero::new(4).unwrap()).unwrap();
        let mut out = vec![];
        recorder.write_to(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out.clone()).unwrap(),
            "T:1:2 :2:2 \nT:1:4 \nT:3:4 \nT\n"
        );
        let set = VectorSet::from_reader(out.as_slice()).unwrap();
        assert_eq!(set.len(), 4);
        assert!(set[3].is_degenerate());
    }

    #[test]
    fn malformed_line() {
        let err = record_trace("0x100 2\n".as_bytes(), NonZero::new(4).unwrap()).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
