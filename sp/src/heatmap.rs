use std::{io, path::PathBuf};

use clap::Args;
use simpoint::{
    bbv::VectorSet,
    distance::{dissimilarity_matrix, Metric},
    heatmap::{heatmap_path, render_heatmap, HeatmapStyle},
};
use tracing::info;

use crate::ui::progress_bar;

#[derive(Args)]
pub struct HeatmapArgs {
    /// Input BBV file.
    input: PathBuf,
    /// Distance metric: dense_manhattan or sparse_symmetric.
    ///
    /// Both produce the same matrix; sparse_symmetric avoids materializing a dense matrix when
    /// block ids are large.
    #[arg(short, long, default_value_t = Metric::DenseManhattan)]
    metric: Metric,
    /// Output PDF path. Defaults to the input path with `.pdf` appended.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn heatmap(args: HeatmapArgs, quiet: bool) -> io::Result<()> {
    let style = HeatmapStyle::default();

    let vectors = VectorSet::read_path(&args.input)?;
    info!(
        "loaded {} vectors with {} unique blocks",
        vectors.len(),
        vectors.keys().len()
    );

    let progress = progress_bar(vectors.len(), "distances", quiet);
    let matrix = dissimilarity_matrix(&vectors, args.metric, || progress.inc(1))?;
    progress.finish_using_style();

    let output = args.output.unwrap_or_else(|| heatmap_path(&args.input));
    render_heatmap(&matrix, &output, &style)?;
    info!("wrote heatmap to {}", output.display());
    Ok(())
}

#[cfg(test)]
mod test {
    use std::fs;

    use simpoint::distance::Metric;

    use super::{heatmap, HeatmapArgs};

    #[test]
    fn writes_pdf_next_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("run.bbv");
        fs::write(&input, "T :0:10 :1:10\nT :0:5 :1:15\nT :1:20\n").unwrap();
        for metric in Metric::all() {
            heatmap(
                HeatmapArgs {
                    input: input.clone(),
                    metric,
                    output: None,
                },
                true,
            )
            .unwrap();
            let pdf = fs::read(dir.path().join("run.bbv.pdf")).unwrap();
            assert!(pdf.starts_with(b"%PDF-"));
        }
    }

    #[test]
    fn dense_metric_rejects_huge_block_ids() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("run.bbv");
        fs::write(&input, "T :18446744073709551615:1\nT :1:1\n").unwrap();
        let err = heatmap(
            HeatmapArgs {
                input: input.clone(),
                metric: Metric::DenseManhattan,
                output: None,
            },
            true,
        )
        .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
        assert!(err.to_string().contains("sparse_symmetric"));
        assert!(!dir.path().join("run.bbv.pdf").exists());
    }
}
