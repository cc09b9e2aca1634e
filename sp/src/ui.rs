use std::borrow::Cow;

use indicatif::{ProgressBar, ProgressFinish, ProgressStyle};

/// Progress bar over `len` items, or a hidden bar if `quiet` is set.
pub(crate) fn progress_bar(
    len: usize,
    message: impl Into<Cow<'static, str>>,
    quiet: bool,
) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    ProgressBar::new(len as u64)
        .with_style(
            ProgressStyle::default_bar()
                .template("{msg} {wide_bar} {pos:>8}/{len:>8} ETA: {eta_precise}")
                .expect("valid template"),
        )
        .with_finish(ProgressFinish::AndLeave)
        .with_message(message.into())
}
