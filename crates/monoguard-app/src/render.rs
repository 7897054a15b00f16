//! Render use cases: markdown and GitHub annotations from in-memory reports.

use monoguard_render::RenderableReport;

pub fn render_markdown(report: &RenderableReport) -> String {
    monoguard_render::render_markdown(report)
}

/// GitHub caps annotations per step, so callers bound the output.
pub fn render_annotations(report: &RenderableReport, max: usize) -> Vec<String> {
    monoguard_render::render_github_annotations(report)
        .into_iter()
        .take(max)
        .collect()
}
