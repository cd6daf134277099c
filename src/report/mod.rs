/// Artifact generation.
///
/// Submodules:
/// - `color` — the piecewise value→RGB ramp shared by heatmap and scale bar.
/// - `text` — the fixed-width RMOB text table exporter.
/// - `colorgramme` — the 700×220 composite chart renderer.

pub mod color;
pub mod colorgramme;
pub mod text;
