//! SVG to PNG and PDF conversion.

use std::sync::{Arc, OnceLock};

use resvg::{
    tiny_skia::{Pixmap, Transform},
    usvg::{self, fontdb},
};

use super::PlotError;

fn fonts() -> Arc<fontdb::Database> {
    static FONTS: OnceLock<Arc<fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = fontdb::Database::new();
            db.load_system_fonts();
            Arc::new(db)
        })
        .clone()
}

fn parse_tree(svg: &str) -> Result<usvg::Tree, PlotError> {
    let options = usvg::Options {
        fontdb: fonts(),
        ..Default::default()
    };
    usvg::Tree::from_str(svg, &options).map_err(|err| PlotError::Svg(err.to_string()))
}

/// Rasterizes to exactly `width_px x height_px`.
pub fn png(svg: &str, width_px: u32, height_px: u32) -> Result<Vec<u8>, PlotError> {
    let tree = parse_tree(svg)?;
    let size = tree.size();
    let mut pixmap = Pixmap::new(width_px, height_px).ok_or_else(|| {
        PlotError::Raster(format!("failed to allocate {width_px}x{height_px} surface"))
    })?;
    let transform = Transform::from_scale(
        width_px as f32 / size.width(),
        height_px as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());
    pixmap
        .encode_png()
        .map_err(|err| PlotError::Raster(format!("failed to encode PNG output: {err}")))
}

/// svg2pdf pins its own usvg release, so the tree is parsed through its
/// re-export.
pub fn pdf(svg: &str) -> Result<Vec<u8>, PlotError> {
    use svg2pdf::usvg as pdf_usvg;

    static PDF_FONTS: OnceLock<Arc<pdf_usvg::fontdb::Database>> = OnceLock::new();
    let fontdb = PDF_FONTS
        .get_or_init(|| {
            let mut db = pdf_usvg::fontdb::Database::new();
            db.load_system_fonts();
            Arc::new(db)
        })
        .clone();
    let options = pdf_usvg::Options {
        fontdb,
        ..Default::default()
    };
    let tree = pdf_usvg::Tree::from_str(svg, &options)
        .map_err(|err| PlotError::Svg(err.to_string()))?;
    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|err| PlotError::Pdf(err.to_string()))
}
