//! Raster (PNG) and vector (SVG) export of the ink layers

use std::fmt::Write as _;
use std::io::Cursor;
use std::time::{SystemTime, UNIX_EPOCH};

use calligraph_config::InkColor;
use calligraph_ipc::ExportKind;
use image::{ImageFormat, RgbaImage};
use tracing::info;

use crate::error::ExportError;
use crate::layers::LayerStack;

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// An encoded export ready to be handed to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub kind: ExportKind,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    pub fn mime_type(&self) -> &'static str {
        self.kind.mime_type()
    }
}

/// Milliseconds since the Unix epoch, 0 if the clock is before it
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// `<app>-art-<unix-ms>.<ext>`
pub fn export_filename(app_name: &str, kind: ExportKind, timestamp_ms: u64) -> String {
    format!("{}-art-{}.{}", app_name, timestamp_ms, kind.extension())
}

/// Encode text and drawing layers over an opaque background as PNG at native resolution
pub fn encode_png(layers: &LayerStack, background: InkColor) -> Result<Vec<u8>, ExportError> {
    if !layers.is_allocated() {
        return Err(ExportError::ResourceUnavailable);
    }
    let flat = layers.flatten_ink(background);
    let image = RgbaImage::from_raw(flat.width, flat.height, flat.to_rgba8())
        .ok_or(ExportError::EmptySurface)?;

    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    info!(
        "encode_png: {}x{} -> {} bytes",
        flat.width,
        flat.height,
        bytes.len()
    );
    Ok(bytes)
}

/// Build the SVG document: text-layer ellipses first, then drawing-layer ellipses,
/// in CSS pixels
pub fn encode_svg(layers: &LayerStack) -> Result<String, ExportError> {
    let Some(viewport) = layers.display().filter(|_| layers.is_allocated()) else {
        return Err(ExportError::ResourceUnavailable);
    };
    let scale = 1.0 / viewport.scale;
    let (width, height) = (viewport.width, viewport.height);

    let entries = layers.text.log.len() + layers.drawing.log.len();
    let mut svg = String::with_capacity(160 + entries * 120);
    // Writing to a String cannot fail
    let _ = writeln!(
        svg,
        r#"<svg xmlns="{SVG_NAMESPACE}" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    layers.text.log.write_svg(&mut svg, scale);
    layers.drawing.log.write_svg(&mut svg, scale);
    svg.push_str("</svg>\n");

    info!("encode_svg: {}x{} with {} ellipses", width, height, entries);
    Ok(svg)
}

/// Encode an export of the requested kind with a timestamped filename
pub fn export(
    layers: &LayerStack,
    kind: ExportKind,
    background: InkColor,
    app_name: &str,
) -> Result<ExportFile, ExportError> {
    let bytes = match kind {
        ExportKind::Png => encode_png(layers, background)?,
        ExportKind::Svg => encode_svg(layers)?.into_bytes(),
    };
    Ok(ExportFile {
        filename: export_filename(app_name, kind, unix_millis()),
        kind,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlendMode, StampPrimitive};
    use calligraph_config::DisplayConfig;
    use glam::Vec2;

    fn stamp(x: f32, y: f32, blend_mode: BlendMode) -> StampPrimitive {
        StampPrimitive {
            center: Vec2::new(x, y),
            radius_x: 4.0,
            radius_y: 2.0,
            rotation: 0.0,
            color: InkColor::BLACK,
            opacity: 1.0,
            glow: 0.0,
            blend_mode,
        }
    }

    fn layers(scale: f32) -> LayerStack {
        let mut layers = LayerStack::new();
        layers.resize(DisplayConfig::with_scale(50, 40, scale));
        layers
    }

    #[test]
    fn test_filename_pattern() {
        assert_eq!(
            export_filename("calligraph", ExportKind::Png, 1700000000123),
            "calligraph-art-1700000000123.png"
        );
        assert_eq!(
            export_filename("sumi", ExportKind::Svg, 5),
            "sumi-art-5.svg"
        );
    }

    #[test]
    fn test_unallocated_export_fails() {
        let layers = LayerStack::new();
        assert!(matches!(
            encode_png(&layers, InkColor::PAPER),
            Err(ExportError::ResourceUnavailable)
        ));
        assert!(matches!(
            encode_svg(&layers),
            Err(ExportError::ResourceUnavailable)
        ));
    }

    #[test]
    fn test_png_is_native_resolution_and_opaque() {
        let mut layers = layers(2.0);
        layers.drawing.stamp(&stamp(20.0, 20.0, BlendMode::Normal));
        let bytes = encode_png(&layers, InkColor::PAPER).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (100, 80));
        assert!(decoded.pixels().all(|p| p.0[3] == 255));
        assert_eq!(decoded.get_pixel(99, 79).0, [0xfd, 0xfb, 0xf7, 255]);
        assert_eq!(decoded.get_pixel(20, 20).0, [0x1a, 0x1a, 0x1a, 255]);
    }

    #[test]
    fn test_svg_orders_text_before_drawing_in_css_pixels() {
        let mut layers = layers(2.0);
        layers.drawing.stamp(&stamp(40.0, 40.0, BlendMode::Normal));
        layers.text.stamp(&stamp(10.0, 10.0, BlendMode::Normal));
        let svg = encode_svg(&layers).unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"width="50" height="40" viewBox="0 0 50 40""#));
        let text_at = svg.find(r#"cx="5.0""#).unwrap();
        let drawing_at = svg.find(r#"cx="20.0""#).unwrap();
        assert!(text_at < drawing_at);
        assert!(svg.contains(r#"rx="2.0" ry="1.0""#));
        assert_eq!(svg.matches("<ellipse").count(), 2);
    }

    #[test]
    fn test_eraser_absent_from_svg_but_clears_png() {
        let mut layers = layers(1.0);
        layers.drawing.stamp(&stamp(20.0, 20.0, BlendMode::Normal));
        for _ in 0..3 {
            layers.drawing.stamp(&stamp(20.0, 20.0, BlendMode::Erase));
        }
        let svg = encode_svg(&layers).unwrap();
        assert_eq!(svg.matches("<ellipse").count(), 1);

        let bytes = encode_png(&layers, InkColor::PAPER).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(20, 20).0, [0xfd, 0xfb, 0xf7, 255]);
    }

    #[test]
    fn test_export_wraps_kind() {
        let layers = layers(1.0);
        let file = export(&layers, ExportKind::Svg, InkColor::PAPER, "calligraph").unwrap();
        assert!(file.filename.starts_with("calligraph-art-"));
        assert!(file.filename.ends_with(".svg"));
        assert_eq!(file.mime_type(), "image/svg+xml");
    }
}
