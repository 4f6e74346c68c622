// src/services/qr_service.rs

use qrcode::{render::svg, QrCode};

use crate::common::error::AppError;

// Tamanho mínimo do SVG em pixels
const MIN_DIMENSION: u32 = 200;

/// Gera o SVG gravado em `qr_codes.svg_data` a partir da string do código.
#[derive(Clone, Default)]
pub struct QrRenderer;

impl QrRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render_svg(&self, code: &str) -> Result<String, AppError> {
        let qr = QrCode::new(code.as_bytes())
            .map_err(|e| anyhow::anyhow!("Falha ao gerar QR para '{}': {}", code, e))?;

        let image = qr
            .render::<svg::Color>()
            .min_dimensions(MIN_DIMENSION, MIN_DIMENSION)
            .dark_color(svg::Color("#1b4332"))
            .light_color(svg::Color("#ffffff"))
            .build();

        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_svg_document() {
        let svg = QrRenderer::new().render_svg("QR-abc123-001").unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("#1b4332"));
    }
}
