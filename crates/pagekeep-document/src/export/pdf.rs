// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — one page per rendered image using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use image::DynamicImage;
use pagekeep_core::PaperSize;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

/// Images are embedded at 72 dpi, so one pixel is one point before scaling.
const EMBED_DPI: f32 = 72.0;

/// Where an image lands on the canvas, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

/// Scale `image` (pixels) to fit `canvas` (points) preserving aspect ratio,
/// centred on both axes.
pub fn fit_centered(canvas: (f32, f32), image: (u32, u32)) -> Placement {
    let (canvas_w, canvas_h) = canvas;
    let (img_w, img_h) = (image.0.max(1) as f32, image.1.max(1) as f32);
    let scale = (canvas_w / img_w).min(canvas_h / img_h);
    Placement {
        x: (canvas_w - img_w * scale) / 2.0,
        y: (canvas_h - img_h * scale) / 2.0,
        scale,
    }
}

/// Builds multi-page PDFs from rendered page images.
pub struct PdfWriter {
    paper_size: PaperSize,
    title: String,
}

impl PdfWriter {
    pub fn new(paper_size: PaperSize, title: impl Into<String>) -> Self {
        Self {
            paper_size,
            title: title.into(),
        }
    }

    /// Paper dimensions in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    /// Serialise one canvas page per image. Returns `None` if `images` is empty.
    #[instrument(skip(self, images), fields(title = %self.title, paper = ?self.paper_size))]
    pub fn render<I>(&self, images: I) -> Option<Vec<u8>>
    where
        I: IntoIterator<Item = DynamicImage>,
    {
        let (page_w, page_h) = self.page_dimensions();
        let canvas = (page_w.into_pt().0, page_h.into_pt().0);

        let mut doc = PdfDocument::new(&self.title);
        let mut pages: Vec<PdfPage> = Vec::new();

        for image in images {
            let (width, height) = (image.width(), image.height());
            let rgb = image.to_rgb8();
            let raw = RawImage {
                pixels: RawImageData::U8(rgb.into_raw()),
                width: width as usize,
                height: height as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let placement = fit_centered(canvas, (width, height));
            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(placement.x)),
                    translate_y: Some(Pt(placement.y)),
                    scale_x: Some(placement.scale),
                    scale_y: Some(placement.scale),
                    dpi: Some(EMBED_DPI),
                    rotate: None,
                },
            }];
            debug!(
                page = pages.len() + 1,
                width,
                height,
                scale = placement.scale,
                "Image placed on page"
            );
            pages.push(PdfPage::new(page_w, page_h, ops));
        }

        if pages.is_empty() {
            return None;
        }

        let page_count = pages.len();
        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        info!(page_count, bytes = output.len(), "PDF rendered");
        Some(output)
    }
}
