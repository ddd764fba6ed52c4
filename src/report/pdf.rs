//! PDF document builder
//!
//! A thin layout layer over lopdf: US-letter pages, headings and wrapped
//! paragraphs in the standard Helvetica faces, JPEG image XObjects, and
//! ruled tables. Tables repeat their header row after a page break and never
//! split a data row across pages. Coordinates are PDF-native (origin at the
//! bottom-left); the builder tracks a descending cursor from the top margin.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use super::layout::{
    fit_within, sanitize, wrap_text, FontKind, CONTENT_WIDTH, LINE_SPACING, MARGIN, PAGE_HEIGHT,
    PAGE_WIDTH,
};
use super::ReportError;

const CELL_PADDING: f64 = 4.0;
const TABLE_TEXT_SIZE: f64 = 9.0;

const BLACK: (f64, f64, f64) = (0.0, 0.0, 0.0);
const WHITE: (f64, f64, f64) = (1.0, 1.0, 1.0);

/// A table cell: wrapped text or a scaled-down image.
pub enum Cell {
    Text { text: String, bold: bool },
    Image { jpeg: Vec<u8>, width_px: u32, height_px: u32 },
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Cell::Text {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Cell::Text {
            text: text.into(),
            bold: true,
        }
    }

    pub fn image(jpeg: Vec<u8>, width_px: u32, height_px: u32) -> Self {
        Cell::Image {
            jpeg,
            width_px,
            height_px,
        }
    }
}

/// Table appearance and geometry.
pub struct TableStyle {
    /// Column widths in points; their sum should not exceed [`CONTENT_WIDTH`].
    pub column_widths: Vec<f64>,
    pub header: Vec<String>,
    /// Header row background.
    pub header_fill: (f64, f64, f64),
    /// Cap (both axes) for images inside cells.
    pub image_max: f64,
}

pub struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    font_regular_id: ObjectId,
    font_bold_id: ObjectId,
    page_ids: Vec<ObjectId>,
    ops: Vec<Operation>,
    images: Vec<(String, ObjectId)>,
    cursor_y: f64,
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

fn pdf_err(e: lopdf::Error) -> ReportError {
    ReportError::Pdf(e.to_string())
}

impl PdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let resources_id = doc.new_object_id();

        let font_regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let font_bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });

        Self {
            doc,
            pages_id,
            resources_id,
            font_regular_id,
            font_bold_id,
            page_ids: Vec::new(),
            ops: Vec::new(),
            images: Vec::new(),
            cursor_y: PAGE_HEIGHT - MARGIN,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len() + if self.ops.is_empty() { 0 } else { 1 }
    }

    // ------------------------------------------------------------------
    // Content primitives
    // ------------------------------------------------------------------

    fn op(&mut self, operator: &str, operands: Vec<Object>) {
        self.ops.push(Operation::new(operator, operands));
    }

    fn font_name(font: FontKind) -> &'static str {
        match font {
            FontKind::Regular => "F1",
            FontKind::Bold => "F2",
        }
    }

    fn draw_text_line(
        &mut self,
        text: &str,
        font: FontKind,
        size: f64,
        x: f64,
        baseline_y: f64,
        color: (f64, f64, f64),
    ) {
        self.op("rg", vec![real(color.0), real(color.1), real(color.2)]);
        self.op("BT", vec![]);
        self.op("Tf", vec![Self::font_name(font).into(), real(size)]);
        self.op("Td", vec![real(x), real(baseline_y)]);
        self.op("Tj", vec![Object::string_literal(sanitize(text))]);
        self.op("ET", vec![]);
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.op("RG", vec![real(0.0), real(0.0), real(0.0)]);
        self.op("w", vec![real(0.75)]);
        self.op("re", vec![real(x), real(y), real(width), real(height)]);
        self.op("S", vec![]);
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: (f64, f64, f64)) {
        self.op("rg", vec![real(color.0), real(color.1), real(color.2)]);
        self.op("re", vec![real(x), real(y), real(width), real(height)]);
        self.op("f", vec![]);
    }

    /// Register a JPEG as an image XObject and paint it at the given box.
    fn paint_image(
        &mut self,
        jpeg: &[u8],
        width_px: u32,
        height_px: u32,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) {
        let name = format!("Im{}", self.images.len());

        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width_px as i64,
                "Height" => height_px as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg.to_vec(),
        );
        let id = self.doc.add_object(stream);
        self.images.push((name.clone(), id));

        self.op("q", vec![]);
        self.op(
            "cm",
            vec![real(width), real(0.0), real(0.0), real(height), real(x), real(y)],
        );
        self.op("Do", vec![name.as_str().into()]);
        self.op("Q", vec![]);
    }

    // ------------------------------------------------------------------
    // Pagination
    // ------------------------------------------------------------------

    fn finish_page(&mut self) -> Result<(), ReportError> {
        if self.ops.is_empty() && !self.page_ids.is_empty() {
            return Ok(());
        }

        let content = Content {
            operations: std::mem::take(&mut self.ops),
        };
        let data = content.encode().map_err(pdf_err)?;
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, data));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
        });
        self.page_ids.push(page_id);
        self.cursor_y = PAGE_HEIGHT - MARGIN;

        Ok(())
    }

    /// Break the page unless `needed` points still fit above the margin.
    fn ensure_space(&mut self, needed: f64) -> Result<(), ReportError> {
        let at_top = self.cursor_y >= PAGE_HEIGHT - MARGIN;
        if !at_top && self.cursor_y - needed < MARGIN {
            self.finish_page()?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Flowing content
    // ------------------------------------------------------------------

    pub fn heading(&mut self, text: &str, size: f64) -> Result<(), ReportError> {
        let line_height = size * LINE_SPACING;
        self.ensure_space(line_height + 4.0)?;
        self.draw_text_line(text, FontKind::Bold, size, MARGIN, self.cursor_y - size, BLACK);
        self.cursor_y -= line_height + 4.0;
        Ok(())
    }

    pub fn paragraph(&mut self, text: &str, size: f64) -> Result<(), ReportError> {
        let line_height = size * LINE_SPACING;
        for line in wrap_text(text, FontKind::Regular, size, CONTENT_WIDTH) {
            self.ensure_space(line_height)?;
            self.draw_text_line(&line, FontKind::Regular, size, MARGIN, self.cursor_y - size, BLACK);
            self.cursor_y -= line_height;
        }
        self.cursor_y -= 2.0;
        Ok(())
    }

    pub fn spacer(&mut self, height: f64) {
        self.cursor_y -= height;
    }

    /// Place a JPEG scaled uniformly into `max_width` x `max_height`.
    pub fn image(
        &mut self,
        jpeg: &[u8],
        width_px: u32,
        height_px: u32,
        max_width: f64,
        max_height: f64,
    ) -> Result<(), ReportError> {
        let (width, height) = fit_within(width_px as f64, height_px as f64, max_width, max_height);
        if width <= 0.0 || height <= 0.0 {
            return Ok(());
        }

        self.ensure_space(height)?;
        let y = self.cursor_y - height;
        self.paint_image(jpeg, width_px, height_px, MARGIN, y, width, height);
        self.cursor_y -= height + 6.0;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Tables
    // ------------------------------------------------------------------

    fn header_height(style: &TableStyle) -> f64 {
        let line_height = TABLE_TEXT_SIZE * LINE_SPACING;
        let mut lines_max = 1usize;
        for (i, title) in style.header.iter().enumerate() {
            let width = style.column_widths[i] - 2.0 * CELL_PADDING;
            let lines = wrap_text(title, FontKind::Bold, TABLE_TEXT_SIZE, width).len();
            lines_max = lines_max.max(lines);
        }
        lines_max as f64 * line_height + 2.0 * CELL_PADDING
    }

    fn row_height(style: &TableStyle, cells: &[Cell]) -> f64 {
        let line_height = TABLE_TEXT_SIZE * LINE_SPACING;
        let mut height: f64 = line_height + 2.0 * CELL_PADDING;

        for (i, cell) in cells.iter().enumerate() {
            let width = style.column_widths[i] - 2.0 * CELL_PADDING;
            let cell_height = match cell {
                Cell::Text { text, bold } => {
                    let font = if *bold { FontKind::Bold } else { FontKind::Regular };
                    let lines = wrap_text(text, font, TABLE_TEXT_SIZE, width).len();
                    lines as f64 * line_height + 2.0 * CELL_PADDING
                }
                Cell::Image {
                    width_px,
                    height_px,
                    ..
                } => {
                    let (_, h) = fit_within(
                        *width_px as f64,
                        *height_px as f64,
                        width,
                        style.image_max,
                    );
                    h + 2.0 * CELL_PADDING
                }
            };
            height = height.max(cell_height);
        }

        height
    }

    fn draw_table_header(&mut self, style: &TableStyle) {
        let line_height = TABLE_TEXT_SIZE * LINE_SPACING;
        let header_height = Self::header_height(style);
        let table_width: f64 = style.column_widths.iter().sum();
        let top = self.cursor_y;
        let bottom = top - header_height;

        self.fill_rect(MARGIN, bottom, table_width, header_height, style.header_fill);

        let mut x = MARGIN;
        for (i, title) in style.header.iter().enumerate() {
            let col_width = style.column_widths[i];
            self.stroke_rect(x, bottom, col_width, header_height);

            let mut baseline = top - CELL_PADDING - TABLE_TEXT_SIZE;
            for line in wrap_text(title, FontKind::Bold, TABLE_TEXT_SIZE, col_width - 2.0 * CELL_PADDING)
            {
                self.draw_text_line(
                    &line,
                    FontKind::Bold,
                    TABLE_TEXT_SIZE,
                    x + CELL_PADDING,
                    baseline,
                    WHITE,
                );
                baseline -= line_height;
            }
            x += col_width;
        }

        self.cursor_y -= header_height;
    }

    fn draw_table_row(&mut self, style: &TableStyle, cells: &[Cell], row_height: f64) {
        let line_height = TABLE_TEXT_SIZE * LINE_SPACING;
        let top = self.cursor_y;
        let bottom = top - row_height;

        let mut x = MARGIN;
        for (i, cell) in cells.iter().enumerate() {
            let col_width = style.column_widths[i];
            self.stroke_rect(x, bottom, col_width, row_height);

            match cell {
                Cell::Text { text, bold } => {
                    let font = if *bold { FontKind::Bold } else { FontKind::Regular };
                    let mut baseline = top - CELL_PADDING - TABLE_TEXT_SIZE;
                    for line in wrap_text(text, font, TABLE_TEXT_SIZE, col_width - 2.0 * CELL_PADDING)
                    {
                        self.draw_text_line(
                            &line,
                            font,
                            TABLE_TEXT_SIZE,
                            x + CELL_PADDING,
                            baseline,
                            BLACK,
                        );
                        baseline -= line_height;
                    }
                }
                Cell::Image {
                    jpeg,
                    width_px,
                    height_px,
                } => {
                    let (width, height) = fit_within(
                        *width_px as f64,
                        *height_px as f64,
                        col_width - 2.0 * CELL_PADDING,
                        style.image_max,
                    );
                    if width > 0.0 && height > 0.0 {
                        // Center the thumbnail vertically in its row
                        let y = bottom + (row_height - height) / 2.0;
                        self.paint_image(jpeg, *width_px, *height_px, x + CELL_PADDING, y, width, height);
                    }
                }
            }
            x += col_width;
        }

        self.cursor_y -= row_height;
    }

    /// Lay out a ruled table. The header repeats after every page break; a
    /// row taller than the remaining space moves to a fresh page whole.
    pub fn table(&mut self, style: &TableStyle, rows: Vec<Vec<Cell>>) -> Result<(), ReportError> {
        debug_assert_eq!(style.header.len(), style.column_widths.len());

        let header_height = Self::header_height(style);
        let first_row_height = rows
            .first()
            .map(|cells| Self::row_height(style, cells))
            .unwrap_or(0.0);

        self.ensure_space(header_height + first_row_height)?;
        self.draw_table_header(style);

        for cells in &rows {
            let row_height = Self::row_height(style, cells);
            if self.cursor_y - row_height < MARGIN {
                self.finish_page()?;
                self.draw_table_header(style);
            }
            self.draw_table_row(style, cells, row_height);
        }

        self.cursor_y -= 8.0;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Finalization
    // ------------------------------------------------------------------

    /// Close the document and return the serialized PDF bytes.
    pub fn finish(mut self) -> Result<Vec<u8>, ReportError> {
        self.finish_page()?;

        let mut font_dict = Dictionary::new();
        font_dict.set("F1", self.font_regular_id);
        font_dict.set("F2", self.font_bold_id);

        let mut resources = Dictionary::new();
        resources.set("Font", Object::Dictionary(font_dict));

        if !self.images.is_empty() {
            let mut xobjects = Dictionary::new();
            for (name, id) in &self.images {
                xobjects.set(name.as_str(), *id);
            }
            resources.set("XObject", Object::Dictionary(xobjects));
        }

        self.doc
            .objects
            .insert(self.resources_id, Object::Dictionary(resources));

        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::Reference(*id)).collect();
        let count = self.page_ids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => self.resources_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                real(PAGE_WIDTH),
                real(PAGE_HEIGHT),
            ],
        };
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| ReportError::Pdf(e.to_string()))?;
        Ok(buffer)
    }
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_jpeg() -> (Vec<u8>, u32, u32) {
        let img = image::RgbImage::from_pixel(8, 8, image::Rgb([10, 20, 30]));
        let mut buffer = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut buffer),
            image::ImageFormat::Jpeg,
        )
        .unwrap();
        (buffer, 8, 8)
    }

    fn style() -> TableStyle {
        TableStyle {
            column_widths: vec![144.0, 324.0],
            header: vec!["Category".to_string(), "Assessment".to_string()],
            header_fill: (0.5, 0.5, 0.5),
            image_max: 72.0,
        }
    }

    #[test]
    fn empty_document_still_serializes() {
        let pdf = PdfBuilder::new().finish().unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
    }

    #[test]
    fn text_and_table_produce_a_single_page() {
        let mut builder = PdfBuilder::new();
        builder.heading("UI Design Assessment Report", 18.0).unwrap();
        builder.paragraph("Generated for shot.png", 10.0).unwrap();
        builder
            .table(
                &style(),
                vec![vec![Cell::bold("Typography"), Cell::text("RATING: Good.")]],
            )
            .unwrap();

        assert_eq!(builder.page_count(), 1);
        let pdf = builder.finish().unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
    }

    #[test]
    fn long_tables_break_onto_new_pages() {
        let mut builder = PdfBuilder::new();
        let rows: Vec<Vec<Cell>> = (0..120)
            .map(|i| {
                vec![
                    Cell::bold(format!("Row {i}")),
                    Cell::text("A critique long enough to wrap across a couple of lines in the second column of the table."),
                ]
            })
            .collect();
        builder.table(&style(), rows).unwrap();

        assert!(builder.page_count() > 1);
        let pdf = builder.finish().unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
    }

    #[test]
    fn images_embed_in_cells_and_flow() {
        let (jpeg, w, h) = tiny_jpeg();

        let mut builder = PdfBuilder::new();
        builder.image(&jpeg, w, h, 468.0, 540.0).unwrap();
        builder
            .table(
                &style(),
                vec![vec![
                    Cell::image(jpeg.clone(), w, h),
                    Cell::text("Thumbnail row"),
                ]],
            )
            .unwrap();

        let pdf = builder.finish().unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
        // Both XObjects made it into the document
        let text = String::from_utf8_lossy(&pdf);
        assert!(text.contains("/Im0") && text.contains("/Im1"));
    }
}
