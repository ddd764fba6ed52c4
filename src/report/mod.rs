//! PDF assessment report
//!
//! Assembles the downloadable report: document header, the annotated
//! screenshot, the general assessment table, and the per-element table with
//! crop thumbnails.

pub mod layout;
mod pdf;

use std::collections::HashMap;

use chrono::Utc;

use crate::analysis::Analysis;
use crate::annotate::{crop_element, encode_jpeg};
use crate::assessment::Assessment;
use crate::detection::{display_name, DetectedElement};

pub use pdf::{Cell, PdfBuilder, TableStyle};

/// Conservative caps for the annotated screenshot on the first page, so it
/// never collides with the bottom margin (6.5 x 7.5 inches).
const ANNOTATED_MAX_WIDTH: f64 = 468.0;
const ANNOTATED_MAX_HEIGHT: f64 = 540.0;

/// Cap for crop thumbnails inside the element table (1 inch).
const THUMBNAIL_MAX: f64 = 72.0;

const MISSING_GLOBAL: &str = "Assessment not available";

/// Report error types
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("PDF assembly failed: {0}")]
    Pdf(String),

    #[error("Failed to encode report image: {0}")]
    Image(String),
}

impl ReportError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        axum::http::StatusCode::INTERNAL_SERVER_ERROR
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Pdf(_) => "REPORT_PDF_FAILED",
            Self::Image(_) => "REPORT_IMAGE_FAILED",
        }
    }
}

/// Download file name: `ui-assessment-{stem}-{timestamp}.pdf`, restricted to
/// header-safe characters.
pub fn report_file_name(analysis: &Analysis) -> String {
    let stem = analysis
        .file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(&analysis.file_name);

    let stem: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();

    format!(
        "ui-assessment-{}-{}.pdf",
        if stem.is_empty() { "screenshot" } else { &stem },
        Utc::now().format("%Y%m%d%H%M%S")
    )
}

fn or_placeholder(text: &str) -> String {
    if text.trim().is_empty() {
        MISSING_GLOBAL.to_string()
    } else {
        text.to_string()
    }
}

fn general_table(assessment: &Assessment) -> (TableStyle, Vec<Vec<Cell>>) {
    let style = TableStyle {
        column_widths: vec![144.0, 324.0],
        header: vec!["Category".to_string(), "Assessment".to_string()],
        header_fill: (0.5, 0.5, 0.5),
        image_max: THUMBNAIL_MAX,
    };

    let rows = vec![
        vec![
            Cell::bold("Typography"),
            Cell::text(or_placeholder(&assessment.typography)),
        ],
        vec![
            Cell::bold("Color scheme"),
            Cell::text(or_placeholder(&assessment.color_scheme)),
        ],
        vec![
            Cell::bold("Visual hierarchy"),
            Cell::text(or_placeholder(&assessment.visual_hierarchy)),
        ],
    ];

    (style, rows)
}

fn element_table(analysis: &Analysis, assessment: &Assessment) -> Result<(TableStyle, Vec<Vec<Cell>>), ReportError> {
    let style = TableStyle {
        column_widths: vec![72.0, 94.0, 151.0, 151.0],
        header: vec![
            "Element".to_string(),
            "Box".to_string(),
            "Critique".to_string(),
            "Notes".to_string(),
        ],
        header_fill: (0.1, 0.2, 0.5),
        image_max: THUMBNAIL_MAX,
    };

    let by_id: HashMap<&str, &DetectedElement> = analysis
        .elements
        .iter()
        .map(|e| (e.id.as_str(), e))
        .collect();

    let mut rows = Vec::with_capacity(assessment.elements.len());
    for entry in &assessment.elements {
        // Critique ids the detector never produced keep their row, with no
        // thumbnail to show.
        let box_cell = match by_id.get(entry.id.as_str()) {
            Some(element) => match crop_element(&analysis.image, &element.bbox) {
                Some(crop) => {
                    let (width, height) = (crop.width(), crop.height());
                    let jpeg = encode_jpeg(&crop).map_err(|e| ReportError::Image(e.to_string()))?;
                    Cell::image(jpeg, width, height)
                }
                None => Cell::text("invalid box"),
            },
            None => Cell::text("N/A"),
        };

        let critique = if entry.critique.trim().is_empty() {
            "Not assessed".to_string()
        } else {
            entry.critique.clone()
        };
        let notes = if entry.notes.trim().is_empty() {
            "No specific notes.".to_string()
        } else {
            entry.notes.clone()
        };

        rows.push(vec![
            Cell::bold(display_name(&entry.id)),
            box_cell,
            Cell::text(critique),
            Cell::text(notes),
        ]);
    }

    Ok((style, rows))
}

/// Render the full assessment report for an analysis.
///
/// Requires a stored assessment; the annotated screenshot section degrades
/// to a note when the annotated image is missing.
pub fn render_report(analysis: &Analysis) -> Result<Vec<u8>, ReportError> {
    let assessment = analysis.assessment.clone().unwrap_or_default();

    let mut builder = PdfBuilder::new();

    builder.heading("UI Design Assessment Report", 18.0)?;
    builder.paragraph(
        &format!("Report date: {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC")),
        10.0,
    )?;
    builder.paragraph(&format!("Source screenshot: {}", analysis.file_name), 10.0)?;
    builder.spacer(6.0);

    builder.heading("Detection Result", 13.0)?;
    match &analysis.annotated_jpeg {
        Some(jpeg) => {
            builder.image(
                jpeg,
                analysis.width(),
                analysis.height(),
                ANNOTATED_MAX_WIDTH,
                ANNOTATED_MAX_HEIGHT,
            )?;
        }
        None => {
            builder.paragraph("Annotated image not available.", 10.0)?;
        }
    }
    builder.spacer(8.0);

    builder.heading("General Assessment", 13.0)?;
    let (style, rows) = general_table(&assessment);
    builder.table(&style, rows)?;

    builder.heading("Element Assessment", 13.0)?;
    if assessment.elements.is_empty() {
        builder.paragraph("No per-element critique entries were returned.", 10.0)?;
    } else {
        let (style, rows) = element_table(analysis, &assessment)?;
        builder.table(&style, rows)?;
    }

    let pdf = builder.finish()?;

    tracing::info!(
        analysis_id = %analysis.id,
        bytes = pdf.len(),
        elements = assessment.elements.len(),
        "Report rendered"
    );

    Ok(pdf)
}
