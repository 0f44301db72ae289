//! Spreadsheet export of shipment listings.

use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, XlsxError};
use thiserror::Error;

use envios_shipments::Shipment;

pub const CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const SHEET_NAME: &str = "Envíos";

const HEADER_FILL: u32 = 0xC91A25;
const BORDER_COLOR: u32 = 0xE2E8F0;

const COLUMNS: &[(&str, f64)] = &[
    ("Ticket", 15.0),
    ("Fecha/Hora", 22.0),
    ("Contacto", 20.0),
    ("Teléfono", 15.0),
    ("Calle", 25.0),
    ("Número", 10.0),
    ("Apto", 10.0),
    ("Esquina", 20.0),
    ("Departamento", 15.0),
    ("Motivo", 18.0),
    ("Comentarios", 30.0),
    ("Estado", 18.0),
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("workbook generation failed: {0}")]
    Workbook(#[from] XlsxError),
}

/// A rendered workbook and the attachment name to serve it under.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// `envios_YYYYMMDD_HHMMSS.xlsx`
pub fn listing_filename(now: DateTime<Utc>) -> String {
    format!("envios_{}.xlsx", now.format("%Y%m%d_%H%M%S"))
}

/// `envio_<ticket>_YYYYMMDD_HHMMSS.xlsx`, with the ticket reduced to
/// filename-safe characters.
pub fn single_filename(ticket: &str, now: DateTime<Utc>) -> String {
    let safe: String = ticket
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("envio_{}_{}.xlsx", safe, now.format("%Y%m%d_%H%M%S"))
}

fn row_values(shipment: &Shipment) -> [String; 12] {
    [
        shipment.ticket.clone(),
        shipment.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        shipment.contact_name.clone(),
        shipment.phone.clone(),
        shipment.street.clone(),
        shipment.house_number.clone(),
        shipment.apartment.clone().unwrap_or_default(),
        shipment.cross_street.clone().unwrap_or_default(),
        shipment.department.to_string(),
        shipment.reason.to_string(),
        shipment.comments.clone().unwrap_or_default(),
        shipment.state.to_string(),
    ]
}

/// Render shipments into an `.xlsx` workbook, one row per shipment.
pub fn render_workbook(shipments: &[Shipment]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();

    let header = Format::new()
        .set_bold()
        .set_font_size(11)
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(BORDER_COLOR));
    let cell = Format::new()
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(BORDER_COLOR));

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, (title, width)) in COLUMNS.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *title, &header)?;
        sheet.set_column_width(col, *width)?;
    }

    for (idx, shipment) in shipments.iter().enumerate() {
        let row = idx as u32 + 1;
        for (col, value) in row_values(shipment).iter().enumerate() {
            sheet.write_string_with_format(row, col as u16, value, &cell)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}
