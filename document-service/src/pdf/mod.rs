//! Procedural offer document layout.
//!
//! A4 portrait with fixed sections: branded header band, issuer and client
//! blocks, equipment table with continuation pages, totals and conditions.
//! Colors come from the issuing company's branding, with platform defaults
//! when none are configured. There is no template engine; every section is
//! drawn directly.

use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerIndex, PdfLayerReference, PdfPageIndex, Point, Rect, Rgb,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{EquipmentLine, OfferPdfData};
use service_core::error::AppError;
use service_core::money::{format_amount, round_cents};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 18.0;
const HEADER_BAND_HEIGHT: f32 = 30.0;
const ROW_HEIGHT: f32 = 7.0;
// Cursor floor; below this a section moves to the next page.
const FOOTER_LIMIT: f32 = 24.0;

// Platform colors used when a company has no branding configured.
const DEFAULT_PRIMARY: (u8, u8, u8) = (51, 99, 142);
const DEFAULT_SECONDARY: (u8, u8, u8) = (218, 227, 235);
const TEXT_COLOR: (u8, u8, u8) = (33, 37, 41);
const MUTED_COLOR: (u8, u8, u8) = (108, 117, 125);
const RULE_COLOR: (u8, u8, u8) = (205, 210, 215);
const WHITE: (u8, u8, u8) = (255, 255, 255);

// Equipment table columns. Amount columns are right-aligned on their edge.
const COL_TITLE_X: f32 = MARGIN + 2.0;
const COL_QTY_RIGHT: f32 = 124.0;
const COL_UNIT_RIGHT: f32 = 158.0;
const COL_MONTHLY_RIGHT: f32 = PAGE_WIDTH - MARGIN - 2.0;
const TITLE_MAX_CHARS: usize = 46;

const CONDITIONS: [&str; 4] = [
    "Offre valable 30 jours à compter de sa date d'émission, sous réserve d'acceptation du",
    "dossier par l'organisme de financement. Les mensualités s'entendent hors TVA et hors",
    "assurance. Le matériel reste la propriété du bailleur pendant toute la durée du contrat.",
    "La signature de la présente offre vaut accord sur les conditions ci-dessus.",
];

/// A finished document plus what the handler responds with.
#[derive(Debug)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub pages: usize,
}

/// Download filename, aligned with the attachment naming used in emails.
pub fn document_filename(offer_id: Uuid) -> String {
    format!("offre-{}.pdf", offer_id)
}

/// Short reference printed on the document.
fn offer_reference(offer_id: Uuid) -> String {
    let simple = offer_id.simple().to_string();
    format!("OFF-{}", simple[..8].to_uppercase())
}

fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

fn rgb(channels: (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(
        channels.0 as f32 / 255.0,
        channels.1 as f32 / 255.0,
        channels.2 as f32 / 255.0,
        None,
    ))
}

fn brand_color(configured: Option<&str>, default: (u8, u8, u8)) -> Color {
    configured
        .and_then(parse_hex_color)
        .map(rgb)
        .unwrap_or_else(|| rgb(default))
}

fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let mut truncated: String = label.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

/// `purchase_price × (1 + margin_percent / 100)`, rounded to cents. Inputs
/// are non-negative by the equipment table's constraints.
fn unit_selling_price(line: &EquipmentLine) -> Decimal {
    round_cents(line.purchase_price * (Decimal::ONE + line.margin_percent / Decimal::ONE_HUNDRED))
}

fn eur(amount: Decimal) -> String {
    format_amount(amount, "EUR")
}

/// Approximate Helvetica advance for right alignment; the builtin fonts
/// expose no metrics to query.
fn text_width_mm(text: &str, font_size: f32) -> f32 {
    const PT_TO_MM: f32 = 0.352_778;
    text.chars().count() as f32 * font_size * 0.5 * PT_TO_MM
}

fn pdf_error(e: printpdf::Error) -> AppError {
    AppError::InternalError(anyhow::anyhow!("PDF generation failed: {}", e))
}

/// Cursor-based page writer. `cursor` is the y position of the next element's
/// top edge, in mm from the page bottom.
struct PageWriter {
    doc: PdfDocumentReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    layer: PdfLayerReference,
    cursor: f32,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self, AppError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Page 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?;
        let oblique = doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(pdf_error)?;
        let layer_ref = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            regular,
            bold,
            oblique,
            pages: vec![(page, layer)],
            layer: layer_ref,
            cursor: PAGE_HEIGHT,
        })
    }

    fn new_page(&mut self) {
        let number = self.pages.len() + 1;
        let (page, layer) =
            self.doc
                .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), format!("Page {}", number));
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.pages.push((page, layer));
        self.cursor = PAGE_HEIGHT - MARGIN;
    }

    /// Break to a new page when less than `needed` mm remain. Returns
    /// whether a break happened so table headers can be redrawn.
    fn ensure_room(&mut self, needed: f32) -> bool {
        if self.cursor - needed < FOOTER_LIMIT {
            self.new_page();
            true
        } else {
            false
        }
    }

    fn text(&self, s: &str, size: f32, x: f32, y: f32, font: &IndirectFontRef, color: Color) {
        self.layer.set_fill_color(color);
        self.layer.use_text(s, size, Mm(x), Mm(y), font);
    }

    fn text_right(
        &self,
        s: &str,
        size: f32,
        right_edge: f32,
        y: f32,
        font: &IndirectFontRef,
        color: Color,
    ) {
        let x = right_edge - text_width_mm(s, size);
        self.text(s, size, x, y, font, color);
    }

    fn fill_rect(&self, x1: f32, y1: f32, x2: f32, y2: f32, color: Color) {
        self.layer.set_fill_color(color);
        self.layer
            .add_rect(Rect::new(Mm(x1), Mm(y1), Mm(x2), Mm(y2)).with_mode(PaintMode::Fill));
    }

    fn rule(&self, x1: f32, x2: f32, y: f32, thickness: f32, color: Color) {
        self.layer.set_outline_color(color);
        self.layer.set_outline_thickness(thickness);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1), Mm(y)), false),
                (Point::new(Mm(x2), Mm(y)), false),
            ],
            is_closed: false,
        });
    }

    /// Draw the per-page footer on every page, then serialize.
    fn finish(self, footer_left: &str, filename: String) -> Result<RenderedPdf, AppError> {
        let total = self.pages.len();
        for (index, (page, layer)) in self.pages.iter().enumerate() {
            let layer_ref = self.doc.get_page(*page).get_layer(*layer);
            layer_ref.set_outline_color(rgb(RULE_COLOR));
            layer_ref.set_outline_thickness(0.3);
            layer_ref.add_line(Line {
                points: vec![
                    (Point::new(Mm(MARGIN), Mm(16.0)), false),
                    (Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(16.0)), false),
                ],
                is_closed: false,
            });
            layer_ref.set_fill_color(rgb(MUTED_COLOR));
            layer_ref.use_text(footer_left, 7.5, Mm(MARGIN), Mm(11.0), &self.regular);
            let page_label = format!("Page {}/{}", index + 1, total);
            let x = PAGE_WIDTH - MARGIN - text_width_mm(&page_label, 7.5);
            layer_ref.use_text(page_label, 7.5, Mm(x), Mm(11.0), &self.regular);
        }

        let bytes = self.doc.save_to_bytes().map_err(pdf_error)?;
        Ok(RenderedPdf {
            bytes,
            filename,
            pages: total,
        })
    }
}

fn draw_table_header(writer: &mut PageWriter, band: &Color, ink: &Color) {
    let top = writer.cursor;
    writer.fill_rect(MARGIN, top - ROW_HEIGHT, PAGE_WIDTH - MARGIN, top, band.clone());
    let baseline = top - ROW_HEIGHT + 2.2;
    writer.text(
        "Désignation",
        8.5,
        COL_TITLE_X,
        baseline,
        &writer.bold,
        ink.clone(),
    );
    writer.text_right("Qté", 8.5, COL_QTY_RIGHT, baseline, &writer.bold, ink.clone());
    writer.text_right(
        "Prix unitaire",
        8.5,
        COL_UNIT_RIGHT,
        baseline,
        &writer.bold,
        ink.clone(),
    );
    writer.text_right(
        "Mensualité",
        8.5,
        COL_MONTHLY_RIGHT,
        baseline,
        &writer.bold,
        ink.clone(),
    );
    writer.cursor = top - ROW_HEIGHT - 1.0;
}

/// Render the full offer document.
pub fn render_offer(data: &OfferPdfData) -> Result<RenderedPdf, AppError> {
    let offer = &data.offer;
    let reference = offer_reference(offer.offer_id);

    let company_name = data
        .company
        .as_ref()
        .map(|c| c.name.as_str())
        .unwrap_or("Leazr");
    let primary = brand_color(
        data.company.as_ref().and_then(|c| c.primary_color.as_deref()),
        DEFAULT_PRIMARY,
    );
    let secondary = brand_color(
        data.company
            .as_ref()
            .and_then(|c| c.secondary_color.as_deref()),
        DEFAULT_SECONDARY,
    );
    let ink = rgb(TEXT_COLOR);
    let muted = rgb(MUTED_COLOR);

    let mut writer = PageWriter::new(&format!("Offre {}", reference))?;

    // Header band
    writer.fill_rect(
        0.0,
        PAGE_HEIGHT - HEADER_BAND_HEIGHT,
        PAGE_WIDTH,
        PAGE_HEIGHT,
        primary.clone(),
    );
    writer.text(
        company_name,
        16.0,
        MARGIN,
        PAGE_HEIGHT - 14.0,
        &writer.bold,
        rgb(WHITE),
    );
    writer.text_right(
        "OFFRE DE LEASING",
        11.0,
        PAGE_WIDTH - MARGIN,
        PAGE_HEIGHT - 14.0,
        &writer.regular,
        rgb(WHITE),
    );
    writer.text(
        &format!("Offre n° {}", reference),
        10.0,
        MARGIN,
        PAGE_HEIGHT - HEADER_BAND_HEIGHT - 8.0,
        &writer.bold,
        ink.clone(),
    );
    writer.text_right(
        &format!("Date : {}", offer.created_utc.format("%d/%m/%Y")),
        10.0,
        PAGE_WIDTH - MARGIN,
        PAGE_HEIGHT - HEADER_BAND_HEIGHT - 8.0,
        &writer.regular,
        ink.clone(),
    );
    writer.cursor = PAGE_HEIGHT - HEADER_BAND_HEIGHT - 16.0;

    // Issuer and client blocks
    let block_top = writer.cursor;
    writer.text(
        "ÉMETTEUR",
        8.0,
        MARGIN,
        block_top,
        &writer.bold,
        muted.clone(),
    );
    writer.text(
        company_name,
        10.0,
        MARGIN,
        block_top - 6.0,
        &writer.bold,
        ink.clone(),
    );

    let client_block = client_block_lines(data);
    writer.text(
        "CLIENT",
        8.0,
        112.0,
        block_top,
        &writer.bold,
        muted.clone(),
    );
    let mut line_y = block_top - 6.0;
    for (index, line) in client_block.iter().enumerate() {
        let font = if index == 0 {
            writer.bold.clone()
        } else {
            writer.regular.clone()
        };
        writer.text(line, 9.5, 112.0, line_y, &font, ink.clone());
        line_y -= 5.0;
    }
    writer.cursor = line_y.min(block_top - 12.0) - 6.0;

    // Equipment table
    draw_table_header(&mut writer, &secondary, &ink);
    if data.lines.is_empty() {
        let baseline = writer.cursor - ROW_HEIGHT + 2.2;
        writer.text(
            "Aucun équipement",
            9.0,
            COL_TITLE_X,
            baseline,
            &writer.oblique,
            muted.clone(),
        );
        writer.cursor -= ROW_HEIGHT;
    }

    let mut monthly_sum = Decimal::ZERO;
    for line in &data.lines {
        if writer.ensure_room(ROW_HEIGHT + 2.0) {
            draw_table_header(&mut writer, &secondary, &ink);
        }
        let baseline = writer.cursor - ROW_HEIGHT + 2.2;
        writer.text(
            &truncate_label(&line.title, TITLE_MAX_CHARS),
            9.0,
            COL_TITLE_X,
            baseline,
            &writer.regular,
            ink.clone(),
        );
        writer.text_right(
            &line.quantity.to_string(),
            9.0,
            COL_QTY_RIGHT,
            baseline,
            &writer.regular,
            ink.clone(),
        );
        writer.text_right(
            &eur(unit_selling_price(line)),
            9.0,
            COL_UNIT_RIGHT,
            baseline,
            &writer.regular,
            ink.clone(),
        );
        writer.text_right(
            &eur(line.monthly_payment_total),
            9.0,
            COL_MONTHLY_RIGHT,
            baseline,
            &writer.regular,
            ink.clone(),
        );
        writer.rule(
            MARGIN,
            PAGE_WIDTH - MARGIN,
            writer.cursor - ROW_HEIGHT,
            0.2,
            rgb(RULE_COLOR),
        );
        monthly_sum += line.monthly_payment_total;
        writer.cursor -= ROW_HEIGHT;
    }

    if !data.lines.is_empty() {
        if writer.ensure_room(ROW_HEIGHT + 2.0) {
            draw_table_header(&mut writer, &secondary, &ink);
        }
        let baseline = writer.cursor - ROW_HEIGHT + 2.2;
        writer.text(
            "Total",
            9.0,
            COL_TITLE_X,
            baseline,
            &writer.bold,
            ink.clone(),
        );
        writer.text_right(
            &eur(monthly_sum),
            9.0,
            COL_MONTHLY_RIGHT,
            baseline,
            &writer.bold,
            ink.clone(),
        );
        writer.cursor -= ROW_HEIGHT;
    }

    // Totals block
    writer.ensure_room(40.0);
    writer.cursor -= 4.0;
    writer.rule(
        MARGIN,
        PAGE_WIDTH - MARGIN,
        writer.cursor,
        0.6,
        primary.clone(),
    );
    writer.cursor -= 8.0;
    writer.text_right(
        &format!("Montant financé : {}", eur(offer.amount)),
        10.5,
        PAGE_WIDTH - MARGIN,
        writer.cursor,
        &writer.bold,
        ink.clone(),
    );
    writer.cursor -= 7.0;
    writer.text_right(
        &format!("Mensualité : {}/mois", eur(offer.monthly_payment)),
        11.0,
        PAGE_WIDTH - MARGIN,
        writer.cursor,
        &writer.bold,
        primary.clone(),
    );
    writer.cursor -= 6.0;
    writer.text_right(
        &format!("Coefficient appliqué : {}", offer.coefficient.normalize()),
        8.5,
        PAGE_WIDTH - MARGIN,
        writer.cursor,
        &writer.regular,
        muted.clone(),
    );
    writer.cursor -= 8.0;

    if let Some(signed_at) = offer.signed_at {
        let signer = offer
            .signer_name
            .as_deref()
            .unwrap_or(offer.client_name.as_str());
        writer.text(
            &format!(
                "Offre signée par {} le {}",
                signer,
                signed_at.format("%d/%m/%Y")
            ),
            9.0,
            MARGIN,
            writer.cursor,
            &writer.oblique,
            ink.clone(),
        );
        writer.cursor -= 7.0;
    }

    if let Some(remarks) = offer.remarks.as_deref() {
        if !remarks.is_empty() {
            writer.text(
                &truncate_label(&format!("Remarques : {}", remarks), 110),
                8.5,
                MARGIN,
                writer.cursor,
                &writer.regular,
                muted.clone(),
            );
            writer.cursor -= 7.0;
        }
    }

    // Conditions
    writer.ensure_room(8.0 + CONDITIONS.len() as f32 * 4.0);
    writer.text(
        "CONDITIONS",
        8.0,
        MARGIN,
        writer.cursor,
        &writer.bold,
        muted.clone(),
    );
    writer.cursor -= 5.0;
    for condition in CONDITIONS {
        writer.text(
            condition,
            7.5,
            MARGIN,
            writer.cursor,
            &writer.regular,
            muted.clone(),
        );
        writer.cursor -= 4.0;
    }

    writer.finish(company_name, document_filename(offer.offer_id))
}

/// Lines of the client address block. Falls back to the contact snapshotted
/// on the offer when the client row is gone.
fn client_block_lines(data: &OfferPdfData) -> Vec<String> {
    match &data.client {
        Some(client) => {
            let mut lines = vec![client.name.clone(), client.company_name.clone()];
            if let Some(vat) = client.vat_number.as_deref() {
                lines.push(format!("TVA : {}", vat));
            }
            if let Some(address) = client.address.as_deref() {
                lines.push(address.to_string());
            }
            match (client.postal_code.as_deref(), client.city.as_deref()) {
                (Some(postal), Some(city)) => lines.push(format!("{} {}", postal, city)),
                (None, Some(city)) => lines.push(city.to_string()),
                (Some(postal), None) => lines.push(postal.to_string()),
                (None, None) => {}
            }
            if let Some(country) = client.country.as_deref() {
                lines.push(country.to_string());
            }
            lines.push(client.email.clone());
            lines
        }
        None => vec![data.offer.client_name.clone(), data.offer.client_email.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClientDetails, CompanyBranding, OfferDocument};
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn offer() -> OfferDocument {
        OfferDocument {
            offer_id: Uuid::from_str("5f0c9f2e-9f3a-4f4b-8a6e-1d2c3b4a5e6f").unwrap(),
            company_id: Uuid::new_v4(),
            client_id: None,
            client_name: "Anna Durand".to_string(),
            client_email: "anna@acme.example".to_string(),
            amount: dec("3000"),
            coefficient: dec("3.27"),
            monthly_payment: dec("98.10"),
            status: "pending".to_string(),
            workflow_status: "sent".to_string(),
            remarks: None,
            signed_at: None,
            signer_name: None,
            created_utc: Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
        }
    }

    fn line(title: &str, quantity: i32, purchase: &str, margin: &str, monthly: &str) -> EquipmentLine {
        EquipmentLine {
            title: title.to_string(),
            purchase_price: dec(purchase),
            quantity,
            margin_percent: dec(margin),
            monthly_payment_total: dec(monthly),
        }
    }

    fn data(lines: Vec<EquipmentLine>) -> OfferPdfData {
        OfferPdfData {
            offer: offer(),
            client: None,
            company: None,
            lines,
        }
    }

    #[test]
    fn hex_colors_parse_with_and_without_hash() {
        assert_eq!(parse_hex_color("#33638E"), Some((51, 99, 142)));
        assert_eq!(parse_hex_color("33638E"), Some((51, 99, 142)));
        assert_eq!(parse_hex_color(" #ffffff "), Some((255, 255, 255)));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("not-a-color"), None);
    }

    #[test]
    fn long_titles_are_truncated_with_an_ellipsis() {
        let long = "a".repeat(60);
        let truncated = truncate_label(&long, 46);
        assert_eq!(truncated.chars().count(), 46);
        assert!(truncated.ends_with('…'));
        assert_eq!(truncate_label("Dock USB-C", 46), "Dock USB-C");
    }

    #[test]
    fn unit_price_applies_the_margin() {
        let equipment = line("MacBook Pro 14", 1, "250", "20", "10");
        assert_eq!(unit_selling_price(&equipment), dec("300.00"));
    }

    #[test]
    fn the_reference_is_derived_from_the_offer_id() {
        let id = Uuid::from_str("5f0c9f2e-9f3a-4f4b-8a6e-1d2c3b4a5e6f").unwrap();
        assert_eq!(offer_reference(id), "OFF-5F0C9F2E");
        assert_eq!(document_filename(id), "offre-5f0c9f2e-9f3a-4f4b-8a6e-1d2c3b4a5e6f.pdf");
    }

    #[test]
    fn a_minimal_offer_renders_a_single_page() {
        let rendered = render_offer(&data(vec![])).expect("render failed");
        assert!(rendered.bytes.starts_with(b"%PDF"));
        assert_eq!(rendered.pages, 1);
        assert_eq!(
            rendered.filename,
            "offre-5f0c9f2e-9f3a-4f4b-8a6e-1d2c3b4a5e6f.pdf"
        );
    }

    #[test]
    fn many_equipment_lines_spill_onto_continuation_pages() {
        let lines: Vec<EquipmentLine> = (0..60)
            .map(|i| line(&format!("Poste de travail {}", i), 1, "800", "15", "24.50"))
            .collect();
        let rendered = render_offer(&data(lines)).expect("render failed");
        assert!(rendered.pages >= 2, "expected a page break, got {}", rendered.pages);
    }

    #[test]
    fn branding_client_and_signature_render() {
        let mut full = data(vec![line("MacBook Pro 14", 2, "1200", "18", "76.00")]);
        full.client = Some(ClientDetails {
            name: "Anna Durand".to_string(),
            email: "anna@acme.example".to_string(),
            company_name: "Acme SPRL".to_string(),
            vat_number: Some("BE0123456789".to_string()),
            address: Some("12 rue des Ateliers".to_string()),
            city: Some("Bruxelles".to_string()),
            postal_code: Some("1000".to_string()),
            country: Some("Belgique".to_string()),
        });
        full.company = Some(CompanyBranding {
            name: "iTakecare".to_string(),
            logo_url: None,
            primary_color: Some("#33638E".to_string()),
            secondary_color: Some("#DAE3EB".to_string()),
            accent_color: None,
        });
        full.offer.signed_at = Some(Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap());
        full.offer.signer_name = Some("Marc Petit".to_string());
        full.offer.remarks = Some("Livraison souhaitée avant fin avril".to_string());

        let rendered = render_offer(&full).expect("render failed");
        assert!(rendered.bytes.starts_with(b"%PDF"));
        assert_eq!(rendered.pages, 1);
        assert!(rendered.bytes.len() > 1500);
    }

    #[test]
    fn the_client_block_falls_back_to_the_offer_snapshot() {
        let lines = client_block_lines(&data(vec![]));
        assert_eq!(lines, vec!["Anna Durand".to_string(), "anna@acme.example".to_string()]);
    }
}
