use annex9::{FieldValue, OrderData};
use image::{ImageFormat, Rgba, RgbaImage};
use serde_json::{Value, json};
use std::io::Cursor;

/// Every required field of the bundled template plus a return trip.
pub fn full_order() -> OrderData {
    aller_only_order()
        .with("service_type", "aller_retour")
        .with("retour_date", "14/11/2024")
        .with("retour_time", "17:45")
        .with("retour_departure", "Gare de Namur, quai 3")
        .with("retour_destination", "Rue de Fer 12")
        .with("retour_price", 14.0)
}

/// An outbound-only order: no `retour_*` values at all.
pub fn aller_only_order() -> OrderData {
    OrderData::new()
        .with("reservation_date", "04/11/2024")
        .with("reservation_number", "R-7781")
        .with("operator_title", "Société")
        .with("operator_name", "Taxis Mosans SPRL")
        .with("operator_address", "Chaussée de Liège")
        .with("operator_address_number", "214")
        .with("operator_postal_code", "5100")
        .with("operator_locality", "Jambes")
        .with("operator_bce_number", "0456.789.123")
        .with("client_title", "Monsieur")
        .with("client_name", "Jean Dupont")
        .with("client_address", "Rue de Fer")
        .with("client_address_number", "12")
        .with("client_postal_code", "5000")
        .with("client_locality", "Namur")
        .with("client_phone", "081 22 33 44")
        .with("passengers_adult", 2i64)
        .with("passengers_child", 1i64)
        .with("service_type", "aller")
        .with("aller_date", "12/11/2024")
        .with("aller_time", "08:15")
        .with("aller_departure", "Rue de Fer 12, Namur")
        .with("aller_destination", "Gare de Namur")
        .with("aller_price", 12.5)
}

pub fn with_signature(data: OrderData) -> OrderData {
    data.with("client_signature", FieldValue::image(signature_png(120, 40)))
}

/// A small RGBA PNG with a transparent background and an opaque stroke.
pub fn signature_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        if y == height / 2 || x == y {
            Rgba([0, 0, 80, 255])
        } else {
            Rgba([255, 255, 255, 0])
        }
    });
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png)
        .expect("encode png");
    bytes.into_inner()
}

/// A one-field A4 template in the JSON layout format.
pub fn single_field_template(version: &str, field: Value) -> Value {
    json!({
        "version": version,
        "page": { "size": "A4" },
        "fonts": [{ "name": "Helvetica" }],
        "fields": [field]
    })
}

pub fn text_field(key: &str, x: f32, y: f32, w: f32, h: f32) -> Value {
    json!({ "key": key, "type": "text", "required": true, "box_mm": { "x": x, "y": y, "w": w, "h": h } })
}

/// A one-page PDF whose only content is a diagonal stroke.
pub fn background_pdf(width_pt: f32, height_pt: f32) -> Vec<u8> {
    background_pdf_at((0.0, 0.0), width_pt, height_pt)
}

/// Same as [`background_pdf`] with the MediaBox starting at `origin`.
pub fn background_pdf_at(origin: (f32, f32), width_pt: f32, height_pt: f32) -> Vec<u8> {
    use lopdf::{Document, Object, Stream, dictionary};

    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(dictionary! {}, b"0 0 m 100 100 l S".to_vec()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            Object::Real(origin.0),
            Object::Real(origin.1),
            Object::Real(origin.0 + width_pt),
            Object::Real(origin.1 + height_pt),
        ],
        "Contents" => content_id,
        "Resources" => dictionary! {},
    });
    doc.objects.insert(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }
        .into(),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut out = Vec::new();
    doc.save_to(&mut out).expect("serialize background");
    out
}
