mod common;

use annex9::{Annex9Error, Generator, InMemoryResourceProvider, OrderData, POINTS_PER_MM};
use common::fixtures::{background_pdf, background_pdf_at, single_field_template, text_field};
use common::*;
use std::sync::Arc;

const A4_PT: (f32, f32) = (595.28, 841.89);

fn with_background(background: &str) -> Arc<InMemoryResourceProvider> {
    let mut template = single_field_template("Bg1", text_field("client_name", 20.0, 80.0, 100.0, 7.0));
    template["background"] = background.into();
    let templates = InMemoryResourceProvider::new();
    templates
        .add("Bg1.json", serde_json::to_vec(&template).unwrap())
        .unwrap();
    Arc::new(templates)
}

fn assets(pdf: Vec<u8>) -> Arc<InMemoryResourceProvider> {
    let assets = InMemoryResourceProvider::new();
    assets.add("form.pdf", pdf).unwrap();
    Arc::new(assets)
}

#[test]
fn values_are_drawn_over_the_background_page() -> TestResult {
    let generator = Generator::builder()
        .with_provider(with_background("form.pdf"))
        .with_asset_provider(assets(background_pdf(A4_PT.0, A4_PT.1)))
        .build()?;
    let data = OrderData::new().with("client_name", "Jean Dupont");
    let doc = generator.render("Bg1", &data, &metadata("TC-BG1"))?;
    let pdf = GeneratedPdf::from_bytes(doc.bytes)?;

    assert_eq!(pdf.page_count(), 1);
    let ops = pdf.operations();
    // Background first, then the overlay on top of it.
    let stroke = ops.iter().position(|op| op.operator == "S").unwrap();
    let text = ops.iter().position(|op| op.operator == "Tj").unwrap();
    assert!(stroke < text);
    assert_eq!(pdf.shown_text(), vec!["Jean Dupont".to_string()]);

    let clip = pdf.clip_rects()[0];
    assert!(approx(clip[0], 20.0 * POINTS_PER_MM));
    assert!(approx(clip[1], (297.0 - 87.0) * POINTS_PER_MM));
    Ok(())
}

#[test]
fn overlay_follows_a_media_box_that_does_not_start_at_zero() -> TestResult {
    let generator = Generator::builder()
        .with_provider(with_background("form.pdf"))
        .with_asset_provider(assets(background_pdf_at((100.0, 100.0), A4_PT.0, A4_PT.1)))
        .build()?;
    let data = OrderData::new().with("client_name", "Jean Dupont");
    let doc = generator.render("Bg1", &data, &metadata("TC-BG4"))?;
    let pdf = GeneratedPdf::from_bytes(doc.bytes)?;

    let ops = pdf.operations();
    let stroke = ops.iter().position(|op| op.operator == "S").unwrap();
    let text = ops.iter().position(|op| op.operator == "Tj").unwrap();
    let shift = ops
        .iter()
        .position(|op| op.operator == "cm")
        .expect("overlay translation");
    assert!(stroke < shift && shift < text);
    let operands: Vec<f32> = ops[shift]
        .operands
        .iter()
        .map(|o| o.as_float().unwrap())
        .collect();
    assert_eq!(operands, vec![1.0, 0.0, 0.0, 1.0, 100.0, 100.0]);

    // Box coordinates stay relative to the page corner.
    let clip = pdf.clip_rects()[0];
    assert!(approx(clip[0], 20.0 * POINTS_PER_MM));
    assert!(approx(clip[1], (297.0 - 87.0) * POINTS_PER_MM));
    let run = pdf.run_starting_with("Jean").unwrap();
    assert!(run.x >= 20.0 * POINTS_PER_MM);
    Ok(())
}

#[test]
fn a_missing_background_is_a_template_error() {
    let generator = Generator::builder()
        .with_provider(with_background("form.pdf"))
        .build()
        .unwrap();
    let err = generator
        .render("Bg1", &OrderData::new().with("client_name", "X"), &metadata("TC-BG2"))
        .unwrap_err();
    assert!(matches!(err, Annex9Error::Template { .. }), "{err}");
}

#[test]
fn a_background_of_another_size_is_rejected() {
    let letter = Generator::builder()
        .with_provider(with_background("form.pdf"))
        .with_asset_provider(assets(background_pdf(612.0, 792.0)))
        .build()
        .unwrap();
    let err = letter.template("Bg1").unwrap_err();
    assert!(err.to_string().contains("form.pdf"), "{err}");
}
