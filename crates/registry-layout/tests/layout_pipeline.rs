//! End-to-end layout extraction over an in-memory PDF: a ruled two-row
//! table with text in its cells, plus watermark-grey ink that must never
//! reach the grid.

use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use registry_layout::{assemble_lines, cell_grid, LayoutDocument, LayoutOptions};

/// One A4 page with Helvetica as /F1 and the given content stream.
fn single_page(content: &[u8]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let stream = Stream::new(lopdf::Dictionary::new(), content.to_vec());
    let content_id = doc.add_object(Object::Stream(stream));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        "Contents" => content_id,
        "Resources" => Object::Dictionary(dictionary! {
            "Font" => Object::Dictionary(dictionary! {
                "F1" => font_id,
            }),
        }),
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::from(page_id)],
            "Count" => 1i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save test PDF");
    buf
}

// Three horizontal and three vertical rulings form a 2x2 frame between
// y=642 and y=742 in PDF space; text baselines sit inside the two bands.
const TABLE_STREAM: &[u8] = b"\
40 742 m 560 742 l S \
40 692 m 560 692 l S \
40 642 m 560 642 l S \
40 642 m 40 742 l S \
150 642 m 150 742 l S \
560 642 m 560 742 l S \
BT /F1 10 Tf 60 700 Td (1) Tj ET \
BT /F1 10 Tf 200 700 Td (AB) Tj ET \
BT /F1 10 Tf 60 650 Td (2) Tj ET";

#[test]
fn ruled_table_becomes_two_grid_rows() {
    let pdf = single_page(TABLE_STREAM);
    let doc = LayoutDocument::load(&pdf).unwrap();
    assert_eq!(doc.page_count(), 1);

    let opts = LayoutOptions::default();
    let page = doc.extract_page(0, &opts).unwrap();
    let grid = cell_grid(&page, &opts);

    assert_eq!(grid.rows.len(), 2);
    assert_eq!(grid.rows[0].cells, vec!["1".to_string(), "AB".to_string()]);
    assert_eq!(grid.rows[1].cells[0], "2");
    assert!(grid.rows[1].cells[1].is_empty());
    assert!(grid.rows[0].bottom <= grid.rows[1].top + 1.0);
}

#[test]
fn text_lines_come_out_top_to_bottom() {
    let pdf = single_page(TABLE_STREAM);
    let doc = LayoutDocument::load(&pdf).unwrap();
    let page = doc.extract_page(0, &LayoutOptions::default()).unwrap();

    let lines = assemble_lines(&page.chars);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].text.contains('1'));
    assert!(lines[0].text.contains("AB"));
    assert!(lines[1].text.contains('2'));
    assert!(lines[0].top < lines[1].top);
}

#[test]
fn grey_ink_never_reaches_the_grid() {
    let mut stream = TABLE_STREAM.to_vec();
    stream.extend_from_slice(b" 0.8 0.8 0.8 rg BT /F1 30 Tf 70 655 Td (WM) Tj ET");

    let pdf = single_page(&stream);
    let doc = LayoutDocument::load(&pdf).unwrap();
    let opts = LayoutOptions::default();
    let page = doc.extract_page(0, &opts).unwrap();

    assert!(page.chars.iter().all(|c| c.text != "W" && c.text != "M"));
    let grid = cell_grid(&page, &opts);
    assert_eq!(grid.rows[1].cells[0], "2");
}

#[test]
fn garbage_bytes_fail_to_load() {
    assert!(LayoutDocument::load(b"JVBERi0 not a pdf").is_err());
}
