//! Content-stream interpretation.
//!
//! Walks a page's content operations and emits positioned characters,
//! stroked rule lines, and filled rectangles in top-left coordinates.
//! Only the operators registry certificates actually use are handled;
//! unknown operators are skipped.

use std::collections::HashMap;

use crate::error::LayoutError;
use crate::fonts::FontInfo;
use crate::geometry::{BBox, Matrix, Rgb, BLACK};
use crate::page::{Char, Rect, RuleLine};

const MAX_XOBJECT_DEPTH: usize = 8;
// Glyph box extents relative to the baseline, as a fraction of font size.
const ASCENT: f64 = 0.8;
const DESCENT: f64 = 0.2;

#[derive(Debug, Clone, Copy)]
struct GraphicsState {
    ctm: Matrix,
    fill: Rgb,
    stroke: Rgb,
}

#[derive(Debug, Clone)]
struct TextState {
    font: Option<String>,
    size: f64,
    char_spacing: f64,
    word_spacing: f64,
    h_scale: f64,
    leading: f64,
    tm: Matrix,
    tlm: Matrix,
}

impl TextState {
    fn new() -> Self {
        Self {
            font: None,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scale: 1.0,
            leading: 0.0,
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
        }
    }

    fn next_line(&mut self, tx: f64, ty: f64) {
        self.tlm = Matrix::translation(tx, ty).then(&self.tlm);
        self.tm = self.tlm;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PathSegment {
    Line { x0: f64, y0: f64, x1: f64, y1: f64 },
    Rect { x: f64, y: f64, w: f64, h: f64 },
}

/// Accumulates interpreter output for one page.
#[derive(Debug, Default)]
pub(crate) struct PageSink {
    pub chars: Vec<Char>,
    pub lines: Vec<RuleLine>,
    pub rects: Vec<Rect>,
}

fn num(obj: &lopdf::Object) -> Option<f64> {
    match obj {
        lopdf::Object::Integer(i) => Some(*i as f64),
        lopdf::Object::Real(f) => Some(*f as f64),
        _ => None,
    }
}

fn deref<'a>(doc: &'a lopdf::Document, obj: &'a lopdf::Object) -> &'a lopdf::Object {
    match obj {
        lopdf::Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

fn cmyk_to_rgb(c: f32, m: f32, y: f32, k: f32) -> Rgb {
    Rgb::new((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k))
}

/// Read a color from operator operands: 1 component is grey, 3 is RGB,
/// 4 is CMYK. Anything else leaves the color unchanged.
fn color_from_operands(operands: &[lopdf::Object], current: Rgb) -> Rgb {
    let nums: Vec<f32> = operands.iter().filter_map(|o| num(o).map(|v| v as f32)).collect();
    match nums.as_slice() {
        [v] => Rgb::new(*v, *v, *v),
        [r, g, b] => Rgb::new(*r, *g, *b),
        [c, m, y, k] => cmyk_to_rgb(*c, *m, *y, *k),
        _ => current,
    }
}

fn font_resource<'a>(
    doc: &'a lopdf::Document,
    resources: &'a lopdf::Dictionary,
    name: &str,
) -> Option<&'a lopdf::Object> {
    let fonts = deref(doc, resources.get(b"Font").ok()?).as_dict().ok()?;
    fonts.get(name.as_bytes()).ok()
}

pub(crate) fn interpret_stream(
    doc: &lopdf::Document,
    content_bytes: &[u8],
    resources: &lopdf::Dictionary,
    page_height: f64,
    base: GraphicsStateSeed,
    depth: usize,
    sink: &mut PageSink,
) -> Result<(), LayoutError> {
    if depth > MAX_XOBJECT_DEPTH {
        tracing::warn!(depth, "form xobject nesting too deep, skipping");
        return Ok(());
    }

    let content = lopdf::content::Content::decode(content_bytes)
        .map_err(|e| LayoutError::Parse(format!("failed to decode content stream: {e}")))?;

    let mut gs = GraphicsState {
        ctm: base.ctm,
        fill: base.fill,
        stroke: base.stroke,
    };
    let mut gs_stack: Vec<GraphicsState> = Vec::new();
    let mut ts = TextState::new();
    let mut fonts: HashMap<String, FontInfo> = HashMap::new();

    let mut path: Vec<PathSegment> = Vec::new();
    let mut current_point: Option<(f64, f64)> = None;
    let mut subpath_start: Option<(f64, f64)> = None;

    for op in &content.operations {
        let ops = &op.operands;
        match op.operator.as_str() {
            // ==== graphics state ====
            "q" => gs_stack.push(gs),
            "Q" => {
                if let Some(prev) = gs_stack.pop() {
                    gs = prev;
                }
            }
            "cm" => {
                if ops.len() == 6 {
                    let vals: Vec<f64> = ops.iter().filter_map(num).collect();
                    if vals.len() == 6 {
                        let m = Matrix::new(vals[0], vals[1], vals[2], vals[3], vals[4], vals[5]);
                        gs.ctm = m.then(&gs.ctm);
                    }
                }
            }

            // ==== color ====
            "rg" | "sc" | "scn" => gs.fill = color_from_operands(ops, gs.fill),
            "RG" | "SC" | "SCN" => gs.stroke = color_from_operands(ops, gs.stroke),
            "g" => gs.fill = color_from_operands(ops, gs.fill),
            "G" => gs.stroke = color_from_operands(ops, gs.stroke),
            "k" => gs.fill = color_from_operands(ops, gs.fill),
            "K" => gs.stroke = color_from_operands(ops, gs.stroke),

            // ==== text ====
            "BT" => {
                ts.tm = Matrix::IDENTITY;
                ts.tlm = Matrix::IDENTITY;
            }
            "ET" => {}
            "Tf" => {
                if let (Some(lopdf::Object::Name(name)), Some(size)) =
                    (ops.first(), ops.get(1).and_then(num))
                {
                    let name = String::from_utf8_lossy(name).into_owned();
                    if !fonts.contains_key(&name) {
                        if let Some(obj) = font_resource(doc, resources, &name) {
                            match FontInfo::load(doc, obj) {
                                Ok(info) => {
                                    fonts.insert(name.clone(), info);
                                }
                                Err(e) => {
                                    tracing::debug!(font = %name, error = %e, "unloadable font");
                                }
                            }
                        }
                    }
                    ts.font = Some(name);
                    ts.size = size;
                }
            }
            "Tc" => ts.char_spacing = ops.first().and_then(num).unwrap_or(0.0),
            "Tw" => ts.word_spacing = ops.first().and_then(num).unwrap_or(0.0),
            "Tz" => ts.h_scale = ops.first().and_then(num).unwrap_or(100.0) / 100.0,
            "TL" => ts.leading = ops.first().and_then(num).unwrap_or(0.0),
            "Tm" => {
                let vals: Vec<f64> = ops.iter().filter_map(num).collect();
                if vals.len() == 6 {
                    ts.tm = Matrix::new(vals[0], vals[1], vals[2], vals[3], vals[4], vals[5]);
                    ts.tlm = ts.tm;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (ops.first().and_then(num), ops.get(1).and_then(num))
                {
                    ts.next_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (ops.first().and_then(num), ops.get(1).and_then(num))
                {
                    ts.leading = -ty;
                    ts.next_line(tx, ty);
                }
            }
            "T*" => {
                let leading = ts.leading;
                ts.next_line(0.0, -leading);
            }
            "Tj" => {
                if let Some(lopdf::Object::String(bytes, _)) = ops.first() {
                    show_text(bytes, &fonts, &mut ts, &gs, page_height, sink);
                }
            }
            "'" => {
                let leading = ts.leading;
                ts.next_line(0.0, -leading);
                if let Some(lopdf::Object::String(bytes, _)) = ops.first() {
                    show_text(bytes, &fonts, &mut ts, &gs, page_height, sink);
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac)) = (ops.first().and_then(num), ops.get(1).and_then(num))
                {
                    ts.word_spacing = aw;
                    ts.char_spacing = ac;
                }
                let leading = ts.leading;
                ts.next_line(0.0, -leading);
                if let Some(lopdf::Object::String(bytes, _)) = ops.get(2) {
                    show_text(bytes, &fonts, &mut ts, &gs, page_height, sink);
                }
            }
            "TJ" => {
                if let Some(lopdf::Object::Array(items)) = ops.first() {
                    for item in items {
                        match item {
                            lopdf::Object::String(bytes, _) => {
                                show_text(bytes, &fonts, &mut ts, &gs, page_height, sink);
                            }
                            other => {
                                if let Some(adj) = num(other) {
                                    let tx = -adj / 1000.0 * ts.size * ts.h_scale;
                                    ts.tm = Matrix::translation(tx, 0.0).then(&ts.tm);
                                }
                            }
                        }
                    }
                }
            }

            // ==== paths ====
            "m" => {
                if let (Some(x), Some(y)) = (ops.first().and_then(num), ops.get(1).and_then(num)) {
                    current_point = Some((x, y));
                    subpath_start = Some((x, y));
                }
            }
            "l" => {
                if let (Some(x), Some(y)) = (ops.first().and_then(num), ops.get(1).and_then(num)) {
                    if let Some((px, py)) = current_point {
                        path.push(PathSegment::Line {
                            x0: px,
                            y0: py,
                            x1: x,
                            y1: y,
                        });
                    }
                    current_point = Some((x, y));
                }
            }
            "h" => {
                if let (Some((px, py)), Some((sx, sy))) = (current_point, subpath_start) {
                    path.push(PathSegment::Line {
                        x0: px,
                        y0: py,
                        x1: sx,
                        y1: sy,
                    });
                    current_point = Some((sx, sy));
                }
            }
            "re" => {
                let vals: Vec<f64> = ops.iter().filter_map(num).collect();
                if vals.len() == 4 {
                    path.push(PathSegment::Rect {
                        x: vals[0],
                        y: vals[1],
                        w: vals[2],
                        h: vals[3],
                    });
                }
            }
            "S" | "s" => {
                emit_stroked(&path, &gs, page_height, sink);
                path.clear();
                current_point = None;
            }
            "f" | "F" | "f*" => {
                emit_filled(&path, &gs, page_height, sink);
                path.clear();
                current_point = None;
            }
            "B" | "B*" | "b" | "b*" => {
                emit_stroked(&path, &gs, page_height, sink);
                emit_filled(&path, &gs, page_height, sink);
                path.clear();
                current_point = None;
            }
            "n" => {
                path.clear();
                current_point = None;
            }

            // ==== form xobjects ====
            "Do" => {
                if let Some(lopdf::Object::Name(name)) = ops.first() {
                    run_form_xobject(doc, resources, name, page_height, &gs, depth, sink)?;
                }
            }

            _ => {}
        }
    }

    Ok(())
}

pub(crate) struct GraphicsStateSeed {
    pub ctm: Matrix,
    pub fill: Rgb,
    pub stroke: Rgb,
}

impl GraphicsStateSeed {
    pub fn page() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            fill: BLACK,
            stroke: BLACK,
        }
    }
}

fn show_text(
    bytes: &[u8],
    fonts: &HashMap<String, FontInfo>,
    ts: &mut TextState,
    gs: &GraphicsState,
    page_height: f64,
    sink: &mut PageSink,
) {
    let Some(font) = ts.font.as_ref().and_then(|n| fonts.get(n)) else {
        return;
    };

    for (text, width_units) in font.decode(bytes) {
        let trm = Matrix::new(ts.size, 0.0, 0.0, ts.size, 0.0, 0.0)
            .then(&ts.tm)
            .then(&gs.ctm);
        let (x, y) = trm.apply(0.0, 0.0);
        let eff_size = ts.size * ts.tm.y_scale() * gs.ctm.y_scale();

        let mut advance = width_units / 1000.0 * ts.size + ts.char_spacing;
        if text == " " {
            advance += ts.word_spacing;
        }
        let advance = advance * ts.h_scale;
        ts.tm = Matrix::translation(advance, 0.0).then(&ts.tm);
        let (x_next, _) = Matrix::new(ts.size, 0.0, 0.0, ts.size, 0.0, 0.0)
            .then(&ts.tm)
            .then(&gs.ctm)
            .apply(0.0, 0.0);

        if text.trim().is_empty() {
            continue;
        }

        sink.chars.push(Char {
            text,
            bbox: BBox::new(
                x.min(x_next),
                page_height - (y + eff_size * ASCENT),
                x.max(x_next),
                page_height - (y - eff_size * DESCENT),
            ),
            color: gs.fill,
        });
    }
}

fn emit_stroked(path: &[PathSegment], gs: &GraphicsState, page_height: f64, sink: &mut PageSink) {
    for seg in path {
        match *seg {
            PathSegment::Line { x0, y0, x1, y1 } => {
                let (dx0, dy0) = gs.ctm.apply(x0, y0);
                let (dx1, dy1) = gs.ctm.apply(x1, y1);
                sink.lines.push(RuleLine {
                    x0: dx0.min(dx1),
                    y0: page_height - dy0.max(dy1),
                    x1: dx0.max(dx1),
                    y1: page_height - dy0.min(dy1),
                    color: gs.stroke,
                });
            }
            PathSegment::Rect { x, y, w, h } => {
                // Stroked rect becomes its four edges; only the outline
                // matters for ruling detection
                let (x0, y0) = gs.ctm.apply(x, y);
                let (x1, y1) = gs.ctm.apply(x + w, y + h);
                let (top, bottom) = (page_height - y1.max(y0), page_height - y1.min(y0));
                let (left, right) = (x0.min(x1), x0.max(x1));
                for (ax0, ay0, ax1, ay1) in [
                    (left, top, right, top),
                    (left, bottom, right, bottom),
                    (left, top, left, bottom),
                    (right, top, right, bottom),
                ] {
                    sink.lines.push(RuleLine {
                        x0: ax0,
                        y0: ay0,
                        x1: ax1,
                        y1: ay1,
                        color: gs.stroke,
                    });
                }
            }
        }
    }
}

fn emit_filled(path: &[PathSegment], gs: &GraphicsState, page_height: f64, sink: &mut PageSink) {
    for seg in path {
        if let PathSegment::Rect { x, y, w, h } = *seg {
            let (x0, y0) = gs.ctm.apply(x, y);
            let (x1, y1) = gs.ctm.apply(x + w, y + h);
            sink.rects.push(Rect {
                bbox: BBox::new(
                    x0.min(x1),
                    page_height - y0.max(y1),
                    x0.max(x1),
                    page_height - y0.min(y1),
                ),
                color: gs.fill,
            });
        }
    }
}

fn run_form_xobject(
    doc: &lopdf::Document,
    resources: &lopdf::Dictionary,
    name: &[u8],
    page_height: f64,
    gs: &GraphicsState,
    depth: usize,
    sink: &mut PageSink,
) -> Result<(), LayoutError> {
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .map(|o| deref(doc, o))
        .and_then(|o| o.as_dict().ok())
    else {
        return Ok(());
    };
    let Some(stream) = xobjects
        .get(name)
        .ok()
        .map(|o| deref(doc, o))
        .and_then(|o| o.as_stream().ok())
    else {
        return Ok(());
    };

    let subtype = stream
        .dict
        .get(b"Subtype")
        .ok()
        .and_then(|o| o.as_name().ok());
    if subtype != Some(b"Form".as_slice()) {
        return Ok(());
    }

    let bytes = if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|e| LayoutError::Parse(format!("failed to decompress form xobject: {e}")))?
    } else {
        stream.content.clone()
    };

    let mut ctm = gs.ctm;
    if let Ok(matrix_obj) = stream.dict.get(b"Matrix") {
        if let Ok(arr) = deref(doc, matrix_obj).as_array() {
            let vals: Vec<f64> = arr.iter().filter_map(num).collect();
            if vals.len() == 6 {
                ctm = Matrix::new(vals[0], vals[1], vals[2], vals[3], vals[4], vals[5]).then(&ctm);
            }
        }
    }

    // Form resources fall back to the parent's when absent
    let form_resources = stream
        .dict
        .get(b"Resources")
        .ok()
        .map(|o| deref(doc, o))
        .and_then(|o| o.as_dict().ok())
        .unwrap_or(resources);

    interpret_stream(
        doc,
        &bytes,
        form_resources,
        page_height,
        GraphicsStateSeed {
            ctm,
            fill: gs.fill,
            stroke: gs.stroke,
        },
        depth + 1,
        sink,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(content: &[u8]) -> PageSink {
        let doc = lopdf::Document::with_version("1.5");
        let resources = lopdf::Dictionary::new();
        let mut sink = PageSink::default();
        interpret_stream(
            &doc,
            content,
            &resources,
            842.0,
            GraphicsStateSeed::page(),
            0,
            &mut sink,
        )
        .unwrap();
        sink
    }

    #[test]
    fn test_stroked_line_flipped_to_top_left() {
        let sink = run(b"1 0 0 RG 50 742 m 400 742 l S");
        assert_eq!(sink.lines.len(), 1);
        let line = &sink.lines[0];
        assert!((line.y0 - 100.0).abs() < 0.01);
        assert!(line.is_horizontal());
        assert!(line.color.is_reddish(0.7, 0.3));
    }

    #[test]
    fn test_filled_rect_uses_fill_color() {
        let sink = run(b"0.8 0.8 0.8 rg 10 10 100 20 re f");
        assert_eq!(sink.rects.len(), 1);
        assert!(sink.rects[0].color.in_grey_band(0.5, 1.0));
        assert!((sink.rects[0].bbox.bottom - 832.0).abs() < 0.01);
    }

    #[test]
    fn test_q_restores_color_and_ctm() {
        let sink = run(b"q 1 0 0 rg 0 0 10 10 re f Q 0 0 10 10 re f");
        assert_eq!(sink.rects.len(), 2);
        assert!(sink.rects[0].color.is_reddish(0.7, 0.3));
        assert_eq!(sink.rects[1].color, BLACK);
    }

    #[test]
    fn test_text_without_font_resource_is_skipped() {
        let sink = run(b"BT /F9 12 Tf 72 700 Td (Hi) Tj ET");
        assert!(sink.chars.is_empty());
    }
}
