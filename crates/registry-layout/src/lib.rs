//! Layout extraction for registry certificate PDFs.
//!
//! Turns a PDF byte stream into per-page [`PageLayout`] values: positioned
//! characters with color, stroked rule lines, and filled rectangles, all in
//! top-left coordinates. Watermark-grey chars are filtered out before a page
//! is returned, so downstream consumers never see viewing-copy ink.

pub mod content;
pub mod error;
pub mod fonts;
pub mod geometry;
pub mod grid;
pub mod page;
pub mod textline;

pub use error::LayoutError;
pub use geometry::{BBox, Matrix, Rgb, BLACK};
pub use grid::{cell_grid, CellGrid, GridRow};
pub use page::{Char, LayoutOptions, PageLayout, Rect, RuleLine};
pub use textline::{assemble_lines, TextLine};

use content::{interpret_stream, GraphicsStateSeed, PageSink};

/// A loaded PDF with its page list resolved.
pub struct LayoutDocument {
    inner: lopdf::Document,
    page_ids: Vec<lopdf::ObjectId>,
}

impl std::fmt::Debug for LayoutDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutDocument")
            .field("page_count", &self.page_ids.len())
            .finish_non_exhaustive()
    }
}

impl LayoutDocument {
    pub fn load(bytes: &[u8]) -> Result<Self, LayoutError> {
        let inner = lopdf::Document::load_mem(bytes)
            .map_err(|e| LayoutError::Parse(format!("failed to load PDF: {e}")))?;
        let page_ids: Vec<lopdf::ObjectId> = inner.get_pages().values().copied().collect();
        Ok(Self { inner, page_ids })
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Extract one page. Grey-band chars are dropped per `opts` before the
    /// layout is returned.
    pub fn extract_page(
        &self,
        index: usize,
        opts: &LayoutOptions,
    ) -> Result<PageLayout, LayoutError> {
        let page_id = *self
            .page_ids
            .get(index)
            .ok_or(LayoutError::PageIndex {
                index,
                count: self.page_ids.len(),
            })?;

        let media_box = self.media_box(page_id)?;
        let width = media_box.2 - media_box.0;
        let height = media_box.3 - media_box.1;

        let content_bytes = self.content_bytes(page_id)?;
        let resources = self.resources(page_id)?;

        let mut sink = PageSink::default();
        interpret_stream(
            &self.inner,
            &content_bytes,
            resources,
            height,
            GraphicsStateSeed::page(),
            0,
            &mut sink,
        )?;

        let total = sink.chars.len();
        let chars: Vec<Char> = sink
            .chars
            .into_iter()
            .filter(|c| {
                !c.color
                    .in_grey_band(opts.watermark_grey_min, opts.watermark_grey_max)
            })
            .collect();
        tracing::debug!(
            page = index,
            kept = chars.len(),
            dropped = total - chars.len(),
            "extracted page layout"
        );

        Ok(PageLayout {
            index,
            width,
            height,
            chars,
            lines: sink.lines,
            rects: sink.rects,
        })
    }

    /// Extract all pages in order.
    pub fn extract_all(&self, opts: &LayoutOptions) -> Result<Vec<PageLayout>, LayoutError> {
        (0..self.page_count())
            .map(|i| self.extract_page(i, opts))
            .collect()
    }

    fn media_box(&self, page_id: lopdf::ObjectId) -> Result<(f64, f64, f64, f64), LayoutError> {
        let obj = self
            .resolve_inherited(page_id, b"MediaBox")?
            .ok_or_else(|| LayoutError::Parse("MediaBox not found on page or ancestors".into()))?;
        let arr = obj
            .as_array()
            .map_err(|e| LayoutError::Parse(format!("MediaBox is not an array: {e}")))?;
        if arr.len() != 4 {
            return Err(LayoutError::Parse(format!(
                "expected 4-element MediaBox, got {}",
                arr.len()
            )));
        }
        let n = |o: &lopdf::Object| match o {
            lopdf::Object::Integer(i) => Ok(*i as f64),
            lopdf::Object::Real(f) => Ok(*f as f64),
            other => Err(LayoutError::Parse(format!("expected number, got {other:?}"))),
        };
        Ok((n(&arr[0])?, n(&arr[1])?, n(&arr[2])?, n(&arr[3])?))
    }

    /// Walk up the page tree via /Parent for inheritable attributes.
    fn resolve_inherited(
        &self,
        page_id: lopdf::ObjectId,
        key: &[u8],
    ) -> Result<Option<&lopdf::Object>, LayoutError> {
        let mut current_id = page_id;
        loop {
            let dict = self
                .inner
                .get_object(current_id)
                .and_then(|o| o.as_dict())
                .map_err(|e| LayoutError::Parse(format!("failed to get page dictionary: {e}")))?;

            if let Ok(value) = dict.get(key) {
                return Ok(Some(value));
            }

            match dict.get(b"Parent") {
                Ok(parent) => {
                    current_id = parent.as_reference().map_err(|e| {
                        LayoutError::Parse(format!("invalid /Parent reference: {e}"))
                    })?;
                }
                Err(_) => return Ok(None),
            }
        }
    }

    /// Collect content stream bytes; /Contents may be a single stream or an
    /// array of streams.
    fn content_bytes(&self, page_id: lopdf::ObjectId) -> Result<Vec<u8>, LayoutError> {
        let dict = self
            .inner
            .get_object(page_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| LayoutError::Parse(format!("failed to get page dictionary: {e}")))?;

        let contents = match dict.get(b"Contents") {
            Ok(obj) => obj,
            Err(_) => return Ok(Vec::new()),
        };

        let decode = |stream: &lopdf::Stream| -> Result<Vec<u8>, LayoutError> {
            if stream.dict.get(b"Filter").is_ok() {
                stream.decompressed_content().map_err(|e| {
                    LayoutError::Parse(format!("failed to decompress content stream: {e}"))
                })
            } else {
                Ok(stream.content.clone())
            }
        };

        match contents {
            lopdf::Object::Reference(id) => {
                let stream = self
                    .inner
                    .get_object(*id)
                    .and_then(|o| o.as_stream())
                    .map_err(|e| LayoutError::Parse(format!("/Contents is not a stream: {e}")))?;
                decode(stream)
            }
            lopdf::Object::Array(arr) => {
                let mut bytes = Vec::new();
                for item in arr {
                    let id = item.as_reference().map_err(|e| {
                        LayoutError::Parse(format!("/Contents array item is not a reference: {e}"))
                    })?;
                    let stream =
                        self.inner.get_object(id).and_then(|o| o.as_stream()).map_err(|e| {
                            LayoutError::Parse(format!("/Contents array item is not a stream: {e}"))
                        })?;
                    if !bytes.is_empty() {
                        bytes.push(b' ');
                    }
                    bytes.extend_from_slice(&decode(stream)?);
                }
                Ok(bytes)
            }
            _ => Err(LayoutError::Parse(
                "/Contents is not a reference or array".into(),
            )),
        }
    }

    fn resources(&self, page_id: lopdf::ObjectId) -> Result<&lopdf::Dictionary, LayoutError> {
        match self.resolve_inherited(page_id, b"Resources")? {
            Some(obj) => {
                let obj = match obj {
                    lopdf::Object::Reference(id) => self.inner.get_object(*id).map_err(|e| {
                        LayoutError::Parse(format!("failed to resolve /Resources: {e}"))
                    })?,
                    other => other,
                };
                obj.as_dict()
                    .map_err(|_| LayoutError::Parse("/Resources is not a dictionary".into()))
            }
            None => {
                static EMPTY: std::sync::LazyLock<lopdf::Dictionary> =
                    std::sync::LazyLock::new(lopdf::Dictionary::new);
                Ok(&EMPTY)
            }
        }
    }
}

#[cfg(test)]
pub mod testpdf {
    //! In-memory single-page PDF builder for tests.

    use lopdf::{dictionary, Document, Object, ObjectId, Stream};

    /// One page, A4, Helvetica as /F1, with the given content stream.
    pub fn single_page(content: &[u8]) -> Vec<u8> {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_invalid_bytes_fails() {
        assert!(LayoutDocument::load(b"not a pdf").is_err());
    }

    #[test]
    fn test_extract_simple_text() {
        let pdf = testpdf::single_page(b"BT /F1 12 Tf 72 700 Td (Hi) Tj ET");
        let doc = LayoutDocument::load(&pdf).unwrap();
        assert_eq!(doc.page_count(), 1);
        let page = doc.extract_page(0, &LayoutOptions::default()).unwrap();
        assert_eq!(page.chars.len(), 2);
        assert_eq!(page.chars[0].text, "H");
        assert_eq!(page.chars[1].text, "i");
        // y = 700 in PDF space lands near top = 842 - 700 - ascent
        assert!(page.chars[0].bbox.top < 200.0);
    }

    #[test]
    fn test_grey_watermark_chars_dropped() {
        let pdf = testpdf::single_page(
            b"BT /F1 12 Tf 0.8 0.8 0.8 rg 72 700 Td (WM) Tj 0 0 0 rg 0 -50 Td (ok) Tj ET",
        );
        let doc = LayoutDocument::load(&pdf).unwrap();
        let page = doc.extract_page(0, &LayoutOptions::default()).unwrap();
        let text: String = page.chars.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(text, "ok");
    }

    #[test]
    fn test_red_line_survives_extraction() {
        let pdf = testpdf::single_page(b"1 0 0 RG 50 500 m 500 500 l S");
        let doc = LayoutDocument::load(&pdf).unwrap();
        let page = doc.extract_page(0, &LayoutOptions::default()).unwrap();
        assert_eq!(page.lines.len(), 1);
        assert!(page.lines[0].color.is_reddish(0.7, 0.3));
        assert!(page.lines[0].is_horizontal());
    }

    #[test]
    fn test_page_index_out_of_range() {
        let pdf = testpdf::single_page(b"");
        let doc = LayoutDocument::load(&pdf).unwrap();
        let err = doc.extract_page(3, &LayoutOptions::default()).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
