//! Content stream operator model and serialization.
//!
//! The synthesizer only ever writes a small operator vocabulary: marked
//! content brackets, invisible text runs, and the artifact wrapper around a
//! page's original drawing operators. Operators are collected and then
//! serialized to the byte form defined by ISO 32000-1:2008 Sections 8-9.

use crate::error::Result;
use std::io::Write;

/// Properties attached to a BDC marked-content sequence.
///
/// The MCID links the sequence to its owning structure element through the
/// page's parent-tree array; ActualText carries the replacement text read by
/// assistive technology.
#[derive(Debug, Clone)]
pub struct MarkedContentProps {
    /// Marked content identifier, contiguous per page starting at 0
    pub mcid: u32,
    /// Replacement text for the whole sequence
    pub actual_text: String,
    /// Language of the sequence (BCP 47), if known
    pub lang: Option<String>,
}

/// Operations that can be written to a content stream.
#[derive(Debug, Clone)]
pub enum ContentOp {
    /// Begin marked content without properties (BMC)
    BeginMarkedContent(String),
    /// Begin marked content with a property dictionary (BDC)
    BeginMarkedContentProps {
        /// Structure tag for the sequence (e.g. "P", "H1")
        tag: String,
        /// MCID / ActualText / Lang properties
        props: MarkedContentProps,
    },
    /// End marked content (EMC)
    EndMarkedContent,
    /// Begin text object (BT)
    BeginText,
    /// End text object (ET)
    EndText,
    /// Set font and size (Tf)
    SetFont(String, f64),
    /// Set text rendering mode (Tr); mode 3 is invisible
    SetTextRenderMode(i32),
    /// Set text matrix (Tm)
    SetTextMatrix(f64, f64, f64, f64, f64, f64),
    /// Show text as a UTF-16BE hex string (Tj)
    ShowTextUnicode(String),
}

/// Builder for content streams.
///
/// Collects operations and serializes them to the byte sequence stored in a
/// stream object.
#[derive(Debug, Default)]
pub struct ContentStreamBuilder {
    operations: Vec<ContentOp>,
}

impl ContentStreamBuilder {
    /// Create a new content stream builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operation to the stream.
    pub fn op(&mut self, op: ContentOp) -> &mut Self {
        self.operations.push(op);
        self
    }

    /// Add multiple operations.
    pub fn ops(&mut self, ops: impl IntoIterator<Item = ContentOp>) -> &mut Self {
        self.operations.extend(ops);
        self
    }

    /// Build the content stream to bytes.
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();

        for op in &self.operations {
            write_op(&mut buf, op)?;
            writeln!(buf)?;
        }

        Ok(buf)
    }
}

/// Write a single operation to the buffer.
fn write_op<W: Write>(w: &mut W, op: &ContentOp) -> std::io::Result<()> {
    match op {
        ContentOp::BeginMarkedContent(tag) => write!(w, "/{} BMC", tag),
        ContentOp::BeginMarkedContentProps { tag, props } => {
            write!(w, "/{} <</MCID {} /ActualText ", tag, props.mcid)?;
            write_utf16_hex(w, &props.actual_text)?;
            if let Some(lang) = &props.lang {
                write!(w, " /Lang (")?;
                write_escaped_string(w, lang)?;
                write!(w, ")")?;
            }
            write!(w, ">> BDC")
        },
        ContentOp::EndMarkedContent => write!(w, "EMC"),
        ContentOp::BeginText => write!(w, "BT"),
        ContentOp::EndText => write!(w, "ET"),
        ContentOp::SetFont(name, size) => write!(w, "/{} {} Tf", name, size),
        ContentOp::SetTextRenderMode(mode) => write!(w, "{} Tr", mode),
        ContentOp::SetTextMatrix(a, b, c, d, e, f) => {
            write!(w, "{} {} {} {} {} {} Tm", a, b, c, d, e, f)
        },
        ContentOp::ShowTextUnicode(text) => {
            write_utf16_hex(w, text)?;
            write!(w, " Tj")
        },
    }
}

/// Write a string as a UTF-16BE hex string with a BOM (`<FEFF...>`).
fn write_utf16_hex<W: Write>(w: &mut W, text: &str) -> std::io::Result<()> {
    write!(w, "<FEFF")?;
    for unit in text.encode_utf16() {
        write!(w, "{:04X}", unit)?;
    }
    write!(w, ">")
}

/// Write an escaped PDF literal string body.
fn write_escaped_string<W: Write>(w: &mut W, text: &str) -> std::io::Result<()> {
    for byte in text.bytes() {
        match byte {
            b'(' => write!(w, "\\(")?,
            b')' => write!(w, "\\)")?,
            b'\\' => write!(w, "\\\\")?,
            b'\n' => write!(w, "\\n")?,
            b'\r' => write!(w, "\\r")?,
            b'\t' => write!(w, "\\t")?,
            _ => w.write_all(&[byte])?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_one(op: ContentOp) -> String {
        let mut builder = ContentStreamBuilder::new();
        builder.op(op);
        String::from_utf8(builder.build().unwrap()).unwrap()
    }

    #[test]
    fn test_artifact_bracket() {
        assert_eq!(build_one(ContentOp::BeginMarkedContent("Artifact".into())), "/Artifact BMC\n");
        assert_eq!(build_one(ContentOp::EndMarkedContent), "EMC\n");
    }

    #[test]
    fn test_bdc_with_props() {
        let out = build_one(ContentOp::BeginMarkedContentProps {
            tag: "P".into(),
            props: MarkedContentProps {
                mcid: 3,
                actual_text: "Hi".into(),
                lang: None,
            },
        });
        assert_eq!(out, "/P <</MCID 3 /ActualText <FEFF00480069>>> BDC\n");
    }

    #[test]
    fn test_bdc_with_lang() {
        let out = build_one(ContentOp::BeginMarkedContentProps {
            tag: "Span".into(),
            props: MarkedContentProps {
                mcid: 0,
                actual_text: "x".into(),
                lang: Some("en-US".into()),
            },
        });
        assert!(out.contains("/Lang (en-US)"));
        assert!(out.contains("/MCID 0"));
    }

    #[test]
    fn test_invisible_text_run() {
        let mut builder = ContentStreamBuilder::new();
        builder.ops([
            ContentOp::BeginText,
            ContentOp::SetFont("Helv".into(), 12.0),
            ContentOp::SetTextRenderMode(3),
            ContentOp::SetTextMatrix(1.0, 0.0, 0.0, 1.0, 36.0, 700.0),
            ContentOp::ShowTextUnicode("Hello".into()),
            ContentOp::EndText,
        ]);
        let out = String::from_utf8(builder.build().unwrap()).unwrap();
        assert!(out.contains("/Helv 12 Tf"));
        assert!(out.contains("3 Tr"));
        assert!(out.contains("1 0 0 1 36 700 Tm"));
        assert!(out.contains("<FEFF00480065006C006C006F> Tj"));
    }

    #[test]
    fn test_lang_escaping() {
        let out = build_one(ContentOp::BeginMarkedContentProps {
            tag: "P".into(),
            props: MarkedContentProps {
                mcid: 1,
                actual_text: String::new(),
                lang: Some("en(US)".into()),
            },
        });
        assert!(out.contains("(en\\(US\\))"));
    }
}
