use crate::output::SerializableElement;
use crate::xml_elem::Element;
use std::io;
use std::io::Write;

/// Writes matched elements one at a time, as they're found.
pub trait ElementWriter {
    fn write(&mut self, elem: &Element) -> io::Result<()>;

    /// Writes anything that has to come after the last element. Call this exactly once.
    fn finish(&mut self) -> io::Result<()>;

    /// Stops early, after a failure. Whatever was already written is closed off so that it's still well-formed, but
    /// nothing is added if nothing was written. Call this instead of [`Self::finish`].
    fn abandon(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes elements as `{"items":[...]}`, the same JSON that [`crate::output::SerializableXml`] produces.
///
/// Each element is written as soon as it's given, so a streaming search's results show up before the search ends.
pub struct JsonWriter<W: Write> {
    out: W,
    written: usize,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ElementWriter for JsonWriter<W> {
    fn write(&mut self, elem: &Element) -> io::Result<()> {
        if self.written == 0 {
            self.out.write_all(br#"{"items":["#)?;
        } else {
            self.out.write_all(b",")?;
        }
        serde_json::to_writer(&mut self.out, &SerializableElement::from(elem))?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        if self.written == 0 {
            self.out.write_all(br#"{"items":["#)?;
        }
        self.out.write_all(b"]}")?;
        self.out.flush()
    }

    fn abandon(&mut self) -> io::Result<()> {
        if self.written > 0 {
            self.out.write_all(b"]}")?;
        }
        self.out.flush()
    }
}

/// Writes each element's text on its own line.
pub struct PlainWriter<W: Write> {
    out: W,
}

impl<W: Write> PlainWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ElementWriter for PlainWriter<W> {
    fn write(&mut self, elem: &Element) -> io::Result<()> {
        writeln!(self.out, "{}", elem.text_content())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    fn abandon(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Drops everything. For quiet runs.
pub struct NullWriter;

impl ElementWriter for NullWriter {
    fn write(&mut self, _elem: &Element) -> io::Result<()> {
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::SerializableXml;

    fn elems() -> Vec<Element> {
        vec![
            Element::new("a").attr("k", "v").text("first"),
            Element::new("b").child(Element::new("c").text("inner")),
        ]
    }

    #[test]
    fn json_matches_serializable_form() {
        let elems = elems();
        let mut writer = JsonWriter::new(Vec::new());
        for elem in &elems {
            writer.write(elem).unwrap();
        }
        writer.finish().unwrap();
        let written = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(written, serde_json::to_string(&SerializableXml::new(&elems)).unwrap());
    }

    #[test]
    fn json_with_nothing_written() {
        let mut writer = JsonWriter::new(Vec::new());
        writer.finish().unwrap();
        assert_eq!(writer.into_inner(), br#"{"items":[]}"#);
    }

    #[test]
    fn json_abandoned_after_some_elements_is_still_json() {
        let elems = elems();
        let mut writer = JsonWriter::new(Vec::new());
        writer.write(&elems[0]).unwrap();
        writer.abandon().unwrap();
        let written = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(written, serde_json::to_string(&SerializableXml::new(&elems[..1])).unwrap());
    }

    #[test]
    fn json_abandoned_before_any_element_writes_nothing() {
        let mut writer = JsonWriter::new(Vec::new());
        writer.abandon().unwrap();
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn plain_writes_direct_text_only() {
        let mut writer = PlainWriter::new(Vec::new());
        for elem in &elems() {
            writer.write(elem).unwrap();
        }
        writer.finish().unwrap();
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), "first\n\n");
    }
}
