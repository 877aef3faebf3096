//! Minimal MARC21-xml reader for SRU responses.
//!
//! Only what reconciliation needs is extracted: the title proper (245 $a)
//! and personal names from the main and added entries (100 $a, 700 $a).

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::SourceError;
use crate::core::entry::normalize_author;

const TITLE_TAG: &str = "245";
const AUTHOR_TAGS: &[&str] = &["100", "700"];

/// Non-sorting markers some bibliographies wrap around leading articles
const NON_SORT_BEGIN: char = '\u{98}';
const NON_SORT_END: char = '\u{9C}';

/// Fields of one bibliographic record
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MarcFields {
    pub title: Option<String>,
    pub authors: Vec<String>,
}

/// Parse the first MARC record in `xml`.
///
/// Returns `None` when the document holds no record with data fields.
///
/// # Errors
///
/// Returns `SourceError::Xml` if the document is not well-formed.
pub fn parse_first_record(xml: &str) -> Result<Option<MarcFields>, SourceError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut fields = MarcFields::default();
    let mut seen_datafield = false;
    let mut current_tag: Option<String> = None;
    let mut current_code: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"datafield" => {
                    seen_datafield = true;
                    current_tag = attribute(e, b"tag")?;
                }
                b"subfield" => current_code = attribute(e, b"code")?,
                _ => {}
            },
            Event::End(ref e) => match e.local_name().as_ref() {
                b"datafield" => current_tag = None,
                b"subfield" => current_code = None,
                b"record" if seen_datafield => break,
                _ => {}
            },
            Event::Text(e) if current_code.as_deref() == Some("a") => {
                let text = e.unescape()?;
                match current_tag.as_deref() {
                    Some(TITLE_TAG) if fields.title.is_none() => {
                        fields.title = Some(clean_title(&text));
                    }
                    Some(tag) if AUTHOR_TAGS.contains(&tag) => {
                        let name = normalize_author(trim_isbd(&text));
                        if !name.is_empty() {
                            fields.authors.push(name);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(seen_datafield.then_some(fields))
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, SourceError> {
    let Some(attr) = element
        .try_get_attribute(key)
        .map_err(quick_xml::Error::from)?
    else {
        return Ok(None);
    };
    Ok(Some(attr.unescape_value()?.into_owned()))
}

fn clean_title(raw: &str) -> String {
    let without_markers: String = raw
        .chars()
        .filter(|&c| c != NON_SORT_BEGIN && c != NON_SORT_END)
        .collect();
    trim_isbd(&without_markers).to_string()
}

/// Strip trailing ISBD punctuation (`Title /`, `Name,`)
fn trim_isbd(value: &str) -> &str {
    value.trim().trim_end_matches([' ', '/', ':', ';', ',', '=']).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARC_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<searchRetrieveResponse xmlns="http://www.loc.gov/zing/srw/">
  <version>1.1</version>
  <numberOfRecords>1</numberOfRecords>
  <records>
    <record>
      <recordSchema>MARC21-xml</recordSchema>
      <recordPacking>xml</recordPacking>
      <recordData>
        <record xmlns="http://www.loc.gov/MARC21/slim" type="Bibliographic">
          <leader>00000nam a2200000 c 4500</leader>
          <controlfield tag="001">1001234567</controlfield>
          <datafield tag="020" ind1=" " ind2=" ">
            <subfield code="a">3796519144</subfield>
          </datafield>
          <datafield tag="100" ind1="1" ind2=" ">
            <subfield code="a">Müller, Hans</subfield>
            <subfield code="4">aut</subfield>
          </datafield>
          <datafield tag="245" ind1="1" ind2="0">
            <subfield code="a">&#152;Die&#156; Geschichte der Stadt /</subfield>
            <subfield code="c">Hans Müller ; Anna Schmidt</subfield>
          </datafield>
          <datafield tag="700" ind1="1" ind2=" ">
            <subfield code="a">Schmidt, Anna,</subfield>
          </datafield>
        </record>
      </recordData>
    </record>
  </records>
</searchRetrieveResponse>"#;

    #[test]
    fn test_parse_title_and_authors() {
        let fields = parse_first_record(MARC_RESPONSE).unwrap().unwrap();
        assert_eq!(fields.title.as_deref(), Some("Die Geschichte der Stadt"));
        assert_eq!(
            fields.authors,
            vec!["Hans Müller".to_string(), "Anna Schmidt".to_string()]
        );
    }

    #[test]
    fn test_parse_empty_response() {
        let xml = r#"<searchRetrieveResponse xmlns="http://www.loc.gov/zing/srw/">
            <numberOfRecords>0</numberOfRecords>
        </searchRetrieveResponse>"#;
        assert!(parse_first_record(xml).unwrap().is_none());
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse_first_record("<record><datafield tag=\"245\"></record>").is_err());
    }

    #[test]
    fn test_trim_isbd() {
        assert_eq!(trim_isbd("Title /"), "Title");
        assert_eq!(trim_isbd("Title : "), "Title");
        assert_eq!(trim_isbd("Smith, John,"), "Smith, John");
    }
}
