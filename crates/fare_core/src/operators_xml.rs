use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use clipper_fare_model::{Agency, AgencyId};

const AGENCY_ELEMENT: &[u8] = b"GTFSAgency";

/// Parses the regional operator registry: every `<GTFSAgency Id=".."
/// Name=".." LastGenerated=".."/>` element in document order. Missing
/// attributes become empty strings.
pub fn parse_operators_xml(data: &[u8]) -> Result<Vec<Agency>, quick_xml::Error> {
    let mut reader = Reader::from_reader(data);
    reader.config_mut().trim_text(true);

    let mut agencies = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(element) | Event::Empty(element)
                if element.local_name().as_ref() == AGENCY_ELEMENT =>
            {
                agencies.push(agency_from_element(&element)?);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(agencies)
}

fn agency_from_element(element: &BytesStart<'_>) -> Result<Agency, quick_xml::Error> {
    let mut agency = Agency::default();
    for attribute in element.attributes() {
        let attribute = attribute?;
        let value = attribute.unescape_value()?;
        match attribute.key.local_name().as_ref() {
            b"Id" => agency.id = AgencyId::from(value.trim()),
            b"Name" => agency.name = value.trim().to_string(),
            b"LastGenerated" => agency.last_generated = value.trim().to_string(),
            _ => {}
        }
    }
    Ok(agency)
}
