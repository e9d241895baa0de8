//! SMS Backup & Restore XML parser
//!
//! Expected document shape:
//!   <smses count="2">
//!     <sms protocol="0" address="VM-HDFCBK" date="1700000000000" type="1"
//!          body="Rs. 500 debited from A/c XX1234" readable_date="..." />
//!   </smses>
//!
//! Only `body` and `date` are read. Elements missing either attribute are kept
//! with an empty field so the pipeline can skip them uniformly.

use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use smsledger_core::RawMessage;

fn attr(el: &BytesStart<'_>, name: &str) -> Result<String> {
    let value = el
        .try_get_attribute(name)
        .with_context(|| format!("reading attribute '{name}'"))?;
    match value {
        Some(a) => Ok(a
            .unescape_value()
            .with_context(|| format!("unescaping attribute '{name}'"))?
            .into_owned()),
        None => Ok(String::new()),
    }
}

/// Parse a full backup document into raw messages, in document order.
pub fn parse_sms_backup_xml(xml: &str) -> Result<Vec<RawMessage>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut out = Vec::new();
    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("malformed backup XML at byte {}", reader.buffer_position()))?;
        match event {
            Event::Start(el) | Event::Empty(el) if el.name().as_ref() == b"sms" => {
                out.push(RawMessage {
                    body: attr(&el, "body")?,
                    timestamp_millis: attr(&el, "date")?,
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(out)
}
