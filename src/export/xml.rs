//! XML helpers shared by the zip-based exporters.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Result};

/// Escape XML special characters for element content and attribute values.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            // Control characters are not allowed in XML 1.0.
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => out.push(c),
        }
    }
    out
}

/// Reject a generated document that is not well-formed.
///
/// Runs before a part is written so a broken part surfaces as an error
/// instead of a package readers refuse to open.
pub fn check_well_formed(part: &str, xml: &str) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    let config = reader.config_mut();
    config.check_end_names = true;
    config.check_comments = true;

    let mut depth = 0usize;
    let mut roots = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => {
                if depth == 0 {
                    roots += 1;
                }
                depth += 1;
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Empty(_)) if depth == 0 => roots += 1,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(Error::Xml {
                    part: part.to_string(),
                    message: format!("{e} at byte {}", reader.buffer_position()),
                });
            }
        }
    }

    if depth != 0 || roots != 1 {
        return Err(Error::Xml {
            part: part.to_string(),
            message: format!("expected one closed root element, found {roots} (depth {depth})"),
        });
    }
    Ok(())
}
