//! Test fixtures: in-memory zip archives and XML documents.

use std::io::{Cursor, Write};
use zip::write::{FileOptions, ZipWriter};

/// Build a zip archive from `(declared path, content)` pairs.
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer
            .start_file(*name, FileOptions::default())
            .expect("Failed to start zip entry");
        writer.write_all(content).expect("Failed to write zip entry");
    }
    writer
        .finish()
        .expect("Failed to finish zip archive")
        .into_inner()
}

pub const COMPLAINT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<complaint>
  <customer>ACME Corp</customer>
  <message>Order 1234 arrived damaged</message>
</complaint>"#;

pub const XXE_XML: &str = r#"<?xml version="1.0"?>
<!DOCTYPE complaint [<!ENTITY xxe SYSTEM "file:///etc/passwd">]>
<complaint>&xxe;</complaint>"#;

pub const BILLION_LAUGHS_XML: &str = r#"<?xml version="1.0"?>
<!DOCTYPE lolz [
 <!ENTITY lol "lol">
 <!ENTITY lol1 "&lol;&lol;&lol;&lol;&lol;&lol;&lol;&lol;&lol;&lol;">
 <!ENTITY lol2 "&lol1;&lol1;&lol1;&lol1;&lol1;&lol1;&lol1;&lol1;&lol1;&lol1;">
 <!ENTITY lol3 "&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;">
 <!ENTITY lol4 "&lol3;&lol3;&lol3;&lol3;&lol3;&lol3;&lol3;&lol3;&lol3;&lol3;">
 <!ENTITY lol5 "&lol4;&lol4;&lol4;&lol4;&lol4;&lol4;&lol4;&lol4;&lol4;&lol4;">
 <!ENTITY lol6 "&lol5;&lol5;&lol5;&lol5;&lol5;&lol5;&lol5;&lol5;&lol5;&lol5;">
 <!ENTITY lol7 "&lol6;&lol6;&lol6;&lol6;&lol6;&lol6;&lol6;&lol6;&lol6;&lol6;">
 <!ENTITY lol8 "&lol7;&lol7;&lol7;&lol7;&lol7;&lol7;&lol7;&lol7;&lol7;&lol7;">
 <!ENTITY lol9 "&lol8;&lol8;&lol8;&lol8;&lol8;&lol8;&lol8;&lol8;&lol8;&lol8;">
]>
<lolz>&lol9;</lolz>"#;

/// Archive produced by a streaming writer: the single entry `streamed.txt`
/// carries general-purpose flag bit 3 and a trailing data descriptor.
pub const DATA_DESCRIPTOR_ZIP: &[u8] = &[
    0x50, 0x4b, 0x03, 0x04, 0x14, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x21, 0x58, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0c, 0x00, 0x00, 0x00, 0x73, 0x74,
    0x72, 0x65, 0x61, 0x6d, 0x65, 0x64, 0x2e, 0x74, 0x78, 0x74, 0x77, 0x72, 0x69, 0x74, 0x74, 0x65,
    0x6e, 0x20, 0x77, 0x69, 0x74, 0x68, 0x6f, 0x75, 0x74, 0x20, 0x73, 0x65, 0x65, 0x6b, 0x69, 0x6e,
    0x67, 0x50, 0x4b, 0x07, 0x08, 0x66, 0x75, 0x27, 0x13, 0x17, 0x00, 0x00, 0x00, 0x17, 0x00, 0x00,
    0x00, 0x50, 0x4b, 0x01, 0x02, 0x14, 0x03, 0x14, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x21,
    0x58, 0x66, 0x75, 0x27, 0x13, 0x17, 0x00, 0x00, 0x00, 0x17, 0x00, 0x00, 0x00, 0x0c, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80, 0x01, 0x00, 0x00, 0x00, 0x00, 0x73,
    0x74, 0x72, 0x65, 0x61, 0x6d, 0x65, 0x64, 0x2e, 0x74, 0x78, 0x74, 0x50, 0x4b, 0x05, 0x06, 0x00,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x3a, 0x00, 0x00, 0x00, 0x51, 0x00, 0x00, 0x00, 0x00,
    0x00,
];
