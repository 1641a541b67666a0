//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A 1x1 PNG
pub const PIXEL_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

const CONTAINER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

const OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="bookid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>The Lighthouse Keeper</dc:title>
    <dc:creator>Ada Marlow</dc:creator>
    <dc:language>en</dc:language>
    <dc:identifier id="bookid">urn:uuid:0b7f3c52-4d1e-4a8e-9d8e-1f2a3b4c5d6e</dc:identifier>
  </metadata>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="style" href="css/book.css" media-type="text/css"/>
    <item id="pixel" href="images/pixel.png" media-type="image/png"/>
    <item id="ch1" href="text/chapter1.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch2" href="text/chapter2.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="ch1"/>
    <itemref idref="ch2"/>
  </spine>
</package>"#;

const NCX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head><meta name="dtb:uid" content="urn:uuid:0b7f3c52-4d1e-4a8e-9d8e-1f2a3b4c5d6e"/></head>
  <docTitle><text>The Lighthouse Keeper</text></docTitle>
  <navMap>
    <navPoint id="np1" playOrder="1">
      <navLabel><text>The Storm</text></navLabel>
      <content src="text/chapter1.xhtml"/>
    </navPoint>
    <navPoint id="np2" playOrder="2">
      <navLabel><text>Morning</text></navLabel>
      <content src="text/chapter2.xhtml#dawn"/>
    </navPoint>
  </navMap>
</ncx>"#;

const CSS: &str = "h1 { text-align: center; }\n.lamp { background: url(../images/pixel.png); }";

/// Chapter one: a heading, an inlined image and `paragraphs` paragraphs of
/// forty words each
pub fn chapter_one(paragraphs: usize) -> String {
    let body: String = (0..paragraphs)
        .map(|p| {
            let words: Vec<String> = (0..40).map(|w| format!("wave{p}x{w}")).collect();
            format!("<p>{}</p>\n", words.join(" "))
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>The Storm</title><link rel="stylesheet" type="text/css" href="../css/book.css"/></head>
<body>
<h1>The Storm</h1>
<p class="center"><img src="../images/pixel.png" alt="lamp"/></p>
{body}</body>
</html>"#
    )
}

const CHAPTER_TWO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>Morning</title></head>
<body>
<h1 id="dawn">Morning</h1>
<p>The sea was calm again.</p>
</body>
</html>"#;

/// A small but complete EPUB 2 archive
pub fn build_epub(paragraphs: usize) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = FileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let chapter_one = chapter_one(paragraphs);
    let entries: Vec<(&str, &[u8])> = vec![
        ("META-INF/container.xml", CONTAINER.as_bytes()),
        ("OEBPS/content.opf", OPF.as_bytes()),
        ("OEBPS/toc.ncx", NCX.as_bytes()),
        ("OEBPS/css/book.css", CSS.as_bytes()),
        ("OEBPS/images/pixel.png", PIXEL_PNG),
        ("OEBPS/text/chapter1.xhtml", chapter_one.as_bytes()),
        ("OEBPS/text/chapter2.xhtml", CHAPTER_TWO.as_bytes()),
    ];

    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();
    for (name, data) in entries {
        zip.start_file(name, deflated).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Write the fixture EPUB into `dir` and return its path
pub fn write_epub(dir: &std::path::Path, name: &str, paragraphs: usize) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, build_epub(paragraphs)).unwrap();
    path
}
