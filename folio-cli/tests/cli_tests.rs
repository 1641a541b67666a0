//! Integration tests for the Folio CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

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
    <dc:identifier id="bookid">urn:uuid:6a1d0e2c-8f7b-4c1e-9a55-3f0c2b7d9e10</dc:identifier>
  </metadata>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
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
  <head><meta name="dtb:uid" content="urn:uuid:6a1d0e2c-8f7b-4c1e-9a55-3f0c2b7d9e10"/></head>
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

const CHAPTER_TWO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>Morning</title></head>
<body>
<h1 id="dawn">Morning</h1>
<p>The sea was calm again.</p>
</body>
</html>"#;

fn chapter_one() -> String {
    let body: String = (0..12)
        .map(|p| {
            let words: Vec<String> = (0..60).map(|w| format!("wave{p}x{w}")).collect();
            format!("<p>{}</p>\n", words.join(" "))
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>The Storm</title></head>
<body>
<h1>The Storm</h1>
{body}</body>
</html>"#
    )
}

/// Write a two-chapter EPUB into `dir`
fn create_test_epub(dir: &Path, name: &str) -> PathBuf {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();

    let chapter_one = chapter_one();
    let entries: [(&str, &[u8]); 5] = [
        ("META-INF/container.xml", CONTAINER.as_bytes()),
        ("OEBPS/content.opf", OPF.as_bytes()),
        ("OEBPS/toc.ncx", NCX.as_bytes()),
        ("OEBPS/text/chapter1.xhtml", chapter_one.as_bytes()),
        ("OEBPS/text/chapter2.xhtml", CHAPTER_TWO.as_bytes()),
    ];
    for (entry, data) in entries {
        zip.start_file(entry, deflated).unwrap();
        zip.write_all(data).unwrap();
    }

    let path = dir.join(name);
    fs::write(&path, zip.finish().unwrap().into_inner()).unwrap();
    path
}

/// A command pointed at an isolated library directory
fn folio(library: &Path) -> Command {
    let mut cmd = Command::cargo_bin("folio-cli").unwrap();
    cmd.env_remove("FOLIO_CONFIG")
        .env_remove("FOLIO_LIBRARY")
        .arg("--library")
        .arg(library);
    cmd
}

/// A temp dir holding a library with the test EPUB imported
fn library_with_book() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let library = temp_dir.path().join("library");
    let book = create_test_epub(temp_dir.path(), "keeper.epub");
    folio(&library)
        .args(["import", book.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 'The Lighthouse Keeper' by Ada Marlow"));
    (temp_dir, library)
}

#[test]
fn test_help() {
    let mut cmd = Command::cargo_bin("folio-cli").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("paginate"))
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("--library"));
}

#[test]
fn test_version() {
    let mut cmd = Command::cargo_bin("folio-cli").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("folio"));
}

#[test]
fn test_paginate_help() {
    let mut cmd = Command::cargo_bin("folio-cli").unwrap();
    cmd.args(["paginate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Paginate a chapter"))
        .stdout(predicate::str::contains("--width"))
        .stdout(predicate::str::contains("--chapter"));
}

#[test]
fn test_paginate_rejects_zero_width() {
    let temp_dir = TempDir::new().unwrap();
    folio(temp_dir.path())
        .args(["paginate", "book.epub", "--width", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("dimensions must be positive"));
}

#[test]
fn test_render_requires_chapter() {
    let temp_dir = TempDir::new().unwrap();
    folio(temp_dir.path())
        .args(["render", "book.epub"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--chapter"));
}

#[test]
fn test_import_nonexistent_file() {
    let temp_dir = TempDir::new().unwrap();
    folio(&temp_dir.path().join("library"))
        .args(["import", "/nonexistent/file.epub"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No such file"));
}

#[test]
fn test_import_unsupported_format() {
    let temp_dir = TempDir::new().unwrap();
    let notes = temp_dir.path().join("notes.txt");
    fs::write(&notes, "just some text").unwrap();

    folio(&temp_dir.path().join("library"))
        .args(["import", notes.to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn test_list_empty_library() {
    let temp_dir = TempDir::new().unwrap();
    folio(&temp_dir.path().join("missing"))
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No books found"));
}

#[test]
fn test_import_and_list() {
    let (_temp_dir, library) = library_with_book();
    assert!(library.join("keeper.epub").is_file());
    assert!(library.join("keeper.epub.metadata.json").is_file());

    folio(&library)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("keeper.epub"))
        .stdout(predicate::str::contains("The Lighthouse Keeper"));

    let output = folio(&library).args(["list", "--json"]).assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("Output should be valid JSON");
    assert_eq!(json.as_array().map(Vec::len), Some(1));
    assert_eq!(json[0]["title"], "The Lighthouse Keeper");
    assert_eq!(json[0]["format"], "epub");
}

#[test]
fn test_shelf_assignment_and_filter() {
    let (_temp_dir, library) = library_with_book();

    folio(&library)
        .args(["shelf", "keeper.epub", "Sea Stories"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Moved keeper.epub to 'Sea Stories'"));

    let sidecar = fs::read_to_string(library.join("keeper.epub.metadata.json")).unwrap();
    assert!(sidecar.contains("\"shelf\":\"Sea Stories\""));

    folio(&library)
        .args(["list", "--shelf", "Sea Stories"])
        .assert()
        .success()
        .stdout(predicate::str::contains("keeper.epub"));
    folio(&library)
        .args(["list", "--shelf", "Poetry"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No books found"));
    folio(&library)
        .args(["list", "--shelf", "All Books"])
        .assert()
        .success()
        .stdout(predicate::str::contains("keeper.epub"));

    folio(&library)
        .arg("shelves")
        .assert()
        .success()
        .stdout(predicate::str::contains("None"))
        .stdout(predicate::str::contains("Sea Stories"));

    folio(&library)
        .args(["shelf", "keeper.epub", "None"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Took keeper.epub off its shelf"));
    folio(&library)
        .args(["list", "--shelf", "Sea Stories"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No books found"));
}

#[test]
fn test_shelves_add_and_remove() {
    let temp_dir = TempDir::new().unwrap();
    let library = temp_dir.path().join("library");

    folio(&library)
        .args(["shelves", "--add", "  Poetry  "])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added shelf 'Poetry'"));
    folio(&library)
        .args(["shelves", "--add", "Poetry"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    folio(&library)
        .args(["shelves", "--remove", "Poetry"])
        .assert()
        .success();
    folio(&library)
        .args(["shelves", "--remove", "Poetry"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No shelf named"));
}

#[test]
fn test_delete_removes_book_and_sidecar() {
    let (_temp_dir, library) = library_with_book();

    folio(&library)
        .args(["delete", "keeper.epub"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted keeper.epub"));

    assert!(!library.join("keeper.epub").exists());
    assert!(!library.join("keeper.epub.metadata.json").exists());

    folio(&library)
        .args(["delete", "keeper.epub"])
        .assert()
        .failure();
}

#[test]
fn test_toc() {
    let (_temp_dir, library) = library_with_book();
    folio(&library)
        .args(["toc", "keeper.epub"])
        .assert()
        .success()
        .stdout(predicate::str::contains("The Storm [chapter 0]"))
        .stdout(predicate::str::contains("Morning [chapter 1, #dawn]"));
}

#[test]
fn test_toc_missing_book() {
    let temp_dir = TempDir::new().unwrap();
    folio(temp_dir.path())
        .args(["toc", "nowhere.epub"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No such book"));
}

#[test]
fn test_paginate_one_chapter() {
    let (_temp_dir, library) = library_with_book();
    folio(&library)
        .args(["paginate", "keeper.epub", "--chapter", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Viewport 1024x768 (page 800x728)"))
        .stdout(predicate::str::contains("Chapter 1 (OEBPS/text/chapter2.xhtml): 1 pages"))
        .stdout(predicate::str::contains("h1#0 p#1"));
}

#[test]
fn test_paginate_whole_book_json() {
    let (temp_dir, _library) = library_with_book();
    let book = temp_dir.path().join("keeper.epub");

    let output = folio(temp_dir.path())
        .args(["paginate", book.to_str().unwrap(), "--width", "500", "--height", "600", "--json"])
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("Output should be valid JSON");

    assert_eq!(json["page_width"], 460.0);
    assert_eq!(json["page_height"], 560.0);
    let chapters = json["chapters"].as_array().unwrap();
    assert_eq!(chapters.len(), 2);
    assert!(chapters[0]["pages"].as_array().unwrap().len() > 1);
    assert_eq!(chapters[1]["pages"].as_array().unwrap().len(), 1);
}

#[test]
fn test_narrower_viewport_needs_more_pages() {
    let (_temp_dir, library) = library_with_book();
    let pages = |width: &str, height: &str| -> usize {
        let output = folio(&library)
            .args(["paginate", "keeper.epub", "--chapter", "0", "--json"])
            .args(["--width", width, "--height", height])
            .assert()
            .success();
        let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        json["chapters"][0]["pages"].as_array().unwrap().len()
    };
    assert!(pages("400", "500") > pages("1200", "1400"));
}

#[test]
fn test_render_page() {
    let (_temp_dir, library) = library_with_book();
    folio(&library)
        .args(["render", "keeper.epub", "--chapter", "1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<div class=\"folio-page\">"))
        .stdout(predicate::str::contains("The sea was calm again."));

    let output = folio(&library)
        .args(["render", "keeper.epub", "--chapter", "0", "--page", "1", "--json"])
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["chapter_index"], 0);
    assert_eq!(json["page_index"], 1);
    assert!(json["markup"].as_str().unwrap().contains("wave"));
}

#[test]
fn test_render_page_out_of_range() {
    let (_temp_dir, library) = library_with_book();
    folio(&library)
        .args(["render", "keeper.epub", "--chapter", "1", "--page", "50"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
    folio(&library)
        .args(["render", "keeper.epub", "--chapter", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open chapter 9"));
}

#[test]
fn test_render_placeholder_format() {
    let temp_dir = TempDir::new().unwrap();
    let pdf = temp_dir.path().join("guide.pdf");
    fs::write(&pdf, b"%PDF-1.4").unwrap();

    folio(temp_dir.path())
        .args(["render", pdf.to_str().unwrap(), "--chapter", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PDF Reading"));
}

#[test]
fn test_invalid_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("folio.json");
    fs::write(&config, r#"{ "pagination": { "overflow_tolerance_factor": 0.5 } }"#).unwrap();

    folio(temp_dir.path())
        .arg("--config")
        .arg(&config)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_config_from_environment() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("folio.json");
    fs::write(&config, r#"{ "layout": { "page_margin": 50 } }"#).unwrap();
    let book = create_test_epub(temp_dir.path(), "keeper.epub");

    folio(temp_dir.path())
        .env("FOLIO_CONFIG", &config)
        .args(["paginate", book.to_str().unwrap(), "--chapter", "1"])
        .args(["--width", "700", "--height", "800"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(page 600x700)"));
}

#[test]
fn test_verbose_flag() {
    let (_temp_dir, library) = library_with_book();
    folio(&library)
        .args(["--verbose", "list"])
        .assert()
        .success();
}
