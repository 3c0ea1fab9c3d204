//! EPUB package tests: container layout, OPF/NCX structure and escaping.

use std::io::{Cursor, Read};

use chrono::DateTime;
use zip::CompressionMethod;

use bookpress::export::{EpubConfig, EpubExporter, Exporter, check_well_formed};
use bookpress::model::{Chapter, CoverImage, Section};
use bookpress::{BookModel, Format, export_book};

const SAMPLE_JSON: &str = include_str!("fixtures/sample_book.json");

fn sample_book() -> BookModel {
    BookModel::from_json(SAMPLE_JSON).unwrap()
}

fn archive(bytes: &[u8]) -> zip::ZipArchive<Cursor<&[u8]>> {
    zip::ZipArchive::new(Cursor::new(bytes)).unwrap()
}

fn read_entry(bytes: &[u8], name: &str) -> String {
    let mut archive = archive(bytes);
    let mut entry = archive.by_name(name).unwrap();
    let mut text = String::new();
    entry.read_to_string(&mut text).unwrap();
    text
}

#[test]
fn test_mimetype_is_first_and_stored() {
    let output = export_book(&sample_book(), Format::Epub).unwrap();
    let mut archive = archive(&output.bytes);

    let mut first = archive.by_index(0).unwrap();
    assert_eq!(first.name(), "mimetype");
    assert_eq!(first.compression(), CompressionMethod::Stored);

    let mut content = Vec::new();
    first.read_to_end(&mut content).unwrap();
    assert_eq!(content, b"application/epub+zip");
}

#[test]
fn test_entry_order() {
    let output = export_book(&sample_book(), Format::Epub).unwrap();
    let mut archive = archive(&output.bytes);

    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert_eq!(
        names,
        [
            "mimetype",
            "META-INF/container.xml",
            "OEBPS/content.opf",
            "OEBPS/toc.ncx",
            "OEBPS/nav.xhtml",
            "OEBPS/style.css",
            "OEBPS/title.xhtml",
            "OEBPS/chapter_1.xhtml",
            "OEBPS/chapter_2.xhtml",
            "OEBPS/chapter_3.xhtml",
            "OEBPS/cover.png",
        ]
    );
}

#[test]
fn test_spine_has_title_page_plus_chapters() {
    let book = sample_book();
    let output = export_book(&book, Format::Epub).unwrap();
    let opf = read_entry(&output.bytes, "OEBPS/content.opf");

    assert_eq!(opf.matches("<itemref ").count(), book.chapters().len() + 1);
    assert!(opf.contains("<itemref idref=\"title\""));
    assert!(opf.contains("<dc:creator>Mara Quill</dc:creator>"));
    assert!(opf.contains("<dc:language>en</dc:language>"));
    assert!(opf.contains("properties=\"cover-image\""));
}

#[test]
fn test_every_xml_part_is_well_formed() {
    let output = export_book(&sample_book(), Format::Epub).unwrap();
    let mut archive = archive(&output.bytes);

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let name = entry.name().to_string();
        if [".xml", ".opf", ".ncx", ".xhtml"].iter().any(|ext| name.ends_with(ext)) {
            let mut xml = String::new();
            entry.read_to_string(&mut xml).unwrap();
            check_well_formed(&name, &xml).unwrap();
        }
    }
}

#[test]
fn test_special_characters_are_escaped() {
    let book = BookModel::new("Fish & <Chips> \"Deluxe\"").with_chapter(
        Chapter::new("A < B")
            .with_section(Section::new("Tom & \"Jerry\"", "x < y && y > z\n\n**bold & brave**")),
    );
    let output = export_book(&book, Format::Epub).unwrap();

    let chapter = read_entry(&output.bytes, "OEBPS/chapter_1.xhtml");
    assert!(chapter.contains("<h1>A &lt; B</h1>"));
    assert!(chapter.contains("<h2>Tom &amp; &quot;Jerry&quot;</h2>"));
    assert!(chapter.contains("x &lt; y &amp;&amp; y &gt; z"));
    assert!(chapter.contains("<strong>bold &amp; brave</strong>"));

    for part in ["OEBPS/content.opf", "OEBPS/toc.ncx", "OEBPS/nav.xhtml", "OEBPS/title.xhtml"] {
        let xml = read_entry(&output.bytes, part);
        check_well_formed(part, &xml).unwrap();
        assert!(xml.contains("Fish &amp; &lt;Chips&gt;"), "{part}");
    }
}

#[test]
fn test_cover_is_stored_and_shown() {
    let output = export_book(&sample_book(), Format::Epub).unwrap();
    let mut archive = archive(&output.bytes);

    let mut cover = archive.by_name("OEBPS/cover.png").unwrap();
    assert_eq!(cover.compression(), CompressionMethod::Stored);
    let mut data = Vec::new();
    cover.read_to_end(&mut data).unwrap();
    assert!(data.starts_with(b"\x89PNG"));
    drop(cover);

    let title = read_entry(&output.bytes, "OEBPS/title.xhtml");
    assert!(title.contains("cover.png"));
}

#[test]
fn test_configured_identifier_and_timestamp() {
    let config = EpubConfig::default()
        .with_identifier("urn:isbn:9780000000000")
        .with_modified(DateTime::from_timestamp(1_700_000_000, 0).unwrap());
    let book = BookModel::new("Configured")
        .with_cover(CoverImage::new("image/jpeg", vec![0xFF, 0xD8, 0xFF]));

    let mut out = Cursor::new(Vec::new());
    EpubExporter::new().with_config(config).export(&book, &mut out).unwrap();
    let bytes = out.into_inner();

    let opf = read_entry(&bytes, "OEBPS/content.opf");
    assert!(opf.contains("urn:isbn:9780000000000"));
    assert!(opf.contains("2023-11-14T22:13:20Z"));
    assert!(opf.contains("href=\"cover.jpg\" media-type=\"image/jpeg\""));

    let ncx = read_entry(&bytes, "OEBPS/toc.ncx");
    assert!(ncx.contains("urn:isbn:9780000000000"));
}

#[test]
fn test_language_follows_settings() {
    let book = BookModel::new("三体")
        .with_language("简体中文")
        .with_chapter(Chapter::new("第一章").with_section(Section::new("开始", "内容")));
    let output = export_book(&book, Format::Epub).unwrap();

    assert_eq!(output.filename, "三体.epub");
    let opf = read_entry(&output.bytes, "OEBPS/content.opf");
    assert!(opf.contains("<dc:language>zh</dc:language>"));
    let chapter = read_entry(&output.bytes, "OEBPS/chapter_1.xhtml");
    assert!(chapter.contains("<h2>开始</h2>"));
}
