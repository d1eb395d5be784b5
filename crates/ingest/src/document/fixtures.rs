//! In-process PDF builders and OCR stand-ins for tests.

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::encryption;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use super::ocr::{OcrEngine, OcrError, Rasterizer};

/// OCR tooling that is not installed.
pub struct NoOcr;

impl OcrEngine for NoOcr {
    fn recognize(&self, _image: &Path) -> Result<String, OcrError> {
        Err(OcrError::Unavailable("not installed".into()))
    }

    fn is_available(&self) -> bool {
        false
    }
}

impl Rasterizer for NoOcr {
    fn render_pages(&self, _pdf: &Path, _dpi: u32, _out_dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
        Err(OcrError::Unavailable("not installed".into()))
    }
}

/// A document with one text line per page.
pub fn text_pdf(pages: &[&str]) -> Document {
    build(pages.iter().map(|text| text_ops(text)).collect())
}

/// A document whose pages carry no text layer, like a scan.
pub fn blank_pdf(page_count: usize) -> Document {
    build((0..page_count).map(|_| blank_ops()).collect())
}

// Standard RC4 handler (V1, R2, 40-bit) with a fixed owner entry, permissions
// and file id. `EMPTY_USER_ENTRY` is RC4(key, padding) for the key derived from
// an empty user password, so lopdf's password check accepts "".
const OWNER_ENTRY: [u8; 32] = [0x11; 32];
const PERMISSIONS: i64 = -44;
const FILE_ID: &[u8; 16] = b"pdfsum-fixture-1";
const EMPTY_USER_ENTRY: [u8; 32] = [
    0xf8, 0xba, 0x4a, 0x95, 0xa3, 0x97, 0x34, 0x47, 0xa7, 0xa8, 0xf1, 0x54, 0xa1, 0xf5, 0x68, 0xf6, 0x25, 0xbb,
    0x71, 0x91, 0xf8, 0x2e, 0x16, 0x7a, 0x60, 0xc9, 0x60, 0x84, 0x86, 0x12, 0x8b, 0x07,
];

/// Encrypted with a non-empty user password: the empty password is rejected.
pub fn password_protected(doc: Document) -> Document {
    with_handler(doc, rc4_handler([0x22; 32]))
}

/// Encrypted with an empty user password (owner password only). Content
/// streams are RC4-encrypted, so text is only readable after decryption.
pub fn empty_password_encrypted(doc: Document) -> Document {
    let (mut doc, handler_id) = attach_handler(doc, rc4_handler(EMPTY_USER_ENTRY));
    let key = encryption::get_encryption_key(&doc, "", true).expect("fixture key matches its user entry");

    for (&id, object) in doc.objects.iter_mut() {
        if id == handler_id {
            continue;
        }
        // RC4 is symmetric: "decrypting" plaintext encrypts it.
        let Ok(cipher) = encryption::decrypt_object(&key, id, &*object) else {
            continue;
        };
        match object {
            Object::Stream(stream) => stream.set_content(cipher),
            Object::String(content, _) => *content = cipher,
            _ => {}
        }
    }
    doc
}

/// Encrypted with an AES (V4) security handler.
pub fn aes_encrypted(doc: Document) -> Document {
    with_handler(
        doc,
        dictionary! {
            "Filter" => "Standard",
            "V" => 4,
            "R" => 4,
            "Length" => 128,
            "CF" => dictionary! {
                "StdCF" => dictionary! { "CFM" => "AESV2", "AuthEvent" => "DocOpen", "Length" => 16 },
            },
            "StmF" => "StdCF",
            "StrF" => "StdCF",
            "O" => hex(&OWNER_ENTRY),
            "U" => hex(&[0x33; 32]),
            "P" => PERMISSIONS,
        },
    )
}

pub fn save(mut doc: Document, dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    doc.save(&path).expect("save test pdf");
    path
}

pub fn to_bytes(mut doc: Document) -> Vec<u8> {
    let mut out = Vec::new();
    doc.save_to(&mut out).expect("serialize test pdf");
    out
}

fn rc4_handler(user_entry: [u8; 32]) -> Dictionary {
    dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "Length" => 40,
        "O" => hex(&OWNER_ENTRY),
        "U" => hex(&user_entry),
        "P" => PERMISSIONS,
    }
}

fn with_handler(doc: Document, handler: Dictionary) -> Document {
    attach_handler(doc, handler).0
}

/// lopdf only honours an indirect `/Encrypt` reference, and key derivation
/// needs the first `/ID` entry.
fn attach_handler(mut doc: Document, handler: Dictionary) -> (Document, ObjectId) {
    let handler_id = doc.add_object(handler);
    doc.trailer.set("Encrypt", handler_id);
    doc.trailer.set("ID", vec![hex(FILE_ID), hex(FILE_ID)]);
    (doc, handler_id)
}

fn hex(bytes: &[u8]) -> Object {
    Object::String(bytes.to_vec(), StringFormat::Hexadecimal)
}

fn text_ops(text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("Td", vec![72.into(), 720.into()]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

fn blank_ops() -> Vec<Operation> {
    vec![Operation::new("q", vec![]), Operation::new("Q", vec![])]
}

fn build(page_ops: Vec<Vec<Operation>>) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(page_ops.len());
    for operations in page_ops {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}
