//! WASM bindings for exporting from the browser.
//!
//! The host passes the project as JSON (the same shape the drafting app
//! stores) and gets the finished file back as bytes.

use wasm_bindgen::prelude::*;

use crate::export::{self, Format};
use crate::model::BookModel;

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(e: crate::Error) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Export a project to `format` (`"md"`, `"txt"`, `"epub"`, `"docx"`, `"pdf"`).
#[wasm_bindgen(js_name = exportBook)]
pub fn export_book(json: &str, format: &str) -> Result<Vec<u8>, JsValue> {
    let book = BookModel::from_json(json).map_err(js_error)?;
    let format: Format = format.parse().map_err(js_error)?;
    let output = export::export_book(&book, format).map_err(js_error)?;
    Ok(output.bytes)
}

/// The download filename for a project exported to `format`.
#[wasm_bindgen(js_name = exportFilename)]
pub fn export_filename(json: &str, format: &str) -> Result<String, JsValue> {
    let book = BookModel::from_json(json).map_err(js_error)?;
    let format: Format = format.parse().map_err(js_error)?;
    Ok(format.filename(book.title()))
}

/// MIME type for a format name.
#[wasm_bindgen(js_name = exportMimeType)]
pub fn export_mime_type(format: &str) -> Result<String, JsValue> {
    let format: Format = format.parse().map_err(js_error)?;
    Ok(format.mime_type().to_string())
}
