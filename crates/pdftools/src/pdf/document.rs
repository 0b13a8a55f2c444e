use crate::{PdfToolsError, Result};
use lopdf::{Document, Object};
use std::path::Path;

/// Load a PDF from disk.
///
/// Encrypted documents are rejected: neither compression nor merging can
/// rewrite them without the password.
pub fn load_document(path: &Path) -> Result<Document> {
    let doc = Document::load(path).map_err(|e| match e {
        lopdf::Error::IO(io_err) => PdfToolsError::Io(io_err),
        // lopdf gives up on some encryption handlers before we see the trailer.
        _ if declares_encryption(path) => password_protected(path),
        other => PdfToolsError::pdf_with_source(
            format!("Failed to parse PDF {}: {}", crate::core::io::display_name(path), other),
            other,
        ),
    })?;
    ensure_not_encrypted(&doc, path)?;
    Ok(doc)
}

fn declares_encryption(path: &Path) -> bool {
    std::fs::read(path).is_ok_and(|bytes| bytes.windows(8).any(|w| w == b"/Encrypt"))
}

fn password_protected(path: &Path) -> PdfToolsError {
    PdfToolsError::validation(format!(
        "PDF is password-protected: {}",
        crate::core::io::display_name(path)
    ))
}

fn ensure_not_encrypted(doc: &Document, path: &Path) -> Result<()> {
    if doc.trailer.has(b"Encrypt") {
        return Err(password_protected(path));
    }
    Ok(())
}

/// Write a document to `path`.
pub fn save_document(doc: &mut Document, path: &Path) -> Result<()> {
    doc.save(path)?;
    Ok(())
}

/// Number of pages in the document's page tree.
pub fn page_count(doc: &Document) -> usize {
    doc.get_pages().len()
}

/// Look up `key` on a page, walking up the `Parent` chain for inheritable
/// attributes (`Resources`, `MediaBox`, `CropBox`, `Rotate`).
pub fn inherited_attribute(doc: &Document, page: &lopdf::Dictionary, key: &[u8]) -> Option<Object> {
    if let Ok(value) = page.get(key) {
        return Some(value.clone());
    }

    let mut parent_ref = page.get(b"Parent").and_then(Object::as_reference).ok();
    // Page trees deeper than this are malformed or cyclic.
    let mut depth = 0;
    while let Some(parent_id) = parent_ref {
        depth += 1;
        if depth > 64 {
            break;
        }
        let parent = doc.get_object(parent_id).and_then(Object::as_dict).ok()?;
        if let Ok(value) = parent.get(key) {
            return Some(value.clone());
        }
        parent_ref = parent.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn test_load_and_count_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("three.pdf");
        std::fs::write(&path, to_bytes(&mut text_document(3))).unwrap();

        let doc = load_document(&path).unwrap();
        assert_eq!(page_count(&doc), 3);
    }

    #[test]
    fn test_load_invalid_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        let err = load_document(&path).unwrap_err();
        assert!(matches!(err, PdfToolsError::Pdf { .. }));
        assert!(err.to_string().contains("broken.pdf"));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = load_document(Path::new("/no/such/file.pdf")).unwrap_err();
        assert!(matches!(err, PdfToolsError::Io(_)));
    }

    #[test]
    fn test_trailer_with_encrypt_is_rejected() {
        let mut doc = text_document(1);
        doc.trailer.set("Encrypt", dictionary! { "Filter" => "Standard", "V" => 4 });

        let err = ensure_not_encrypted(&doc, Path::new("locked.pdf")).unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("password-protected: locked.pdf"));
    }

    #[test]
    fn test_load_encrypted_pdf_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.pdf");
        let mut doc = text_document(1);
        doc.trailer.set(
            "Encrypt",
            dictionary! { "Filter" => "UnknownHandler", "V" => 99, "R" => 99 },
        );
        std::fs::write(&path, to_bytes(&mut doc)).unwrap();

        let err = load_document(&path).unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("password-protected"));
    }

    #[test]
    fn test_inherited_media_box() {
        let doc = text_document(1);
        let page_id = *doc.get_pages().values().next().unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();

        assert!(page.get(b"MediaBox").is_err());
        let media_box = inherited_attribute(&doc, page, b"MediaBox").unwrap();
        assert_eq!(media_box.as_array().unwrap().len(), 4);
        assert!(inherited_attribute(&doc, page, b"Rotate").is_none());
    }
}
