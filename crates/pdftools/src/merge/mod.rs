//! Merging PDFs and images into one document.
//!
//! Every input is turned into a lopdf [`Document`] (images through
//! [`image_to_pdf`]), renumbered into a shared id space and its pages are
//! hung under a fresh page tree in input order.

pub mod image_to_pdf;

use std::path::{Path, PathBuf};

use lopdf::{Document, Object, ObjectId, dictionary};

use crate::core::filename::format_file_size;
use crate::core::io::{display_name, validate_file_exists};
use crate::core::mime::FileKind;
use crate::pdf::document::inherited_attribute;
use crate::pdf::{load_document, page_count, save_document};
use crate::types::{MergeStats, MergedFileInfo, percent_saved};
use crate::{PdfToolsError, Result};

pub use image_to_pdf::image_to_pdf;

/// Fewest inputs a merge accepts.
pub const MIN_MERGE_INPUTS: usize = 2;

/// Page attributes a page may inherit from its ancestors.
const INHERITABLE_KEYS: &[&[u8]] = &[b"MediaBox", b"Resources", b"CropBox", b"Rotate"];

/// One file taking part in a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeInput {
    pub path: PathBuf,
    /// Name reported in errors and stats (the upload's original name).
    pub name: String,
}

impl MergeInput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = display_name(&path);
        Self { path, name }
    }

    pub fn with_name(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    fn kind(&self) -> Option<FileKind> {
        FileKind::from_filename(&self.name).or_else(|| FileKind::from_filename(&display_name(&self.path)))
    }
}

/// A loaded input ready for page copying.
struct LoadedInput {
    doc: Document,
    info: MergedFileInfo,
}

fn load_input(input: &MergeInput) -> Result<LoadedInput> {
    validate_file_exists(&input.path)?;
    let kind = input
        .kind()
        .ok_or_else(|| PdfToolsError::validation(format!("Unsupported file type: {}", input.name)))?;

    let size = std::fs::metadata(&input.path)?.len();

    let doc = match kind {
        FileKind::Pdf => load_document(&input.path).map_err(|e| match e {
            PdfToolsError::Validation { .. } => e,
            other => PdfToolsError::validation_with_source(format!("Invalid PDF: {}", input.name), other),
        })?,
        FileKind::Image => {
            let bytes = std::fs::read(&input.path)?;
            image_to_pdf(&bytes).map_err(|e| {
                PdfToolsError::validation_with_source(format!("Invalid or corrupted image: {}", input.name), e)
            })?
        }
    };

    let pages = page_count(&doc);
    if pages == 0 {
        return Err(PdfToolsError::validation(format!("PDF has no pages: {}", input.name)));
    }

    Ok(LoadedInput {
        doc,
        info: MergedFileInfo {
            name: input.name.clone(),
            kind: kind.label().to_string(),
            size,
            pages,
        },
    })
}

/// Check every input before merging.
///
/// Each file must exist, carry a supported extension and parse: PDFs with at
/// least one page, images as PNG or JPEG.
///
/// # Errors
///
/// Returns `PdfToolsError::Validation` naming the first bad file.
pub fn validate_files(inputs: &[MergeInput]) -> Result<()> {
    for input in inputs {
        load_input(input)?;
    }
    Ok(())
}

/// Copy `page_id`'s inherited attributes onto the page itself so it stays
/// correct once its original ancestors are gone.
fn materialize_inherited(doc: &mut Document, page_id: ObjectId) {
    let Ok(page) = doc.get_object(page_id).and_then(Object::as_dict) else {
        return;
    };
    let inherited: Vec<(&[u8], Object)> = INHERITABLE_KEYS
        .iter()
        .filter(|key| !page.has(key))
        .filter_map(|key| inherited_attribute(doc, page, key).map(|value| (*key, value)))
        .collect();

    if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
        for (key, value) in inherited {
            page.set(key.to_vec(), value);
        }
    }
}

/// Concatenate loaded documents into one.
fn combine(inputs: Vec<LoadedInput>) -> Result<(Document, Vec<MergedFileInfo>)> {
    let mut merged = Document::with_version("1.5");
    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut infos = Vec::with_capacity(inputs.len());

    for LoadedInput { mut doc, info } in inputs {
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        for &page_id in &pages {
            materialize_inherited(&mut doc, page_id);
        }

        for (object_id, object) in doc.objects {
            match object.type_name().unwrap_or(b"") {
                b"Catalog" | b"Pages" | b"Outlines" | b"Outline" => {}
                _ => {
                    merged.objects.insert(object_id, object);
                }
            }
        }

        page_ids.extend(pages);
        infos.push(info);
    }

    merged.max_id = max_id;
    let pages_id = merged.new_object_id();

    for page_id in &page_ids {
        let Some(Object::Dictionary(page)) = merged.objects.get_mut(page_id) else {
            return Err(PdfToolsError::merge(format!("Page object {:?} went missing while merging", page_id)));
        };
        page.set("Parent", Object::Reference(pages_id));
    }

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_ids.len() as i64,
        }),
    );

    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    merged.trailer.set("Root", Object::Reference(catalog_id));

    merged.prune_objects();
    merged.renumber_objects();
    merged.compress();

    Ok((merged, infos))
}

/// Blocking body of [`merge_files`].
pub fn merge_files_blocking(inputs: &[MergeInput], output: &Path) -> Result<MergeStats> {
    if inputs.len() < MIN_MERGE_INPUTS {
        return Err(PdfToolsError::validation(format!(
            "At least {} files are required to merge",
            MIN_MERGE_INPUTS
        )));
    }

    let loaded = inputs.iter().map(load_input).collect::<Result<Vec<_>>>()?;
    let (mut merged, file_info) = combine(loaded)?;
    save_document(&mut merged, output)?;

    let total_input_size: u64 = file_info.iter().map(|f| f.size).sum();
    let total_pages: usize = file_info.iter().map(|f| f.pages).sum();
    let output_size = std::fs::metadata(output)?.len();

    tracing::info!(
        files = inputs.len(),
        pages = total_pages,
        output = %format_file_size(output_size),
        "Merge finished"
    );

    Ok(MergeStats {
        total_files: inputs.len(),
        total_input_size,
        output_size,
        total_pages,
        total_input_size_formatted: format_file_size(total_input_size),
        output_size_formatted: format_file_size(output_size),
        file_info,
        compression_ratio: percent_saved(total_input_size, output_size),
    })
}

/// Merge `inputs` in order into a PDF at `output`.
///
/// # Errors
///
/// - `Validation` for fewer than two inputs or any unreadable input
/// - `Merge` when the combined document cannot be assembled
pub async fn merge_files(inputs: &[MergeInput], output: &Path) -> Result<MergeStats> {
    let inputs = inputs.to_vec();
    let output = output.to_path_buf();
    tokio::task::spawn_blocking(move || merge_files_blocking(&inputs, &output)).await?
}
