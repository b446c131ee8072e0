//! Page-level PDF operations: compose from images, merge, split, count.
//!
//! All functions take and return PDF bytes; nothing here touches the
//! filesystem. Merge and split rebuild a flat Pages tree and drop source
//! catalogs and outlines, so page attributes inherited from intermediate
//! tree nodes are not carried over.

use {
    lopdf::{
        Dictionary, Document, Object, ObjectId, Stream,
        content::{Content, Operation},
        dictionary,
    },
    tracing::debug,
};

use crate::error::{Error, Result};

/// Number of pages reachable from the document's page tree.
pub fn page_count(bytes: &[u8]) -> Result<usize> {
    Ok(load(bytes)?.get_pages().len())
}

/// Compose one PDF from decoded images, one page per image, in input order.
///
/// Each page's size equals the image's pixel dimensions (one pixel per PDF
/// point), mirroring how the images were uploaded.
pub fn compose_from_images(images: &[Vec<u8>]) -> Result<Vec<u8>> {
    if images.is_empty() {
        return Err(Error::invalid_input("no images to compose"));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(images.len());

    for data in images {
        let rgb = image::load_from_memory(data)?.to_rgb8();
        let (width, height) = rgb.dimensions();

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            rgb.into_raw(),
        ));

        // Scale the unit image square up to the full page.
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new("cm", vec![
                    (width as f32).into(),
                    0.into(),
                    0.into(),
                    (height as f32).into(),
                    0.into(),
                    0.into(),
                ]),
                Operation::new("Do", vec!["Im0".into()]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().map_err(|e| Error::Parse(e.to_string()))?,
        ));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                (width as f32).into(),
                (height as f32).into(),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        kids.push(page_id.into());
    }

    let count = kids.len();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    debug!(pages = count, "composed PDF from images");
    save(doc)
}

/// Concatenate the pages of each input, in input order.
pub fn merge(inputs: &[Vec<u8>]) -> Result<Vec<u8>> {
    if inputs.len() < 2 {
        return Err(Error::invalid_input("merge needs at least two PDFs"));
    }

    let mut merged = Document::with_version("1.5");
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut next_id = 1;

    for bytes in inputs {
        let mut doc = load(bytes)?;
        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;
        page_ids.extend(doc.get_pages().into_values());
        for (id, object) in std::mem::take(&mut doc.objects) {
            // Source page trees, catalogs, and outlines are rebuilt below.
            match dict_type(&object) {
                Some(b"Catalog" | b"Pages" | b"Outlines") => {},
                _ => {
                    merged.objects.insert(id, object);
                },
            }
        }
    }

    debug!(inputs = inputs.len(), pages = page_ids.len(), "merged PDFs");
    attach_page_tree(merged, page_ids)
}

/// Split into one single-page PDF per page, in page order.
pub fn split(bytes: &[u8]) -> Result<Vec<Vec<u8>>> {
    let source = load(bytes)?;
    let pages: Vec<ObjectId> = source.get_pages().into_values().collect();
    if pages.is_empty() {
        return Err(Error::Parse("PDF has no pages".to_string()));
    }

    let mut artifacts = Vec::with_capacity(pages.len());
    for &page_id in &pages {
        let mut single = Document::with_version("1.5");
        for (id, object) in &source.objects {
            match dict_type(object) {
                Some(b"Catalog" | b"Pages" | b"Outlines") => {},
                Some(b"Page") if *id != page_id => {},
                _ => {
                    single.objects.insert(*id, object.clone());
                },
            }
        }
        artifacts.push(attach_page_tree(single, vec![page_id])?);
    }

    debug!(pages = artifacts.len(), "split PDF");
    Ok(artifacts)
}

fn load(bytes: &[u8]) -> Result<Document> {
    Document::load_mem(bytes).map_err(|e| Error::Parse(e.to_string()))
}

fn save(mut doc: Document) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| Error::Parse(e.to_string()))?;
    Ok(out)
}

/// The `/Type` name of a dictionary object, if it has one.
fn dict_type(object: &Object) -> Option<&[u8]> {
    match object {
        Object::Dictionary(dict) => match dict.get(b"Type") {
            Ok(Object::Name(name)) => Some(name.as_slice()),
            _ => None,
        },
        _ => None,
    }
}

/// Install a flat Pages tree over `page_ids` plus a fresh catalog, then
/// serialize. Every page's Parent is repointed at the new tree.
fn attach_page_tree(mut doc: Document, page_ids: Vec<ObjectId>) -> Result<Vec<u8>> {
    doc.max_id = doc.objects.keys().map(|id| id.0).max().unwrap_or(0);
    let pages_id = doc.new_object_id();

    for &page_id in &page_ids {
        match doc.get_object_mut(page_id) {
            Ok(Object::Dictionary(dict)) => dict.set("Parent", pages_id),
            _ => {
                return Err(Error::Parse(format!(
                    "page object {} is not a dictionary",
                    page_id.0
                )));
            },
        }
    }

    let kids: Vec<Object> = page_ids.iter().map(|&id| id.into()).collect();
    let count = page_ids.len();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    // Drop copied-over objects the rebuilt tree no longer references, so
    // each split artifact carries only its own page's content.
    doc.prune_objects();
    doc.renumber_objects();
    doc.compress();
    save(doc)
}
