//! Decoded images for `<img>` elements and list-style images.
//!
//! [§ 4.8.3 The img element](https://html.spec.whatwg.org/multipage/embedded-content.html#the-img-element)
//!
//! Images come from local files only. A store maps each `src` string, as
//! written in the document, to premultiplied pixels ready for the raster
//! backend, and doubles as the layout engine's [`ImageResolver`].

use std::collections::BTreeMap;
use std::path::Path;

use image::RgbaImage;
use log::debug;
use quokka_common::warning::warn_once;
use quokka_css::ImageResolver;
use quokka_dom::{DomTree, NodeId};
use tiny_skia::{ColorU8, Pixmap};

use crate::RenderError;

/// Strip query string (`?…`) and fragment identifier (`#…`) from a URL so
/// that the remaining path names a file.
///
/// [URL Standard § 4.1](https://url.spec.whatwg.org/#concept-url-path)
#[must_use]
pub fn strip_url_decorations(src: &str) -> &str {
    let without_fragment = src.split_once('#').map_or(src, |(b, _)| b);
    without_fragment
        .split_once('?')
        .map_or(without_fragment, |(b, _)| b)
}

/// Decoded images keyed by `src`.
#[derive(Debug, Clone, Default)]
pub struct ImageStore {
    images: BTreeMap<String, Pixmap>,
}

impl ImageStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register decoded pixels under `src`. Empty images are ignored and
    /// `false` is returned.
    pub fn insert(&mut self, src: &str, image: &RgbaImage) -> bool {
        let Some(mut pixmap) = Pixmap::new(image.width(), image.height()) else {
            return false;
        };
        for (out, pixel) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
            let [r, g, b, a] = pixel.0;
            *out = ColorU8::from_rgba(r, g, b, a).premultiply();
        }
        let _ = self.images.insert(src.to_string(), pixmap);
        true
    }

    /// Decode a file and register it under `src`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ImageRead`] when the file cannot be opened or
    /// decoded.
    pub fn load_file(&mut self, src: &str, path: &Path) -> Result<(), RenderError> {
        let image = image::open(path)
            .map_err(|source| RenderError::ImageRead {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        if !self.insert(src, &image) {
            warn_once("image", &format!("ignoring empty image '{}'", path.display()));
        }
        Ok(())
    }

    /// Load every `<img src>` of a document, resolving relative paths
    /// against `base`. Remote URLs are never fetched. Returns the number of
    /// images loaded; failures are logged and skipped.
    pub fn load_document_images(&mut self, tree: &DomTree, base: &Path) -> usize {
        let mut loaded = 0;
        for id in tree.descendants(NodeId::ROOT) {
            if tree.tag_name(id) != Some("img") {
                continue;
            }
            let Some(src) = tree.as_element(id).and_then(|e| e.attr("src")) else {
                continue;
            };
            if self.images.contains_key(src) {
                continue;
            }
            if src.contains("://") || src.starts_with("data:") {
                warn_once("image", &format!("not fetching remote image '{src}'"));
                continue;
            }
            let path = base.join(strip_url_decorations(src));
            match self.load_file(src, &path) {
                Ok(()) => loaded += 1,
                Err(e) => warn_once("image", &e.to_string()),
            }
        }
        debug!("loaded {loaded} document images");
        loaded
    }

    /// Pixels for `src`.
    #[must_use]
    pub fn get(&self, src: &str) -> Option<&Pixmap> {
        self.images.get(src)
    }

    /// Number of stored images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the store holds no images.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ImageResolver for ImageStore {
    #[allow(clippy::cast_precision_loss)]
    fn intrinsic_size(&self, src: &str) -> Option<(f32, f32)> {
        self.images
            .get(src)
            .map(|p| (p.width() as f32, p.height() as f32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_strip_url_decorations() {
        assert_eq!(strip_url_decorations("a.png?w=10#x"), "a.png");
        assert_eq!(strip_url_decorations("dir/b.png"), "dir/b.png");
    }

    #[test]
    fn test_insert_reports_intrinsic_size() {
        let mut store = ImageStore::new();
        let image = RgbaImage::from_pixel(4, 3, Rgba([255, 0, 0, 255]));
        assert!(store.insert("red.png", &image));
        assert_eq!(store.intrinsic_size("red.png"), Some((4.0, 3.0)));
        assert_eq!(store.intrinsic_size("missing.png"), None);
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let mut store = ImageStore::new();
        assert!(!store.insert("empty.png", &RgbaImage::new(0, 0)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_document_images_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(2, 5, Rgba([0, 0, 255, 255]))
            .save(dir.path().join("blue.png"))
            .unwrap();
        let tree = quokka_html::parse_document(
            "<img src='blue.png'><img src='http://example.com/x.png'><img src='gone.png'>",
        );
        let mut store = ImageStore::new();
        assert_eq!(store.load_document_images(&tree, dir.path()), 1);
        assert_eq!(store.intrinsic_size("blue.png"), Some((2.0, 5.0)));
    }
}
