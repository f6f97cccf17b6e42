use crate::image::PendingImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// At most one image; adding replaces it.
    Single,
    /// Ordered by upload.
    Multi,
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    mode: StoreMode,
    images: Vec<PendingImage>,
}

impl ImageStore {
    pub fn new(mode: StoreMode) -> Self {
        Self {
            mode,
            images: Vec::new(),
        }
    }

    pub fn mode(&self) -> StoreMode {
        self.mode
    }

    pub fn add(&mut self, image: PendingImage) {
        if self.mode == StoreMode::Single {
            self.images.clear();
        }
        self.images.push(image);
    }

    pub fn reset(&mut self) {
        self.images.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn images(&self) -> &[PendingImage] {
        &self.images
    }

    /// Most recently added image.
    pub fn latest(&self) -> Option<&PendingImage> {
        self.images.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::CandidateFile;

    fn image(name: &str) -> PendingImage {
        PendingImage::accept(CandidateFile::new(name, "image/png", vec![1, 2, 3])).unwrap()
    }

    #[test]
    fn test_single_mode_replaces() {
        let mut store = ImageStore::new(StoreMode::Single);
        store.add(image("a.png"));
        store.add(image("b.png"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.latest().unwrap().file_name(), "b.png");
    }

    #[test]
    fn test_multi_mode_keeps_upload_order() {
        let mut store = ImageStore::new(StoreMode::Multi);
        store.add(image("a.png"));
        store.add(image("b.png"));
        store.add(image("c.png"));
        let names: Vec<_> = store.images().iter().map(|i| i.file_name()).collect();
        assert_eq!(names, vec!["a.png", "b.png", "c.png"]);
        assert_eq!(store.latest().unwrap().file_name(), "c.png");
    }

    #[test]
    fn test_reset_empties_store() {
        let mut store = ImageStore::new(StoreMode::Multi);
        store.add(image("a.png"));
        store.reset();
        assert!(store.is_empty());
        assert!(store.latest().is_none());
    }
}
