use crate::models::Photo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerKey {
    Next,
    Prev,
    Close,
}

impl ViewerKey {
    /// Browser-style key names.
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "ArrowRight" | "Right" | "n" => Some(ViewerKey::Next),
            "ArrowLeft" | "Left" | "p" => Some(ViewerKey::Prev),
            "Escape" | "Esc" | "q" => Some(ViewerKey::Close),
            _ => None,
        }
    }
}

/// Read-only carousel over the photos that have a resolved URL.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoViewer {
    urls: Vec<String>,
    index: usize,
    open: bool,
}

impl PhotoViewer {
    pub fn new(photos: &[Photo]) -> Self {
        Self {
            urls: photos.iter().filter_map(|p| p.url.clone()).collect(),
            index: 0,
            open: false,
        }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn open_at(&mut self, index: usize) -> Option<&str> {
        if self.urls.is_empty() {
            return None;
        }
        self.index = index.min(self.urls.len() - 1);
        self.open = true;
        self.current()
    }

    pub fn current(&self) -> Option<&str> {
        if !self.open {
            return None;
        }
        self.urls.get(self.index).map(String::as_str)
    }

    /// Navigation wraps at both ends.
    pub fn handle(&mut self, key: ViewerKey) -> Option<&str> {
        if !self.open || self.urls.is_empty() {
            return None;
        }
        let len = self.urls.len();
        match key {
            ViewerKey::Next => self.index = (self.index + 1) % len,
            ViewerKey::Prev => self.index = (self.index + len - 1) % len,
            ViewerKey::Close => self.open = false,
        }
        self.current()
    }
}
