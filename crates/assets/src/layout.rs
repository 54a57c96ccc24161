use crate::{ext_from_url, slugify};
use std::path::{Path, PathBuf};

pub const DEFAULT_ASSETS_DIR: &str = "assets/images";
pub const DEFAULT_EXTENSION: &str = ".png";
const WEB_PREFIX: &str = "assets/images";

/// On-disk layout of downloaded and resized images under one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLayout {
    pub root: PathBuf,
}

/// Where one dataset row's image lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPaths {
    pub original: PathBuf,
    pub resized: PathBuf,
    /// Path the web front end loads, always with `/` separators.
    pub web_path: String,
    /// False when the URL had no usable extension and the default was used.
    pub ext_from_url: bool,
}

impl AssetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn originals_dir(&self) -> PathBuf {
        self.root.join("original")
    }

    pub fn resized_dir(&self) -> PathBuf {
        self.root.join("resized")
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.originals_dir())?;
        std::fs::create_dir_all(self.resized_dir())
    }

    /// Paths for an item. `None` fields mean the column is absent from the
    /// dataset; an empty value slugifies to `item`.
    pub fn plan(
        &self,
        category: Option<&str>,
        item_type: Option<&str>,
        name: Option<&str>,
        url: &str,
    ) -> PlannedPaths {
        let category = slugify(category.unwrap_or("misc"));
        let item_type = slugify(item_type.unwrap_or("misc"));
        let name = slugify(name.unwrap_or("item"));
        let url_ext = ext_from_url(url);
        let ext_from_url = !url_ext.is_empty();
        let ext = if ext_from_url {
            url_ext
        } else {
            DEFAULT_EXTENSION.to_string()
        };
        let file = format!("{name}{ext}");
        PlannedPaths {
            original: self
                .originals_dir()
                .join(&category)
                .join(&item_type)
                .join(&file),
            resized: self.resized_dir().join(&category).join(&item_type).join(&file),
            web_path: format!("{WEB_PREFIX}/resized/{category}/{item_type}/{file}"),
            ext_from_url,
        }
    }
}

impl PlannedPaths {
    /// Swaps the extension of every path, e.g. after a `Content-Type` probe.
    /// `ext` includes the leading dot.
    pub fn with_extension(mut self, ext: &str) -> Self {
        let bare = ext.trim_start_matches('.');
        self.original.set_extension(bare);
        self.resized.set_extension(bare);
        self.web_path = replace_web_extension(&self.web_path, bare);
        self
    }
}

fn replace_web_extension(web_path: &str, bare_ext: &str) -> String {
    let (dir, file) = match web_path.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, web_path),
    };
    let stem = Path::new(file)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file);
    let file = format!("{stem}.{bare_ext}");
    match dir {
        Some(dir) => format!("{dir}/{file}"),
        None => file,
    }
}
