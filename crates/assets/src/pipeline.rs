use crate::{
    download, ext_from_content_type, resize_image, AssetError, AssetLayout, Downloaded, Fetcher,
    RetryPolicy, DEFAULT_MAX_SIZE,
};
use divedraw_data::{CsvTable, IMAGE_LINK_COLUMN, RESIZED_IMAGE_COLUMN};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

const TRIMMED_COLUMNS: [&str; 6] = ["Category", "Name", "Type", "Subtype", "Source", "Image Link"];
const FALLBACK_IMAGE_COLUMN: &str = "Image";

#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub assets_root: PathBuf,
    pub max_size: u32,
    pub retry: RetryPolicy,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            assets_root: PathBuf::from(crate::DEFAULT_ASSETS_DIR),
            max_size: DEFAULT_MAX_SIZE,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessReport {
    pub processed: usize,
    /// Rows without an image URL.
    pub skipped: usize,
    pub failed: usize,
    /// Rows whose original was already on disk and was not fetched again.
    pub cached: usize,
}

/// Downloads and resizes every row's image, filling the resized-path column.
/// A row that fails keeps an empty path and processing moves on.
pub fn process_table(
    table: &mut CsvTable,
    options: &ProcessOptions,
    fetcher: &dyn Fetcher,
) -> Result<ProcessReport, AssetError> {
    let layout = AssetLayout::new(&options.assets_root);
    layout.ensure_dirs()?;
    table.ensure_column(RESIZED_IMAGE_COLUMN);

    let mut report = ProcessReport::default();
    for row in 0..table.len() {
        trim_row(table, row);
        let url = image_url(table, row);
        if url.is_empty() {
            table.set(row, RESIZED_IMAGE_COLUMN, "");
            report.skipped += 1;
            continue;
        }

        let mut plan = layout.plan(
            table.get(row, "Category"),
            table.get(row, "Type"),
            table.get(row, "Name"),
            &url,
        );
        if !plan.ext_from_url {
            if let Some(content_type) = fetcher.content_type(&url) {
                let ext = ext_from_content_type(Some(&content_type));
                debug!(%url, %content_type, ext, "extension from content type");
                plan = plan.with_extension(ext);
            }
        }

        match download(fetcher, &url, &plan.original, &options.retry) {
            Ok(Downloaded::Fetched) => debug!(row, %url, "downloaded"),
            Ok(Downloaded::AlreadyPresent) => {
                debug!(row, path = %plan.original.display(), "reusing downloaded original");
                report.cached += 1;
            }
            Err(err) => {
                warn!(row, %url, error = %err, "download failed");
                table.set(row, RESIZED_IMAGE_COLUMN, "");
                report.failed += 1;
                continue;
            }
        }

        match resize_image(&plan.original, &plan.resized, options.max_size) {
            Ok((width, height)) => {
                debug!(row, path = %plan.resized.display(), width, height, "resized");
                table.set(row, RESIZED_IMAGE_COLUMN, plan.web_path);
                report.processed += 1;
            }
            Err(err) => {
                error!(row, path = %plan.original.display(), error = %err, "resize failed");
                table.set(row, RESIZED_IMAGE_COLUMN, "");
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

/// Reads `input`, processes it and writes the updated table to `output`.
pub fn process_csv(
    input: &Path,
    output: &Path,
    options: &ProcessOptions,
    fetcher: &dyn Fetcher,
) -> Result<ProcessReport, AssetError> {
    if !input.exists() {
        return Err(AssetError::MissingInput(input.display().to_string()));
    }
    let mut table = CsvTable::read_path(input)?;
    info!(input = %input.display(), rows = table.len(), "processing images");
    let report = process_table(&mut table, options, fetcher)?;
    table.write_path(output)?;
    info!(
        output = %output.display(),
        processed = report.processed,
        skipped = report.skipped,
        failed = report.failed,
        cached = report.cached,
        "wrote updated csv"
    );
    Ok(report)
}

fn trim_row(table: &mut CsvTable, row: usize) {
    for column in TRIMMED_COLUMNS {
        let trimmed = match table.get(row, column) {
            Some(value) if value.trim().len() != value.len() => value.trim().to_string(),
            _ => continue,
        };
        table.set(row, column, trimmed);
    }
}

fn image_url(table: &CsvTable, row: usize) -> String {
    let link = table.get(row, IMAGE_LINK_COLUMN).unwrap_or_default();
    let url = if link.is_empty() {
        table.get(row, FALLBACK_IMAGE_COLUMN).unwrap_or_default()
    } else {
        link
    };
    url.trim().to_string()
}
