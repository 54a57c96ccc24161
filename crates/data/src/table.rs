use anyhow::Context;
use std::io::{Read, Write};
use std::path::Path;

/// Header-addressed CSV table that keeps every column and their order, for
/// rewriting a dataset without knowing its full schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn read_path(path: &Path) -> anyhow::Result<Self> {
        let file =
            std::fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
        Self::read(file).with_context(|| format!("parse {}", path.display()))
    }

    pub fn read<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers: Vec<String> = reader
            .headers()
            .context("read header row")?
            .iter()
            .map(strip_bom)
            .collect();
        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("read row {}", line + 1))?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len().max(row.len()), String::new());
            rows.push(row);
        }
        Ok(Self { headers, rows })
    }

    pub fn write_path(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let file =
            std::fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
        self.write(file)
            .with_context(|| format!("write {}", path.display()))
    }

    pub fn write<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Index of `name`, appending an empty column when it does not exist yet.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        let width = self.headers.len();
        for row in &mut self.rows {
            if row.len() < width {
                row.resize(width, String::new());
            }
        }
        width - 1
    }

    pub fn get(&self, row: usize, name: &str) -> Option<&str> {
        let col = self.column(name)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    pub fn set(&mut self, row: usize, name: &str, value: impl Into<String>) {
        let col = self.ensure_column(name);
        if let Some(cells) = self.rows.get_mut(row) {
            if cells.len() <= col {
                cells.resize(col + 1, String::new());
            }
            cells[col] = value.into();
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn strip_bom(header: &str) -> String {
    header.trim_start_matches('\u{feff}').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "Category,Name,Source\nWeapon,Liberator,Warbond\nBooster,Stamina\n";

    #[test]
    fn pads_short_rows_and_appends_columns() {
        let mut table = CsvTable::read(SHEET.as_bytes()).expect("read");
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1, "Source"), Some(""));
        table.set(0, "Resized Image Path", "assets/images/resized/weapon/misc/liberator.png");
        assert_eq!(table.headers.last().map(String::as_str), Some("Resized Image Path"));
        assert_eq!(table.get(1, "Resized Image Path"), Some(""));

        let mut out = Vec::new();
        table.write(&mut out).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Category,Name,Source,Resized Image Path"));
        assert_eq!(
            lines.next(),
            Some("Weapon,Liberator,Warbond,assets/images/resized/weapon/misc/liberator.png")
        );
        assert_eq!(lines.next(), Some("Booster,Stamina,,"));
    }

    #[test]
    fn ensure_column_is_idempotent() {
        let mut table = CsvTable::read(SHEET.as_bytes()).expect("read");
        let first = table.ensure_column("Name");
        assert_eq!(first, 1);
        let added = table.ensure_column("Extra");
        assert_eq!(table.ensure_column("Extra"), added);
        assert_eq!(table.headers.len(), 4);
    }

    #[test]
    fn strips_byte_order_mark() {
        let table = CsvTable::read("\u{feff}Category,Name\nWeapon,Breaker\n".as_bytes())
            .expect("read");
        assert_eq!(table.column("Category"), Some(0));
    }
}
