use divedraw_core::{parse_flag, Item};
use serde::{Deserialize, Serialize};

pub const RESIZED_IMAGE_COLUMN: &str = "Resized Image Path";
pub const IMAGE_LINK_COLUMN: &str = "Image Link";

/// One row of the loadout spreadsheet. Unknown columns are ignored and missing
/// ones read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    #[serde(rename = "Category", default)]
    pub category: String,
    #[serde(rename = "Type", default)]
    pub item_type: String,
    #[serde(rename = "Subtype", default)]
    pub subtype: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Has Backpack", default)]
    pub has_backpack: String,
    #[serde(rename = "Image Link", default)]
    pub image_link: String,
    #[serde(rename = "Resized Image Path", default)]
    pub resized_image_path: String,
}

impl From<ItemRecord> for Item {
    fn from(record: ItemRecord) -> Self {
        Item {
            has_backpack: parse_flag(&record.has_backpack),
            category: record.category,
            item_type: record.item_type,
            subtype: record.subtype,
            name: record.name,
            image_path: record.resized_image_path,
            image_link: record.image_link,
        }
    }
}
