use serde::{Deserialize, Serialize};
use std::fmt;

pub const SUPPORT_WEAPON_TYPE: &str = "support weapon";
pub const EXPENDABLE_SUBTYPE: &str = "expendable";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub category: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub subtype: String,
    pub name: String,
    pub has_backpack: bool,
    /// Resized copy produced by the image pipeline, relative to the web root.
    #[serde(default)]
    pub image_path: String,
    /// Original remote image.
    #[serde(default)]
    pub image_link: String,
}

impl Item {
    pub fn new(category: &str, item_type: &str, subtype: &str, name: &str) -> Self {
        Self {
            category: category.to_string(),
            item_type: item_type.to_string(),
            subtype: subtype.to_string(),
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_backpack(mut self, has_backpack: bool) -> Self {
        self.has_backpack = has_backpack;
        self
    }

    pub fn with_images(mut self, image_path: &str, image_link: &str) -> Self {
        self.image_path = image_path.to_string();
        self.image_link = image_link.to_string();
        self
    }

    pub fn is_support_weapon(&self) -> bool {
        eq_field(&self.item_type, SUPPORT_WEAPON_TYPE)
    }

    /// Support weapon that is not expendable. Only one of these fits a loadout.
    pub fn is_heavy_support(&self) -> bool {
        self.is_support_weapon() && !eq_field(&self.subtype, EXPENDABLE_SUBTYPE)
    }

    pub fn field(&self, field: ItemField) -> &str {
        match field {
            ItemField::Category => &self.category,
            ItemField::Type => &self.item_type,
            ItemField::Subtype => &self.subtype,
            ItemField::Name => &self.name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemField {
    Category,
    Type,
    Subtype,
    Name,
}

impl ItemField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Type => "type",
            Self::Subtype => "subtype",
            Self::Name => "name",
        }
    }
}

impl fmt::Display for ItemField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lenient boolean for spreadsheet columns. Anything unrecognised is false.
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        normalize(raw).as_str(),
        "true" | "yes" | "y" | "1" | "x" | "t"
    )
}

pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn eq_field(value: &str, expected: &str) -> bool {
    value.trim().eq_ignore_ascii_case(expected.trim())
}
