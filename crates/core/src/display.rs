use crate::Item;
use serde::Serialize;

pub const EMPTY_LABEL: &str = "Empty";
const PLACEHOLDER_SIZE: u32 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "src", rename_all = "snake_case")]
pub enum ImageSource {
    Resized(String),
    Original(String),
    Placeholder(String),
}

/// Image candidates in the order a renderer should try them. The generated
/// placeholder is always last, so the list is never empty.
pub fn image_sources(item: &Item) -> Vec<ImageSource> {
    let mut sources = Vec::with_capacity(3);
    let resized = item.image_path.trim();
    if !resized.is_empty() {
        sources.push(ImageSource::Resized(resized.to_string()));
    }
    let original = item.image_link.trim();
    if !original.is_empty() {
        sources.push(ImageSource::Original(original.to_string()));
    }
    sources.push(ImageSource::Placeholder(placeholder_uri(&item.name)));
    sources
}

pub fn label(item: Option<&Item>) -> &str {
    match item {
        Some(item) if !item.name.trim().is_empty() => item.name.trim(),
        Some(_) => "Unnamed",
        None => EMPTY_LABEL,
    }
}

pub fn initials(name: &str) -> String {
    let letters: String = name
        .split(|c: char| !c.is_alphanumeric())
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();
    if letters.is_empty() {
        "?".to_string()
    } else {
        letters
    }
}

/// Inline SVG tile with the item's initials, tinted by a hash of the name.
pub fn placeholder_uri(name: &str) -> String {
    let hue = name_hash(name) % 360;
    let svg = format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='{size}' height='{size}' viewBox='0 0 {size} {size}'>\
<rect width='100%' height='100%' fill='hsl({hue},35%,22%)'/>\
<text x='50%' y='50%' dy='.35em' text-anchor='middle' font-family='sans-serif' font-size='96' fill='hsl({hue},60%,80%)'>{text}</text>\
</svg>",
        size = PLACEHOLDER_SIZE,
        hue = hue,
        text = escape_xml(&initials(name)),
    );
    format!("data:image/svg+xml;utf8,{}", escape_uri(&svg))
}

fn name_hash(name: &str) -> u32 {
    // FNV-1a
    name.bytes().fold(0x811c_9dc5u32, |hash, byte| {
        (hash ^ byte as u32).wrapping_mul(0x0100_0193)
    })
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_uri(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 32);
    for c in text.chars() {
        match c {
            '%' => out.push_str("%25"),
            '#' => out.push_str("%23"),
            '<' => out.push_str("%3C"),
            '>' => out.push_str("%3E"),
            '"' => out.push_str("%22"),
            ' ' => out.push_str("%20"),
            _ => out.push(c),
        }
    }
    out
}
