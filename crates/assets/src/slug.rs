/// File-system friendly slug: lowercase ASCII alphanumerics joined by single
/// dashes. Falls back to `item` when nothing survives.
pub fn slugify(value: &str) -> String {
    let lowered = value
        .trim()
        .to_lowercase()
        .replace(['\u{201c}', '\u{201d}'], "\"")
        .replace('\u{2019}', "'");
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_dash = false;
    for c in lowered.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "item".to_string()
    } else {
        slug
    }
}

/// Extension (with dot) implied by a `Content-Type` header; `.png` otherwise.
pub fn ext_from_content_type(content_type: Option<&str>) -> &'static str {
    let Some(content_type) = content_type else {
        return ".png";
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match mime.as_str() {
        "image/png" => ".png",
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/webp" => ".webp",
        "image/gif" => ".gif",
        "image/svg+xml" => ".svg",
        _ => ".png",
    }
}

/// Lowercased extension of the URL path, ignoring the query string. Empty when
/// there is none or it is implausibly long.
pub fn ext_from_url(url: &str) -> String {
    let path = url.split('?').next().unwrap_or_default();
    let file = path.rsplit('/').next().unwrap_or_default();
    match file.rfind('.') {
        Some(dot) if dot > 0 && file.len() - dot <= 5 => file[dot..].to_lowercase(),
        _ => String::new(),
    }
}
