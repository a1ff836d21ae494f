//! Image-list cells: `url ! alt: Face ! title: Chaise | url2 ! alt: Dos`

use url::Url;

/// A decoded image reference, not yet bound to an owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub url: String,
    pub alt: Option<String>,
    pub title: Option<String>,
    /// Zero-based index of the chunk in the source cell
    pub position: i64,
    pub is_featured: bool,
}

/// Decode an image cell
///
/// Chunks whose leading token is not an absolute http(s) URL are dropped;
/// positions keep the chunk index, so a dropped chunk leaves a gap. The first
/// retained image is featured.
pub fn parse_images(cell: Option<&str>) -> Vec<ImageRef> {
    let mut images: Vec<ImageRef> = Vec::new();
    for (idx, chunk) in cell.unwrap_or_default().split('|').enumerate() {
        let mut tokens = chunk.split('!').map(str::trim);
        let Some(url) = tokens.next().and_then(valid_url) else {
            if !chunk.trim().is_empty() {
                tracing::debug!(chunk = chunk.trim(), "dropping image chunk without a valid url");
            }
            continue;
        };

        let mut alt = None;
        let mut title = None;
        for token in tokens {
            let Some((key, value)) = token.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.trim().to_lowercase().as_str() {
                "alt" => alt = Some(value.to_string()),
                "title" => title = Some(value.to_string()),
                _ => {}
            }
        }

        images.push(ImageRef {
            url,
            alt,
            title,
            position: idx as i64,
            is_featured: images.is_empty(),
        });
    }
    images
}

fn valid_url(token: &str) -> Option<String> {
    let parsed = Url::parse(token).ok()?;
    match parsed.scheme() {
        "http" | "https" if parsed.host().is_some() => Some(token.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_images_with_metadata() {
        let images = parse_images(Some(
            "https://cdn.example.com/a.jpg ! alt: Chaise face ! title: Chaise A1 | https://cdn.example.com/b.jpg",
        ));
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].url, "https://cdn.example.com/a.jpg");
        assert_eq!(images[0].alt.as_deref(), Some("Chaise face"));
        assert_eq!(images[0].title.as_deref(), Some("Chaise A1"));
        assert!(images[0].is_featured);
        assert_eq!(images[1].position, 1);
        assert_eq!(images[1].alt, None);
        assert!(!images[1].is_featured);
    }

    #[test]
    fn test_invalid_chunks_dropped_and_featured_moves() {
        let images = parse_images(Some("not a url ! alt: x | ftp://host/f.jpg | http://cdn.example.com/c.png"));
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].position, 2);
        assert!(images[0].is_featured);
    }

    #[test]
    fn test_value_may_contain_colon() {
        let images = parse_images(Some("https://cdn.example.com/a.jpg ! title: Réf: A1"));
        assert_eq!(images[0].title.as_deref(), Some("Réf: A1"));
    }

    #[test]
    fn test_empty_cell() {
        assert!(parse_images(None).is_empty());
        assert!(parse_images(Some("")).is_empty());
    }
}
