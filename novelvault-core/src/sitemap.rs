//! XML sitemap generation

use std::fmt::Write;

/// Static pages listed in every sitemap, relative to the base URL
pub const STATIC_PAGES: [&str; 6] = ["", "novels", "rankings", "login", "register", "contact"];

/// Accumulates `<loc>` entries and renders the urlset document
#[derive(Debug, Clone)]
pub struct SitemapBuilder {
    base_url: String,
    locations: Vec<String>,
}

impl SitemapBuilder {
    /// Start a sitemap rooted at `base_url` (trailing slashes are dropped)
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            locations: Vec::new(),
        }
    }

    /// Add the fixed site pages
    pub fn static_pages(mut self) -> Self {
        for page in STATIC_PAGES {
            let loc = if page.is_empty() {
                self.base_url.clone()
            } else {
                format!("{}/{}", self.base_url, page)
            };
            self.locations.push(loc);
        }
        self
    }

    pub fn novel(&mut self, slug: &str) {
        self.locations
            .push(format!("{}/novels/{}", self.base_url, slug));
    }

    pub fn genre(&mut self, name: &str) {
        self.locations.push(format!(
            "{}/novels?genres={}",
            self.base_url,
            urlencoding::encode(name)
        ));
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Render the sitemap document
    pub fn build(&self) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
        );
        for loc in &self.locations {
            // writing to a String cannot fail
            let _ = writeln!(xml, "<url><loc>{}</loc></url>", escape_xml(loc));
        }
        xml.push_str("</urlset>");
        xml
    }
}

/// Escape the five XML special characters
pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_pages_without_trailing_slash() {
        let xml = SitemapBuilder::new("https://example.com/").static_pages().build();
        assert!(xml.contains("<url><loc>https://example.com</loc></url>"));
        assert!(xml.contains("<url><loc>https://example.com/rankings</loc></url>"));
        assert!(xml.contains("<url><loc>https://example.com/contact</loc></url>"));
        assert!(!xml.contains("https://example.com//"));
    }

    #[test]
    fn document_shape() {
        let xml = SitemapBuilder::new("https://example.com").build();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\""));
        assert!(xml.ends_with("</urlset>"));
    }

    #[test]
    fn novels_and_genres() {
        let mut builder = SitemapBuilder::new("https://example.com").static_pages();
        builder.novel("the-last-sword");
        builder.genre("Sci Fi & Space");
        assert_eq!(builder.len(), STATIC_PAGES.len() + 2);

        let xml = builder.build();
        assert!(xml.contains("<loc>https://example.com/novels/the-last-sword</loc>"));
        assert!(xml.contains("<loc>https://example.com/novels?genres=Sci%20Fi%20%26%20Space</loc>"));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_xml("a&b<c>\"'"), "a&amp;b&lt;c&gt;&quot;&apos;");
    }
}
