//! Request Classifier
//!
//! Maps each intercepted request to exactly one [`RequestClass`] by walking
//! [`RULE_PRECEDENCE`] top-down; the first matching rule wins.

use regex::RegexSet;
use serde::Serialize;
use url::Url;

use crate::error::{Result, WorkerError};
use crate::network::FetchRequest;

// == Patterns ==
// Patterns are tested against the full serialized URL, query string included.

/// Cross-origin requests matching any of these are served from the font store.
pub const FONT_PATTERNS: &[&str] = &[
    r"fonts\.googleapis\.com",
    r"fonts\.gstatic\.com",
    r"\.woff2?$",
    r"\.ttf$",
    r"\.otf$",
];

/// Same-origin requests that must always come from the network.
pub const ALWAYS_FRESH_PATTERNS: &[&str] = &[r"/api/", r"notion", r"googleapis"];

pub const IMAGE_PATTERNS: &[&str] = &[r"(?i)\.(png|jpg|jpeg|gif|svg|webp|ico)$"];

pub const STATIC_PATTERNS: &[&str] = &[r"\.html$", r"\.css$", r"\.js$", r"\.json$"];

// == Request Class ==
/// Caching strategy selected for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestClass {
    /// Not intercepted; the request goes to the network untouched
    Skip,
    /// Cache first, network on miss
    Font,
    /// Network only, typed offline response on failure
    Api,
    /// Stale-while-revalidate
    Image,
    /// Network first, cache and offline page as fallback
    Static,
    /// Network first, static store and offline page as fallback
    Default,
}

// == Rules ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    NonGet,
    CrossOriginFont,
    CrossOrigin,
    AlwaysFresh,
    Image,
    StaticAsset,
    Fallback,
}

impl Rule {
    pub fn class(self) -> RequestClass {
        match self {
            Rule::NonGet | Rule::CrossOrigin => RequestClass::Skip,
            Rule::CrossOriginFont => RequestClass::Font,
            Rule::AlwaysFresh => RequestClass::Api,
            Rule::Image => RequestClass::Image,
            Rule::StaticAsset => RequestClass::Static,
            Rule::Fallback => RequestClass::Default,
        }
    }
}

/// Evaluation order of the classification rules.
pub const RULE_PRECEDENCE: [Rule; 7] = [
    Rule::NonGet,
    Rule::CrossOriginFont,
    Rule::CrossOrigin,
    Rule::AlwaysFresh,
    Rule::Image,
    Rule::StaticAsset,
    Rule::Fallback,
];

// == Classifier ==
#[derive(Debug, Clone)]
pub struct Classifier {
    origin: Url,
    fonts: RegexSet,
    always_fresh: RegexSet,
    images: RegexSet,
    static_assets: RegexSet,
}

impl Classifier {
    /// Builds a classifier for pages served from `origin`.
    pub fn new(origin: Url) -> Result<Self> {
        Ok(Self {
            origin,
            fonts: compile(FONT_PATTERNS)?,
            always_fresh: compile(ALWAYS_FRESH_PATTERNS)?,
            images: compile(IMAGE_PATTERNS)?,
            static_assets: compile(STATIC_PATTERNS)?,
        })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn classify(&self, request: &FetchRequest) -> RequestClass {
        self.matching_rule(request).class()
    }

    /// First rule in [`RULE_PRECEDENCE`] that matches `request`.
    pub fn matching_rule(&self, request: &FetchRequest) -> Rule {
        RULE_PRECEDENCE
            .into_iter()
            .find(|rule| self.matches(*rule, request))
            .unwrap_or(Rule::Fallback)
    }

    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin.origin()
    }

    fn matches(&self, rule: Rule, request: &FetchRequest) -> bool {
        let url = request.url.as_str();
        let same_origin = self.is_same_origin(&request.url);

        match rule {
            Rule::NonGet => request.method != axum::http::Method::GET,
            Rule::CrossOriginFont => !same_origin && self.fonts.is_match(url),
            Rule::CrossOrigin => !same_origin,
            Rule::AlwaysFresh => same_origin && self.always_fresh.is_match(url),
            Rule::Image => same_origin && self.images.is_match(url),
            Rule::StaticAsset => same_origin && self.static_assets.is_match(url),
            Rule::Fallback => true,
        }
    }
}

fn compile(patterns: &[&str]) -> Result<RegexSet> {
    RegexSet::new(patterns).map_err(|e| WorkerError::Internal(format!("invalid pattern: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    fn classifier() -> Classifier {
        Classifier::new(Url::parse("http://localhost:3000").unwrap()).unwrap()
    }

    fn get(url: &str) -> FetchRequest {
        FetchRequest::get(Url::parse(url).unwrap())
    }

    #[test]
    fn test_rule_precedence_order() {
        assert_eq!(
            RULE_PRECEDENCE,
            [
                Rule::NonGet,
                Rule::CrossOriginFont,
                Rule::CrossOrigin,
                Rule::AlwaysFresh,
                Rule::Image,
                Rule::StaticAsset,
                Rule::Fallback,
            ]
        );
        assert_eq!(RULE_PRECEDENCE.last(), Some(&Rule::Fallback));
    }

    #[test]
    fn test_non_get_skipped() {
        let c = classifier();
        let req = get("http://localhost:3000/app.css").with_method(Method::POST);
        assert_eq!(c.classify(&req), RequestClass::Skip);
        assert_eq!(c.matching_rule(&req), Rule::NonGet);
    }

    #[test]
    fn test_non_get_wins_over_font() {
        let req = get("https://fonts.gstatic.com/s/inter.woff2").with_method(Method::HEAD);
        assert_eq!(classifier().classify(&req), RequestClass::Skip);
    }

    #[test]
    fn test_cross_origin_fonts() {
        let c = classifier();
        for url in [
            "https://fonts.googleapis.com/css2?family=Inter",
            "https://fonts.gstatic.com/s/inter/v12/abc.woff2",
            "https://cdn.example.com/font.woff",
            "https://cdn.example.com/font.ttf",
            "https://cdn.example.com/font.otf",
        ] {
            assert_eq!(c.classify(&get(url)), RequestClass::Font, "{url}");
        }
    }

    #[test]
    fn test_cross_origin_other_skipped() {
        let c = classifier();
        assert_eq!(
            c.classify(&get("https://cdn.example.com/lib.js")),
            RequestClass::Skip
        );
        assert_eq!(
            c.classify(&get("https://api.notion.com/v1/pages")),
            RequestClass::Skip
        );
        // Different port is a different origin
        assert_eq!(
            c.classify(&get("http://localhost:4000/app.css")),
            RequestClass::Skip
        );
    }

    #[test]
    fn test_same_origin_api() {
        let c = classifier();
        assert_eq!(c.classify(&get("http://localhost:3000/api/notion")), RequestClass::Api);
        assert_eq!(
            c.classify(&get("http://localhost:3000/data/notion-export.json")),
            RequestClass::Api
        );
        assert_eq!(
            c.classify(&get("http://localhost:3000/proxy/googleapis/maps")),
            RequestClass::Api
        );
    }

    #[test]
    fn test_api_wins_over_image_and_static() {
        let c = classifier();
        assert_eq!(c.classify(&get("http://localhost:3000/api/avatar.png")), RequestClass::Api);
        assert_eq!(c.classify(&get("http://localhost:3000/api/data.json")), RequestClass::Api);
    }

    #[test]
    fn test_images_case_insensitive() {
        let c = classifier();
        for url in [
            "http://localhost:3000/photo.png",
            "http://localhost:3000/img/PHOTO.JPG",
            "http://localhost:3000/a.jpeg",
            "http://localhost:3000/a.gif",
            "http://localhost:3000/logo.svg",
            "http://localhost:3000/a.webp",
            "http://localhost:3000/favicon.ico",
        ] {
            assert_eq!(c.classify(&get(url)), RequestClass::Image, "{url}");
        }
    }

    #[test]
    fn test_static_assets() {
        let c = classifier();
        for url in [
            "http://localhost:3000/index.html",
            "http://localhost:3000/app.css",
            "http://localhost:3000/bundle.js",
            "http://localhost:3000/manifest.json",
        ] {
            assert_eq!(c.classify(&get(url)), RequestClass::Static, "{url}");
        }
    }

    #[test]
    fn test_default_class() {
        let c = classifier();
        assert_eq!(c.classify(&get("http://localhost:3000/")), RequestClass::Default);
        assert_eq!(c.classify(&get("http://localhost:3000/dashboard")), RequestClass::Default);
        // Query strings defeat suffix patterns
        assert_eq!(
            c.classify(&get("http://localhost:3000/app.css?v=2")),
            RequestClass::Default
        );
        // Same-origin fonts are not font-class
        assert_eq!(
            c.classify(&get("http://localhost:3000/fonts/inter.woff2")),
            RequestClass::Default
        );
    }
}
