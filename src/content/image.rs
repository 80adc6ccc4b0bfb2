//! Image references and CDN URL building
//!
//! Documents point at images through asset references of the form
//! `image-<assetId>-<width>x<height>-<format>`. The CDN serves the original at
//! `https://cdn.sanity.io/images/<project>/<dataset>/<assetId>-<width>x<height>.<format>`
//! and accepts transform parameters in the query string.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const CDN_ORIGIN: &str = "https://cdn.sanity.io";

lazy_static! {
    static ref ASSET_REF: Regex =
        Regex::new(r"^image-([A-Za-z0-9]+)-(\d+)x(\d+)-([a-z0-9]+)$").expect("valid regex");
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageRefError {
    #[error("image has no asset reference")]
    MissingAsset,
    #[error("malformed image reference `{0}`")]
    Malformed(String),
}

/// An image field as it appears in a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSource {
    #[serde(default)]
    pub asset: Option<AssetRef>,
    #[serde(default)]
    pub alt: Option<String>,
}

/// Either a bare reference or a dereferenced asset document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetRef {
    #[serde(rename = "_ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ImageSource {
    /// Build a source from a bare asset reference
    pub fn from_ref(reference: impl Into<String>) -> Self {
        Self {
            asset: Some(AssetRef {
                reference: Some(reference.into()),
                ..AssetRef::default()
            }),
            alt: None,
        }
    }

    fn asset_id(&self) -> Option<&str> {
        let asset = self.asset.as_ref()?;
        asset.reference.as_deref().or(asset.id.as_deref())
    }
}

/// A parsed asset reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub format: String,
}

impl ImageRef {
    pub fn parse(reference: &str) -> Result<Self, ImageRefError> {
        let caps = ASSET_REF
            .captures(reference)
            .ok_or_else(|| ImageRefError::Malformed(reference.to_string()))?;
        let dimension = |i: usize| {
            caps[i]
                .parse::<u32>()
                .map_err(|_| ImageRefError::Malformed(reference.to_string()))
        };
        Ok(Self {
            id: caps[1].to_string(),
            width: dimension(2)?,
            height: dimension(3)?,
            format: caps[4].to_string(),
        })
    }

    fn file_name(&self) -> String {
        format!("{}-{}x{}.{}", self.id, self.width, self.height, self.format)
    }
}

/// How the CDN should fit an image into the requested box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    Clip,
    Crop,
    Fill,
    Max,
    Min,
    Scale,
}

impl Fit {
    fn as_str(self) -> &'static str {
        match self {
            Fit::Clip => "clip",
            Fit::Crop => "crop",
            Fit::Fill => "fill",
            Fit::Max => "max",
            Fit::Min => "min",
            Fit::Scale => "scale",
        }
    }
}

/// Resolves image sources against one project and dataset
#[derive(Debug, Clone)]
pub struct ImageUrlBuilder {
    project_id: String,
    dataset: String,
}

impl ImageUrlBuilder {
    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
        }
    }

    /// Start a transformable URL for a source
    pub fn image(&self, source: &ImageSource) -> Result<ImageUrl, ImageRefError> {
        let base = match source.asset.as_ref().and_then(|a| a.url.as_deref()) {
            Some(url) => url.to_string(),
            None => {
                let reference = source.asset_id().ok_or(ImageRefError::MissingAsset)?;
                let image = ImageRef::parse(reference)?;
                format!(
                    "{}/images/{}/{}/{}",
                    CDN_ORIGIN,
                    self.project_id,
                    self.dataset,
                    image.file_name()
                )
            }
        };
        Ok(ImageUrl::new(base))
    }

    /// Untransformed URL for a source
    pub fn url(&self, source: &ImageSource) -> Result<String, ImageRefError> {
        Ok(self.image(source)?.to_string())
    }

    /// URL for an optional source, logging and returning an empty string on bad data
    pub fn url_or_empty(&self, source: Option<&ImageSource>) -> String {
        let Some(source) = source else {
            return String::new();
        };
        match self.url(source) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Unresolvable image: {}", e);
                String::new()
            }
        }
    }
}

/// An image URL with optional CDN transforms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUrl {
    base: String,
    width: Option<u32>,
    height: Option<u32>,
    fit: Option<Fit>,
    quality: Option<u8>,
    auto_format: bool,
}

impl ImageUrl {
    fn new(base: String) -> Self {
        Self {
            base,
            width: None,
            height: None,
            fit: None,
            quality: None,
            auto_format: false,
        }
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn fit(mut self, fit: Fit) -> Self {
        self.fit = Some(fit);
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality.min(100));
        self
    }

    /// Let the CDN pick the best format for the browser
    pub fn auto_format(mut self) -> Self {
        self.auto_format = true;
        self
    }
}

impl fmt::Display for ImageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut params = Vec::new();
        if let Some(w) = self.width {
            params.push(format!("w={}", w));
        }
        if let Some(h) = self.height {
            params.push(format!("h={}", h));
        }
        if let Some(fit) = self.fit {
            params.push(format!("fit={}", fit.as_str()));
        }
        if let Some(q) = self.quality {
            params.push(format!("q={}", q));
        }
        if self.auto_format {
            params.push("auto=format".to_string());
        }

        if params.is_empty() {
            write!(f, "{}", self.base)
        } else {
            let sep = if self.base.contains('?') { '&' } else { '?' };
            write!(f, "{}{}{}", self.base, sep, params.join("&"))
        }
    }
}
