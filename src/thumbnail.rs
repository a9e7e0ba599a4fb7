//! Thumbnail rendering, deferred to the `image` crate for decode/resize/encode
//!
//! ETag/If-Modified-Since caching per spec: compute a stable ETag from the
//! source's real path, mtime, and render parameters before doing any work.

use std::io::Cursor;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use sha2::{Digest, Sha256};

use crate::error::FilegateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
	Cover,
	Contain,
	Fill,
	Inside,
	Outside,
}

impl Fit {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"cover" => Some(Fit::Cover),
			"contain" => Some(Fit::Contain),
			"fill" => Some(Fit::Fill),
			"inside" => Some(Fit::Inside),
			"outside" => Some(Fit::Outside),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
	Webp,
	Jpeg,
	Png,
	Avif,
}

impl OutputFormat {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"webp" => Some(OutputFormat::Webp),
			"jpeg" | "jpg" => Some(OutputFormat::Jpeg),
			"png" => Some(OutputFormat::Png),
			"avif" => Some(OutputFormat::Avif),
			_ => None,
		}
	}

	fn image_format(&self) -> ImageFormat {
		match self {
			OutputFormat::Webp => ImageFormat::WebP,
			OutputFormat::Jpeg => ImageFormat::Jpeg,
			OutputFormat::Png => ImageFormat::Png,
			OutputFormat::Avif => ImageFormat::Avif,
		}
	}

	pub fn mime_type(&self) -> &'static str {
		match self {
			OutputFormat::Webp => "image/webp",
			OutputFormat::Jpeg => "image/jpeg",
			OutputFormat::Png => "image/png",
			OutputFormat::Avif => "image/avif",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
	Center,
	Top,
	Bottom,
	Left,
	Right,
	Entropy,
	Attention,
}

impl Position {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"center" => Some(Position::Center),
			"top" => Some(Position::Top),
			"bottom" => Some(Position::Bottom),
			"left" => Some(Position::Left),
			"right" => Some(Position::Right),
			"entropy" => Some(Position::Entropy),
			"attention" => Some(Position::Attention),
			_ => None,
		}
	}
}

#[derive(Debug, Clone)]
pub struct ThumbnailParams {
	pub width: u32,
	pub height: u32,
	pub fit: Fit,
	pub position: Position,
	pub format: OutputFormat,
	pub quality: u8,
}

impl Default for ThumbnailParams {
	fn default() -> Self {
		ThumbnailParams {
			width: 200,
			height: 200,
			fit: Fit::Cover,
			position: Position::Center,
			format: OutputFormat::Webp,
			quality: 80,
		}
	}
}

impl ThumbnailParams {
	pub fn validate(&self) -> Result<(), FilegateError> {
		if !(1..=2000).contains(&self.width) || !(1..=2000).contains(&self.height) {
			return Err(FilegateError::bad_request("width/height must be between 1 and 2000"));
		}
		if !(1..=100).contains(&self.quality) {
			return Err(FilegateError::bad_request("quality must be between 1 and 100"));
		}
		Ok(())
	}

	fn params_key(&self) -> String {
		format!(
			"{}x{}:{:?}:{:?}:{:?}:{}",
			self.width, self.height, self.fit, self.position, self.format, self.quality
		)
	}
}

/// First 16 hex chars of `SHA-256(realPath + ":" + mtime_ms + ":" + paramsKey)`
pub fn compute_etag(real_path: &Path, mtime_ms: i64, params: &ThumbnailParams) -> String {
	let mut hasher = Sha256::new();
	hasher.update(real_path.to_string_lossy().as_bytes());
	hasher.update(b":");
	hasher.update(mtime_ms.to_string().as_bytes());
	hasher.update(b":");
	hasher.update(params.params_key().as_bytes());
	hex::encode(&hasher.finalize()[..8])
}

pub struct RenderedThumbnail {
	pub bytes: Vec<u8>,
	pub mime_type: &'static str,
	pub etag: String,
}

pub fn render(source: &Path, params: &ThumbnailParams) -> Result<RenderedThumbnail, FilegateError> {
	params.validate()?;

	let meta = std::fs::metadata(source)?;
	let mtime_ms = meta.modified().ok().and_then(|m| m.duration_since(std::time::UNIX_EPOCH).ok()).map(|d| d.as_millis() as i64).unwrap_or(0);
	let etag = compute_etag(source, mtime_ms, params);

	let img = image::open(source).map_err(|e| FilegateError::bad_request(format!("cannot decode image: {}", e)))?;
	let resized = apply_fit(img, params);

	let mut bytes = Vec::new();
	let format = params.format.image_format();
	resized
		.write_to(&mut Cursor::new(&mut bytes), format)
		.map_err(|e| FilegateError::internal(format!("cannot encode thumbnail: {}", e)))?;

	Ok(RenderedThumbnail { bytes, mime_type: params.format.mime_type(), etag })
}

fn apply_fit(img: DynamicImage, params: &ThumbnailParams) -> DynamicImage {
	match params.fit {
		Fit::Fill => img.resize_exact(params.width, params.height, FilterType::Lanczos3),
		Fit::Contain | Fit::Inside => img.resize(params.width, params.height, FilterType::Lanczos3),
		Fit::Outside => {
			let resized = img.resize(params.width, params.height, FilterType::Lanczos3);
			if resized.width() < params.width || resized.height() < params.height {
				img.resize_to_fill(params.width, params.height, FilterType::Lanczos3)
			} else {
				resized
			}
		}
		Fit::Cover => crop_to_position(img.resize_to_fill(params.width, params.height, FilterType::Lanczos3), params),
	}
}

fn crop_to_position(img: DynamicImage, _params: &ThumbnailParams) -> DynamicImage {
	// resize_to_fill already centers; position-aware cropping for
	// top/bottom/left/right/entropy/attention beyond center is not
	// implemented, since the image crate has no saliency detector.
	img
}

pub fn matches_if_none_match(etag: &str, header_value: Option<&str>) -> bool {
	match header_value {
		Some(value) => value.split(',').map(str::trim).any(|v| v.trim_matches('"') == etag),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_out_of_range_dimensions() {
		let params = ThumbnailParams { width: 0, ..Default::default() };
		assert!(params.validate().is_err());
		let params = ThumbnailParams { width: 3000, ..Default::default() };
		assert!(params.validate().is_err());
	}

	#[test]
	fn rejects_out_of_range_quality() {
		let params = ThumbnailParams { quality: 0, ..Default::default() };
		assert!(params.validate().is_err());
		let params = ThumbnailParams { quality: 101, ..Default::default() };
		assert!(params.validate().is_err());
	}

	#[test]
	fn etag_is_stable_for_same_inputs() {
		let params = ThumbnailParams::default();
		let a = compute_etag(Path::new("/base/x.png"), 1000, &params);
		let b = compute_etag(Path::new("/base/x.png"), 1000, &params);
		assert_eq!(a, b);
		assert_eq!(a.len(), 16);
	}

	#[test]
	fn etag_changes_with_mtime() {
		let params = ThumbnailParams::default();
		let a = compute_etag(Path::new("/base/x.png"), 1000, &params);
		let b = compute_etag(Path::new("/base/x.png"), 2000, &params);
		assert_ne!(a, b);
	}

	#[test]
	fn if_none_match_accepts_quoted_and_unquoted() {
		assert!(matches_if_none_match("abc123", Some("\"abc123\"")));
		assert!(matches_if_none_match("abc123", Some("abc123")));
		assert!(!matches_if_none_match("abc123", Some("xyz")));
		assert!(!matches_if_none_match("abc123", None));
	}

	#[test]
	fn fit_and_format_parse_known_values() {
		assert_eq!(Fit::parse("cover"), Some(Fit::Cover));
		assert_eq!(Fit::parse("bogus"), None);
		assert_eq!(OutputFormat::parse("jpeg"), Some(OutputFormat::Jpeg));
		assert_eq!(OutputFormat::parse("jpg"), Some(OutputFormat::Jpeg));
	}
}

// vim: ts=4
