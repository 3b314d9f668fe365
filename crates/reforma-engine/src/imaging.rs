use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageResult, Rgb, RgbImage};
use reqwest::blocking::Client as HttpClient;
use tracing::debug;

use crate::error::AnalysisError;
use crate::http::{build_http_client, error_chain_text};

/// JPEG thumbnail of one listing photo, ready to inline into a model request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl EncodedImage {
    pub fn new(bytes: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            bytes,
            width,
            height,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    pub fn mime(&self) -> &'static str {
        "image/jpeg"
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime(), BASE64.encode(&self.bytes))
    }
}

pub trait ImageSource {
    fn fetch_encoded(&self, url: &str) -> Result<EncodedImage, AnalysisError>;
}

/// Downloads photos over HTTP and normalizes them with [`normalize_image`].
pub struct HttpImageSource {
    http: HttpClient,
    width: u32,
    height: u32,
    quality: u8,
}

impl HttpImageSource {
    pub fn new(timeout: Duration, width: u32, height: u32, quality: u8) -> reqwest::Result<Self> {
        Ok(Self::with_client(
            build_http_client(timeout)?,
            width,
            height,
            quality,
        ))
    }

    pub fn with_client(http: HttpClient, width: u32, height: u32, quality: u8) -> Self {
        Self {
            http,
            width,
            height,
            quality,
        }
    }
}

impl ImageSource for HttpImageSource {
    fn fetch_encoded(&self, url: &str) -> Result<EncodedImage, AnalysisError> {
        let fetch_error = |reason: String| AnalysisError::Fetch {
            url: url.to_string(),
            reason,
        };
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|err| fetch_error(error_chain_text(&err)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("status {}", status.as_u16())));
        }
        let body = response
            .bytes()
            .map_err(|err| fetch_error(error_chain_text(&err)))?;

        let bytes = normalize_image(&body, self.width, self.height, self.quality).map_err(
            |err| AnalysisError::Decode {
                url: url.to_string(),
                reason: err.to_string(),
            },
        )?;
        debug!(url, source_bytes = body.len(), encoded_bytes = bytes.len(), "image normalized");
        Ok(EncodedImage::new(bytes, self.width, self.height))
    }
}

/// Decodes `raw`, flattens any alpha onto white, resizes to exactly `width`×`height`
/// with Lanczos3 and re-encodes as JPEG at `quality`.
pub fn normalize_image(raw: &[u8], width: u32, height: u32, quality: u8) -> ImageResult<Vec<u8>> {
    let decoded = image::load_from_memory(raw)?;
    let flattened = flatten_onto_white(&decoded);
    let resized = DynamicImage::ImageRgb8(flattened)
        .resize_exact(width.max(1), height.max(1), FilterType::Lanczos3)
        .to_rgb8();

    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    encoder.encode_image(&resized)?;
    Ok(bytes)
}

fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let mut flattened = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = u16::from(pixel[3]);
        let blend =
            |channel: u8| -> u8 { (((u16::from(channel) * alpha) + (255 * (255 - alpha))) / 255) as u8 };
        flattened.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }
    flattened
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use image::{ImageFormat, Rgba, RgbaImage};

    use crate::error::AnalysisError;

    use super::{normalize_image, HttpImageSource, ImageSource};

    fn png_bytes(width: u32, height: u32) -> anyhow::Result<Vec<u8>> {
        let mut image = RgbaImage::new(width, height);
        for (x, _, pixel) in image.enumerate_pixels_mut() {
            *pixel = Rgba([(x % 255) as u8, 90, 160, 128]);
        }
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    fn source() -> anyhow::Result<HttpImageSource> {
        Ok(HttpImageSource::new(Duration::from_secs(5), 800, 600, 70)?)
    }

    #[test]
    fn normalize_resizes_to_exact_dimensions_as_jpeg() -> anyhow::Result<()> {
        let encoded = normalize_image(&png_bytes(64, 32)?, 800, 600, 70)?;
        let decoded = image::load_from_memory(&encoded)?;
        assert_eq!((decoded.width(), decoded.height()), (800, 600));
        assert_eq!(image::guess_format(&encoded)?, ImageFormat::Jpeg);
        Ok(())
    }

    #[test]
    fn normalize_rejects_non_image_bytes() {
        assert!(normalize_image(b"<html>not an image</html>", 800, 600, 70).is_err());
    }

    #[test]
    fn fetch_encoded_downloads_and_normalizes() -> anyhow::Result<()> {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/photos/bano.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(png_bytes(40, 30)?)
            .create();

        let image = source()?.fetch_encoded(&format!("{}/photos/bano.png", server.url()))?;
        mock.assert();
        assert_eq!(image.dimensions(), (800, 600));
        assert!(image.byte_len() > 0);
        assert!(image.to_data_url().starts_with("data:image/jpeg;base64,"));
        Ok(())
    }

    #[test]
    fn fetch_encoded_maps_status_and_decode_failures() -> anyhow::Result<()> {
        let mut server = mockito::Server::new();
        let _missing = server.mock("GET", "/gone.jpg").with_status(404).create();
        let _html = server
            .mock("GET", "/page.jpg")
            .with_status(200)
            .with_body("<html></html>")
            .create();

        let source = source()?;
        let missing = source.fetch_encoded(&format!("{}/gone.jpg", server.url()));
        assert!(matches!(missing, Err(AnalysisError::Fetch { ref reason, .. }) if reason == "status 404"));

        let html = source.fetch_encoded(&format!("{}/page.jpg", server.url()));
        assert!(matches!(html, Err(AnalysisError::Decode { .. })));
        Ok(())
    }
}
