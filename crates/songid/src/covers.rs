use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use metadata::{guess_mime, CoverArt};
use pipeline::CoverSource;
use reqwest::Client;

pub async fn download(client: &Client, url: &str, timeout: Duration) -> Result<Bytes, String> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|err| err.to_string())?;
    if !response.status().is_success() {
        return Err(format!("http {}", response.status()));
    }
    response.bytes().await.map_err(|err| err.to_string())
}

pub fn cover_mime(bytes: &[u8], url: &str) -> String {
    if let Some(mime) = guess_mime(bytes) {
        return mime;
    }
    let path = url.split(['?', '#']).next().unwrap_or(url);
    mime_guess::from_path(path)
        .first()
        .filter(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| "image/jpeg".to_string())
}

pub struct HttpCovers {
    client: Client,
    timeout: Duration,
}

impl HttpCovers {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl CoverSource for HttpCovers {
    async fn fetch_cover(&self, url: &str) -> Result<CoverArt, String> {
        let bytes = download(&self.client, url, self.timeout).await?;
        if bytes.is_empty() {
            return Err("empty image".to_string());
        }
        let mime = cover_mime(&bytes, url);
        Ok(CoverArt {
            data: bytes.to_vec(),
            mime: Some(mime),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::cover_mime;

    #[test]
    fn mime_from_bytes_then_url() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(cover_mime(&png, "http://x/c.jpg"), "image/png");
        assert_eq!(cover_mime(b"????", "http://x/c.png?size=400"), "image/png");
        assert_eq!(cover_mime(b"????", "http://x/cover"), "image/jpeg");
        assert_eq!(cover_mime(b"????", "http://x/c.txt"), "image/jpeg");
    }
}
