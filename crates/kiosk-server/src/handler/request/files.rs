use serde::Deserialize;

/// Body of `POST /del`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteFile {
    /// `bucket/key` of the object.
    pub path: String,
}

/// Body of `POST /thumbnail`.
#[derive(Debug, Clone, Deserialize)]
pub struct MakeThumbnail {
    /// `bucket/key` of the source image.
    pub path: String,
    #[serde(default)]
    pub width: u32,
    /// Older clients send `hight`.
    #[serde(default, alias = "hight")]
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thumbnail_accepts_misspelled_height() {
        let body: MakeThumbnail =
            serde_json::from_str(r#"{"path":"private/a.png","width":64,"hight":32}"#).unwrap();
        assert_eq!((body.width, body.height), (64, 32));
    }

    #[test]
    fn thumbnail_sizes_default_to_zero() {
        let body: MakeThumbnail = serde_json::from_str(r#"{"path":"private/a.png","width":64}"#)
            .unwrap();
        assert_eq!(body.height, 0);
    }
}
