use serde::Deserialize;

/// Body of `POST /sign/upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct SignUpload {
    pub path: String,
}

/// Body of `POST /sign/download`.
#[derive(Debug, Clone, Deserialize)]
pub struct SignDownload {
    pub path: String,
    /// Name the browser should save the file as.
    #[serde(default, rename = "fileName")]
    pub file_name: Option<String>,
}

/// Body of `POST /sign/initMultipart`.
#[derive(Debug, Clone, Deserialize)]
pub struct InitMultipart {
    pub path: String,
    #[serde(default, rename = "contentType")]
    pub content_type: String,
}

/// Body of `POST /sign/uploadMultipart`.
#[derive(Debug, Clone, Deserialize)]
pub struct SignUploadPart {
    pub path: String,
    #[serde(rename = "uploadID")]
    pub upload_id: String,
    #[serde(rename = "partNumber")]
    pub part_number: u32,
}

/// Body of the list, complete and abort multipart routes.
#[derive(Debug, Clone, Deserialize)]
pub struct MultipartTarget {
    pub path: String,
    #[serde(rename = "uploadID")]
    pub upload_id: String,
}

/// Body of `POST /sign/finish`.
#[derive(Debug, Clone, Deserialize)]
pub struct FinishUpload {
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multipart_fields_use_client_names() {
        let body: SignUploadPart = serde_json::from_str(
            r#"{"path":"private/big.bin","uploadID":"u-1","partNumber":3}"#,
        )
        .unwrap();
        assert_eq!(body.upload_id, "u-1");
        assert_eq!(body.part_number, 3);
    }

    #[test]
    fn download_name_is_optional() {
        let body: SignDownload = serde_json::from_str(r#"{"path":"private/a.pdf"}"#).unwrap();
        assert!(body.file_name.is_none());
    }
}
