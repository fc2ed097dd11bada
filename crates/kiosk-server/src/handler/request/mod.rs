//! Request body types.

mod files;
mod signatures;

pub use files::{DeleteFile, MakeThumbnail};
pub use signatures::{
    FinishUpload, InitMultipart, MultipartTarget, SignDownload, SignUpload, SignUploadPart,
};
