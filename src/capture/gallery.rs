/// Gallery image selection
///
/// A native file picker limited to image files, opened in the user's
/// picture directory. Cancelling yields no image.

use async_trait::async_trait;
use rfd::AsyncFileDialog;

use super::ImagePicker;
use crate::state::data::ImageHandle;

/// Extensions offered by the picker
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp",
];

/// Native file picker restricted to images
#[derive(Debug, Clone, Default)]
pub struct FileDialogPicker;

#[async_trait]
impl ImagePicker for FileDialogPicker {
    async fn pick(&self) -> Option<ImageHandle> {
        let mut dialog = AsyncFileDialog::new()
            .set_title("Escolher imagem")
            .add_filter("Imagens", IMAGE_EXTENSIONS);

        if let Some(pictures) = dirs::picture_dir() {
            dialog = dialog.set_directory(pictures);
        }

        let file = dialog.pick_file().await?;
        tracing::info!(path = %file.path().display(), "image selected");

        Some(ImageHandle::gallery(file.path()))
    }
}
