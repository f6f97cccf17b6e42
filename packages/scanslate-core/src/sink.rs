use std::io;

use crate::image::PendingImage;
use crate::reporter::Notice;
use crate::service::{DownloadedFile, OcrResult};
use crate::session::ActionKind;

/// Whatever shows the session to a person. The core never touches a concrete
/// UI; Markdown and math rendering happen behind this trait.
pub trait PresentationSink {
    fn show_gallery(&mut self, images: &[PendingImage]);

    fn show_result(&mut self, result: &OcrResult);

    fn clear_result(&mut self);

    fn show_error(&mut self, notice: &Notice);

    fn clear_error(&mut self);

    fn set_trigger_enabled(&mut self, action: ActionKind, enabled: bool);

    /// Hands an exported document to the user. The file is dropped afterwards.
    fn deliver_file(&mut self, file: &DownloadedFile) -> io::Result<()>;
}
