//! Extractores específicos por formato y su despacho por categoría.

mod audio;
mod document;
mod image;
mod video;
mod web;

pub use self::audio::AudioExtractor;
pub use self::document::DocumentExtractor;
pub use self::image::{ImageExtractor, NO_EXIF_DATA};
pub use self::video::{NO_METADATA_FOUND, VideoExtractor};
pub use self::web::WebExtractor;

use crate::error::ExtractionError;
use crate::metadata::report::{ExtractionResult, FormatCategory};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::{debug, error, warn};

/// Capacidad de leer metadata de un archivo de una categoría concreta.
///
/// Los implementadores solo escriben `read`; `extract` garantiza que ni un
/// error ni un pánico del parser salgan del límite del extractor.
pub trait Extractor: Sync {
    fn name(&self) -> &'static str;

    fn read(&self, path: &Path) -> Result<ExtractionResult, ExtractionError>;

    fn extract(&self, path: &Path) -> ExtractionResult {
        match panic::catch_unwind(AssertUnwindSafe(|| self.read(path))) {
            Ok(Ok(result)) => {
                debug!(extractor = self.name(), path = %path.display(), "metadata extracted");
                result
            }
            Ok(Err(failure)) => {
                warn!(
                    extractor = self.name(),
                    path = %path.display(),
                    error = %failure,
                    "extractor failed"
                );
                ExtractionResult::failed(failure)
            }
            Err(_) => {
                error!(extractor = self.name(), path = %path.display(), "parser panicked");
                ExtractionResult::failed(ExtractionError::failure(
                    self.name(),
                    "the parser aborted on malformed input",
                ))
            }
        }
    }
}

static IMAGE: ImageExtractor = ImageExtractor;
static AUDIO: AudioExtractor = AudioExtractor;
static VIDEO: VideoExtractor = VideoExtractor;
static DOCUMENT: DocumentExtractor = DocumentExtractor;
static WEB: WebExtractor = WebExtractor;

pub fn extractor_for(category: FormatCategory) -> Option<&'static dyn Extractor> {
    match category {
        FormatCategory::Image => Some(&IMAGE),
        FormatCategory::Audio => Some(&AUDIO),
        FormatCategory::Video => Some(&VIDEO),
        FormatCategory::Document => Some(&DOCUMENT),
        FormatCategory::Web => Some(&WEB),
        FormatCategory::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    struct Panicking;

    impl Extractor for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn read(&self, _path: &Path) -> Result<ExtractionResult, ExtractionError> {
            panic!("corrupt input");
        }
    }

    #[test]
    fn panics_become_extractor_failures() {
        let result = Panicking.extract(Path::new("whatever.bin"));
        let failure = result.failure().expect("debe ser un fallo");
        assert_eq!(failure.kind, ErrorKind::ExtractorFailure);
    }

    #[test]
    fn unknown_category_has_no_extractor() {
        assert!(extractor_for(FormatCategory::Unknown).is_none());
        assert_eq!(
            extractor_for(FormatCategory::Web).map(|extractor| extractor.name()),
            Some("web")
        );
    }
}
