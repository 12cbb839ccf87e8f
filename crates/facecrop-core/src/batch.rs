//! Directory-to-directory batch alignment.
//!
//! Every regular file in the input directory is decoded, aligned, resized
//! to `image_size x image_size` and written under the same file name in the
//! output directory. Files whose output already exists are skipped, so an
//! interrupted run can simply be restarted. Per-image problems are logged
//! and counted; only directory and setup errors abort the run.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use rayon::prelude::*;
use thiserror::Error;

use crate::align::FaceNormalizer;
use crate::config::{BatchConfig, ConfigError};
use crate::decode::{read_image, resize, FilterType};
use crate::encode::write_image_atomic;
use crate::locate::LandmarkSource;
use crate::reject::RejectReason;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("cannot read input directory {path}: {source}")]
    InputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// What happened to one input file.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageOutcome {
    Written(PathBuf),
    /// The output already existed.
    Skipped,
    Rejected(RejectReason),
    /// Unreadable input or unwritable output.
    Failed(String),
}

/// Tally of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub written: usize,
    pub skipped: usize,
    pub rejected: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn record(mut self, outcome: &ImageOutcome) -> Self {
        self.total += 1;
        match outcome {
            ImageOutcome::Written(_) => self.written += 1,
            ImageOutcome::Skipped => self.skipped += 1,
            ImageOutcome::Rejected(_) => self.rejected += 1,
            ImageOutcome::Failed(_) => self.failed += 1,
        }
        self
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            total: self.total + other.total,
            written: self.written + other.written,
            skipped: self.skipped + other.skipped,
            rejected: self.rejected + other.rejected,
            failed: self.failed + other.failed,
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files: {} written, {} skipped, {} rejected, {} failed",
            self.total, self.written, self.skipped, self.rejected, self.failed
        )
    }
}

/// Regular files directly inside `dir`, sorted by path.
pub fn list_inputs(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let to_err = |source| BatchError::InputDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(to_err)? {
        let entry = entry.map_err(to_err)?;
        if entry.file_type().map_err(to_err)?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Aligns a directory of photos with a shared landmark source.
pub struct BatchPipeline<L> {
    normalizer: FaceNormalizer<L>,
    config: BatchConfig,
}

impl<L: LandmarkSource> BatchPipeline<L> {
    pub fn new(mut source: L, config: BatchConfig) -> Result<Self, BatchError> {
        config.validate()?;
        source.configure(&config);
        let normalizer = FaceNormalizer::new(source, config.align.aligner());
        Ok(Self { normalizer, config })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn run(&self, input_dir: &Path, output_dir: &Path) -> Result<BatchReport, BatchError> {
        fs::create_dir_all(output_dir).map_err(|source| BatchError::OutputDir {
            path: output_dir.to_path_buf(),
            source,
        })?;
        let files = list_inputs(input_dir)?;
        let total = files.len();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers.unwrap_or(0))
            .build()?;
        info!(
            "aligning {total} files from {} into {} on {} threads",
            input_dir.display(),
            output_dir.display(),
            pool.current_num_threads()
        );

        let report = pool.install(|| {
            files
                .par_iter()
                .enumerate()
                .map(|(i, path)| self.process_file(i + 1, total, path, output_dir))
                .fold(BatchReport::default, |report, outcome| report.record(&outcome))
                .reduce(BatchReport::default, BatchReport::merge)
        });

        info!("{report}");
        Ok(report)
    }

    /// Align one file into `output_dir`. `index` is 1-based, for logging.
    pub fn process_file(
        &self,
        index: usize,
        total: usize,
        path: &Path,
        output_dir: &Path,
    ) -> ImageOutcome {
        let Some(name) = path.file_name() else {
            return ImageOutcome::Failed(format!("{}: no file name", path.display()));
        };
        let output = output_dir.join(name);
        if output.exists() {
            debug!("{}: output exists, skipping", path.display());
            return ImageOutcome::Skipped;
        }

        let image = match read_image(path) {
            Ok(image) => image,
            Err(e) => {
                error!("{}: {e}", path.display());
                return ImageOutcome::Failed(e.to_string());
            }
        };

        let size = self.config.image_size;
        let aligned = self.normalizer.align(path, &image).and_then(|face| {
            if face.min_dimension() < size {
                Err(RejectReason::CropTooSmall {
                    width: face.width,
                    height: face.height,
                    min: size,
                })
            } else {
                Ok(face)
            }
        });
        let aligned = match aligned {
            Ok(face) => face,
            Err(reason) => {
                warn!("{}: skipped ({}): {reason}", path.display(), reason.kind());
                return ImageOutcome::Rejected(reason);
            }
        };

        let written = resize(&aligned, size, size, FilterType::Cubic)
            .map_err(|e| e.to_string())
            .and_then(|out| {
                write_image_atomic(&output, &out, self.config.jpeg_quality).map_err(|e| e.to_string())
            });
        match written {
            Ok(()) => {
                info!("{index}/{total} - {}", path.display());
                ImageOutcome::Written(output)
            }
            Err(e) => {
                error!("{}: {e}", output.display());
                ImageOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DecodedImage;
    use crate::geometry::{LandmarkSet, RawSpace};

    struct NoFace;

    impl LandmarkSource for NoFace {
        fn locate(
            &self,
            _path: &Path,
            _image: &DecodedImage,
        ) -> Result<LandmarkSet<RawSpace>, RejectReason> {
            Err(RejectReason::NoUniqueFace { count: 0 })
        }
    }

    #[test]
    fn test_report_tally() {
        let report = [
            ImageOutcome::Written(PathBuf::from("a")),
            ImageOutcome::Skipped,
            ImageOutcome::Skipped,
            ImageOutcome::Rejected(RejectReason::NoUniqueFace { count: 2 }),
            ImageOutcome::Failed("bad".into()),
        ]
        .iter()
        .fold(BatchReport::default(), BatchReport::record);

        assert_eq!(
            report,
            BatchReport {
                total: 5,
                written: 1,
                skipped: 2,
                rejected: 1,
                failed: 1
            }
        );
        assert_eq!(
            report.to_string(),
            "5 files: 1 written, 2 skipped, 1 rejected, 1 failed"
        );
        assert_eq!(report.merge(report).total, 10);
    }

    #[test]
    fn test_list_inputs_sorted_files_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.jpg"), b"x").unwrap();
        fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let files = list_inputs(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_missing_input_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = list_inputs(&dir.path().join("nope"));
        assert!(matches!(result, Err(BatchError::InputDir { .. })));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = BatchConfig::default();
        config.image_size = 0;
        assert!(matches!(
            BatchPipeline::new(NoFace, config),
            Err(BatchError::Config(ConfigError::ZeroImageSize))
        ));
    }

    #[test]
    fn test_process_file_outcomes() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let pipeline = BatchPipeline::new(NoFace, BatchConfig::default()).unwrap();

        // Unreadable input.
        let corrupt = input.path().join("corrupt.jpg");
        fs::write(&corrupt, b"not an image").unwrap();
        assert!(matches!(
            pipeline.process_file(1, 3, &corrupt, output.path()),
            ImageOutcome::Failed(_)
        ));

        // Readable but no face.
        let photo = input.path().join("photo.png");
        DecodedImage::filled(32, 32, [90, 90, 90])
            .to_rgb_image()
            .unwrap()
            .save(&photo)
            .unwrap();
        assert_eq!(
            pipeline.process_file(2, 3, &photo, output.path()),
            ImageOutcome::Rejected(RejectReason::NoUniqueFace { count: 0 })
        );

        // Existing output wins over everything else.
        fs::write(output.path().join("corrupt.jpg"), b"done").unwrap();
        assert_eq!(
            pipeline.process_file(3, 3, &corrupt, output.path()),
            ImageOutcome::Skipped
        );
    }
}
