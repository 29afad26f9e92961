//! End-to-end runs of the sizer over real folders.

mod common;

use std::fs;

use common::{write_image, PixelModel, KIB, MIB};
use imgfit_core::config::ProcessingSettings;
use imgfit_core::provision::sha256_file;
use imgfit_core::sizer::{
    temp_path, FileProcessingError, ImageSizer, JobStatus, RunOptions, SizerError,
};
use tempfile::tempdir;

fn sizer(backend: PixelModel) -> ImageSizer<PixelModel> {
    ImageSizer::new(backend, &ProcessingSettings::default())
}

#[tokio::test]
async fn three_jpegs_end_under_two_megabytes() {
    let dir = tempdir().unwrap();
    let paths = [
        write_image(dir.path(), "one.jpg", MIB),
        write_image(dir.path(), "three.jpg", 3 * MIB),
        write_image(dir.path(), "ten.jpg", 10 * MIB),
    ];

    // 25% over the ideal size forces a corrective pass on the large files.
    let report = sizer(PixelModel::new(1.25))
        .process(dir.path(), Some("2M"), RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.failed(), 0);
    for path in &paths {
        let size = fs::metadata(path).unwrap().len();
        assert!(size <= 2_097_152, "{} is {} bytes", path.display(), size);
        assert!(!temp_path(path).exists());
    }

    assert!(matches!(
        report.outcomes[0].status,
        JobStatus::AlreadyFits { size } if size == MIB
    ));
    assert!(report.outcomes[2].status.attempts().len() >= 2);
}

#[tokio::test]
async fn probe_only_changes_nothing() {
    let dir = tempdir().unwrap();
    let paths = [
        write_image(dir.path(), "a.jpg", 3 * MIB),
        write_image(dir.path(), "b.png", 700 * KIB),
    ];
    let before: Vec<String> = paths.iter().map(|p| sha256_file(p).unwrap()).collect();

    let backend = PixelModel::new(1.0);
    let sizer = sizer(backend);
    let options = RunOptions {
        verbose: true,
        probe_only: true,
    };
    let report = sizer.process(dir.path(), Some("1M"), options).await.unwrap();

    let after: Vec<String> = paths.iter().map(|p| sha256_file(p).unwrap()).collect();
    assert_eq!(before, after);
    assert!(report
        .outcomes
        .iter()
        .all(|o| matches!(o.status, JobStatus::Probed(_))));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[tokio::test]
async fn larger_target_leaves_files_unchanged() {
    let dir = tempdir().unwrap();
    let path = write_image(dir.path(), "photo.webp", 900 * KIB);
    let before = sha256_file(&path).unwrap();

    let report = sizer(PixelModel::new(1.0))
        .process(dir.path(), Some("1M"), RunOptions::default())
        .await
        .unwrap();

    assert_eq!(sha256_file(&path).unwrap(), before);
    assert!(matches!(
        report.outcomes[0].status,
        JobStatus::AlreadyFits { .. }
    ));
}

#[tokio::test]
async fn unreachable_target_never_grows_and_keeps_original() {
    let dir = tempdir().unwrap();
    let path = write_image(dir.path(), "stubborn.jpg", 4 * MIB);
    let before = sha256_file(&path).unwrap();

    // The encoder cannot go below 1.5M, so a 1M target is out of reach.
    let backend = PixelModel::new(1.0).with_floor(1536 * KIB);
    let report = sizer(backend)
        .process(dir.path(), Some("1M"), RunOptions::default())
        .await
        .unwrap();

    let status = &report.outcomes[0].status;
    let attempts = status.attempts();
    assert!(attempts.len() >= 2);
    for pair in attempts.windows(2) {
        assert!(pair[1].output_size <= pair[0].output_size);
        assert!(pair[1].scale < pair[0].scale);
    }
    assert!(matches!(
        status,
        JobStatus::Failed {
            error: FileProcessingError::TargetNotMet { .. },
            ..
        }
    ));
    assert_eq!(sha256_file(&path).unwrap(), before);
    assert!(!temp_path(&path).exists());
}

#[tokio::test]
async fn invalid_arguments_touch_nothing() {
    let dir = tempdir().unwrap();
    let path = write_image(dir.path(), "a.jpg", 3 * MIB);

    for bad in [None, Some(""), Some("5"), Some("5X"), Some("0K")] {
        let sizer = sizer(PixelModel::new(1.0));
        let err = sizer
            .process(dir.path(), bad, RunOptions::default())
            .await
            .unwrap_err();
        assert!(
            matches!(err, SizerError::InvalidTargetSize(_)),
            "{:?} gave {:?}",
            bad,
            err
        );
    }

    let backend = PixelModel::new(1.0);
    let sizer = sizer(backend);
    let err = sizer
        .process(&dir.path().join("missing"), Some("1M"), RunOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SizerError::FolderNotFound(_)));
    assert_eq!(fs::metadata(&path).unwrap().len(), 3 * MIB);
}

#[tokio::test]
async fn rejected_size_makes_no_tool_calls() {
    let dir = tempdir().unwrap();
    write_image(dir.path(), "a.jpg", 3 * MIB);

    let sizer = sizer(PixelModel::new(1.0));
    assert!(sizer
        .process(dir.path(), Some("2X"), RunOptions::default())
        .await
        .is_err());
    assert_eq!(sizer.backend().calls(), 0);
}
