// SPDX-License-Identifier: MIT OR Apache-2.0

//! Training smoke tests on the CPU backend with tiny synthetic images

use burn::backend::{Autodiff, NdArray};
use burn::tensor::Tensor;
use gotrain_trainer::{
    evaluate, images_to_tensor, reconstruct, train, AutoencoderConfig, GrayImage, TrainerError,
    TrainingConfig,
};

type TestBackend = Autodiff<NdArray>;

const SIDE: usize = 12;

/// Bars and blocks on a 12x12 canvas
fn synthetic_images(count: usize) -> Vec<GrayImage> {
    (0..count)
        .map(|n| {
            let pixels = (0..SIDE * SIDE)
                .map(|i| {
                    let (x, y) = (i % SIDE, i / SIDE);
                    let on = match n % 4 {
                        0 => x == n % SIDE,
                        1 => y == (n * 3) % SIDE,
                        2 => x < SIDE / 2 && y < SIDE / 2,
                        _ => (x + y) % 3 == 0,
                    };
                    if on {
                        1.0
                    } else {
                        0.0
                    }
                })
                .collect();
            GrayImage::new(SIDE, SIDE, pixels).unwrap()
        })
        .collect()
}

fn small_config() -> TrainingConfig {
    TrainingConfig {
        model: AutoencoderConfig {
            depth: 1,
            ..AutoencoderConfig::default()
        },
        batch_size: 4,
        epochs: 15,
        learning_rate: 1e-2,
        log_interval: 10,
        ..TrainingConfig::default()
    }
}

#[test]
fn encoder_and_decoder_shapes_mirror() {
    let device = Default::default();
    let model = AutoencoderConfig::default().init::<NdArray>(&device);
    let input = Tensor::<NdArray, 4>::zeros([2, 1, 28, 28], &device);

    let latent = model.encode(input.clone());
    assert_eq!(latent.dims(), [2, 1, 20, 20]);
    assert_eq!(model.decode(latent).dims(), [2, 1, 28, 28]);
    assert_eq!(model.forward(input).dims(), [2, 1, 28, 28]);
}

#[test]
fn loss_goes_down() {
    let device = Default::default();
    let images = synthetic_images(8);
    let config = small_config();

    let (_model, report) = train::<TestBackend>(&config, &images, &images[..2], &device).unwrap();

    assert_eq!(report.steps, 30);
    assert_eq!(report.train_losses.len(), 30);
    assert!(report.train_losses.iter().all(|l| l.is_finite()));

    let head: f32 = report.train_losses[..3].iter().sum::<f32>() / 3.0;
    let tail: f32 = report.train_losses[27..].iter().sum::<f32>() / 3.0;
    assert!(tail < head, "loss did not decrease: {head} -> {tail}");
    assert_eq!(report.final_train_loss, report.train_losses[29]);
    assert!(report.validation_loss.is_some());
}

#[test]
fn reconstructions_keep_image_shape() {
    let device = Default::default();
    let images = synthetic_images(3);
    let model = small_config().model.init::<NdArray>(&device);

    let rebuilt = reconstruct(&model, &images, &device).unwrap();
    assert_eq!(rebuilt.len(), 3);
    assert!(rebuilt
        .iter()
        .all(|img| img.width == SIDE && img.height == SIDE && img.pixels.len() == SIDE * SIDE));

    let loss = evaluate(&model, &images, 2, &device).unwrap();
    assert!(loss.is_finite() && loss >= 0.0);
}

#[test]
fn images_pack_into_batch_tensor() {
    let device = Default::default();
    let images = synthetic_images(5);
    let tensor = images_to_tensor::<NdArray>(&images, &device).unwrap();
    assert_eq!(tensor.dims(), [5, 1, SIDE, SIDE]);
}

#[test]
fn training_rejects_images_too_small_for_the_model() {
    let device = Default::default();
    let tiny = vec![GrayImage::new(4, 4, vec![0.5; 16]).unwrap()];
    let err = train::<TestBackend>(&TrainingConfig::default(), &tiny, &[], &device).unwrap_err();
    assert!(err.to_string().contains("too small"), "{err}");
}

#[test]
fn training_on_nothing_fails() {
    let device = Default::default();
    assert!(train::<TestBackend>(&small_config(), &[], &[], &device).is_err());
}

#[test]
fn small_validation_images_are_rejected_before_training() {
    let device = Default::default();
    let train_images = synthetic_images(2);
    let tiny = vec![GrayImage::new(4, 4, vec![0.5; 16]).unwrap()];

    let err = train::<TestBackend>(&small_config(), &train_images, &tiny, &device).unwrap_err();
    assert!(
        matches!(err, TrainerError::ImageTooSmall { width: 4, height: 4, trim: 6 }),
        "{err}"
    );
}

#[test]
fn reconstruct_and_evaluate_reject_small_images() {
    let device = Default::default();
    let model = AutoencoderConfig::default().init::<NdArray>(&device);
    let tiny = vec![GrayImage::new(4, 4, vec![0.5; 16]).unwrap()];

    assert!(matches!(
        reconstruct(&model, &tiny, &device),
        Err(TrainerError::ImageTooSmall { trim: 8, .. })
    ));
    assert!(matches!(
        evaluate(&model, &tiny, 4, &device),
        Err(TrainerError::ImageTooSmall { trim: 8, .. })
    ));
}

#[test]
fn training_images_must_share_one_size() {
    let device = Default::default();
    let mut images = synthetic_images(3);
    images.push(GrayImage::new(14, 14, vec![0.0; 196]).unwrap());

    let err = train::<TestBackend>(&small_config(), &images, &[], &device).unwrap_err();
    assert!(matches!(err, TrainerError::MixedSizes { index: 3, .. }), "{err}");
}
