use approx::assert_relative_eq;
use facerec::{
    image::{Image, MID_GRAY},
    pipeline::{FacePreprocessor, PreprocessConfig},
    recognition::{
        identify, reconstruct_face, similarity, subspace_project, subspace_reconstruct,
        Algorithm, FaceRecognizer, Identity, Trainer, TrainingSet, UNRANKABLE_DISTANCE,
    },
    Error,
};
use nalgebra::{DMatrix, RowDVector};

const WIDTH: u32 = 20;

/// A person is a fixed arrangement of dark blobs; every photo adds some sensor noise.
fn photo(person: i32, rng: &mut fastrand::Rng) -> Image {
    let (bx, by) = (4 + person as u32 * 3 % 12, 5 + person as u32 * 5 % 10);
    Image::from_fn(WIDTH, WIDTH, |x, y| {
        let base = if x.abs_diff(bx) < 3 && y.abs_diff(by) < 3 {
            40
        } else if (x + person as u32) % 5 == 0 {
            110
        } else {
            170
        };
        base + rng.u8(..12)
    })
}

fn training_set(persons: i32, photos: usize, seed: u64) -> TrainingSet {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut set = TrainingSet::new();
    for person in 0..persons {
        for _ in 0..photos {
            set.push(photo(person, &mut rng), person);
        }
    }
    set
}

#[test]
fn project_and_reconstruct_by_hand() {
    // The subspace spanned by the first two axes of R^3, centered on (1, 1, 1).
    let basis = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    let mean = RowDVector::from_row_slice(&[1.0, 1.0, 1.0]);
    let samples = DMatrix::from_row_slice(2, 3, &[3.0, 4.0, 5.0, 1.0, 1.0, 1.0]);

    let coefficients = subspace_project(&basis, Some(&mean), &samples).unwrap();
    assert_eq!(coefficients, DMatrix::from_row_slice(2, 2, &[2.0, 3.0, 0.0, 0.0]));

    let reconstructed = subspace_reconstruct(&basis, Some(&mean), &coefficients).unwrap();
    assert_relative_eq!(
        reconstructed,
        DMatrix::from_row_slice(2, 3, &[3.0, 4.0, 1.0, 1.0, 1.0, 1.0])
    );

    let uncentered = subspace_project(&basis, None, &samples).unwrap();
    assert_eq!(uncentered[(0, 0)], 3.0);
}

#[test]
fn wrong_dimensions_are_reported() {
    let basis = DMatrix::<f64>::identity(4, 2);
    let samples = DMatrix::<f64>::zeros(1, 3);
    assert!(matches!(
        subspace_project(&basis, None, &samples),
        Err(Error::ShapeMismatch {
            expected: 4,
            actual: 3,
            ..
        })
    ));
    assert!(subspace_reconstruct(&basis, None, &DMatrix::zeros(1, 3)).is_err());

    let model = Trainer::new(Algorithm::Eigenfaces)
        .train(&training_set(2, 3, 1))
        .unwrap();
    let wrong_size = Image::filled(WIDTH + 1, WIDTH, 100);
    assert!(matches!(
        model.predict(&wrong_size),
        Err(Error::ShapeMismatch { .. })
    ));
    assert!(reconstruct_face(&model, &wrong_size).is_err());
}

#[test]
fn eigenfaces_reconstruct_training_faces() {
    let set = training_set(4, 3, 2);
    let model = Trainer::new(Algorithm::Eigenfaces).train(&set).unwrap();
    assert_eq!(model.face_size(), (WIDTH, WIDTH));

    for (face, _) in set.iter() {
        let reconstructed = reconstruct_face(&model, face).unwrap();
        assert_eq!(reconstructed.width(), WIDTH);
        assert!(similarity(face, &reconstructed) < 0.05);
    }
}

#[test]
fn fewer_components_lose_detail() {
    let set = training_set(4, 3, 3);
    let full = Trainer::new(Algorithm::Eigenfaces).train(&set).unwrap();
    let reduced = Trainer::new(Algorithm::Eigenfaces)
        .num_components(1)
        .train(&set)
        .unwrap();
    assert_eq!(reduced.subspace().num_components(), 1);
    assert!(full.subspace().num_components() > 1);

    let error = |model: &dyn FaceRecognizer| {
        set.iter()
            .map(|(face, _)| similarity(face, &reconstruct_face(model, face).unwrap()))
            .sum::<f64>()
    };
    assert!(error(&reduced) > error(&full));
}

#[test]
fn fisherfaces_identify_new_photos() {
    let set = training_set(4, 4, 4);
    let model = Trainer::new(Algorithm::Fisherfaces).train(&set).unwrap();
    assert_eq!(model.subspace().num_components(), 3);

    let mut rng = fastrand::Rng::with_seed(40);
    for person in 0..4 {
        let prediction = model.predict(&photo(person, &mut rng)).unwrap().unwrap();
        assert_eq!(prediction.label, person);
    }
}

#[test]
fn fisherfaces_need_two_people() {
    let set = training_set(1, 4, 5);
    assert!(matches!(
        Trainer::new(Algorithm::Fisherfaces).train(&set),
        Err(Error::NotEnoughClasses { found: 1, .. })
    ));
}

#[test]
fn strangers_are_unknown() {
    let set = training_set(3, 3, 6);
    let model = Trainer::new(Algorithm::Eigenfaces).train(&set).unwrap();

    let (known, label) = set.iter().nth(4).unwrap();
    match identify(&model, known, 0.7).unwrap() {
        Identity::Known(prediction) => assert_eq!(prediction.label, label),
        unknown => panic!("training face not recognized: {unknown:?}"),
    }

    let mut rng = fastrand::Rng::with_seed(60);
    let stranger = Image::from_fn(WIDTH, WIDTH, |_, _| rng.u8(..));
    assert!(matches!(
        identify(&model, &stranger, 0.7).unwrap(),
        Identity::Unknown { similarity } if similarity >= 0.7
    ));
}

#[test]
fn similarity_of_images() {
    let a = Image::filled(10, 10, 100);
    let b = Image::filled(10, 10, 110);
    assert_eq!(similarity(&a, &a), 0.0);
    // sqrt(100 * 10^2) / 100
    assert_relative_eq!(similarity(&a, &b), 1.0);
    assert_eq!(similarity(&a, &b), similarity(&b, &a));
    assert_eq!(
        similarity(&a, &Image::filled(20, 20, 100)),
        UNRANKABLE_DISTANCE
    );
}

#[test]
fn unsupported_algorithm() {
    assert!(matches!(
        "FaceRecognizer.LBPH".parse::<Algorithm>(),
        Err(Error::UnsupportedAlgorithm(_))
    ));
    assert_eq!(
        "FaceRecognizer.Eigenfaces".parse::<Algorithm>().unwrap(),
        Algorithm::Eigenfaces
    );
}

#[test]
fn train_on_standardized_faces() {
    let mut pre = FacePreprocessor::new(PreprocessConfig::default().face_width(WIDTH)).unwrap();
    let mut rng = fastrand::Rng::with_seed(7);
    let mut set = TrainingSet::new();
    for person in 0..3 {
        for _ in 0..2 {
            set.push_mirrored(pre.standardize(photo(person, &mut rng)), person);
        }
    }
    assert_eq!(set.len(), 12);

    let model = Trainer::new(Algorithm::Eigenfaces).train(&set).unwrap();
    let mean = model.mean_image().unwrap();
    // Masked corners are identical in every face, and thus in the mean.
    assert_eq!(mean.get(0, 0), MID_GRAY);

    let (face, _) = set.iter().next().unwrap();
    assert!(matches!(
        identify(&model, face, 0.7).unwrap(),
        Identity::Known(_)
    ));
}
