//! Face recognition evaluation.
//!
//! Usage: `facerec <face_dir> [algorithm] [out_dir]`
//!
//! Every subdirectory of `face_dir` holds aligned face crops of one person. The first image of each
//! person is held out as a query, the remaining ones (and their mirror images) are used for
//! training. `algorithm` is `Eigenfaces` (the default) or `Fisherfaces`. If `out_dir` is given, the
//! mean face and the first basis vectors of the trained model are written there.

use std::{fs, path::Path, time::Instant};

use anyhow::{bail, Context};
use facerec::{
    image::Image,
    pipeline::{FacePreprocessor, PreprocessConfig},
    recognition::{
        identify, reconstruct_face, Algorithm, Identity, Trainer, TrainingSet,
        DEFAULT_UNKNOWN_THRESHOLD,
    },
    timer::format_timers,
};
use itertools::Itertools;

const SAVED_BASIS_IMAGES: usize = 8;

fn main() -> anyhow::Result<()> {
    facerec::init_logger!();

    let mut args = std::env::args_os().skip(1);
    let Some(face_dir) = args.next() else {
        bail!("usage: facerec <face_dir> [algorithm] [out_dir]");
    };
    let algorithm = match args.next() {
        Some(name) => name.to_string_lossy().parse::<Algorithm>()?,
        None => Algorithm::default(),
    };
    let out_dir = args.next();

    let mut preprocessor = FacePreprocessor::new(PreprocessConfig::default())?;
    let width = preprocessor.config().face_width;

    let persons = fs::read_dir(&face_dir)
        .with_context(|| format!("failed to read {}", Path::new(&face_dir).display()))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|path| path.is_dir())
        .sorted()
        .collect::<Vec<_>>();

    let start = Instant::now();
    let mut set = TrainingSet::new();
    let mut queries = Vec::new();
    for (label, dir) in persons.iter().enumerate() {
        let files = fs::read_dir(dir)?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .sorted();

        let mut first = true;
        for path in files {
            let image = match Image::load(&path) {
                Ok(image) => image,
                Err(e) => {
                    log::warn!("skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            let face = preprocessor.standardize(image.resize(width, width));
            if first {
                queries.push((face, label as i32));
                first = false;
            } else {
                set.push_mirrored(face, label as i32);
            }
        }
    }

    println!(
        "Loaded {} persons, {} training faces, {} queries in {:?}",
        persons.len(),
        set.len(),
        queries.len(),
        start.elapsed(),
    );
    log::debug!("{}", format_timers(preprocessor.timers()));

    let start = Instant::now();
    let model = Trainer::new(algorithm).train(&set)?;
    println!(
        "Trained {} model with {} components in {:?}",
        algorithm,
        model.subspace().num_components(),
        start.elapsed(),
    );

    let mut correct = 0;
    for (face, label) in &queries {
        let name = persons[*label as usize].display();
        match identify(&model, face, DEFAULT_UNKNOWN_THRESHOLD)? {
            Identity::Known(prediction) => {
                let verdict = if prediction.label == *label {
                    correct += 1;
                    "correct"
                } else {
                    "WRONG"
                };
                println!(
                    "{name}: identified as {} (distance {:.1}), {verdict}",
                    persons[prediction.label as usize].display(),
                    prediction.distance,
                );
            }
            Identity::Unknown { similarity } => {
                println!("{name}: unknown person (reconstruction error {similarity:.3})");
            }
        }
    }
    if !queries.is_empty() {
        println!(
            "Accuracy: {}/{} ({:.1}%)",
            correct,
            queries.len(),
            correct as f32 / queries.len() as f32 * 100.0,
        );
    }

    if let Some(out_dir) = out_dir {
        let out_dir = Path::new(&out_dir);
        fs::create_dir_all(out_dir)?;
        if let Some(mean) = model.mean_image() {
            mean.save(out_dir.join("mean.png"))?;
        }
        for index in 0..SAVED_BASIS_IMAGES {
            let Some(basis) = model.basis_image(index) else {
                break;
            };
            basis.save(out_dir.join(format!("basis_{index}.png")))?;
        }
        for (index, (face, _)) in queries.iter().enumerate() {
            let reconstructed = reconstruct_face(&model, face)?;
            if !reconstructed.is_empty() {
                reconstructed.save(out_dir.join(format!("reconstruction_{index}.png")))?;
            }
        }
        println!("Wrote debug images to {}", out_dir.display());
    }

    Ok(())
}
