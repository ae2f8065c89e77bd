use density_volume_sampler::{
    Precision, ProfileSpec, RunConfig, SamplerError, VolumeGenerator, VolumeJob, VolumeManifest,
    load_density,
};
use std::fs;

fn batch(output_dir: &std::path::Path) -> RunConfig {
    RunConfig {
        output_dir: output_dir.to_path_buf(),
        jobs: vec![
            VolumeJob {
                name: "uniform".to_string(),
                r_max: 1.0,
                samples: 2_000,
                resolution: 8,
                ranges: [1.0; 3],
                precision: Precision::Float16,
                compressed: true,
                seed: Some(11),
                projections: true,
                normalized: true,
                ..VolumeJob::default()
            },
            VolumeJob {
                name: "stretched".to_string(),
                profile: ProfileSpec::Gaussian { sigma: 0.5 },
                r_max: 2.0,
                scale: [1.0, 1.0, 2.0],
                samples: 1_500,
                resolution: 6,
                ranges: [1.0; 3],
                seed: Some(12),
                ..VolumeJob::default()
            },
        ],
    }
}

#[test]
fn batch_run_writes_arrays_manifests_and_index() {
    let dir = tempfile::tempdir().unwrap();
    let config = batch(dir.path());
    let manifests = VolumeGenerator::new(dir.path()).run(&config).unwrap();
    assert_eq!(manifests.len(), 2);

    let index: Vec<String> =
        serde_json::from_str(&fs::read_to_string(dir.path().join("manifest.json")).unwrap())
            .unwrap();
    assert_eq!(index, vec!["uniform.json".to_string(), "stretched.json".to_string()]);

    for (job, manifest) in config.jobs.iter().zip(&manifests) {
        let loaded = VolumeManifest::load(&dir.path().join(format!("{}.json", job.name))).unwrap();
        assert_eq!(&loaded, manifest);

        let array = load_density(dir.path().join(&manifest.volume.array_file)).unwrap();
        assert_eq!(array.shape, vec![job.resolution; 3]);
        assert_eq!(array.data.precision(), job.precision);

        let sum: f64 = array.data.to_f64().iter().sum();
        assert_eq!(sum as u64, manifest.volume.binned_points);
        assert_eq!(
            manifest.volume.binned_points + manifest.dropped_points(),
            job.samples as u64
        );
    }
}

#[test]
fn enclosing_ranges_keep_every_point() {
    let dir = tempfile::tempdir().unwrap();
    let config = batch(dir.path());
    let manifests = VolumeGenerator::new(dir.path()).run(&config).unwrap();

    let uniform = &manifests[0];
    assert!(config.jobs[0].ranges_enclose_samples());
    assert_eq!(uniform.volume.array_file, "uniform.npz");
    assert_eq!(uniform.volume.binned_points, 2_000);
    assert_eq!(uniform.dropped_points(), 0);

    // z is stretched past the binned range, so the outer tail is dropped.
    let stretched = &manifests[1];
    assert!(!config.jobs[1].ranges_enclose_samples());
    assert_eq!(stretched.volume.array_file, "stretched.npy");
    assert!(stretched.volume.binned_points < 1_500);
    assert!(stretched.volume.projections.is_empty());
    assert!(stretched.volume.normalized_file.is_none());
}

#[test]
fn optional_outputs_are_written_and_listed() {
    let dir = tempfile::tempdir().unwrap();
    let config = batch(dir.path());
    let manifests = VolumeGenerator::new(dir.path()).run(&config).unwrap();
    let uniform = &manifests[0];

    assert_eq!(
        uniform.volume.projections,
        vec!["uniform_xy.png", "uniform_xz.png", "uniform_yz.png"]
    );
    for name in &uniform.volume.projections {
        let image = image::open(dir.path().join(name)).unwrap().to_luma8();
        assert_eq!(image.dimensions(), (8, 8));
    }

    let fog_file = uniform.volume.normalized_file.as_deref().unwrap();
    assert_eq!(fog_file, "uniform_normalized.npz");
    let fog = load_density(dir.path().join(fog_file)).unwrap();
    assert_eq!(fog.data.precision(), Precision::Float32);
    let peak = fog.data.to_f64().into_iter().fold(0.0, f64::max);
    assert_eq!(peak, 1.0);
}

#[test]
fn seeded_jobs_are_reproducible() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let job = batch(first.path()).jobs.remove(1);

    let a = VolumeGenerator::new(first.path()).generate(&job).unwrap();
    let b = VolumeGenerator::new(second.path()).generate(&job).unwrap();
    assert_eq!(a.volume.binned_points, b.volume.binned_points);

    let grid_a = load_density(first.path().join(&a.volume.array_file)).unwrap();
    let grid_b = load_density(second.path().join(&b.volume.array_file)).unwrap();
    assert_eq!(grid_a.data.to_f64(), grid_b.data.to_f64());
}

#[test]
fn invalid_batches_write_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let mut config = batch(&out);
    config.jobs[1].name = "uniform".to_string();

    let err = VolumeGenerator::new(&out).run(&config).unwrap_err();
    assert!(matches!(err, SamplerError::InvalidArgument(_)));
    assert!(!out.exists());
}

#[test]
fn companion_file_collisions_are_rejected_before_sampling() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let config = RunConfig {
        output_dir: out.clone(),
        jobs: vec![
            VolumeJob {
                name: "a".to_string(),
                normalized: true,
                samples: 200,
                seed: Some(1),
                ..VolumeJob::default()
            },
            VolumeJob {
                name: "a_normalized".to_string(),
                samples: 200,
                seed: Some(2),
                ..VolumeJob::default()
            },
        ],
    };

    let err = VolumeGenerator::from_config(&config).run(&config).unwrap_err();
    assert!(matches!(err, SamplerError::InvalidArgument(_)));
    assert!(!out.exists());
}

#[test]
fn run_config_loads_from_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    fs::write(
        &path,
        r#"{
            "output_dir": "volumes",
            "jobs": [
                {"name": "halo", "profile": {"kind": "shell", "radius": 0.6, "width": 0.1},
                 "r_max": 1.0, "samples": 500, "resolution": 4, "seed": 5}
            ]
        }"#,
    )
    .unwrap();

    let mut config = RunConfig::load(&path).unwrap();
    config.output_dir = dir.path().join(&config.output_dir);
    let generator = VolumeGenerator::from_config(&config);
    assert_eq!(generator.output_dir(), dir.path().join("volumes").as_path());

    let manifests = generator.run(&config).unwrap();
    assert_eq!(manifests[0].volume.shape, [4, 4, 4]);
    assert_eq!(manifests[0].volume.binned_points, 500);
    assert!(dir.path().join("volumes/halo.npy").exists());
}
