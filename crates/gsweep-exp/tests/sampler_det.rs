use std::collections::BTreeSet;

use gsweep_core::errors::SweepError;
use gsweep_core::{RngHandle, Scalar};
use gsweep_exp::{
    radical_inverse, sweep_points, HaltonSampler, LatinHypercubeSampler, ParameterSpace, Sampler,
    SamplerRegistry, SamplerSpec, UniformSampler,
};
use proptest::prelude::*;

fn spec(name: &str, samples: usize, bounds: Vec<[f64; 2]>) -> SamplerSpec {
    SamplerSpec {
        name: name.to_string(),
        samples,
        bounds,
        skip: 0,
    }
}

fn close(left: f64, right: f64) -> bool {
    (left - right).abs() < 1e-12
}

#[test]
fn radical_inverse_known_values() {
    assert!(close(radical_inverse(0, 2), 0.0));
    assert!(close(radical_inverse(1, 2), 0.5));
    assert!(close(radical_inverse(2, 2), 0.25));
    assert!(close(radical_inverse(3, 2), 0.75));
    assert!(close(radical_inverse(1, 3), 1.0 / 3.0));
    assert!(close(radical_inverse(4, 3), 4.0 / 9.0));
}

#[test]
fn halton_starts_after_origin_and_honours_skip() {
    let mut rng = RngHandle::from_seed(0);
    let points = HaltonSampler
        .sample(&spec("halton", 3, vec![[0.0, 1.0], [0.0, 1.0]]), &mut rng)
        .expect("halton");
    let expected = [[0.5, 1.0 / 3.0], [0.25, 2.0 / 3.0], [0.75, 1.0 / 9.0]];
    for (point, want) in points.iter().zip(expected) {
        assert!(close(point[0], want[0]) && close(point[1], want[1]), "{point:?}");
    }

    let mut skipped = spec("halton", 2, vec![[0.0, 1.0], [0.0, 1.0]]);
    skipped.skip = 1;
    let points = HaltonSampler.sample(&skipped, &mut rng).expect("halton");
    assert!(close(points[0][0], 0.25));
    assert!(close(points[1][0], 0.75));
}

#[test]
fn halton_scales_into_bounds() {
    let mut rng = RngHandle::from_seed(0);
    let points = HaltonSampler
        .sample(&spec("halton", 1, vec![[10.0, 20.0]]), &mut rng)
        .expect("halton");
    assert!(close(points[0][0], 15.0));
}

#[test]
fn lhs_hits_every_stratum_once() {
    let samples = 16;
    let bounds = vec![[0.0, 1.0], [-4.0, 4.0], [100.0, 101.0]];
    let mut rng = RngHandle::from_seed(11);
    let points = LatinHypercubeSampler
        .sample(&spec("lhs", samples, bounds.clone()), &mut rng)
        .expect("lhs");
    assert_eq!(points.len(), samples);
    for (dim, [low, high]) in bounds.iter().enumerate() {
        let strata: BTreeSet<usize> = points
            .iter()
            .map(|point| (((point[dim] - low) / (high - low)) * samples as f64) as usize)
            .collect();
        assert_eq!(strata, (0..samples).collect::<BTreeSet<_>>(), "dimension {dim}");
    }
}

#[test]
fn samplers_are_deterministic_per_seed() {
    let request = spec("uniform", 8, vec![[0.0, 1.0], [5.0, 6.0]]);
    let samplers: [&dyn Sampler; 2] = [&UniformSampler, &LatinHypercubeSampler];
    for sampler in samplers {
        let left = sampler
            .sample(&request, &mut RngHandle::from_seed(3))
            .expect("left");
        let right = sampler
            .sample(&request, &mut RngHandle::from_seed(3))
            .expect("right");
        let other = sampler
            .sample(&request, &mut RngHandle::from_seed(4))
            .expect("other");
        assert_eq!(left, right);
        assert_ne!(left, other);
    }
}

#[test]
fn inverted_bounds_are_rejected() {
    let err = UniformSampler
        .sample(&spec("uniform", 2, vec![[1.0, 0.0]]), &mut RngHandle::from_seed(0))
        .expect_err("must fail");
    assert!(matches!(err, SweepError::Sampler(_)));
    assert_eq!(err.code(), "sampler-bounds");
}

#[test]
fn unknown_sampler_lists_known_names() {
    let registry = SamplerRegistry::with_builtins();
    assert_eq!(
        registry.names().collect::<Vec<_>>(),
        vec!["halton", "lhs", "uniform"]
    );
    let err = registry.get("sobol").err().expect("sobol is not registered");
    assert_eq!(err.code(), "unknown-sampler");
    assert_eq!(err.info().hint.as_deref(), Some("known samplers: halton, lhs, uniform"));
}

struct Narrow;

impl Sampler for Narrow {
    fn sample(&self, spec: &SamplerSpec, _rng: &mut RngHandle) -> Result<Vec<Vec<f64>>, SweepError> {
        Ok(vec![vec![0.0]; spec.samples])
    }
}

#[test]
fn sampled_width_must_match_dimensionality() {
    let mut registry = SamplerRegistry::new();
    registry.register("narrow", Narrow);
    let space = ParameterSpace::Sampled {
        sampler: spec("narrow", 2, vec![[0.0, 1.0], [0.0, 1.0]]),
    };
    let err = sweep_points(&space, 2, &registry, &mut RngHandle::from_seed(0))
        .expect_err("must fail");
    assert_eq!(err.code(), "sampler-width");
}

#[test]
fn sampled_points_become_float_scalars() {
    let space = ParameterSpace::Sampled {
        sampler: spec("halton", 2, vec![[0.0, 2.0]]),
    };
    let points = sweep_points(
        &space,
        1,
        &SamplerRegistry::with_builtins(),
        &mut RngHandle::from_seed(0),
    )
    .expect("points");
    assert_eq!(points, vec![vec![Scalar::Float(1.0)], vec![Scalar::Float(0.5)]]);
}

proptest! {
    #[test]
    fn uniform_stays_inside_bounds(
        seed in any::<u64>(),
        low in -100.0f64..100.0,
        width in 0.0f64..50.0,
        samples in 1usize..32,
    ) {
        let points = UniformSampler
            .sample(&spec("uniform", samples, vec![[low, low + width]]), &mut RngHandle::from_seed(seed))
            .expect("uniform");
        prop_assert_eq!(points.len(), samples);
        for point in points {
            prop_assert!(point[0] >= low && point[0] <= low + width);
        }
    }
}
