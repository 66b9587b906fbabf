use gsweep_core::Scalar;
use gsweep_exp::{
    from_yaml_slice, normalize_estimator, normalize_program, EstimatorDescriptor, OneOrMany,
    ParamSlot, ParameterSpace, ProgramDescriptor,
};
use proptest::prelude::*;

fn program(params: Vec<ParamSlot>) -> ProgramDescriptor {
    ProgramDescriptor {
        name: None,
        params,
        stddevs: OneOrMany::One(Scalar::Float(0.1)),
        seed: OneOrMany::One(Scalar::Int(1)),
        nreps: OneOrMany::Many(vec![Scalar::Int(1)]),
    }
}

#[test]
fn scalar_fields_become_singletons() {
    let normalized = normalize_program(
        "linear",
        &program(vec![
            ParamSlot::Fixed(Scalar::Float(2.0)),
            ParamSlot::Swept(vec![Scalar::Float(0.0), Scalar::Float(1.0), Scalar::Float(2.0)]),
        ]),
    )
    .expect("normalize");
    assert_eq!(normalized.name, "linear");
    assert_eq!(normalized.dim, 1);
    assert_eq!(normalized.dimensionality, 2);
    assert_eq!(normalized.stddevs, vec![Scalar::Float(0.1)]);
    assert_eq!(normalized.seed, 1);
    assert_eq!(normalized.nreps, 1);
    match normalized.space {
        ParameterSpace::Grid { axes } => {
            assert_eq!(axes[0], vec![Scalar::Float(2.0)]);
            assert_eq!(axes[1].len(), 3);
        }
        other => panic!("unexpected space {other:?}"),
    }
}

#[test]
fn program_name_overrides_key_and_is_cleaned() {
    let mut descriptor = program(vec![ParamSlot::Swept(vec![Scalar::Int(1)])]);
    descriptor.name = Some("epidemics/sir".to_string());
    let normalized = normalize_program("sir", &descriptor).expect("normalize");
    assert_eq!(normalized.key, "sir");
    assert_eq!(normalized.name, "epidemics/sir");
    assert_eq!(normalized.clean_name, "epidemics_sir");
}

#[test]
fn multiple_seeds_are_rejected() {
    let mut descriptor = program(vec![ParamSlot::Swept(vec![Scalar::Int(1)])]);
    descriptor.seed = OneOrMany::Many(vec![Scalar::Int(1), Scalar::Int(2)]);
    let err = normalize_program("linear", &descriptor).expect_err("must fail");
    assert_eq!(err.code(), "multi-seed-nreps");
}

#[test]
fn multiple_nreps_are_rejected() {
    let mut descriptor = program(vec![ParamSlot::Swept(vec![Scalar::Int(1)])]);
    descriptor.nreps = OneOrMany::Many(vec![Scalar::Int(1), Scalar::Int(10)]);
    let err = normalize_program("linear", &descriptor).expect_err("must fail");
    assert_eq!(err.code(), "multi-seed-nreps");
}

#[test]
fn integral_float_seed_is_accepted() {
    let descriptor: ProgramDescriptor = from_yaml_slice(
        br#"
params: [[0.0, 1.0]]
stddevs: 0.1
seed: 1.0
nreps: 10.0
"#,
    )
    .expect("yaml");
    let normalized = normalize_program("p", &descriptor).expect("normalize");
    assert_eq!(normalized.seed, 1);
    assert_eq!(normalized.nreps, 10);
}

#[test]
fn fractional_or_negative_seed_fails_only_its_program() {
    for (seed, nreps) in [(Scalar::Float(1.5), Scalar::Int(1)), (Scalar::Int(2), Scalar::Int(-1))] {
        let mut descriptor = program(vec![ParamSlot::Swept(vec![Scalar::Int(1)])]);
        descriptor.seed = OneOrMany::One(seed);
        descriptor.nreps = OneOrMany::One(nreps);
        let err = normalize_program("linear", &descriptor).expect_err("must fail");
        assert_eq!(err.code(), "non-integral-seed-nreps");
    }
}

#[test]
fn sampler_outside_first_slot_is_rejected() {
    let descriptor: ProgramDescriptor = from_yaml_slice(
        br#"
params:
  - 1.0
  - sampler: {name: lhs, samples: 4, bounds: [[0, 1]]}
stddevs: 0.1
seed: 1
nreps: 1
"#,
    )
    .expect("yaml");
    let err = normalize_program("p", &descriptor).expect_err("must fail");
    assert_eq!(err.code(), "sampler-position");
}

#[test]
fn sampler_in_first_slot_sets_dimensionality() {
    let descriptor: ProgramDescriptor = from_yaml_slice(
        br#"
params:
  - sampler: {name: halton, samples: 8, bounds: [[0, 1], [0, 2], [1, 3]]}
stddevs: [0.1, 0.2]
seed: [7]
nreps: [1]
"#,
    )
    .expect("yaml");
    let normalized = normalize_program("p", &descriptor).expect("normalize");
    assert_eq!(normalized.dim, 0);
    assert_eq!(normalized.dimensionality, 3);
    assert!(matches!(normalized.space, ParameterSpace::Sampled { .. }));
    assert_eq!(normalized.stddevs.len(), 2);
}

#[test]
fn non_numeric_parameters_are_rejected() {
    let err = normalize_program(
        "p",
        &program(vec![ParamSlot::Fixed(Scalar::from("abc"))]),
    )
    .expect_err("must fail");
    assert_eq!(err.code(), "non-numeric-param");
}

#[test]
fn estimator_axes_keep_declaration_order() {
    let descriptor: EstimatorDescriptor = from_yaml_slice(
        br#"
name: smoothed
params:
  samples: [10, 100]
  h: 0.01
  antithetic: true
"#,
    )
    .expect("yaml");
    let normalized = normalize_estimator("smoothed_key", &descriptor);
    assert_eq!(normalized.name, "smoothed");
    let names: Vec<&str> = normalized.axes.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["samples", "h", "antithetic"]);
    assert_eq!(normalized.axes[1].1, vec![Scalar::Float(0.01)]);
}

proptest! {
    #[test]
    fn single_swept_slot_is_dim(
        (len, swept) in (1usize..8).prop_flat_map(|len| (Just(len), 0..len)),
        values in prop::collection::vec(-10i64..10, 1..5),
    ) {
        let params = (0..len)
            .map(|idx| {
                if idx == swept {
                    ParamSlot::Swept(values.iter().map(|v| Scalar::Int(*v)).collect())
                } else {
                    ParamSlot::Fixed(Scalar::Float(idx as f64))
                }
            })
            .collect();
        let normalized = normalize_program("p", &program(params)).expect("normalize");
        prop_assert_eq!(normalized.dim, swept);
        prop_assert_eq!(normalized.dimensionality, len);
    }
}
