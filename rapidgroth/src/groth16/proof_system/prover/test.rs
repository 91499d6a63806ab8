use std::sync::Arc;

use ark_ec::AffineRepr;
use ark_ff::{One, Zero};
use rand::RngCore;

use super::{combine, sample_blinding_scalar, MsmOutputs, Prover, ProverConfig};
use crate::ecc::curves::{Fr, G1Projective, G2Projective};
use crate::ecc::scalar_multiplication::{DeviceMsm, HostKernel};
use crate::errors::{ConfigurationError, Error, ProverError};
use crate::test_utils::{verify, FailingRng, FixedRng, ToyCircuit};

fn prover_for(circuit: &ToyCircuit) -> (Prover, crate::test_utils::VerifyingKey) {
    let setup = circuit.setup(&mut ark_std::test_rng());
    let prover = Prover::new(Arc::new(setup.key), ProverConfig::with_num_threads(4)).unwrap();
    (prover, setup.vk)
}

#[test]
fn cubic_proof_verifies() {
    let circuit = ToyCircuit::cubic();
    let (prover, vk) = prover_for(&circuit);

    let proof = prover.prove(circuit.witness()).unwrap();
    assert!(verify(&vk, circuit.public_inputs(), &proof));
    assert!(!verify(&vk, &[Fr::from(36u64)], &proof));
}

#[test]
fn chain_proof_verifies_on_both_backends() {
    let circuit = ToyCircuit::multiplication_chain(40, Fr::from(3u64));
    let setup = circuit.setup(&mut ark_std::test_rng());
    let key = Arc::new(setup.key);

    let cpu = Prover::new(key.clone(), ProverConfig::with_num_threads(2)).unwrap();
    let device =
        Prover::with_backend(key, ProverConfig::with_num_threads(2), DeviceMsm::new(HostKernel))
            .unwrap();

    let proof = cpu.prove(circuit.witness()).unwrap();
    assert!(verify(&setup.vk, circuit.public_inputs(), &proof));

    // same randomness, same proof
    let from_cpu = cpu.prove_with_rng(circuit.witness(), &mut FixedRng::new(9)).unwrap();
    let from_device = device.prove_with_rng(circuit.witness(), &mut FixedRng::new(9)).unwrap();
    assert_eq!(from_cpu, from_device);
    assert!(verify(&setup.vk, circuit.public_inputs(), &from_device));
}

#[test]
fn fixed_randomness_is_deterministic() {
    let circuit = ToyCircuit::cubic();
    let (prover, _) = prover_for(&circuit);

    let first = prover.prove_with_rng(circuit.witness(), &mut FixedRng::new(1)).unwrap();
    let second = prover.prove_with_rng(circuit.witness(), &mut FixedRng::new(1)).unwrap();
    let other = prover.prove_with_rng(circuit.witness(), &mut FixedRng::new(2)).unwrap();
    assert_eq!(first, second);
    assert_ne!(first, other);
}

#[test]
fn fresh_randomness_changes_the_proof() {
    let circuit = ToyCircuit::cubic();
    let (prover, vk) = prover_for(&circuit);

    let first = prover.prove(circuit.witness()).unwrap();
    let second = prover.prove(circuit.witness()).unwrap();
    assert_ne!(first, second);
    assert!(verify(&vk, circuit.public_inputs(), &first));
    assert!(verify(&vk, circuit.public_inputs(), &second));
}

#[test]
fn zero_blinding_still_verifies() {
    let circuit = ToyCircuit::cubic();
    let (prover, vk) = prover_for(&circuit);

    let proof = prover.prove_with_rng(circuit.witness(), &mut FixedRng::zeros()).unwrap();
    assert!(verify(&vk, circuit.public_inputs(), &proof));
}

#[test]
fn thread_count_does_not_change_the_proof() {
    let circuit = ToyCircuit::multiplication_chain(20, Fr::from(5u64));
    let key = Arc::new(circuit.setup(&mut ark_std::test_rng()).key);

    let proofs: Vec<_> = [1, 2, 8]
        .into_iter()
        .map(|n| {
            Prover::new(key.clone(), ProverConfig::with_num_threads(n))
                .unwrap()
                .prove_with_rng(circuit.witness(), &mut FixedRng::new(3))
                .unwrap()
        })
        .collect();
    assert_eq!(proofs[0], proofs[1]);
    assert_eq!(proofs[1], proofs[2]);
}

#[test]
fn concurrent_proofs_share_one_prover() {
    let circuit = ToyCircuit::cubic();
    let (prover, vk) = prover_for(&circuit);
    let prover = Arc::new(prover);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let prover = prover.clone();
                let circuit = &circuit;
                scope.spawn(move || {
                    prover
                        .prove_with_rng(circuit.witness(), &mut FixedRng::new(i))
                        .unwrap()
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let proof = handle.join().unwrap();
            assert!(verify(&vk, circuit.public_inputs(), &proof));
            let expected = prover
                .prove_with_rng(circuit.witness(), &mut FixedRng::new(i as u8))
                .unwrap();
            assert_eq!(proof, expected);
        }
    });
}

#[test]
fn unsatisfying_witness_gives_a_proof_that_fails() {
    let circuit = ToyCircuit::cubic();
    let (prover, vk) = prover_for(&circuit);

    let mut witness = circuit.witness().to_vec();
    witness[3] += Fr::one();
    assert!(!circuit.is_satisfied_by(&witness));
    let proof = prover.prove(&witness).unwrap();
    assert!(!verify(&vk, circuit.public_inputs(), &proof));
}

#[test]
fn wrong_witness_length_is_rejected() {
    let circuit = ToyCircuit::cubic();
    let (prover, _) = prover_for(&circuit);

    let mut witness = circuit.witness().to_vec();
    witness.push(Fr::zero());
    assert!(matches!(
        prover.prove(&witness),
        Err(ProverError::WitnessLength {
            expected: 5,
            actual: 6
        })
    ));
    assert!(matches!(
        prover.prove(&witness[..4]),
        Err(ProverError::WitnessLength { .. })
    ));
}

#[test]
fn randomness_failure_is_reported() {
    let circuit = ToyCircuit::cubic();
    let (prover, _) = prover_for(&circuit);

    assert!(matches!(
        prover.prove_with_rng(circuit.witness(), &mut FailingRng),
        Err(ProverError::Randomness(_))
    ));
}

#[test]
fn zero_threads_is_a_configuration_error() {
    let key = Arc::new(ToyCircuit::cubic().setup(&mut ark_std::test_rng()).key);
    assert!(matches!(
        Prover::new(key, ProverConfig::with_num_threads(0)),
        Err(Error::Configuration(ConfigurationError::ZeroThreads))
    ));
}

#[test]
fn invalid_key_is_rejected_up_front() {
    let mut key = ToyCircuit::cubic().setup(&mut ark_std::test_rng()).key;
    key.points_b2.pop();
    assert!(matches!(
        Prover::new(Arc::new(key), ProverConfig::with_num_threads(1)),
        Err(Error::Prover(ProverError::InvalidKey(_)))
    ));
}

#[test]
fn all_public_circuit_has_an_empty_c_msm() {
    let circuit = ToyCircuit::all_public(Fr::from(6u64), Fr::from(7u64));
    let (prover, vk) = prover_for(&circuit);
    assert!(prover.key().points_c.is_empty());

    let proof = prover.prove(circuit.witness()).unwrap();
    assert!(verify(&vk, circuit.public_inputs(), &proof));
}

#[test]
fn circuit_without_public_inputs_verifies() {
    let circuit = ToyCircuit::private_square(Fr::from(9u64));
    let (prover, vk) = prover_for(&circuit);
    assert_eq!(prover.key().n_public, 0);
    assert_eq!(vk.ic.len(), 1);

    let proof = prover.prove(circuit.witness()).unwrap();
    assert!(verify(&vk, &[], &proof));
}

#[test]
fn toy_circuits_are_consistent_with_their_keys() {
    let circuits = [
        ToyCircuit::cubic(),
        ToyCircuit::multiplication_chain(6, Fr::from(2u64)),
        ToyCircuit::all_public(Fr::from(6u64), Fr::from(7u64)),
        ToyCircuit::private_square(Fr::from(9u64)),
    ];
    for circuit in circuits {
        assert!(circuit.is_satisfied_by(circuit.witness()));
        assert_eq!(circuit.public_inputs().len(), circuit.n_public());
        let key = circuit.setup(&mut ark_std::test_rng()).key;
        assert_eq!(key.n_public, circuit.n_public());
        assert_eq!(key.n_vars, circuit.witness().len());
    }
}

#[test]
fn blinding_scalars_stay_below_2_248() {
    let mut rng = FixedRng::new(0xff);
    for _ in 0..16 {
        let r = sample_blinding_scalar(&mut rng).unwrap();
        let bytes = {
            use ark_ff::{BigInteger, PrimeField};
            r.into_bigint().to_bytes_le()
        };
        assert_eq!(bytes[31], 0);
    }

    let mut ones = AllOnes;
    let r = sample_blinding_scalar(&mut ones).unwrap();
    let expected = {
        use ark_ff::Field;
        Fr::from(2u64).pow([248u64]) - Fr::one()
    };
    assert_eq!(r, expected);
}

#[test]
fn combine_with_zero_inputs_is_the_setup_shift() {
    let key = ToyCircuit::cubic().setup(&mut ark_std::test_rng()).key;
    let zero = MsmOutputs {
        a: G1Projective::zero(),
        b1: G1Projective::zero(),
        b2: G2Projective::zero(),
        c: G1Projective::zero(),
        h: G1Projective::zero(),
    };
    let proof = combine(&key, &zero, Fr::zero(), Fr::zero());
    assert_eq!(proof.a, key.alpha1);
    assert_eq!(proof.b, key.beta2);
    assert!(proof.c.is_zero());
}

/// Rng that only ever returns 0xff bytes.
struct AllOnes;

impl RngCore for AllOnes {
    fn next_u32(&mut self) -> u32 {
        u32::MAX
    }
    fn next_u64(&mut self) -> u64 {
        u64::MAX
    }
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0xff);
    }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl rand::CryptoRng for AllOnes {}

#[test]
fn single_row_key_matches_a_direct_computation() {
    use ark_ec::{CurveGroup, Group};

    use crate::groth16::{Coefficient, Matrix, ProvingKey};

    let g1 = |k: u64| (G1Projective::generator() * Fr::from(k)).into_affine();
    let g2 = |k: u64| (G2Projective::generator() * Fr::from(k)).into_affine();
    let key = ProvingKey {
        n_vars: 2,
        n_public: 0,
        domain_size: 1,
        alpha1: g1(11),
        beta1: g1(12),
        beta2: g2(13),
        gamma2: g2(14),
        delta1: g1(15),
        delta2: g2(16),
        ic: vec![g1(17)],
        coefficients: vec![Coefficient {
            matrix: Matrix::A,
            row: 0,
            col: 1,
            value: Fr::one(),
        }],
        points_a: vec![G1Projective::zero().into_affine(), g1(21)],
        points_b1: vec![G1Projective::zero().into_affine(); 2],
        points_b2: vec![G2Projective::zero().into_affine(); 2],
        points_c: vec![g1(31)],
        points_h: vec![g1(41)],
    };
    let w1 = Fr::from(7u64);
    let witness = [Fr::one(), w1];

    let prover = Prover::new(Arc::new(key.clone()), ProverConfig::with_num_threads(2)).unwrap();
    let proof = prover
        .prove_with_rng(&witness, &mut FixedRng::zeros())
        .unwrap();

    // B is zero on the only row, so the quotient and the H term vanish
    let expected_a = key.points_a[1] * w1 + key.alpha1;
    let expected_c = key.points_c[0] * w1;
    assert_eq!(proof.a, expected_a.into_affine());
    assert_eq!(proof.b, key.beta2);
    assert_eq!(proof.c, expected_c.into_affine());
    assert!(proof.a.is_on_curve());
}
