#![cfg(feature = "mock")]

mod common;

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use blind_find::circuits::{
    parse_proof_of_smp_signals, parse_proof_successful_smp_signals, proof_of_smp_args,
    AdminAddress, BabyJubKeypair, CircuitArg, CircuitArgs, CircuitArtifacts, HubRegistry,
    PublicKey,
};
use blind_find::{
    BabyJubJub, CircuitConfig, CircuitProof, Error, MockBackend, ProofComposer,
    ProofIndirectConnection, ProvingBackend, Result, SearchResult, SecureRng, SmpMessage2,
    SmpMessage3, StageMessage,
};
use common::{admin_address, composer, init_tracing, Network};
use num_bigint::BigUint;

async fn connect<B: ProvingBackend>(
    composer: &ProofComposer<B>,
    network: &Network,
    guess: &PublicKey,
    rng: &mut SecureRng,
) -> Result<ProofIndirectConnection> {
    let exchange = network.search(guess);
    let input = network.proof_of_smp_input(&exchange, rng);
    let proof_of_smp = composer.gen_proof_of_smp(&input).await?;

    let msg2 = SmpMessage2::<BabyJubJub>::from_tlv(&exchange.tlvs[1])?;
    let msg3 = SmpMessage3::<BabyJubJub>::from_tlv(&exchange.tlvs[2])?;
    let result = SearchResult::from_session(proof_of_smp, &exchange.responder, &msg2, &msg3)?;

    composer
        .prove_indirect_connection(
            &result,
            &network.searcher,
            guess,
            &admin_address(),
            &network.root(),
            rng,
        )
        .await
}

fn roots(network: &Network) -> HashSet<BigUint> {
    HashSet::from([network.root(), BigUint::from(1u32)])
}

#[tokio::test]
async fn indirect_connection_round_trip() {
    init_tracing();
    let mut rng = SecureRng::new();
    let composer = composer();
    let network = Network::new(&mut rng);

    let proof = connect(&composer, &network, &network.target_key(), &mut rng)
        .await
        .unwrap();
    assert_eq!(proof.pubkey_a, PublicKey::from(&network.searcher));
    assert_eq!(proof.pubkey_c, network.target_key());
    assert!(composer
        .verify_proof_indirect_connection(&proof, &roots(&network))
        .await
        .unwrap());

    let json = serde_json::to_string(&proof).unwrap();
    assert!(json.contains("\"proofOfSMP\"") && json.contains("\"publicSignals\""));
    let decoded: ProofIndirectConnection = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, proof);
    assert!(composer
        .verify_proof_indirect_connection(&decoded, &roots(&network))
        .await
        .unwrap());
}

#[tokio::test]
async fn public_signals_expose_the_session() {
    let mut rng = SecureRng::new();
    let composer = composer();
    let network = Network::new(&mut rng);
    let proof = connect(&composer, &network, &network.target_key(), &mut rng)
        .await
        .unwrap();

    let smp = parse_proof_of_smp_signals(&proof.proof_of_smp.public_signals).unwrap();
    let successful =
        parse_proof_successful_smp_signals(&proof.proof_successful_smp.public_signals).unwrap();
    assert_eq!(smp.pubkey_c, network.target_key().coordinates());
    assert_eq!(&smp.admin_address, admin_address().value());
    assert_eq!(smp.merkle_root, network.root());
    assert_eq!(successful.pubkey_a, PublicKey::from(&network.searcher).coordinates());
    assert_eq!((smp.pa, smp.ph, smp.rh), (successful.pa, successful.ph, successful.rh));
}

#[tokio::test]
async fn mismatched_claims_are_rejected() {
    let mut rng = SecureRng::new();
    let composer = composer();
    let network = Network::new(&mut rng);
    let proof = connect(&composer, &network, &network.target_key(), &mut rng)
        .await
        .unwrap();
    let stranger = PublicKey::from(&BabyJubKeypair::generate(&mut rng));
    let valid = roots(&network);

    let mut wrong_searcher = proof.clone();
    wrong_searcher.pubkey_a = stranger;
    let mut wrong_target = proof.clone();
    wrong_target.pubkey_c = stranger;
    let mut wrong_admin = proof.clone();
    wrong_admin.admin_address =
        AdminAddress::parse("0x0000000000000000000000000000000000000001").unwrap();

    for forged in [wrong_searcher, wrong_target, wrong_admin] {
        assert!(!composer
            .verify_proof_indirect_connection(&forged, &valid)
            .await
            .unwrap());
    }

    let stale = HashSet::from([network.root() + 1u32]);
    assert!(!composer
        .verify_proof_indirect_connection(&proof, &stale)
        .await
        .unwrap());
    assert!(!composer
        .verify_proof_indirect_connection(&proof, &HashSet::new())
        .await
        .unwrap());
}

#[tokio::test]
async fn proofs_from_different_sessions_do_not_combine() {
    let mut rng = SecureRng::new();
    let composer = composer();
    let network = Network::new(&mut rng);
    let first = connect(&composer, &network, &network.target_key(), &mut rng)
        .await
        .unwrap();
    let second = connect(&composer, &network, &network.target_key(), &mut rng)
        .await
        .unwrap();

    let spliced = ProofIndirectConnection {
        proof_successful_smp: second.proof_successful_smp,
        ..first
    };
    assert!(!composer
        .verify_proof_indirect_connection(&spliced, &roots(&network))
        .await
        .unwrap());
}

#[tokio::test]
async fn tampered_signals_are_rejected() {
    let mut rng = SecureRng::new();
    let composer = composer();
    let network = Network::new(&mut rng);
    let proof = connect(&composer, &network, &network.target_key(), &mut rng)
        .await
        .unwrap();

    let mut truncated = proof.clone();
    truncated.proof_of_smp.public_signals.pop();
    let mut extended = proof.clone();
    extended
        .proof_successful_smp
        .public_signals
        .push("0".to_string());
    let mut rewritten = proof.clone();
    rewritten.proof_of_smp.public_signals[4] = "1".to_string();

    for forged in [truncated, extended, rewritten] {
        assert!(!composer
            .verify_proof_indirect_connection(&forged, &roots(&network))
            .await
            .unwrap());
    }
}

/// Accepts every proof, so signal parsing is the only gate left.
struct PermissiveBackend;

#[async_trait]
impl ProvingBackend for PermissiveBackend {
    async fn prove(&self, _: &CircuitArtifacts, _: &CircuitArgs) -> Result<CircuitProof> {
        Err(Error::Backend("verification only".to_string()))
    }

    async fn verify(&self, _: &CircuitArtifacts, _: &CircuitProof) -> Result<bool> {
        Ok(true)
    }
}

#[tokio::test]
async fn accepted_proofs_with_malformed_signals_are_errors() {
    let mut rng = SecureRng::new();
    let network = Network::new(&mut rng);
    let proof = connect(&composer(), &network, &network.target_key(), &mut rng)
        .await
        .unwrap();
    let permissive = ProofComposer::new(PermissiveBackend, CircuitConfig::default()).unwrap();
    assert!(permissive
        .verify_proof_indirect_connection(&proof, &roots(&network))
        .await
        .unwrap());

    let mut truncated = proof.clone();
    truncated.proof_of_smp.public_signals.pop();
    let mut extended = proof.clone();
    extended
        .proof_successful_smp
        .public_signals
        .push("0".to_string());
    let mut garbled = proof.clone();
    garbled.proof_successful_smp.public_signals[2] = "not a number".to_string();

    for forged in [truncated, extended, garbled] {
        let err = permissive
            .verify_proof_indirect_connection(&forged, &roots(&network))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }
}

#[tokio::test]
async fn wrong_guess_cannot_be_proven() {
    let mut rng = SecureRng::new();
    let composer = composer();
    let network = Network::new(&mut rng);
    let someone_else = PublicKey::from(&BabyJubKeypair::generate(&mut rng));

    let exchange = network.search(&someone_else);
    assert!(!exchange.responder.get_result().unwrap());

    let err = connect(&composer, &network, &someone_else, &mut rng)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Backend(_)));
}

#[tokio::test]
async fn forged_hub_proof_is_rejected_by_the_searcher() {
    let mut rng = SecureRng::new();
    let composer = composer();
    let network = Network::new(&mut rng);
    let target = network.target_key();

    let exchange = network.search(&target);
    let input = network.proof_of_smp_input(&exchange, &mut rng);
    let mut proof_of_smp = composer.gen_proof_of_smp(&input).await.unwrap();
    proof_of_smp.public_signals[3] = "7".to_string();

    let msg2 = SmpMessage2::<BabyJubJub>::from_tlv(&exchange.tlvs[1]).unwrap();
    let msg3 = SmpMessage3::<BabyJubJub>::from_tlv(&exchange.tlvs[2]).unwrap();
    let result =
        SearchResult::from_session(proof_of_smp, &exchange.responder, &msg2, &msg3).unwrap();

    let err = composer
        .prove_indirect_connection(
            &result,
            &network.searcher,
            &target,
            &admin_address(),
            &network.root(),
            &mut rng,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ProofInvalid(_)));
}

#[tokio::test]
async fn invalid_registry_is_refused() {
    let mut rng = SecureRng::new();
    let composer = composer();
    let mut network = Network::new(&mut rng);
    let impostor = BabyJubKeypair::generate(&mut rng);
    let signed = HubRegistry::sign(&impostor, admin_address(), &mut rng);
    network.registry = HubRegistry::new(
        PublicKey::from(&network.hub),
        signed.sig().clone(),
        admin_address(),
    );

    let exchange = network.search(&network.target_key());
    let input = network.proof_of_smp_input(&exchange, &mut rng);
    let err = composer.gen_proof_of_smp(&input).await.unwrap_err();
    assert!(matches!(err, Error::MalformedInput(_)));
}

#[tokio::test]
async fn hub_cannot_prove_an_altered_transcript() {
    let mut rng = SecureRng::new();
    let config = CircuitConfig::default();
    let backend = MockBackend::new(&config);
    let artifacts = config.proof_of_smp_artifacts();
    let network = Network::new(&mut rng);

    let exchange = network.search(&network.target_key());
    let args = proof_of_smp_args(&network.proof_of_smp_input(&exchange, &mut rng)).unwrap();
    assert!(backend.prove(&artifacts, &args).await.is_ok());

    let altered_keys = [
        "g2hProofD",
        "g3aProofC",
        "paqaProofD1",
        "phqhProofC",
        "rhProofD",
        "sigCS",
        "sigJoinMsgHubS",
        "h3",
        "r4h",
    ];
    for key in altered_keys {
        let bumped = args.require(key).unwrap().as_biguint().unwrap() + 1u32;
        let mut altered = args.clone();
        altered.insert(key, CircuitArg::int(&bumped));

        let err = backend.prove(&artifacts, &altered).await.unwrap_err();
        assert!(matches!(err, Error::Backend(_)), "{key} accepted");
    }
}

#[tokio::test]
async fn unknown_circuit_is_a_backend_error() {
    let config = CircuitConfig::default();
    let backend = MockBackend::new(&config);
    let artifacts = config.artifacts("somethingElse");
    let proof = CircuitProof {
        proof: serde_json::Value::Null,
        public_signals: vec![],
    };
    assert!(matches!(
        backend.verify(&artifacts, &proof).await,
        Err(Error::Backend(_))
    ));
}

struct StalledBackend;

#[async_trait]
impl ProvingBackend for StalledBackend {
    async fn prove(&self, _: &CircuitArtifacts, _: &CircuitArgs) -> Result<CircuitProof> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(Error::Backend("unreachable".to_string()))
    }

    async fn verify(&self, _: &CircuitArtifacts, _: &CircuitProof) -> Result<bool> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(true)
    }
}

#[tokio::test]
async fn slow_backend_times_out() {
    let config = CircuitConfig {
        timeout_secs: 1,
        ..CircuitConfig::default()
    };
    let composer = ProofComposer::new(StalledBackend, config).unwrap();
    let proof = CircuitProof {
        proof: serde_json::Value::Null,
        public_signals: vec![],
    };

    let err = composer.verify_proof_of_smp(&proof).await.unwrap_err();
    assert!(matches!(err, Error::Timeout(d) if d == Duration::from_secs(1)));
}

#[test]
fn composer_validates_its_config() {
    let config = CircuitConfig {
        timeout_secs: 0,
        ..CircuitConfig::default()
    };
    let backend = MockBackend::new(&config);
    assert!(matches!(
        ProofComposer::new(backend, config),
        Err(Error::Config(_))
    ));
}
