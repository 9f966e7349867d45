//! Common test utilities shared across integration tests.
#![allow(dead_code)]

use blind_find::circuits::{
    join_hub_message, AdminAddress, BabyJubKeypair, HubRegistry, MerkleProof, ProofOfSmpInput,
    PublicKey,
};
#[cfg(feature = "mock")]
use blind_find::{CircuitConfig, MockBackend, ProofComposer};
use blind_find::{
    BabyJubJub, SecureRng, SmpMessage1, SmpMessage2, SmpMessage3, SmpStateMachine, StageMessage,
    Tlv,
};
use num_bigint::BigUint;

/// Initialize test tracing (call once at the beginning of tests).
///
/// Subsequent calls are safe and will be ignored.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::new("blind_find=debug");

    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(filter)
        .try_init();
}

pub type Machine = SmpStateMachine<BabyJubJub>;

/// The four messages of a complete exchange, initiator first.
pub struct Exchange {
    pub initiator: Machine,
    pub responder: Machine,
    pub tlvs: [Tlv; 4],
}

/// Runs a full SMP between two fresh sessions.
pub fn run_smp(initiator_secret: &str, responder_secret: &str) -> Exchange {
    let mut initiator = Machine::new(initiator_secret);
    let mut responder = Machine::new(responder_secret);

    let tlv1 = initiator.transit(None).unwrap().unwrap();
    let tlv2 = responder.transit(Some(&tlv1)).unwrap().unwrap();
    let tlv3 = initiator.transit(Some(&tlv2)).unwrap().unwrap();
    let tlv4 = responder.transit(Some(&tlv3)).unwrap().unwrap();
    assert!(initiator.transit(Some(&tlv4)).unwrap().is_none());

    Exchange {
        initiator,
        responder,
        tlvs: [tlv1, tlv2, tlv3, tlv4],
    }
}

pub fn admin_address() -> AdminAddress {
    AdminAddress::parse("0xe75b72f46f34d8505382a35f4832ff41761611bb").unwrap()
}

#[cfg(feature = "mock")]
pub fn composer() -> ProofComposer<MockBackend> {
    let config = CircuitConfig::default();
    ProofComposer::new(MockBackend::new(&config), config).unwrap()
}

/// A hub registered under [`admin_address`], serving one target, probed by
/// one searcher.
pub struct Network {
    pub hub: BabyJubKeypair,
    pub target: BabyJubKeypair,
    pub searcher: BabyJubKeypair,
    pub registry: HubRegistry,
    pub merkle_proof: MerkleProof,
}

impl Network {
    pub fn new(rng: &mut SecureRng) -> Self {
        let hub = BabyJubKeypair::generate(rng);
        let registry = HubRegistry::sign(&hub, admin_address(), rng);
        let merkle_proof = MerkleProof::new(
            vec![vec![BigUint::from(3u32)]; 4],
            vec![1, 0, 0, 1],
            BigUint::parse_bytes(b"99887766554433221100", 10).unwrap(),
            BigUint::from(42u32),
        )
        .unwrap();
        Self {
            hub,
            target: BabyJubKeypair::generate(rng),
            searcher: BabyJubKeypair::generate(rng),
            registry,
            merkle_proof,
        }
    }

    pub fn root(&self) -> BigUint {
        self.merkle_proof.root().clone()
    }

    pub fn target_key(&self) -> PublicKey {
        PublicKey::from(&self.target)
    }

    /// The hub's private inputs for a finished exchange it initiated.
    pub fn proof_of_smp_input(&self, exchange: &Exchange, rng: &mut SecureRng) -> ProofOfSmpInput {
        let pubkey_c = self.target_key();
        let pubkey_hub = PublicKey::from(&self.hub);
        let join = join_hub_message(&pubkey_c, &pubkey_hub);
        let keys = exchange.initiator.ephemeral();

        ProofOfSmpInput {
            h2: keys.a2().unwrap().clone(),
            h3: keys.a3().unwrap().clone(),
            r4h: keys.r4().unwrap().clone(),
            msg1: SmpMessage1::<BabyJubJub>::from_tlv(&exchange.tlvs[0]).unwrap(),
            msg2: SmpMessage2::<BabyJubJub>::from_tlv(&exchange.tlvs[1]).unwrap(),
            msg3: SmpMessage3::<BabyJubJub>::from_tlv(&exchange.tlvs[2]).unwrap(),
            merkle_proof: self.merkle_proof.clone(),
            hub_registry: self.registry.clone(),
            pubkey_c,
            pubkey_hub,
            sig_join_msg_c: self.target.sign(&join, rng),
            sig_join_msg_hub: self.hub.sign(&join, rng),
        }
    }

    /// The hub's secret is the target's key; the searcher supplies its guess.
    pub fn search(&self, guess: &PublicKey) -> Exchange {
        run_smp(&self.target_key().to_hex(), &guess.to_hex())
    }
}
