use std::hint::black_box;

use blind_find::{BabyJubJub, Group, ProofDiscreteLog, SecureRng, SmpStateMachine, Tlv};
use criterion::{criterion_group, criterion_main, Criterion};

type Machine = SmpStateMachine<BabyJubJub>;

fn run_exchange(a: &str, b: &str) -> bool {
    let mut alice = Machine::new(a);
    let mut bob = Machine::new(b);
    let mut outgoing: Option<Tlv> = alice.transit(None).unwrap();
    let mut turn_bob = true;
    while let Some(tlv) = outgoing {
        let party = if turn_bob { &mut bob } else { &mut alice };
        outgoing = party.transit(Some(&tlv)).unwrap();
        turn_bob = !turn_bob;
    }
    alice.get_result().unwrap()
}

fn bench_full_exchange(c: &mut Criterion) {
    c.bench_function("smp_full_exchange", |b| {
        b.iter(|| run_exchange(black_box("string0"), black_box("string0")))
    });
}

fn bench_initiate(c: &mut Criterion) {
    let mut rng = SecureRng::seeded(42);
    c.bench_function("smp_initiate", |b| {
        b.iter(|| {
            let mut alice = Machine::new(black_box("string0"));
            alice.transit_with_rng(None, &mut rng).unwrap()
        })
    });
}

fn bench_discrete_log_proof(c: &mut Criterion) {
    let mut rng = SecureRng::seeded(7);
    let g = BabyJubJub::generator();
    let x = BabyJubJub::random_scalar(&mut rng);
    let y = BabyJubJub::scalar_mul(&g, &x);
    let proof = ProofDiscreteLog::<BabyJubJub>::prove(1, &g, &y, &x, &mut rng);

    c.bench_function("discrete_log_prove", |b| {
        b.iter(|| ProofDiscreteLog::<BabyJubJub>::prove(1, black_box(&g), &y, &x, &mut rng))
    });
    c.bench_function("discrete_log_verify", |b| {
        b.iter(|| proof.verify(1, black_box(&g), black_box(&y)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_full_exchange,
    bench_initiate,
    bench_discrete_log_proof
);
criterion_main!(benches);
