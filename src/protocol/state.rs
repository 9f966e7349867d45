//! Per-party SMP state machine.
//!
//! Both parties start in [`SmpState::Expect1`]. The initiator calls
//! `transit(None)` to produce message 1; from then on every call consumes the
//! peer's message and returns the next one, until both sides reach
//! [`SmpState::Finished`] and know whether their secrets matched.
//!
//! A message of the wrong stage, or one that does not decode, is rejected
//! without touching the session. A message that decodes but fails a proof
//! check aborts the session for good.

use rand_core::CryptoRngCore;
use tracing::{debug, warn};

use super::messages::{SmpMessage1, SmpMessage2, SmpMessage3, SmpMessage4, Stage, StageMessage};
use super::secret::Secret;
use super::wire::Tlv;
use crate::primitives::{
    BabyJubJub, ProofDiscreteLog, ProofEqualDiscreteCoordinates, ProofEqualDiscreteLogs, SecureRng,
};
use crate::{Error, Group, Result};

/// Observable progress of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SmpState {
    /// Waiting for `None` (to initiate) or message 1.
    Expect1,
    /// Initiator waiting for message 2.
    Expect2,
    /// Responder waiting for message 3.
    Expect3,
    /// Initiator waiting for message 4.
    Expect4,
    /// Result available.
    Finished,
    /// A proof check failed; the session is dead.
    Aborted,
}

/// Exponents this party generated during the exchange.
///
/// The initiator's values are what the hub feeds into its proof of SMP as
/// `h2`, `h3` and `r4h`; the responder's `a3` is what the searcher uses in
/// the proof of successful SMP.
#[derive(Clone, Debug)]
pub struct EphemeralKeys<G: Group> {
    a2: Option<G::Scalar>,
    a3: Option<G::Scalar>,
    r4: Option<G::Scalar>,
}

impl<G: Group> Default for EphemeralKeys<G> {
    fn default() -> Self {
        Self {
            a2: None,
            a3: None,
            r4: None,
        }
    }
}

impl<G: Group> EphemeralKeys<G> {
    /// This party's exponent for the `g2` exchange.
    pub fn a2(&self) -> Option<&G::Scalar> {
        self.a2.as_ref()
    }

    /// This party's exponent for the `g3` exchange.
    pub fn a3(&self) -> Option<&G::Scalar> {
        self.a3.as_ref()
    }

    /// The randomness behind this party's `(P, Q)` pair.
    pub fn r4(&self) -> Option<&G::Scalar> {
        self.r4.as_ref()
    }
}

enum State<G: Group> {
    Expect1,
    Expect2 {
        g3a: G::Element,
    },
    Expect3 {
        g2: G::Element,
        g3: G::Element,
        g3a: G::Element,
        g3b: G::Element,
        pb: G::Element,
        qb: G::Element,
    },
    Expect4 {
        g3b: G::Element,
        pa: G::Element,
        pb: G::Element,
        qa_qb: G::Element,
    },
    Finished {
        result: bool,
    },
    Aborted,
}

impl<G: Group> State<G> {
    fn kind(&self) -> SmpState {
        match self {
            State::Expect1 => SmpState::Expect1,
            State::Expect2 { .. } => SmpState::Expect2,
            State::Expect3 { .. } => SmpState::Expect3,
            State::Expect4 { .. } => SmpState::Expect4,
            State::Finished { .. } => SmpState::Finished,
            State::Aborted => SmpState::Aborted,
        }
    }
}

/// One party's side of a Socialist Millionaires' Protocol run.
///
/// Not safe for concurrent `transit` calls; drive it from a single owner.
pub struct SmpStateMachine<G: Group = BabyJubJub> {
    secret: G::Scalar,
    state: State<G>,
    ephemeral: EphemeralKeys<G>,
}

impl<G: Group> core::fmt::Debug for SmpStateMachine<G> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SmpStateMachine")
            .field("state", &self.state.kind())
            .finish_non_exhaustive()
    }
}

fn decode<G: Group, M: StageMessage<G>>(tlv: &Tlv) -> Result<M> {
    M::from_tlv(tlv).map_err(|e| match e {
        Error::ProtocolViolation(_) => e,
        other => Error::ProtocolViolation(format!(
            "stage {} message is malformed: {other}",
            M::STAGE.number()
        )),
    })
}

fn require_non_identity<G: Group>(name: &str, element: &G::Element) -> Result<()> {
    if G::is_identity(element) {
        return Err(Error::ProtocolViolation(format!("{name} is the identity")));
    }
    Ok(())
}

impl<G: Group> SmpStateMachine<G> {
    /// Creates a session comparing `secret`.
    pub fn new(secret: impl Into<Secret>) -> Self {
        Self {
            secret: secret.into().to_scalar::<G>(),
            state: State::Expect1,
            ephemeral: EphemeralKeys::default(),
        }
    }

    /// Current state.
    pub fn state(&self) -> SmpState {
        self.state.kind()
    }

    /// Whether the exchange has completed.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Finished { .. })
    }

    /// Whether both secrets matched.
    ///
    /// # Errors
    ///
    /// [`Error::SessionNotFinished`] until the session reaches `Finished`.
    pub fn get_result(&self) -> Result<bool> {
        match self.state {
            State::Finished { result } => Ok(result),
            _ => Err(Error::SessionNotFinished),
        }
    }

    /// Exponents generated by this party so far.
    pub fn ephemeral(&self) -> &EphemeralKeys<G> {
        &self.ephemeral
    }

    /// Advances the session with fresh OS randomness.
    ///
    /// See [`SmpStateMachine::transit_with_rng`].
    pub fn transit(&mut self, input: Option<&Tlv>) -> Result<Option<Tlv>> {
        self.transit_with_rng(input, &mut SecureRng::new())
    }

    /// Advances the session by one message.
    ///
    /// `None` is only legal in `Expect1` and makes this party the initiator.
    /// Returns the message to send to the peer, or `None` once the initiator
    /// has consumed message 4.
    pub fn transit_with_rng<R: CryptoRngCore>(
        &mut self,
        input: Option<&Tlv>,
        rng: &mut R,
    ) -> Result<Option<Tlv>> {
        let from = self.state.kind();
        let outcome = self.step(input, rng);
        match &outcome {
            Ok(_) => debug!(from = ?from, to = ?self.state.kind(), "SMP transition"),
            Err(e) if self.state.kind() == SmpState::Aborted && from != SmpState::Aborted => {
                warn!(from = ?from, error = %e, "SMP session aborted");
            }
            Err(e) => debug!(state = ?from, error = %e, "SMP input rejected"),
        }
        outcome
    }

    fn step<R: CryptoRngCore>(&mut self, input: Option<&Tlv>, rng: &mut R) -> Result<Option<Tlv>> {
        match (&self.state, input) {
            (State::Expect1, None) => Ok(Some(self.initiate(rng).to_tlv())),
            (State::Expect1, Some(tlv)) => {
                let msg = decode::<G, SmpMessage1<G>>(tlv)?;
                self.abort_on_error(|this| this.handle_message1(&msg, rng))
                    .map(|m| Some(m.to_tlv()))
            }
            (State::Expect2 { .. }, Some(tlv)) => {
                let msg = decode::<G, SmpMessage2<G>>(tlv)?;
                self.abort_on_error(|this| this.handle_message2(&msg, rng))
                    .map(|m| Some(m.to_tlv()))
            }
            (State::Expect3 { .. }, Some(tlv)) => {
                let msg = decode::<G, SmpMessage3<G>>(tlv)?;
                self.abort_on_error(|this| this.handle_message3(&msg, rng))
                    .map(|m| Some(m.to_tlv()))
            }
            (State::Expect4 { .. }, Some(tlv)) => {
                let msg = decode::<G, SmpMessage4<G>>(tlv)?;
                self.abort_on_error(|this| this.handle_message4(&msg))
                    .map(|()| None)
            }
            (State::Finished { .. }, _) => Err(Error::ProtocolViolation(
                "session already finished".to_string(),
            )),
            (State::Aborted, _) => Err(Error::ProtocolViolation(
                "session was aborted".to_string(),
            )),
            (state, None) => Err(Error::ProtocolViolation(format!(
                "{:?} requires a message",
                state.kind()
            ))),
        }
    }

    /// Runs a handler, moving to `Aborted` if it fails.
    fn abort_on_error<T>(&mut self, handler: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        handler(self).map_err(|e| {
            self.state = State::Aborted;
            match e {
                Error::ProtocolViolation(_) => e,
                other => Error::ProtocolViolation(other.to_string()),
            }
        })
    }

    fn initiate<R: CryptoRngCore>(&mut self, rng: &mut R) -> SmpMessage1<G> {
        let g1 = G::generator();
        let a2 = G::random_scalar(rng);
        let a3 = G::random_scalar(rng);
        let g2a = G::scalar_mul(&g1, &a2);
        let g3a = G::scalar_mul(&g1, &a3);
        let g2a_proof = ProofDiscreteLog::<G>::prove(1, &g1, &g2a, &a2, rng);
        let g3a_proof = ProofDiscreteLog::<G>::prove(2, &g1, &g3a, &a3, rng);

        self.ephemeral.a2 = Some(a2);
        self.ephemeral.a3 = Some(a3);
        self.state = State::Expect2 { g3a: g3a.clone() };
        SmpMessage1 {
            g2a,
            g2a_proof,
            g3a,
            g3a_proof,
        }
    }

    fn handle_message1<R: CryptoRngCore>(
        &mut self,
        msg: &SmpMessage1<G>,
        rng: &mut R,
    ) -> Result<SmpMessage2<G>> {
        let g1 = G::generator();
        require_non_identity::<G>("g2a", &msg.g2a)?;
        require_non_identity::<G>("g3a", &msg.g3a)?;
        msg.g2a_proof.verify(1, &g1, &msg.g2a)?;
        msg.g3a_proof.verify(2, &g1, &msg.g3a)?;

        let b2 = G::random_scalar(rng);
        let b3 = G::random_scalar(rng);
        let g2b = G::scalar_mul(&g1, &b2);
        let g3b = G::scalar_mul(&g1, &b3);
        let g2b_proof = ProofDiscreteLog::<G>::prove(3, &g1, &g2b, &b2, rng);
        let g3b_proof = ProofDiscreteLog::<G>::prove(4, &g1, &g3b, &b3, rng);

        let g2 = G::scalar_mul(&msg.g2a, &b2);
        let g3 = G::scalar_mul(&msg.g3a, &b3);

        let r4 = G::random_scalar(rng);
        let pb = G::scalar_mul(&g3, &r4);
        let qb = G::element_add(&G::scalar_mul(&g1, &r4), &G::scalar_mul(&g2, &self.secret));
        let pbqb_proof = ProofEqualDiscreteCoordinates::<G>::prove(
            5,
            (&g3, &g1, &g2),
            (&pb, &qb),
            (&r4, &self.secret),
            rng,
        );

        self.ephemeral.a2 = Some(b2);
        self.ephemeral.a3 = Some(b3);
        self.ephemeral.r4 = Some(r4);
        self.state = State::Expect3 {
            g2,
            g3,
            g3a: msg.g3a.clone(),
            g3b: g3b.clone(),
            pb: pb.clone(),
            qb: qb.clone(),
        };
        Ok(SmpMessage2 {
            g2b,
            g2b_proof,
            g3b,
            g3b_proof,
            pb,
            qb,
            pbqb_proof,
        })
    }

    fn handle_message2<R: CryptoRngCore>(
        &mut self,
        msg: &SmpMessage2<G>,
        rng: &mut R,
    ) -> Result<SmpMessage3<G>> {
        let State::Expect2 { g3a } = &self.state else {
            return Err(Error::ProtocolViolation("not expecting message 2".to_string()));
        };
        let g3a = g3a.clone();
        let (Some(a2), Some(a3)) = (self.ephemeral.a2.clone(), self.ephemeral.a3.clone()) else {
            return Err(Error::ProtocolViolation("missing DH exponents".to_string()));
        };
        let g1 = G::generator();

        require_non_identity::<G>("g2b", &msg.g2b)?;
        require_non_identity::<G>("g3b", &msg.g3b)?;
        msg.g2b_proof.verify(3, &g1, &msg.g2b)?;
        msg.g3b_proof.verify(4, &g1, &msg.g3b)?;

        let g2 = G::scalar_mul(&msg.g2b, &a2);
        let g3 = G::scalar_mul(&msg.g3b, &a3);
        msg.pbqb_proof.verify(5, (&g3, &g1, &g2), (&msg.pb, &msg.qb))?;

        let r4 = G::random_scalar(rng);
        let pa = G::scalar_mul(&g3, &r4);
        let qa = G::element_add(&G::scalar_mul(&g1, &r4), &G::scalar_mul(&g2, &self.secret));
        let paqa_proof = ProofEqualDiscreteCoordinates::<G>::prove(
            6,
            (&g3, &g1, &g2),
            (&pa, &qa),
            (&r4, &self.secret),
            rng,
        );

        let qa_qb = G::element_sub(&qa, &msg.qb);
        let ra = G::scalar_mul(&qa_qb, &a3);
        let ra_proof = ProofEqualDiscreteLogs::<G>::prove(7, (&g1, &qa_qb), (&g3a, &ra), &a3, rng);

        self.ephemeral.r4 = Some(r4);
        self.state = State::Expect4 {
            g3b: msg.g3b.clone(),
            pa: pa.clone(),
            pb: msg.pb.clone(),
            qa_qb,
        };
        Ok(SmpMessage3 {
            pa,
            qa,
            paqa_proof,
            ra,
            ra_proof,
        })
    }

    fn handle_message3<R: CryptoRngCore>(
        &mut self,
        msg: &SmpMessage3<G>,
        rng: &mut R,
    ) -> Result<SmpMessage4<G>> {
        let State::Expect3 {
            g2,
            g3,
            g3a,
            g3b,
            pb,
            qb,
        } = &self.state
        else {
            return Err(Error::ProtocolViolation("not expecting message 3".to_string()));
        };
        let Some(b3) = self.ephemeral.a3.clone() else {
            return Err(Error::ProtocolViolation("missing DH exponent".to_string()));
        };
        let g1 = G::generator();

        msg.paqa_proof.verify(6, (g3, &g1, g2), (&msg.pa, &msg.qa))?;
        let qa_qb = G::element_sub(&msg.qa, qb);
        msg.ra_proof.verify(7, (&g1, &qa_qb), (g3a, &msg.ra))?;

        let rb = G::scalar_mul(&qa_qb, &b3);
        let rb_proof = ProofEqualDiscreteLogs::<G>::prove(8, (&g1, &qa_qb), (g3b, &rb), &b3, rng);

        let rab = G::scalar_mul(&msg.ra, &b3);
        let result = rab == G::element_sub(&msg.pa, pb);

        self.state = State::Finished { result };
        Ok(SmpMessage4 { rb, rb_proof })
    }

    fn handle_message4(&mut self, msg: &SmpMessage4<G>) -> Result<()> {
        let State::Expect4 {
            g3b,
            pa,
            pb,
            qa_qb,
        } = &self.state
        else {
            return Err(Error::ProtocolViolation("not expecting message 4".to_string()));
        };
        let Some(a3) = self.ephemeral.a3.as_ref() else {
            return Err(Error::ProtocolViolation("missing DH exponent".to_string()));
        };
        let g1 = G::generator();

        msg.rb_proof.verify(8, (&g1, qa_qb), (g3b, &msg.rb))?;

        let rab = G::scalar_mul(&msg.rb, a3);
        let result = rab == G::element_sub(pa, pb);

        self.state = State::Finished { result };
        Ok(())
    }
}

impl Stage {
    /// The state that accepts messages of this stage.
    pub fn accepted_in(self) -> SmpState {
        match self {
            Stage::One => SmpState::Expect1,
            Stage::Two => SmpState::Expect2,
            Stage::Three => SmpState::Expect3,
            Stage::Four => SmpState::Expect4,
        }
    }
}
