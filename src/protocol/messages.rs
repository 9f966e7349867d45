//! The four SMP messages and their wire schemas.
//!
//! | Stage | TLV type | Fields |
//! |---|---|---|
//! | 1 | 2 | `g2a, c, d, g3a, c, d` |
//! | 2 | 3 | `g2b, c, d, g3b, c, d, Pb, Qb, c, d0, d1` |
//! | 3 | 4 | `Pa, Qa, c, d0, d1, Ra, c, d` |
//! | 4 | 5 | `Rb, c, d` |

use super::wire::{read_fields, Field, FieldKind, Short, Tlv};
use crate::primitives::{ProofDiscreteLog, ProofEqualDiscreteCoordinates, ProofEqualDiscreteLogs};
use crate::{Error, Group, Result};

use super::wire::FieldKind::{Point as P, Scalar as S};

const SCHEMA_1: &[FieldKind] = &[P, S, S, P, S, S];
const SCHEMA_2: &[FieldKind] = &[P, S, S, P, S, S, P, P, S, S, S];
const SCHEMA_3: &[FieldKind] = &[P, P, S, S, S, P, S, S];
const SCHEMA_4: &[FieldKind] = &[P, S, S];

/// SMP message stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Initiator's DH shares.
    One,
    /// Responder's DH shares and `(Pb, Qb)`.
    Two,
    /// Initiator's `(Pa, Qa)` and `Ra`.
    Three,
    /// Responder's `Rb`.
    Four,
}

impl Stage {
    /// All stages in protocol order.
    pub const ALL: [Stage; 4] = [Stage::One, Stage::Two, Stage::Three, Stage::Four];

    /// Stage number, 1 to 4.
    pub fn number(self) -> u8 {
        match self {
            Stage::One => 1,
            Stage::Two => 2,
            Stage::Three => 3,
            Stage::Four => 4,
        }
    }

    /// TLV type tag carried by messages of this stage.
    pub fn tlv_type(self) -> Short {
        Short(u16::from(self.number()) + 1)
    }

    /// Ordered field kinds of this stage.
    pub fn schema(self) -> &'static [FieldKind] {
        match self {
            Stage::One => SCHEMA_1,
            Stage::Two => SCHEMA_2,
            Stage::Three => SCHEMA_3,
            Stage::Four => SCHEMA_4,
        }
    }

    /// Looks up the stage for a TLV type tag.
    pub fn from_tlv_type(tlv_type: Short) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.tlv_type() == tlv_type)
    }

    /// Encoded value length for group `G`.
    pub fn value_len<G: Group>(self) -> usize {
        self.schema().iter().map(|k| k.width::<G>()).sum()
    }
}

/// Typed view over a decoded field list, consumed front to back.
pub struct Fields<G: Group>(std::vec::IntoIter<Field<G>>);

impl<G: Group> Fields<G> {
    fn point(&mut self) -> Result<G::Element> {
        match self.0.next() {
            Some(Field::Point(p)) => Ok(p),
            other => Err(unexpected("point", other.as_ref())),
        }
    }

    fn scalar(&mut self) -> Result<G::Scalar> {
        match self.0.next() {
            Some(Field::Scalar(s)) => Ok(s),
            other => Err(unexpected("scalar", other.as_ref())),
        }
    }

    fn dl_proof(&mut self) -> Result<ProofDiscreteLog<G>> {
        let c = self.scalar()?;
        let d = self.scalar()?;
        Ok(ProofDiscreteLog::new(c, d))
    }

    fn edl_proof(&mut self) -> Result<ProofEqualDiscreteLogs<G>> {
        let c = self.scalar()?;
        let d = self.scalar()?;
        Ok(ProofEqualDiscreteLogs::new(c, d))
    }

    fn edc_proof(&mut self) -> Result<ProofEqualDiscreteCoordinates<G>> {
        let c = self.scalar()?;
        let d0 = self.scalar()?;
        let d1 = self.scalar()?;
        Ok(ProofEqualDiscreteCoordinates::new(c, d0, d1))
    }
}

fn unexpected<G: Group>(wanted: &str, got: Option<&Field<G>>) -> Error {
    Error::ProtocolViolation(format!(
        "expected {wanted} field, found {:?}",
        got.map(Field::kind)
    ))
}

fn dl_fields<G: Group>(proof: &ProofDiscreteLog<G>) -> [Field<G>; 2] {
    [Field::Scalar(proof.c().clone()), Field::Scalar(proof.d().clone())]
}

fn edl_fields<G: Group>(proof: &ProofEqualDiscreteLogs<G>) -> [Field<G>; 2] {
    [Field::Scalar(proof.c().clone()), Field::Scalar(proof.d().clone())]
}

fn edc_fields<G: Group>(proof: &ProofEqualDiscreteCoordinates<G>) -> [Field<G>; 3] {
    [
        Field::Scalar(proof.c().clone()),
        Field::Scalar(proof.d0().clone()),
        Field::Scalar(proof.d1().clone()),
    ]
}

/// Common encoding for every stage message.
pub trait StageMessage<G: Group>: Sized {
    /// The stage this message belongs to.
    const STAGE: Stage;

    /// Fields in schema order.
    fn fields(&self) -> Vec<Field<G>>;

    /// Builds the message from fields already read in schema order.
    fn from_fields(fields: &mut Fields<G>) -> Result<Self>;

    /// Wraps the message in its TLV record.
    fn to_tlv(&self) -> Tlv {
        let mut value = Vec::with_capacity(Self::STAGE.value_len::<G>());
        for field in self.fields() {
            field.encode_into(&mut value);
        }
        Tlv::from_encoded(Self::STAGE.tlv_type(), value)
    }

    /// Parses the message from a TLV record of the matching type.
    fn from_tlv(tlv: &Tlv) -> Result<Self> {
        let expected = Self::STAGE.tlv_type();
        if tlv.tlv_type() != expected {
            return Err(Error::ProtocolViolation(format!(
                "expected TLV type {}, got {}",
                expected.0,
                tlv.tlv_type().0
            )));
        }
        let fields = read_fields::<G>(tlv.value(), Self::STAGE.schema())?;
        Self::from_fields(&mut Fields(fields.into_iter()))
    }

    /// Encodes the message as TLV bytes.
    fn serialize(&self) -> Vec<u8> {
        self.to_tlv().serialize()
    }

    /// Decodes the message from TLV bytes.
    fn deserialize(bytes: &[u8]) -> Result<Self> {
        Self::from_tlv(&Tlv::deserialize(bytes)?)
    }
}

/// Message 1: the initiator starts the DH exchange for `g2` and `g3`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmpMessage1<G: Group> {
    /// Initiator's half of the DH exchange for `g2`.
    pub g2a: G::Element,
    /// Knowledge of the exponent of `g2a`.
    pub g2a_proof: ProofDiscreteLog<G>,
    /// Initiator's half of the DH exchange for `g3`.
    pub g3a: G::Element,
    /// Knowledge of the exponent of `g3a`.
    pub g3a_proof: ProofDiscreteLog<G>,
}

impl<G: Group> StageMessage<G> for SmpMessage1<G> {
    const STAGE: Stage = Stage::One;

    fn fields(&self) -> Vec<Field<G>> {
        let mut out = vec![Field::Point(self.g2a.clone())];
        out.extend(dl_fields(&self.g2a_proof));
        out.push(Field::Point(self.g3a.clone()));
        out.extend(dl_fields(&self.g3a_proof));
        out
    }

    fn from_fields(f: &mut Fields<G>) -> Result<Self> {
        Ok(Self {
            g2a: f.point()?,
            g2a_proof: f.dl_proof()?,
            g3a: f.point()?,
            g3a_proof: f.dl_proof()?,
        })
    }
}

/// Message 2: the responder completes the DH exchange and sends `(Pb, Qb)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmpMessage2<G: Group> {
    /// Responder's half of the DH exchange for `g2`.
    pub g2b: G::Element,
    /// Knowledge of the exponent of `g2b`.
    pub g2b_proof: ProofDiscreteLog<G>,
    /// Responder's half of the DH exchange for `g3`.
    pub g3b: G::Element,
    /// Knowledge of the exponent of `g3b`.
    pub g3b_proof: ProofDiscreteLog<G>,
    /// `Pb = r4 * g3`.
    pub pb: G::Element,
    /// `Qb = r4 * g1 + y * g2`.
    pub qb: G::Element,
    /// `Pb` and `Qb` share `r4`.
    pub pbqb_proof: ProofEqualDiscreteCoordinates<G>,
}

impl<G: Group> StageMessage<G> for SmpMessage2<G> {
    const STAGE: Stage = Stage::Two;

    fn fields(&self) -> Vec<Field<G>> {
        let mut out = vec![Field::Point(self.g2b.clone())];
        out.extend(dl_fields(&self.g2b_proof));
        out.push(Field::Point(self.g3b.clone()));
        out.extend(dl_fields(&self.g3b_proof));
        out.push(Field::Point(self.pb.clone()));
        out.push(Field::Point(self.qb.clone()));
        out.extend(edc_fields(&self.pbqb_proof));
        out
    }

    fn from_fields(f: &mut Fields<G>) -> Result<Self> {
        Ok(Self {
            g2b: f.point()?,
            g2b_proof: f.dl_proof()?,
            g3b: f.point()?,
            g3b_proof: f.dl_proof()?,
            pb: f.point()?,
            qb: f.point()?,
            pbqb_proof: f.edc_proof()?,
        })
    }
}

/// Message 3: the initiator's `(Pa, Qa)` and `Ra`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmpMessage3<G: Group> {
    /// `Pa = r4 * g3`.
    pub pa: G::Element,
    /// `Qa = r4 * g1 + x * g2`.
    pub qa: G::Element,
    /// `Pa` and `Qa` share `r4`.
    pub paqa_proof: ProofEqualDiscreteCoordinates<G>,
    /// `Ra = a3 * (Qa - Qb)`.
    pub ra: G::Element,
    /// `Ra` and `g3a` share `a3`.
    pub ra_proof: ProofEqualDiscreteLogs<G>,
}

impl<G: Group> StageMessage<G> for SmpMessage3<G> {
    const STAGE: Stage = Stage::Three;

    fn fields(&self) -> Vec<Field<G>> {
        let mut out = vec![Field::Point(self.pa.clone()), Field::Point(self.qa.clone())];
        out.extend(edc_fields(&self.paqa_proof));
        out.push(Field::Point(self.ra.clone()));
        out.extend(edl_fields(&self.ra_proof));
        out
    }

    fn from_fields(f: &mut Fields<G>) -> Result<Self> {
        Ok(Self {
            pa: f.point()?,
            qa: f.point()?,
            paqa_proof: f.edc_proof()?,
            ra: f.point()?,
            ra_proof: f.edl_proof()?,
        })
    }
}

/// Message 4: the responder's `Rb`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmpMessage4<G: Group> {
    /// `Rb = b3 * (Qa - Qb)`.
    pub rb: G::Element,
    /// `Rb` and `g3b` share `b3`.
    pub rb_proof: ProofEqualDiscreteLogs<G>,
}

impl<G: Group> StageMessage<G> for SmpMessage4<G> {
    const STAGE: Stage = Stage::Four;

    fn fields(&self) -> Vec<Field<G>> {
        let mut out = vec![Field::Point(self.rb.clone())];
        out.extend(edl_fields(&self.rb_proof));
        out
    }

    fn from_fields(f: &mut Fields<G>) -> Result<Self> {
        Ok(Self {
            rb: f.point()?,
            rb_proof: f.edl_proof()?,
        })
    }
}

/// Any SMP message, tagged by stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SmpMessage<G: Group> {
    /// Stage 1.
    One(SmpMessage1<G>),
    /// Stage 2.
    Two(SmpMessage2<G>),
    /// Stage 3.
    Three(SmpMessage3<G>),
    /// Stage 4.
    Four(SmpMessage4<G>),
}

impl<G: Group> SmpMessage<G> {
    /// Returns the stage of this message.
    pub fn stage(&self) -> Stage {
        match self {
            SmpMessage::One(_) => Stage::One,
            SmpMessage::Two(_) => Stage::Two,
            SmpMessage::Three(_) => Stage::Three,
            SmpMessage::Four(_) => Stage::Four,
        }
    }

    /// Wraps the message in its TLV record.
    pub fn to_tlv(&self) -> Tlv {
        match self {
            SmpMessage::One(m) => m.to_tlv(),
            SmpMessage::Two(m) => m.to_tlv(),
            SmpMessage::Three(m) => m.to_tlv(),
            SmpMessage::Four(m) => m.to_tlv(),
        }
    }

    /// Parses any stage, dispatching on the TLV type.
    pub fn from_tlv(tlv: &Tlv) -> Result<Self> {
        let stage = Stage::from_tlv_type(tlv.tlv_type()).ok_or_else(|| {
            Error::ProtocolViolation(format!("unknown SMP TLV type {}", tlv.tlv_type().0))
        })?;
        Ok(match stage {
            Stage::One => SmpMessage::One(SmpMessage1::from_tlv(tlv)?),
            Stage::Two => SmpMessage::Two(SmpMessage2::from_tlv(tlv)?),
            Stage::Three => SmpMessage::Three(SmpMessage3::from_tlv(tlv)?),
            Stage::Four => SmpMessage::Four(SmpMessage4::from_tlv(tlv)?),
        })
    }

    /// Encodes the message as TLV bytes.
    pub fn serialize(&self) -> Vec<u8> {
        self.to_tlv().serialize()
    }

    /// Decodes any stage from TLV bytes.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        Self::from_tlv(&Tlv::deserialize(bytes)?)
    }
}

impl<G: Group> From<SmpMessage1<G>> for SmpMessage<G> {
    fn from(m: SmpMessage1<G>) -> Self {
        SmpMessage::One(m)
    }
}

impl<G: Group> From<SmpMessage2<G>> for SmpMessage<G> {
    fn from(m: SmpMessage2<G>) -> Self {
        SmpMessage::Two(m)
    }
}

impl<G: Group> From<SmpMessage3<G>> for SmpMessage<G> {
    fn from(m: SmpMessage3<G>) -> Self {
        SmpMessage::Three(m)
    }
}

impl<G: Group> From<SmpMessage4<G>> for SmpMessage<G> {
    fn from(m: SmpMessage4<G>) -> Self {
        SmpMessage::Four(m)
    }
}
