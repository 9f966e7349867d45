mod common;

use blind_find::protocol::Short;
use blind_find::{BabyJubJub, Error, Group, SmpMessage, Stage, Tlv};
use common::run_smp;

type G = BabyJubJub;

#[test]
fn exchanged_messages_decode_to_their_stage() {
    let exchange = run_smp("string0", "string0");

    for (tlv, stage) in exchange.tlvs.iter().zip(Stage::ALL) {
        assert_eq!(tlv.tlv_type(), stage.tlv_type());
        assert_eq!(tlv.value().len(), stage.value_len::<G>());

        let bytes = tlv.serialize();
        assert_eq!(bytes.len(), Tlv::HEADER_SIZE + tlv.value().len());

        let msg = SmpMessage::<G>::deserialize(&bytes).unwrap();
        assert_eq!(msg.stage(), stage);
        assert_eq!(msg.to_tlv(), *tlv);
    }
}

#[test]
fn stage_sizes() {
    let (s, p) = (G::SCALAR_BYTES, G::ELEMENT_BYTES);
    assert_eq!((s, p), (32, 64));
    assert_eq!(Stage::One.value_len::<G>(), 2 * p + 4 * s);
    assert_eq!(Stage::Two.value_len::<G>(), 4 * p + 7 * s);
    assert_eq!(Stage::Three.value_len::<G>(), 3 * p + 5 * s);
    assert_eq!(Stage::Four.value_len::<G>(), p + 2 * s);
}

#[test]
fn header_is_big_endian() {
    let tlv = Tlv::new(0x0102u16, vec![0xaa; 0x0304]).unwrap();
    let bytes = tlv.serialize();
    assert_eq!(&bytes[..4], &[0x01, 0x02, 0x03, 0x04]);
    assert_eq!(Tlv::deserialize(&bytes).unwrap(), tlv);
}

#[test]
fn value_length_is_bounded() {
    assert!(Tlv::new(1u16, vec![0; usize::from(u16::MAX)]).is_ok());
    assert!(matches!(
        Tlv::new(1u16, vec![0; usize::from(u16::MAX) + 1]),
        Err(Error::MalformedInput(_))
    ));
}

#[test]
fn truncated_records_are_violations() {
    let tlv = Tlv::new(Short(7), vec![1, 2, 3, 4, 5]).unwrap();
    let bytes = tlv.serialize();

    for len in 0..bytes.len() {
        let err = Tlv::deserialize(&bytes[..len]).unwrap_err();
        assert!(err.is_protocol_violation(), "prefix of {len} bytes");
    }
}

#[test]
fn trailing_bytes_are_ignored() {
    let tlv = Tlv::new(Short(9), vec![0xfe; 3]).unwrap();
    let mut bytes = tlv.serialize();
    bytes.extend_from_slice(&[0, 0, 0]);
    assert_eq!(Tlv::deserialize(&bytes).unwrap(), tlv);
}

#[test]
fn unknown_message_type_is_rejected() {
    let tlv = Tlv::new(Short(1), vec![]).unwrap();
    assert!(SmpMessage::<G>::from_tlv(&tlv)
        .unwrap_err()
        .is_protocol_violation());

    let exchange = run_smp("a", "a");
    let retyped = Tlv::new(Stage::Four.tlv_type(), exchange.tlvs[0].value().to_vec()).unwrap();
    assert!(SmpMessage::<G>::from_tlv(&retyped).is_err());
}

#[test]
fn off_curve_point_is_rejected() {
    let exchange = run_smp("a", "a");
    let mut value = exchange.tlvs[3].value().to_vec();
    value[..64].copy_from_slice(&[0x01; 64]);
    let tlv = Tlv::new(Stage::Four.tlv_type(), value).unwrap();
    assert!(matches!(
        SmpMessage::<G>::from_tlv(&tlv),
        Err(Error::MalformedInput(_))
    ));
}
