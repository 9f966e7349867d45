mod common;

use blind_find::{BabyJubJub, Secret, SmpMessage, Tlv};
use common::run_smp;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn both_parties_agree_on_the_result(a in "[a-z]{0,8}", b in "[a-z]{0,8}") {
        let exchange = run_smp(&a, &b);
        let initiator = exchange.initiator.get_result().unwrap();
        let responder = exchange.responder.get_result().unwrap();

        prop_assert_eq!(initiator, responder);
        prop_assert_eq!(initiator, a == b);
    }

    #[test]
    fn equal_secrets_always_match(s in any::<u64>()) {
        let exchange = run_smp(&s.to_string(), &s.to_string());
        prop_assert!(exchange.initiator.get_result().unwrap());
    }
}

proptest! {
    #[test]
    fn tlv_decoding_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        if let Ok(tlv) = Tlv::deserialize(&bytes) {
            let encoded = tlv.serialize();
            prop_assert_eq!(&bytes[..encoded.len()], encoded.as_slice());
        }
        let _ = SmpMessage::<BabyJubJub>::deserialize(&bytes);
    }

    #[test]
    fn tlv_round_trips(tlv_type in any::<u16>(), value in proptest::collection::vec(any::<u8>(), 0..1024)) {
        let tlv = Tlv::new(tlv_type, value.clone()).unwrap();
        let decoded = Tlv::deserialize(&tlv.serialize()).unwrap();
        prop_assert_eq!(decoded.tlv_type().0, tlv_type);
        prop_assert_eq!(decoded.value(), value.as_slice());
    }

    #[test]
    fn secret_encodings_are_stable(text in ".{0,32}") {
        let a = Secret::from(text.as_str()).to_scalar::<BabyJubJub>();
        let b = Secret::from(text.clone()).to_scalar::<BabyJubJub>();
        prop_assert_eq!(a, b);
    }
}
