#![no_main]

use blind_find::{BabyJubJub, SmpMessage, Tlv};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(tlv) = Tlv::deserialize(data) {
        let _ = SmpMessage::<BabyJubJub>::from_tlv(&tlv);
    }
});
