#![no_main]

use blind_find::{SmpStateMachine, Tlv};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut initiator: SmpStateMachine = SmpStateMachine::new("fuzz");
    let mut responder: SmpStateMachine = SmpStateMachine::new("fuzz");
    let _ = initiator.transit(None);

    if let Ok(tlv) = Tlv::deserialize(data) {
        let _ = initiator.transit(Some(&tlv));
        let _ = responder.transit(Some(&tlv));
    }
});
