#![no_main]

use layerscan_featurefmt::read_stanzas;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        for stanza in read_stanzas(content) {
            assert!(stanza.contains("Package"));
        }
    }
});
