#![no_main]

use layerscan_core::{FeatureExtractor, LayerFiles};
use layerscan_featurefmt::{DPKG_STATUS_PATH, DpkgExtractor};
use libfuzzer_sys::fuzz_target;

// 임의 바이트(잘못된 UTF-8 포함)에서도 패닉 없이 결정적인 결과를 내야 함
fuzz_target!(|data: &[u8]| {
    let extractor = DpkgExtractor::default();
    let mut files = LayerFiles::new();
    files.insert(DPKG_STATUS_PATH.to_owned(), data.to_vec().into());

    let first = extractor.extract(&files);
    let second = extractor.extract(&files);
    assert_eq!(first, second);
    assert!(first.iter().all(|f| !f.name.is_empty() && !f.version.is_empty()));
});
