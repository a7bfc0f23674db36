// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![no_main]

use libfuzzer_sys::fuzz_target;

/// Any document either validates or is rejected with a `ConfigError`; the parser never
/// panics, and a validated model can always be displayed.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(dps) = config::parse_str(text) {
        assert!(!dps.is_empty());
        for dp in &dps {
            let _ = dp.to_string();
        }
    }
});
