// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![no_main]

use libfuzzer_sys::fuzz_target;
use stack::Stack;

/// Resolving the stack of any valid document never panics, and a resolved stack always
/// routes towards its root.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(dps) = config::parse_str(text) else {
        return;
    };
    for dp in &dps {
        let Ok(Some(stack)) = Stack::resolve(&dps, &dp.name, None) else {
            continue;
        };
        assert!(stack.graph().has_node(stack.root_name()));
        let path = stack.shortest_path_to_root(None);
        if let Some(last) = path.last() {
            assert_eq!(last, stack.root_name());
            assert_eq!(path.first(), Some(&dp.name));
        }
    }
});
