// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use faucet_config::internal::build::SUPPORTED_HARDWARE;
use faucet_config::{ConfigError, EXAMPLE_CONFIG, dp_parser, parse_str};
use net::openflow::PortNo;
use net::vlan::Vid;
use pretty_assertions::assert_eq;
use std::path::Path;
use tracing_test::traced_test;

fn vid(raw: u16) -> Vid {
    Vid::new(raw).unwrap()
}
fn port(raw: u32) -> PortNo {
    PortNo::new(raw).unwrap()
}

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn example_config_is_valid() {
    let dps = parse_str(EXAMPLE_CONFIG).unwrap();
    assert_eq!(dps.len(), 1);
    let sw1 = &dps[0];
    assert_eq!(sw1.name, "sw1");
    assert_eq!(sw1.dp_id.as_u64(), 1);
    assert_eq!(sw1.hardware, SUPPORTED_HARDWARE[0]);
    assert_eq!(sw1.ports.len(), 4);
    assert_eq!(sw1.ports[&port(1)].native_vlan, Some(vid(100)));
    assert_eq!(sw1.ports[&port(4)].tagged_vlans, vec![vid(100), vid(200)]);
    assert_eq!(
        sw1.acls.keys().collect::<Vec<_>>(),
        vec!["access-port-protect", "office-vlan-protect"]
    );
    assert_eq!(sw1.acls["access-port-protect"].rules.len(), 5);
    assert!(sw1.routers.contains_key("office-guest"));
    assert!(sw1.has_vips());

    let shown = sw1.to_string();
    assert!(shown.contains("DP sw1"));
    assert!(shown.contains("acl access-port-protect"));
}

#[test]
fn referential_errors() {
    let missing_vlan = r"
dps:
  sw1:
    dp_id: 1
    interfaces:
      1: {native_vlan: nowhere}
";
    assert!(matches!(
        parse_str(missing_vlan),
        Err(ConfigError::NoSuchVlan(_, v)) if v == "nowhere"
    ));

    let missing_acl = r"
vlans:
  office: {vid: 100, acl_in: nothing}
dps:
  sw1:
    dp_id: 1
    interfaces:
      1: {native_vlan: office}
";
    assert!(matches!(
        parse_str(missing_acl),
        Err(ConfigError::NoSuchAcl(_, a)) if a == "nothing"
    ));
}

#[test]
fn implicit_vlans() {
    let yaml = r"
dps:
  sw1:
    dp_id: 1
    interfaces:
      1: {native_vlan: 300}
      2: {tagged_vlans: [300, 301]}
";
    let dps = parse_str(yaml).unwrap();
    let vlans = &dps[0].vlans;
    assert_eq!(vlans.len(), 2);
    assert!(vlans[&vid(300)].implicit);
    assert_eq!(vlans[&vid(301)].name, "301");
}

#[test]
fn datapath_errors() {
    assert_eq!(parse_str("vlans: {v: {vid: 1}}"), Err(ConfigError::NoDatapaths));
    assert!(matches!(
        parse_str("dps: {a: {dp_id: 1}, b: {dp_id: 1}}"),
        Err(ConfigError::DuplicateDpId(a, b, 1)) if a == "a" && b == "b"
    ));
    assert!(matches!(
        parse_str("dps: {a: {dp_id: 0}}"),
        Err(ConfigError::InvalidDpId(..))
    ));
    assert!(matches!(
        parse_str("dps: {a: {dp_id: 1, hardware: Toaster}}"),
        Err(ConfigError::UnsupportedHardware(..))
    ));
    assert_eq!(
        parse_str("version: 3\ndps: {a: {dp_id: 1}}"),
        Err(ConfigError::UnsupportedVersion(3))
    );
    assert!(matches!(
        parse_str("dps: {a: {dp_id: 1, flavour: vanilla}}"),
        Err(ConfigError::UnknownKey(_))
    ));
    assert!(matches!(parse_str("hello"), Err(ConfigError::Yaml(_))));
}

#[test]
fn port_errors() {
    let native_tagged = r"
vlans: {office: {vid: 100}}
dps:
  sw1:
    dp_id: 1
    interfaces:
      1: {native_vlan: office, tagged_vlans: [100]}
";
    assert!(matches!(
        parse_str(native_tagged),
        Err(ConfigError::NativeVlanTagged { vid: 100, .. })
    ));

    let dup_number = r"
dps:
  sw1:
    dp_id: 1
    interfaces:
      1: {native_vlan: 100}
      uplink: {number: 1, native_vlan: 100}
";
    assert!(matches!(
        parse_str(dup_number),
        Err(ConfigError::DuplicatePortNumber(_, 1))
    ));

    let dup_name = r"
dps:
  sw1:
    dp_id: 1
    interfaces:
      1: {name: h, native_vlan: 100}
      2: {name: h, native_vlan: 100}
";
    assert!(matches!(
        parse_str(dup_name),
        Err(ConfigError::DuplicatePortName(_, n)) if n == "h"
    ));

    let no_number = "dps: {sw1: {dp_id: 1, interfaces: {uplink: {native_vlan: 100}}}}";
    assert!(matches!(
        parse_str(no_number),
        Err(ConfigError::MissingPortNumber { .. })
    ));
}

#[test]
fn interface_ranges() {
    let yaml = r"
dps:
  sw1:
    dp_id: 1
    interfaces:
      2: {name: special, native_vlan: 200}
    interface_ranges:
      1-4: {native_vlan: 100}
      6,8: {tagged_vlans: [100, 200]}
";
    let dps = parse_str(yaml).unwrap();
    let ports = &dps[0].ports;
    assert_eq!(ports.len(), 6);
    assert_eq!(ports[&port(2)].name, "special");
    assert_eq!(ports[&port(2)].native_vlan, Some(vid(200)));
    assert_eq!(ports[&port(3)].native_vlan, Some(vid(100)));
    assert_eq!(ports[&port(8)].tagged_vlans.len(), 2);

    let bad = "dps: {sw1: {dp_id: 1, interface_ranges: {'4-1': {native_vlan: 1}}}}";
    assert!(matches!(
        parse_str(bad),
        Err(ConfigError::InvalidPortRange(..))
    ));
}

const STACK: &str = r"
dps:
  sw1:
    dp_id: 1
    stack: {priority: 1}
    interfaces:
      1: {native_vlan: 100}
      5: {stack: {dp: sw2, port: 5}}
  sw2:
    dp_id: 2
    interfaces:
      1: {native_vlan: 100}
      peer: {number: 5, stack: {dp: sw1, port: 5}}
";

#[test]
fn stack_links() {
    let dps = parse_str(STACK).unwrap();
    let sw1 = &dps[0];
    let sw2 = &dps[1];
    assert!(sw1.is_root_candidate());
    assert!(!sw2.is_root_candidate());
    let peer = sw1.ports[&port(5)].stack.as_ref().unwrap();
    assert_eq!((peer.dp.as_str(), peer.port), ("sw2", port(5)));
    assert_eq!(sw2.stack_ports().count(), 1);

    let one_way = STACK.replace("peer: {number: 5, stack: {dp: sw1, port: 5}}", "5: {}");
    assert!(matches!(
        parse_str(&one_way),
        Err(ConfigError::StackPeerMismatch { .. })
    ));
    let unknown_dp = STACK.replace("dp: sw2", "dp: sw9");
    assert!(matches!(
        parse_str(&unknown_dp),
        Err(ConfigError::NoSuchStackDp { .. })
    ));
    let with_vlan = STACK.replace("5: {stack:", "5: {native_vlan: 100, stack:");
    assert!(matches!(
        parse_str(&with_vlan),
        Err(ConfigError::StackPortWithVlans { .. })
    ));
}

#[test]
fn stack_topology_errors() {
    let no_root = STACK.replace("    stack: {priority: 1}\n", "");
    assert_eq!(parse_str(&no_root), Err(ConfigError::NoStackRoot));

    let island = format!(
        "{STACK}  sw3:\n    dp_id: 3\n    interfaces:\n      1: {{stack: {{dp: sw4, port: 1}}}}\n  sw4:\n    dp_id: 4\n    interfaces:\n      1: {{stack: {{dp: sw3, port: 1}}}}\n"
    );
    assert_eq!(
        parse_str(&island),
        Err(ConfigError::StackNotConnected("sw3".to_owned(), "sw1".to_owned()))
    );

    // a priority on a DP without stack ports does not make a root for the others
    let lonely_root = STACK
        .replace("    stack: {priority: 1}\n", "")
        .replace("  sw2:\n    dp_id: 2\n", "  sw0:\n    dp_id: 9\n    stack: {priority: 1}\n  sw2:\n    dp_id: 2\n");
    assert_eq!(
        parse_str(&lonely_root),
        Err(ConfigError::StackNotConnected("sw1".to_owned(), "sw0".to_owned()))
    );
}

#[test]
#[traced_test]
fn includes_are_merged_and_hashed() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "acls.yaml", "acls:\n  allow-all:\n    - rule: {actions: {allow: 1}}\n");
    write(dir.path(), "vlans.yaml", "include: [acls.yaml]\nvlans:\n  office: {vid: 100, acl_in: allow-all}\n");
    let main = write(
        dir.path(),
        "faucet.yaml",
        r"
include: [vlans.yaml]
include_optional: [missing.yaml]
dps:
  sw1:
    dp_id: 1
    interfaces:
      1: {native_vlan: office}
",
    );
    let (hashes, dps) = dp_parser(&main, "test").unwrap();
    assert_eq!(hashes.len(), 4);
    assert_eq!(hashes.values().filter(|h| h.is_none()).count(), 1);
    assert!(hashes.values().flatten().all(|h| h.len() == 64));
    assert_eq!(dps[0].acls.len(), 1);
    assert_eq!(dps[0].vlans[&vid(100)].acls_in, vec!["allow-all".to_owned()]);
}

#[test]
fn include_errors() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.yaml", "include: [b.yaml]\ndps: {sw1: {dp_id: 1}}\n");
    write(dir.path(), "b.yaml", "include: [a.yaml]\n");
    let cycle = dp_parser(&a, "test").unwrap_err();
    assert!(matches!(cycle, ConfigError::IncludeCycle(_)));
    assert!(cycle.to_string().ends_with(".yaml is included recursively"));

    let c = write(dir.path(), "c.yaml", "include: [gone.yaml]\ndps: {sw1: {dp_id: 1}}\n");
    let missing = dp_parser(&c, "test").unwrap_err();
    assert!(matches!(missing, ConfigError::Io(..)));
    assert!(missing.to_string().contains("gone.yaml"));

    write(dir.path(), "d.yaml", "dps: {sw1: {dp_id: 2}}\n");
    let e = write(dir.path(), "e.yaml", "include: [d.yaml]\ndps: {sw1: {dp_id: 1}}\n");
    assert_eq!(
        dp_parser(&e, "test").map(|_| ()),
        Err(ConfigError::DuplicateKey {
            section: "dps".to_owned(),
            key: "sw1".to_owned()
        })
    );

    assert_eq!(
        parse_str("include: [x.yaml]\ndps: {sw1: {dp_id: 1}}"),
        Err(ConfigError::IncludeWithoutFile)
    );
}

#[test]
fn parser_never_panics() {
    bolero::check!()
        .with_type()
        .for_each(|input: &String| {
            let _ = parse_str(input);
        });
}

#[test]
fn mutated_example_never_panics() {
    bolero::check!()
        .with_type()
        .for_each(|(pos, byte): &(usize, u8)| {
            let mut input = EXAMPLE_CONFIG.as_bytes().to_vec();
            let at = pos % input.len();
            input[at] = *byte;
            if let Ok(text) = std::str::from_utf8(&input) {
                let _ = parse_str(text);
            }
        });
}
