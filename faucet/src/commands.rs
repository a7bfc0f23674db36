// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Execution of the subcommands

use std::fmt::Display;
use std::io::Write;
use std::path::Path;

use args::{Command, ControllerArg, FuzzerArg, GraphKind};
use color_eyre::eyre::{Result, WrapErr, bail};
use config::parser::config_hash;
use config::{ConfigHashes, ConfigWatcher, Dp, dp_parser};
use provision::{
    ContainerParamsBuilder, FuzzDriver, FuzzParamsBuilder, LaunchPaths, NetworkPlan,
    PlanParamsBuilder, Render,
};
use stack::Stack;
use topogen::{GeneratorParamsBuilder, TopoGenerator, Topology};
use tracing::warn;

fn load(file: &Path) -> Result<(ConfigHashes, Vec<Dp>)> {
    dp_parser(file, "faucet").wrap_err_with(|| format!("Invalid config {}", file.display()))
}

#[repr(transparent)]
struct Summary<'a>(&'a Dp);

impl Display for Summary<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dp = self.0;
        write!(
            f,
            "{}: dp_id {}, {} ports ({} stack), {} vlans, {} acls, {} routers",
            dp.name,
            dp.dp_id,
            dp.ports.len(),
            dp.stack_ports().count(),
            dp.vlans.len(),
            dp.acls.len(),
            dp.routers.len()
        )
    }
}

#[repr(transparent)]
struct RenderStack<'a>(&'a Stack);

impl Display for RenderStack<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stack = self.0;
        writeln!(
            f,
            "{}: {}, root {} (candidates {})",
            stack.name(),
            stack.placement(),
            stack.root_name(),
            stack.roots_names().join(",")
        )?;
        writeln!(
            f,
            "  path to root: {}",
            stack.shortest_path_to_root(None).join(" -> ")
        )?;
        writeln!(
            f,
            "  longest path to root: {}, flood reflection: {}, route learning: {}",
            stack.longest_path_to_root_len(),
            stack.root_flood_reflection(),
            stack.route_learning()
        )?;
        for port in stack.ports() {
            writeln!(
                f,
                "  port {} ({}) to {}:{} {}",
                port.number(),
                port.name(),
                port.peer().dp,
                port.peer().port,
                port.state()
            )?;
        }
        Ok(())
    }
}

fn check(file: &Path, hashes: bool, out: &mut impl Write) -> Result<()> {
    let (config_hashes, dps) = load(file)?;
    for dp in &dps {
        writeln!(out, "{}", Summary(dp))?;
    }
    if hashes {
        for (path, hash) in &config_hashes {
            writeln!(
                out,
                "{}: {}",
                path.display(),
                hash.as_deref().unwrap_or("missing")
            )?;
        }
    }
    writeln!(out, "{} is valid: {} datapaths", file.display(), dps.len())?;
    Ok(())
}

fn watch(file: &Path, interval: u64, rounds: Option<u64>, out: &mut impl Write) -> Result<()> {
    let mut watcher = ConfigWatcher::new();
    let mut round = 0;
    loop {
        if watcher.config_file().is_none() || watcher.files_changed() {
            match dp_parser(file, "watch") {
                Ok((hashes, dps)) => {
                    writeln!(out, "{}: {} datapaths", file.display(), dps.len())?;
                    watcher.update(file, hashes);
                }
                Err(e) => {
                    warn!("{} is invalid: {e}", file.display());
                    writeln!(out, "{}: {e}", file.display())?;
                    let hash = std::fs::read(file).ok().map(|c| config_hash(&c));
                    watcher.update(file, ConfigHashes::from([(file.to_path_buf(), hash)]));
                }
            }
            out.flush()?;
        }
        round += 1;
        if rounds.is_some_and(|r| round >= r) {
            return Ok(());
        }
        std::thread::sleep(std::time::Duration::from_secs(interval));
    }
}

fn stack(file: &Path, only: Option<&str>, graph: bool, out: &mut impl Write) -> Result<()> {
    let (_, dps) = load(file)?;
    let names: Vec<&str> = match only {
        Some(name) if dps.iter().any(|dp| dp.name == name) => vec![name],
        Some(name) => bail!("No DP named '{name}'"),
        None => dps.iter().map(|dp| dp.name.as_str()).collect(),
    };
    for name in names {
        match Stack::resolve(&dps, name, None)? {
            None => writeln!(out, "{name}: not stacked")?,
            Some(stack) => {
                write!(out, "{}", RenderStack(&stack))?;
                if graph {
                    write!(out, "{}", serde_yaml_ng::to_string(&stack.node_link_data())?)?;
                }
            }
        }
    }
    Ok(())
}

fn topology(kind: GraphKind, nodes: usize) -> Topology {
    match kind {
        GraphKind::Cycle => Topology::cycle(nodes),
        GraphKind::Path => Topology::path(nodes),
        GraphKind::Complete => Topology::complete(nodes),
        GraphKind::Star => Topology::star(nodes),
    }
}

fn plan(
    file: &Path,
    controller: Option<&ControllerArg>,
    cleanup: bool,
    out: &mut impl Write,
) -> Result<()> {
    let (_, dps) = load(file)?;
    let network = NetworkPlan::new(&dps)?;
    if cleanup {
        write!(out, "{}", network.cleanup())?;
        return Ok(());
    }
    let mut params = PlanParamsBuilder::default();
    if let Some(controller) = controller {
        params.controller(controller.address);
        if let Some(port) = controller.port {
            params.controller_port(port);
        }
    }
    write!(out, "{}", network.render(&params.build()?))?;
    Ok(())
}

fn launch(file: &Path, logdir: &Path, image: Option<&str>, out: &mut impl Write) -> Result<()> {
    load(file)?;
    let paths = LaunchPaths {
        config: std::path::absolute(file)?,
        logdir: std::path::absolute(logdir)?,
    };
    let mut params = ContainerParamsBuilder::default();
    if let Some(image) = image {
        params.image(image);
    }
    write!(out, "{}", params.build()?.render(&paths))?;
    Ok(())
}

pub(crate) fn run(command: &Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Check { file, hashes } => check(file, *hashes, out),
        Command::Show { file } => {
            let (_, dps) = load(file)?;
            for dp in &dps {
                write!(out, "{dp}")?;
            }
            Ok(())
        }
        Command::Watch {
            file,
            interval,
            rounds,
        } => watch(file, *interval, *rounds, out),
        Command::Stack { file, dp, graph } => stack(file, dp.as_deref(), *graph, out),
        Command::Generate {
            graph,
            nodes,
            no_stack,
            hosts,
            tagged_hosts,
            vlans,
            links,
            routing,
        } => {
            let params = GeneratorParamsBuilder::default()
                .stack(!*no_stack)
                .num_hosts(*hosts)
                .tagged_hosts(*tagged_hosts)
                .num_vlans(*vlans)
                .switch_to_switch_links(*links)
                .routing(*routing)
                .build()?;
            let generator = TopoGenerator::new(params, topology(*graph, usize::from(*nodes)));
            write!(out, "{}", generator.generate_yaml()?)?;
            Ok(())
        }
        Command::FuzzDict { out: path } => {
            let entries = topogen::write_dictionary(path)?;
            writeln!(out, "{}: {entries} entries", path.display())?;
            Ok(())
        }
        Command::FuzzCorpus { dir, max_nodes } => {
            let seeds = topogen::write_seed_corpus(dir, *max_nodes)?;
            writeln!(out, "{}: {seeds} seed configs", dir.display())?;
            Ok(())
        }
        Command::Fuzz {
            driver,
            dict,
            corpus,
            findings,
            memory,
            target,
        } => {
            let mut params = FuzzParamsBuilder::default();
            params
                .dictionary(dict.clone())
                .corpus(corpus.clone())
                .findings(findings.clone())
                .memory_mb(*memory);
            match driver {
                FuzzerArg::Afl => params.driver(FuzzDriver::Afl),
                FuzzerArg::Libfuzzer => params
                    .driver(FuzzDriver::LibFuzzer)
                    .target("fuzz_config_parser"),
            };
            if let Some(target) = target {
                params.target(target.clone());
            }
            write!(out, "{}", params.build()?.render(&()))?;
            Ok(())
        }
        Command::Plan {
            file,
            controller,
            cleanup,
        } => plan(file, controller.as_ref(), *cleanup, out),
        Command::Launch {
            file,
            logdir,
            image,
        } => launch(file, logdir, image.as_deref(), out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::EXAMPLE_CONFIG;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn output(command: &Command) -> Result<String> {
        let mut out = vec![];
        run(command, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("faucet.yaml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn generated(dir: &Path, graph: GraphKind, nodes: u16) -> PathBuf {
        let yaml = output(&Command::Generate {
            graph,
            nodes,
            no_stack: false,
            hosts: 1,
            tagged_hosts: 0,
            vlans: 2,
            links: 1,
            routing: true,
        })
        .unwrap();
        write_config(dir, &yaml)
    }

    #[test]
    fn test_check() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_config(dir.path(), EXAMPLE_CONFIG);
        let text = output(&Command::Check { file: file.clone(), hashes: true }).unwrap();
        assert!(text.starts_with("sw1: dp_id 1, 4 ports (0 stack)"));
        assert!(text.contains(&format!("{}: ", file.display())));
        assert!(text.ends_with("is valid: 1 datapaths\n"));

        let bad = write_config(dir.path(), "dps: {sw1: {dp_id: 0}}");
        let err = output(&Command::Check { file: bad, hashes: false }).unwrap_err();
        assert!(err.to_string().starts_with("Invalid config"));
    }

    #[test]
    fn test_watch() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_config(dir.path(), "dps: {sw1: {dp_id: 0}}");
        let command = Command::Watch {
            file: file.clone(),
            interval: 0,
            rounds: Some(2),
        };
        let text = output(&command).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("invalid dp_id"));

        write_config(dir.path(), EXAMPLE_CONFIG);
        let text = output(&command).unwrap();
        assert_eq!(text, format!("{}: 1 datapaths\n", file.display()));
    }

    #[test]
    fn test_generate_and_stack() {
        let dir = tempfile::tempdir().unwrap();
        let file = generated(dir.path(), GraphKind::Path, 3);
        let text = output(&Command::Stack {
            file: file.clone(),
            dp: Some("s3".to_owned()),
            graph: true,
        })
        .unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("s3: EDGE, root s1 (candidates s1)"));
        assert_eq!(lines.next(), Some("  path to root: s3 -> s2 -> s1"));
        assert!(text.contains("multigraph"));

        assert!(
            output(&Command::Stack {
                file,
                dp: Some("s9".to_owned()),
                graph: false,
            })
            .is_err()
        );
    }

    #[test]
    fn test_plan() {
        let dir = tempfile::tempdir().unwrap();
        let file = generated(dir.path(), GraphKind::Cycle, 3);
        let text = output(&Command::Plan {
            file: file.clone(),
            controller: Some(ControllerArg {
                address: "192.0.2.1".parse().unwrap(),
                port: None,
            }),
            cleanup: false,
        })
        .unwrap();
        assert_eq!(text.matches("--may-exist add-br").count(), 3);
        assert!(text.contains("set-controller br3 tcp:192.0.2.1:6653"));
        assert!(text.contains("type=patch"));

        let cleanup = output(&Command::Plan {
            file,
            controller: None,
            cleanup: true,
        })
        .unwrap();
        assert!(cleanup.contains("ovs-vsctl --if-exists del-br br2"));
    }

    #[test]
    fn test_launch() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_config(dir.path(), EXAMPLE_CONFIG);
        let text = output(&Command::Launch {
            file: file.clone(),
            logdir: dir.path().join("logs"),
            image: None,
        })
        .unwrap();
        assert!(text.contains(&format!("{}:/etc/faucet/faucet.yaml:ro", file.display())));
        assert!(text.contains("-p 6653:6653 -p 9302:9302 faucet/faucet:latest"));
    }

    #[test]
    fn test_fuzz_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let dict = dir.path().join("config.dict");
        let text = output(&Command::FuzzDict { out: dict.clone() }).unwrap();
        assert!(text.contains("entries"));
        assert!(std::fs::read_to_string(&dict).unwrap().contains("\"dp_id\""));

        let corpus = dir.path().join("corpus");
        output(&Command::FuzzCorpus {
            dir: corpus.clone(),
            max_nodes: 3,
        })
        .unwrap();
        for seed in std::fs::read_dir(&corpus).unwrap() {
            let content = std::fs::read_to_string(seed.unwrap().path()).unwrap();
            assert!(config::parse_str(&content).is_ok());
        }

        let text = output(&Command::Fuzz {
            driver: FuzzerArg::Libfuzzer,
            dict: dict.clone(),
            corpus: corpus.clone(),
            findings: PathBuf::from("findings"),
            memory: 2048,
            target: None,
        })
        .unwrap();
        assert!(text.contains("cargo fuzz run fuzz_config_parser"));
        assert!(text.contains("-rss_limit_mb=2048"));
    }
}
