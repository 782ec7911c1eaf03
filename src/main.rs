mod debug_report;

use fdtregion::{Fdt, RegionFlags, Selector, digest_found, find_regions_verbose, is_node_path};
use sha2::Sha256;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "FDTREGION_LOG";

fn main() {
    init_tracing();

    let config = match parse_args(std::env::args().skip(1)) {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help) => {
            print_help();
            return;
        }
        Ok(Command::Version) => {
            println!("fdtregion {}", env!("CARGO_PKG_VERSION"));
            return;
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(&config) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn run(config: &CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    let blob = load_blob(&config.path)?;
    let fdt = Fdt::new(&blob)?;
    let mut selector = config.selector.clone();

    let report = find_regions_verbose(&fdt, &mut selector, config.flags)?;
    let digest = if config.hash {
        let digest = digest_found::<Sha256>(&fdt, &report.regions)?;
        Some(digest.iter().map(|b| format!("{b:02x}")).collect::<String>())
    } else {
        None
    };

    debug_report::print_report(&config.path.display().to_string(), &fdt, &report, digest.as_deref(), config.color);
    Ok(())
}

fn load_blob(path: &Path) -> Result<Vec<u8>, String> {
    std::fs::read(path).map_err(|err| format!("failed to read {}: {err}", path.display()))
}

#[derive(Debug)]
enum Command {
    Run(CliConfig),
    Help,
    Version,
}

#[derive(Debug)]
struct CliConfig {
    path: PathBuf,
    selector: Selector,
    flags: RegionFlags,
    hash: bool,
    color: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Command, String> {
    let mut path: Option<PathBuf> = None;
    let mut selector = Selector::new();
    let mut flags = RegionFlags::empty();
    let mut hash = false;
    let mut color = io::stdout().is_terminal();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let (name, inline) = match arg.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };
        let mut value = |flag: &str| -> Result<String, String> {
            inline.clone().or_else(|| args.next()).ok_or_else(|| format!("error: {flag} expects a value"))
        };

        match name.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-V" | "--version" => return Ok(Command::Version),
            "--color" => color = true,
            "--no-color" => color = false,
            "--hash" => hash = true,
            "-d" | "--direct-subnodes" => flags |= RegionFlags::DIRECT_SUBNODES,
            "-a" | "--all-subnodes" => flags |= RegionFlags::ALL_SUBNODES,
            "-s" | "--supernodes" => flags |= RegionFlags::SUPERNODES,
            "-t" | "--strings" => flags |= RegionFlags::ADD_STRING_TABLE,
            "-n" | "--node" => {
                let node = value("--node")?;
                if !is_node_path(&node) {
                    return Err(format!("error: invalid node path '{node}' (expected e.g. /images/kernel@1)"));
                }
                selector = selector.node(node);
            }
            "-g" | "--glob" => {
                let glob = value("--glob")?;
                selector = selector.node_glob(&glob).map_err(|err| format!("error: invalid --glob '{glob}': {err}"))?;
            }
            "-p" | "--prop" => selector = selector.include_property(value("--prop")?),
            "-P" | "--exclude-prop" => selector = selector.exclude_property(value("--exclude-prop")?),
            _ if name.starts_with('-') => return Err(format!("error: unknown option '{arg}'")),
            _ => {
                if path.is_some() {
                    return Err("error: more than one input file".to_string());
                }
                path = Some(PathBuf::from(arg));
            }
        }
    }

    let Some(path) = path else {
        return Err(format!("error: no input file\n\n{}", help_text()));
    };
    if selector.is_empty() {
        selector = selector.node("/");
    }

    Ok(Command::Run(CliConfig { path, selector, flags, hash, color }))
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "fdtregion {version}

List the byte regions of a device tree blob that hold the selected nodes and
properties.

Usage:
  fdtregion [OPTIONS] <file.dtb>

Selection:
  -n, --node <path>          Include the node at <path>. Repeatable.
  -g, --glob <pattern>       Include nodes whose path matches <pattern>
                             ('*' within a component, '**' across).
  -p, --prop <name>          Always include properties called <name>.
  -P, --exclude-prop <name>  Never include properties called <name>.
                             With no -n/-g/-p, the root node is selected.

Flags:
  -d, --direct-subnodes      Include direct children of selected nodes as skeletons.
  -a, --all-subnodes         Include whole subtrees of selected nodes.
  -s, --supernodes           Include the enclosing tags of every selected node.
  -t, --strings              Append the strings block.

Output:
  --hash                     Print the SHA-256 of the selected bytes.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  {log_env}               Log filter (e.g. debug, fdtregion=trace). Default: warn

Exit codes:
  0  Success.
  1  Unreadable or corrupt blob.
  2  Invalid arguments.
",
        version = env!("CARGO_PKG_VERSION"),
        log_env = LOG_ENV,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdtregion::{FdtBuilder, Include, Item, Verdict, find_regions};
    use std::io::Write;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn run_config(list: &[&str]) -> CliConfig {
        match parse_args(args(list)).unwrap() {
            Command::Run(config) => config,
            other => panic!("expected a run config, got {other:?}"),
        }
    }

    #[test]
    fn parses_selection_and_flags() {
        let mut config = run_config(&[
            "-n",
            "/images/kernel@1",
            "--glob=/images/*/hash@*",
            "-P",
            "data",
            "-d",
            "--supernodes",
            "-t",
            "--hash",
            "--no-color",
            "image.itb",
        ]);

        assert_eq!(config.path, PathBuf::from("image.itb"));
        assert_eq!(
            config.flags,
            RegionFlags::DIRECT_SUBNODES | RegionFlags::SUPERNODES | RegionFlags::ADD_STRING_TABLE
        );
        assert!(config.hash);
        assert!(!config.color);
        assert!(config.selector.selects_node("/images/kernel@1"));
        assert!(config.selector.selects_node("/images/fdt@1/hash@1"));
        assert_eq!(config.selector.include(Item::Property { name: "data", len: 4 }).unwrap(), Verdict::Exclude);
    }

    #[test]
    fn defaults_to_the_root_node() {
        let config = run_config(&["board.dtb"]);
        assert!(config.selector.selects_node("/"));
        assert!(!config.selector.selects_node("/chosen"));
        assert_eq!(config.flags, RegionFlags::empty());
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(parse_args(args(&[])).unwrap_err().contains("no input file"));
        assert!(parse_args(args(&["a.dtb", "b.dtb"])).unwrap_err().contains("more than one"));
        assert!(parse_args(args(&["--bogus", "a.dtb"])).unwrap_err().contains("unknown option"));
        assert!(parse_args(args(&["a.dtb", "-n"])).unwrap_err().contains("--node expects a value"));
        assert!(parse_args(args(&["-n", "images", "a.dtb"])).unwrap_err().contains("invalid node path"));
        assert!(matches!(parse_args(args(&["-h", "a.dtb"])), Ok(Command::Help)));
        assert!(matches!(parse_args(args(&["--version"])), Ok(Command::Version)));
    }

    #[test]
    fn loads_blob_from_disk() {
        let mut b = FdtBuilder::new();
        b.finish_reservations().unwrap();
        b.begin_node("").unwrap();
        b.property_string("model", "test-board").unwrap();
        b.end_node().unwrap();
        let blob = b.finish().unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&blob).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let mut config = run_config(&[path.as_str()]);
        let loaded = load_blob(&config.path).unwrap();
        assert_eq!(loaded, blob);

        let fdt = Fdt::new(&loaded).unwrap();
        let regions = find_regions(&fdt, &mut config.selector, config.flags).unwrap();
        assert_eq!(regions.last().map(|f| f.region.end()), Some(fdt.structure_block().end()));

        let missing = file.path().with_extension("missing");
        assert!(load_blob(&missing).unwrap_err().contains("failed to read"));
    }
}
