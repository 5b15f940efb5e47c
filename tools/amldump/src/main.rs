//! `amldump`: parse a DSDT/SSDT image and print its AML syntax tree.
//!
//! The input is a raw table image as dumped by `acpidump -b` or read from
//! `/sys/firmware/acpi/tables`. With `--raw` the file is taken to be a bare
//! AML body without the 36-byte header.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use hadron_aml::name::decode_name;
use hadron_aml::{AmlNode, AmlPath, AmlValue, DefinitionBlock, EisaId, MethodTable, NodeKind};

/// Dump the AML syntax tree of a DSDT or SSDT.
#[derive(Parser, Debug)]
#[command(name = "amldump", version, about)]
struct Cli {
    /// Table image to parse.
    file: PathBuf,

    /// Treat the file as a bare AML body without a table header.
    #[arg(long)]
    raw: bool,

    /// Additional tables whose method declarations are in scope.
    #[arg(long = "with", value_name = "TABLE")]
    with: Vec<PathBuf>,

    /// List devices and their hardware IDs instead of the tree.
    #[arg(long, short = 'd')]
    devices: bool,

    /// Do not print nodes deeper than this.
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();
    log::debug!("cli: {cli:?}");

    let image = read(&cli.file)?;
    let body = if cli.raw {
        image.as_slice()
    } else {
        let block = DefinitionBlock::new(&image)
            .with_context(|| format!("validating {}", cli.file.display()))?;
        let header = block.header();
        println!(
            "{} rev {} OEM {:?} table {:?} ({} bytes)",
            header.signature_str(),
            header.revision,
            String::from_utf8_lossy(&header.oem_id),
            String::from_utf8_lossy(&header.oem_table_id),
            header.length,
        );
        block.aml()
    };

    let mut methods = MethodTable::scan(body);
    for path in &cli.with {
        let extra = read(path)?;
        let block = DefinitionBlock::new(&extra)
            .with_context(|| format!("validating {}", path.display()))?;
        for signature in block.scan_methods().iter() {
            methods.insert(*signature, true);
        }
    }
    log::info!("{} method signatures in scope", methods.len());

    let tree = match hadron_aml::parse_term_list(body, &methods) {
        Ok(tree) => tree,
        Err(err) => bail!("{}: {err}", cli.file.display()),
    };

    if cli.devices {
        list_devices(&tree, &AmlPath::ROOT);
    } else {
        print!("{}", tree.display(cli.max_depth));
    }
    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

/// Prints every `Device` below `node` with its `_HID`, if it has a literal one.
fn list_devices(node: &AmlNode<'_>, scope: &AmlPath) {
    for term in node.children() {
        let Some(object) = term.child(0).and_then(|class| class.child(0)) else {
            continue;
        };
        match object.kind() {
            NodeKind::DefScope
            | NodeKind::DefDevice
            | NodeKind::DefProcessor
            | NodeKind::DefPowerRes
            | NodeKind::DefThermalZone => {}
            _ => continue,
        }

        let Some(path) = object
            .child(1)
            .and_then(decode_name)
            .and_then(|name| scope.resolve(&name))
        else {
            log::warn!("cannot resolve {:?} in {scope}", object.kind());
            continue;
        };

        let Some(body) = object.children().last() else {
            continue;
        };
        if object.kind() == NodeKind::DefDevice {
            match hardware_id(body) {
                Some(hid) => println!("{path} {hid}"),
                None => println!("{path}"),
            }
        }
        list_devices(body, &path);
    }
}

/// Finds `Name (_HID, ...)` directly in a device body.
fn hardware_id(body: &AmlNode<'_>) -> Option<String> {
    body.children().iter().find_map(|term| {
        let def = term.child(0)?.child(0)?;
        if def.kind() != NodeKind::DefName {
            return None;
        }
        let name = decode_name(def.child(0)?)?;
        if name.last()?.as_str() != "_HID" {
            return None;
        }
        match AmlValue::from_node(def.child(1)?) {
            AmlValue::Integer(value) => Some(
                EisaId::from_integer(value)
                    .map_or_else(|| format!("{value:#x}"), |id| id.to_string()),
            ),
            AmlValue::String(text) => Some(text.to_owned()),
            _ => None,
        }
    })
}
