// Copyright 2026 the Morpha Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![doc = "Code generator for `morpha` opcode tables.\n\n\
          This is a std-only build tool crate. It is not shipped as part of the core runtime.\n"]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

#[derive(Deserialize, Clone)]
struct Spec {
    version: u32,
    opcodes: Vec<OpcodeSpec>,
}

#[derive(Deserialize, Clone)]
struct OpcodeSpec {
    name: String,
    mnemonic: String,
    byte: String,
    kind: String,
    arity: u8,
    doc: Option<String>,
}

fn parse_u8_hex(s: &str) -> Result<u8> {
    let s = s.trim();
    let raw = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u8::from_str_radix(raw, 16).with_context(|| format!("invalid opcode byte '{s}'"))
}

fn fmt_hex_u8(b: u8) -> String {
    format!("0x{b:02X}")
}

fn sort_and_validate_ops(ops: &mut [(u8, OpcodeSpec)]) -> Result<()> {
    ops.sort_by(|(b0, o0), (b1, o1)| b0.cmp(b1).then_with(|| o0.name.cmp(&o1.name)));

    for w in ops.windows(2) {
        let (b0, o0) = &w[0];
        let (b1, o1) = &w[1];
        if b0 == b1 {
            bail!(
                "duplicate opcode byte {}: {} and {}",
                fmt_hex_u8(*b0),
                o0.name,
                o1.name
            );
        }
        if o0.name == o1.name {
            bail!("duplicate opcode name '{}'", o0.name);
        }
    }
    Ok(())
}

fn kind_rust(kind: &str) -> Result<&'static str> {
    Ok(match kind {
        "morph" => "EntityKind::Morph",
        "rule" => "EntityKind::Rule",
        "halt" => "EntityKind::Halt",
        other => bail!("unknown entity kind '{other}'"),
    })
}

/// Header words reserve two mode bits per operand inside one byte.
const MAX_ARITY: u8 = 4;

fn validate_arity(ops: &[(u8, OpcodeSpec)]) -> Result<()> {
    for (_b, op) in ops {
        if op.arity > MAX_ARITY {
            bail!(
                "opcode {} declares arity {} (max {MAX_ARITY})",
                op.name,
                op.arity
            );
        }
        if op.kind == "rule" && op.arity != 0 {
            bail!("rule opcode {} must not declare fixed operands", op.name);
        }
        if op.kind == "halt" && op.arity != 1 {
            bail!("halt opcode {} must take exactly one operand", op.name);
        }
    }
    Ok(())
}

fn generate(spec: Spec, src: &Path) -> Result<String> {
    if spec.version != 1 {
        bail!("unsupported opcodes.json version {}", spec.version);
    }

    let mut ops: Vec<(u8, OpcodeSpec)> = Vec::with_capacity(spec.opcodes.len());
    for op in spec.opcodes {
        let b = parse_u8_hex(&op.byte)?;
        ops.push((b, op));
    }

    sort_and_validate_ops(&mut ops)?;
    validate_arity(&ops)?;

    let mut out = String::new();
    out.push_str("// Copyright 2026 the Morpha Authors\n");
    out.push_str("// SPDX-License-Identifier: Apache-2.0 OR MIT\n\n");
    out.push_str("// @generated by morpha_codegen. Do not edit by hand.\n");
    let source = src
        .file_name()
        .map_or_else(|| src.display().to_string(), |n| n.to_string_lossy().into_owned());
    out.push_str(&format!("// Source: {source}\n"));
    out.push('\n');

    out.push_str("/// The kind of entity introduced by a header word.\n");
    out.push_str("#[derive(Copy, Clone, Debug, PartialEq, Eq)]\n");
    out.push_str("pub enum EntityKind {\n");
    out.push_str("    /// A fixed-arity operation.\n");
    out.push_str("    Morph,\n");
    out.push_str("    /// Condition/action arms plus a default.\n");
    out.push_str("    Rule,\n");
    out.push_str("    /// The terminal marker of a composition.\n");
    out.push_str("    Halt,\n");
    out.push_str("}\n\n");

    out.push_str("/// Header opcode byte for the bootstrap instruction set.\n");
    out.push_str("#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]\n");
    out.push_str("#[repr(u8)]\n");
    out.push_str("pub enum Opcode {\n");
    for (b, op) in &ops {
        let doc = op
            .doc
            .as_deref()
            .with_context(|| format!("missing doc for opcode {}", op.name))?;
        for line in doc.lines() {
            out.push_str(&format!("    /// {line}\n"));
        }
        out.push_str(&format!("    {} = {},\n", op.name, fmt_hex_u8(*b)));
    }
    out.push_str("}\n\n");

    out.push_str("impl Opcode {\n");
    out.push_str("    /// Every opcode, in byte order.\n");
    out.push_str(&format!("    pub const ALL: [Self; {}] = [\n", ops.len()));
    for (_, op) in &ops {
        out.push_str(&format!("        Self::{},\n", op.name));
    }
    out.push_str("    ];\n\n");

    out.push_str("    /// Decodes an opcode byte.\n");
    out.push_str("    #[must_use]\n");
    out.push_str("    pub fn from_u8(b: u8) -> Option<Self> {\n");
    out.push_str("        Some(match b {\n");
    for (b, op) in &ops {
        out.push_str(&format!(
            "            {} => Self::{},\n",
            fmt_hex_u8(*b),
            op.name
        ));
    }
    out.push_str("            _ => return None,\n");
    out.push_str("        })\n");
    out.push_str("    }\n");

    out.push_str("\n    /// Stable, parseable opcode name.\n");
    out.push_str("    ///\n");
    out.push_str("    /// This string is used by the disassembler output.\n");
    out.push_str("    #[must_use]\n");
    out.push_str("    pub fn mnemonic(self) -> &'static str {\n");
    out.push_str("        match self {\n");
    for (_, op) in &ops {
        out.push_str(&format!(
            "            Self::{} => \"{}\",\n",
            op.name, op.mnemonic
        ));
    }
    out.push_str("        }\n");
    out.push_str("    }\n");

    out.push_str("\n    /// Number of operand words that follow the header word.\n");
    out.push_str("    #[must_use]\n");
    out.push_str("    pub fn arity(self) -> usize {\n");
    out.push_str("        match self {\n");
    for (_, op) in &ops {
        out.push_str(&format!("            Self::{} => {},\n", op.name, op.arity));
    }
    out.push_str("        }\n");
    out.push_str("    }\n");

    out.push_str("\n    /// Returns the kind of entity this opcode introduces.\n");
    out.push_str("    #[must_use]\n");
    out.push_str("    pub fn kind(self) -> EntityKind {\n");
    out.push_str("        match self {\n");
    for (_, op) in &ops {
        out.push_str(&format!(
            "            Self::{} => {},\n",
            op.name,
            kind_rust(&op.kind)?
        ));
    }
    out.push_str("        }\n");
    out.push_str("    }\n");
    out.push_str("}\n");

    Ok(out)
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let spec_path: PathBuf = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("morpha/opcodes.json"));
    let opcode_out_path: PathBuf = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("morpha/src/opcodes_gen.rs"));
    if args.next().is_some() {
        bail!("usage: morpha_codegen [spec.json] [opcodes_out.rs]");
    }

    let json =
        fs::read_to_string(&spec_path).with_context(|| format!("read {}", spec_path.display()))?;
    let spec: Spec =
        serde_json::from_str(&json).with_context(|| format!("parse {}", spec_path.display()))?;

    let opcode_rendered = generate(spec, &spec_path)?;

    if let Some(parent) = opcode_out_path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(&opcode_out_path, opcode_rendered.as_bytes())
        .with_context(|| format!("write {}", opcode_out_path.display()))?;
    Ok(())
}
