//! Taint configuration
//!
//! Sources, sinks and transfer rules, resolved against the program once
//! at load time so matching during solving is a set lookup. The file
//! format is JSON:
//!
//! ```json
//! {
//!   "sources":   [ { "method": "Net.read", "type": "String" } ],
//!   "sinks":     [ { "method": "Db.exec", "index": 0 } ],
//!   "transfers": [ { "method": "String.concat",
//!                    "from": 0, "to": "result", "type": "String" } ]
//! }
//! ```
//!
//! `from`/`to` accept an argument index, `"base"` or `"result"`.

use rustc_hash::FxHashSet;
use serde::Deserialize;
use std::path::Path;

use crate::errors::{AnalysisError, Result};
use crate::shared::models::{MethodId, PrimitiveType, Program, Type};

/// Where taint is read from or written to at a call site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferIndex {
    /// The receiver object
    Base,
    /// The call result (left-hand side)
    Result,
    /// The i-th argument
    Arg(usize),
}

/// Resolved taint rules
#[derive(Debug, Default)]
pub struct TaintConfig {
    sources: FxHashSet<(MethodId, Type)>,
    sinks: FxHashSet<(MethodId, usize)>,
    transfers: FxHashSet<(MethodId, TransferIndex, TransferIndex, Type)>,
}

impl TaintConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&mut self, method: MethodId, ty: Type) {
        self.sources.insert((method, ty));
    }

    pub fn add_sink(&mut self, method: MethodId, index: usize) {
        self.sinks.insert((method, index));
    }

    pub fn add_transfer(
        &mut self,
        method: MethodId,
        from: TransferIndex,
        to: TransferIndex,
        ty: Type,
    ) {
        self.transfers.insert((method, from, to, ty));
    }

    /// A call to `method` is a source iff a rule names it with exactly its
    /// return type
    #[inline]
    pub fn is_source(&self, method: MethodId, return_type: &Type) -> bool {
        self.sources.contains(&(method, return_type.clone()))
    }

    #[inline]
    pub fn is_sink(&self, method: MethodId, index: usize) -> bool {
        self.sinks.contains(&(method, index))
    }

    #[inline]
    pub fn has_transfer(
        &self,
        method: MethodId,
        from: TransferIndex,
        to: TransferIndex,
        ty: &Type,
    ) -> bool {
        self.transfers.contains(&(method, from, to, ty.clone()))
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.sinks.is_empty() && self.transfers.is_empty()
    }

    /// Load rules from a JSON file and resolve them against `program`
    pub fn load(path: &Path, program: &Program) -> Result<TaintConfig> {
        let text = std::fs::read_to_string(path)?;
        let raw: RawConfig = serde_json::from_str(&text)
            .map_err(|e| AnalysisError::config(format!("{}: {e}", path.display())))?;

        let mut config = TaintConfig::new();
        for s in raw.sources {
            let method = resolve_method(program, &s.method)?;
            config.add_source(method, resolve_type(program, &s.ty)?);
        }
        for s in raw.sinks {
            let method = resolve_method(program, &s.method)?;
            config.add_sink(method, s.index);
        }
        for t in raw.transfers {
            let method = resolve_method(program, &t.method)?;
            config.add_transfer(
                method,
                t.from.resolve()?,
                t.to.resolve()?,
                resolve_type(program, &t.ty)?,
            );
        }
        Ok(config)
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    sources: Vec<RawSource>,
    #[serde(default)]
    sinks: Vec<RawSink>,
    #[serde(default)]
    transfers: Vec<RawTransfer>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    method: String,
    #[serde(rename = "type")]
    ty: String,
}

#[derive(Debug, Deserialize)]
struct RawSink {
    method: String,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct RawTransfer {
    method: String,
    from: RawIndex,
    to: RawIndex,
    #[serde(rename = "type")]
    ty: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawIndex {
    Arg(usize),
    Named(String),
}

impl RawIndex {
    fn resolve(&self) -> Result<TransferIndex> {
        match self {
            RawIndex::Arg(i) => Ok(TransferIndex::Arg(*i)),
            RawIndex::Named(s) => match s.as_str() {
                "base" => Ok(TransferIndex::Base),
                "result" => Ok(TransferIndex::Result),
                other => Err(AnalysisError::config(format!(
                    "unknown transfer endpoint {other:?} (expected \"base\", \"result\" or an index)"
                ))),
            },
        }
    }
}

/// `"Class.method"` → method id
fn resolve_method(program: &Program, name: &str) -> Result<MethodId> {
    let (class_name, method_name) = name
        .rsplit_once('.')
        .ok_or_else(|| AnalysisError::config(format!("{name:?} is not of the form Class.method")))?;
    let class = program
        .class_by_name(class_name)
        .ok_or_else(|| AnalysisError::config(format!("unknown class {class_name:?}")))?;
    program
        .method_by_name(class, method_name)
        .ok_or_else(|| AnalysisError::config(format!("unknown method {name:?}")))
}

fn resolve_type(program: &Program, name: &str) -> Result<Type> {
    let ty = match name {
        "void" => Type::Void,
        "byte" => Type::Primitive(PrimitiveType::Byte),
        "short" => Type::Primitive(PrimitiveType::Short),
        "int" => Type::Primitive(PrimitiveType::Int),
        "char" => Type::Primitive(PrimitiveType::Char),
        "boolean" => Type::Primitive(PrimitiveType::Boolean),
        "long" => Type::Primitive(PrimitiveType::Long),
        "float" => Type::Primitive(PrimitiveType::Float),
        "double" => Type::Primitive(PrimitiveType::Double),
        class_name => Type::Reference(program.class_by_name(class_name).ok_or_else(|| {
            AnalysisError::config(format!("unknown type {class_name:?}"))
        })?),
    };
    Ok(ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::ProgramBuilder;

    fn sample_program() -> (Program, MethodId, MethodId) {
        let mut b = ProgramBuilder::new();
        let net = b.add_class("Net");
        let db = b.add_class("Db");
        let s = b.add_method(net, "read", vec![], Type::Reference(net));
        b.mark_static(s);
        let k = b.add_method(db, "exec", vec![Type::Reference(net)], Type::Void);
        b.mark_static(k);
        (b.finish().unwrap(), s, k)
    }

    #[test]
    fn test_programmatic_rules() {
        let (p, src, sink) = sample_program();
        let mut config = TaintConfig::new();
        let net_ty = p.return_type_of(src).clone();
        config.add_source(src, net_ty.clone());
        config.add_sink(sink, 0);
        assert!(config.is_source(src, &net_ty));
        assert!(!config.is_source(sink, &Type::Void));
        assert!(config.is_sink(sink, 0));
        assert!(!config.is_sink(sink, 1));
    }

    #[test]
    fn test_load_from_json() {
        let (p, src, sink) = sample_program();
        let dir = std::env::temp_dir().join("classflow-taint-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("taint.json");
        std::fs::write(
            &path,
            r#"{
                "sources": [ { "method": "Net.read", "type": "Net" } ],
                "sinks": [ { "method": "Db.exec", "index": 0 } ],
                "transfers": [
                    { "method": "Net.read", "from": "base", "to": "result", "type": "Net" },
                    { "method": "Db.exec", "from": 0, "to": "base", "type": "Db" }
                ]
            }"#,
        )
        .unwrap();

        let config = TaintConfig::load(&path, &p).unwrap();
        let net_ty = p.return_type_of(src).clone();
        assert!(config.is_source(src, &net_ty));
        assert!(config.is_sink(sink, 0));
        assert!(config.has_transfer(src, TransferIndex::Base, TransferIndex::Result, &net_ty));
        let db_ty = Type::Reference(p.class_by_name("Db").unwrap());
        assert!(config.has_transfer(sink, TransferIndex::Arg(0), TransferIndex::Base, &db_ty));
    }

    #[test]
    fn test_unknown_method_is_config_error() {
        let (p, _, _) = sample_program();
        let dir = std::env::temp_dir().join("classflow-taint-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.json");
        std::fs::write(&path, r#"{ "sources": [ { "method": "Nope.read", "type": "Net" } ] }"#)
            .unwrap();
        assert!(matches!(TaintConfig::load(&path, &p), Err(AnalysisError::Config(_))));
    }
}
