use serde::{Deserialize, Serialize};

/// The host-facing interface of a compiled module, written next to it in debug builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSignature {
    pub exports: Vec<ExportSignature>,
    pub imports: Vec<ImportSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSignature {
    pub name: String,
    pub kind: SignatureKind,
    /// Number of `i32` parameters, for functions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arity: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureKind {
    Function,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSignature {
    pub module: String,
    pub name: String,
    pub arity: u32,
}

impl ModuleSignature {
    pub fn export(&self, name: &str) -> Option<&ExportSignature> {
        self.exports.iter().find(|export| export.name == name)
    }
}
