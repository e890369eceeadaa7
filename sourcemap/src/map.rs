use serde::{Deserialize, Serialize};

use crate::{vlq, Loc};

/// A source map in the revision 3 format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub sources: Vec<String>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Copy)]
struct Mapping {
    generated: Loc,
    source: u32,
    original: Loc,
    name: Option<u32>,
}

/// Collects mappings from generated positions to original positions.
///
/// Binary targets such as wasm use a single generated line whose columns are byte offsets.
#[derive(Debug, Default)]
pub struct SourceMapBuilder {
    file: Option<String>,
    sources: Vec<String>,
    names: Vec<String>,
    mappings: Vec<Mapping>,
}

impl SourceMapBuilder {
    pub fn new(file: Option<String>) -> Self {
        Self {
            file,
            ..Default::default()
        }
    }

    /// Returns the index of `source`, registering it on first use.
    pub fn add_source(&mut self, source: &str) -> u32 {
        Self::intern(&mut self.sources, source)
    }

    /// Returns the index of `name`, registering it on first use.
    pub fn add_name(&mut self, name: &str) -> u32 {
        Self::intern(&mut self.names, name)
    }

    fn intern(table: &mut Vec<String>, value: &str) -> u32 {
        match table.iter().position(|existing| existing == value) {
            Some(idx) => idx as u32,
            None => {
                table.push(value.to_owned());
                (table.len() - 1) as u32
            }
        }
    }

    pub fn add_mapping(&mut self, generated: Loc, source: u32, original: Loc, name: Option<u32>) {
        self.mappings.push(Mapping {
            generated,
            source,
            original,
            name,
        });
    }

    pub fn build(mut self) -> SourceMap {
        self.mappings.sort_by_key(|mapping| mapping.generated);

        let mut mappings = String::new();
        let mut line = 0;
        let mut prev_column = 0i64;
        let mut prev_source = 0i64;
        let mut prev_line = 0i64;
        let mut prev_original_column = 0i64;
        let mut prev_name = 0i64;
        let mut first_in_line = true;

        for mapping in &self.mappings {
            while line < mapping.generated.line {
                mappings.push(';');
                line += 1;
                prev_column = 0;
                first_in_line = true;
            }
            if !first_in_line {
                mappings.push(',');
            }
            first_in_line = false;

            let column = i64::from(mapping.generated.column);
            vlq::encode(column - prev_column, &mut mappings);
            prev_column = column;

            let source = i64::from(mapping.source);
            vlq::encode(source - prev_source, &mut mappings);
            prev_source = source;

            let original_line = i64::from(mapping.original.line);
            vlq::encode(original_line - prev_line, &mut mappings);
            prev_line = original_line;

            let original_column = i64::from(mapping.original.column);
            vlq::encode(original_column - prev_original_column, &mut mappings);
            prev_original_column = original_column;

            if let Some(name) = mapping.name {
                let name = i64::from(name);
                vlq::encode(name - prev_name, &mut mappings);
                prev_name = name;
            }
        }

        SourceMap {
            version: 3,
            file: self.file,
            sources: self.sources,
            names: self.names,
            mappings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_are_delta_encoded_in_generated_order() {
        let mut builder = SourceMapBuilder::new(Some("out.wasm".to_owned()));
        let src = builder.add_source("main.gr");
        let f = builder.add_name("f");
        builder.add_mapping(Loc::new(0, 16), src, Loc::new(2, 4), None);
        builder.add_mapping(Loc::new(0, 8), src, Loc::new(0, 0), Some(f));
        let map = builder.build();

        assert_eq!(map.version, 3);
        assert_eq!(map.sources, vec!["main.gr"]);
        assert_eq!(map.names, vec!["f"]);
        // [8,0,0,0,0] then [+8,0,+2,+4]
        assert_eq!(map.mappings, "QAAAA,QAEI");
    }

    #[test]
    fn sources_are_interned() {
        let mut builder = SourceMapBuilder::default();
        assert_eq!(builder.add_source("a"), 0);
        assert_eq!(builder.add_source("b"), 1);
        assert_eq!(builder.add_source("a"), 0);
    }

    #[test]
    fn json_uses_camel_case_and_omits_missing_file() {
        let map = SourceMapBuilder::default().build();
        let json = map.to_json().unwrap();
        assert_eq!(json, r#"{"version":3,"sources":[],"names":[],"mappings":""}"#);
    }
}
